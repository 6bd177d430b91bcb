use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::ast::{ParamDef, Stmt};
use crate::runtime::ScopeRef;

mod display;
mod error;

pub(crate) use display::{format_num, quote_str};
pub use error::{ErrorKind, RuntimeError};

/// Names of the dispatch channel entries an object can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SpecName {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    Or,
    And,
    Neg,
    Pos,
    Not,
    Bool,
    Repr,
    Str,
    Hash,
    Iter,
    Next,
    Call,
    AltCall,
    GetAttr,
    Format,
    Get,
    Set,
    Init,
}

impl SpecName {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SpecName::Add => "add",
            SpecName::Sub => "sub",
            SpecName::Mul => "mul",
            SpecName::Div => "div",
            SpecName::Pow => "pow",
            SpecName::Eq => "eq",
            SpecName::Ne => "ne",
            SpecName::Lt => "lt",
            SpecName::Le => "le",
            SpecName::Gt => "gt",
            SpecName::Ge => "ge",
            SpecName::Contains => "contains",
            SpecName::Or => "or",
            SpecName::And => "and",
            SpecName::Neg => "neg",
            SpecName::Pos => "pos",
            SpecName::Not => "not",
            SpecName::Bool => "bool",
            SpecName::Repr => "repr",
            SpecName::Str => "str",
            SpecName::Hash => "hash",
            SpecName::Iter => "iter",
            SpecName::Next => "next",
            SpecName::Call => "call",
            SpecName::AltCall => "altcall",
            SpecName::GetAttr => "get_attr",
            SpecName::Format => "format",
            SpecName::Get => "get",
            SpecName::Set => "set",
            SpecName::Init => "init",
        }
    }

    pub(crate) fn from_str(name: &str) -> Option<SpecName> {
        Some(match name {
            "add" => SpecName::Add,
            "sub" => SpecName::Sub,
            "mul" => SpecName::Mul,
            "div" => SpecName::Div,
            "pow" => SpecName::Pow,
            "eq" => SpecName::Eq,
            "ne" => SpecName::Ne,
            "lt" => SpecName::Lt,
            "le" => SpecName::Le,
            "gt" => SpecName::Gt,
            "ge" => SpecName::Ge,
            "contains" => SpecName::Contains,
            "or" => SpecName::Or,
            "and" => SpecName::And,
            "neg" => SpecName::Neg,
            "pos" => SpecName::Pos,
            "not" => SpecName::Not,
            "bool" => SpecName::Bool,
            "repr" => SpecName::Repr,
            "str" => SpecName::Str,
            "hash" => SpecName::Hash,
            "iter" => SpecName::Iter,
            "next" => SpecName::Next,
            "call" => SpecName::Call,
            "altcall" => SpecName::AltCall,
            "get_attr" => SpecName::GetAttr,
            "format" => SpecName::Format,
            "get" => SpecName::Get,
            "set" => SpecName::Set,
            "init" => SpecName::Init,
            _ => return None,
        })
    }
}

/// The three disjoint attribute channels every object carries.
#[derive(Debug, Default)]
pub(crate) struct Namespaces {
    pub(crate) public: RefCell<HashMap<String, Value>>,
    pub(crate) private: RefCell<HashMap<String, Value>>,
    pub(crate) specs: RefCell<HashMap<SpecName, Value>>,
}

#[derive(Debug)]
pub(crate) struct ObjectData {
    pub(crate) tag: RefCell<String>,
    pub(crate) ns: Namespaces,
    pub(crate) parent: RefCell<Option<ParentRef>>,
}

pub(crate) fn new_object(tag: &str) -> Rc<ObjectData> {
    Rc::new(ObjectData {
        tag: RefCell::new(tag.to_string()),
        ns: Namespaces::default(),
        parent: RefCell::new(None),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinKind {
    Num,
    Str,
    Bool,
    Null,
    List,
    Dict,
    Object,
    Func,
    Property,
    Type,
    Pattern,
    /// Matches objects by their type tag only; used for the error types.
    Tag,
}

#[derive(Debug)]
pub(crate) struct TypeData {
    pub(crate) name: String,
    pub(crate) builtin: Option<BuiltinKind>,
    pub(crate) init: RefCell<Option<Value>>,
    pub(crate) ns: Namespaces,
    pub(crate) parent: RefCell<Option<ParentRef>>,
}

pub(crate) fn new_type(name: &str, builtin: Option<BuiltinKind>) -> Rc<TypeData> {
    Rc::new(TypeData {
        name: name.to_string(),
        builtin,
        init: RefCell::new(None),
        ns: Namespaces::default(),
        parent: RefCell::new(None),
    })
}

#[derive(Debug)]
pub(crate) struct FuncData {
    pub(crate) name: Option<String>,
    pub(crate) params: Rc<Vec<ParamDef>>,
    pub(crate) body: Rc<Vec<Stmt>>,
    pub(crate) env: ScopeRef,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) partial_args: Vec<Value>,
    pub(crate) partial_kwargs: Vec<(String, Value)>,
    pub(crate) is_struct: bool,
}

impl FuncData {
    /// A view of this function bound to the object it was read from.
    pub(crate) fn bound(&self, parent: ParentRef) -> FuncData {
        FuncData {
            name: self.name.clone(),
            params: Rc::clone(&self.params),
            body: Rc::clone(&self.body),
            env: Rc::clone(&self.env),
            parent: Some(parent),
            partial_args: self.partial_args.clone(),
            partial_kwargs: self.partial_kwargs.clone(),
            is_struct: self.is_struct,
        }
    }

    pub(crate) fn with_partials(
        &self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> FuncData {
        FuncData {
            name: self.name.clone(),
            params: Rc::clone(&self.params),
            body: Rc::clone(&self.body),
            env: Rc::clone(&self.env),
            parent: self.parent.clone(),
            partial_args: args,
            partial_kwargs: kwargs,
            is_struct: self.is_struct,
        }
    }
}

/// A host-provided function, dispatched by name.
#[derive(Debug)]
pub(crate) struct NativeData {
    pub(crate) name: String,
    pub(crate) receiver: Option<Value>,
    pub(crate) partial_args: Vec<Value>,
}

#[derive(Debug)]
pub(crate) struct PropertyData {
    pub(crate) getter: Value,
    pub(crate) setter: Option<Value>,
}

#[derive(Debug)]
pub(crate) struct NativeIter {
    pub(crate) items: Vec<Value>,
    pub(crate) idx: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DictKey {
    Num(u64),
    Str(String),
    Bool(bool),
    Null,
    Id(usize),
}

#[derive(Debug, Default)]
pub(crate) struct DictData {
    pub(crate) entries: Vec<(DictKey, Value, Value)>,
}

impl DictData {
    pub(crate) fn get(&self, key: &DictKey) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, _, v)| v.clone())
    }

    pub(crate) fn set(&mut self, key: DictKey, key_value: Value, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _, _)| *k == key) {
            entry.2 = value;
        } else {
            self.entries.push((key, key_value, value));
        }
    }

    pub(crate) fn remove(&mut self, key: &DictKey) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _, _)| k == key)?;
        Some(self.entries.remove(idx).2)
    }
}

/// Weak back-edge to the object or type a scope or method is bound to.
#[derive(Debug, Clone)]
pub(crate) enum ParentRef {
    Object(Weak<ObjectData>),
    Type(Weak<TypeData>),
}

impl ParentRef {
    pub(crate) fn from_value(value: &Value) -> Option<ParentRef> {
        match value {
            Value::Object(o) => Some(ParentRef::Object(Rc::downgrade(o))),
            Value::Type(t) => Some(ParentRef::Type(Rc::downgrade(t))),
            _ => None,
        }
    }

    pub(crate) fn upgrade(&self) -> Option<Value> {
        match self {
            ParentRef::Object(w) => w.upgrade().map(Value::Object),
            ParentRef::Type(w) => w.upgrade().map(Value::Type),
        }
    }
}

#[allow(private_interfaces)]
#[derive(Debug, Clone)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<DictData>>),
    Object(Rc<ObjectData>),
    Type(Rc<TypeData>),
    Func(Rc<FuncData>),
    Native(Rc<NativeData>),
    Property(Rc<PropertyData>),
    Pattern(Rc<regex::Regex>),
    Iter(Rc<RefCell<NativeIter>>),
}

impl Value {
    pub(crate) fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub(crate) fn native(name: &str, receiver: Option<Value>) -> Value {
        Value::Native(Rc::new(NativeData {
            name: name.to_string(),
            receiver,
            partial_args: Vec::new(),
        }))
    }

    /// Type tag used by `type(x)`, reprs and the `check` protocol.
    pub(crate) fn type_label(&self) -> String {
        match self {
            Value::Num(_) => "num".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Null => "null".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Object(o) => o.tag.borrow().clone(),
            Value::Type(_) => "type".to_string(),
            Value::Func(_) | Value::Native(_) => "func".to_string(),
            Value::Property(_) => "property".to_string(),
            Value::Pattern(_) => "pattern".to_string(),
            Value::Iter(_) => "generator".to_string(),
        }
    }

    /// The namespaces of a value that carries them (objects and types).
    pub(crate) fn get_pub(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(o) => o.ns.public.borrow().get(name).cloned(),
            Value::Type(t) => t.ns.public.borrow().get(name).cloned(),
            _ => None,
        }
    }

    pub(crate) fn set_pub(&self, name: &str, value: Value) {
        match self {
            Value::Object(o) => {
                o.ns.public.borrow_mut().insert(name.to_string(), value);
            }
            Value::Type(t) => {
                t.ns.public.borrow_mut().insert(name.to_string(), value);
            }
            _ => {}
        }
    }

    pub(crate) fn get_priv(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(o) => o.ns.private.borrow().get(name).cloned(),
            Value::Type(t) => t.ns.private.borrow().get(name).cloned(),
            _ => None,
        }
    }

    pub(crate) fn set_priv(&self, name: &str, value: Value) {
        match self {
            Value::Object(o) => {
                o.ns.private.borrow_mut().insert(name.to_string(), value);
            }
            Value::Type(t) => {
                t.ns.private.borrow_mut().insert(name.to_string(), value);
            }
            _ => {}
        }
    }

    pub(crate) fn get_spec(&self, spec: SpecName) -> Option<Value> {
        match self {
            Value::Object(o) => o.ns.specs.borrow().get(&spec).cloned(),
            Value::Type(t) => t.ns.specs.borrow().get(&spec).cloned(),
            _ => None,
        }
    }

    pub(crate) fn set_spec(&self, spec: SpecName, value: Value) {
        match self {
            Value::Object(o) => {
                o.ns.specs.borrow_mut().insert(spec, value);
            }
            Value::Type(t) => {
                t.ns.specs.borrow_mut().insert(spec, value);
            }
            _ => {}
        }
    }

    pub(crate) fn object_parent(&self) -> Option<Value> {
        match self {
            Value::Object(o) => o.parent.borrow().as_ref().and_then(ParentRef::upgrade),
            Value::Type(t) => t.parent.borrow().as_ref().and_then(ParentRef::upgrade),
            _ => None,
        }
    }

    pub(crate) fn identity(&self) -> usize {
        match self {
            Value::List(r) => Rc::as_ptr(r) as usize,
            Value::Dict(r) => Rc::as_ptr(r) as usize,
            Value::Object(r) => Rc::as_ptr(r) as usize,
            Value::Type(r) => Rc::as_ptr(r) as usize,
            Value::Func(r) => Rc::as_ptr(r) as usize,
            Value::Native(r) => Rc::as_ptr(r) as usize,
            Value::Property(r) => Rc::as_ptr(r) as usize,
            Value::Pattern(r) => Rc::as_ptr(r) as usize,
            Value::Iter(r) => Rc::as_ptr(r) as usize,
            _ => 0,
        }
    }
}

/// Default equality: scalars by value, everything else by identity.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Num(x), Value::Bool(y)) | (Value::Bool(y), Value::Num(x)) => {
            *x == if *y { 1.0 } else { 0.0 }
        }
        _ => a.identity() != 0 && a.identity() == b.identity(),
    }
}

pub(crate) fn dict_key(value: &Value) -> DictKey {
    match value {
        Value::Num(n) => DictKey::Num(n.to_bits()),
        Value::Str(s) => DictKey::Str(s.clone()),
        Value::Bool(b) => DictKey::Bool(*b),
        Value::Null => DictKey::Null,
        other => DictKey::Id(other.identity()),
    }
}

pub(crate) fn builtin_check(kind: BuiltinKind, type_name: &str, value: &Value) -> bool {
    match kind {
        BuiltinKind::Num => matches!(value, Value::Num(_)),
        BuiltinKind::Str => matches!(value, Value::Str(_)),
        BuiltinKind::Bool => matches!(value, Value::Bool(_)),
        BuiltinKind::Null => matches!(value, Value::Null),
        BuiltinKind::List => matches!(value, Value::List(_)),
        BuiltinKind::Dict => matches!(value, Value::Dict(_)),
        BuiltinKind::Object => matches!(value, Value::Object(_)),
        BuiltinKind::Func => matches!(value, Value::Func(_) | Value::Native(_)),
        BuiltinKind::Property => matches!(value, Value::Property(_)),
        BuiltinKind::Type => matches!(value, Value::Type(_)),
        BuiltinKind::Pattern => matches!(value, Value::Pattern(_)),
        BuiltinKind::Tag => value.type_label() == type_name,
    }
}
