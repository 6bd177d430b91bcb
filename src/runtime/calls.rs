use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{Expr, ParamDef, ParamKind};
use crate::interpreter::Interpreter;
use crate::runtime::{self, Scope};
use crate::value::{
    new_object, new_type, BuiltinKind, DictData, DictKey, ErrorKind, FuncData, NativeData,
    ParentRef, RuntimeError, SpecName, TypeData, Value,
};

pub(crate) const MAX_CALL_DEPTH: usize = 200;

impl Interpreter {
    /// Dispatch a spec on a value: the object's own entry wins, bound to the
    /// object; everything else falls back to the default protocol.
    pub(crate) fn invoke_spec(
        &mut self,
        target: &Value,
        spec: SpecName,
        args: Vec<Value>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        if let Some(handler) = target.get_spec(spec) {
            let bound = runtime::bind_if_method(handler, target);
            return self.call_value(bound, args, Vec::new(), start);
        }
        super::specs::default_spec(self, target, spec, &args, start)
            .map_err(|e| e.with_span(start))
    }

    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match &callee {
            Value::Func(f) => {
                let f = Rc::clone(f);
                self.call_func(&f, args, kwargs, start)
            }
            Value::Native(n) => {
                let n = Rc::clone(n);
                self.call_native(&n, args, kwargs, start)
            }
            Value::Type(t) => {
                let t = Rc::clone(t);
                self.construct_type(&t, args, kwargs, start)
            }
            Value::Object(_) => match callee.get_spec(SpecName::Call) {
                Some(handler) => {
                    let bound = runtime::bind_if_method(handler, &callee);
                    self.call_value(bound, args, kwargs, start)
                }
                None => {
                    let rendered = self.repr_value(&callee, start)?;
                    Err(RuntimeError::type_error(format!("{} is not callable", rendered))
                        .with_span(start))
                }
            },
            other => {
                let rendered = self.repr_value(other, start)?;
                Err(RuntimeError::type_error(format!("{} is not callable", rendered))
                    .with_span(start))
            }
        }
    }

    /// Bracket postfix: partial application for callables, subscripting for
    /// everything else.
    pub(crate) fn alt_call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match &callee {
            Value::Func(f) => {
                let mut pa = f.partial_args.clone();
                pa.extend(args);
                let mut pk = f.partial_kwargs.clone();
                pk.extend(kwargs);
                Ok(Value::Func(Rc::new(f.with_partials(pa, pk))))
            }
            Value::Native(n) => {
                let mut pa = n.partial_args.clone();
                pa.extend(args);
                Ok(Value::Native(Rc::new(NativeData {
                    name: n.name.clone(),
                    receiver: n.receiver.clone(),
                    partial_args: pa,
                })))
            }
            _ => self.invoke_spec(&callee, SpecName::AltCall, args, start),
        }
    }

    pub(crate) fn call_func(
        &mut self,
        func: &Rc<FuncData>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let mut all_args = func.partial_args.clone();
        all_args.extend(args);
        let mut all_kwargs = func.partial_kwargs.clone();
        all_kwargs.extend(kwargs);
        let bound = self.bind_params(&func.params, &func.env, all_args, all_kwargs, start)?;

        self.enter_call(start)?;
        let result = self.run_func_body(func, bound);
        self.leave_call();

        match result {
            Ok(value) => Ok(value),
            Err(mut e) => {
                if let Some(value) = e.return_value.take() {
                    return Ok(value);
                }
                if !e.is_signal() {
                    if let Some(name) = &func.name {
                        e.trace.push(name.clone());
                    }
                }
                Err(e.with_span(start))
            }
        }
    }

    fn run_func_body(
        &mut self,
        func: &Rc<FuncData>,
        bound: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        if func.is_struct {
            let obj_rc = new_object(func.name.as_deref().unwrap_or("object"));
            let obj = Value::Object(Rc::clone(&obj_rc));
            let frame = Scope::child(&func.env, ParentRef::from_value(&obj));
            for (name, value) in bound {
                frame.borrow_mut().vars.insert(name, value);
            }
            let saved = std::mem::replace(&mut self.env, frame);
            let result = self.exec_block_raw(&func.body);
            self.env = saved;
            result.map(|_| obj)
        } else {
            // The scope object backs `$` references; its parent edge is the
            // receiver the method was read from.
            let scope_obj = new_object("scope");
            if let Some(parent) = &func.parent {
                *scope_obj.parent.borrow_mut() = Some(parent.clone());
            }
            let scope_val = Value::Object(Rc::clone(&scope_obj));
            let frame = Scope::child(&func.env, ParentRef::from_value(&scope_val));
            for (name, value) in bound {
                frame.borrow_mut().vars.insert(name, value);
            }
            let saved = std::mem::replace(&mut self.env, frame);
            let result = self.exec_block_raw(&func.body);
            self.env = saved;
            result.map(|_| Value::Null)
        }
    }

    pub(crate) fn enter_call(&mut self, start: usize) -> Result<(), RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(
                RuntimeError::new(ErrorKind::StackOverflow, "Recursion limit exceeded")
                    .with_span(start),
            );
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.depth -= 1;
    }

    /// Match call arguments against a parameter list. Order: leading
    /// positionals, then keywords, then defaults evaluated in the captured
    /// environment; anything left over is an error.
    pub(crate) fn bind_params(
        &mut self,
        params: &[ParamDef],
        env: &super::ScopeRef,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Vec<(String, Value)>, RuntimeError> {
        let mut args = std::collections::VecDeque::from(args);
        let mut kwargs = kwargs;
        let mut bound = Vec::with_capacity(params.len());

        for param in params {
            match param.kind {
                ParamKind::VarArg => {
                    bound.push((param.name.clone(), Value::list(args.drain(..).collect())));
                }
                ParamKind::VarKwArg => {
                    let mut dict = DictData::default();
                    for (k, v) in kwargs.drain(..) {
                        dict.set(DictKey::Str(k.clone()), Value::Str(k), v);
                    }
                    bound.push((param.name.clone(), Value::Dict(Rc::new(RefCell::new(dict)))));
                }
                ParamKind::Normal if !args.is_empty() => {
                    if let Some(value) = args.pop_front() {
                        bound.push((param.name.clone(), value));
                    }
                }
                _ => {
                    if let Some(pos) = kwargs.iter().position(|(k, _)| k == &param.name) {
                        let (_, value) = kwargs.remove(pos);
                        bound.push((param.name.clone(), value));
                    } else {
                        let value = self.eval_default(param, env, start)?;
                        bound.push((param.name.clone(), value));
                    }
                }
            }
        }

        if !args.is_empty() {
            return Err(RuntimeError::argument(format!(
                "Received {} extra positional argument(s).",
                args.len()
            ))
            .with_span(start));
        }
        if !kwargs.is_empty() {
            let names: Vec<&str> = kwargs.iter().map(|(k, _)| k.as_str()).collect();
            return Err(RuntimeError::argument(format!(
                "Received {} extra keyword argument(s): {}",
                kwargs.len(),
                names.join(", ")
            ))
            .with_span(start));
        }
        Ok(bound)
    }

    fn eval_default(
        &mut self,
        param: &ParamDef,
        env: &super::ScopeRef,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let Some(default) = &param.default else {
            let flavor = match param.kind {
                ParamKind::KwOnly => "keyword ",
                _ => "positional ",
            };
            return Err(RuntimeError::argument(format!(
                "Required {}argument was not passed: {:?}",
                flavor, param.name
            ))
            .with_span(start));
        };
        let frame = Scope::child(env, None);
        let saved = std::mem::replace(&mut self.env, frame);
        let result = self.eval_expr(default);
        self.env = saved;
        match result {
            Ok(value) => Ok(value),
            Err(mut e) => match e.return_value.take() {
                Some(value) => Ok(value),
                None => Err(e),
            },
        }
    }

    pub(crate) fn construct_type(
        &mut self,
        ty: &Rc<TypeData>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        if let Some(kind) = ty.builtin {
            return self.construct_builtin(kind, ty, args, kwargs, start);
        }

        let obj_rc = new_object(&ty.name);
        *obj_rc.parent.borrow_mut() = Some(ParentRef::Type(Rc::downgrade(ty)));
        let obj = Value::Object(Rc::clone(&obj_rc));

        let init = ty.init.borrow().clone();
        match init {
            Some(Value::Func(f)) => {
                let mut all_args = f.partial_args.clone();
                all_args.extend(args);
                let mut all_kwargs = f.partial_kwargs.clone();
                all_kwargs.extend(kwargs);
                let bound = self.bind_params(&f.params, &f.env, all_args, all_kwargs, start)?;

                self.enter_call(start)?;
                let frame = Scope::child(&f.env, ParentRef::from_value(&obj));
                for (name, value) in bound {
                    frame.borrow_mut().vars.insert(name, value);
                }
                let saved = std::mem::replace(&mut self.env, frame);
                let result = self.exec_block_raw(&f.body);
                self.env = saved;
                self.leave_call();

                match result {
                    Ok(_) => Ok(obj),
                    Err(mut e) => {
                        if e.return_value.take().is_some() {
                            Ok(obj)
                        } else {
                            Err(e.with_span(start))
                        }
                    }
                }
            }
            Some(other) => {
                self.call_value(other, args, kwargs, start)?;
                Ok(obj)
            }
            None => Err(RuntimeError::type_error(format!(
                "The {:?} type can not be initialized",
                ty.name
            ))
            .with_span(start)),
        }
    }

    fn construct_builtin(
        &mut self,
        kind: BuiltinKind,
        ty: &Rc<TypeData>,
        mut args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match kind {
            BuiltinKind::Num => {
                let inp = args.first().cloned().unwrap_or(Value::Null);
                let text = self.str_value(&inp, start)?;
                match text.parse::<f64>() {
                    Ok(n) => Ok(Value::Num(n)),
                    Err(_) => Err(RuntimeError::value(format!(
                        "Could not convert {:?} into a number",
                        text
                    ))
                    .with_span(start)),
                }
            }
            BuiltinKind::Str => {
                let inp = args.first().cloned().unwrap_or(Value::Str(String::new()));
                Ok(Value::Str(self.str_value(&inp, start)?))
            }
            BuiltinKind::Bool => {
                let inp = args.first().cloned().unwrap_or(Value::Null);
                Ok(Value::Bool(self.bool_value(&inp, start)?))
            }
            BuiltinKind::List => Ok(Value::list(args)),
            BuiltinKind::Dict => {
                let mut dict = DictData::default();
                for (k, v) in kwargs {
                    dict.set(DictKey::Str(k.clone()), Value::Str(k), v);
                }
                Ok(Value::Dict(Rc::new(RefCell::new(dict))))
            }
            BuiltinKind::Object => {
                let tag = match args.first() {
                    Some(v) => self.str_value(v, start)?,
                    None => "object".to_string(),
                };
                Ok(Value::Object(new_object(&tag)))
            }
            BuiltinKind::Property => {
                let getter = args.first().cloned().ok_or_else(|| {
                    RuntimeError::argument("Required positional argument was not passed: \"getter\"")
                        .with_span(start)
                })?;
                if !matches!(getter, Value::Func(_) | Value::Native(_)) {
                    let rendered = self.repr_value(&getter, start)?;
                    return Err(RuntimeError::type_error(format!(
                        "Expected func, got {} instead",
                        rendered
                    ))
                    .with_span(start));
                }
                let setter = args.get(1).cloned();
                Ok(Value::Property(Rc::new(crate::value::PropertyData {
                    getter,
                    setter,
                })))
            }
            BuiltinKind::Type => {
                if args.len() >= 2 {
                    let name = self.str_value(&args[0], start)?;
                    let init = args.remove(1);
                    let ty = new_type(&name, None);
                    *ty.init.borrow_mut() = Some(init);
                    return Ok(Value::Type(ty));
                }
                let inp = args.first().cloned().unwrap_or(Value::Null);
                Ok(self.type_of(&inp))
            }
            BuiltinKind::Pattern => {
                let source = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    Some(Value::Pattern(p)) => return Ok(Value::Pattern(Rc::clone(p))),
                    _ => return Err(RuntimeError::type_error("Expected str pattern")),
                };
                match regex::Regex::new(&source) {
                    Ok(re) => Ok(Value::Pattern(Rc::new(re))),
                    Err(e) => {
                        Err(RuntimeError::value(format!("Invalid pattern: {}", e)).with_span(start))
                    }
                }
            }
            _ => Err(RuntimeError::type_error(format!(
                "The {:?} type can not be initialized",
                ty.name
            ))
            .with_span(start)),
        }
    }

    /// The type object for an arbitrary value.
    pub(crate) fn type_of(&mut self, value: &Value) -> Value {
        if let Some(parent) = value.object_parent() {
            if matches!(parent, Value::Type(_)) {
                return parent;
            }
        }
        let kind = match value {
            Value::Num(_) => BuiltinKind::Num,
            Value::Str(_) => BuiltinKind::Str,
            Value::Bool(_) => BuiltinKind::Bool,
            Value::Null => BuiltinKind::Null,
            Value::List(_) => BuiltinKind::List,
            Value::Dict(_) => BuiltinKind::Dict,
            Value::Func(_) | Value::Native(_) => BuiltinKind::Func,
            Value::Property(_) => BuiltinKind::Property,
            Value::Type(_) => BuiltinKind::Type,
            Value::Pattern(_) => BuiltinKind::Pattern,
            _ => BuiltinKind::Tag,
        };
        Value::Type(new_type(&value.type_label(), Some(kind)))
    }

    /// Run decorator expressions over a freshly created function value. Each
    /// decorator receives the function first, then its own partial args.
    pub(crate) fn apply_decorators(
        &mut self,
        mut value: Value,
        decos: &[Expr],
        start: usize,
    ) -> Result<Value, RuntimeError> {
        for deco in decos {
            let deco_val = self.eval_expr(deco)?;
            value = self.apply_decorator(deco_val, value, start)?;
        }
        Ok(value)
    }

    fn apply_decorator(
        &mut self,
        deco: Value,
        func: Value,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match &deco {
            Value::Func(f) => {
                let mut args = vec![func];
                args.extend(f.partial_args.clone());
                let kwargs = f.partial_kwargs.clone();
                let stripped = Value::Func(Rc::new(f.with_partials(Vec::new(), Vec::new())));
                self.call_value(stripped, args, kwargs, start)
            }
            Value::Native(n) => {
                let mut args = vec![func];
                args.extend(n.partial_args.clone());
                let stripped = Value::native(&n.name, n.receiver.clone());
                self.call_value(stripped, args, Vec::new(), start)
            }
            _ => self.call_value(deco, vec![func], Vec::new(), start),
        }
    }
}
