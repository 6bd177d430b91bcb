use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use num_traits::ToPrimitive;
use unicode_segmentation::UnicodeSegmentation;

use crate::interpreter::Interpreter;
use crate::value::{
    dict_key, format_num, quote_str, values_equal, NativeIter, RuntimeError, SpecName, Value,
};

fn undefined(op: &str) -> RuntimeError {
    RuntimeError::type_error(format!("{} is not defined for this type", op))
}

fn num_operand(args: &[Value], op: &str) -> Result<f64, RuntimeError> {
    match args.first() {
        Some(Value::Num(n)) => Ok(*n),
        _ => Err(undefined(op)),
    }
}

fn index_of(n: f64, len: usize) -> Option<usize> {
    let i = n.to_i64()?;
    let idx = if i < 0 { i + len as i64 } else { i };
    if idx < 0 || idx as usize >= len {
        return None;
    }
    Some(idx as usize)
}

/// Fallback behavior for every spec an object has not overridden. Scalars
/// and containers get their whole protocol from here.
pub(crate) fn default_spec(
    interp: &mut Interpreter,
    target: &Value,
    spec: SpecName,
    args: &[Value],
    start: usize,
) -> Result<Value, RuntimeError> {
    match spec {
        SpecName::Add => match (target, args.first()) {
            (Value::Num(a), _) => Ok(Value::Num(a + num_operand(args, "Add")?)),
            (Value::Str(a), Some(b)) => {
                let b = interp.str_value(b, start)?;
                Ok(Value::Str(format!("{}{}", a, b)))
            }
            _ => Err(undefined("Add")),
        },
        SpecName::Sub => match target {
            Value::Num(a) => Ok(Value::Num(a - num_operand(args, "Subtract")?)),
            _ => Err(undefined("Subtract")),
        },
        SpecName::Mul => match (target, args.first()) {
            (Value::Num(a), _) => Ok(Value::Num(a * num_operand(args, "Multiply")?)),
            (Value::Str(a), Some(Value::Num(n))) => {
                if n.fract() != 0.0 {
                    return Err(RuntimeError::value(
                        "Cannot multiply string by a float, must be integer",
                    ));
                }
                let count = n.to_usize().unwrap_or(0);
                Ok(Value::Str(a.repeat(count)))
            }
            _ => Err(undefined("Multiply")),
        },
        SpecName::Div => match target {
            Value::Num(a) => Ok(Value::Num(a / num_operand(args, "Divide")?)),
            _ => Err(undefined("Divide")),
        },
        SpecName::Pow => match target {
            Value::Num(a) => Ok(Value::Num(a.powf(num_operand(args, "Exponentiation")?))),
            _ => Err(undefined("Exponentiation")),
        },
        SpecName::Eq => {
            let other = args.first().cloned().unwrap_or(Value::Null);
            Ok(Value::Bool(values_equal(target, &other)))
        }
        SpecName::Ne => {
            let other = args.first().cloned().unwrap_or(Value::Null);
            let eq = interp.invoke_spec(target, SpecName::Eq, vec![other], start)?;
            Ok(Value::Bool(!interp.bool_value(&eq, start)?))
        }
        SpecName::Lt | SpecName::Le | SpecName::Gt | SpecName::Ge => {
            let (op, name) = match spec {
                SpecName::Lt => (f64::lt as fn(&f64, &f64) -> bool, "Less than"),
                SpecName::Le => (f64::le as fn(&f64, &f64) -> bool, "Less than or equal to"),
                SpecName::Gt => (f64::gt as fn(&f64, &f64) -> bool, "Greater than"),
                _ => (f64::ge as fn(&f64, &f64) -> bool, "Greater than or equal to"),
            };
            match target {
                Value::Num(a) => Ok(Value::Bool(op(a, &num_operand(args, name)?))),
                _ => Err(undefined(name)),
            }
        }
        SpecName::Contains => {
            let item = args.first().cloned().unwrap_or(Value::Null);
            match target {
                Value::Str(s) => match &item {
                    Value::Str(sub) => Ok(Value::Bool(s.contains(sub.as_str()))),
                    _ => Err(RuntimeError::type_error(
                        "String containment expects a string",
                    )),
                },
                Value::List(items) => {
                    let items = items.borrow();
                    Ok(Value::Bool(items.iter().any(|v| values_equal(v, &item))))
                }
                Value::Dict(d) => {
                    let key = dict_key(&item);
                    Ok(Value::Bool(d.borrow().get(&key).is_some()))
                }
                _ => Err(undefined("Containment")),
            }
        }
        SpecName::Or => {
            let other = args.first().cloned().unwrap_or(Value::Null);
            if interp.bool_value(target, start)? {
                Ok(target.clone())
            } else {
                Ok(other)
            }
        }
        SpecName::And => {
            let other = args.first().cloned().unwrap_or(Value::Null);
            if interp.bool_value(target, start)? {
                Ok(other)
            } else {
                Ok(target.clone())
            }
        }
        SpecName::Neg => match target {
            Value::Num(n) => Ok(Value::Num(-n)),
            _ => Err(undefined("Unary minus")),
        },
        SpecName::Pos => match target {
            Value::Num(n) => Ok(Value::Num(*n)),
            _ => Err(undefined("Unary plus")),
        },
        SpecName::Not => Ok(Value::Bool(!interp.bool_value(target, start)?)),
        SpecName::Bool => Ok(Value::Bool(match target {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(d) => !d.borrow().entries.is_empty(),
            _ => true,
        })),
        SpecName::Repr => Ok(Value::Str(default_repr(interp, target, start)?)),
        SpecName::Str => match target {
            Value::Null => Ok(Value::Str(String::new())),
            Value::Str(s) => Ok(Value::Str(s.clone())),
            Value::Bool(b) => Ok(Value::Str(if *b { "true" } else { "false" }.to_string())),
            Value::Num(n) => Ok(Value::Str(format_num(*n))),
            other => {
                let rendered = interp.repr_value(other, start)?;
                Ok(Value::Str(rendered))
            }
        },
        SpecName::Hash => {
            let mut hasher = DefaultHasher::new();
            match target {
                Value::Num(n) => n.to_bits().hash(&mut hasher),
                Value::Str(s) => s.hash(&mut hasher),
                Value::Bool(b) => b.hash(&mut hasher),
                Value::Null => 0u8.hash(&mut hasher),
                other => other.identity().hash(&mut hasher),
            }
            Ok(Value::Num(hasher.finish() as u32 as f64))
        }
        SpecName::Iter => match target {
            Value::List(items) => {
                let items = items.borrow().clone();
                Ok(Value::Iter(Rc::new(RefCell::new(NativeIter {
                    items,
                    idx: 0,
                }))))
            }
            Value::Str(s) => {
                let items = s
                    .graphemes(true)
                    .map(|g| Value::Str(g.to_string()))
                    .collect();
                Ok(Value::Iter(Rc::new(RefCell::new(NativeIter {
                    items,
                    idx: 0,
                }))))
            }
            Value::Dict(d) => {
                let items = d
                    .borrow()
                    .entries
                    .iter()
                    .map(|(_, k, _)| k.clone())
                    .collect();
                Ok(Value::Iter(Rc::new(RefCell::new(NativeIter {
                    items,
                    idx: 0,
                }))))
            }
            Value::Iter(_) => Ok(target.clone()),
            _ => Err(RuntimeError::type_error("This type is not iterable")),
        },
        SpecName::Next => match target {
            Value::Iter(state) => {
                let mut state = state.borrow_mut();
                if state.idx < state.items.len() {
                    let item = state.items[state.idx].clone();
                    state.idx += 1;
                    Ok(item)
                } else {
                    Err(RuntimeError::break_signal(1))
                }
            }
            _ => Err(undefined("next")),
        },
        SpecName::Call => {
            let rendered = interp.repr_value(target, start)?;
            Err(RuntimeError::type_error(format!("{} is not callable", rendered)))
        }
        SpecName::AltCall => match target {
            Value::List(items) => {
                let idx = match args.first() {
                    Some(Value::Num(n)) => *n,
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "Expected num, got {} instead",
                            match other {
                                Some(v) => interp.repr_value(v, start)?,
                                None => "nothing".to_string(),
                            }
                        )));
                    }
                };
                let items = items.borrow();
                match index_of(idx, items.len()) {
                    Some(i) => Ok(items[i].clone()),
                    None => Err(RuntimeError::new(
                        crate::value::ErrorKind::Index,
                        format!("Index {} is out of range", format_num(idx)),
                    )),
                }
            }
            Value::Str(s) => {
                let idx = match args.first() {
                    Some(Value::Num(n)) => *n,
                    _ => {
                        return Err(RuntimeError::type_error("Expected num index"));
                    }
                };
                let graphemes: Vec<&str> = s.graphemes(true).collect();
                match index_of(idx, graphemes.len()) {
                    Some(i) => Ok(Value::Str(graphemes[i].to_string())),
                    None => Err(RuntimeError::new(
                        crate::value::ErrorKind::Index,
                        format!("Index {} is out of range", format_num(idx)),
                    )),
                }
            }
            Value::Dict(d) => {
                let key = args.first().cloned().unwrap_or(Value::Null);
                let default = args.get(1).cloned().unwrap_or(Value::Null);
                Ok(d.borrow().get(&dict_key(&key)).unwrap_or(default))
            }
            _ => {
                let rendered = interp.repr_value(target, start)?;
                Err(RuntimeError::type_error(format!(
                    "{} is not subscriptable",
                    rendered
                )))
            }
        },
        SpecName::GetAttr => {
            let name = match args.first() {
                Some(Value::Str(s)) => s.clone(),
                _ => {
                    return Err(RuntimeError::value("Expected str attribute name"));
                }
            };
            interp.default_get_attr(target, &name, start)
        }
        SpecName::Format => {
            let rendered = match args.first() {
                Some(v) => interp.repr_value(v, start)?,
                None => "nothing".to_string(),
            };
            Err(RuntimeError::value(format!("Unknown format type {}", rendered)))
        }
        SpecName::Get => match target {
            Value::Property(p) => {
                let getter = p.getter.clone();
                interp.call_value(getter, Vec::new(), Vec::new(), start)
            }
            _ => Ok(target.clone()),
        },
        SpecName::Set => match target {
            Value::Property(p) => match &p.setter {
                Some(setter) => {
                    let setter = setter.clone();
                    let value = args.first().cloned().unwrap_or(Value::Null);
                    interp.call_value(setter, vec![value], Vec::new(), start)
                }
                None => Err(RuntimeError::attribute("Property has no setter")),
            },
            _ => Err(undefined("set")),
        },
        SpecName::Init => Err(RuntimeError::type_error(format!(
            "The {:?} type can not be initialized",
            target.type_label()
        ))),
    }
}

fn default_repr(
    interp: &mut Interpreter,
    target: &Value,
    start: usize,
) -> Result<String, RuntimeError> {
    Ok(match target {
        Value::Num(n) => format_num(*n),
        Value::Str(s) => quote_str(s),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Null => "null".to_string(),
        Value::List(items) => {
            let items = items.borrow().clone();
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(interp.repr_value(item, start)?);
            }
            format!("[{}]", parts.join(", "))
        }
        Value::Dict(d) => {
            let entries = d.borrow().entries.clone();
            let mut parts = Vec::with_capacity(entries.len());
            for (_, k, v) in &entries {
                parts.push(format!(
                    "{}:{}",
                    interp.repr_value(k, start)?,
                    interp.repr_value(v, start)?
                ));
            }
            format!("{{{}}}", parts.join(", "))
        }
        Value::Object(o) => format!("<{}>", o.tag.borrow()),
        Value::Type(t) => format!("<type '{}'>", t.name),
        Value::Func(f) => match &f.name {
            Some(name) => format!("<func '{}'>", name),
            None => "<func>".to_string(),
        },
        Value::Native(n) => format!("<builtin func '{}'>", n.name),
        Value::Property(_) => "<property>".to_string(),
        Value::Pattern(re) => format!("r'{}'", re.as_str()),
        Value::Iter(_) => "<generator>".to_string(),
    })
}

impl Interpreter {
    pub(crate) fn str_value(&mut self, value: &Value, start: usize) -> Result<String, RuntimeError> {
        match self.invoke_spec(value, SpecName::Str, Vec::new(), start)? {
            Value::Str(s) => Ok(s),
            other => Err(RuntimeError::value(format!(
                "expected return for 'str' to be a string, got {} instead",
                other.type_label()
            ))
            .with_span(start)),
        }
    }

    pub(crate) fn repr_value(
        &mut self,
        value: &Value,
        start: usize,
    ) -> Result<String, RuntimeError> {
        match self.invoke_spec(value, SpecName::Repr, Vec::new(), start)? {
            Value::Str(s) => Ok(s),
            other => Err(RuntimeError::value(format!(
                "expected return for 'repr' to be a string, got {} instead",
                other.type_label()
            ))
            .with_span(start)),
        }
    }

    pub(crate) fn bool_value(&mut self, value: &Value, start: usize) -> Result<bool, RuntimeError> {
        match self.invoke_spec(value, SpecName::Bool, Vec::new(), start)? {
            Value::Bool(b) => Ok(b),
            Value::Num(n) => Ok(n != 0.0),
            other => Err(RuntimeError::value(format!(
                "expected return for 'bool' to be a bool, got {} instead",
                other.type_label()
            ))
            .with_span(start)),
        }
    }

    /// Drain a value's iterator; exhaustion is signalled by a depth-1 break.
    pub(crate) fn iterate(&mut self, value: &Value, start: usize) -> Result<Vec<Value>, RuntimeError> {
        let iter = self.invoke_spec(value, SpecName::Iter, Vec::new(), start)?;
        let mut out = Vec::new();
        loop {
            match self.invoke_spec(&iter, SpecName::Next, Vec::new(), start) {
                Ok(item) => out.push(item),
                Err(e) if e.break_depth == Some(1) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}
