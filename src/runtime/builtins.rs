use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use num_traits::ToPrimitive;
use unicode_segmentation::UnicodeSegmentation;

use crate::interpreter::Interpreter;
use crate::runtime::bind_if_method;
use crate::value::{
    builtin_check, dict_key, new_object, new_type, values_equal, BuiltinKind, DictKey, ErrorKind,
    NativeData, PropertyData, RuntimeError, SpecName, TypeData, Value,
};

/// The root fallback namespace consulted after every scope.
pub(crate) fn default_builtins() -> HashMap<String, Value> {
    let mut map = HashMap::new();
    map.insert("null".to_string(), Value::Null);
    map.insert("true".to_string(), Value::Bool(true));
    map.insert("false".to_string(), Value::Bool(false));
    for name in ["print", "assert", "id", "dir", "property"] {
        map.insert(name.to_string(), Value::native(name, None));
    }
    map.insert(
        "object".to_string(),
        Value::Type(new_type("object", Some(BuiltinKind::Object))),
    );
    map.insert(
        "list".to_string(),
        Value::Type(new_type("list", Some(BuiltinKind::List))),
    );
    map.insert(
        "dict".to_string(),
        Value::Type(new_type("dict", Some(BuiltinKind::Dict))),
    );
    map.insert(
        "str".to_string(),
        Value::Type(new_type("str", Some(BuiltinKind::Str))),
    );
    map.insert(
        "num".to_string(),
        Value::Type(new_type("num", Some(BuiltinKind::Num))),
    );
    map
}

/// The built-in `types` module: one type object per value kind and per
/// error kind, each answering `check(v)`.
pub(crate) fn builtin_types_module() -> Value {
    let module = new_object("module");
    {
        let mut public = module.ns.public.borrow_mut();
        for (name, kind) in [
            ("num", BuiltinKind::Num),
            ("str", BuiltinKind::Str),
            ("bool", BuiltinKind::Bool),
            ("null", BuiltinKind::Null),
            ("list", BuiltinKind::List),
            ("dict", BuiltinKind::Dict),
            ("object", BuiltinKind::Object),
            ("func", BuiltinKind::Func),
            ("property", BuiltinKind::Property),
            ("type", BuiltinKind::Type),
            ("pattern", BuiltinKind::Pattern),
        ] {
            public.insert(name.to_string(), Value::Type(new_type(name, Some(kind))));
        }
        for kind in [
            ErrorKind::Name,
            ErrorKind::Attribute,
            ErrorKind::Argument,
            ErrorKind::Type,
            ErrorKind::Value,
            ErrorKind::Index,
            ErrorKind::Key,
            ErrorKind::Version,
            ErrorKind::Import,
            ErrorKind::StackOverflow,
            ErrorKind::Assertion,
        ] {
            public.insert(
                kind.label().to_string(),
                Value::Type(new_type(kind.label(), Some(BuiltinKind::Tag))),
            );
        }
    }
    Value::Object(module)
}

fn str_method(name: &str) -> bool {
    matches!(
        name,
        "format"
            | "upper"
            | "lower"
            | "title"
            | "capitalize"
            | "casefold"
            | "count"
            | "endswith"
            | "startswith"
            | "index"
            | "is_alnum"
            | "is_alpha"
            | "is_ascii"
            | "is_digit"
            | "is_lower"
            | "is_numeric"
            | "is_space"
            | "is_upper"
            | "replace"
            | "remove_prefix"
            | "remove_suffix"
            | "strip"
            | "lstrip"
            | "rstrip"
            | "split"
    )
}

impl Interpreter {
    /// Attribute read on values that do not carry namespaces, plus the
    /// computed attributes of funcs, types and patterns.
    pub(crate) fn default_get_attr(
        &mut self,
        target: &Value,
        name: &str,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match target {
            Value::Object(_) | Value::Type(_) => {
                if let Some(value) = target.get_pub(name) {
                    if matches!(value, Value::Property(_)) {
                        return self.invoke_spec(&value, SpecName::Get, Vec::new(), start);
                    }
                    return Ok(bind_if_method(value, target));
                }
                if let Value::Type(t) = target {
                    return self.type_attr(t, name, start);
                }
                Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start))
            }
            Value::Str(s) => match name {
                "len" => Ok(Value::Num(s.graphemes(true).count() as f64)),
                _ if str_method(name) => Ok(Value::native(name, Some(target.clone()))),
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            Value::List(items) => match name {
                "len" => Ok(Value::Num(items.borrow().len() as f64)),
                "append" | "remove" | "pop" => Ok(Value::native(name, Some(target.clone()))),
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            Value::Dict(d) => match name {
                "len" => Ok(Value::Num(d.borrow().entries.len() as f64)),
                "get" | "set" | "keys" | "values" | "items" | "pop" => {
                    Ok(Value::native(name, Some(target.clone())))
                }
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            Value::Func(f) => match name {
                "name" => Ok(f
                    .name
                    .as_ref()
                    .map(|n| Value::Str(n.clone()))
                    .unwrap_or(Value::Null)),
                "parent" => Ok(f
                    .parent
                    .as_ref()
                    .and_then(|p| p.upgrade())
                    .unwrap_or(Value::Null)),
                "partial_args" => Ok(Value::list(f.partial_args.clone())),
                "partial_kwargs" => {
                    let mut dict = crate::value::DictData::default();
                    for (k, v) in &f.partial_kwargs {
                        dict.set(DictKey::Str(k.clone()), Value::Str(k.clone()), v.clone());
                    }
                    Ok(Value::Dict(Rc::new(RefCell::new(dict))))
                }
                "without_partials" => Ok(Value::native(name, Some(target.clone()))),
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            Value::Native(n) => match name {
                "name" => Ok(Value::Str(n.name.clone())),
                "partial_args" => Ok(Value::list(n.partial_args.clone())),
                "partial_kwargs" => Ok(Value::Dict(Rc::new(RefCell::new(
                    crate::value::DictData::default(),
                )))),
                "without_partials" => Ok(Value::native(name, Some(target.clone()))),
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            Value::Property(p) => match name {
                "func" => Ok(p.getter.clone()),
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            Value::Pattern(re) => match name {
                "test" | "find" | "find_all" | "replace" => {
                    Ok(Value::native(name, Some(target.clone())))
                }
                "source" => Ok(Value::Str(re.as_str().to_string())),
                _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                    .with_span(start)),
            },
            _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                .with_span(start)),
        }
    }

    fn type_attr(
        &mut self,
        ty: &Rc<TypeData>,
        name: &str,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match name {
            "name" => Ok(Value::Str(ty.name.clone())),
            "check" => Ok(Value::native("check", Some(Value::Type(Rc::clone(ty))))),
            _ => Err(RuntimeError::attribute(format!("Attribute Not Found: {:?}", name))
                .with_span(start)),
        }
    }

    pub(crate) fn call_native(
        &mut self,
        native: &Rc<NativeData>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let mut all_args = native.partial_args.clone();
        all_args.extend(args);
        let args = all_args;
        match &native.receiver {
            None => self.call_root_native(&native.name, args, kwargs, start),
            Some(receiver) => {
                let receiver = receiver.clone();
                self.call_method_native(&receiver, &native.name, args, start)
            }
        }
    }

    fn call_root_native(
        &mut self,
        name: &str,
        args: Vec<Value>,
        _kwargs: Vec<(String, Value)>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match name {
            "print" => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in &args {
                    parts.push(self.str_value(arg, start)?);
                }
                self.output.push_str(&parts.join(" "));
                self.output.push('\n');
                Ok(Value::Null)
            }
            "assert" => {
                let cond = args.first().cloned().unwrap_or(Value::Null);
                if self.bool_value(&cond, start)? {
                    return Ok(Value::Null);
                }
                let message = match args.get(1) {
                    Some(Value::Null) | None => "Assertion failed".to_string(),
                    Some(msg) => self.str_value(msg, start)?,
                };
                Err(RuntimeError::new(ErrorKind::Assertion, message).with_span(start))
            }
            "id" => {
                let value = args.first().cloned().unwrap_or(Value::Null);
                Ok(Value::Num(value.identity() as f64))
            }
            "dir" => {
                let value = args.first().cloned().unwrap_or(Value::Null);
                let full = matches!(args.get(1), Some(Value::Num(n)) if *n == 1.0);
                let mut names: Vec<String> = match &value {
                    Value::Object(o) => o.ns.public.borrow().keys().cloned().collect(),
                    Value::Type(t) => t.ns.public.borrow().keys().cloned().collect(),
                    _ => Vec::new(),
                };
                if full {
                    if let Value::Object(o) = &value {
                        names.extend(o.ns.private.borrow().keys().map(|k| format!("${}", k)));
                        names.extend(
                            o.ns.specs
                                .borrow()
                                .keys()
                                .map(|s| format!("%{}", s.as_str())),
                        );
                    }
                }
                names.sort();
                Ok(Value::list(names.into_iter().map(Value::Str).collect()))
            }
            "property" => {
                let getter = args.first().cloned().ok_or_else(|| {
                    RuntimeError::argument("Required positional argument was not passed: \"getter\"")
                        .with_span(start)
                })?;
                if !matches!(getter, Value::Func(_) | Value::Native(_)) {
                    let rendered = self.repr_value(&getter, start)?;
                    return Err(RuntimeError::type_error(format!(
                        "Expected func, received {} instead",
                        rendered
                    ))
                    .with_span(start));
                }
                Ok(Value::Property(Rc::new(PropertyData {
                    getter,
                    setter: args.get(1).cloned(),
                })))
            }
            _ => Err(RuntimeError::name(format!("Unknown builtin {:?}", name)).with_span(start)),
        }
    }

    fn call_method_native(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match (receiver, name) {
            (Value::Str(s), _) => self.call_str_method(s.clone(), name, args, start),
            (Value::List(items), "append") => {
                let item = args.first().cloned().unwrap_or(Value::Null);
                items.borrow_mut().push(item);
                Ok(Value::Null)
            }
            (Value::List(items), "remove") => {
                let item = args.first().cloned().unwrap_or(Value::Null);
                let mut items = items.borrow_mut();
                match items.iter().position(|v| values_equal(v, &item)) {
                    Some(idx) => {
                        items.remove(idx);
                        Ok(Value::Null)
                    }
                    None => {
                        Err(RuntimeError::value("Item not found in list").with_span(start))
                    }
                }
            }
            (Value::List(items), "pop") => {
                let idx = match args.first() {
                    Some(Value::Num(n)) => *n,
                    Some(other) => {
                        let rendered = self.repr_value(other, start)?;
                        return Err(RuntimeError::type_error(format!(
                            "expected num, got {} instead",
                            rendered
                        ))
                        .with_span(start));
                    }
                    None => -1.0,
                };
                let mut items = items.borrow_mut();
                let len = items.len();
                let i = idx.to_i64().unwrap_or(0);
                let i = if i < 0 { i + len as i64 } else { i };
                if i < 0 || i as usize >= len {
                    return Ok(Value::Null);
                }
                Ok(items.remove(i as usize))
            }
            (Value::Dict(d), "get") => {
                let key = args.first().cloned().unwrap_or(Value::Null);
                let default = args.get(1).cloned().unwrap_or(Value::Null);
                Ok(d.borrow().get(&dict_key(&key)).unwrap_or(default))
            }
            (Value::Dict(d), "set") => {
                let key = args.first().cloned().unwrap_or(Value::Null);
                let value = args.get(1).cloned().unwrap_or(Value::Null);
                d.borrow_mut().set(dict_key(&key), key, value.clone());
                Ok(value)
            }
            (Value::Dict(d), "keys") => {
                let keys = d.borrow().entries.iter().map(|(_, k, _)| k.clone()).collect();
                Ok(Value::list(keys))
            }
            (Value::Dict(d), "values") => {
                let values = d.borrow().entries.iter().map(|(_, _, v)| v.clone()).collect();
                Ok(Value::list(values))
            }
            (Value::Dict(d), "items") => {
                let items = d
                    .borrow()
                    .entries
                    .iter()
                    .map(|(_, k, v)| Value::list(vec![k.clone(), v.clone()]))
                    .collect();
                Ok(Value::list(items))
            }
            (Value::Dict(d), "pop") => {
                let key = args.first().cloned().unwrap_or(Value::Null);
                let removed = d.borrow_mut().remove(&dict_key(&key));
                match removed {
                    Some(value) => Ok(value),
                    None => match args.get(1) {
                        Some(default) => Ok(default.clone()),
                        None => {
                            let rendered = self.repr_value(&key, start)?;
                            Err(RuntimeError::new(
                                ErrorKind::Key,
                                format!("Key {} was not found", rendered),
                            )
                            .with_span(start))
                        }
                    },
                }
            }
            (Value::Func(f), "without_partials") => {
                Ok(Value::Func(Rc::new(f.with_partials(Vec::new(), Vec::new()))))
            }
            (Value::Native(n), "without_partials") => {
                Ok(Value::native(&n.name, n.receiver.clone()))
            }
            (Value::Type(t), "check") => {
                let value = args.first().cloned().unwrap_or(Value::Null);
                let matched = match t.builtin {
                    Some(kind) => builtin_check(kind, &t.name, &value),
                    None => value.type_label() == t.name,
                };
                Ok(Value::Num(if matched { 1.0 } else { 0.0 }))
            }
            (Value::Pattern(re), "test") => {
                let text = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    _ => return Err(RuntimeError::type_error("Expected str").with_span(start)),
                };
                Ok(Value::Bool(re.is_match(&text)))
            }
            (Value::Pattern(re), "find") => {
                let text = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    _ => return Err(RuntimeError::type_error("Expected str").with_span(start)),
                };
                Ok(re
                    .find(&text)
                    .map(|m| Value::Str(m.as_str().to_string()))
                    .unwrap_or(Value::Null))
            }
            (Value::Pattern(re), "find_all") => {
                let text = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    _ => return Err(RuntimeError::type_error("Expected str").with_span(start)),
                };
                Ok(Value::list(
                    re.find_iter(&text)
                        .map(|m| Value::Str(m.as_str().to_string()))
                        .collect(),
                ))
            }
            (Value::Pattern(re), "replace") => {
                let text = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    _ => return Err(RuntimeError::type_error("Expected str").with_span(start)),
                };
                let repl = match args.get(1) {
                    Some(Value::Str(s)) => s.clone(),
                    _ => return Err(RuntimeError::type_error("Expected str").with_span(start)),
                };
                Ok(Value::Str(re.replace_all(&text, repl.as_str()).into_owned()))
            }
            (Value::Object(o), "get_specs") => {
                let mut dict = crate::value::DictData::default();
                let specs = o.ns.specs.borrow().clone();
                for (spec, value) in specs {
                    let key = spec.as_str().to_string();
                    dict.set(DictKey::Str(key.clone()), Value::Str(key), value);
                }
                Ok(Value::Dict(Rc::new(RefCell::new(dict))))
            }
            _ => Err(RuntimeError::attribute(format!(
                "Attribute Not Found: {:?}",
                name
            ))
            .with_span(start)),
        }
    }

    fn call_str_method(
        &mut self,
        s: String,
        name: &str,
        args: Vec<Value>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let str_arg = |idx: usize| -> Result<String, RuntimeError> {
            match args.get(idx) {
                Some(Value::Str(v)) => Ok(v.clone()),
                Some(_) | None => {
                    Err(RuntimeError::type_error("Expected str argument").with_span(start))
                }
            }
        };
        match name {
            "format" => {
                let mut out = s;
                for arg in &args {
                    let rendered = self.str_value(arg, start)?;
                    out = out.replacen("{}", &rendered, 1);
                }
                Ok(Value::Str(out))
            }
            "upper" => Ok(Value::Str(s.to_uppercase())),
            "lower" => Ok(Value::Str(s.to_lowercase())),
            "casefold" => Ok(Value::Str(s.to_lowercase())),
            "capitalize" => {
                let mut chars = s.chars();
                Ok(Value::Str(match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }))
            }
            "title" => {
                let mut out = String::with_capacity(s.len());
                let mut at_word_start = true;
                for c in s.chars() {
                    if c.is_alphanumeric() {
                        if at_word_start {
                            out.extend(c.to_uppercase());
                        } else {
                            out.extend(c.to_lowercase());
                        }
                        at_word_start = false;
                    } else {
                        out.push(c);
                        at_word_start = true;
                    }
                }
                Ok(Value::Str(out))
            }
            "count" => {
                let sub = str_arg(0)?;
                if sub.is_empty() {
                    return Ok(Value::Num((s.graphemes(true).count() + 1) as f64));
                }
                Ok(Value::Num(s.matches(&sub).count() as f64))
            }
            "endswith" => Ok(Value::Bool(s.ends_with(&str_arg(0)?))),
            "startswith" => Ok(Value::Bool(s.starts_with(&str_arg(0)?))),
            "index" => {
                let sub = str_arg(0)?;
                match s.find(&sub) {
                    Some(byte_idx) => {
                        let chars_before = s[..byte_idx].graphemes(true).count();
                        Ok(Value::Num(chars_before as f64))
                    }
                    None => Err(RuntimeError::value("substring not found").with_span(start)),
                }
            }
            "is_alnum" => Ok(Value::Bool(
                !s.is_empty() && s.chars().all(char::is_alphanumeric),
            )),
            "is_alpha" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic))),
            "is_ascii" => Ok(Value::Bool(s.is_ascii())),
            "is_digit" => Ok(Value::Bool(
                !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
            )),
            "is_numeric" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_numeric))),
            "is_lower" => Ok(Value::Bool(
                s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase),
            )),
            "is_upper" => Ok(Value::Bool(
                s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase),
            )),
            "is_space" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_whitespace))),
            "replace" => {
                let before = str_arg(0)?;
                let after = str_arg(1)?;
                let count = match args.get(2) {
                    Some(Value::Num(n)) if *n >= 0.0 => n.to_usize().unwrap_or(0),
                    _ => usize::MAX,
                };
                if count == usize::MAX {
                    Ok(Value::Str(s.replace(&before, &after)))
                } else {
                    Ok(Value::Str(s.replacen(&before, &after, count)))
                }
            }
            "remove_prefix" => {
                let prefix = str_arg(0)?;
                Ok(Value::Str(
                    s.strip_prefix(&prefix).unwrap_or(&s).to_string(),
                ))
            }
            "remove_suffix" => {
                let suffix = str_arg(0)?;
                Ok(Value::Str(
                    s.strip_suffix(&suffix).unwrap_or(&s).to_string(),
                ))
            }
            "strip" | "lstrip" | "rstrip" => {
                let set: Vec<char> = match args.first() {
                    Some(Value::Str(v)) => v.chars().collect(),
                    None => vec![' ', '\t', '\n', '\r'],
                    Some(_) => {
                        return Err(RuntimeError::type_error("Expected str argument")
                            .with_span(start));
                    }
                };
                let stripped = match name {
                    "strip" => s.trim_matches(|c| set.contains(&c)),
                    "lstrip" => s.trim_start_matches(|c| set.contains(&c)),
                    _ => s.trim_end_matches(|c| set.contains(&c)),
                };
                Ok(Value::Str(stripped.to_string()))
            }
            "split" => {
                let delim = str_arg(0)?;
                if delim.is_empty() {
                    return Err(RuntimeError::value("empty separator").with_span(start));
                }
                Ok(Value::list(
                    s.split(&delim)
                        .map(|part| Value::Str(part.to_string()))
                        .collect(),
                ))
            }
            _ => Err(RuntimeError::attribute(format!(
                "Attribute Not Found: {:?}",
                name
            ))
            .with_span(start)),
        }
    }
}
