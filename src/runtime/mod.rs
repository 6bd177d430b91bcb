pub(crate) mod builtins;
pub(crate) mod calls;
pub(crate) mod modules;
pub(crate) mod specs;
pub(crate) mod version;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{ParentRef, Value};

pub(crate) type ScopeRef = Rc<RefCell<Scope>>;

/// One frame of the lexical environment. A frame optionally carries a weak
/// binding to an object; declarations and bare-name lookups route through it.
#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) vars: HashMap<String, Value>,
    pub(crate) binding: Option<ParentRef>,
    pub(crate) parent: Option<ScopeRef>,
}

impl Scope {
    pub(crate) fn root(binding: Option<ParentRef>) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            binding,
            parent: None,
        }))
    }

    pub(crate) fn child(parent: &ScopeRef, binding: Option<ParentRef>) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            binding,
            parent: Some(Rc::clone(parent)),
        }))
    }
}

/// Where an assignment or read resolved to.
pub(crate) enum Slot {
    Var(ScopeRef, String),
    Priv(Value, String),
    Pub(Value, String),
}

const PARENT_CHAIN_LIMIT: usize = 32;

fn chain_lookup(binding: &ParentRef, name: &str) -> Option<(Value, Value)> {
    let mut owner = binding.upgrade()?;
    for _ in 0..PARENT_CHAIN_LIMIT {
        if let Some(v) = owner.get_priv(name) {
            return Some((owner, v));
        }
        if let Some(v) = owner.get_pub(name) {
            return Some((owner, v));
        }
        owner = owner.object_parent()?;
    }
    None
}

/// Resolve a bare name: frame locals first, then the bound object's private
/// and public channels (walking its parent chain), then enclosing frames.
/// Functions found on an object come back bound to it.
pub(crate) fn lookup(scope: &ScopeRef, name: &str) -> Option<Value> {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let s = current.borrow();
            if let Some(v) = s.vars.get(name) {
                return Some(v.clone());
            }
            if let Some(binding) = &s.binding {
                if let Some((owner, v)) = chain_lookup(binding, name) {
                    return Some(bind_if_method(v, &owner));
                }
            }
            s.parent.clone()
        };
        match next {
            Some(p) => current = p,
            None => return None,
        }
    }
}

pub(crate) fn bind_if_method(value: Value, owner: &Value) -> Value {
    match (&value, ParentRef::from_value(owner)) {
        (Value::Func(f), Some(parent)) => Value::Func(Rc::new(f.bound(parent))),
        _ => value,
    }
}

/// Find the slot a plain assignment writes to, walking outward. Returns
/// `None` when no binding exists anywhere (assignment does not declare).
pub(crate) fn resolve_slot(scope: &ScopeRef, name: &str) -> Option<Slot> {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let s = current.borrow();
            if s.vars.contains_key(name) {
                return Some(Slot::Var(Rc::clone(&current), name.to_string()));
            }
            if let Some(binding) = &s.binding {
                let mut owner = binding.upgrade();
                let mut hops = 0;
                while let Some(o) = owner {
                    if o.get_priv(name).is_some() {
                        return Some(Slot::Priv(o, name.to_string()));
                    }
                    if o.get_pub(name).is_some() {
                        return Some(Slot::Pub(o, name.to_string()));
                    }
                    hops += 1;
                    if hops >= PARENT_CHAIN_LIMIT {
                        break;
                    }
                    owner = o.object_parent();
                }
            }
            s.parent.clone()
        };
        match next {
            Some(p) => current = p,
            None => return None,
        }
    }
}

/// Remove the binding owned by the nearest frame that has it.
pub(crate) fn remove_binding(scope: &ScopeRef, name: &str) -> bool {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let mut s = current.borrow_mut();
            if s.vars.remove(name).is_some() {
                return true;
            }
            if let Some(binding) = &s.binding {
                if let Some(owner) = binding.upgrade() {
                    let removed = match &owner {
                        Value::Object(o) => o.ns.public.borrow_mut().remove(name).is_some(),
                        Value::Type(t) => t.ns.public.borrow_mut().remove(name).is_some(),
                        _ => false,
                    };
                    if removed {
                        return true;
                    }
                }
            }
            s.parent.clone()
        };
        match next {
            Some(p) => current = p,
            None => return false,
        }
    }
}

/// The innermost frame binding, if any. Private reads and `$` references
/// use only the current frame, never enclosing ones.
pub(crate) fn current_binding(scope: &ScopeRef) -> Option<Value> {
    scope.borrow().binding.as_ref().and_then(ParentRef::upgrade)
}

#[cfg(test)]
mod tests {
    use super::{Scope, lookup, resolve_slot, Slot};
    use crate::value::Value;

    #[test]
    fn lookup_walks_outward() {
        let root = Scope::root(None);
        root.borrow_mut()
            .vars
            .insert("x".to_string(), Value::Num(1.0));
        let inner = Scope::child(&root, None);
        assert!(matches!(lookup(&inner, "x"), Some(Value::Num(n)) if n == 1.0));
        assert!(lookup(&inner, "y").is_none());
    }

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let root = Scope::root(None);
        root.borrow_mut()
            .vars
            .insert("x".to_string(), Value::Num(1.0));
        let inner = Scope::child(&root, None);
        inner
            .borrow_mut()
            .vars
            .insert("x".to_string(), Value::Num(2.0));
        assert!(matches!(lookup(&inner, "x"), Some(Value::Num(n)) if n == 2.0));
    }

    #[test]
    fn assignment_resolves_to_the_owning_frame() {
        let root = Scope::root(None);
        root.borrow_mut()
            .vars
            .insert("x".to_string(), Value::Num(1.0));
        let inner = Scope::child(&root, None);
        match resolve_slot(&inner, "x") {
            Some(Slot::Var(frame, name)) => {
                assert_eq!(name, "x");
                assert!(std::rc::Rc::ptr_eq(&frame, &root));
            }
            _ => panic!("expected a frame slot"),
        }
        assert!(resolve_slot(&inner, "missing").is_none());
    }
}
