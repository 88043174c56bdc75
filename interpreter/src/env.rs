use crate::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// One frame of the scope chain. Frames are shared between the evaluator and every closure
/// created while they were current, so they live behind `Rc<RefCell<_>>`.
#[derive(Debug, Default)]
pub(crate) struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: AHashMap<String, Value>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EnvError {
    Undefined,
    AlreadyDefined,
}

impl Environment {
    pub(crate) fn new() -> Self {
        Environment::default()
    }

    pub(crate) fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: AHashMap::new(),
        }
    }

    /// Binds a new name in this frame. Names already bound in this frame are rejected,
    /// shadowing a name from an enclosing frame is fine.
    pub(crate) fn define(&mut self, key: &str, value: Value) -> Result<(), EnvError> {
        if self.values.contains_key(key) {
            return Err(EnvError::AlreadyDefined);
        }
        self.values.insert(String::from(key), value);
        Ok(())
    }

    // Host registered natives replace whatever was bound before
    pub(crate) fn define_or_replace(&mut self, key: &str, value: Value) {
        self.values.insert(String::from(key), value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        if let Some(val) = self.values.get(key) {
            Some(val.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow().get(key)
        } else {
            None
        }
    }

    /// Looks `key` up in exactly the frame `dist` hops up the chain.
    pub(crate) fn get_at(&self, dist: usize, key: &str) -> Option<Value> {
        if dist == 0 {
            self.values.get(key).cloned()
        } else {
            self.enclosing
                .as_ref()
                .and_then(|parent| parent.borrow().get_at(dist - 1, key))
        }
    }

    pub(crate) fn assign(&mut self, key: &str, value: Value) -> Result<(), EnvError> {
        if let Some(val) = self.values.get_mut(key) {
            *val = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow_mut().assign(key, value)
        } else {
            Err(EnvError::Undefined)
        }
    }

    pub(crate) fn assign_at(
        &mut self,
        dist: usize,
        key: &str,
        value: Value,
    ) -> Result<(), EnvError> {
        if dist == 0 {
            if let Some(val) = self.values.get_mut(key) {
                *val = value;
                Ok(())
            } else {
                Err(EnvError::Undefined)
            }
        } else if let Some(parent) = &self.enclosing {
            parent.as_ref().borrow_mut().assign_at(dist - 1, key, value)
        } else {
            Err(EnvError::Undefined)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::env::{EnvError, Environment};
    use crate::value::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("foo", Value::from("bar")).unwrap();
        env.define("baz", Value::from(false)).unwrap();

        assert_eq!(env.get("foo"), Some(Value::from("bar")));
        assert_eq!(env.get("baz"), Some(Value::from(false)));
    }

    #[test]
    fn test_redefine_in_same_frame() {
        let mut env = Environment::new();
        env.define("foo", Value::from(1.0)).unwrap();
        assert_eq!(
            env.define("foo", Value::from(2.0)),
            Err(EnvError::AlreadyDefined)
        );
        assert_eq!(env.get("foo"), Some(Value::from(1.0)));

        env.define_or_replace("foo", Value::from(3.0));
        assert_eq!(env.get("foo"), Some(Value::from(3.0)));
    }

    #[test]
    fn test_throw_error_if_undefined() {
        let mut env = Environment::new();
        assert_eq!(
            Err(EnvError::Undefined),
            env.assign("foo", Value::from("bar"))
        );
        assert_eq!(None, env.get("foo"));
    }

    #[test]
    fn test_multi_level() {
        let env1 = Rc::new(RefCell::new(Environment::new()));
        env1.borrow_mut().define("foo", Value::from("bar")).unwrap();

        {
            let mut env2 = Environment::with(env1.clone());
            env2.define("foo", Value::from("foofoo")).unwrap();
            assert_eq!(env2.get_at(0, "foo"), Some(Value::from("foofoo")));
            assert_eq!(env2.get_at(1, "foo"), Some(Value::from("bar")));
            env2.assign_at(1, "foo", Value::from(false)).unwrap();
        }

        assert_eq!(env1.borrow().get("foo"), Some(Value::from(false)));
    }

    #[test]
    fn test_get_at_does_not_walk_past_frame() {
        let env1 = Rc::new(RefCell::new(Environment::new()));
        env1.borrow_mut().define("outer", Value::from(1.0)).unwrap();
        let env2 = Environment::with(env1);

        assert_eq!(env2.get_at(0, "outer"), None);
        assert_eq!(env2.get("outer"), Some(Value::from(1.0)));
        assert_eq!(env2.get_at(5, "outer"), None);
    }
}
