use std::cell::RefCell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::callable::{Callable, Instance};

/// A runtime value. Lists, objects and instances are shared and mutable, everything else is
/// copied or immutable.
#[derive(Clone)]
pub enum Value {
    Num(f64),
    Str(Rc<str>),
    Bool(bool),
    Null,
    Undefined,
    List(Rc<RefCell<Vec<Value>>>),
    // properties keep insertion order
    Object(Rc<RefCell<Vec<(String, Value)>>>),
    Callable(Callable),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    pub(crate) fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub(crate) fn object(properties: Vec<(String, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(properties)))
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Callable(Callable::Class(_)) => "class",
            Value::Callable(_) => "function",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other, &mut Vec::new())
    }
}

fn shared_ptr<T>(rc: &Rc<T>) -> *const () {
    Rc::as_ptr(rc).cast()
}

// Lists and objects can contain themselves. A pair already being compared further up
// counts as equal.
fn values_equal(lhs: &Value, rhs: &Value, open: &mut Vec<(*const (), *const ())>) -> bool {
    match (lhs, rhs) {
        (Value::Num(lhs), Value::Num(rhs)) => lhs == rhs,
        (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
        (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
        (Value::Null, Value::Null) => true,
        (Value::Undefined, Value::Undefined) => true,
        (Value::List(lhs), Value::List(rhs)) => {
            let pair = (shared_ptr(lhs), shared_ptr(rhs));
            if Rc::ptr_eq(lhs, rhs) || open.contains(&pair) {
                return true;
            }

            open.push(pair);
            let (lhs, rhs) = (lhs.borrow(), rhs.borrow());
            let equal = lhs.len() == rhs.len()
                && lhs
                    .iter()
                    .zip(rhs.iter())
                    .all(|(lhs, rhs)| values_equal(lhs, rhs, open));
            open.pop();
            equal
        }
        (Value::Object(lhs), Value::Object(rhs)) => {
            let pair = (shared_ptr(lhs), shared_ptr(rhs));
            if Rc::ptr_eq(lhs, rhs) || open.contains(&pair) {
                return true;
            }

            open.push(pair);
            let (lhs, rhs) = (lhs.borrow(), rhs.borrow());
            let equal = lhs.len() == rhs.len()
                && lhs.iter().zip(rhs.iter()).all(|((lkey, lhs), (rkey, rhs))| {
                    lkey == rkey && values_equal(lhs, rhs, open)
                });
            open.pop();
            equal
        }
        (Value::Callable(lhs), Value::Callable(rhs)) => lhs == rhs,
        (Value::Instance(lhs), Value::Instance(rhs)) => Rc::ptr_eq(lhs, rhs),
        _ => false,
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::list(values)
    }
}

macro_rules! impl_from_num_for_value {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Value {
                    Value::Num(n as f64)
                }
            }
        )*
    }
}

impl_from_num_for_value!(u8 i8 u16 i16 u32 i32 u64 i64 usize isize f32 f64);

// Integral numbers keep a trailing `.0`
fn write_number(f: &mut Formatter<'_>, n: f64) -> std::fmt::Result {
    if n.is_finite() && n.fract() == 0.0 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(val) => write!(f, "{:?}", val),
            other => write_value(f, other, &mut Vec::new()),
        }
    }
}

// `open` holds the lists and objects printed further up. A repeat prints as `[...]` or
// `{...}`.
fn write_value(
    f: &mut Formatter<'_>,
    value: &Value,
    open: &mut Vec<*const ()>,
) -> std::fmt::Result {
    match value {
        Value::Num(val) => write_number(f, *val),
        Value::Str(val) => write!(f, "{}", val),
        Value::Bool(val) => write!(f, "{}", val),
        Value::Null => write!(f, "null"),
        Value::Undefined => write!(f, "undefined"),
        Value::List(values) => {
            let ptr = shared_ptr(values);
            if open.contains(&ptr) {
                return write!(f, "[...]");
            }

            open.push(ptr);
            write!(f, "[")?;
            for (i, value) in values.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, value, open)?;
            }
            open.pop();
            write!(f, "]")
        }
        Value::Object(properties) => {
            let ptr = shared_ptr(properties);
            if open.contains(&ptr) {
                return write!(f, "{{...}}");
            }

            let properties = properties.borrow();
            if properties.is_empty() {
                return write!(f, "{{}}");
            }

            open.push(ptr);
            write!(f, "{{")?;
            for (i, (key, value)) in properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: ", key)?;
                write_value(f, value, open)?;
            }
            open.pop();
            write!(f, "}}")
        }
        Value::Callable(callable) => write!(f, "{}", callable),
        Value::Instance(instance) => write!(f, "{}", RefCell::borrow(instance)),
    }
}

#[cfg(test)]
mod tests {
    use crate::value::Value;

    #[test]
    fn test_number_formatting() {
        let tests = [
            (Value::from(3), "3.0"),
            (Value::from(-2.0), "-2.0"),
            (Value::from(0.5), "0.5"),
            (Value::from(1.25), "1.25"),
            (Value::from(f64::NAN), "NaN"),
            (Value::from(f64::INFINITY), "inf"),
        ];

        for (value, expected) in tests {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn test_display() {
        let list = Value::from(vec![Value::from(1), Value::from("a"), Value::Null]);
        assert_eq!(list.to_string(), "[1.0, a, null]");

        let object = Value::object(vec![
            (String::from("a"), Value::from(1)),
            (String::from("b"), Value::Undefined),
        ]);
        assert_eq!(object.to_string(), "{a: 1.0, b: undefined}");
        assert_eq!(Value::object(Vec::new()).to_string(), "{}");
        assert_eq!(Value::from(true).to_string(), "true");
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from("a"), Value::from(String::from("a")));
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::from(0), Value::from(false));
        assert_ne!(Value::from("1.0"), Value::from(1));

        let lhs = Value::from(vec![Value::from(1), Value::from(2)]);
        let rhs = Value::from(vec![Value::from(1), Value::from(2)]);
        assert_eq!(lhs, rhs);

        let other = Value::from(vec![Value::from(2), Value::from(1)]);
        assert_ne!(lhs, other);

        let lhs = Value::object(vec![(String::from("x"), Value::from(1))]);
        let rhs = Value::object(vec![(String::from("x"), Value::from(1))]);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_self_referencing_values() {
        let list = Value::from(vec![Value::from(1)]);
        if let Value::List(values) = &list {
            values.borrow_mut().push(list.clone());
        }
        assert_eq!(list.to_string(), "[1.0, [...]]");

        let object = Value::object(vec![(String::from("a"), Value::from(1))]);
        if let Value::Object(properties) = &object {
            properties
                .borrow_mut()
                .push((String::from("me"), object.clone()));
        }
        assert_eq!(object.to_string(), "{a: 1.0, me: {...}}");

        // the same list twice side by side is not a cycle
        let inner = Value::from(vec![Value::from(2)]);
        let outer = Value::from(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "[[2.0], [2.0]]");
    }

    #[test]
    fn test_self_referencing_equality() {
        let cyclic = || {
            let list = Value::from(vec![Value::from(1)]);
            if let Value::List(values) = &list {
                values.borrow_mut().push(list.clone());
            }
            list
        };

        let (lhs, rhs) = (cyclic(), cyclic());
        assert!(lhs == lhs.clone());
        assert!(lhs == rhs);
        assert!(lhs != Value::from(vec![Value::from(1), Value::Null]));

        let object = Value::object(Vec::new());
        if let Value::Object(properties) = &object {
            properties
                .borrow_mut()
                .push((String::from("me"), object.clone()));
        }
        let other = Value::object(vec![(String::from("me"), object.clone())]);
        assert!(object == other);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::from(1).type_name(), "number");
        assert_eq!(Value::from("s").type_name(), "string");
        assert_eq!(Value::list(Vec::new()).type_name(), "list");
        assert_eq!(Value::Undefined.type_name(), "undefined");
    }
}
