use std::time::{SystemTime, UNIX_EPOCH};

use astrum_core::Token;

use crate::error::{Error, RuntimeErrorKind};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Registers the host functions every program can see in its global scope.
pub(crate) fn register(interpreter: &mut Interpreter) {
    interpreter.define_native("print", 1, print);
    interpreter.define_native("readLine", 0, read_line);
    interpreter.define_native("map", 2, map);
    interpreter.define_native("len", 1, len);
    interpreter.define_native("push", 2, push);
    interpreter.define_native("clock", 0, clock);
}

// Arity is checked before a native runs, so this only fails on a registration mistake
fn arguments<'a, const N: usize>(paren: &Token, args: &'a [Value]) -> Result<&'a [Value; N], Error> {
    args.try_into().map_err(|_| {
        Error::runtime_error(
            paren,
            RuntimeErrorKind::ArityMismatch,
            &format!("Expected {} arguments but got {}.", N, args.len()),
        )
    })
}

fn io_error(paren: &Token, err: std::io::Error) -> Error {
    Error::runtime_error(paren, RuntimeErrorKind::Native, &format!("I/O error: {}.", err))
}

fn print(interpreter: &mut Interpreter, paren: &Token, args: &[Value]) -> Result<Value, Error> {
    let [value] = arguments(paren, args)?;
    interpreter
        .write_line(&value.to_string())
        .map_err(|err| io_error(paren, err))?;
    Ok(Value::Undefined)
}

fn read_line(interpreter: &mut Interpreter, paren: &Token, _: &[Value]) -> Result<Value, Error> {
    let mut line = String::new();
    let read = interpreter
        .read_line(&mut line)
        .map_err(|err| io_error(paren, err))?;
    if read == 0 {
        return Ok(Value::Undefined);
    }

    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Value::from(trimmed))
}

fn map(interpreter: &mut Interpreter, paren: &Token, args: &[Value]) -> Result<Value, Error> {
    let [list, function] = arguments(paren, args)?;
    let Value::List(values) = list else {
        return Err(Error::runtime_error(
            paren,
            RuntimeErrorKind::Native,
            &format!("map expects a list as its first argument, got {}.", list.type_name()),
        ));
    };

    // snapshot first, the callback may push to the list it is mapping
    let values = values.borrow().clone();
    let mut mapped = Vec::with_capacity(values.len());
    for value in values {
        mapped.push(interpreter.call_value(function, paren, &[value])?);
    }
    Ok(Value::list(mapped))
}

fn len(_: &mut Interpreter, paren: &Token, args: &[Value]) -> Result<Value, Error> {
    let [value] = arguments(paren, args)?;
    match value {
        Value::List(values) => Ok(Value::from(values.borrow().len())),
        Value::Str(text) => Ok(Value::from(text.chars().count())),
        other => Err(Error::runtime_error(
            paren,
            RuntimeErrorKind::Native,
            &format!("len expects a list or a string, got {}.", other.type_name()),
        )),
    }
}

fn push(_: &mut Interpreter, paren: &Token, args: &[Value]) -> Result<Value, Error> {
    let [list, value] = arguments(paren, args)?;
    match list {
        Value::List(values) => {
            let mut values = values.borrow_mut();
            values.push(value.clone());
            Ok(Value::from(values.len()))
        }
        other => Err(Error::runtime_error(
            paren,
            RuntimeErrorKind::Native,
            &format!("push expects a list as its first argument, got {}.", other.type_name()),
        )),
    }
}

fn clock(_: &mut Interpreter, paren: &Token, _: &[Value]) -> Result<Value, Error> {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| {
        Error::runtime_error(paren, RuntimeErrorKind::Native, &format!("{}.", err))
    })?;
    Ok(Value::from(since_epoch.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use astrum_core::tokenize;

    use crate::error::RuntimeErrorKind;
    use crate::interpreter::Interpreter;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::value::Value;

    fn evaluate(src: &str) -> Result<Value, crate::error::Error> {
        let tokens = tokenize(src).unwrap();
        let program = Parser::new(&tokens).parse().unwrap();
        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let input = Rc::new(RefCell::new(Cursor::new(Vec::new())));
        let mut interpreter = Interpreter::with_io(output, input);
        Resolver::new(&mut interpreter).resolve(&program).unwrap();
        interpreter.interpret(&program)
    }

    #[test]
    fn test_natives() {
        let tests = [
            ("len([1, 2, 3])", Value::from(3)),
            ("len(\"héllo\")", Value::from(5)),
            ("let xs = [1]\npush(xs, 2)\nxs", Value::from(vec![Value::from(1), Value::from(2)])),
            ("push([], 0)", Value::from(1)),
            (
                "map([1, 2], function(x) { return x * 10 })",
                Value::from(vec![Value::from(10), Value::from(20)]),
            ),
            ("map([], print)", Value::from(Vec::new())),
            ("clock() > 0", Value::from(true)),
            ("print(1)", Value::Undefined),
        ];

        for (src, expected) in tests {
            assert_eq!(evaluate(src).unwrap(), expected, "{}", src);
        }
    }

    #[test]
    fn test_native_errors() {
        let tests = [
            ("len(1)", RuntimeErrorKind::Native),
            ("push(\"a\", 1)", RuntimeErrorKind::Native),
            ("map(1, print)", RuntimeErrorKind::Native),
            ("map([1], function(a, b) { })", RuntimeErrorKind::ArityMismatch),
            ("clock(1)", RuntimeErrorKind::ArityMismatch),
        ];

        for (src, expected) in tests {
            let err = evaluate(src).unwrap_err();
            assert_eq!(err.runtime_kind(), Some(expected), "{}", src);
        }
    }
}
