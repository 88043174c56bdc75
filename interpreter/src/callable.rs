use std::cell::RefCell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use ahash::AHashMap;
use astrum_core::Token;

use crate::ast::{ClassDecl, FunctionDecl};
use crate::env::Environment;
use crate::error::{Error, RuntimeErrorKind};
use crate::interpreter::{Interpreter, Signal};
use crate::value::Value;

pub(crate) const CONSTRUCTOR: &str = "constructor";

/// Everything a call expression can invoke. The set of call targets is fixed, so this is a
/// closed enum rather than a trait object.
#[derive(Clone)]
pub enum Callable {
    Function(Rc<Function>),
    BoundMethod(Rc<BoundMethod>),
    Native(Rc<NativeFunction>),
    Class(Rc<Class>),
}

impl Callable {
    pub(crate) fn name(&self) -> &str {
        match self {
            Callable::Function(function) => function.name(),
            Callable::BoundMethod(method) => method.function.name(),
            Callable::Native(native) => &native.name,
            Callable::Class(class) => &class.name,
        }
    }

    pub(crate) fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::BoundMethod(method) => method.function.arity(),
            Callable::Native(native) => native.arity,
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invokes the target. Arity is checked by the caller before anything is evaluated here.
    pub(crate) fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        args: &[Value],
    ) -> Result<Value, Error> {
        match self {
            Callable::Function(function) => {
                execute_function(&function.declaration, Rc::clone(&function.closure), interpreter, args)
            }
            Callable::BoundMethod(method) => method.call(interpreter, args),
            Callable::Native(native) => (native.func)(interpreter, paren, args),
            Callable::Class(class) => Class::instantiate(class, interpreter, paren, args),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(lhs), Callable::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Callable::BoundMethod(lhs), Callable::BoundMethod(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Callable::Native(lhs), Callable::Native(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Callable::Class(lhs), Callable::Class(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl Display for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Function(function) if function.anonymous => write!(f, "<anonymous function>"),
            Callable::Function(_) | Callable::BoundMethod(_) => write!(f, "<function {}>", self.name()),
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Class(class) => write!(f, "<class {}>", class.name),
        }
    }
}

// Closures can reach themselves through their environment, so only the name is printed
impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

pub(crate) type NativeFn = dyn Fn(&mut Interpreter, &Token, &[Value]) -> Result<Value, Error>;

// `NativeFunction` bridges native rust calls and the interpreter. These live in the global
// namespace and look like any other function at the call site. The token is the call site's
// closing paren, for error positions.
pub struct NativeFunction {
    name: String,
    arity: usize,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub(crate) fn new<F>(name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&mut Interpreter, &Token, &[Value]) -> Result<Value, Error> + 'static,
    {
        NativeFunction {
            name: String::from(name),
            arity,
            func: Box::new(func),
        }
    }
}

pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    anonymous: bool,
}

impl Function {
    // The declaration is shared with the tree, nothing is copied per closure
    pub(crate) fn new(
        declaration: &Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        anonymous: bool,
    ) -> Self {
        Function {
            declaration: Rc::clone(declaration),
            closure,
            anonymous,
        }
    }

    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

// Helper that runs both plain functions and bound methods: a new frame under the closure holds
// the parameters, and a return signal ends the body early.
fn execute_function(
    declaration: &FunctionDecl,
    closure: Rc<RefCell<Environment>>,
    interpreter: &mut Interpreter,
    args: &[Value],
) -> Result<Value, Error> {
    let mut env = Environment::with(closure);
    for (param, arg) in declaration.params.iter().zip(args) {
        env.define(&param.name, arg.clone()).map_err(|_| {
            Error::runtime_error(
                &param.left_token,
                RuntimeErrorKind::AlreadyDeclared,
                &format!("Parameter '{}' is already declared.", param.name),
            )
        })?;
    }

    match interpreter.execute_block_with_env(&declaration.body, Rc::new(RefCell::new(env)))? {
        Signal::Return(value) => Ok(value),
        Signal::Proceed => Ok(Value::Undefined),
    }
}

// A method together with a frame that binds `this`. The method body is shared with the class
// through an Rc, binding only allocates the small frame.
pub struct BoundMethod {
    function: Rc<Function>,
    closure: Rc<RefCell<Environment>>,
    instance: Rc<RefCell<Instance>>,
    is_constructor: bool,
}

impl BoundMethod {
    pub(crate) fn bind(function: Rc<Function>, instance: Rc<RefCell<Instance>>) -> Self {
        let closure = Rc::new(RefCell::new(Environment::with(Rc::clone(
            &function.closure,
        ))));
        closure
            .borrow_mut()
            .define_or_replace("this", Value::Instance(Rc::clone(&instance)));

        BoundMethod {
            is_constructor: function.name() == CONSTRUCTOR,
            function,
            closure,
            instance,
        }
    }

    fn call(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, Error> {
        let value = execute_function(
            &self.function.declaration,
            Rc::clone(&self.closure),
            interpreter,
            args,
        )?;

        // constructors always hand back the instance they initialised
        if self.is_constructor {
            Ok(Value::Instance(Rc::clone(&self.instance)))
        } else {
            Ok(value)
        }
    }
}

pub struct Class {
    name: String,
    declaration: Rc<ClassDecl>,
    methods: AHashMap<String, Rc<Function>>,
    // the environment the class was declared in, parent of every `this` frame
    closure: Rc<RefCell<Environment>>,
}

impl Class {
    pub(crate) fn new(declaration: &Rc<ClassDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        let methods = declaration
            .methods
            .iter()
            .map(|method| {
                (
                    method.name.lexeme.clone(),
                    Rc::new(Function::new(method, Rc::clone(&closure), false)),
                )
            })
            .collect();

        Class {
            name: declaration.name.lexeme.clone(),
            declaration: Rc::clone(declaration),
            methods,
            closure,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).map(Rc::clone)
    }

    fn arity(&self) -> usize {
        match self.find_method(CONSTRUCTOR) {
            Some(constructor) => constructor.arity(),
            _ => 0,
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(class = %class.name))]
    fn instantiate(
        class: &Rc<Class>,
        interpreter: &mut Interpreter,
        paren: &Token,
        args: &[Value],
    ) -> Result<Value, Error> {
        let instance = Instance::new(Rc::clone(class));

        // fields are initialised in declaration order, before the constructor sees the instance
        if !class.declaration.fields.is_empty() {
            let mut env = Environment::with(Rc::clone(&class.closure));
            env.define_or_replace("this", Value::Instance(Rc::clone(&instance)));
            let env = Rc::new(RefCell::new(env));

            for field in &class.declaration.fields {
                let value = interpreter.evaluate_with_env(&field.init, Rc::clone(&env))?;
                instance.borrow_mut().set(&field.name.lexeme, value);
            }
        }

        if let Some(constructor) = class.find_method(CONSTRUCTOR) {
            BoundMethod::bind(constructor, Rc::clone(&instance)).call(interpreter, args)?;
        }

        tracing::trace!(line = paren.line, "instantiated");
        Ok(Value::Instance(instance))
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: AHashMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(class: Rc<Class>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Instance {
            class,
            fields: AHashMap::new(),
        }))
    }

    /// Fields shadow methods. Every method lookup produces a freshly bound method.
    pub(crate) fn get(instance: &Rc<RefCell<Self>>, name: &str) -> Option<Value> {
        if let Some(field) = instance.borrow().fields.get(name) {
            return Some(field.clone());
        }

        let method = instance.borrow().class.find_method(name);
        method.map(|function| {
            Value::Callable(Callable::BoundMethod(Rc::new(BoundMethod::bind(
                function,
                Rc::clone(instance),
            ))))
        })
    }

    pub(crate) fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(String::from(name), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} instance>", self.class.name())
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
