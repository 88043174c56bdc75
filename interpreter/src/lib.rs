pub mod error;
pub mod interpreter;
pub mod parser;
pub mod session;
pub mod source;
pub mod value;

pub(crate) mod ast;
mod builtins;
mod callable;
pub(crate) mod env;
mod limits;
mod resolver;

pub use error::{Error, ResolveErrorKind, RuntimeErrorKind};
pub use interpreter::Interpreter;
pub use session::{Config, Session};
pub use value::Value;
