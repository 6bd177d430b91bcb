#![allow(clippy::result_large_err)]

//! Safulate: a small dynamically-typed scripting language with first-class
//! objects, operator-dispatched specs, partial application, decorators and
//! depth-addressed break/continue.
//!
//! The crate exposes a library front door for embedding:
//!
//! ```
//! use safulate::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.run_source("print(1 + 2);").unwrap();
//! assert_eq!(interp.output(), "3\n");
//! ```

mod ast;
mod interpreter;
mod lexer;
mod parser;
pub mod repl;
mod runtime;
mod value;

pub use ast::Program;
pub use interpreter::Interpreter;
pub use runtime::modules::{ModuleError, ModuleLoader};
pub use runtime::version::Version;
pub use value::{ErrorKind, RuntimeError, Value};

/// Parse a source string into a program without running it.
pub fn parse(source: &str) -> Result<Program, RuntimeError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    parser::Parser::new(tokens).parse_program()
}
