// crates/core/src/script/mod.rs

//! toolscript: the small s-expression language generated tools are written in.
//!
//! Sources are read into [`reader::Form`]s, analyzed into [`ast::TopLevel`]
//! items and run by a budgeted tree-walking [`eval::Interpreter`]. The only
//! outside world a tool can touch is the builtin set in [`stdlib`].

pub mod ast;
pub mod error;
pub mod eval;
pub mod reader;
pub mod stdlib;
pub mod value;

pub use ast::{parse_program, LambdaDef, Param, TopLevel};
pub use error::{ParseError, RuntimeError, RuntimeResult};
pub use eval::{make_closure, ExecutionLimits, Globals, Interpreter};
pub use value::{Closure, Function, Value};
