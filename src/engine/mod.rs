//! The core Lisp engine: AST, evaluator, environments, builtins, and special forms.

pub mod ast;
pub mod builtins;
pub mod env;
pub mod eval;
pub mod special_forms;
