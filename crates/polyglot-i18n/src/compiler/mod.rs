//! Message AST to closure compiler
//!
//! A parsed message is turned into either a constant string or a closure over
//! its sorted argument names whose body calls the fixed runtime helper
//! vocabulary. The compiler is a pure function of the AST; [`codegen`] renders
//! the result as JavaScript for bundler integrations.

pub mod ast;
pub mod codegen;
pub mod compile;
pub mod expr;

pub use ast::{ast_from_value, parse_ast, AstError, AstNode, AstOptions, NodeKind};
pub use codegen::{emit_expr, emit_message, import_declaration, rewrite_call};
pub use compile::{collect_helpers, compile, Closure, CompiledMessage};
pub use expr::{Expr, Helper, HelperCall, HelperSet, OptionKey, Options};
