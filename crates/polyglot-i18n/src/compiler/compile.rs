//! AST to expression compilation

use super::ast::{AstNode, AstOptions};
use super::expr::{Expr, HelperCall, HelperSet, OptionKey, Options};
use crate::error::{CompileError, CompileResult};
use crate::pluralization::PluralCategory;
use std::collections::BTreeSet;

/// Build-time output for one message
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledMessage {
    /// Text that needs no runtime work
    Constant(String),
    /// Parameterized message
    Closure(Closure),
}

impl CompiledMessage {
    /// Helpers the message calls; empty for constants
    pub fn helpers(&self) -> HelperSet {
        match self {
            Self::Constant(_) => HelperSet::new(),
            Self::Closure(closure) => closure.helpers.clone(),
        }
    }

    /// Declared parameter order; empty for constants
    pub fn params(&self) -> &[String] {
        match self {
            Self::Constant(_) => &[],
            Self::Closure(closure) => &closure.params,
        }
    }

    /// Constant text, if the message has no parameters
    pub fn as_constant(&self) -> Option<&str> {
        match self {
            Self::Constant(text) => Some(text),
            Self::Closure(_) => None,
        }
    }
}

/// A compiled message body together with its call signature
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    /// Parameter names, sorted and deduplicated
    pub params: Vec<String>,
    /// Expression producing the message text
    pub body: Expr,
    /// Helpers the body calls
    pub helpers: HelperSet,
}

/// Compile a parsed message.
///
/// Pure function of the AST. Messages made only of literal text compile to a
/// constant; anything else becomes a closure over its sorted argument names.
pub fn compile(ast: &[AstNode]) -> CompileResult<CompiledMessage> {
    if let Some(text) = literal_text(ast) {
        return Ok(CompiledMessage::Constant(text));
    }

    let mut compiler = Compiler::default();
    let body = compiler.compile_sequence(ast)?;
    Ok(CompiledMessage::Closure(Closure {
        params: compiler.params.into_iter().collect(),
        body,
        helpers: compiler.helpers,
    }))
}

fn literal_text(ast: &[AstNode]) -> Option<String> {
    ast.iter()
        .map(AstNode::as_literal)
        .collect::<Option<Vec<_>>>()
        .map(|parts| parts.concat())
}

#[derive(Debug)]
struct PluralFrame {
    param: String,
    offset: i64,
}

#[derive(Debug, Default)]
struct Compiler {
    params: BTreeSet<String>,
    helpers: HelperSet,
    plurals: Vec<PluralFrame>,
}

impl Compiler {
    /// A lone node compiles to itself, several nodes to a template.
    fn compile_sequence(&mut self, nodes: &[AstNode]) -> CompileResult<Expr> {
        match nodes {
            [] => Ok(Expr::Text(String::new())),
            [node] => self.compile_node(node),
            _ => nodes
                .iter()
                .map(|node| self.compile_node(node))
                .collect::<CompileResult<Vec<_>>>()
                .map(Expr::Template),
        }
    }

    fn compile_node(&mut self, node: &AstNode) -> CompileResult<Expr> {
        let call = match node {
            AstNode::Literal(text) => return Ok(Expr::Text(text.clone())),
            AstNode::Pound => return self.compile_pound(),
            AstNode::Interpolation { param } => HelperCall::Interpolate {
                param: self.use_param(param),
            },
            AstNode::Number { param, style } => HelperCall::Number {
                param: self.use_param(param),
                style: style.clone(),
            },
            AstNode::Date { param, style } => HelperCall::Date {
                param: self.use_param(param),
                style: style.clone(),
            },
            AstNode::Time { param, style } => HelperCall::Time {
                param: self.use_param(param),
                style: style.clone(),
            },
            AstNode::Select { param, options } => HelperCall::Select {
                param: self.use_param(param),
                options: self.compile_options(options, verbatim)?,
            },
            AstNode::Plural {
                param,
                offset,
                options,
            } => self.compile_plural(param, *offset, options)?,
        };

        self.helpers.insert(call.helper());
        Ok(Expr::Call(call))
    }

    fn compile_plural(
        &mut self,
        param: &str,
        offset: i64,
        options: &AstOptions,
    ) -> CompileResult<HelperCall> {
        let param = self.use_param(param);
        self.plurals.push(PluralFrame {
            param: param.clone(),
            offset,
        });
        let compiled = self.compile_options(options, PluralCategory::abbreviate);
        self.plurals.pop();
        let options = compiled?;

        Ok(if offset == 0 {
            HelperCall::Plural { param, options }
        } else {
            HelperCall::OffsetPlural {
                param,
                offset,
                options,
            }
        })
    }

    fn compile_options(
        &mut self,
        options: &AstOptions,
        name_key: fn(&str) -> &str,
    ) -> CompileResult<Options> {
        options
            .iter()
            .map(|(raw, branch)| {
                let key = match OptionKey::parse(raw) {
                    OptionKey::Named(name) => OptionKey::Named(name_key(&name).to_string()),
                    exact => exact,
                };
                let value = match literal_text(branch) {
                    Some(text) => Expr::Text(text),
                    None => self.compile_sequence(branch)?,
                };
                Ok((key, value))
            })
            .collect()
    }

    fn compile_pound(&self) -> CompileResult<Expr> {
        let frame = self.plurals.last().ok_or(CompileError::PoundOutsidePlural)?;
        Ok(if frame.offset == 0 {
            Expr::Param(frame.param.clone())
        } else {
            Expr::OffsetParam {
                param: frame.param.clone(),
                offset: frame.offset,
            }
        })
    }

    fn use_param(&mut self, param: &str) -> String {
        let param = param.trim().to_string();
        self.params.insert(param.clone());
        param
    }
}

fn verbatim(key: &str) -> &str {
    key
}

/// Union of the helpers used by several messages
pub fn collect_helpers<'a>(messages: impl IntoIterator<Item = &'a CompiledMessage>) -> HelperSet {
    messages
        .into_iter()
        .flat_map(CompiledMessage::helpers)
        .collect()
}
