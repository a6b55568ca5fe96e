//! Evaluation of compiled messages

use super::context::{current_context, FormatContext};
use super::helpers;
use crate::compiler::{Closure, CompiledMessage, Expr, HelperCall};
use crate::error::FormatError;
use crate::value::{plain_number, MessageValues, Value, NULL};
use std::collections::HashMap;

impl Closure {
    /// Invoke the closure with arguments in declared parameter order.
    ///
    /// Missing trailing arguments read as null; extra ones are ignored.
    pub fn call(&self, ctx: &FormatContext, args: &[Value]) -> String {
        let scope: HashMap<&str, &Value> = self
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter().chain(std::iter::repeat(&NULL)))
            .collect();
        let mut out = String::new();
        Evaluator { ctx, scope: &scope }.eval(&self.body, &mut out);
        out
    }

    /// Invoke the closure with named arguments
    pub fn render(&self, ctx: &FormatContext, values: &MessageValues) -> String {
        let args: Vec<Value> = self
            .params
            .iter()
            .map(|param| values.get(param).clone())
            .collect();
        self.call(ctx, &args)
    }
}

impl CompiledMessage {
    /// Produce the final text for a message
    pub fn render(&self, ctx: &FormatContext, values: &MessageValues) -> String {
        match self {
            Self::Constant(text) => text.clone(),
            Self::Closure(closure) => closure.render(ctx, values),
        }
    }
}

/// Render a message in the process-wide current locale.
///
/// Constants render even when no locale is set; closures need one.
pub fn format(message: &CompiledMessage, values: &MessageValues) -> Result<String, FormatError> {
    match message {
        CompiledMessage::Constant(text) => Ok(text.clone()),
        CompiledMessage::Closure(closure) => Ok(closure.render(&current_context()?, values)),
    }
}

struct Evaluator<'a> {
    ctx: &'a FormatContext,
    scope: &'a HashMap<&'a str, &'a Value>,
}

impl Evaluator<'_> {
    fn arg(&self, param: &str) -> &Value {
        self.scope.get(param).copied().unwrap_or(&NULL)
    }

    fn eval(&self, expr: &Expr, out: &mut String) {
        match expr {
            Expr::Text(text) => out.push_str(text),
            Expr::Template(parts) => {
                for part in parts {
                    self.eval(part, out);
                }
            }
            Expr::Param(param) => out.push_str(&self.arg(param).to_string()),
            Expr::OffsetParam { param, offset } => {
                #[allow(clippy::cast_precision_loss)]
                let n = self
                    .arg(param)
                    .as_number()
                    .map_or(f64::NAN, |n| n - *offset as f64);
                out.push_str(&plain_number(n));
            }
            Expr::Call(call) => self.eval_call(call, out),
        }
    }

    fn eval_call(&self, call: &HelperCall, out: &mut String) {
        let ctx = self.ctx;
        let branch = match call {
            HelperCall::Interpolate { param } => {
                out.push_str(&helpers::interpolate(self.arg(param)));
                return;
            }
            HelperCall::Number { param, style } => {
                out.push_str(&helpers::number_format(ctx, self.arg(param), style.as_deref()));
                return;
            }
            HelperCall::Date { param, style } => {
                out.push_str(&helpers::date_format(ctx, self.arg(param), style.as_deref()));
                return;
            }
            HelperCall::Time { param, style } => {
                out.push_str(&helpers::time_format(ctx, self.arg(param), style.as_deref()));
                return;
            }
            HelperCall::Select { param, options } => {
                helpers::select_format(self.arg(param), options)
            }
            HelperCall::Plural { param, options } => {
                helpers::plural_format(ctx, self.arg(param), options)
            }
            HelperCall::OffsetPlural {
                param,
                offset,
                options,
            } => helpers::offset_plural_format(ctx, self.arg(param), *offset, options),
        };

        if let Some(branch) = branch {
            self.eval(branch, out);
        }
    }
}
