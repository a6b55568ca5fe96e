//! JavaScript emission for compiled messages
//!
//! Generated code targets the helper module configured for the build: every
//! helper is referenced by its import name and closures take their arguments
//! in declared order.

use super::compile::CompiledMessage;
use super::expr::{Expr, HelperCall, HelperSet, OptionKey, Options};
use std::fmt::Write;

/// Render a compiled message as a JavaScript expression
pub fn emit_message(message: &CompiledMessage) -> String {
    match message {
        CompiledMessage::Constant(text) => string_literal(text),
        CompiledMessage::Closure(closure) => {
            format!("({}) => {}", closure.params.join(", "), emit_expr(&closure.body))
        }
    }
}

/// Render one expression
pub fn emit_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

/// Import statement for `helpers`, or `None` when nothing is used
pub fn import_declaration(helpers: &HelperSet, module: &str) -> Option<String> {
    if helpers.is_empty() {
        return None;
    }
    let names: Vec<_> = helpers.iter().map(|h| h.import_name()).collect();
    Some(format!(
        "import {{ {} }} from {};",
        names.join(", "),
        string_literal(module)
    ))
}

/// Rewrite a `_("key", values)` call to pass the compiled message instead of the key
pub fn rewrite_call(message: &CompiledMessage, values: Option<&str>) -> String {
    let message = emit_message(message);
    match values.map(str::trim).filter(|v| !v.is_empty()) {
        Some(values) => format!("_({message}, {values})"),
        None => format!("_({message})"),
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Text(text) => out.push_str(&string_literal(text)),
        Expr::Template(parts) => write_template(out, parts),
        Expr::Param(param) => out.push_str(param),
        Expr::OffsetParam { param, offset } => write_offset_param(out, param, *offset),
        Expr::Call(call) => write_call(out, call),
    }
}

fn write_template(out: &mut String, parts: &[Expr]) {
    out.push('`');
    for part in parts {
        if let Expr::Text(text) = part {
            escape_template(out, text);
        } else {
            out.push_str("${");
            write_expr(out, part);
            out.push('}');
        }
    }
    out.push('`');
}

fn write_offset_param(out: &mut String, param: &str, offset: i64) {
    if offset < 0 {
        let _ = write!(out, "{param} + {}", offset.unsigned_abs());
    } else {
        let _ = write!(out, "{param} - {offset}");
    }
}

fn write_call(out: &mut String, call: &HelperCall) {
    out.push_str(call.helper().import_name());
    out.push('(');
    match call {
        HelperCall::Interpolate { param } => out.push_str(param),
        HelperCall::Number { param, style }
        | HelperCall::Date { param, style }
        | HelperCall::Time { param, style } => {
            out.push_str(param);
            if let Some(style) = style {
                out.push_str(", ");
                out.push_str(&string_literal(style));
            }
        }
        HelperCall::Select { param, options } | HelperCall::Plural { param, options } => {
            out.push_str(param);
            out.push_str(", ");
            write_options(out, options);
        }
        HelperCall::OffsetPlural {
            param,
            offset,
            options,
        } => {
            let _ = write!(out, "{param}, {offset}, ");
            write_options(out, options);
        }
    }
    out.push(')');
}

fn write_options(out: &mut String, options: &Options) {
    out.push('{');
    for (i, (key, value)) in options.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_key(out, key);
        out.push_str(": ");
        write_expr(out, value);
    }
    out.push('}');
}

fn write_key(out: &mut String, key: &OptionKey) {
    match key {
        OptionKey::Exact(n) if *n >= 0 => {
            let _ = write!(out, "{n}");
        }
        OptionKey::Exact(n) => out.push_str(&string_literal(&n.to_string())),
        OptionKey::Named(name) if is_identifier(name) => out.push_str(name),
        OptionKey::Named(name) => out.push_str(&string_literal(name)),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn escape_template(out: &mut String, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::ast_from_value;
    use crate::compiler::compile::compile;
    use crate::compiler::expr::Helper;
    use serde_json::json;

    fn emit(value: serde_json::Value) -> String {
        emit_message(&compile(&ast_from_value(value).unwrap()).unwrap())
    }

    #[test]
    fn test_constant_is_string_literal() {
        insta::assert_snapshot!(
            emit(json!([{ "type": 0, "value": "Say \"hi\"" }])),
            @r#""Say \"hi\"""#
        );
    }

    #[test]
    fn test_template_closure() {
        insta::assert_snapshot!(
            emit(json!([
                { "type": 0, "value": "Hello, " },
                { "type": 1, "value": "name" },
                { "type": 0, "value": "! `${x}`" }
            ])),
            @r#"(name) => `Hello, ${__interpolate(name)}! \`\${x}\``"#
        );
    }

    #[test]
    fn test_plural_closure() {
        insta::assert_snapshot!(
            emit(json!([
                { "type": 6, "value": "count", "offset": 0, "options": {
                    "=0": [{ "type": 0, "value": "no items" }],
                    "one": [{ "type": 0, "value": "one item" }],
                    "other": [{ "type": 7 }, { "type": 0, "value": " items" }]
                }}
            ])),
            @r#"(count) => __plural(count, {0: "no items", h: `${count} items`, o: "one item"})"#
        );
    }

    #[test]
    fn test_offset_plural_closure() {
        insta::assert_snapshot!(
            emit(json!([
                { "type": 6, "value": "count", "offset": 1, "options": {
                    "one": [{ "type": 0, "value": "the first" }],
                    "other": [{ "type": 7 }, { "type": 0, "value": " more" }]
                }}
            ])),
            @r#"(count) => __offsetPlural(count, 1, {h: `${count - 1} more`, o: "the first"})"#
        );
    }

    #[test]
    fn test_styles_and_quoted_keys() {
        insta::assert_snapshot!(
            emit(json!([
                { "type": 2, "value": "ratio", "style": "percent" },
                { "type": 0, "value": " " },
                { "type": 5, "value": "kind", "options": {
                    "new-user": [{ "type": 3, "value": "at", "style": "long" }],
                    "other": [{ "type": 0, "value": "" }]
                }}
            ])),
            @r#"(at, kind, ratio) => `${__number(ratio, "percent")} ${__select(kind, {"new-user": __date(at, "long"), other: ""})}`"#
        );
    }

    #[test]
    fn test_import_declaration() {
        let helpers: HelperSet = [Helper::Plural, Helper::Date].into_iter().collect();
        assert_eq!(
            import_declaration(&helpers, "polyglot/runtime").as_deref(),
            Some(r#"import { __date, __plural } from "polyglot/runtime";"#)
        );
        assert_eq!(import_declaration(&HelperSet::new(), "polyglot/runtime"), None);
    }

    #[test]
    fn test_rewrite_call() {
        let constant = CompiledMessage::Constant("Welcome".to_string());
        assert_eq!(rewrite_call(&constant, None), r#"_("Welcome")"#);

        let message = compile(&ast_from_value(json!([{ "type": 1, "value": "n" }])).unwrap()).unwrap();
        assert_eq!(
            rewrite_call(&message, Some(" { n: 5 } ")),
            "_((n) => __interpolate(n), { n: 5 })"
        );
    }
}
