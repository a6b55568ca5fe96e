//! Typed ICU message AST as produced by the external parser
//!
//! The parser hands nodes over as JSON objects carrying a numeric `type`
//! code. Decoding into [`AstNode`] validates the shape once, so the compiler
//! never has to deal with half-formed nodes.

use crate::error::CompileResult;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Numeric kind codes of the AST contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeKind {
    /// Plain text
    Literal = 0,
    /// `{name}`
    Interpolation = 1,
    /// `{name, number, style?}`
    NumberFormat = 2,
    /// `{name, date, style?}`
    DateFormat = 3,
    /// `{name, time, style?}`
    TimeFormat = 4,
    /// `{name, select, ...}`
    Select = 5,
    /// `{name, plural, offset:n? ...}`
    Plural = 6,
    /// `#` inside a plural branch
    PoundToken = 7,
}

impl TryFrom<u8> for NodeKind {
    type Error = AstError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Literal,
            1 => Self::Interpolation,
            2 => Self::NumberFormat,
            3 => Self::DateFormat,
            4 => Self::TimeFormat,
            5 => Self::Select,
            6 => Self::Plural,
            7 => Self::PoundToken,
            other => return Err(AstError::UnknownKind(other)),
        })
    }
}

/// Branches of a select or plural node, keyed by the raw option selector
pub type AstOptions = BTreeMap<String, Vec<AstNode>>;

/// One node of a parsed ICU message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawNode")]
pub enum AstNode {
    /// Plain text
    Literal(String),
    /// Bare argument reference
    Interpolation {
        /// Argument name
        param: String,
    },
    /// Locale-aware number
    Number {
        /// Argument name
        param: String,
        /// Optional style such as `integer` or `percent`
        style: Option<String>,
    },
    /// Locale-aware date
    Date {
        /// Argument name
        param: String,
        /// Optional style
        style: Option<String>,
    },
    /// Locale-aware time of day
    Time {
        /// Argument name
        param: String,
        /// Optional style
        style: Option<String>,
    },
    /// Branch on a string value
    Select {
        /// Argument name
        param: String,
        /// Branches keyed by selector
        options: AstOptions,
    },
    /// Branch on a number's plural category
    Plural {
        /// Argument name
        param: String,
        /// Amount subtracted before category lookup and `#` rendering
        offset: i64,
        /// Branches keyed by `=N` or category name
        options: AstOptions,
    },
    /// `#`: the innermost enclosing plural's argument
    Pound,
}

impl AstNode {
    /// Literal text node
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Kind code of the node
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Literal(_) => NodeKind::Literal,
            Self::Interpolation { .. } => NodeKind::Interpolation,
            Self::Number { .. } => NodeKind::NumberFormat,
            Self::Date { .. } => NodeKind::DateFormat,
            Self::Time { .. } => NodeKind::TimeFormat,
            Self::Select { .. } => NodeKind::Select,
            Self::Plural { .. } => NodeKind::Plural,
            Self::Pound => NodeKind::PoundToken,
        }
    }

    /// Literal text, if this is a literal node
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            _ => None,
        }
    }
}

/// Decode a message AST from the parser's JSON form
pub fn parse_ast(json: &str) -> CompileResult<Vec<AstNode>> {
    Ok(serde_json::from_str(json)?)
}

/// Decode a message AST from an already parsed JSON value
pub fn ast_from_value(value: serde_json::Value) -> CompileResult<Vec<AstNode>> {
    Ok(serde_json::from_value(value)?)
}

/// Shape violations of the AST contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// `type` outside 0..=7
    UnknownKind(u8),
    /// A field required by the node kind is absent
    MissingField {
        /// Kind of the offending node
        kind: NodeKind,
        /// Name of the absent field
        field: &'static str,
    },
}

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(code) => write!(f, "unknown AST node kind {code}"),
            Self::MissingField { kind, field } => {
                write!(f, "{kind:?} node is missing its `{field}` field")
            }
        }
    }
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    options: Option<BTreeMap<String, RawBranch>>,
    #[serde(default)]
    offset: Option<i64>,
}

/// Parsers differ on whether a branch is wrapped in `{ "value": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBranch {
    Wrapped { value: Vec<AstNode> },
    Bare(Vec<AstNode>),
}

impl From<RawBranch> for Vec<AstNode> {
    fn from(branch: RawBranch) -> Self {
        match branch {
            RawBranch::Wrapped { value } | RawBranch::Bare(value) => value,
        }
    }
}

impl TryFrom<RawNode> for AstNode {
    type Error = AstError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let kind = NodeKind::try_from(raw.kind)?;
        let value = |field| {
            raw.value
                .clone()
                .ok_or(AstError::MissingField { kind, field })
        };
        let options = || -> Result<AstOptions, AstError> {
            Ok(raw
                .options
                .ok_or(AstError::MissingField {
                    kind,
                    field: "options",
                })?
                .into_iter()
                .map(|(key, branch)| (key, branch.into()))
                .collect())
        };

        Ok(match kind {
            NodeKind::Literal => Self::Literal(value("value")?),
            NodeKind::Interpolation => Self::Interpolation {
                param: value("value")?,
            },
            NodeKind::NumberFormat => Self::Number {
                param: value("value")?,
                style: raw.style,
            },
            NodeKind::DateFormat => Self::Date {
                param: value("value")?,
                style: raw.style,
            },
            NodeKind::TimeFormat => Self::Time {
                param: value("value")?,
                style: raw.style,
            },
            NodeKind::Select => Self::Select {
                param: value("value")?,
                options: options()?,
            },
            NodeKind::Plural => Self::Plural {
                param: value("value")?,
                offset: raw.offset.unwrap_or(0),
                options: options()?,
            },
            NodeKind::PoundToken => Self::Pound,
        })
    }
}
