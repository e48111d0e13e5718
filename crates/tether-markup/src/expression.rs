#![forbid(unsafe_code)]

//! Inline binding expressions.
//!
//! Grammar:
//!
//! ```text
//! expression := "{" part ("," part){0,2} "}"
//! part       := key "=" value
//! key        := "Path" | "Mode" | "UpdateSourceTrigger"
//! ```
//!
//! Keys are matched case-insensitively, as are the values of `Mode`
//! (`OneTime`, `OneWay`, `OneWayToSource`, `TwoWay`, `Default`) and
//! `UpdateSourceTrigger` (`Explicit`, `LostFocus`, `PropertyChanged`,
//! `Default`). Whitespace around keys and values is ignored. `Path` is
//! required; the other two default to `Default`.
//!
//! # Failure Modes
//!
//! | Input | Error |
//! |-------|-------|
//! | `""` | [`ExpressionError::Empty`] |
//! | `Path=x` | [`ExpressionError::MissingBrace`] |
//! | four or more parts | [`ExpressionError::TooManyParts`] |
//! | `{Path}`, `{Path=a=b}`, `{Path=}` | [`ExpressionError::MalformedPart`] |
//! | `{Path=a, path=b}` | [`ExpressionError::Redefined`] |
//! | `{Path=a, Source=b}` | [`ExpressionError::UnknownKey`] |
//! | `{Path=a, Mode=Sideways}` | [`ExpressionError::UnknownMode`] |
//! | `{Path=a, UpdateSourceTrigger=Never}` | [`ExpressionError::UnknownTrigger`] |
//! | `{Mode=OneWay}` | [`ExpressionError::MissingPath`] |

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tether_core::{
    Binding, BindingError, BindingMode, BindingSource, BindingTarget, UpdateSourceTrigger,
};

const MAX_PARTS: usize = 3;

/// Errors from [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    /// The expression is empty.
    Empty,
    /// The expression does not start with `{` and end with `}`.
    MissingBrace,
    TooManyParts { count: usize },
    /// A part is not a single `key=value` pair with a non-empty value.
    MalformedPart { part: String },
    /// A key appears twice.
    Redefined { key: &'static str },
    UnknownKey { key: String },
    UnknownMode { value: String },
    UnknownTrigger { value: String },
    MissingPath,
}

impl ExpressionError {
    /// Every error except [`Empty`](Self::Empty) is a syntax error.
    #[must_use]
    pub fn is_syntax_error(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("binding expression is empty"),
            Self::MissingBrace => f.write_str("invalid syntax: expression must be enclosed in braces"),
            Self::TooManyParts { count } => {
                write!(f, "invalid syntax: {count} parts, at most {MAX_PARTS} allowed")
            }
            Self::MalformedPart { part } => {
                write!(f, "invalid syntax: '{part}' is not a key=value pair")
            }
            Self::Redefined { key } => write!(f, "invalid syntax: {key} redefinition"),
            Self::UnknownKey { key } => write!(f, "invalid syntax: unknown key '{key}'"),
            Self::UnknownMode { value } => write!(f, "invalid syntax: unknown mode '{value}'"),
            Self::UnknownTrigger { value } => {
                write!(f, "invalid syntax: unknown update source trigger '{value}'")
            }
            Self::MissingPath => f.write_str("invalid syntax: path should be defined"),
        }
    }
}

impl std::error::Error for ExpressionError {}

/// A parsed `{Path=..., Mode=..., UpdateSourceTrigger=...}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingExpression {
    pub path: String,
    pub mode: BindingMode,
    pub update_trigger: UpdateSourceTrigger,
}

impl BindingExpression {
    /// An expression for `path` with default mode and trigger.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: BindingMode::Default,
            update_trigger: UpdateSourceTrigger::Default,
        }
    }

    /// Create an unbound [`Binding`] from `source.<path>` to
    /// `target.<target_property>` with this expression's mode and trigger.
    ///
    /// # Errors
    ///
    /// [`BindingError::Argument`] if `target_property` is empty.
    pub fn into_binding(
        &self,
        target: BindingTarget,
        target_property: &str,
        source: Rc<dyn BindingSource>,
    ) -> Result<Binding, BindingError> {
        Ok(Binding::new(target, target_property, source, self.path.as_str())?
            .with_mode(self.mode)
            .with_update_trigger(self.update_trigger))
    }
}

impl fmt::Display for BindingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Path={}, Mode={}, UpdateSourceTrigger={}}}",
            self.path, self.mode, self.update_trigger
        )
    }
}

impl FromStr for BindingExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse an inline binding expression.
///
/// ```
/// use tether_core::{BindingMode, UpdateSourceTrigger};
/// use tether_markup::parse;
///
/// let expr = parse("{Path=name, mode=oneway}").unwrap();
/// assert_eq!(expr.path, "name");
/// assert_eq!(expr.mode, BindingMode::OneWay);
/// assert_eq!(expr.update_trigger, UpdateSourceTrigger::Default);
/// ```
///
/// # Errors
///
/// See the module-level failure table.
pub fn parse(expr: &str) -> Result<BindingExpression, ExpressionError> {
    if expr.is_empty() {
        return Err(ExpressionError::Empty);
    }
    let body = expr
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or(ExpressionError::MissingBrace)?;

    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() > MAX_PARTS {
        return Err(ExpressionError::TooManyParts { count: parts.len() });
    }

    let mut path = None;
    let mut mode = None;
    let mut trigger = None;
    for part in parts {
        let (key, value) = split_part(part)?;
        if key.eq_ignore_ascii_case("path") {
            set_once(&mut path, "Path", value.to_owned())?;
        } else if key.eq_ignore_ascii_case("mode") {
            let parsed = parse_mode(value).ok_or_else(|| ExpressionError::UnknownMode {
                value: value.to_owned(),
            })?;
            set_once(&mut mode, "Mode", parsed)?;
        } else if key.eq_ignore_ascii_case("updatesourcetrigger") {
            let parsed = parse_trigger(value).ok_or_else(|| ExpressionError::UnknownTrigger {
                value: value.to_owned(),
            })?;
            set_once(&mut trigger, "UpdateSourceTrigger", parsed)?;
        } else {
            return Err(ExpressionError::UnknownKey { key: key.to_owned() });
        }
    }

    let expression = BindingExpression {
        path: path.ok_or(ExpressionError::MissingPath)?,
        mode: mode.unwrap_or_default(),
        update_trigger: trigger.unwrap_or_default(),
    };
    tracing::trace!(%expression, "parsed binding expression");
    Ok(expression)
}

fn split_part(part: &str) -> Result<(&str, &str), ExpressionError> {
    let malformed = || ExpressionError::MalformedPart {
        part: part.trim().to_owned(),
    };
    let (key, value) = part.split_once('=').ok_or_else(malformed)?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() || value.contains('=') {
        return Err(malformed());
    }
    Ok((key, value))
}

fn set_once<T>(slot: &mut Option<T>, key: &'static str, value: T) -> Result<(), ExpressionError> {
    if slot.is_some() {
        return Err(ExpressionError::Redefined { key });
    }
    *slot = Some(value);
    Ok(())
}

fn parse_mode(value: &str) -> Option<BindingMode> {
    [
        BindingMode::OneTime,
        BindingMode::OneWay,
        BindingMode::OneWayToSource,
        BindingMode::TwoWay,
        BindingMode::Default,
    ]
    .into_iter()
    .find(|mode| mode.name().eq_ignore_ascii_case(value))
}

fn parse_trigger(value: &str) -> Option<UpdateSourceTrigger> {
    [
        UpdateSourceTrigger::Explicit,
        UpdateSourceTrigger::LostFocus,
        UpdateSourceTrigger::PropertyChanged,
        UpdateSourceTrigger::Default,
    ]
    .into_iter()
    .find(|trigger| trigger.name().eq_ignore_ascii_case(value))
}
