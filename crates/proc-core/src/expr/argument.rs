use super::{Arguments, Expression};
use std::sync::Arc;

/// Option key holding the fallback value of an argument reference.
pub const DEFAULT_OPTION: &str = "default";
/// Option key holding the coercion hint of an argument reference.
pub const TYPE_OPTION: &str = "type";

/// A value supplied by name when the enclosing expression is called.
///
/// ```
/// use proc_core::expr::{ArgumentRef, CallExpr};
///
/// let length = ArgumentRef::new("truncate_to").with_default(2);
/// let truncate = CallExpr::new("type.string.truncate")
///     .unwrap()
///     .with_argument("length", length);
/// assert!(truncate.arguments().contains_key("length"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentRef {
    name: Arc<str>,
    options: Arguments,
}

impl ArgumentRef {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            options: Arguments::new(),
        }
    }

    /// Sets the value used when the caller does not supply one.
    pub fn with_default(self, value: impl Into<Expression>) -> Self {
        self.with_option(DEFAULT_OPTION, value)
    }

    /// Sets the type the evaluator coerces the supplied value into.
    pub fn with_type(self, coercion: impl Into<String>) -> Self {
        self.with_option(TYPE_OPTION, coercion.into())
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.options = self.options.insert(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Arguments {
        &self.options
    }

    pub fn default_value(&self) -> Option<&Expression> {
        self.options.get(DEFAULT_OPTION)
    }

    pub fn coercion(&self) -> Option<&str> {
        self.options
            .get(TYPE_OPTION)
            .and_then(Expression::as_literal)
            .and_then(|value| value.as_str())
    }
}
