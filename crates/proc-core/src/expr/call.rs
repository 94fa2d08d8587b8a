use super::{Arguments, Composition, Expression, Step};
use crate::error::ExprError;
use std::ops::Shr;
use std::sync::Arc;

/// A single named proc together with its piped input and named arguments.
///
/// Builder methods take `&self` and return a new value; the receiver is never
/// modified, and unchanged fields are shared with it.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    name: Arc<str>,
    input: Expression,
    arguments: Arguments,
}

impl CallExpr {
    /// Creates a call to `name` with no input and no arguments.
    ///
    /// `name` is a dot-separated proc path such as `type.string.truncate`.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ExprError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(ExprError::EmptyName);
        }
        Ok(Self {
            name: Arc::from(name),
            input: Expression::Undefined,
            arguments: Arguments::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Path segments of the proc name, used to build the endpoint URL.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// Returns a call nested one level below this one, keeping input and arguments.
    ///
    /// The segment is appended verbatim, so `segment("a.b")` adds two levels.
    pub fn segment(&self, segment: &str) -> Self {
        Self {
            name: Arc::from(format!("{}.{}", self.name, segment)),
            input: self.input.clone(),
            arguments: self.arguments.clone(),
        }
    }

    /// Returns a copy with overrides applied.
    ///
    /// `None` keeps the current input; `Some(Expression::Undefined)` clears it.
    /// `arguments` are overlaid on the current ones.
    pub fn with(&self, input: Option<Expression>, arguments: &Arguments) -> Self {
        Self {
            name: self.name.clone(),
            input: input.unwrap_or_else(|| self.input.clone()),
            arguments: self.arguments.merged(arguments),
        }
    }

    pub fn with_input(&self, input: impl Into<Expression>) -> Self {
        self.with(Some(input.into()), &Arguments::new())
    }

    pub fn with_argument(&self, key: impl Into<String>, value: impl Into<Expression>) -> Self {
        Self {
            name: self.name.clone(),
            input: self.input.clone(),
            arguments: self.arguments.clone().insert(key, value),
        }
    }

    /// Builds a composition with this call as the first step.
    ///
    /// The composition takes this call's input as its own.
    pub fn compose<I>(&self, others: I) -> Composition
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        Composition::new(self.input.clone())
            .then(self.clone())
            .compose(others)
    }
}

impl<S: Into<Step>> Shr<S> for CallExpr {
    type Output = Composition;

    fn shr(self, other: S) -> Composition {
        self.compose([other])
    }
}
