//! Expression model.
//!
//! Everything a caller can send to the remote evaluator is an [`Expression`]:
//! a literal value, a bare symbol, an argument reference, a call, or a
//! composition of calls. Nodes are immutable and reference-counted so that
//! deriving a new expression shares every unchanged sub-expression with the
//! one it was derived from.
//!
//! [`Expression::Undefined`] is the "nothing supplied" sentinel. It is a
//! distinct variant, so an omitted input can never be confused with an
//! explicit `null` literal.

pub mod argument;
pub mod arguments;
pub mod call;
pub mod composition;

pub use argument::ArgumentRef;
pub use arguments::Arguments;
pub use call::CallExpr;
pub use composition::{Composition, Step};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Any value that can appear as an input, argument value, or option value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Expression {
    /// No value supplied.
    #[default]
    Undefined,
    /// A JSON-representable value, sent as-is.
    Literal(Arc<Value>),
    /// A bare name, shorthand for an argument reference without options.
    Symbol(Arc<str>),
    /// A named value resolved by the evaluator at call time.
    Argument(Arc<ArgumentRef>),
    /// A single proc call.
    Call(Arc<CallExpr>),
    /// A pipeline of proc calls.
    Composition(Arc<Composition>),
}

impl Expression {
    /// Builds a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Arc::new(value.into()))
    }

    /// Builds a bare symbol.
    pub fn symbol(name: impl AsRef<str>) -> Self {
        Expression::Symbol(Arc::from(name.as_ref()))
    }

    /// Returns the explicit `null` literal.
    pub fn null() -> Self {
        Expression::literal(Value::Null)
    }

    /// Checks whether this is the undefined sentinel.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Expression::Undefined)
    }

    /// Returns the literal value, if this is a literal.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expression::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the call, if this is a call expression.
    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expression::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Returns the composition, if this is a composition.
    pub fn as_composition(&self) -> Option<&Composition> {
        match self {
            Expression::Composition(composition) => Some(composition),
            _ => None,
        }
    }

    /// Returns the argument reference, if this is one.
    pub fn as_argument(&self) -> Option<&ArgumentRef> {
        match self {
            Expression::Argument(argument) => Some(argument),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Undefined => f.write_str("(undefined)"),
            Expression::Literal(value) => write!(f, "{value}"),
            Expression::Symbol(name) => write!(f, ":{name}"),
            Expression::Argument(argument) => write!(f, "arg({})", argument.name()),
            Expression::Call(call) => write!(f, "{}()", call.name()),
            Expression::Composition(composition) => {
                let names: Vec<&str> = composition.steps().iter().map(CallExpr::name).collect();
                write!(f, "{}", names.join(" >> "))
            }
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Literal(Arc::new(value))
    }
}

impl From<&Value> for Expression {
    fn from(value: &Value) -> Self {
        Expression::Literal(Arc::new(value.clone()))
    }
}

impl From<CallExpr> for Expression {
    fn from(call: CallExpr) -> Self {
        Expression::Call(Arc::new(call))
    }
}

impl From<&CallExpr> for Expression {
    fn from(call: &CallExpr) -> Self {
        Expression::Call(Arc::new(call.clone()))
    }
}

impl From<Composition> for Expression {
    fn from(composition: Composition) -> Self {
        Expression::Composition(Arc::new(composition))
    }
}

impl From<&Composition> for Expression {
    fn from(composition: &Composition) -> Self {
        Expression::Composition(Arc::new(composition.clone()))
    }
}

impl From<ArgumentRef> for Expression {
    fn from(argument: ArgumentRef) -> Self {
        Expression::Argument(Arc::new(argument))
    }
}

impl From<&Expression> for Expression {
    fn from(expression: &Expression) -> Self {
        expression.clone()
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(value: $ty) -> Self {
                    Expression::literal(value)
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, u32, u64, f64, String, &str);
