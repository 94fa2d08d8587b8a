use thiserror::Error;

/// Errors raised while building expressions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("proc name must not be empty")]
    EmptyName,
}
