use thiserror::Error;

/// Errors raised while decoding a tagged-tuple tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("expected a tagged tuple, found `{0}`")]
    NotATuple(String),

    #[error("unknown tag `{0}`")]
    UnknownTag(String),

    #[error("tag `{tag}` expects {expected} elements, found {found}")]
    Arity {
        tag: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("tag `{tag}` expects a string name")]
    ExpectedName { tag: &'static str },

    #[error("tag `{tag}` expects an options object")]
    ExpectedOptions { tag: &'static str },

    #[error("tag `{tag}` is not allowed {context}")]
    Unexpected {
        tag: &'static str,
        context: &'static str,
    },

    #[error(transparent)]
    Expr(#[from] super::ExprError),
}
