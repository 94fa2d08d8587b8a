//! Attribute-style access.
//!
//! A handle answers `attr(name)` with one of its own operations when `name`
//! is reserved, and with a nested callable otherwise. `get(name)` skips the
//! lookup and always nests, which is how a proc named like an operation is
//! reached.

use std::fmt;

/// Operations a handle reserves for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Call,
    Each,
    With,
    Compose,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Call,
        Operation::Each,
        Operation::With,
        Operation::Compose,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Call => "call",
            Operation::Each => "each",
            Operation::With => "with",
            Operation::Compose => "compose",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an attribute name resolved to.
#[derive(Clone, Debug)]
pub enum Attr<T> {
    /// A reserved operation on the receiver.
    Operation(Operation),
    /// A handle one level deeper.
    Segment(T),
}

impl<T> Attr<T> {
    pub fn into_segment(self) -> Option<T> {
        match self {
            Attr::Segment(segment) => Some(segment),
            Attr::Operation(_) => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            Attr::Operation(operation) => Some(*operation),
            Attr::Segment(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        for operation in Operation::ALL {
            assert_eq!(Operation::from_name(operation.as_str()), Some(operation));
        }
        assert_eq!(Operation::from_name("truncate"), None);
        assert_eq!(Operation::from_name("Compose"), None);
    }
}
