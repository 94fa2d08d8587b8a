//! proc core - expression model and wire format.
//!
//! This crate has no I/O. It provides the immutable expression tree that
//! callers build, the tagged-tuple codec that turns it into request bodies,
//! and the error types shared by every other proc crate.

pub mod error;
pub mod expr;
pub mod wire;

pub use error::{ErrorKind, ExprError, ProcError, ProcResult, WireError};
pub use expr::{ArgumentRef, Arguments, CallExpr, Composition, Expression, Step};
pub use wire::{Encoder, SymbolMode, Wire, WireOptions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let call = CallExpr::new("core.echo").unwrap().with_input("foo");
        let wire = Expression::from(&call).serialize().unwrap();

        assert_eq!(Expression::from_wire(&wire).unwrap(), Expression::from(call));
        assert_eq!(ErrorKind::from_status(404), Some(ErrorKind::Undefined));
    }
}
