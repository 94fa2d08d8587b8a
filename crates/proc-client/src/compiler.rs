//! Compiler mode.
//!
//! Instead of sending a call, the compiler returns the body `core.exec` would
//! need to evaluate it: `[["$$", "proc", envelope]]`. The result can be stored
//! and sent later, e.g. with `proc exec FILE`.

use proc_core::wire::Wire;
use proc_core::{Arguments, CallExpr, Composition, Encoder, Expression};
use serde_json::Value;

use crate::client::EXEC_PROC;

/// Name of the `core.exec` argument carrying the program.
pub const PROC_ARGUMENT: &str = "proc";

#[derive(Clone, Copy, Debug, Default)]
pub struct Compiler {
    encoder: Encoder,
}

impl Compiler {
    pub fn new(encoder: Encoder) -> Self {
        Self { encoder }
    }

    /// The body for a call to `name`.
    ///
    /// A call that already targets `core.exec` is returned as its own body.
    pub fn request(&self, name: &str, input: &Expression, arguments: &Arguments) -> Vec<Wire> {
        let body = self.encoder.body(input, arguments);
        if name == EXEC_PROC {
            return body;
        }
        let call = Wire::Call {
            name: name.to_string(),
            body,
        };
        vec![Wire::argument(PROC_ARGUMENT, Wire::Envelope(vec![call]))]
    }

    pub fn call(&self, call: &CallExpr) -> Vec<Wire> {
        self.request(call.name(), call.input(), call.arguments())
    }

    pub fn composition(&self, composition: &Composition) -> Vec<Wire> {
        vec![Wire::argument(
            PROC_ARGUMENT,
            self.encoder.composition(composition),
        )]
    }
}

/// Converts a body into the JSON array sent on the wire.
pub fn to_value(body: &[Wire]) -> Value {
    Value::Array(body.iter().map(Value::from).collect())
}
