//! Tagged-tuple wire format.
//!
//! Every node is a JSON array whose first element is a short string tag:
//!
//! | tag    | shape                                                   |
//! |--------|---------------------------------------------------------|
//! | `{}`   | `["{}", pipe?, argument..., call...]`                   |
//! | `()`   | `["()", name, pipe?, argument...]`                      |
//! | `>>`   | `[">>", value]`                                         |
//! | `$$`   | `["$$", name, value]`                                   |
//! | `%%`   | `["%%", literal]`                                       |
//! | `@@`   | `["@@", name, {option: value}]`                         |
//!
//! Independent implementations are checked against each other by exact string
//! comparison, so the encoder must not reorder, add, or drop anything.
//! Responses use two more tags, `<<` (returned value) and `!!` (error).

mod decode;
mod encode;

pub use encode::{Encoder, SymbolMode, WireOptions};

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

pub mod tag {
    pub const ENVELOPE: &str = "{}";
    pub const CALL: &str = "()";
    pub const PIPE: &str = ">>";
    pub const ARGUMENT: &str = "$$";
    pub const LITERAL: &str = "%%";
    pub const REFERENCE: &str = "@@";
    pub const OUTPUT: &str = "<<";
    pub const ERROR: &str = "!!";
}

/// One node of a serialized expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Wire {
    /// `["{}", ...items]`
    Envelope(Vec<Wire>),
    /// `["()", name, ...body]`
    Call { name: String, body: Vec<Wire> },
    /// `[">>", value]`
    Pipe(Box<Wire>),
    /// `["$$", name, value]`
    Argument { name: String, value: Box<Wire> },
    /// `["%%", value]`
    Literal(Value),
    /// `["@@", name, options]`
    Reference {
        name: String,
        options: IndexMap<String, Wire>,
    },
}

impl Wire {
    pub fn tag(&self) -> &'static str {
        match self {
            Wire::Envelope(_) => tag::ENVELOPE,
            Wire::Call { .. } => tag::CALL,
            Wire::Pipe(_) => tag::PIPE,
            Wire::Argument { .. } => tag::ARGUMENT,
            Wire::Literal(_) => tag::LITERAL,
            Wire::Reference { .. } => tag::REFERENCE,
        }
    }

    pub fn pipe(value: Wire) -> Self {
        Wire::Pipe(Box::new(value))
    }

    pub fn argument(name: impl Into<String>, value: Wire) -> Self {
        Wire::Argument {
            name: name.into(),
            value: Box::new(value),
        }
    }

    /// Converts the tree into a JSON value.
    pub fn to_value(&self) -> Value {
        Value::from(self)
    }

    /// Renders the compact JSON text compared across implementations.
    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}

impl From<&Wire> for Value {
    fn from(wire: &Wire) -> Self {
        let tag = Value::from(wire.tag());
        match wire {
            Wire::Envelope(items) => {
                let mut tuple = Vec::with_capacity(items.len() + 1);
                tuple.push(tag);
                tuple.extend(items.iter().map(Value::from));
                Value::Array(tuple)
            }
            Wire::Call { name, body } => {
                let mut tuple = Vec::with_capacity(body.len() + 2);
                tuple.push(tag);
                tuple.push(Value::from(name.as_str()));
                tuple.extend(body.iter().map(Value::from));
                Value::Array(tuple)
            }
            Wire::Pipe(value) => Value::Array(vec![tag, Value::from(value.as_ref())]),
            Wire::Argument { name, value } => Value::Array(vec![
                tag,
                Value::from(name.as_str()),
                Value::from(value.as_ref()),
            ]),
            Wire::Literal(value) => Value::Array(vec![tag, value.clone()]),
            Wire::Reference { name, options } => {
                let options = options
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect();
                Value::Array(vec![tag, Value::from(name.as_str()), Value::Object(options)])
            }
        }
    }
}

impl From<Wire> for Value {
    fn from(wire: Wire) -> Self {
        Value::from(&wire)
    }
}

impl Serialize for Wire {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Wire::Envelope(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len() + 1))?;
                seq.serialize_element(tag::ENVELOPE)?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Wire::Call { name, body } => {
                let mut seq = serializer.serialize_seq(Some(body.len() + 2))?;
                seq.serialize_element(tag::CALL)?;
                seq.serialize_element(name)?;
                for item in body {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Wire::Pipe(value) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(tag::PIPE)?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Wire::Argument { name, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(tag::ARGUMENT)?;
                seq.serialize_element(name)?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Wire::Literal(value) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(tag::LITERAL)?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Wire::Reference { name, options } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(tag::REFERENCE)?;
                seq.serialize_element(name)?;
                seq.serialize_element(options)?;
                seq.end()
            }
        }
    }
}
