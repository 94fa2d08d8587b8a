use super::Wire;
use crate::expr::{ArgumentRef, Arguments, CallExpr, Composition, Expression};
use serde::{Deserialize, Serialize};

/// How bare symbols are encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolMode {
    /// `["@@", name, {}]`, an argument reference without options.
    #[default]
    Reference,
    /// `["%%", name]`, the name as a plain string.
    Literal,
}

/// Encoder settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireOptions {
    pub symbols: SymbolMode,
}

/// Converts expressions into wire trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder {
    options: WireOptions,
}

impl Encoder {
    pub fn new(options: WireOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> WireOptions {
        self.options
    }

    /// Encodes an expression in value position.
    ///
    /// Returns `None` for [`Expression::Undefined`], which has no wire form.
    pub fn value(&self, expression: &Expression) -> Option<Wire> {
        let wire = match expression {
            Expression::Undefined => return None,
            Expression::Literal(value) => Wire::Literal(value.as_ref().clone()),
            Expression::Symbol(name) => match self.options.symbols {
                SymbolMode::Reference => Wire::Reference {
                    name: name.to_string(),
                    options: Default::default(),
                },
                SymbolMode::Literal => Wire::Literal(serde_json::Value::from(&**name)),
            },
            Expression::Argument(argument) => self.argument_ref(argument),
            Expression::Call(call) => self.call(call),
            Expression::Composition(composition) => self.composition(composition),
        };
        Some(wire)
    }

    /// Encodes the pipe and named arguments shared by calls, envelopes, and
    /// request bodies. Undefined values are left out.
    pub fn body(&self, input: &Expression, arguments: &Arguments) -> Vec<Wire> {
        let mut body = Vec::with_capacity(arguments.len() + 1);
        if let Some(input) = self.value(input) {
            body.push(Wire::pipe(input));
        }
        body.extend(arguments.iter().filter_map(|(name, value)| {
            self.value(value)
                .map(|value| Wire::argument(name.as_str(), value))
        }));
        body
    }

    /// `["{}", ["()", ...]]`
    pub fn call(&self, call: &CallExpr) -> Wire {
        Wire::Envelope(vec![self.call_unwrapped(call)])
    }

    /// `["()", name, ...]`
    pub fn call_unwrapped(&self, call: &CallExpr) -> Wire {
        Wire::Call {
            name: call.name().to_string(),
            body: self.body(call.input(), call.arguments()),
        }
    }

    /// `["{}", pipe?, argument..., step...]`
    pub fn composition(&self, composition: &Composition) -> Wire {
        let mut items = self.body(composition.input(), composition.arguments());
        items.extend(
            composition
                .steps()
                .iter()
                .map(|step| self.call_unwrapped(step)),
        );
        Wire::Envelope(items)
    }

    /// `["@@", name, {option: value}]`
    pub fn argument_ref(&self, argument: &ArgumentRef) -> Wire {
        let options = argument
            .options()
            .iter()
            .filter_map(|(key, value)| self.option(value).map(|value| (key.clone(), value)))
            .collect();
        Wire::Reference {
            name: argument.name().to_string(),
            options,
        }
    }

    /// Option values take symbols literally, whatever the symbol mode.
    fn option(&self, value: &Expression) -> Option<Wire> {
        match value {
            Expression::Symbol(name) => Some(Wire::Literal(serde_json::Value::from(&**name))),
            other => self.value(other),
        }
    }
}

impl Expression {
    /// Encodes with default options; `None` for the undefined sentinel.
    pub fn serialize(&self) -> Option<Wire> {
        Encoder::default().value(self)
    }
}

impl CallExpr {
    /// Encodes as a top-level expression, wrapped in an envelope.
    pub fn serialize(&self) -> Wire {
        Encoder::default().call(self)
    }

    /// Encodes the bare `()` tuple.
    pub fn serialize_unwrapped(&self) -> Wire {
        Encoder::default().call_unwrapped(self)
    }
}

impl Composition {
    pub fn serialize(&self) -> Wire {
        Encoder::default().composition(self)
    }
}

impl ArgumentRef {
    pub fn serialize(&self) -> Wire {
        Encoder::default().argument_ref(self)
    }
}
