use super::{Wire, tag};
use crate::error::WireError;
use crate::expr::{ArgumentRef, Arguments, CallExpr, Composition, Expression};
use serde_json::Value;

impl Wire {
    /// Parses a tagged-tuple tree.
    pub fn decode(value: &Value) -> Result<Wire, WireError> {
        let tuple = match value.as_array() {
            Some(tuple) if !tuple.is_empty() => tuple,
            _ => return Err(WireError::NotATuple(value.to_string())),
        };
        let tag = tuple[0]
            .as_str()
            .ok_or_else(|| WireError::NotATuple(value.to_string()))?;

        match tag {
            tag::ENVELOPE => Ok(Wire::Envelope(decode_all(&tuple[1..])?)),
            tag::CALL => {
                let name = expect_name(tuple, tag::CALL)?;
                Ok(Wire::Call {
                    name,
                    body: decode_all(&tuple[2..])?,
                })
            }
            tag::PIPE => {
                expect_arity(tuple, tag::PIPE, 2)?;
                Ok(Wire::pipe(Wire::decode(&tuple[1])?))
            }
            tag::ARGUMENT => {
                expect_arity(tuple, tag::ARGUMENT, 3)?;
                let name = expect_name(tuple, tag::ARGUMENT)?;
                Ok(Wire::argument(name, Wire::decode(&tuple[2])?))
            }
            tag::LITERAL => {
                expect_arity(tuple, tag::LITERAL, 2)?;
                Ok(Wire::Literal(tuple[1].clone()))
            }
            tag::REFERENCE => {
                expect_arity(tuple, tag::REFERENCE, 3)?;
                let name = expect_name(tuple, tag::REFERENCE)?;
                let options = tuple[2].as_object().ok_or(WireError::ExpectedOptions {
                    tag: tag::REFERENCE,
                })?;
                let options = options
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), Wire::decode(value)?)))
                    .collect::<Result<_, WireError>>()?;
                Ok(Wire::Reference { name, options })
            }
            other => Err(WireError::UnknownTag(other.to_string())),
        }
    }
}

fn decode_all(values: &[Value]) -> Result<Vec<Wire>, WireError> {
    values.iter().map(Wire::decode).collect()
}

fn expect_arity(tuple: &[Value], tag: &'static str, expected: usize) -> Result<(), WireError> {
    if tuple.len() == expected {
        Ok(())
    } else {
        Err(WireError::Arity {
            tag,
            expected,
            found: tuple.len(),
        })
    }
}

fn expect_name(tuple: &[Value], tag: &'static str) -> Result<String, WireError> {
    tuple
        .get(1)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(WireError::ExpectedName { tag })
}

impl Expression {
    /// Rebuilds an expression from a wire tree in value position.
    ///
    /// An envelope holding exactly one call and nothing else is read back as
    /// that call, since that is how a standalone call is written. A reference
    /// without options is read back as an argument reference, not a symbol.
    pub fn from_wire(wire: &Wire) -> Result<Expression, WireError> {
        match wire {
            Wire::Literal(value) => Ok(Expression::literal(value.clone())),
            Wire::Reference { name, options } => {
                let argument = options
                    .iter()
                    .try_fold(ArgumentRef::new(name), |argument, (key, value)| {
                        Ok::<_, WireError>(argument.with_option(key, Expression::from_wire(value)?))
                    })?;
                Ok(Expression::from(argument))
            }
            Wire::Call { .. } => Ok(Expression::from(call_from_wire(wire)?)),
            Wire::Envelope(items) => {
                let composition = composition_from_items(items)?;
                match composition.steps() {
                    [step]
                        if composition.input().is_undefined()
                            && composition.arguments().is_empty() =>
                    {
                        Ok(Expression::from(step.clone()))
                    }
                    _ => Ok(Expression::from(composition)),
                }
            }
            Wire::Pipe(_) | Wire::Argument { .. } => Err(WireError::Unexpected {
                tag: wire.tag(),
                context: "in value position",
            }),
        }
    }
}

fn split_body(items: &[Wire]) -> Result<(Expression, Arguments, &[Wire]), WireError> {
    let mut input = Expression::Undefined;
    let mut arguments = Arguments::new();
    let mut rest = items;

    if let Some((Wire::Pipe(value), tail)) = rest.split_first() {
        input = Expression::from_wire(value)?;
        rest = tail;
    }
    while let Some((Wire::Argument { name, value }, tail)) = rest.split_first() {
        arguments = arguments.insert(name.as_str(), Expression::from_wire(value)?);
        rest = tail;
    }
    Ok((input, arguments, rest))
}

fn call_from_wire(wire: &Wire) -> Result<CallExpr, WireError> {
    let Wire::Call { name, body } = wire else {
        return Err(WireError::Unexpected {
            tag: wire.tag(),
            context: "as a composition step",
        });
    };
    let (input, arguments, rest) = split_body(body)?;
    if let Some(extra) = rest.first() {
        return Err(WireError::Unexpected {
            tag: extra.tag(),
            context: "inside a call",
        });
    }
    Ok(CallExpr::new(name)?.with(Some(input), &arguments))
}

fn composition_from_items(items: &[Wire]) -> Result<Composition, WireError> {
    let (input, arguments, steps) = split_body(items)?;
    steps.iter().try_fold(
        Composition::new(input).with(None, &arguments),
        |composition, step| Ok(composition.then(call_from_wire(step)?)),
    )
}
