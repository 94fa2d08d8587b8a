use super::{Arguments, CallExpr, Expression};
use std::ops::Shr;
use std::sync::Arc;

/// An ordered pipeline of calls, each consuming the output of the previous one.
///
/// The composition's own input and arguments form an envelope in front of the
/// steps. They are delivered to the pipeline as a whole and are not copied into
/// the individual steps, which keep their own arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Composition {
    input: Expression,
    arguments: Arguments,
    steps: Arc<Vec<CallExpr>>,
}

/// Anything that can be appended to a composition.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Appended as a single step.
    Call(CallExpr),
    /// Flattened: its steps are appended and its arguments overlaid.
    Composition(Composition),
}

impl Composition {
    /// Creates an empty composition with the given envelope input.
    pub fn new(input: Expression) -> Self {
        Self {
            input,
            arguments: Arguments::new(),
            steps: Arc::new(Vec::new()),
        }
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn steps(&self) -> &[CallExpr] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns a copy with envelope overrides applied; steps are shared.
    pub fn with(&self, input: Option<Expression>, arguments: &Arguments) -> Self {
        Self {
            input: input.unwrap_or_else(|| self.input.clone()),
            arguments: self.arguments.merged(arguments),
            steps: self.steps.clone(),
        }
    }

    pub fn with_input(&self, input: impl Into<Expression>) -> Self {
        self.with(Some(input.into()), &Arguments::new())
    }

    pub fn with_argument(&self, key: impl Into<String>, value: impl Into<Expression>) -> Self {
        Self {
            input: self.input.clone(),
            arguments: self.arguments.clone().insert(key, value),
            steps: self.steps.clone(),
        }
    }

    /// Returns a composition extended by each of `others`, in order.
    pub fn compose<I>(&self, others: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        others
            .into_iter()
            .fold(self.clone(), |composed, other| composed.then(other))
    }

    /// Returns a composition extended by a single step.
    ///
    /// A nested composition is flattened: its envelope input is dropped, its
    /// steps are appended, and its arguments overlay the current ones.
    pub fn then(mut self, other: impl Into<Step>) -> Self {
        match other.into() {
            Step::Call(call) => {
                Arc::make_mut(&mut self.steps).push(call);
            }
            Step::Composition(composition) => {
                Arc::make_mut(&mut self.steps).extend(composition.steps.iter().cloned());
                self.arguments = self.arguments.merged(&composition.arguments);
            }
        }
        self
    }
}

impl<S: Into<Step>> Shr<S> for Composition {
    type Output = Composition;

    fn shr(self, other: S) -> Composition {
        self.then(other)
    }
}

impl From<CallExpr> for Step {
    fn from(call: CallExpr) -> Self {
        Step::Call(call)
    }
}

impl From<&CallExpr> for Step {
    fn from(call: &CallExpr) -> Self {
        Step::Call(call.clone())
    }
}

impl From<Composition> for Step {
    fn from(composition: Composition) -> Self {
        Step::Composition(composition)
    }
}

impl From<&Composition> for Step {
    fn from(composition: &Composition) -> Self {
        Step::Composition(composition.clone())
    }
}
