use proc_core::{Arguments, Composition, Expression, ProcResult, Step};
use serde_json::Value;

use crate::client::{Client, EXEC_PROC, Output};
use crate::compiler::{self, Compiler, PROC_ARGUMENT};

/// A [`Composition`] bound to the client that will send it.
///
/// Calling it sends the whole pipeline in one request to `core.exec`.
#[derive(Clone, Debug)]
pub struct ComposedCallable {
    client: Client,
    composition: Composition,
}

impl ComposedCallable {
    pub(crate) fn new(client: Client, composition: Composition) -> Self {
        Self {
            client,
            composition,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Dispatches the pipeline. Overrides apply to the envelope of this
    /// dispatch only.
    pub async fn call(&self, input: Option<Expression>, arguments: &Arguments) -> ProcResult<Output> {
        let composition = self.composition.with(input, arguments);
        self.client
            .process(
                EXEC_PROC,
                &Expression::Undefined,
                &Arguments::from([(PROC_ARGUMENT, composition)]),
            )
            .await
    }

    pub async fn each<F>(
        &self,
        input: Option<Expression>,
        arguments: &Arguments,
        f: F,
    ) -> ProcResult<()>
    where
        F: FnMut(Value) -> bool,
    {
        self.call(input, arguments).await?.each(f).await
    }

    pub fn with(&self, input: Option<Expression>, arguments: &Arguments) -> Self {
        self.rebind(self.composition.with(input, arguments))
    }

    pub fn with_input(&self, input: impl Into<Expression>) -> Self {
        self.rebind(self.composition.with_input(input))
    }

    pub fn with_argument(&self, key: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.rebind(self.composition.with_argument(key, value))
    }

    /// Appends `others`; compositions among them are flattened.
    pub fn compose<I>(&self, others: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        self.rebind(self.composition.compose(others))
    }

    /// The `core.exec` body for this pipeline, without sending it.
    pub fn compile(&self) -> Value {
        let compiler = Compiler::new(*self.client.encoder());
        compiler::to_value(&compiler.composition(&self.composition))
    }

    fn rebind(&self, composition: Composition) -> Self {
        Self {
            client: self.client.clone(),
            composition,
        }
    }
}

impl<S: Into<Step>> std::ops::Shr<S> for ComposedCallable {
    type Output = ComposedCallable;

    fn shr(self, other: S) -> ComposedCallable {
        self.compose([other])
    }
}

impl From<ComposedCallable> for Step {
    fn from(composed: ComposedCallable) -> Self {
        Step::Composition(composed.composition)
    }
}

impl From<&ComposedCallable> for Step {
    fn from(composed: &ComposedCallable) -> Self {
        Step::Composition(composed.composition.clone())
    }
}

impl From<ComposedCallable> for Expression {
    fn from(composed: ComposedCallable) -> Self {
        Expression::from(composed.composition)
    }
}

impl From<&ComposedCallable> for Expression {
    fn from(composed: &ComposedCallable) -> Self {
        Expression::from(&composed.composition)
    }
}
