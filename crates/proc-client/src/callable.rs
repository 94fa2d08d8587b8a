//! Client-bound call handles.

use proc_core::{Arguments, CallExpr, Expression, ProcResult, Step};
use serde_json::Value;

use crate::client::{Client, Output};
use crate::compiler::{self, Compiler, PROC_ARGUMENT};
use crate::composition::ComposedCallable;
use crate::dispatch::{Attr, Operation};

/// A [`CallExpr`] bound to the client that will send it.
///
/// Like the expression it wraps, a `Callable` is immutable: every builder
/// method returns a new handle.
#[derive(Clone, Debug)]
pub struct Callable {
    client: Client,
    expr: CallExpr,
}

impl Callable {
    pub(crate) fn new(client: Client, expr: CallExpr) -> Self {
        Self { client, expr }
    }

    pub fn name(&self) -> &str {
        self.expr.name()
    }

    pub fn expr(&self) -> &CallExpr {
        &self.expr
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Dispatches this call. Overrides apply to this dispatch only.
    pub async fn call(&self, input: Option<Expression>, arguments: &Arguments) -> ProcResult<Output> {
        let call = self.expr.with(input, arguments);
        self.client
            .process(call.name(), call.input(), call.arguments())
            .await
    }

    /// Dispatches and feeds each returned value to `f` until it returns `false`.
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
        self.rebind(self.expr.with(input, arguments))
    }

    pub fn with_input(&self, input: impl Into<Expression>) -> Self {
        self.rebind(self.expr.with_input(input))
    }

    pub fn with_argument(&self, key: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.rebind(self.expr.with_argument(key, value))
    }

    /// Binds the `proc` argument, as taken by higher-order procs like `enum.map`.
    pub fn with_proc(&self, proc: impl Into<Expression>) -> Self {
        self.with_argument(PROC_ARGUMENT, proc)
    }

    /// Composes this call with `others`, in order.
    pub fn compose<I>(&self, others: I) -> ComposedCallable
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        ComposedCallable::new(self.client.clone(), self.expr.compose(others))
    }

    /// Nests `segment` below this call, even when it names an operation.
    pub fn get(&self, segment: &str) -> Self {
        self.rebind(self.expr.segment(segment))
    }

    pub fn attr(&self, name: &str) -> Attr<Self> {
        match Operation::from_name(name) {
            Some(operation) => Attr::Operation(operation),
            None => Attr::Segment(self.get(name)),
        }
    }

    /// The `core.exec` body for this call, without sending it.
    pub fn compile(&self) -> Value {
        let compiler = Compiler::new(*self.client.encoder());
        compiler::to_value(&compiler.call(&self.expr))
    }

    fn rebind(&self, expr: CallExpr) -> Self {
        Self {
            client: self.client.clone(),
            expr,
        }
    }
}

impl std::ops::Shr<Callable> for Callable {
    type Output = ComposedCallable;

    fn shr(self, other: Callable) -> ComposedCallable {
        self.compose([other])
    }
}

impl From<Callable> for Step {
    fn from(callable: Callable) -> Self {
        Step::Call(callable.expr)
    }
}

impl From<&Callable> for Step {
    fn from(callable: &Callable) -> Self {
        Step::Call(callable.expr.clone())
    }
}

impl From<Callable> for Expression {
    fn from(callable: Callable) -> Self {
        Expression::from(callable.expr)
    }
}

impl From<&Callable> for Expression {
    fn from(callable: &Callable) -> Self {
        Expression::from(&callable.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, client, output, response};
    use proc_core::ErrorKind;
    use serde_json::json;

    fn echo_client() -> (std::sync::Arc<MockTransport>, Client) {
        let transport = MockTransport::new(|request| output(request.body.clone()));
        let client = client(transport.clone());
        (transport, client)
    }

    #[tokio::test]
    async fn nested_access_builds_dotted_names() {
        let (transport, client) = echo_client();
        let truncate = client
            .get("type")
            .unwrap()
            .get("string")
            .get("truncate");

        truncate
            .call(Some("foo".into()), &Arguments::from([("length", 2)]))
            .await
            .unwrap();

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(truncate.name(), "type.string.truncate");
        assert_eq!(request.url, "https://proc.run/type/string/truncate");
        assert_eq!(request.body, json!([[">>", ["%%", "foo"]], ["$$", "length", ["%%", 2]]]));
    }

    #[test]
    fn dotted_segments_are_appended_verbatim() {
        let (_, client) = echo_client();

        assert_eq!(client.get("core.echo").unwrap().name(), "core.echo");
        assert_eq!(client.get("type").unwrap().get("string.reverse").name(), "type.string.reverse");
    }

    #[test]
    fn attr_prefers_operations_and_get_never_does() {
        let (_, client) = echo_client();
        let string = client.get("type.string").unwrap();

        assert_eq!(string.attr("compose").operation(), Some(Operation::Compose));
        assert_eq!(string.attr("each").operation(), Some(Operation::Each));
        assert_eq!(
            string.attr("truncate").into_segment().map(|c| c.name().to_string()),
            Some("type.string.truncate".to_string())
        );
        assert_eq!(string.get("compose").name(), "type.string.compose");
    }

    #[tokio::test]
    async fn call_overrides_do_not_stick() {
        let (transport, client) = echo_client();
        let echo = client.get("core.echo").unwrap().with_input("foo");

        echo.call(Some("bar".into()), &Arguments::new()).await.unwrap();
        echo.call(None, &Arguments::new()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].body, json!([[">>", ["%%", "bar"]]]));
        assert_eq!(requests[1].body, json!([[">>", ["%%", "foo"]]]));
    }

    #[tokio::test]
    async fn null_input_is_sent_and_undefined_is_not() {
        let (transport, client) = echo_client();
        let echo = client.get("core.echo").unwrap().with_input("foo");

        echo.call(Some(Expression::null()), &Arguments::new()).await.unwrap();
        echo.call(Some(Expression::Undefined), &Arguments::new()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].body, json!([[">>", ["%%", null]]]));
        assert_eq!(requests[1].body, json!([]));
    }

    #[tokio::test]
    async fn nested_calls_travel_as_envelopes() {
        let (transport, client) = echo_client();
        let echo = client.get("core.echo").unwrap();
        let capitalize = client.get("type.string.capitalize").unwrap();

        capitalize
            .call(Some(echo.with_input("foo").into()), &Arguments::new())
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0].body,
            json!([[">>", ["{}", ["()", "core.echo", [">>", ["%%", "foo"]]]]]])
        );
    }

    #[tokio::test]
    async fn argument_defaults_can_be_calls() {
        let (transport, client) = echo_client();
        let echo = client.get("core.echo").unwrap().with_input(2);
        let truncate = client
            .get("type.string.truncate")
            .unwrap()
            .with_argument("length", client.arg("truncate_to").with_default(&echo));

        truncate.call(Some("foo".into()), &Arguments::new()).await.unwrap();

        assert_eq!(
            transport.requests()[0].body,
            json!([
                [">>", ["%%", "foo"]],
                ["$$", "length", ["@@", "truncate_to", {"default": ["{}", ["()", "core.echo", [">>", ["%%", 2]]]]}]]
            ])
        );
    }

    #[tokio::test]
    async fn with_proc_binds_the_proc_argument() {
        let (transport, client) = echo_client();
        let map = client
            .get("enum.map")
            .unwrap()
            .with_proc(client.get("type.number.add").unwrap().with_argument("y", 1));

        map.call(Some(json!([1, 2]).into()), &Arguments::new()).await.unwrap();

        assert_eq!(
            transport.requests()[0].body,
            json!([
                [">>", ["%%", [1, 2]]],
                ["$$", "proc", ["{}", ["()", "type.number.add", ["$$", "y", ["%%", 1]]]]]
            ])
        );
    }

    #[tokio::test]
    async fn each_visits_plain_arrays() {
        let transport = MockTransport::new(|_| output(json!([1, 2, 3])));
        let client = client(transport);
        let mut seen = Vec::new();

        client
            .get("enum.list")
            .unwrap()
            .each(None, &Arguments::new(), |value| {
                seen.push(value);
                true
            })
            .await
            .unwrap();

        assert_eq!(seen, [json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn undefined_procs_report_siblings() {
        let transport = MockTransport::new(|_| {
            response(
                404,
                json!([["!!", {"message": "undefined proc `type.string.blah' (did you mean `type.string.reverse'?)"}]]),
                &[],
            )
        });
        let client = client(transport);

        let error = client
            .get("type.string.blah")
            .unwrap()
            .call(None, &Arguments::new())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Undefined);
        assert!(error.message().contains("type.string.reverse"));
    }

    #[test]
    fn compile_emits_exec_body() {
        let (transport, client) = echo_client();
        let echo = client.get("core.echo").unwrap().with_input("foo");

        assert_eq!(
            echo.compile(),
            json!([["$$", "proc", ["{}", ["()", "core.echo", [">>", ["%%", "foo"]]]]]])
        );
        assert!(transport.requests().is_empty());
    }
}
