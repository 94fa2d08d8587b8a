//! Remote dispatcher.
//!
//! A [`Client`] owns the connection settings and the little state the protocol
//! keeps between calls: the request count and the metadata of the most recent
//! response, including the rate limit it reported. It is cheap to clone; clones
//! share that state.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use proc_config::{Encoding, Environment, ProcConfig, SystemEnvironment, resolve_authorization};
use proc_core::wire::tag;
use proc_core::{
    ArgumentRef, Arguments, CallExpr, Encoder, ErrorKind, ExprError, Expression, ProcError,
    ProcResult, WireOptions,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::callable::Callable;
use crate::cursor::{Continuation, Cursor};
use crate::dispatch::{Attr, Operation};
use crate::rate_limit::{RateLimit, Window};
use crate::transport::{Headers, HttpTransport, Request, Response, Transport};

/// Proc that evaluates a composition passed as its `proc` argument.
pub const EXEC_PROC: &str = "core.exec";
/// No-op proc used to refresh the rate limit.
pub const PING_PROC: &str = "core.ping";
/// Response header carrying the pagination cursor.
pub const CURSOR_HEADER: &str = "x-cursor";
/// Argument the cursor is sent back in.
pub const CURSOR_ARGUMENT: &str = "cursor";

/// Result of a successful call.
#[derive(Debug)]
pub enum Output {
    /// A plain value.
    Value(Value),
    /// A page of values, possibly followed by more.
    Cursor(Cursor),
}

impl Output {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Output::Value(value) => Some(value),
            Output::Cursor(_) => None,
        }
    }

    /// Views the output as a sequence of values.
    ///
    /// An array value becomes a single page of its items; any other value a
    /// page of one.
    pub fn into_cursor(self) -> Cursor {
        match self {
            Output::Cursor(cursor) => cursor,
            Output::Value(value) => Cursor::page(values_of(value)),
        }
    }

    /// Returns the value, draining every page of a cursor into an array.
    pub async fn into_value(self) -> ProcResult<Value> {
        match self {
            Output::Value(value) => Ok(value),
            Output::Cursor(cursor) => cursor.collect_all().await.map(Value::Array),
        }
    }

    /// Calls `f` with each value until it returns `false`.
    pub async fn each<F>(self, f: F) -> ProcResult<()>
    where
        F: FnMut(Value) -> bool,
    {
        self.into_cursor().each(f).await
    }
}

fn values_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        other => vec![other],
    }
}

/// Status and headers of a response, with the rate limit they reported.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Headers,
    pub rate_limit: RateLimit,
}

/// Builds a [`Client`].
#[derive(Clone, Default)]
pub struct ClientBuilder {
    config: ProcConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from loaded configuration.
    pub fn from_config(config: &ProcConfig) -> Self {
        Self {
            config: config.clone(),
            transport: None,
        }
    }

    pub fn authorization(mut self, authorization: impl Into<String>) -> Self {
        self.config.client.authorization = Some(authorization.into());
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.client.scheme = scheme.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.client.host = host.into();
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.client.encoding = encoding;
        self
    }

    pub fn wire_options(mut self, options: WireOptions) -> Self {
        self.config.wire = options;
        self
    }

    /// Replaces the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client, resolving a missing authorization from the process
    /// environment.
    pub fn build(self) -> Client {
        self.build_with_environment(&SystemEnvironment)
    }

    pub fn build_with_environment(self, env: &dyn Environment) -> Client {
        let Self { config, transport } = self;
        let client = config.client;
        let authorization = resolve_authorization(client.authorization.as_deref(), env);
        let transport =
            transport.unwrap_or_else(|| Arc::new(HttpTransport::new(client.encoding)));

        Client {
            inner: Arc::new(Inner {
                transport,
                base_url: client.base_url(),
                scheme: client.scheme,
                host: client.host,
                authorization,
                encoder: Encoder::new(config.wire),
                count: AtomicU64::new(0),
                last_response: RwLock::new(None),
            }),
        }
    }
}

/// Connection to a proc evaluator.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    scheme: String,
    host: String,
    base_url: String,
    authorization: String,
    encoder: Encoder,
    count: AtomicU64,
    /// `None` until the first response is observed.
    last_response: RwLock<Option<ResponseMeta>>,
}

impl Client {
    /// Client for the default host with the given token.
    pub fn new(authorization: impl Into<String>) -> Self {
        Self::builder().authorization(authorization).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn from_config(config: &ProcConfig) -> Self {
        ClientBuilder::from_config(config).build()
    }

    pub fn authorization(&self) -> &str {
        &self.inner.authorization
    }

    /// The authorization with all but its first 8 and last 5 characters elided.
    pub fn safe_authorization(&self) -> String {
        let chars: Vec<char> = self.inner.authorization.chars().collect();
        let head: String = chars.iter().take(8).collect();
        let tail: String = if chars.len() >= 5 {
            chars[chars.len() - 5..].iter().collect()
        } else {
            String::new()
        };
        format!("{head}...{tail}")
    }

    pub fn scheme(&self) -> &str {
        &self.inner.scheme
    }

    pub fn host(&self) -> &str {
        &self.inner.host
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn encoder(&self) -> &Encoder {
        &self.inner.encoder
    }

    /// Number of requests this client has performed.
    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Relaxed)
    }

    /// Endpoint for a proc: every name segment becomes a path segment.
    pub fn url_for(&self, proc: &str) -> String {
        let path: Vec<&str> = proc.split('.').collect();
        format!("{}/{}", self.inner.base_url, path.join("/"))
    }

    /// Returns a callable for `name`, which may contain dots.
    pub fn get(&self, name: &str) -> Result<Callable, ExprError> {
        Ok(Callable::new(self.clone(), CallExpr::new(name)?))
    }

    /// Attribute-style access from the root.
    ///
    /// Reserved operation names resolve to the operation; anything else starts
    /// a callable.
    pub fn attr(&self, name: &str) -> Result<Attr<Callable>, ExprError> {
        match Operation::from_name(name) {
            Some(operation) => Ok(Attr::Operation(operation)),
            None => self.get(name).map(Attr::Segment),
        }
    }

    /// Builds a named argument reference.
    pub fn argument(&self, name: &str) -> ArgumentRef {
        ArgumentRef::new(name)
    }

    pub fn arg(&self, name: &str) -> ArgumentRef {
        self.argument(name)
    }

    /// Calls `proc` by name.
    pub async fn call(
        &self,
        proc: &str,
        input: Option<Expression>,
        arguments: &Arguments,
    ) -> ProcResult<Output> {
        if proc.is_empty() {
            return Err(ExprError::EmptyName.into());
        }
        self.process(proc, &input.unwrap_or_default(), arguments)
            .await
    }

    /// Current rate limit, pinging the evaluator if none was observed yet.
    pub async fn rate_limit(&self) -> ProcResult<Option<u64>> {
        Ok(self.observed_rate_limit().await?.limit)
    }

    pub async fn rate_limit_window(&self) -> ProcResult<Option<Window>> {
        Ok(self.observed_rate_limit().await?.window)
    }

    pub async fn rate_limit_reset(&self) -> ProcResult<Option<DateTime<Utc>>> {
        Ok(self.observed_rate_limit().await?.reset_at)
    }

    /// Pings the evaluator and returns the rate limit it reported.
    pub async fn refresh_rate_limit(&self) -> ProcResult<RateLimit> {
        self.call(PING_PROC, None, &Arguments::new()).await?;
        Ok(self.last_rate_limit().unwrap_or_default())
    }

    async fn observed_rate_limit(&self) -> ProcResult<RateLimit> {
        match self.last_rate_limit() {
            Some(rate_limit) => Ok(rate_limit),
            None => self.refresh_rate_limit().await,
        }
    }

    /// Status and headers of the most recent response.
    pub fn last_response(&self) -> Option<ResponseMeta> {
        self.inner.last_response.read().clone()
    }

    /// Boxed, owned form of [`Client::process`], used for page continuations.
    pub(crate) fn dispatch(
        &self,
        name: String,
        input: Expression,
        arguments: Arguments,
    ) -> BoxFuture<'static, ProcResult<Output>> {
        let client = self.clone();
        async move { client.process(&name, &input, &arguments).await }.boxed()
    }

    /// Sends one request and interprets the response.
    pub(crate) async fn process(
        &self,
        name: &str,
        input: &Expression,
        arguments: &Arguments,
    ) -> ProcResult<Output> {
        let body = self.inner.encoder.body(input, arguments);
        let request = Request {
            url: self.url_for(name),
            authorization: self.inner.authorization.clone(),
            body: Value::Array(body.iter().map(Value::from).collect()),
        };

        let count = self.inner.count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(proc = name, url = %request.url, count, "dispatching call");

        let response = self
            .inner
            .transport
            .send(request)
            .await
            .inspect_err(|error| warn!(proc = name, %error, "call failed"))?;
        debug!(proc = name, status = response.status, "received response");
        self.observe(&response);

        let Response {
            status,
            headers,
            body,
        } = response;

        if status != 200 {
            return Err(ProcError::from_status(status, error_message(&body)));
        }

        let Some(value) = find_tuple(&body, tag::OUTPUT) else {
            return match error_message(&body) {
                Some(message) => Err(ProcError::Remote {
                    kind: ErrorKind::Error,
                    status,
                    message,
                }),
                None => Ok(Output::Value(Value::Null)),
            };
        };

        match headers.get(CURSOR_HEADER) {
            None => Ok(Output::Value(value)),
            Some("") => Ok(Output::Cursor(Cursor::page(values_of(value)))),
            Some(cursor) => {
                let next = self.continuation(name, input, arguments, cursor);
                Ok(Output::Cursor(Cursor::with_continuation(
                    values_of(value),
                    next,
                )))
            }
        }
    }

    /// Re-issues the same call with `cursor` bound.
    fn continuation(
        &self,
        name: &str,
        input: &Expression,
        arguments: &Arguments,
        cursor: &str,
    ) -> Continuation {
        let client = self.clone();
        let name = name.to_string();
        let input = input.clone();
        let arguments = arguments.clone().insert(CURSOR_ARGUMENT, cursor);
        Box::new(move || client.dispatch(name, input, arguments))
    }

    fn last_rate_limit(&self) -> Option<RateLimit> {
        self.inner
            .last_response
            .read()
            .as_ref()
            .map(|response| response.rate_limit)
    }

    fn observe(&self, response: &Response) {
        let rate_limit = RateLimit::from_headers(&response.headers);
        trace!(?rate_limit, "updated rate limit");
        *self.inner.last_response.write() = Some(ResponseMeta {
            status: response.status,
            headers: response.headers.clone(),
            rate_limit,
        });
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("scheme", &self.inner.scheme)
            .field("host", &self.inner.host)
            .field("authorization", &self.safe_authorization())
            .field("count", &self.count())
            .finish()
    }
}

/// Payload of the first tuple tagged `tag`.
fn find_tuple(body: &Value, tag: &str) -> Option<Value> {
    body.as_array()?.iter().find_map(|tuple| {
        let tuple = tuple.as_array()?;
        (tuple.first()?.as_str()? == tag).then(|| tuple.get(1).cloned().unwrap_or(Value::Null))
    })
}

fn error_message(body: &Value) -> Option<String> {
    let error = find_tuple(body, tag::ERROR)?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, client, output, response};
    use serde_json::json;

    fn echo(request: &Request) -> Response {
        let input = request
            .body
            .as_array()
            .and_then(|tuples| tuples.iter().find(|t| t[0] == ">>"))
            .map(|t| t[1][1].clone())
            .unwrap_or(Value::Null);
        output(input)
    }

    #[tokio::test]
    async fn calls_post_to_the_name_path() {
        let transport = MockTransport::new(echo);
        let client = client(transport.clone());

        let result = client
            .call("core.echo", Some("foo".into()), &Arguments::new())
            .await
            .unwrap();

        assert_eq!(result.as_value(), Some(&json!("foo")));
        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://proc.run/core/echo");
        assert_eq!(requests[0].authorization, "secret");
        assert_eq!(requests[0].body, json!([[">>", ["%%", "foo"]]]));
        assert_eq!(client.count(), 1);
    }

    #[tokio::test]
    async fn undefined_input_sends_no_pipe() {
        let transport = MockTransport::new(echo);
        let client = client(transport.clone());

        client
            .call("core.echo", None, &Arguments::from([("k", 1)]))
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].body, json!([["$$", "k", ["%%", 1]]]));
    }

    #[tokio::test]
    async fn statuses_map_to_error_kinds() {
        for (status, kind) in [
            (400, ErrorKind::Invalid),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::Undefined),
            (408, ErrorKind::Timeout),
            (413, ErrorKind::Invalid),
            (429, ErrorKind::Limited),
            (500, ErrorKind::Error),
            (508, ErrorKind::Error),
        ] {
            let transport = MockTransport::new(move |_| {
                response(status, json!([["!!", {"message": "nope"}]]), &[])
            });
            let error = client(transport)
                .call("core.echo", None, &Arguments::new())
                .await
                .unwrap_err();

            assert_eq!(error.kind(), kind, "status {status}");
            assert_eq!(error.message(), "nope");
        }
    }

    #[tokio::test]
    async fn unknown_status_is_unhandled() {
        let transport = MockTransport::new(|_| response(502, json!([]), &[]));
        let error = client(transport)
            .call("core.echo", None, &Arguments::new())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Error);
        assert_eq!(error.message(), "unhandled");
    }

    #[tokio::test]
    async fn error_tuple_on_success_is_an_error() {
        let transport =
            MockTransport::new(|_| response(200, json!([["!!", {"message": "failed"}]]), &[]));
        let error = client(transport)
            .call("core.echo", None, &Arguments::new())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Error);
        assert_eq!(error.message(), "failed");
    }

    #[tokio::test]
    async fn empty_cursor_header_is_a_single_page() {
        let transport =
            MockTransport::new(|_| response(200, json!([["<<", [1, 2, 3]]]), &[("x-cursor", "")]));
        let client = client(transport.clone());

        let output = client
            .call("keyv.scan", None, &Arguments::new())
            .await
            .unwrap();
        let Output::Cursor(cursor) = output else {
            panic!("expected a cursor");
        };

        assert!(!cursor.has_next());
        assert_eq!(cursor.collect_all().await.unwrap(), [json!(1), json!(2), json!(3)]);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn cursor_is_sent_back_with_the_original_arguments() {
        let transport = MockTransport::new(|request| {
            let cursor = request
                .body
                .as_array()
                .and_then(|tuples| tuples.iter().find(|t| t[1] == CURSOR_ARGUMENT))
                .map(|t| t[2][1].clone());
            match cursor {
                None => response(200, json!([["<<", [1]]]), &[("x-cursor", "next")]),
                Some(_) => response(200, json!([["<<", [2]]]), &[("x-cursor", "")]),
            }
        });
        let client = client(transport.clone());

        let values = client
            .call("keyv.scan", Some("prefix".into()), &Arguments::from([("limit", 1)]))
            .await
            .unwrap()
            .into_value()
            .await
            .unwrap();

        assert_eq!(values, json!([1, 2]));
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].body,
            json!([
                [">>", ["%%", "prefix"]],
                ["$$", "limit", ["%%", 1]],
                ["$$", "cursor", ["%%", "next"]]
            ])
        );
    }

    /// Serves `0..total` in pages of `size`, keyed by the `cursor` argument.
    fn scan(total: usize, size: usize) -> impl Fn(&Request) -> Response + Send + Sync {
        move |request| {
            let offset = request
                .body
                .as_array()
                .and_then(|tuples| tuples.iter().find(|t| t[1] == CURSOR_ARGUMENT))
                .and_then(|t| t[2][1].as_str())
                .and_then(|cursor| cursor.parse::<usize>().ok())
                .unwrap_or(0);
            let end = (offset + size).min(total);
            let next = if end < total { end.to_string() } else { String::new() };
            response(
                200,
                json!([["<<", (offset..end).collect::<Vec<_>>()]]),
                &[(CURSOR_HEADER, next.as_str())],
            )
        }
    }

    #[tokio::test]
    async fn paginates_every_value_in_order() {
        let transport = MockTransport::new(scan(275, 5));
        let client = client(transport.clone());

        let values = client
            .call("keyv.scan", None, &Arguments::new())
            .await
            .unwrap()
            .into_value()
            .await
            .unwrap();

        assert_eq!(values, json!((0..275).collect::<Vec<_>>()));
        assert_eq!(transport.requests().len(), 55);
        assert_eq!(client.count(), 55);
    }

    #[tokio::test]
    async fn stopping_early_fetches_nothing_more() {
        let transport = MockTransport::new(scan(275, 5));
        let client = client(transport.clone());
        let mut seen = Vec::new();

        client
            .call("keyv.scan", None, &Arguments::new())
            .await
            .unwrap()
            .each(|value| {
                seen.push(value);
                seen.len() < 7
            })
            .await
            .unwrap();

        assert_eq!(seen, (0..7).map(|i| json!(i)).collect::<Vec<_>>());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn rate_limit_is_fetched_lazily_once() {
        let transport = MockTransport::new(|_| {
            response(
                200,
                json!([["<<", null]]),
                &[("x-rate-limit", "100;window=60"), ("x-rate-limit-reset", "1700000000")],
            )
        });
        let client = client(transport.clone());

        assert_eq!(client.rate_limit().await.unwrap(), Some(100));
        assert_eq!(client.rate_limit_window().await.unwrap(), Some(Window::Minute));
        assert_eq!(
            client.rate_limit_reset().await.unwrap().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://proc.run/core/ping");
    }

    #[tokio::test]
    async fn rate_limit_resets_when_headers_disappear() {
        let transport = MockTransport::new(|request| {
            if request.url.ends_with("/core/ping") {
                response(200, json!([["<<", null]]), &[("x-rate-limit", "5;window=1")])
            } else {
                output(json!(null))
            }
        });
        let client = client(transport);

        assert_eq!(client.rate_limit().await.unwrap(), Some(5));
        client.call("core.echo", None, &Arguments::new()).await.unwrap();
        assert_eq!(client.rate_limit().await.unwrap(), None);
        assert_eq!(client.rate_limit_window().await.unwrap(), None);
        assert_eq!(client.last_response().unwrap().rate_limit, RateLimit::default());
    }

    #[tokio::test]
    async fn last_response_is_recorded() {
        let transport = MockTransport::new(|_| {
            response(200, json!([["<<", 1]]), &[("x-rate-limit", "5;window=1")])
        });
        let client = client(transport);
        assert!(client.last_response().is_none());

        client.call("core.echo", None, &Arguments::new()).await.unwrap();

        let last = client.last_response().unwrap();
        assert_eq!(last.status, 200);
        assert_eq!(last.headers.get("x-rate-limit"), Some("5;window=1"));
        assert_eq!(last.rate_limit.limit, Some(5));
        assert_eq!(last.rate_limit.window, Some(Window::Second));
    }

    #[tokio::test]
    async fn empty_names_are_rejected_before_sending() {
        let transport = MockTransport::new(echo);
        let error = client(transport.clone())
            .call("", None, &Arguments::new())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn safe_authorization_elides_the_middle() {
        let client = Client::builder()
            .authorization("0123456789abcdefghij")
            .transport(MockTransport::new(echo))
            .build();

        assert_eq!(client.safe_authorization(), "01234567...fghij");
        let debug = format!("{client:?}");
        assert!(debug.contains("01234567...fghij"));
        assert!(!debug.contains("0123456789abcdefghij"));
    }

    #[test]
    fn urls_follow_name_segments() {
        let client = Client::builder()
            .scheme("http")
            .host("localhost:4000")
            .authorization("x")
            .transport(MockTransport::new(echo))
            .build();

        assert_eq!(client.url_for("type.string.truncate"), "http://localhost:4000/type/string/truncate");
    }

    #[test]
    fn root_attr_resolves_operations() {
        let client = client(MockTransport::new(echo));

        assert!(matches!(client.attr("compose"), Ok(Attr::Operation(Operation::Compose))));
        assert!(matches!(client.attr("core"), Ok(Attr::Segment(_))));
        assert_eq!(client.get("compose").unwrap().name(), "compose");
        assert!(client.get("").is_err());
    }
}
