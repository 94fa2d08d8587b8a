//! In-memory transport for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proc_core::ProcResult;
use serde_json::{Value, json};

use crate::client::Client;
use crate::transport::{Headers, Request, Response, Transport};

type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

/// Answers every request with `handler` and records what was sent.
pub(crate) struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> ProcResult<Response> {
        let response = (self.handler)(&request);
        self.requests.lock().push(request);
        Ok(response)
    }
}

pub(crate) fn response(status: u16, body: Value, headers: &[(&str, &str)]) -> Response {
    Response {
        status,
        headers: headers.iter().copied().collect::<Headers>(),
        body,
    }
}

/// A 200 carrying `value` in a `<<` tuple.
pub(crate) fn output(value: Value) -> Response {
    response(200, json!([["<<", value]]), &[])
}

pub(crate) fn client(transport: Arc<MockTransport>) -> Client {
    Client::builder()
        .authorization("secret")
        .transport(transport)
        .build()
}
