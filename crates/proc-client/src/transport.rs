//! Transport layer: one POST per call.
//!
//! The dispatcher speaks in decoded JSON trees; a [`Transport`] turns those into
//! bytes on the wire and back. [`HttpTransport`] is the production
//! implementation, built on `reqwest`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use proc_config::Encoding;
use proc_core::{ProcError, ProcResult};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use tracing::{debug, trace};

use crate::msgpack;

/// An outgoing call.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Endpoint, `base_url/segment/segment...`.
    pub url: String,
    /// Bearer token, possibly empty.
    pub authorization: String,
    /// Sequence of `>>` and `$$` tuples.
    pub body: Value,
}

/// A decoded response.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    /// Sequence of `<<` and `!!` tuples.
    pub body: Value,
}

/// Response headers, looked up case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?.to_string())))
            .collect()
    }
}

/// Sends requests to the evaluator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a single call.
    ///
    /// Failures to reach the evaluator are reported as
    /// [`ProcError::Unavailable`]; any status code, including failures,
    /// is returned as a [`Response`].
    async fn send(&self, request: Request) -> ProcResult<Response>;
}

/// Encodes a request body.
pub fn encode_body(encoding: Encoding, body: &Value) -> ProcResult<Vec<u8>> {
    match encoding {
        Encoding::Json => serde_json::to_vec(body).map_err(|e| ProcError::Protocol(e.to_string())),
        Encoding::Msgpack => {
            rmp_serde::to_vec(body).map_err(|e| ProcError::Protocol(e.to_string()))
        }
    }
}

/// Decodes a response body. An empty body decodes to an empty tuple list.
pub fn decode_body(encoding: Encoding, bytes: &[u8]) -> ProcResult<Value> {
    if bytes.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    match encoding {
        Encoding::Json => {
            serde_json::from_slice(bytes).map_err(|e| ProcError::Protocol(e.to_string()))
        }
        Encoding::Msgpack => msgpack::decode(bytes),
    }
}

/// HTTP transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    encoding: Encoding,
}

impl HttpTransport {
    pub fn new(encoding: Encoding) -> Self {
        Self::with_client(reqwest::Client::new(), encoding)
    }

    /// Uses a preconfigured `reqwest` client, e.g. one with timeouts or a proxy.
    pub fn with_client(client: reqwest::Client, encoding: Encoding) -> Self {
        Self { client, encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Encoding::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> ProcResult<Response> {
        let media_type = self.encoding.media_type();
        let body = encode_body(self.encoding, &request.body)?;

        let response = self
            .client
            .post(&request.url)
            .header(AUTHORIZATION, format!("bearer {}", request.authorization))
            .header(ACCEPT, media_type)
            .header(CONTENT_TYPE, media_type)
            .body(body)
            .send()
            .await
            .map_err(ProcError::unavailable)?;

        let status = response.status().as_u16();
        let headers = Headers::from(response.headers());
        let bytes = response.bytes().await.map_err(ProcError::unavailable)?;

        // The evaluator may answer in a different encoding than requested.
        let encoding = match headers.get(CONTENT_TYPE.as_str()) {
            Some(content_type) if content_type.contains("msgpack") => Encoding::Msgpack,
            Some(content_type) if content_type.contains("json") => Encoding::Json,
            _ => self.encoding,
        };
        trace!(status, bytes = bytes.len(), ?encoding, "received response");

        // Failure statuses still select the error kind when the body is not ours,
        // e.g. a plain-text 429 from a gateway.
        let body = match decode_body(encoding, &bytes) {
            Ok(body) => body,
            Err(error) if status != 200 => {
                debug!(status, %error, "ignoring undecodable error body");
                Value::Array(Vec::new())
            }
            Err(error) => return Err(error),
        };

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
