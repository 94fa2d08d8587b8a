//! proc client - remote dispatch of proc expressions.
//!
//! Build calls through a [`Client`], compose them into pipelines, and send the
//! whole expression graph to the evaluator in a single request. Nothing is
//! evaluated locally.
//!
//! ```no_run
//! # async fn example() -> proc_core::ProcResult<()> {
//! use proc_client::Client;
//! use proc_core::Arguments;
//!
//! let client = Client::new("token");
//! let truncate = client.get("type.string.truncate")?;
//! let output = truncate
//!     .call(Some("foobar".into()), &Arguments::from([("length", 3)]))
//!     .await?;
//! println!("{:?}", output.into_value().await?);
//! # Ok(())
//! # }
//! ```

pub mod callable;
pub mod client;
pub mod compiler;
pub mod composition;
pub mod cursor;
pub mod dispatch;
pub mod msgpack;
pub mod rate_limit;
pub mod transport;

#[cfg(test)]
mod testing;

pub use callable::Callable;
pub use client::{Client, ClientBuilder, Output, ResponseMeta};
pub use compiler::Compiler;
pub use composition::ComposedCallable;
pub use cursor::Cursor;
pub use dispatch::{Attr, Operation};
pub use rate_limit::{RateLimit, Window};
pub use transport::{Headers, HttpTransport, Request, Response, Transport};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
