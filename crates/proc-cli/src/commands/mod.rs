//! CLI commands.
//!
//! Each command is implemented in its own module; they share the client
//! context built from global flags and configuration.

pub mod call;
pub mod exec;
pub mod rate_limit;
pub mod run;

pub use call::{CallArgs, CompileArgs};
pub use exec::ExecArgs;
pub use run::{CompileFileArgs, RunArgs};

use std::path::PathBuf;

use proc_client::{Client, ClientBuilder};
use proc_config::ProcConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

/// Connection overrides taken from global flags.
#[derive(Debug, Default, Clone)]
pub struct ConnectionArgs {
    pub config: Option<PathBuf>,
    pub auth: Option<String>,
    pub host: Option<String>,
    pub scheme: Option<String>,
}

/// Shared state for a command invocation.
#[derive(Debug)]
pub struct Context {
    pub client: Client,
    /// Compact single-line output instead of pretty-printed JSON.
    pub json: bool,
}

impl Context {
    pub fn new(connection: &ConnectionArgs, json: bool) -> CliResult<Self> {
        let config = load_config(connection.config.as_ref())?;
        let mut builder = ClientBuilder::from_config(&config);
        if let Some(auth) = &connection.auth {
            builder = builder.authorization(auth);
        }
        if let Some(host) = &connection.host {
            builder = builder.host(host);
        }
        if let Some(scheme) = &connection.scheme {
            builder = builder.scheme(scheme);
        }
        let client = builder.build();
        debug!(?client, "client ready");

        Ok(Self { client, json })
    }

    /// Prints a value to stdout.
    pub fn print(&self, value: &Value) -> CliResult<()> {
        let text = if self.json {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        println!("{text}");
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> CliResult<ProcConfig> {
    match path {
        Some(path) => ProcConfig::from_file(path).map_err(|err| CliError::Config {
            message: err.to_string(),
        }),
        None => Ok(ProcConfig::load_scoped().unwrap_or_else(|err| {
            warn!(%err, "ignoring unreadable configuration");
            ProcConfig::default()
        })),
    }
}

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parses `key=value`, with the value read by [`parse_value`].
pub fn parse_argument(raw: &str) -> Result<(String, Value), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), parse_value(value))),
        _ => Err(format!("expected KEY=VALUE, found `{raw}`")),
    }
}
