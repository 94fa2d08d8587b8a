//! Authorization lookup.
//!
//! The token is taken from the first source that provides one: an explicit
//! value, the `PROC_AUTH` environment variable, then the trimmed contents of
//! `~/.proc/auth`. With none of them present the token is empty and the
//! evaluator decides what an anonymous caller may do.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::CONFIG_DIR;

/// Environment variable consulted when no token is given explicitly.
pub const AUTH_ENV_VAR: &str = "PROC_AUTH";

/// File under `~/.proc` holding the token.
pub const AUTH_FILE: &str = "auth";

/// Process environment as seen by the lookup.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
    fn home_dir(&self) -> Option<PathBuf>;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Resolves the token to send, never failing.
pub fn resolve_authorization(explicit: Option<&str>, env: &dyn Environment) -> String {
    if let Some(token) = explicit.filter(|token| !token.is_empty()) {
        trace!("using explicit authorization");
        return token.to_string();
    }

    if let Some(token) = env.var(AUTH_ENV_VAR) {
        trace!("using authorization from {AUTH_ENV_VAR}");
        return token.trim().to_string();
    }

    let Some(home) = env.home_dir() else {
        return String::new();
    };
    match env.read_to_string(&home.join(CONFIG_DIR).join(AUTH_FILE)) {
        Ok(contents) => {
            trace!("using authorization from ~/.proc/auth");
            contents.trim().to_string()
        }
        Err(_) => String::new(),
    }
}
