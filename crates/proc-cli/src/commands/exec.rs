use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use proc_client::client::EXEC_PROC;
use proc_client::compiler::PROC_ARGUMENT;
use proc_core::wire::{Wire, tag};
use proc_core::{Arguments, Expression, WireError};
use serde_json::Value;
use tracing::info;

use super::Context;
use crate::error::{CliError, CliResult};

/// Arguments for the `exec` command.
#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Program produced by `proc compile`, or a bare `{}` envelope.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Sends a compiled program to `core.exec` and prints the result.
pub async fn execute(args: ExecArgs, context: &Context) -> CliResult<()> {
    let program = load_program(&args.file)?;
    info!(file = %args.file.display(), "executing program");
    let value = context
        .client
        .call(
            EXEC_PROC,
            None,
            &Arguments::from([(PROC_ARGUMENT, program)]),
        )
        .await?
        .into_value()
        .await?;
    context.print(&value)
}

fn load_program(path: &Path) -> CliResult<Expression> {
    if !path.exists() {
        return Err(CliError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let ast: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    program_from_ast(&ast).map_err(|source| CliError::InvalidProgram {
        path: path.to_path_buf(),
        source,
    })
}

/// Accepts either a `core.exec` body (`[["$$", "proc", program]]`) or the
/// program itself.
fn program_from_ast(ast: &Value) -> Result<Expression, WireError> {
    let program = match ast.as_array().and_then(|items| items.first()) {
        Some(Value::String(_)) => ast,
        _ => ast
            .as_array()
            .into_iter()
            .flatten()
            .find(|tuple| {
                tuple[0] == tag::ARGUMENT && tuple[1] == PROC_ARGUMENT
            })
            .map(|tuple| &tuple[2])
            .ok_or_else(|| WireError::NotATuple(ast.to_string()))?,
    };
    Expression::from_wire(&Wire::decode(program)?)
}
