use std::fs;
use std::path::PathBuf;

use clap::Args;
use proc_client::client::EXEC_PROC;
use proc_client::{Callable, Client, ComposedCallable};
use proc_core::Arguments;
use tracing::info;

use super::Context;
use crate::error::{CliError, CliResult};

/// Remote compiler entry point.
pub const COMPILE_PROC: &str = "core.compile";

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source file; its extension selects the language.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the `compile-file` command.
pub type CompileFileArgs = RunArgs;

/// Compiles a source file remotely and executes the result in one request.
pub async fn execute(args: RunArgs, context: &Context) -> CliResult<()> {
    let program = program(&context.client, &args)?;
    info!(file = %args.file.display(), "running source file");
    let value = program
        .call(None, &Arguments::new())
        .await?
        .into_value()
        .await?;
    context.print(&value)
}

/// Compiles a source file remotely and prints the resulting program.
pub async fn compile(args: CompileFileArgs, context: &Context) -> CliResult<()> {
    let compile = compile_call(&context.client, &args)?;
    info!(file = %args.file.display(), "compiling source file");
    let value = compile
        .call(None, &Arguments::new())
        .await?
        .into_value()
        .await?;
    context.print(&value)
}

/// `core.compile(code, lang) >> core.exec`.
fn program(client: &Client, args: &RunArgs) -> CliResult<ComposedCallable> {
    let exec = client.get(EXEC_PROC).map_err(invalid)?;
    Ok(compile_call(client, args)?.compose([exec]))
}

/// `core.compile` bound to the file's source and language.
fn compile_call(client: &Client, args: &RunArgs) -> CliResult<Callable> {
    if !args.file.exists() {
        return Err(CliError::InputNotFound {
            path: args.file.clone(),
        });
    }
    let code = fs::read_to_string(&args.file)?;
    let lang = args
        .file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string();

    let compile = client.get(COMPILE_PROC).map_err(invalid)?;
    Ok(compile
        .with_argument("code", code)
        .with_argument("lang", lang))
}

fn invalid(err: impl std::fmt::Display) -> CliError {
    CliError::InvalidArgument {
        message: err.to_string(),
    }
}
