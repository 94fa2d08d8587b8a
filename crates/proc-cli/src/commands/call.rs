use clap::Args;
use proc_client::Callable;
use proc_core::{Arguments, Expression};
use serde_json::Value;
use tracing::info;

use super::{Context, parse_argument, parse_value};
use crate::error::{CliError, CliResult};

/// Arguments shared by `call` and `compile`.
#[derive(Debug, Args)]
pub struct CallArgs {
    /// Dotted proc name, e.g. `type.string.truncate`.
    #[arg(value_name = "PROC")]
    pub proc: String,

    /// Input value, as JSON or a plain string.
    #[arg(short, long, value_name = "VALUE")]
    pub input: Option<String>,

    /// Named argument, as KEY=VALUE (repeatable).
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", value_parser = parse_argument)]
    pub arguments: Vec<(String, Value)>,
}

/// Arguments for the `compile` command.
pub type CompileArgs = CallArgs;

impl CallArgs {
    fn input(&self) -> Option<Expression> {
        self.input.as_deref().map(|raw| Expression::from(parse_value(raw)))
    }

    fn arguments(&self) -> Arguments {
        self.arguments
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    fn callable(&self, context: &Context) -> CliResult<Callable> {
        context
            .client
            .get(&self.proc)
            .map_err(|err| CliError::InvalidArgument {
                message: err.to_string(),
            })
    }
}

/// Calls a proc and prints its result, draining paginated results.
pub async fn execute(args: CallArgs, context: &Context) -> CliResult<()> {
    let callable = args.callable(context)?;
    info!(proc = %args.proc, "calling");
    let value = callable
        .call(args.input(), &args.arguments())
        .await?
        .into_value()
        .await?;
    context.print(&value)
}

/// Prints the `core.exec` program for a call without sending it.
pub fn compile(args: CompileArgs, context: &Context) -> CliResult<()> {
    let callable = args.callable(context)?;
    let program = callable.with(args.input(), &args.arguments()).compile();
    context.print(&program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ConnectionArgs;
    use serde_json::json;

    fn context() -> Context {
        let connection = ConnectionArgs {
            auth: Some("token".into()),
            ..Default::default()
        };
        Context::new(&connection, true).unwrap()
    }

    #[test]
    fn builds_input_and_arguments() {
        let args = CallArgs {
            proc: "type.string.truncate".into(),
            input: Some("foo".into()),
            arguments: vec![("length".into(), json!(2))],
        };
        let program = args
            .callable(&context())
            .unwrap()
            .with(args.input(), &args.arguments())
            .compile();

        assert_eq!(
            program,
            json!([[
                "$$",
                "proc",
                ["{}", ["()", "type.string.truncate", [">>", ["%%", "foo"]], ["$$", "length", ["%%", 2]]]]
            ]])
        );
    }

    #[test]
    fn empty_proc_names_are_usage_errors() {
        let args = CallArgs {
            proc: String::new(),
            input: None,
            arguments: Vec::new(),
        };

        let error = args.callable(&context()).unwrap_err();
        assert_eq!(error.exit_code(), 64);
    }
}
