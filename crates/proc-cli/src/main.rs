//! proc CLI - call, compile and execute proc expressions from the shell.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::{ConnectionArgs, Context};
use error::CliResult;

/// proc: remote procedure calls over a tagged-tuple wire format.
#[derive(Debug, Parser)]
#[command(name = "proc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (can be repeated: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Authorization token; defaults to $PROC_AUTH or ~/.proc/auth.
    #[arg(long, global = true, value_name = "TOKEN")]
    pub auth: Option<String>,

    /// Evaluator host, with an optional port.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Evaluator URL scheme.
    #[arg(long, global = true)]
    pub scheme: Option<String>,

    /// Print results as compact single-line JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Call a proc and print its result.
    ///
    /// Paginated results are fetched to the end before printing.
    Call(commands::CallArgs),

    /// Print the program for a call without sending it.
    ///
    /// The output can be sent later with `proc exec`.
    #[command(visible_alias = "c")]
    Compile(commands::CompileArgs),

    /// Compile a source file remotely and print the program.
    ///
    /// The language is taken from the file extension.
    CompileFile(commands::CompileFileArgs),

    /// Send a compiled program to `core.exec`.
    Exec(commands::ExecArgs),

    /// Compile a source file remotely and execute it.
    #[command(visible_alias = "r")]
    Run(commands::RunArgs),

    /// Show the current rate limit.
    RateLimit,

    /// Show version information.
    Version,
}

impl Cli {
    fn connection(&self) -> ConnectionArgs {
        ConnectionArgs {
            config: self.config.clone(),
            auth: self.auth.clone(),
            host: self.host.clone(),
            scheme: self.scheme.clone(),
        }
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

async fn run(cli: Cli) -> CliResult<()> {
    let connection = cli.connection();
    match cli.command {
        Command::Version => {
            print_version();
            Ok(())
        }
        Command::Call(args) => commands::call::execute(args, &Context::new(&connection, cli.json)?).await,
        Command::Compile(args) => commands::call::compile(args, &Context::new(&connection, cli.json)?),
        Command::CompileFile(args) => commands::run::compile(args, &Context::new(&connection, cli.json)?).await,
        Command::Exec(args) => commands::exec::execute(args, &Context::new(&connection, cli.json)?).await,
        Command::Run(args) => commands::run::execute(args, &Context::new(&connection, cli.json)?).await,
        Command::RateLimit => commands::rate_limit::execute(&Context::new(&connection, cli.json)?).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    run(cli).await.map(|_| ExitCode::SUCCESS).unwrap_or_else(|e| {
        eprintln!("{e}");
        ExitCode::from(e.exit_code() as u8)
    })
}

/// Print version information.
fn print_version() {
    println!("proc {}", env!("CARGO_PKG_VERSION"));
    println!("proc-client {}", proc_client::VERSION);
}
