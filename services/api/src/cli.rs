use crate::score::{run_schema, run_score, SchemaArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_decision::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Decisioning Service",
    about = "Serve and exercise credit decisions from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one application offline and print the response payload
    Score(ScoreArgs),
    /// Print the active feature schema
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Schema(args) => run_schema(args),
    }
}
