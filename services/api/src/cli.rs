use crate::demo::{run_demo, run_id_inspect, DemoArgs, IdInspectArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_origination::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Origination Service",
    about = "Run and demonstrate the loan application origination service from the command line",
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
    /// Decode transaction id references without touching storage
    Id {
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Run an end-to-end CLI demo covering the origination workflow
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum IdCommand {
    /// Print the parts of a transaction id reference
    Inspect(IdInspectArgs),
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
        Command::Id {
            command: IdCommand::Inspect(args),
        } => run_id_inspect(args),
        Command::Demo(args) => run_demo(args),
    }
}
