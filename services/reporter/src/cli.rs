use crate::commands::{run_preview, run_report, PreviewArgs, RunArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use coaching_compliance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Coaching Compliance Reporter",
    about = "Build the weekly coaching compliance report and e-mail it to each director",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch records, aggregate compliance and e-mail every director (default command)
    Run(RunArgs),
    /// Aggregate exported record files and print the reports without sending anything
    Preview(PreviewArgs),
    /// Start the HTTP preview service
    Serve(ServeArgs),
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

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => run_report(args),
        Command::Preview(args) => run_preview(args),
        Command::Serve(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::run(args))
        }
    }
}
