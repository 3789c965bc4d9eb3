use crate::commands::{run_assign, run_list, run_migrate, AssignArgs, DatabaseArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use leadflow::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Router",
    about = "Register clients and route incoming leads to the best-suited one",
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
    /// Create the schema and apply pending migrations, then exit
    Migrate(DatabaseArgs),
    /// Inspect clients or assign a lead from the command line
    Clients {
        #[command(subcommand)]
        command: ClientsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ClientsCommand {
    /// Print every client with its assigned leads as JSON
    List(DatabaseArgs),
    /// Assign a single lead and print the created record
    Assign(AssignArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) database: DatabaseArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Migrate(args) => run_migrate(args),
        Command::Clients {
            command: ClientsCommand::List(args),
        } => run_list(args),
        Command::Clients {
            command: ClientsCommand::Assign(args),
        } => run_assign(args),
    }
}
