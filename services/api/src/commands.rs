use crate::infra::{load_config, prepare_store};
use clap::Args;
use leadflow::clients::{ClientService, ClientServiceError, LeadWindow, SqliteClientStore};
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::telemetry;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DatabaseArgs {
    /// Override the configured SQLite database path (DB_PATH)
    #[arg(long)]
    pub(crate) db_path: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct AssignArgs {
    /// Requested lead window start (YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub(crate) lead_start: String,
    /// Requested lead window end (YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub(crate) lead_end: String,
    #[command(flatten)]
    pub(crate) database: DatabaseArgs,
}

/// Shared start-up for one-shot commands: config, logging, then a migrated store.
fn open_session(
    db_path: Option<String>,
) -> Result<(AppConfig, SqliteClientStore, Vec<&'static str>), AppError> {
    let config = load_config(db_path)?;
    telemetry::init(&config.telemetry)?;
    let (store, applied) = prepare_store(&config.database)?;
    Ok((config, store, applied))
}

pub(crate) fn run_migrate(args: DatabaseArgs) -> Result<(), AppError> {
    let (config, _, applied) = open_session(args.db_path)?;
    if applied.is_empty() {
        println!("Schema up to date ({})", config.database.path);
    } else {
        println!("Applied migrations to {}", config.database.path);
        for id in applied {
            println!("- {id}");
        }
    }
    Ok(())
}

pub(crate) fn run_list(args: DatabaseArgs) -> Result<(), AppError> {
    let (_, store, _) = open_session(args.db_path)?;
    let service = ClientService::new(Arc::new(store));

    let clients = service.list_clients()?;
    println!("{}", serde_json::to_string_pretty(&clients)?);
    Ok(())
}

pub(crate) fn run_assign(args: AssignArgs) -> Result<(), AppError> {
    let AssignArgs {
        lead_start,
        lead_end,
        database,
    } = args;

    let (_, store, _) = open_session(database.db_path)?;
    let service = ClientService::new(Arc::new(store));

    match service.assign_lead(LeadWindow::new(lead_start, lead_end)) {
        Ok(lead) => {
            println!("{}", serde_json::to_string_pretty(&lead)?);
            Ok(())
        }
        Err(ClientServiceError::NoEligibleClient) => {
            println!("Lead not assigned: no client has capacity for the requested window");
            Err(ClientServiceError::NoEligibleClient.into())
        }
        Err(other) => Err(other.into()),
    }
}
