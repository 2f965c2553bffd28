use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use colored::Colorize;
use log::{error, info, warn};
use manual_core::{
    AuthError, BoxedDatabase, Credentials, DatabaseError, Manual, MemoryDatabase, Notifier,
    PgDatabase, SystemSampler, TelegramNotifier,
};
use manual_server::{ServerContext, TemplateError};
use thiserror::Error;

use crate::config::{Command, Config};

mod config;
mod logging;

const ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Error)]
enum StartupError {
    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not create the admin user: {0}")]
    Admin(AuthError),

    #[error("Could not load page templates: {0}")]
    Templates(#[from] TemplateError),

    #[error("Could not run the server: {0}")]
    Server(#[from] std::io::Error),
}

impl StartupError {
    fn hint(&self) -> &'static str {
        match self {
            StartupError::Database(_) => "Make sure PostgreSQL is running and that the DB_* variables point to it, then try again.",
            StartupError::Admin(_) => "Check that the database is reachable and that ADMIN_PASSWORD is set.",
            StartupError::Templates(_) => "The bundled templates are broken. This should not happen.",
            StartupError::Server(_) => "Make sure SERVER_PORT is free and can be bound by this user.",
        }
    }
}

async fn connect(config: &Config) -> Result<BoxedDatabase, StartupError> {
    let database: BoxedDatabase = if config.in_memory {
        warn!("Using an in-memory database, all data is lost on shutdown");
        Arc::new(MemoryDatabase::new())
    } else {
        info!("Connecting to {}:{}...", config.db_host, config.db_port);
        Arc::new(PgDatabase::new(&config.database_url()).await?)
    };

    database.init_schema().await?;

    Ok(database)
}

fn build_manual(config: &Config, database: BoxedDatabase) -> Manual {
    let notifier = TelegramNotifier::from_credentials(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    )
    .map(|n| Arc::new(n) as Arc<dyn Notifier>);

    let manual = Manual::new(database, Arc::new(SystemSampler::new()), notifier);

    if !manual.monitor.is_configured() {
        warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID is missing, alerts will not be delivered");
    }

    manual
}

async fn create_admin(manual: &Manual, password: &str) -> Result<(), StartupError> {
    let credentials = Credentials::new(ADMIN_USERNAME, password);

    match manual.auth.register_admin(credentials).await {
        Ok(user) => {
            info!("Created admin user {}", user.username);
            Ok(())
        }
        Err(AuthError::Db(DatabaseError::Conflict { .. })) => {
            info!("Admin user already exists");
            Ok(())
        }
        Err(e) => Err(StartupError::Admin(e)),
    }
}

async fn start(config: Config) -> Result<(), StartupError> {
    let database = connect(&config).await?;
    let manual = build_manual(&config, database);

    if let Some(Command::CreateAdmin) = config.command {
        return create_admin(&manual, &config.admin_password).await;
    }

    manual.monitor.clone().run(config.monitor_interval());
    info!(
        "Checking resources every {}s",
        config.monitor_interval().as_secs()
    );

    let context = ServerContext::new(manual)?;
    manual_server::run_server(context, config.server_port).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(e) = logging::init_logger(config.verbose) {
        eprintln!("Could not initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(
                "{} Read the error below to troubleshoot the issue.",
                "DevOps manual failed to start!".bold().red()
            );
            error!("{}", error);
            error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());

            ExitCode::FAILURE
        }
    }
}
