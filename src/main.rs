use crate::config::AppConfig;
use crate::db::{init_db, Database};
use crate::erp::ExtrabatClient;
use crate::mailer::MailFunctions;
use crate::responses::error_to_response;
use crate::router::handle;
use crate::state::AppState;
use astra::Server;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod erp;
mod errors;
mod mailer;
mod responses;
mod router;
mod spreadsheets;
mod state;
mod templates;
mod workflows;

#[cfg(test)]
mod tests;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.database_path.clone());
    if let Err(e) = init_db(&db, &config.schema_path) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    let erp = match ExtrabatClient::new(&config.erp) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "could not build the Extrabat client");
            std::process::exit(1);
        }
    };
    if config.erp.api_key.is_empty() {
        tracing::warn!("EXTRABAT_API_KEY is not set, ERP calls will be rejected");
    }

    let app = AppState {
        db,
        erp: Box::new(erp),
        mailer: Box::new(MailFunctions::new(&config.functions)),
    };

    tracing::info!(addr = %config.bind_addr, workers = config.max_workers, "starting server");

    let server = Server::bind(&config.bind_addr).max_workers(config.max_workers);

    let result = server.serve(move |req: astra::Request, _info| {
        let path = req.uri().path().to_string();
        match handle(req, &app) {
            Ok(resp) => resp,
            Err(err) => error_to_response(err, &path),
        }
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down");
}
