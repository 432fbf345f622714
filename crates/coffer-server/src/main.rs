#![deny(clippy::unwrap_used)]

use coffer_db::migrate;
use coffer_server::{bootstrap, runtime, settings};

mod cli;

#[tokio::main]
async fn main() {
    let run_mode = cli::parse_args();
    let settings = settings::Settings::from_env();
    runtime::init_tracing(&settings);

    if run_mode == cli::RunMode::Server {
        if let Err(missing) = settings::preflight(&settings) {
            tracing::error!(
                event = "preflight_failed",
                missing = ?missing,
                "Required configuration missing"
            );
            std::process::exit(1);
        }
        bootstrap::log_startup(&settings);
        bootstrap::init_metrics_registry(&settings.config.metrics);
    }

    let db = match bootstrap::connect_db(&settings).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(event = "db_connect_failed", error = %err);
            std::process::exit(1);
        }
    };
    if run_mode == cli::RunMode::Migrate {
        if let Err(err) = migrate(&db).await {
            tracing::error!(event = "migration_failed", error = %err);
            std::process::exit(1);
        }
        tracing::info!(event = "migrations_applied", "Migrations applied");
        return;
    }

    let state = match bootstrap::build_state(&settings, db) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(event = "state_build_failed", error = %err);
            std::process::exit(1);
        }
    };
    let app = bootstrap::build_app(&settings.config.metrics, state);
    bootstrap::serve(&settings, app).await;
}
