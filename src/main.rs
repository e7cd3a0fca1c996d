use std::sync::Arc;

use admitpath::api::{start_api_server, ApiState};
use admitpath::auth::{AuthService, TokenIssuer};
use admitpath::config::ObservabilityConfig;
use admitpath::observability::init_tracing;
use admitpath::storage::{create_pool, SqlxAccountRepository};
use admitpath::{Config, Result, APP_NAME, VERSION};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; real environments set variables directly.
    dotenvy::dotenv().ok();

    init_tracing(&ObservabilityConfig::from_env())?;
    info!(app = APP_NAME, version = VERSION, "Starting");

    let config = Config::from_env()?;

    let pool = create_pool(&config.database).await?;
    let repository = Arc::new(SqlxAccountRepository::new(pool));
    let auth_service = AuthService::new(repository, TokenIssuer::new(&config.auth));

    start_api_server(&config.api, ApiState { auth_service }).await
}
