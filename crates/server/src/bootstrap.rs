use std::sync::Arc;

use stafflow_core::audit::TracingAuditSink;
use stafflow_core::config::{AppConfig, ConfigError, LoadOptions};
use stafflow_db::repositories::{
    SqlAppointmentRepository, SqlApprovalRepository, SqlContractRepository,
    SqlDismissalRepository, SqlEmployeeRepository, SqlResignationRepository, SqlSalaryRepository,
};
use stafflow_db::{connect_with_settings, migrations, DbPool};
use stafflow_workflow::{ApprovalService, WorkflowStores};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<ApprovalService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let service = Arc::new(ApprovalService::new(
        workflow_stores(&db_pool),
        Arc::new(TracingAuditSink),
    ));

    Ok(Application { config, db_pool, service })
}

pub fn workflow_stores(pool: &DbPool) -> WorkflowStores {
    WorkflowStores {
        approvals: Arc::new(SqlApprovalRepository::new(pool.clone())),
        employees: Arc::new(SqlEmployeeRepository::new(pool.clone())),
        contracts: Arc::new(SqlContractRepository::new(pool.clone())),
        salaries: Arc::new(SqlSalaryRepository::new(pool.clone())),
        resignations: Arc::new(SqlResignationRepository::new(pool.clone())),
        dismissals: Arc::new(SqlDismissalRepository::new(pool.clone())),
        appointments: Arc::new(SqlAppointmentRepository::new(pool.clone())),
    }
}
