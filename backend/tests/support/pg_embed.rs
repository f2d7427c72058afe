//! Embedded PostgreSQL helpers for the Diesel repository suites.
//!
//! Every suite shares one cluster per test process. A template database is
//! migrated once and each test clones it, so tests never see each other's
//! rows. Set `SKIP_TEST_CLUSTER=1` to skip these suites where the cluster
//! cannot start.

use std::sync::{Mutex, OnceLock};

use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use snippetbox::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use tokio::runtime::Runtime;
use uuid::Uuid;

const TEMPLATE_NAME: &str = "snippetbox_template";

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// A migrated, test-private database with a runtime to drive the pool.
///
/// Fields drop in order: connections close before the database goes.
pub struct Database {
    /// Pool connected to the test database.
    pub pool: DbPool,
    /// Runtime that owns the pool's connections.
    pub runtime: Runtime,
    _database: TemporaryDatabase,
}

fn ensure_template(cluster: &ClusterHandle, runtime: &Runtime) -> Result<(), String> {
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(TEMPLATE_NAME)
        .map_err(|err| format!("template check: {err:?}"))?;
    if exists {
        return Ok(());
    }

    cluster
        .create_database(TEMPLATE_NAME)
        .map_err(|err| format!("create template: {err:?}"))?;
    let url = cluster.connection().database_url(TEMPLATE_NAME);
    runtime
        .block_on(run_pending_migrations(&url))
        .map_err(|err| err.to_string())
}

/// Clone the migrated template into a fresh database and open a small pool.
pub fn database() -> Result<Database, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster_handle().map_err(|err| err.to_string())?;
    ensure_template(cluster, &runtime)?;

    let name = format!("test_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database_from_template(name.as_str(), TEMPLATE_NAME)
        .map_err(|err| format!("create database from template: {err:?}"))?;

    let config = PoolConfig::new(database.url())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(Database {
        pool,
        runtime,
        _database: database,
    })
}

/// True when `SKIP_TEST_CLUSTER` is "1", "true" or "yes" (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip when allowed, otherwise fail loudly so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
