//! Readiness reporting.
//!
//! A quote request needs three things to succeed end to end: a
//! reachable database, a migrated schema, and a writable proposal
//! directory. `/health` probes each and reports 200 only when all
//! three hold, so a fresh deploy with unapplied migrations shows up as
//! degraded instead of failing its first quote.

use std::path::{Path, PathBuf};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use roofline_db::DbPool;
use serde::Serialize;

const QUOTING_TABLES: &[&str] = &["contractor", "lead", "quote", "widget_event"];

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    documents_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    pub ok: bool,
    pub detail: String,
}

impl ComponentHealth {
    fn ok(detail: impl Into<String>) -> Self {
        Self { ok: true, detail: detail.into() }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self { ok: false, detail: detail.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub database: ComponentHealth,
    pub schema: ComponentHealth,
    pub documents: ComponentHealth,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, documents_dir: PathBuf) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, documents_dir })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<ReadinessReport>) {
    let database = database_check(&state.db_pool).await;
    let schema = if database.ok {
        schema_check(&state.db_pool).await
    } else {
        ComponentHealth::failed("skipped: database unreachable")
    };
    let documents = documents_check(&state.documents_dir).await;

    let ready = database.ok && schema.ok && documents.ok;
    let report = ReadinessReport {
        status: if ready { "ready" } else { "degraded" },
        database,
        schema,
        documents,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(report))
}

async fn database_check(pool: &DbPool) -> ComponentHealth {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => ComponentHealth::ok("database reachable"),
        Err(error) => ComponentHealth::failed(format!("database query failed: {error}")),
    }
}

async fn schema_check(pool: &DbPool) -> ComponentHealth {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?, ?, ?, ?)",
    )
    .bind(QUOTING_TABLES[0])
    .bind(QUOTING_TABLES[1])
    .bind(QUOTING_TABLES[2])
    .bind(QUOTING_TABLES[3])
    .fetch_one(pool)
    .await;

    match count {
        Ok(count) if count == QUOTING_TABLES.len() as i64 => {
            ComponentHealth::ok("quoting schema migrated")
        }
        Ok(count) => ComponentHealth::failed(format!(
            "quoting schema incomplete: {count} of {} tables present",
            QUOTING_TABLES.len()
        )),
        Err(error) => ComponentHealth::failed(format!("schema query failed: {error}")),
    }
}

async fn documents_check(documents_dir: &Path) -> ComponentHealth {
    let probe = documents_dir.join(".readiness_probe");
    let result = async {
        tokio::fs::create_dir_all(documents_dir).await?;
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await
    }
    .await;

    match result {
        Ok(()) => ComponentHealth::ok("proposal directory writable"),
        Err(error) => {
            ComponentHealth::failed(format!("proposal directory not writable: {error}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use roofline_db::{connect_with_settings, migrations};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn reports_ready_when_all_components_pass() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let dir = tempfile::tempdir().expect("tempdir");

        let state = HealthState { db_pool: pool.clone(), documents_dir: dir.path().to_path_buf() };
        let (status, Json(report)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ready");
        assert!(report.database.ok);
        assert!(report.schema.ok);
        assert!(report.documents.ok);

        pool.close().await;
    }

    #[tokio::test]
    async fn unmigrated_database_reports_degraded_schema() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        let dir = tempfile::tempdir().expect("tempdir");

        let state = HealthState { db_pool: pool.clone(), documents_dir: dir.path().to_path_buf() };
        let (status, Json(report)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "degraded");
        assert!(report.database.ok);
        assert!(!report.schema.ok);

        pool.close().await;
    }

    #[tokio::test]
    async fn closed_pool_reports_degraded_and_skips_schema_check() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        pool.close().await;
        let dir = tempfile::tempdir().expect("tempdir");

        let state = HealthState { db_pool: pool, documents_dir: dir.path().to_path_buf() };
        let (status, Json(report)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "degraded");
        assert!(!report.database.ok);
        assert_eq!(report.schema.detail, "skipped: database unreachable");
    }

    #[tokio::test]
    async fn unwritable_documents_path_reports_degraded() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrate");

        // A regular file where the directory should be.
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("documents");
        std::fs::write(&blocker, b"not a directory").expect("write blocker");

        let state = HealthState { db_pool: pool.clone(), documents_dir: blocker };
        let (status, Json(report)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(report.database.ok);
        assert!(report.schema.ok);
        assert!(!report.documents.ok);

        pool.close().await;
    }
}
