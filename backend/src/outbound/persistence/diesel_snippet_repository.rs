//! PostgreSQL-backed `SnippetRepository` implementation using Diesel ORM.
//!
//! Expiry is evaluated against the injected clock rather than the database's
//! `NOW()` so reads and writes agree on the same notion of time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;

use crate::domain::ports::{LATEST_LIMIT, SnippetRepository, SnippetRepositoryError};
use crate::domain::{Snippet, SnippetId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSnippetRow, SnippetRow};
use super::pool::DbPool;
use super::schema::snippets;

/// Diesel-backed snippet store.
#[derive(Clone)]
pub struct DieselSnippetRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselSnippetRepository {
    /// Create a repository over `pool`, reading the current time from `clock`.
    #[must_use]
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn query_error(error: diesel::result::Error) -> SnippetRepositoryError {
    map_diesel_error(
        error,
        SnippetRepositoryError::query,
        SnippetRepositoryError::connection,
    )
}

fn row_to_snippet(row: SnippetRow) -> Result<Snippet, SnippetRepositoryError> {
    let id = SnippetId::new(row.id)
        .map_err(|err| SnippetRepositoryError::query(format!("stored snippet id: {err}")))?;
    Ok(Snippet {
        id,
        title: row.title,
        content: row.content,
        created: row.created,
        expires: row.expires,
    })
}

#[async_trait]
impl SnippetRepository for DieselSnippetRepository {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_in_days: i32,
    ) -> Result<SnippetId, SnippetRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, SnippetRepositoryError::connection))?;

        let created = self.clock.utc();
        let row = NewSnippetRow {
            title,
            content,
            created,
            expires: created + Duration::days(i64::from(expires_in_days)),
        };

        let id: i32 = diesel::insert_into(snippets::table)
            .values(&row)
            .returning(snippets::id)
            .get_result(&mut conn)
            .await
            .map_err(query_error)?;

        SnippetId::new(id)
            .map_err(|err| SnippetRepositoryError::query(format!("returned snippet id: {err}")))
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, SnippetRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, SnippetRepositoryError::connection))?;

        let row = snippets::table
            .filter(snippets::id.eq(id.get()))
            .filter(snippets::expires.gt(self.clock.utc()))
            .select(SnippetRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(query_error)?;

        row.map_or_else(|| Err(SnippetRepositoryError::no_record()), row_to_snippet)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, SnippetRepositoryError::connection))?;

        let rows: Vec<SnippetRow> = snippets::table
            .filter(snippets::expires.gt(self.clock.utc()))
            .order(snippets::id.desc())
            .limit(i64::try_from(LATEST_LIMIT).unwrap_or(i64::MAX))
            .select(SnippetRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query_error)?;

        rows.into_iter().map(row_to_snippet).collect()
    }
}
