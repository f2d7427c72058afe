//! PostgreSQL-backed `SessionRepository` implementation using Diesel ORM.
//!
//! Liveness is judged against the injected clock, matching the snippet
//! adapter, so an expired row is invisible even before the purge removes it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use mockable::Clock;

use crate::domain::ports::{SessionRepository, SessionRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewSessionRow;
use super::pool::DbPool;
use super::schema::sessions;

/// Diesel-backed session store.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselSessionRepository {
    /// Create a repository over `pool`, reading the current time from `clock`.
    #[must_use]
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn conn(
        &self,
    ) -> Result<PooledConnection<'_, AsyncPgConnection>, SessionRepositoryError> {
        self.pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, SessionRepositoryError::connection))
    }
}

fn query_error(error: diesel::result::Error) -> SessionRepositoryError {
    map_diesel_error(
        error,
        SessionRepositoryError::query,
        SessionRepositoryError::connection,
    )
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn find(&self, token: &str) -> Result<Option<String>, SessionRepositoryError> {
        let mut conn = self.conn().await?;
        sessions::table
            .filter(sessions::token.eq(token))
            .filter(sessions::expiry.gt(self.clock.utc()))
            .select(sessions::data)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(query_error)
    }

    async fn insert(
        &self,
        token: &str,
        data: &str,
        ttl: TimeDelta,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.conn().await?;
        let row = NewSessionRow {
            token,
            data,
            expiry: self.clock.utc() + ttl,
        };
        diesel::insert_into(sessions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(drop)
            .map_err(query_error)
    }

    async fn update(
        &self,
        token: &str,
        data: &str,
        ttl: TimeDelta,
    ) -> Result<bool, SessionRepositoryError> {
        let mut conn = self.conn().await?;
        let now = self.clock.utc();
        let updated = diesel::update(
            sessions::table
                .filter(sessions::token.eq(token))
                .filter(sessions::expiry.gt(now)),
        )
        .set((sessions::data.eq(data), sessions::expiry.eq(now + ttl)))
        .execute(&mut conn)
        .await
        .map_err(query_error)?;
        Ok(updated > 0)
    }

    async fn touch(&self, token: &str, ttl: TimeDelta) -> Result<(), SessionRepositoryError> {
        let mut conn = self.conn().await?;
        let now = self.clock.utc();
        diesel::update(
            sessions::table
                .filter(sessions::token.eq(token))
                .filter(sessions::expiry.gt(now)),
        )
        .set(sessions::expiry.eq(now + ttl))
        .execute(&mut conn)
        .await
        .map(drop)
        .map_err(query_error)
    }

    async fn delete(&self, token: &str) -> Result<(), SessionRepositoryError> {
        let mut conn = self.conn().await?;
        diesel::delete(sessions::table.filter(sessions::token.eq(token)))
            .execute(&mut conn)
            .await
            .map(drop)
            .map_err(query_error)
    }

    async fn delete_expired(&self) -> Result<usize, SessionRepositoryError> {
        let mut conn = self.conn().await?;
        diesel::delete(sessions::table.filter(sessions::expiry.le(self.clock.utc())))
            .execute(&mut conn)
            .await
            .map_err(query_error)
    }
}
