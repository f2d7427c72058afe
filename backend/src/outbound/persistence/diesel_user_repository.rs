//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{LoginCredentials, NewUser, UserId};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserCredentialsRow};
use super::password::{BCRYPT_COST, hash_password, verify_password};
use super::pool::DbPool;
use super::schema::users;

/// Unique constraint guarding `users.email`.
const EMAIL_CONSTRAINT: &str = "users_uc_email";

/// Diesel-backed account store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselUserRepository {
    /// Create a repository over `pool`; `clock` stamps new accounts.
    #[must_use]
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn query_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<(), UserPersistenceError> {
        let hashed_password = hash_password(user.password(), BCRYPT_COST).await?;

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let row = NewUserRow {
            name: user.name(),
            email: user.email(),
            hashed_password: hashed_password.as_str(),
            created: self.clock.utc(),
        };

        match diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err, EMAIL_CONSTRAINT) => {
                Err(UserPersistenceError::duplicate_email())
            }
            Err(err) => Err(query_error(err)),
        }
    }

    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<UserId, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let row = users::table
            .filter(users::email.eq(credentials.email()))
            .select(UserCredentialsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(query_error)?;
        drop(conn);

        let Some(stored) = row else {
            debug!("login attempt for unknown email");
            return Err(UserPersistenceError::invalid_credentials());
        };

        if verify_password(credentials.password(), stored.hashed_password).await? {
            Ok(UserId::new(stored.id))
        } else {
            Err(UserPersistenceError::invalid_credentials())
        }
    }

    async fn exists(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        diesel::select(diesel::dsl::exists(
            users::table.filter(users::id.eq(id.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(query_error)
    }
}
