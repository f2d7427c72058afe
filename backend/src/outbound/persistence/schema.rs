//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Server-side session state keyed by the token in the session cookie.
    sessions (token) {
        /// Random session token.
        token -> Text,
        /// JSON object of session values.
        data -> Text,
        /// Instant after which the session is ignored and may be purged.
        expiry -> Timestamptz,
    }
}

diesel::table! {
    /// Stored snippets. Rows are filtered, never deleted, once `expires` passes.
    snippets (id) {
        /// Primary key.
        id -> Int4,
        /// Title, at most 100 characters.
        title -> Varchar,
        /// Body text.
        content -> Text,
        /// Creation instant (UTC).
        created -> Timestamptz,
        /// Expiry instant (UTC).
        expires -> Timestamptz,
    }
}

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key.
        id -> Int4,
        /// Display name.
        name -> Varchar,
        /// Login email, unique via `users_uc_email`.
        email -> Varchar,
        /// bcrypt hash, always 60 characters.
        hashed_password -> Bpchar,
        /// Signup instant (UTC).
        created -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(sessions, snippets, users);
