//! SQLite-backed session store.

use chrono::Utc;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{NewSessionRow, SessionRow, StoreError, schema};
use crate::{Session, SessionKey, SessionStore};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Session store backed by a SQLite file.
///
/// A connection is opened per call, so the store is cheap to clone and safe
/// to share between threads.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
}

impl SqliteStore {
    /// Opens the database at `db_path` and applies pending migrations.
    ///
    /// Use `":memory:"` only for throwaway checks: every call gets a fresh
    /// connection and therefore a fresh, empty database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    #[instrument(skip_all)]
    pub fn open(db_path: impl Into<String>) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.into(),
        };
        let mut conn = store.connection().map_err(|e| e.during("open"))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migrations failed: {}", e)).during("open"))?;
        info!(path = %store.db_path, migrations = applied.len(), "Session store ready");
        Ok(store)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| StoreError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        diesel::sql_query("PRAGMA busy_timeout = 5000").execute(&mut conn)?;
        Ok(conn)
    }
}

impl SessionStore for SqliteStore {
    #[instrument(skip(self), fields(key = %key))]
    fn get(&self, key: &SessionKey) -> Result<Option<Session>, StoreError> {
        let lookup = || -> Result<Option<Session>, StoreError> {
            let mut conn = self.connection()?;
            let row = schema::sessions::table
                .find(key.storage_key())
                .select(SessionRow::as_select())
                .first(&mut conn)
                .optional()?;
            debug!(found = row.is_some(), "Session looked up");
            row.map(SessionRow::into_session).transpose()
        };
        lookup().map_err(|e| e.during("get").for_session(key))
    }

    #[instrument(skip(self, session), fields(key = %session.key(), running = session.is_running()))]
    fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        let write = || -> Result<(), StoreError> {
            let mut conn = self.connection()?;
            let row = NewSessionRow::from_session(session, Utc::now().naive_utc());
            diesel::replace_into(schema::sessions::table)
                .values(&row)
                .execute(&mut conn)?;
            Ok(())
        };
        write().map_err(|e| e.during("upsert").for_session(session.key()))?;
        debug!("Session written");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    fn delete(&self, key: &SessionKey) -> Result<bool, StoreError> {
        let remove = || -> Result<usize, StoreError> {
            let mut conn = self.connection()?;
            Ok(diesel::delete(schema::sessions::table.find(key.storage_key())).execute(&mut conn)?)
        };
        let removed = remove().map_err(|e| e.during("delete").for_session(key))?;
        info!(removed, "Session deleted");
        Ok(removed > 0)
    }

    #[instrument(skip(self))]
    fn find_by_group(&self, group_ref: &str) -> Result<Option<Session>, StoreError> {
        let mut conn = self.connection().map_err(|e| e.during("find_by_group"))?;
        let mut rows = schema::sessions::table
            .filter(schema::sessions::group_ref.eq(group_ref))
            .select(SessionRow::as_select())
            .load(&mut conn)
            .map_err(|e| StoreError::from(e).during("find_by_group"))?;
        if rows.len() > 1 {
            warn!(count = rows.len(), "Several sessions share one group, using the newest");
            rows.sort_by_key(|row| std::cmp::Reverse(*row.updated_at()));
        }
        rows.into_iter().next().map(SessionRow::into_session).transpose()
    }

    #[instrument(skip(self))]
    fn list(&self) -> Result<Vec<Session>, StoreError> {
        let mut conn = self.connection().map_err(|e| e.during("list"))?;
        let rows = schema::sessions::table
            .order(schema::sessions::updated_at.desc())
            .select(SessionRow::as_select())
            .load(&mut conn)
            .map_err(|e| StoreError::from(e).during("list"))?;
        info!(count = rows.len(), "Sessions loaded");
        rows.into_iter().map(SessionRow::into_session).collect()
    }
}
