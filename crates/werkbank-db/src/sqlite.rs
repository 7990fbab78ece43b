use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};

use werkbank_core::{SettingsError, SettingsProvider, WerkbankSettings};

/// SQLite-backed settings store.
///
/// Holds exactly one row; the fixed id keeps INSERTs from ever producing a
/// second one. The connection sits behind a mutex because rusqlite
/// connections are not `Sync` and the host reads settings from every worker.
pub struct SqliteSettings {
    conn: Mutex<Connection>,
}

impl SqliteSettings {
    pub fn open(path: &str) -> SqlResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> SqlResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS werkbank_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                auth_enabled INTEGER NOT NULL,
                base_url TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Writes the settings row once; first-run setup only.
    pub fn complete_setup(&self, settings: &WerkbankSettings) -> Result<(), SettingsError> {
        let conn = self.conn.lock().expect("settings connection poisoned");
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO werkbank_settings (id, auth_enabled, base_url) VALUES (1, ?1, ?2)",
                params![settings.auth_enabled, settings.base_url],
            )
            .map_err(store_error)?;
        if inserted == 0 {
            return Err(SettingsError::AlreadyCompleted);
        }
        Ok(())
    }

    pub fn set_auth_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        let conn = self.conn.lock().expect("settings connection poisoned");
        let updated = conn
            .execute(
                "UPDATE werkbank_settings SET auth_enabled = ?1 WHERE id = 1",
                params![enabled],
            )
            .map_err(store_error)?;
        if updated == 0 {
            return Err(SettingsError::Store("settings row not created yet".to_string()));
        }
        Ok(())
    }
}

impl SettingsProvider for SqliteSettings {
    fn load(&self) -> Result<Option<WerkbankSettings>, SettingsError> {
        let conn = self.conn.lock().expect("settings connection poisoned");
        conn.query_row(
            "SELECT auth_enabled, base_url FROM werkbank_settings WHERE id = 1",
            [],
            |row| {
                Ok(WerkbankSettings {
                    auth_enabled: row.get(0)?,
                    base_url: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(store_error)
    }
}

fn store_error(err: rusqlite::Error) -> SettingsError {
    SettingsError::Store(err.to_string())
}
