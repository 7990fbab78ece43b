pub mod sqlite;

pub use sqlite::SqliteSettings;
