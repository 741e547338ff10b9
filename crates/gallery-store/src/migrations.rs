use gallery_hash::CredentialHasher;
use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

/// Current schema version. A bump here must come with a migration block
/// below that preserves existing records.
pub const SCHEMA_VERSION: i64 = 1;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

pub fn run(conn: &Connection, hasher: &dyn CredentialHasher) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user'
            );

            CREATE UNIQUE INDEX by_username ON users(username);

            CREATE TABLE artworks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                image_data  TEXT NOT NULL,
                upload_date TEXT NOT NULL
            );
            ",
        )?;

        // Seed the default administrator, exactly once per store lifetime.
        let admin_hash = hasher.hash(DEFAULT_ADMIN_PASSWORD)?;
        conn.execute(
            "INSERT INTO users (username, password, role) VALUES (?1, ?2, 'admin')",
            (DEFAULT_ADMIN_USERNAME, admin_hash.as_str()),
        )?;

        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    info!("Database schema at version {}", SCHEMA_VERSION);
    Ok(())
}
