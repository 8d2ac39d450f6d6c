use anyhow::{Context, Result};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// A stored product illustration.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub key: String,
    pub file_id: String,
    pub created_at: String,
}

/// Initialize the database schema
pub fn init_database_schema(conn: &Connection) -> Result<()> {
    info!("Initializing database schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos (
            key TEXT PRIMARY KEY,
            file_id TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create photos table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Store a Telegram file id under a product key, replacing any previous one.
pub fn upsert_photo(conn: &Connection, key: &str, file_id: &str) -> Result<()> {
    info!("Storing photo for key: {}", key);

    conn.execute(
        "INSERT INTO photos (key, file_id) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET file_id = excluded.file_id,
                                        created_at = CURRENT_TIMESTAMP",
        params![key, file_id],
    )
    .context("Failed to store photo")?;

    Ok(())
}

/// Look up the Telegram file id for a product key.
pub fn get_photo(conn: &Connection, key: &str) -> Result<Option<String>> {
    let file_id = conn
        .query_row(
            "SELECT file_id FROM photos WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read photo")?;

    Ok(file_id)
}

/// List every stored photo, newest first.
pub fn list_photos(conn: &Connection) -> Result<Vec<Photo>> {
    let mut stmt = conn
        .prepare("SELECT key, file_id, created_at FROM photos ORDER BY created_at DESC, key")
        .context("Failed to prepare list statement")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Photo {
                key: row.get(0)?,
                file_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .context("Failed to list photos")?;

    let mut photos = Vec::new();
    for row in rows {
        photos.push(row.context("Failed to read photo row")?);
    }

    Ok(photos)
}

/// Delete a photo by key. Returns whether a row was removed.
pub fn delete_photo(conn: &Connection, key: &str) -> Result<bool> {
    info!("Deleting photo for key: {}", key);

    let rows_affected = conn
        .execute("DELETE FROM photos WHERE key = ?1", params![key])
        .context("Failed to delete photo")?;

    Ok(rows_affected > 0)
}
