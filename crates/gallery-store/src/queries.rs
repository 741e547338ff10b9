use chrono::{DateTime, Utc};
use gallery_types::{Artwork, ArtworkPatch, NewArtwork, Role};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::UserRow;

impl Database {
    // -- Artworks --

    /// All artworks, in insertion order. Callers must not rely on the
    /// ordering; it is only kept stable for determinism.
    pub fn list_artworks(&self) -> Result<Vec<Artwork>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, image_data, upload_date
                 FROM artworks
                 ORDER BY id",
            )?;

            let rows = stmt
                .query_map([], artwork_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_artwork(&self, id: i64) -> Result<Option<Artwork>> {
        self.with_conn(|conn| query_artwork_by_id(conn, id))
    }

    /// Stores a new artwork with a store-assigned id and upload timestamp.
    /// Returns the assigned id.
    pub fn create_artwork(&self, new: &NewArtwork) -> Result<i64> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Validation(
                "artwork title must not be empty".into(),
            ));
        }

        let upload_date = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO artworks (title, description, image_data, upload_date)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![new.title, new.description, new.image_data, upload_date],
            )?;

            let id = conn.last_insert_rowid();
            debug!("Created artwork #{id}");
            Ok(id)
        })
    }

    /// Merges a partial update onto an existing artwork. `id` and
    /// `upload_date` are immutable. Last writer wins; there is no version
    /// stamp or conflict detection.
    pub fn update_artwork(&self, id: i64, patch: &ArtworkPatch) -> Result<i64> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(StoreError::Validation(
                    "artwork title must not be empty".into(),
                ));
            }
        }

        self.with_conn(|conn| {
            let existing = query_artwork_by_id(conn, id)?.ok_or(StoreError::NotFound(id))?;

            let title = patch.title.as_deref().unwrap_or(&existing.title);
            let description = patch
                .description
                .as_deref()
                .unwrap_or(&existing.description);
            let image_data = patch.image_data.as_deref().unwrap_or(&existing.image_data);

            conn.execute(
                "UPDATE artworks SET title = ?1, description = ?2, image_data = ?3
                 WHERE id = ?4",
                rusqlite::params![title, description, image_data, id],
            )?;

            debug!("Updated artwork #{id}");
            Ok(id)
        })
    }

    /// Removes an artwork. Idempotent: deleting an absent id succeeds.
    pub fn delete_artwork(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM artworks WHERE id = ?1", [id])?;
            debug!("Deleted artwork #{id} (rows: {removed})");
            Ok(())
        })
    }

    // -- Users --

    /// Hashes the password and inserts a new account with the `user` role.
    pub fn create_user(&self, username: &str, raw_password: &str) -> Result<i64> {
        if username.is_empty() {
            return Err(StoreError::Validation("username must not be empty".into()));
        }
        if raw_password.is_empty() {
            return Err(StoreError::Validation("password must not be empty".into()));
        }

        let hash = self.hasher().hash(raw_password)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
                rusqlite::params![username, hash, Role::Member.as_str()],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::DuplicateUsername(username.to_string())
                }
                other => other.into(),
            })?;

            Ok(conn.last_insert_rowid())
        })
    }

    /// Exact-match lookup via the unique username index. Absence is a
    /// normal outcome, not an error.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, username, password, role FROM users WHERE username = ?1",
                )?
                .query_row([username], user_from_row)
                .optional()?;
            Ok(row)
        })
    }
}

fn query_artwork_by_id(conn: &Connection, id: i64) -> Result<Option<Artwork>> {
    let row = conn
        .prepare(
            "SELECT id, title, description, image_data, upload_date
             FROM artworks WHERE id = ?1",
        )?
        .query_row([id], artwork_from_row)
        .optional()?;
    Ok(row)
}

fn artwork_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Artwork> {
    Ok(Artwork {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image_data: row.get(3)?,
        upload_date: parse_timestamp(row.get(4)?, 4)?,
    })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    let role_str: String = row.get(3)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown role: {role_str}").into(),
        )
    })?;

    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role,
    })
}

fn parse_timestamp(s: String, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gallery_hash::Argon2Hasher;

    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory(Arc::new(Argon2Hasher)).unwrap()
    }

    fn sample() -> NewArtwork {
        NewArtwork {
            title: "Sunrise".into(),
            description: "Oil on canvas".into(),
            image_data: "data:image/png;base64,iVBORw0KGgo=".into(),
        }
    }

    #[test]
    fn create_then_list_yields_the_record() {
        let db = test_db();
        let before = Utc::now();

        let id = db.create_artwork(&sample()).unwrap();
        assert!(id > 0);

        let all = db.list_artworks().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].title, "Sunrise");
        assert_eq!(all[0].description, "Oil on canvas");
        assert!(all[0].upload_date >= before);
    }

    #[test]
    fn ids_are_monotonic() {
        let db = test_db();
        let a = db.create_artwork(&sample()).unwrap();
        let b = db.create_artwork(&sample()).unwrap();
        assert!(b > a);
    }

    #[test]
    fn empty_title_is_rejected() {
        let db = test_db();
        let mut new = sample();
        new.title = "   ".into();

        let err = db.create_artwork(&new).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(db.list_artworks().unwrap().is_empty());
    }

    #[test]
    fn patch_changes_only_the_given_fields() {
        let db = test_db();
        let id = db.create_artwork(&sample()).unwrap();
        let before = db.get_artwork(id).unwrap().unwrap();

        let patch = ArtworkPatch {
            title: Some("Sunset".into()),
            ..Default::default()
        };
        assert_eq!(db.update_artwork(id, &patch).unwrap(), id);

        let after = db.get_artwork(id).unwrap().unwrap();
        assert_eq!(after.title, "Sunset");
        assert_eq!(after.description, before.description);
        assert_eq!(after.image_data, before.image_data);
        assert_eq!(after.id, before.id);
        assert_eq!(after.upload_date, before.upload_date);
    }

    #[test]
    fn empty_patch_is_a_merge_noop() {
        let db = test_db();
        let id = db.create_artwork(&sample()).unwrap();

        assert_eq!(db.update_artwork(id, &ArtworkPatch::default()).unwrap(), id);

        let after = db.get_artwork(id).unwrap().unwrap();
        assert_eq!(after.title, "Sunrise");
    }

    #[test]
    fn update_of_missing_id_is_not_found() {
        let db = test_db();
        let patch = ArtworkPatch {
            title: Some("X".into()),
            ..Default::default()
        };

        let err = db.update_artwork(42, &patch).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
        assert!(db.list_artworks().unwrap().is_empty());
    }

    #[test]
    fn empty_title_patch_is_rejected() {
        let db = test_db();
        let id = db.create_artwork(&sample()).unwrap();

        let patch = ArtworkPatch {
            title: Some("".into()),
            ..Default::default()
        };
        let err = db.update_artwork(id, &patch).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(db.get_artwork(id).unwrap().unwrap().title, "Sunrise");
    }

    #[test]
    fn delete_is_idempotent() {
        let db = test_db();
        let id = db.create_artwork(&sample()).unwrap();

        db.delete_artwork(id).unwrap();
        assert!(db.get_artwork(id).unwrap().is_none());

        // Second delete of the same id must not fail.
        db.delete_artwork(id).unwrap();
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = test_db();
        db.create_user("alice", "secret1").unwrap();

        let err = db.create_user("alice", "other2").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(ref u) if u == "alice"));

        // The original record survives untouched.
        let row = db.find_user_by_username("alice").unwrap().unwrap();
        assert!(db.hasher().verify("secret1", &row.password));
        assert!(!db.hasher().verify("other2", &row.password));
    }

    #[test]
    fn absent_user_is_none_not_an_error() {
        let db = test_db();
        assert!(db.find_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn new_users_get_the_member_role() {
        let db = test_db();
        db.create_user("bob", "hunter2").unwrap();

        let row = db.find_user_by_username("bob").unwrap().unwrap();
        assert_eq!(row.role, Role::Member);
        assert_eq!(row.username, "bob");
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let db = test_db();
        assert!(matches!(
            db.create_user("", "secret1").unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            db.create_user("carol", "").unwrap_err(),
            StoreError::Validation(_)
        ));
    }
}
