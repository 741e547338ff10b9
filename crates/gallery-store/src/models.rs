/// Database row types — these map directly to SQLite rows.
/// `UserRow` carries the password hash and therefore never leaves the
/// store/auth boundary; callers above it get `gallery_types::SessionUser`.
use gallery_types::Role;

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: Role,
}
