/// Database row types for all tables.
/// These correspond 1:1 to the SQLite schema defined in migrations.rs.
use serde::{Deserialize, Serialize};

/// User record in the users table. `password_hash` is an opaque argon2
/// string and never leaves this process.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Landing page record. `main_image`, when set, is a relative path of the
/// form `/uploads/<name>.<ext>` whose file exists in the uploads directory;
/// the handlers in pages::crud uphold that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingPage {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub main_image: Option<String>,
    pub cta_link: Option<String>,
    pub cta_text: Option<String>,
    pub content_html: Option<String>,
    pub created_at: String,
}

impl LandingPage {
    /// Column list matching `from_row` ordering. Keep the two in sync.
    pub const COLUMNS: &'static str = "id, slug, title, subtitle, description, \
         main_image, cta_link, cta_text, content_html, created_at";

    /// Map a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(LandingPage {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            subtitle: row.get(3)?,
            description: row.get(4)?,
            main_image: row.get(5)?,
            cta_link: row.get(6)?,
            cta_text: row.get(7)?,
            content_html: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
