use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Book, BookRole, Document, Member};
use crate::schema::{books, documents, members, relationships};

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and catalog lookups.
///
/// Cloning is cheap: clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) a database file and run migrations.
    ///
    /// Accepts a plain path or a `sqlite:`/`sqlite://` URL; `:memory:` opens a
    /// private in-memory database.
    pub fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);

        if path == ":memory:" {
            return Self::in_memory();
        }

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
        let pool = Pool::builder().max_size(max_connections).build(manager)?;

        let db = Self { pool };
        db.migrate()?;
        info!(path, "Database ready");
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests and `:memory:`.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool };
        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    pub fn migrate(&self) -> Result<()> {
        let conn = self.get_connection()?;
        Self::run_migrations(&conn)
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        // In-memory databases answer "memory" and keep their journal mode
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!(mode, "Journal mode set");
        conn.execute_batch(include_str!(
            "../migrations/2026-10-01-000000_create_aigc_tables/up.sql"
        ))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    // ── Catalog lookups ──

    pub fn find_document(&self, document_id: i64) -> Result<Option<Document>> {
        let conn = self.get_connection()?;
        let document = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    documents::TABLE,
                    documents::DOCUMENT_ID
                ),
                params![document_id],
                map_document,
            )
            .optional()?;
        Ok(document)
    }

    pub fn find_book(&self, book_id: i64) -> Result<Option<Book>> {
        let conn = self.get_connection()?;
        let book = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", books::TABLE, books::BOOK_ID),
                params![book_id],
                map_book,
            )
            .optional()?;
        Ok(book)
    }

    pub fn find_member(&self, member_id: i64) -> Result<Option<Member>> {
        let conn = self.get_connection()?;
        let member = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    members::TABLE,
                    members::MEMBER_ID
                ),
                params![member_id],
                map_member,
            )
            .optional()?;
        Ok(member)
    }

    /// Role of a member in a book, `None` when they have no relationship
    pub fn find_role(&self, book_id: i64, member_id: i64) -> Result<Option<BookRole>> {
        let conn = self.get_connection()?;
        let role = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ? AND {} = ?",
                    relationships::ROLE_ID,
                    relationships::TABLE,
                    relationships::BOOK_ID,
                    relationships::MEMBER_ID
                ),
                params![book_id, member_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(role)
    }

    /// Like [`Database::find_role`], but a failed lookup counts as no role
    pub fn resolve_role(&self, book_id: i64, member_id: i64) -> Option<BookRole> {
        match self.find_role(book_id, member_id) {
            Ok(role) => role,
            Err(e) => {
                warn!(book_id, member_id, error = %e, "Role lookup failed; treating as no role");
                None
            }
        }
    }

    // ── Catalog maintenance ──
    //
    // The host wiki owns these tables; these writers exist for provisioning
    // a standalone database.

    pub fn upsert_book(&self, book: &Book) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                books::TABLE,
                books::BOOK_ID,
                books::BOOK_NAME,
                books::COMMENT_STATUS
            ),
            params![book.book_id, book.book_name, book.comment_status],
        )?;
        Ok(())
    }

    pub fn upsert_document(&self, document: &Document) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
                documents::TABLE,
                documents::DOCUMENT_ID,
                documents::BOOK_ID,
                documents::DOCUMENT_NAME,
                documents::MARKDOWN
            ),
            params![
                document.document_id,
                document.book_id,
                document.document_name,
                document.markdown
            ],
        )?;
        Ok(())
    }

    pub fn delete_document(&self, document_id: i64) -> Result<bool> {
        let conn = self.get_connection()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?",
                documents::TABLE,
                documents::DOCUMENT_ID
            ),
            params![document_id],
        )?;
        Ok(removed > 0)
    }

    pub fn upsert_member(&self, member: &Member) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
                members::TABLE,
                members::MEMBER_ID,
                members::ACCOUNT,
                members::REAL_NAME,
                members::STATUS
            ),
            params![member.member_id, member.account, member.real_name, member.status],
        )?;
        Ok(())
    }

    pub fn set_role(&self, book_id: i64, member_id: i64, role: BookRole) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                relationships::TABLE,
                relationships::BOOK_ID,
                relationships::MEMBER_ID,
                relationships::ROLE_ID
            ),
            params![book_id, member_id, role],
        )?;
        Ok(())
    }
}

fn map_document(row: &Row) -> rusqlite::Result<Document> {
    Ok(Document {
        document_id: row.get(documents::DOCUMENT_ID)?,
        book_id: row.get(documents::BOOK_ID)?,
        document_name: row.get(documents::DOCUMENT_NAME)?,
        markdown: row.get(documents::MARKDOWN)?,
    })
}

fn map_book(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        book_id: row.get(books::BOOK_ID)?,
        book_name: row.get(books::BOOK_NAME)?,
        comment_status: row.get(books::COMMENT_STATUS)?,
    })
}

fn map_member(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        member_id: row.get(members::MEMBER_ID)?,
        account: row.get(members::ACCOUNT)?,
        real_name: row.get(members::REAL_NAME)?,
        status: row.get(members::STATUS)?,
    })
}
