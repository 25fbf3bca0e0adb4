//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist tree entries, including their advisory sort order, and project
//!   metadata.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - `load_entries` returns rows in the order they were saved (`row_seq`).
//! - Stored `sort_order` values are returned verbatim, however stale.
//! - Rows with malformed handles or tags are rejected, never masked.
//! - `save_entries` replaces the whole entry table atomically.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::entry::StoredEntry;
use crate::model::handle::Handle;
use crate::model::item::{CompileFlag, ItemClass, ItemLevel, ItemSubType, ItemType, TreeItem};
use crate::model::project::ProjectMeta;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    handle,
    parent_handle,
    sort_order,
    item_class,
    item_level,
    item_type,
    sub_type,
    name,
    number,
    compile,
    comment
FROM tree_entries
ORDER BY row_seq ASC, handle ASC;";

const ENTRY_COLUMNS: [&str; 12] = [
    "handle",
    "parent_handle",
    "sort_order",
    "item_class",
    "item_level",
    "item_type",
    "sub_type",
    "name",
    "number",
    "compile",
    "comment",
    "row_seq",
];

const META_PROJECT_ID: &str = "project_id";
const META_TITLE: &str = "title";
const META_AUTHOR: &str = "author";
const META_DRAFT: &str = "draft";

/// Result type used by project repository operations.
pub type ProjectRepoResult<T> = Result<T, ProjectRepoError>;

/// Errors from project repository operations.
#[derive(Debug)]
pub enum ProjectRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for ProjectRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "project repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "project repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "project repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid project data: {message}"),
        }
    }
}

impl Error for ProjectRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ProjectRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProjectRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for project persistence.
pub trait ProjectRepository {
    /// Loads every stored entry in saved order.
    fn load_entries(&self) -> ProjectRepoResult<Vec<StoredEntry>>;
    /// Replaces all stored entries with `entries`, keeping their order.
    fn save_entries(&self, entries: &[StoredEntry]) -> ProjectRepoResult<()>;
    /// Loads project metadata, if the project has been saved before.
    fn load_meta(&self) -> ProjectRepoResult<Option<ProjectMeta>>;
    /// Stores project metadata.
    fn save_meta(&self, meta: &ProjectMeta) -> ProjectRepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ProjectRepoResult<Self> {
        ensure_project_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn load_entries(&self) -> ProjectRepoResult<Vec<StoredEntry>> {
        let mut stmt = self.conn.prepare(ENTRY_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn save_entries(&self, entries: &[StoredEntry]) -> ProjectRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM tree_entries;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO tree_entries (
                    handle,
                    parent_handle,
                    sort_order,
                    item_class,
                    item_level,
                    item_type,
                    sub_type,
                    name,
                    number,
                    compile,
                    comment,
                    row_seq
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            )?;
            for (row_seq, entry) in entries.iter().enumerate() {
                let item = &entry.item;
                insert.execute(params![
                    entry.handle.as_str(),
                    entry.parent.as_ref().map(Handle::as_str),
                    entry.order,
                    item.class.as_str(),
                    item.level.as_str(),
                    item.kind.as_str(),
                    item.subtype.map(ItemSubType::as_str),
                    item.name,
                    item.number,
                    item.compile.as_str(),
                    item.comment,
                    row_seq as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_meta(&self) -> ProjectRepoResult<Option<ProjectMeta>> {
        let Some(project_id) = read_meta_value(self.conn, META_PROJECT_ID)? else {
            return Ok(None);
        };
        let project_id = Uuid::parse_str(&project_id).map_err(|_| {
            ProjectRepoError::InvalidData(format!(
                "invalid uuid `{project_id}` in project_meta.{META_PROJECT_ID}"
            ))
        })?;

        let draft = match read_meta_value(self.conn, META_DRAFT)? {
            None => 1,
            Some(value) => value.parse::<u32>().map_err(|_| {
                ProjectRepoError::InvalidData(format!(
                    "invalid draft `{value}` in project_meta.{META_DRAFT}"
                ))
            })?,
        };

        let meta = ProjectMeta {
            project_id,
            title: read_meta_value(self.conn, META_TITLE)?.unwrap_or_default(),
            author: read_meta_value(self.conn, META_AUTHOR)?.unwrap_or_default(),
            draft,
        };
        meta.validate()
            .map_err(|err| ProjectRepoError::InvalidData(err.to_string()))?;
        Ok(Some(meta))
    }

    fn save_meta(&self, meta: &ProjectMeta) -> ProjectRepoResult<()> {
        meta.validate()
            .map_err(|err| ProjectRepoError::InvalidData(err.to_string()))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (key, value) in [
            (META_PROJECT_ID, meta.project_id.to_string()),
            (META_TITLE, meta.title.clone()),
            (META_AUTHOR, meta.author.clone()),
            (META_DRAFT, meta.draft.to_string()),
        ] {
            tx.execute(
                "INSERT INTO project_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn read_meta_value(conn: &Connection, key: &str) -> ProjectRepoResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM project_meta WHERE key = ?1;",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn parse_entry_row(row: &Row<'_>) -> ProjectRepoResult<StoredEntry> {
    let handle = parse_handle(&row.get::<_, String>("handle")?, "tree_entries.handle")?;
    let parent = row
        .get::<_, Option<String>>("parent_handle")?
        .map(|value| parse_handle(&value, "tree_entries.parent_handle"))
        .transpose()?;

    let class = parse_tag(row, "item_class", ItemClass::parse)?;
    let level = parse_tag(row, "item_level", ItemLevel::parse)?;
    let kind = parse_tag(row, "item_type", ItemType::parse)?;
    let compile = parse_tag(row, "compile", CompileFlag::parse)?;
    let subtype = match row.get::<_, Option<String>>("sub_type")? {
        None => None,
        Some(value) => Some(ItemSubType::parse(&value).ok_or_else(|| {
            ProjectRepoError::InvalidData(format!("invalid tag `{value}` in tree_entries.sub_type"))
        })?),
    };

    let number = match row.get::<_, Option<i64>>("number")? {
        None => None,
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            ProjectRepoError::InvalidData(format!("invalid number `{value}` in tree_entries.number"))
        })?),
    };

    Ok(StoredEntry {
        handle,
        parent,
        order: row.get("sort_order")?,
        item: TreeItem {
            class,
            level,
            kind,
            subtype,
            name: row.get("name")?,
            number,
            compile,
            comment: row.get("comment")?,
        },
    })
}

fn parse_tag<T>(
    row: &Row<'_>,
    column: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> ProjectRepoResult<T> {
    let value: String = row.get(column)?;
    parse(&value).ok_or_else(|| {
        ProjectRepoError::InvalidData(format!("invalid tag `{value}` in tree_entries.{column}"))
    })
}

fn parse_handle(value: &str, column: &'static str) -> ProjectRepoResult<Handle> {
    Handle::parse(value)
        .map_err(|_| ProjectRepoError::InvalidData(format!("invalid handle `{value}` in {column}")))
}

fn ensure_project_connection_ready(conn: &Connection) -> ProjectRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ProjectRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "project_meta")? {
        return Err(ProjectRepoError::MissingRequiredTable("project_meta"));
    }
    if !table_exists(conn, "tree_entries")? {
        return Err(ProjectRepoError::MissingRequiredTable("tree_entries"));
    }

    for column in ENTRY_COLUMNS {
        if !table_has_column(conn, "tree_entries", column)? {
            return Err(ProjectRepoError::MissingRequiredColumn {
                table: "tree_entries",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> ProjectRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> ProjectRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
