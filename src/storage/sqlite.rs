//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::index::{format_positions, parse_positions, TermPositions};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ChildLinkRecord, PageRecord, PageVisit, TermCount, TermPostings};
use crate::SpideyError;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::{Path, PathBuf};

const PAGE_COLUMNS: &str = "page_id, url, title, content, raw_html, last_modified, size, \
                            parent_page_id, hash";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) a SqliteStorage at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SpideyError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SpideyError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Discards any existing store at `path` and creates an empty one
    ///
    /// The WAL and shared-memory side files are removed as well, so no rows
    /// from a previous run survive.
    pub fn create_fresh(path: &Path) -> Result<Self, SpideyError> {
        for stale in store_files(path) {
            match std::fs::remove_file(&stale) {
                Ok(()) => tracing::debug!("Removed previous store file {}", stale.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Self::new(path)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SpideyError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn positions(
        &self,
        table: &str,
        page_id: i64,
        term_id: i64,
    ) -> StorageResult<Option<Vec<u32>>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT position_list FROM {} WHERE page_id = ?1 AND term_id = ?2",
                    table
                ),
                params![page_id, term_id],
                |row| row.get(0),
            )
            .optional()?;

        stored
            .map(|s| {
                parse_positions(&s).map_err(|e| {
                    StorageError::Database(format!("Invalid position list '{}': {}", s, e))
                })
            })
            .transpose()
    }

    fn postings(&self, table: &str, term_id: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT page_id FROM {} WHERE term_id = ?1 ORDER BY page_id",
            table
        ))?;

        let pages = stmt
            .query_map(params![term_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }
}

fn store_files(path: &Path) -> [PathBuf; 3] {
    let with_suffix = |suffix: &str| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    [path.to_path_buf(), with_suffix("-wal"), with_suffix("-shm")]
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        page_id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        raw_html: row.get(4)?,
        last_modified: row.get(5)?,
        size: row.get(6)?,
        parent_page_id: row.get(7)?,
        hash: row.get(8)?,
    })
}

/// Inserts a stem into the dictionary if absent and returns its ID
fn term_id(tx: &Transaction<'_>, term: &str) -> StorageResult<i64> {
    tx.prepare_cached("INSERT OR IGNORE INTO Term (term) VALUES (?1)")?
        .execute(params![term])?;
    let id = tx
        .prepare_cached("SELECT term_id FROM Term WHERE term = ?1")?
        .query_row(params![term], |row| row.get(0))?;
    Ok(id)
}

fn write_title_terms(
    tx: &Transaction<'_>,
    page_id: i64,
    terms: &[TermPositions],
) -> StorageResult<()> {
    for entry in terms {
        let term_id = term_id(tx, &entry.term)?;
        tx.prepare_cached(
            "INSERT INTO TitleTermPosition (page_id, term_id, position_list) VALUES (?1, ?2, ?3)",
        )?
        .execute(params![page_id, term_id, format_positions(&entry.positions)])?;
        tx.prepare_cached("INSERT INTO TitleIndex (term_id, page_id) VALUES (?1, ?2)")?
            .execute(params![term_id, page_id])?;
    }
    Ok(())
}

fn write_body_terms(
    tx: &Transaction<'_>,
    page_id: i64,
    terms: &[TermPositions],
) -> StorageResult<()> {
    for entry in terms {
        let term_id = term_id(tx, &entry.term)?;
        tx.prepare_cached(
            "INSERT INTO TermFrequency (page_id, term_id, frequency) VALUES (?1, ?2, ?3)",
        )?
        .execute(params![page_id, term_id, entry.frequency() as i64])?;
        tx.prepare_cached(
            "INSERT INTO ContentTermPosition (page_id, term_id, position_list) VALUES (?1, ?2, ?3)",
        )?
        .execute(params![page_id, term_id, format_positions(&entry.positions)])?;
        tx.prepare_cached("INSERT INTO ContentIndex (term_id, page_id) VALUES (?1, ?2)")?
            .execute(params![term_id, page_id])?;
    }
    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Page Writes =====

    fn record_page(&mut self, visit: &PageVisit) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;
        let page = &visit.page;

        tx.execute(
            "INSERT INTO Page (url, title, content, raw_html, last_modified, size, parent_page_id, hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                page.url,
                page.title,
                page.content,
                page.raw_html,
                page.last_modified,
                page.size as i64,
                visit.parents.first(),
                page.hash
            ],
        )?;
        let page_id = tx.last_insert_rowid();

        for parent in &visit.parents {
            tx.prepare_cached("INSERT INTO ParentLink (page_id, parent_page_id) VALUES (?1, ?2)")?
                .execute(params![page_id, parent])?;
        }

        for child in &visit.children {
            tx.prepare_cached(
                "INSERT INTO ChildLink (page_id, child_page_id, child_url) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![page_id, child.page_id, child.url])?;

            // A link to an already-visited page makes this page one of its parents
            if let Some(child_id) = child.page_id {
                if child_id != page_id {
                    tx.prepare_cached(
                        "INSERT INTO ParentLink (page_id, parent_page_id) VALUES (?1, ?2)",
                    )?
                    .execute(params![child_id, page_id])?;
                }
            }
        }

        let resolved = tx.execute(
            "UPDATE ChildLink SET child_page_id = ?1 WHERE child_url = ?2 AND child_page_id IS NULL",
            params![page_id, page.url],
        )?;

        write_title_terms(&tx, page_id, &visit.index.title)?;
        write_body_terms(&tx, page_id, &visit.index.body)?;

        tx.commit()?;

        tracing::trace!(
            "Stored page {} ({}): {} parents, {} child links, {} links resolved",
            page_id,
            page.url,
            visit.parents.len(),
            visit.children.len(),
            resolved
        );

        Ok(page_id)
    }

    // ===== Page Reads =====

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM Page WHERE page_id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM Page WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn get_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM Page ORDER BY page_id", PAGE_COLUMNS))?;

        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    // ===== Link Graph =====

    fn get_parents(&self, page_id: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT parent_page_id FROM ParentLink WHERE page_id = ?1 ORDER BY link_id",
        )?;

        let parents = stmt
            .query_map(params![page_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(parents)
    }

    fn get_child_links(&self, page_id: i64) -> StorageResult<Vec<ChildLinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_id, child_url, child_page_id FROM ChildLink WHERE page_id = ?1
             ORDER BY link_id",
        )?;

        let links = stmt
            .query_map(params![page_id], |row| {
                Ok(ChildLinkRecord {
                    page_id: row.get(0)?,
                    child_url: row.get(1)?,
                    child_page_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    // ===== Terms and Postings =====

    fn get_term_id(&self, term: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT term_id FROM Term WHERE term = ?1",
                params![term],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_term_frequency(&self, page_id: i64, term_id: i64) -> StorageResult<Option<u32>> {
        let frequency = self
            .conn
            .query_row(
                "SELECT frequency FROM TermFrequency WHERE page_id = ?1 AND term_id = ?2",
                params![page_id, term_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(frequency)
    }

    fn get_title_positions(
        &self,
        page_id: i64,
        term_id: i64,
    ) -> StorageResult<Option<Vec<u32>>> {
        self.positions("TitleTermPosition", page_id, term_id)
    }

    fn get_content_positions(
        &self,
        page_id: i64,
        term_id: i64,
    ) -> StorageResult<Option<Vec<u32>>> {
        self.positions("ContentTermPosition", page_id, term_id)
    }

    fn find_postings(&self, term: &str) -> StorageResult<TermPostings> {
        let term_id = self
            .get_term_id(term)?
            .ok_or_else(|| StorageError::TermNotFound(term.to_string()))?;

        Ok(TermPostings {
            term_id,
            title: self.postings("TitleIndex", term_id)?,
            content: self.postings("ContentIndex", term_id)?,
        })
    }

    fn get_top_terms(&self, page_id: i64, limit: usize) -> StorageResult<Vec<TermCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.term, f.frequency FROM TermFrequency f
             JOIN Term t ON t.term_id = f.term_id
             WHERE f.page_id = ?1
             ORDER BY f.frequency DESC, t.term_id ASC
             LIMIT ?2",
        )?;

        let terms = stmt
            .query_map(params![page_id, limit as i64], |row| {
                Ok(TermCount {
                    term: row.get(0)?,
                    frequency: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    // ===== Statistics =====

    fn count_pages(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM Page")
    }

    fn count_terms(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM Term")
    }

    fn count_parent_links(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM ParentLink")
    }

    fn count_child_links(&self) -> StorageResult<(u64, u64)> {
        Ok((
            self.count("SELECT COUNT(*) FROM ChildLink")?,
            self.count("SELECT COUNT(*) FROM ChildLink WHERE child_page_id IS NOT NULL")?,
        ))
    }

    fn count_postings(&self) -> StorageResult<(u64, u64)> {
        Ok((
            self.count("SELECT COUNT(*) FROM TitleIndex")?,
            self.count("SELECT COUNT(*) FROM ContentIndex")?,
        ))
    }
}
