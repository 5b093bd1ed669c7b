//! Database schema definitions
//!
//! Table and column names are part of the external contract: downstream
//! search tooling reads the store directly.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per unique canonical URL, written once on first visit
CREATE TABLE IF NOT EXISTS Page (
    page_id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    raw_html TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    size INTEGER NOT NULL,
    parent_page_id INTEGER REFERENCES Page(page_id),
    hash TEXT NOT NULL
);

-- Every page that discovered another page
CREATE TABLE IF NOT EXISTS ParentLink (
    link_id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    parent_page_id INTEGER NOT NULL REFERENCES Page(page_id),
    UNIQUE(page_id, parent_page_id) ON CONFLICT IGNORE
);

CREATE INDEX IF NOT EXISTS idx_parentlink_parent ON ParentLink(parent_page_id);

-- Outbound links, resolved to a page once the child is visited
CREATE TABLE IF NOT EXISTS ChildLink (
    link_id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    child_page_id INTEGER REFERENCES Page(page_id),
    child_url TEXT NOT NULL,
    UNIQUE(page_id, child_url) ON CONFLICT IGNORE
);

CREATE INDEX IF NOT EXISTS idx_childlink_url ON ChildLink(child_url);

-- Term dictionary shared by every page
CREATE TABLE IF NOT EXISTS Term (
    term_id INTEGER PRIMARY KEY AUTOINCREMENT,
    term TEXT NOT NULL UNIQUE
);

-- Body occurrence counts
CREATE TABLE IF NOT EXISTS TermFrequency (
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    term_id INTEGER NOT NULL REFERENCES Term(term_id),
    frequency INTEGER NOT NULL,
    PRIMARY KEY (page_id, term_id)
);

-- Comma-separated token offsets
CREATE TABLE IF NOT EXISTS TitleTermPosition (
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    term_id INTEGER NOT NULL REFERENCES Term(term_id),
    position_list TEXT NOT NULL,
    PRIMARY KEY (page_id, term_id)
);

CREATE TABLE IF NOT EXISTS ContentTermPosition (
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    term_id INTEGER NOT NULL REFERENCES Term(term_id),
    position_list TEXT NOT NULL,
    PRIMARY KEY (page_id, term_id)
);

-- Postings: which pages contain a term
CREATE TABLE IF NOT EXISTS TitleIndex (
    term_id INTEGER NOT NULL REFERENCES Term(term_id),
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    PRIMARY KEY (term_id, page_id)
);

CREATE TABLE IF NOT EXISTS ContentIndex (
    term_id INTEGER NOT NULL REFERENCES Term(term_id),
    page_id INTEGER NOT NULL REFERENCES Page(page_id),
    PRIMARY KEY (term_id, page_id)
);

CREATE INDEX IF NOT EXISTS idx_titleindex_page ON TitleIndex(page_id);
CREATE INDEX IF NOT EXISTS idx_contentindex_page ON ContentIndex(page_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
