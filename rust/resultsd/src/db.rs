use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "results.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    // Several connections (store, auth) may share one workspace file.
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    // One row per top-level child of the tree. Deeper paths live inside the
    // row's JSON document.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tree_nodes(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts(
            uid TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            email_norm TEXT NOT NULL UNIQUE,
            password_salt TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_sign_in_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_tokens(
            token TEXT PRIMARY KEY,
            uid TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            FOREIGN KEY(uid) REFERENCES accounts(uid)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_auth_tokens_uid ON auth_tokens(uid)",
        [],
    )?;

    ensure_tree_nodes_updated_at(conn)?;
    Ok(())
}

fn ensure_tree_nodes_updated_at(conn: &Connection) -> anyhow::Result<()> {
    // Early workspaces were created before updated_at was tracked.
    if table_has_column(conn, "tree_nodes", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE tree_nodes ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
