// Database module (local backend)

pub mod migrations;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use anyhow::Result;

use crate::constants::{APP_DIR, DB_FILENAME, OBJECTS_FOLDER};

/// Open or create a database at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// In-memory database with migrations applied (tests and throwaway sessions)
pub fn open_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Get the database path for a library root
pub fn get_db_path(library_root: &Path) -> PathBuf {
    library_root.join(APP_DIR).join(DB_FILENAME)
}

/// Get the blob folder for a library root
pub fn get_objects_path(library_root: &Path) -> PathBuf {
    library_root.join(OBJECTS_FOLDER)
}

/// Initialize library folder structure
pub fn init_library_folders(library_root: &Path) -> Result<()> {
    std::fs::create_dir_all(library_root.join(APP_DIR))?;
    std::fs::create_dir_all(get_objects_path(library_root))?;
    Ok(())
}
