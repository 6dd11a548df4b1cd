//! Storage Module
//!
//! SQLite-backed persistence for the case corpus (C2) and the learning
//! subsystem (C7): one on-disk file, opened by each component through its
//! own writer/reader connection pair, tuned with the teacher's WAL/PRAGMA
//! set (`Storage::configure_connection`).

mod migrations;

pub use migrations::{apply_migrations, Migration, MIGRATIONS};

/// Apply the teacher's WAL/PRAGMA tuning to a freshly-opened connection.
pub fn configure_connection(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", -64000)?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "mmap_size", 268_435_456i64)?;
    conn.pragma_update(None, "journal_size_limit", 67_108_864i64)?;
    Ok(())
}

/// Open a writer/reader connection pair against `path`, apply PRAGMA tuning,
/// and run any pending migrations. Restricts the containing directory and
/// file to owner-only access on Unix, matching the teacher's
/// `Storage::new`.
pub fn open_pair(
    path: &std::path::Path,
) -> rusqlite::Result<(rusqlite::Connection, rusqlite::Connection)> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(dir);
            restrict_permissions(dir, 0o700);
        }
    }

    let writer = rusqlite::Connection::open(path)?;
    configure_connection(&writer)?;
    apply_migrations(&writer)?;

    let reader = rusqlite::Connection::open(path)?;
    configure_connection(&reader)?;

    restrict_permissions(path, 0o600);

    Ok((writer, reader))
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(mode);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path, _mode: u32) {}
