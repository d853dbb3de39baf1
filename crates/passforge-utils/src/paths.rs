//! Directory helpers shared by the cache and output writers

use camino::Utf8Path;
use std::io;

/// `create_dir_all` that tolerates the directory already existing, including
/// the race where another caller creates it between check and create.
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove a directory tree if present and recreate it empty.
pub fn recreate_dir(path: &Utf8Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    ensure_dir_all(path)
}
