use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const TABLES_PATH_ENV: &str = "BUFRTREE_TABLES_PATH";
const DEFAULT_TABLES_DIR: &str = "tables";

static TABLES_BASE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Process-wide table directory. Only the first call has any effect.
pub fn set_tables_base_path<P: AsRef<Path>>(path: P) {
    let _ = TABLES_BASE_PATH.set(path.as_ref().to_path_buf());
}

pub fn get_tables_base_path() -> PathBuf {
    resolve_tables_dir(None, None)
}

/// Table directory in order of precedence: `explicit` (command line),
/// `configured` (config file), the process-wide path, `$BUFRTREE_TABLES_PATH`,
/// then `./tables`.
pub fn resolve_tables_dir(explicit: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit.or(configured) {
        return path.to_path_buf();
    }

    if let Some(path) = TABLES_BASE_PATH.get() {
        return path.clone();
    }

    if let Ok(env_path) = std::env::var(TABLES_PATH_ENV) {
        if !env_path.is_empty() {
            return PathBuf::from(env_path);
        }
    }

    PathBuf::from(DEFAULT_TABLES_DIR)
}
