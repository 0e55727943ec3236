//! Layered resolution of database connection settings.
//!
//! # Responsibility
//! - Merge an optional `key=value` file with an environment mapping.
//! - Map environment profiles to their config file names.
//!
//! # Invariants
//! - Each recognized key is resolved independently: env > file > empty.
//! - Resolution never fails; an absent or unreadable file counts as empty.
//! - The environment is an explicit input; only `from_process_env` and
//!   `process_env` read the real process environment.

use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DB_DRIVER_NAME_KEY: &str = "DB_DRIVER_NAME";
pub const DB_DSN_KEY: &str = "DB_DSN";

/// Connection parameters for the relational store.
///
/// Fields are empty when neither source defines them; callers validate
/// before connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub db_driver_name: String,
    pub dsn: String,
}

impl Config {
    /// Resolves config from `path` and a snapshot of the process environment.
    pub fn from_process_env(path: Option<&Path>) -> Self {
        load_config(path, &process_env())
    }
}

/// Named environments, each backed by its own config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvProfile {
    Dev,
    Test,
}

impl EnvProfile {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Dev => ".env",
            Self::Test => ".env_test",
        }
    }
}

/// Resolves `Config` from an optional file and an environment mapping.
///
/// A key present in `env` wins even when its value is empty.
pub fn load_config(path: Option<&Path>, env: &HashMap<String, String>) -> Config {
    let file_values = path.map(read_env_file).unwrap_or_default();
    let resolve = |key: &str| {
        env.get(key)
            .or_else(|| file_values.get(key))
            .cloned()
            .unwrap_or_default()
    };

    Config {
        db_driver_name: resolve(DB_DRIVER_NAME_KEY),
        dsn: resolve(DB_DSN_KEY),
    }
}

/// Resolves `Config` for `profile` using `<root>/<profile file>`.
pub fn load_profile_config(
    root: &Path,
    profile: EnvProfile,
    env: &HashMap<String, String>,
) -> Config {
    let path = root.join(profile.file_name());
    load_config(Some(path.as_path()), env)
}

/// Returns the nearest ancestor of `start` (inclusive) holding `Cargo.lock`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.lock").is_file())
        .map(Path::to_path_buf)
}

/// Snapshot of the current process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            debug!(
                "event=config_file module=config status=skipped reason=not_found path={}",
                path.display()
            );
            return values;
        }
        Err(err) => {
            warn!(
                "event=config_file module=config status=error path={} error={}",
                path.display(),
                err
            );
            return values;
        }
    };

    for item in iter {
        match item {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(err) => {
                // Keep what parsed so far; later lines are unreliable.
                warn!(
                    "event=config_file module=config status=error path={} error={}",
                    path.display(),
                    err
                );
                break;
            }
        }
    }

    debug!(
        "event=config_file module=config status=ok path={} keys={}",
        path.display(),
        values.len()
    );
    values
}
