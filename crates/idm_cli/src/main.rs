//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve config from an optional file plus the process environment.
//! - Connect (fatal on failure) and report live row counts per collection.

use idm_core::{
    must_connect_db_with_config, Config, EntityRepository, RepoResult, Repositories,
};
use log::info;
use std::path::PathBuf;

fn main() {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::from_process_env(config_path.as_deref());

    if let Some(dir) = std::env::var_os("IDM_LOG_DIR") {
        let dir = dir.to_string_lossy();
        if let Err(err) = idm_core::init_logging(idm_core::default_log_level(), &dir) {
            eprintln!("idm: logging disabled: {err}");
        }
    }

    let pool = must_connect_db_with_config(&config);
    let repos = Repositories::new(&pool);
    info!("event=cli_status module=cli status=start");

    println!("idm_core version={}", idm_core::core_version());
    match live_count(repos.employees.find_all()) {
        Ok(count) => println!("employees live={count}"),
        Err(err) => eprintln!("employees error={err}"),
    }
    match live_count(repos.roles.find_all()) {
        Ok(count) => println!("roles live={count}"),
        Err(err) => eprintln!("roles error={err}"),
    }
}

fn live_count<E>(result: RepoResult<Vec<E>>) -> RepoResult<usize> {
    match result {
        Ok(rows) => Ok(rows.len()),
        Err(err) if err.is_not_found() => Ok(0),
        Err(err) => Err(err),
    }
}
