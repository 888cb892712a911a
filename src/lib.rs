//! Cookie-backed persistence for experiment assignments.
//!
//! This crate bundles the workspace members: [`persistence`] holds the
//! store itself, [`configs`] loads its settings and [`common`] sets up
//! logging.

pub use common;
pub use configs;
pub use persistence::*;

use tracing::info;

/// Load `config.toml` (or `$CONFIG_PATH`), validate it, and publish the
/// cookie settings as the process default. Logging is initialized first.
pub fn init_from_env() -> anyhow::Result<std::sync::Arc<CookieStoreConfig>> {
    common::utils::logging::init_logging_default();
    let cfg = configs::AppConfig::load_and_validate()?;
    let installed = persistence::config::install(&cfg.persistence)?;
    info!(cookie_name = %installed.cookie_name, "persistence configured");
    Ok(installed)
}
