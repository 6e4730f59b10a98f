use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Runtime settings: defaults, overridden by an optional `staylens` config
/// file, overridden by `STAYLENS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path to the SQLite database holding the listing and host_info tables.
    pub database: String,
    /// Address the HTTP surface binds to.
    pub listen: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("database", "staylens.db")?
            .set_default("listen", "127.0.0.1:8080")?
            .add_source(File::with_name("staylens").required(false))
            .add_source(Environment::with_prefix("STAYLENS"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
