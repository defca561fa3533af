//! Optional YAML configuration for the command-line importer.
//!
//! ```yaml
//! database: /var/lib/limesurvey/responses.db
//! salt: 1234            # fixed batch salt, random per import when omitted
//! input_encoding: utf-8 # for csv/tsv response files
//! ```
//!
//! Command-line flags always win over values loaded here.

use std::{
    env,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "SURVEY_IMPORT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub salt: Option<u16>,
    #[serde(default)]
    pub input_encoding: Option<String>,
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)
            .with_context(|| format!("Reading config file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Loads the explicit path if given, else the path named by
    /// `SURVEY_IMPORT_CONFIG`, else an empty configuration.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => {
                debug!("Using config from ${CONFIG_ENV}: {path:?}");
                Self::load(Path::new(&path))
            }
            _ => Ok(Self::default()),
        }
    }
}
