use std::fs::File;
use std::io::Read;

use json_comments::StripComments;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dict::hash::set_hash_function_seed;
use crate::dict::lib::{
    DICT_FORCE_RESIZE_RATIO, DICT_REHASH_BATCH, DICT_REHASH_EMPTY_VISITS, GETFAIR_NUM_ENTRIES,
    HASHTABLE_MIN_FILL,
};

pub const DICT_CONFIG_JSON: &str = "./dict_config.json";
pub const DICT_CONFIG_TOML: &str = "./dict_config.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("[Config] read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("[Config] invalid toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("[Config] invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tuning knobs of a dict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictConfig {
    /// Growth is forced once `used / size > force_resize_ratio`, even while
    /// resizing is disabled.
    pub force_resize_ratio: usize,
    /// Empty buckets a single rehash step may skip, per requested step.
    pub empty_visits_per_step: usize,
    /// Buckets migrated per batch by `rehash_milliseconds`.
    pub rehash_batch: usize,
    pub fair_sample_size: usize,
    /// `needs_resize` reports true below this fill percentage.
    pub min_fill_percent: usize,
    pub resize_enabled: bool,
    pub hash_seed: Option<u64>,
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            force_resize_ratio: DICT_FORCE_RESIZE_RATIO,
            empty_visits_per_step: DICT_REHASH_EMPTY_VISITS,
            rehash_batch: DICT_REHASH_BATCH,
            fair_sample_size: GETFAIR_NUM_ENTRIES,
            min_fill_percent: HASHTABLE_MIN_FILL,
            resize_enabled: true,
            hash_seed: None,
        }
    }
}

impl DictConfig {
    /// Loads the config from `path`, or from the default json/toml locations.
    /// Any failure falls back to the defaults.
    pub fn new(path: Option<&str>) -> Self {
        let config_path_show;
        let mut file = if let Some(path) = path {
            config_path_show = path;
            if let Ok(file) = File::open(path) {
                file
            } else {
                warn!("Config File: {} Read Fail, Use Default Config.", config_path_show);
                return DictConfig::default();
            }
        } else if let Ok(file) = File::open(DICT_CONFIG_JSON) {
            config_path_show = DICT_CONFIG_JSON;
            file
        } else if let Ok(file) = File::open(DICT_CONFIG_TOML) {
            config_path_show = DICT_CONFIG_TOML;
            file
        } else {
            info!("No config file found, Use Default Config.");
            return DictConfig::default();
        };
        let mut config_string = String::new();
        if let Err(e) = file.read_to_string(&mut config_string) {
            warn!("Config File: {} Read Fail {e}, Use Default Config.", config_path_show);
            return DictConfig::default();
        }
        info!("Config File: {}", config_path_show);
        match Self::parse(&config_string) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config File: {} Parse Fail {e}, Use Default Config.", config_path_show);
                DictConfig::default()
            }
        }
    }

    /// Parses TOML, falling back to JSON with comments.
    pub fn parse(config_string: &str) -> Result<Self, ConfigError> {
        if let Ok(config) = toml::from_str(config_string) {
            return Ok(config);
        }
        let stripped = StripComments::new(config_string.as_bytes());
        Ok(serde_json::from_reader(stripped)?)
    }

    /// Installs `hash_seed` as the process hash seed. Must run before any
    /// dict is populated.
    pub fn apply_hash_seed(&self) {
        if let Some(seed) = self.hash_seed {
            set_hash_function_seed(seed);
        }
    }
}
