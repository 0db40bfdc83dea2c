use crate::error::{AttrError, Result};
use crate::ingest::LoadOptions;
use crate::resolve::DEFAULT_PAGE_SIZE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_DUMP_MAX_LINES: usize = 100;

/// Configuration for attrfilters, stored as config.json in the config directory.
///
/// Command line flags take precedence over every value here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    /// Directory with the gzipped CSV table exports
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Category tree JSON file
    #[serde(default)]
    pub categories_file: Option<PathBuf>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_dump_max_lines")]
    pub dump_max_lines: usize,

    /// Per-table record cap when importing (0 = no cap)
    #[serde(default)]
    pub max_records: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_dump_max_lines() -> usize {
    DEFAULT_DUMP_MAX_LINES
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            categories_file: None,
            page_size: default_page_size(),
            dump_max_lines: default_dump_max_lines(),
            max_records: 0,
        }
    }
}

impl FilterConfig {
    /// Platform config directory, if one can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "attrfilters", "attrfilters").map(|d| d.config_dir().to_path_buf())
    }

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(AttrError::Io)?;
        let config: FilterConfig = serde_json::from_str(&content)
            .map_err(|e| AttrError::Config(format!("{}: {}", config_path.display(), e)))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(AttrError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(AttrError::Serialization)?;
        fs::write(config_path, content).map_err(AttrError::Io)?;
        Ok(())
    }

    /// Import options from this config, with `data_dir` and `categories_file`
    /// overridden when given.
    pub fn load_options(
        &self,
        data_dir: Option<PathBuf>,
        categories_file: Option<PathBuf>,
        expand: usize,
    ) -> Result<LoadOptions> {
        let data_dir = data_dir
            .or_else(|| self.data_dir.clone())
            .ok_or_else(|| AttrError::Config("no data directory given (use --data)".to_string()))?;
        Ok(LoadOptions {
            data_dir,
            categories_file: categories_file.or_else(|| self.categories_file.clone()),
            expand,
            max_records: self.max_records,
        })
    }
}
