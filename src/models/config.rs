use serde::Deserialize;
use std::path::Path;

use super::grid_spec::{GridSpec, Orientation};
use super::page_format::PageFormat;
use crate::error::PipelineError;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Grid used when a request or command does not name one
    #[serde(default)]
    pub grid: GridDefaults,

    /// Output resolution in dots per inch
    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// File name offered for the assembled document
    #[serde(default = "default_document_name")]
    pub document_name: String,

    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Long edge of live tile thumbnails, in pixels
    #[serde(default = "default_thumbnail_edge")]
    pub thumbnail_edge: u32,

    /// Seconds a finished job stays downloadable
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,

    /// Jobs kept in memory before the oldest finished ones are evicted
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,

    /// Jobs rendering at the same time
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

fn default_dpi() -> f64 {
    300.0
}

fn default_document_name() -> String {
    "poster_a4.pdf".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_thumbnail_edge() -> u32 {
    512
}

fn default_job_retention_secs() -> u64 {
    3600
}

fn default_max_jobs() -> usize {
    32
}

fn default_max_concurrent_jobs() -> usize {
    2
}

/// Default grid dimensions
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GridDefaults {
    #[serde(default = "default_cols")]
    pub cols: u32,

    #[serde(default = "default_rows")]
    pub rows: u32,

    #[serde(default)]
    pub orientation: Orientation,
}

fn default_cols() -> u32 {
    2
}

fn default_rows() -> u32 {
    2
}

impl Default for GridDefaults {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            orientation: Orientation::Portrait,
        }
    }
}

impl GridDefaults {
    /// Build a grid from optional overrides, filling the gaps from these defaults.
    pub fn resolve(
        &self,
        cols: Option<u32>,
        rows: Option<u32>,
        orientation: Option<Orientation>,
    ) -> Result<GridSpec, PipelineError> {
        GridSpec::new(
            cols.unwrap_or(self.cols),
            rows.unwrap_or(self.rows),
            orientation.unwrap_or(self.orientation),
        )
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    let config = config.validated();
                    tracing::info!(
                        path = %path.display(),
                        cols = config.grid.cols,
                        rows = config.grid.rows,
                        dpi = config.dpi,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    // Values serde accepts but rendering cannot use
    fn validated(mut self) -> Self {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            tracing::warn!(dpi = self.dpi, "Invalid dpi in config, using default");
            self.dpi = default_dpi();
        }
        if self.max_concurrent_jobs == 0 {
            tracing::warn!("max_concurrent_jobs must be at least 1, using default");
            self.max_concurrent_jobs = default_max_concurrent_jobs();
        }
        self
    }

    /// Load from `CONFIG_FILE` if set, otherwise use defaults
    pub fn from_env() -> Self {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => Self::default(),
        }
    }

    /// Page format tiles are rendered at
    pub fn page_format(&self) -> PageFormat {
        PageFormat {
            dpi: self.dpi,
            ..PageFormat::A4
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid: GridDefaults::default(),
            dpi: default_dpi(),
            document_name: default_document_name(),
            max_upload_bytes: default_max_upload_bytes(),
            thumbnail_edge: default_thumbnail_edge(),
            job_retention_secs: default_job_retention_secs(),
            max_jobs: default_max_jobs(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}
