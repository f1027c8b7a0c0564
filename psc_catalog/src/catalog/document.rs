//! Authored catalog document and its on-disk loading

use super::controls::ControlSpec;
use super::error::CatalogError;
use super::families::{ArrayScanConfig, TemplateFamilyProfile};
use super::requirement::RequirementSpec;
use crate::config::compile_time::catalog::{DEFAULT_CATALOG_VERSION, MAX_CATALOG_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_version() -> String {
    DEFAULT_CATALOG_VERSION.to_string()
}

/// Requirement catalog exactly as authored (JSON or TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub requirements: Vec<RequirementSpec>,
    #[serde(default)]
    pub controls: Vec<ControlSpec>,
    #[serde(default)]
    pub template_families: Vec<TemplateFamilyProfile>,
    #[serde(default)]
    pub matching: ArrayScanConfig,
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            requirements: Vec::new(),
            controls: Vec::new(),
            template_families: Vec::new(),
            matching: ArrayScanConfig::default(),
        }
    }
}

/// On-disk catalog encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Toml,
}

impl CatalogFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(CatalogFormat::Json),
            "toml" => Some(CatalogFormat::Toml),
            _ => None,
        }
    }
}

impl CatalogDocument {
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    pub fn parse(content: &str, format: CatalogFormat) -> Result<Self, CatalogError> {
        match format {
            CatalogFormat::Json => Self::from_json_str(content),
            CatalogFormat::Toml => Self::from_toml_str(content),
        }
    }

    /// Read a catalog file; the format comes from its extension
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let format = CatalogFormat::from_path(path).ok_or_else(|| CatalogError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

        let metadata = std::fs::metadata(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.len() > MAX_CATALOG_FILE_SIZE {
            return Err(CatalogError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max: MAX_CATALOG_FILE_SIZE,
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, format)
    }
}
