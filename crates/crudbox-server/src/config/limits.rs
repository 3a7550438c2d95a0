//! Store, project and size-limit configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `store` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON snapshot rewritten after every mutation; in-memory only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// `projects` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectsConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

fn default_code_length() -> usize {
    5
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
        }
    }
}

/// `limits` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Largest accepted request body, OpenAPI uploads included
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    #[serde(default = "default_max_response_body_bytes")]
    pub max_response_body_bytes: usize,
}

fn default_max_document_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_response_body_bytes() -> usize {
    1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
            max_response_body_bytes: default_max_response_body_bytes(),
        }
    }
}
