/* Schema file loading */

use anyhow::Context;
use layout_types::LayoutDef;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Schema describing the managed runtime's own heap objects.
pub const RUNTIME_SCHEMA: &str = include_str!("../../schemas/runtime.yaml");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaFile {
  #[serde(default)]
  pub description: Option<String>,

  /* Layout declarations, in tag order */
  #[serde(default)]
  pub layouts: Vec<LayoutDef>,
}

impl SchemaFile {
  pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
    serde_yml::from_str(content).context("Failed to parse layout schema YAML")
  }

  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let content =
      std::fs::read_to_string(path).with_context(|| format!("Failed to read schema file {}", path.display()))?;
    Self::from_yaml_str(&content).with_context(|| format!("Invalid schema file {}", path.display()))
  }

  pub fn runtime() -> anyhow::Result<Self> {
    Self::from_yaml_str(RUNTIME_SCHEMA)
  }
}
