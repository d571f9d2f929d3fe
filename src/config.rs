//! TOML configuration.
//!
//! Everything the export and sync steps treat as a "default" lives here and
//! is passed down explicitly: the extractors themselves take no configuration
//! beyond their arguments and have no global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::batch::BatchOptions;

/// Path that expands a leading `~` on deserialization.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "String")]
pub struct ExpandedPath(pub PathBuf);

impl From<String> for ExpandedPath {
	fn from(s: String) -> Self {
		let expanded = match s.strip_prefix('~') {
			Some(rest) => {
				let home = std::env::var("HOME").unwrap_or_default();
				PathBuf::from(format!("{home}{rest}"))
			}
			None => PathBuf::from(s),
		};
		Self(expanded)
	}
}

impl AsRef<Path> for ExpandedPath {
	fn as_ref(&self) -> &Path {
		&self.0
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
	pub plane: PlaneSettings,
	#[serde(default)]
	pub export: ExportDefaults,
	pub sync: SyncSettings,
}

impl TryFrom<ExpandedPath> for AppConfig {
	type Error = color_eyre::Report;

	fn try_from(path: ExpandedPath) -> Result<Self> {
		let raw = std::fs::read_to_string(&path).wrap_err_with(|| format!("failed to read config file at {:?}", path.0))?;
		toml::from_str(&raw).wrap_err("the config file is not correctly formatted TOML and/or is missing required fields")
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaneSettings {
	pub base_url: String,
	pub workspace_slug: String,
	pub project_id: String,
	/// Falls back to the `PLANE_API_KEY` environment variable when unset.
	#[serde(default)]
	pub api_key: Option<String>,
}

impl PlaneSettings {
	pub fn api_key(&self) -> Result<String> {
		if let Some(key) = &self.api_key {
			return Ok(key.clone());
		}
		std::env::var("PLANE_API_KEY").wrap_err("api_key is not in the config and PLANE_API_KEY is not set")
	}
}

/// Defaults injected into export record payloads.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
	pub label_color: String,
	pub module_status: String,
	pub module_sort_base: i64,
}

impl Default for ExportDefaults {
	fn default() -> Self {
		Self {
			label_color: "#3b82f6".to_string(),
			module_status: "planned".to_string(),
			module_sort_base: 0,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct SyncSettings {
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
	#[serde(default = "default_sleep_ms")]
	pub sleep_ms: u64,
	pub states: StateMap,
}

fn default_batch_size() -> usize {
	20
}

fn default_sleep_ms() -> u64 {
	2000
}

impl SyncSettings {
	pub fn batch_options(&self) -> BatchOptions {
		BatchOptions {
			batch_size: self.batch_size,
			sleep: Duration::from_millis(self.sleep_ms),
		}
	}
}

/// Workflow state identifiers of the target project. Server-assigned, so
/// they have to come from configuration rather than constants.
#[derive(Clone, Debug, Deserialize)]
pub struct StateMap {
	pub backlog: String,
	pub todo: String,
	pub in_progress: String,
	pub done: String,
	pub cancelled: String,
}

impl StateMap {
	pub fn for_completion(&self, is_completed: bool) -> &str {
		if is_completed { &self.done } else { &self.todo }
	}
}
