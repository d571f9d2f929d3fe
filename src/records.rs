//! Export records: the JSON shapes handed to the sync layer.
//!
//! Records separate the markdown-derived fields (raw text, weak name
//! references, completion) from the `payload` that goes to the Plane API
//! verbatim. Defaults come in through `ExportDefaults`, never from constants.

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::config::ExportDefaults;
use crate::grammar::{Priority, Tag};
use crate::issues::Issue;
use crate::modules::Module;
use crate::sub_issues::SubIssue;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelPayload {
	pub name: String,
	pub color: String,
	#[serde(default)]
	pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelRecord {
	pub name: String,
	pub raw_text: String,
	pub payload: LabelPayload,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModulePayload {
	pub name: String,
	pub status: String,
	pub sort_order: i64,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub start_date: Option<String>,
	#[serde(default)]
	pub target_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleRecord {
	pub raw_text: String,
	pub clean_text: String,
	pub label: LabelRecord,
	pub payload: ModulePayload,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssuePayload {
	pub name: String,
	pub priority: Priority,
	#[serde(default)]
	pub labels: Vec<String>,
	#[serde(default)]
	pub parent: Option<String>,
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default = "default_description_html")]
	pub description_html: String,
	#[serde(default)]
	pub description_stripped: String,
	#[serde(default)]
	pub assignees: Vec<String>,
	#[serde(default)]
	pub start_date: Option<String>,
	#[serde(default)]
	pub target_date: Option<String>,
}

fn default_description_html() -> String {
	"<p></p>".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssueRecord {
	#[serde(rename = "type")]
	pub kind: String,
	pub module_name: String,
	pub name: String,
	pub raw_text: String,
	#[serde(default)]
	pub link_sub_issue: Option<String>,
	pub is_completed: bool,
	pub payload: IssuePayload,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubIssueRecord {
	#[serde(rename = "type")]
	pub kind: String,
	pub module_name: String,
	pub parent_issue_name: String,
	pub name: String,
	pub raw_text: String,
	pub is_completed: bool,
	pub payload: IssuePayload,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LabelExport {
	pub labels: Vec<LabelRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModuleExport {
	pub modules: Vec<ModuleRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IssueExport {
	pub issues: Vec<IssueRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SubIssueExport {
	pub issues: Vec<SubIssueRecord>,
}

pub fn label_record(tag: &Tag, defaults: &ExportDefaults) -> LabelRecord {
	LabelRecord {
		name: tag.name.clone(),
		raw_text: tag.source_text.clone(),
		payload: LabelPayload {
			name: tag.name.clone(),
			color: defaults.label_color.clone(),
			description: String::new(),
		},
	}
}

pub fn module_record(module: &Module, defaults: &ExportDefaults) -> ModuleRecord {
	ModuleRecord {
		raw_text: module.raw_heading_text.clone(),
		clean_text: module.clean_name.clone(),
		label: label_record(&module.label, defaults),
		payload: ModulePayload {
			name: module.clean_name.clone(),
			status: defaults.module_status.clone(),
			sort_order: module.sort_position,
			description: String::new(),
			start_date: None,
			target_date: None,
		},
	}
}

pub fn issue_record(issue: &Issue) -> IssueRecord {
	IssueRecord {
		kind: "issue".to_string(),
		module_name: issue.module_name.clone(),
		name: issue.name.clone(),
		raw_text: issue.raw_text.clone(),
		link_sub_issue: issue.trailing_link.clone(),
		is_completed: issue.is_completed,
		payload: IssuePayload {
			name: issue.name.clone(),
			priority: issue.priority,
			labels: issue.labels.clone(),
			parent: None,
			state: None,
			description_html: default_description_html(),
			description_stripped: String::new(),
			assignees: Vec::new(),
			start_date: None,
			target_date: None,
		},
	}
}

pub fn sub_issue_record(sub_issue: &SubIssue) -> SubIssueRecord {
	SubIssueRecord {
		kind: "sub_issue".to_string(),
		module_name: sub_issue.module_name.clone(),
		parent_issue_name: sub_issue.parent_issue_name.clone(),
		name: sub_issue.name.clone(),
		raw_text: sub_issue.raw_text.clone(),
		is_completed: sub_issue.is_completed,
		payload: IssuePayload {
			name: sub_issue.name.clone(),
			priority: sub_issue.priority,
			labels: Vec::new(),
			parent: None,
			state: None,
			description_html: default_description_html(),
			description_stripped: String::new(),
			assignees: Vec::new(),
			start_date: None,
			target_date: None,
		},
	}
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	if let Some(dir) = path.parent() {
		std::fs::create_dir_all(dir).wrap_err_with(|| format!("failed to create output directory {}", dir.display()))?;
	}
	let json = serde_json::to_string_pretty(value)?;
	std::fs::write(path, json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
	Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
	let raw = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read records file {}", path.display()))?;
	serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse records file {}", path.display()))
}
