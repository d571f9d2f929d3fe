//! Tag grammar: the text-level conventions of the checklist format.
//!
//! Checkbox markers, `[priority]` prefixes, bracketed `[LABEL]` tags and
//! trailing markdown links. Every function here is total: unmatched input
//! comes back unchanged (or as a default), never as an error. Malformed
//! brackets are not matched and stay in the text verbatim.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(?: |[xX])\]\s*").expect("static regex"));
static COMPLETED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[[xX]\]").expect("static regex"));
static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\[(none|low|medium|high|urgent)\]\s*").expect("static regex"));
static TRAILING_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\[([^\]]+)\]\(([^)]+)\)\s*$").expect("static regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([A-Z0-9_-]+)\]").expect("static regex"));

/// Issue priority. Parsed case-insensitively, stored normalized.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	#[default]
	None,
	Low,
	Medium,
	High,
	Urgent,
}

impl Priority {
	pub fn as_str(&self) -> &'static str {
		match self {
			Priority::None => "none",
			Priority::Low => "low",
			Priority::Medium => "medium",
			Priority::High => "high",
			Priority::Urgent => "urgent",
		}
	}
}

impl std::fmt::Display for Priority {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown priority: {0}")]
pub struct UnknownPriority(String);

impl std::str::FromStr for Priority {
	type Err = UnknownPriority;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"none" => Ok(Priority::None),
			"low" => Ok(Priority::Low),
			"medium" => Ok(Priority::Medium),
			"high" => Ok(Priority::High),
			"urgent" => Ok(Priority::Urgent),
			other => Err(UnknownPriority(other.to_string())),
		}
	}
}

/// A bracketed `[LABEL]` occurrence.
///
/// Instances are not unique by name at extraction time; deduplication is the
/// caller's job (see `labels::extract_labels`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tag {
	/// The token between the brackets, `[A-Z0-9_-]+`.
	pub name: String,
	/// The literal bracketed substring, brackets included.
	pub source_text: String,
}

/// Remove a leading `[ ]`/`[x]`/`[X]` marker plus following whitespace.
/// Input without a marker comes back unchanged.
pub fn strip_checkbox(text: &str) -> &str {
	match CHECKBOX_RE.find(text) {
		Some(m) => &text[m.end()..],
		None => text,
	}
}

/// True iff the text begins with a checked marker (`[x]`, case-insensitive).
pub fn detect_completion(text: &str) -> bool {
	COMPLETED_RE.is_match(text)
}

/// Match a leading `[priority]` token; absent markers yield `Priority::None`
/// and the unchanged remainder.
pub fn extract_priority(text: &str) -> (Priority, &str) {
	if let Some(caps) = PRIORITY_RE.captures(text) {
		let whole = caps.get(0).expect("group 0 is the whole match");
		// The alternation only admits valid tokens.
		let priority = caps[1].parse().unwrap_or_default();
		return (priority, &text[whole.end()..]);
	}
	(Priority::None, text)
}

/// Split a trailing markdown link off the end of the text.
///
/// Returns the trimmed remaining name plus the link target when a
/// `[label](url)` is anchored at the end (optionally preceded by whitespace).
pub fn strip_trailing_link(text: &str) -> (String, Option<String>) {
	if let Some(caps) = TRAILING_LINK_RE.captures(text) {
		let whole = caps.get(0).expect("group 0 is the whole match");
		let name = text[..whole.start()].trim().to_string();
		return (name, Some(caps[2].to_string()));
	}
	(text.trim().to_string(), None)
}

/// All non-overlapping `[A-Z0-9_-]+` bracketed tags, in order of appearance.
/// Duplicates within the same text are kept.
pub fn extract_bracketed_tags(text: &str) -> Vec<Tag> {
	TAG_RE
		.captures_iter(text)
		.map(|caps| Tag {
			name: caps[1].to_string(),
			source_text: caps[0].to_string(),
		})
		.collect()
}

/// Remove every bracketed tag occurrence and collapse the resulting
/// whitespace. Used for module name cleanup; issue names only ever lose a
/// single leading priority tag.
pub fn strip_module_tags(text: &str) -> String {
	let stripped = TAG_RE.replace_all(text, " ");
	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Organizational sub-headers inside a checklist (`**Security checks:**` and
/// the like) look like items but are not issues. Matches bold text ending in
/// a colon, with the colon inside or outside the closing `**`.
pub fn is_section_header(name: &str) -> bool {
	let name = name.trim();
	if name.ends_with(':') {
		return true;
	}
	name.starts_with("**") && name.ends_with("**") && name.trim_end_matches('*').trim_end().ends_with(':')
}

/// A checklist item after the full decomposition.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemParts {
	pub name: String,
	pub priority: Priority,
	pub is_completed: bool,
	pub trailing_link: Option<String>,
}

/// Decompose a checklist item's flattened text in the fixed order: checkbox
/// off, completion from the original text, priority off the checkbox-stripped
/// text, trailing link off the rest.
///
/// Returns `None` for section-header-shaped items; an empty name passes
/// through and is left for validation to reject.
pub fn decompose_item(text: &str) -> Option<ItemParts> {
	let is_completed = detect_completion(text);
	let without_checkbox = strip_checkbox(text);
	let (priority, remainder) = extract_priority(without_checkbox);
	let (name, trailing_link) = strip_trailing_link(remainder);
	if !name.is_empty() && is_section_header(&name) {
		return None;
	}
	Some(ItemParts {
		name,
		priority,
		is_completed,
		trailing_link,
	})
}
