//! Issue extraction: checklist items inside one module section.
//!
//! The traversal carries an explicit section state. The transitions are the
//! load-bearing part of this module: a module-depth heading that fails the
//! predicate deactivates the section, and so does a heading exactly one level
//! deeper than the active module. The deeper-heading rule is relative to the
//! module's own depth, which is what keeps it correct under both `Top` and
//! `Nested` depth configurations.

use serde::{Deserialize, Serialize};

use crate::grammar::{self, Priority, Tag};
use crate::labels;
use crate::modules::ModuleDepths;
use crate::plane::PlaneLabel;
use crate::tree::{self, SyntaxNode};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
	pub name: String,
	/// Flattened item text, checkbox marker included.
	pub raw_text: String,
	pub priority: Priority,
	pub is_completed: bool,
	/// Markdown link at the very end of the item, pointing at a sub-issue file.
	pub trailing_link: Option<String>,
	/// Weak reference to the owning module, resolved later by name.
	pub module_name: String,
	/// Resolved remote label identifiers.
	pub labels: Vec<String>,
}

enum SectionState {
	Inactive,
	Active {
		module_name: String,
		module_label: Option<Tag>,
		module_depth: u8,
	},
}

/// Extract checklist items from the module section(s) whose heading text
/// satisfies `section_matches`, in document order.
///
/// `catalog` is consulted to resolve the module label to a remote identifier;
/// pass an empty slice when operating offline.
pub fn extract_issues_in_section<F>(tree: &SyntaxNode, section_matches: F, depths: ModuleDepths, catalog: &[PlaneLabel]) -> Vec<Issue>
where
	F: Fn(&str) -> bool,
{
	let mut issues: Vec<Issue> = Vec::new();
	let mut state = SectionState::Inactive;

	tree::walk(tree, &mut |node| match node {
		SyntaxNode::Heading { depth, .. } => {
			let text = tree::assemble_text(node).trim().to_string();
			if depths.contains(*depth) {
				if section_matches(&text) {
					state = SectionState::Active {
						module_name: grammar::strip_module_tags(&text),
						module_label: grammar::extract_bracketed_tags(&text).into_iter().next(),
						module_depth: *depth,
					};
				} else {
					state = SectionState::Inactive;
				}
			} else if let SectionState::Active { module_depth, .. } = &state {
				// A sub-heading one level below the module ends the flat
				// checklist region without starting a new module.
				if *depth == module_depth + 1 {
					state = SectionState::Inactive;
				}
			}
		}
		SyntaxNode::ListItem { .. } => {
			if let SectionState::Active { module_name, module_label, .. } = &state
				&& let Some(issue) = issue_from_list_item(node, module_name, module_label.as_ref(), catalog)
			{
				issues.push(issue);
			}
		}
		_ => {}
	});

	issues
}

/// A checklist item starts with a paragraph whose first text child carries
/// the checkbox marker. Anything else is not a checklist item and is skipped,
/// not reported.
pub(crate) fn has_checkbox(item: &SyntaxNode) -> bool {
	let Some(SyntaxNode::Paragraph { children }) = item.children().first() else {
		return false;
	};
	matches!(
		children.first(),
		Some(SyntaxNode::Text { value }) if value.starts_with("[ ]") || value.starts_with("[x]") || value.starts_with("[X]")
	)
}

fn issue_from_list_item(item: &SyntaxNode, module_name: &str, module_label: Option<&Tag>, catalog: &[PlaneLabel]) -> Option<Issue> {
	if !has_checkbox(item) {
		return None;
	}
	let paragraph = item.children().first()?;
	let raw_text = tree::assemble_text(paragraph);
	let parts = grammar::decompose_item(&raw_text)?;

	let (name, label_ids) = match module_label {
		Some(label) => {
			let mut ids = Vec::new();
			if let Some(id) = labels::resolve_label_id(&label.name, catalog) {
				ids.push(id.to_string());
			}
			(format!("{}: {}", label.source_text, parts.name), ids)
		}
		None => (parts.name, Vec::new()),
	};

	Some(Issue {
		name,
		raw_text,
		priority: parts.priority,
		is_completed: parts.is_completed,
		trailing_link: parts.trailing_link,
		module_name: module_name.to_string(),
		labels: label_ids,
	})
}

pub fn validate_issue(issue: &Issue) -> bool {
	!issue.name.trim().is_empty()
}
