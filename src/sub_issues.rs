//! Sub-issue extraction: a secondary markdown file scoped under one parent
//! issue, reached through the parent's trailing link.
//!
//! No section state here; the entire document belongs to the parent. The
//! item decomposition mirrors `issues`, but sub-issues never carry labels.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grammar::{self, Priority};
use crate::issues::has_checkbox;
use crate::reader::{self, ReadError};
use crate::tree::{self, SyntaxNode};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubIssue {
	pub name: String,
	pub raw_text: String,
	pub priority: Priority,
	pub is_completed: bool,
	pub trailing_link: Option<String>,
	/// Weak references, resolved later by name.
	pub module_name: String,
	pub parent_issue_name: String,
	/// Always empty: sub-issues do not inherit the parent module's label.
	pub labels: Vec<String>,
}

/// Extract every checklist item in the document as a sub-issue of
/// `parent_issue_name`.
pub fn extract_sub_issues(tree: &SyntaxNode, parent_issue_name: &str, module_name: &str) -> Vec<SubIssue> {
	// Derived for potential downstream prefixing; deliberately never applied
	// to sub-issue names.
	if let Some(label) = grammar::extract_bracketed_tags(module_name).into_iter().next() {
		tracing::debug!(label = %label.name, "module label available but not propagated to sub-issues");
	}

	let mut sub_issues: Vec<SubIssue> = Vec::new();
	tree::walk(tree, &mut |node| {
		if !matches!(node, SyntaxNode::ListItem { .. }) || !has_checkbox(node) {
			return;
		}
		let Some(paragraph) = node.children().first() else {
			return;
		};
		let raw_text = tree::assemble_text(paragraph);
		if let Some(parts) = grammar::decompose_item(&raw_text) {
			sub_issues.push(SubIssue {
				name: parts.name,
				raw_text,
				priority: parts.priority,
				is_completed: parts.is_completed,
				trailing_link: parts.trailing_link,
				module_name: module_name.to_string(),
				parent_issue_name: parent_issue_name.to_string(),
				labels: Vec::new(),
			});
		}
	});
	sub_issues
}

/// Read and extract a sub-issue file. I/O failures abort only this file;
/// multi-file callers log and continue with the rest.
pub fn extract_sub_issues_from_file(path: &Path, parent_issue_name: &str, module_name: &str) -> Result<Vec<SubIssue>, ReadError> {
	let tree = reader::parse_markdown_file(path)?;
	let sub_issues = extract_sub_issues(&tree, parent_issue_name, module_name);
	tracing::debug!(file = %path.display(), count = sub_issues.len(), "extracted sub-issues");
	Ok(sub_issues)
}

pub fn validate_sub_issue(sub_issue: &SubIssue) -> bool {
	!sub_issue.name.trim().is_empty() && !sub_issue.parent_issue_name.trim().is_empty() && !sub_issue.module_name.trim().is_empty()
}
