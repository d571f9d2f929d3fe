//! Module extraction: checklist phase headings become Plane modules.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::grammar::{self, Tag};
use crate::tree::{self, SyntaxNode};

/// Label synthesized for headings that carry no recognizable tag.
pub const DEFAULT_LABEL: &str = "DEFAULT";

/// Which heading depths start a module section.
///
/// Both variants are in active use; callers must pick one explicitly, there
/// is no hardcoded depth anywhere in the extractors.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ModuleDepths {
	/// `##` headings only.
	#[default]
	Top,
	/// `##` and `###` headings (sub-modules).
	Nested,
}

impl ModuleDepths {
	pub fn contains(&self, depth: u8) -> bool {
		match self {
			ModuleDepths::Top => depth == 2,
			ModuleDepths::Nested => depth == 2 || depth == 3,
		}
	}
}

/// A unit of work derived from a heading. Ordering among modules is document
/// order, which downstream submission and display logic depends on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
	pub raw_heading_text: String,
	/// Heading text with bracketed tags stripped and whitespace collapsed.
	pub clean_name: String,
	/// First bracketed tag of the heading, or a synthesized `DEFAULT`.
	pub label: Tag,
	pub sort_position: i64,
	pub heading_depth: u8,
}

/// Collect modules from every heading at the configured depth(s), in
/// traversal order. `sort_position` is gap-free starting at `sort_base`.
///
/// A heading with no text yields a module with an empty `clean_name`;
/// rejecting those is `validate_module`'s job, not extraction's.
pub fn extract_modules(tree: &SyntaxNode, sort_base: i64, depths: ModuleDepths) -> Vec<Module> {
	let mut modules: Vec<Module> = Vec::new();
	tree::walk(tree, &mut |node| {
		if let SyntaxNode::Heading { depth, .. } = node {
			if !depths.contains(*depth) {
				return;
			}
			let raw = tree::assemble_text(node).trim().to_string();
			let label = grammar::extract_bracketed_tags(&raw).into_iter().next().unwrap_or_else(|| Tag {
				name: DEFAULT_LABEL.to_string(),
				source_text: format!("[{DEFAULT_LABEL}]"),
			});
			modules.push(Module {
				clean_name: grammar::strip_module_tags(&raw),
				label,
				sort_position: sort_base + modules.len() as i64,
				heading_depth: *depth,
				raw_heading_text: raw,
			});
		}
	});
	modules
}

pub fn validate_module(module: &Module) -> bool {
	!module.clean_name.trim().is_empty() && !module.raw_heading_text.is_empty()
}
