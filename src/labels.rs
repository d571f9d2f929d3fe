//! Label extraction and reconciliation against the remote catalog.

use crate::grammar::{self, Tag};
use crate::plane::PlaneLabel;
use crate::tree::{self, SyntaxNode};

/// Collect bracketed tags from depth-2 headings, list items and paragraphs,
/// deduplicated by name with first-seen order preserved.
pub fn extract_labels(tree: &SyntaxNode) -> Vec<Tag> {
	let mut labels: Vec<Tag> = Vec::new();
	tree::walk(tree, &mut |node| {
		let text = match node {
			SyntaxNode::Heading { depth: 2, .. } => tree::assemble_text(node),
			SyntaxNode::ListItem { .. } => list_item_text(node),
			SyntaxNode::Paragraph { .. } => tree::assemble_text(node),
			_ => return,
		};
		for tag in grammar::extract_bracketed_tags(&text) {
			if !labels.iter().any(|known| known.name == tag.name) {
				labels.push(tag);
			}
		}
	});
	labels
}

fn list_item_text(item: &SyntaxNode) -> String {
	let mut text = String::new();
	for child in item.children() {
		if matches!(child, SyntaxNode::Paragraph { .. }) {
			text.push_str(&tree::assemble_text(child));
		}
	}
	text.trim().to_string()
}

/// Case-insensitive exact-name lookup in the remote catalog. Absence is not
/// an error; the caller decides whether to create the label remotely.
pub fn resolve_label_id<'a>(name: &str, remote: &'a [PlaneLabel]) -> Option<&'a str> {
	remote.iter().find(|label| label.name.eq_ignore_ascii_case(name)).map(|label| label.id.as_str())
}

/// Case-insensitive uniqueness check. `None` means the remote catalog could
/// not be fetched; we fail open so transient read failures never block
/// creation flows.
pub fn is_name_unique(candidate: &str, remote: Option<&[PlaneLabel]>) -> bool {
	match remote {
		None => true,
		Some(labels) => !labels.iter().any(|label| label.name.eq_ignore_ascii_case(candidate)),
	}
}

pub fn validate_label(label: &Tag) -> bool {
	!label.name.trim().is_empty() && label.source_text.starts_with('[') && label.source_text.ends_with(']')
}
