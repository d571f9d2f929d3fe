//! Owned markdown syntax tree.
//!
//! pulldown_cmark hands us a flat event stream with lifetimes tied to the input
//! buffer. Extraction wants a tree it can walk several times, so we build an
//! owned node tree once per document and keep it immutable for the whole run.
//!
//! The task-list extension stays off on purpose: the checklist grammar reads
//! `[ ]`/`[x]` markers as literal text at the start of an item.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

/// A node of the parsed markdown document.
///
/// The kind set is closed; extractors match exhaustively instead of probing
/// for field presence.
#[derive(Clone, Debug, PartialEq)]
pub enum SyntaxNode {
	Document { children: Vec<SyntaxNode> },
	Heading { depth: u8, children: Vec<SyntaxNode> },
	List { children: Vec<SyntaxNode> },
	ListItem { children: Vec<SyntaxNode> },
	Paragraph { children: Vec<SyntaxNode> },
	Text { value: String },
	Link { target: String, children: Vec<SyntaxNode> },
	Strong { children: Vec<SyntaxNode> },
	Emphasis { children: Vec<SyntaxNode> },
	Code { value: String },
	/// Constructs the checklist grammar has no use for (tables, block quotes,
	/// images, ...). Kept as containers so their children still appear in
	/// traversal order.
	Other { children: Vec<SyntaxNode> },
}

impl SyntaxNode {
	/// Parse a markdown document into a tree rooted at a `Document` node.
	pub fn parse(content: &str) -> SyntaxNode {
		let options = Options::ENABLE_STRIKETHROUGH;
		let parser = Parser::new_ext(content, options);

		let mut stack: Vec<SyntaxNode> = vec![SyntaxNode::Document { children: Vec::new() }];
		for event in parser {
			match event {
				Event::Start(tag) => {
					let node = match tag {
						Tag::Heading { level, .. } => SyntaxNode::Heading {
							depth: heading_depth(level),
							children: Vec::new(),
						},
						Tag::List(_) => SyntaxNode::List { children: Vec::new() },
						Tag::Item => SyntaxNode::ListItem { children: Vec::new() },
						Tag::Paragraph => SyntaxNode::Paragraph { children: Vec::new() },
						Tag::Link { dest_url, .. } => SyntaxNode::Link {
							target: dest_url.into_string(),
							children: Vec::new(),
						},
						Tag::Strong => SyntaxNode::Strong { children: Vec::new() },
						Tag::Emphasis => SyntaxNode::Emphasis { children: Vec::new() },
						_ => SyntaxNode::Other { children: Vec::new() },
					};
					stack.push(node);
				}
				Event::End(_) => {
					let node = stack.pop().expect("parser emits balanced start/end events");
					let parent = stack.last_mut().expect("document root is never popped");
					attach(parent, node);
				}
				Event::Text(text) => {
					let parent = stack.last_mut().expect("document root is never popped");
					attach(parent, SyntaxNode::Text { value: text.into_string() });
				}
				Event::Code(code) => {
					let parent = stack.last_mut().expect("document root is never popped");
					attach(parent, SyntaxNode::Code { value: code.into_string() });
				}
				Event::SoftBreak | Event::HardBreak => {
					let parent = stack.last_mut().expect("document root is never popped");
					attach(parent, SyntaxNode::Text { value: " ".to_string() });
				}
				// Raw html, rules, math and footnotes carry nothing the
				// checklist grammar cares about.
				_ => {}
			}
		}

		stack.pop().expect("document root is never popped")
	}

	/// Children of this node; leaf kinds yield an empty slice.
	pub fn children(&self) -> &[SyntaxNode] {
		match self {
			SyntaxNode::Document { children }
			| SyntaxNode::Heading { children, .. }
			| SyntaxNode::List { children }
			| SyntaxNode::ListItem { children }
			| SyntaxNode::Paragraph { children }
			| SyntaxNode::Link { children, .. }
			| SyntaxNode::Strong { children }
			| SyntaxNode::Emphasis { children }
			| SyntaxNode::Other { children } => children,
			SyntaxNode::Text { .. } | SyntaxNode::Code { .. } => &[],
		}
	}

	fn children_mut(&mut self) -> &mut Vec<SyntaxNode> {
		match self {
			SyntaxNode::Document { children }
			| SyntaxNode::Heading { children, .. }
			| SyntaxNode::List { children }
			| SyntaxNode::ListItem { children }
			| SyntaxNode::Paragraph { children }
			| SyntaxNode::Link { children, .. }
			| SyntaxNode::Strong { children }
			| SyntaxNode::Emphasis { children }
			| SyntaxNode::Other { children } => children,
			SyntaxNode::Text { .. } | SyntaxNode::Code { .. } => unreachable!("leaf nodes are never open containers"),
		}
	}
}

fn heading_depth(level: HeadingLevel) -> u8 {
	match level {
		HeadingLevel::H1 => 1,
		HeadingLevel::H2 => 2,
		HeadingLevel::H3 => 3,
		HeadingLevel::H4 => 4,
		HeadingLevel::H5 => 5,
		HeadingLevel::H6 => 6,
	}
}

/// Attach a finished node to its parent.
///
/// Two normalizations happen here so extractors see the same shape regardless
/// of how the parser sliced the input:
/// - adjacent text leaves coalesce into one text node (brackets split the
///   event stream otherwise, and the grammar needs `[ ] [high] ...` in one
///   piece);
/// - inline content landing directly under a list item (tight lists) is
///   wrapped in a synthetic paragraph, matching the loose-list shape.
fn attach(parent: &mut SyntaxNode, node: SyntaxNode) {
	if matches!(parent, SyntaxNode::ListItem { .. }) && is_inline(&node) {
		let children = parent.children_mut();
		if !matches!(children.last(), Some(SyntaxNode::Paragraph { .. })) {
			children.push(SyntaxNode::Paragraph { children: Vec::new() });
		}
		if let Some(paragraph) = children.last_mut() {
			push_coalescing(paragraph, node);
		}
		return;
	}
	push_coalescing(parent, node);
}

fn push_coalescing(parent: &mut SyntaxNode, node: SyntaxNode) {
	let children = parent.children_mut();
	if let SyntaxNode::Text { value } = &node
		&& let Some(SyntaxNode::Text { value: prev }) = children.last_mut()
	{
		prev.push_str(value);
		return;
	}
	children.push(node);
}

fn is_inline(node: &SyntaxNode) -> bool {
	matches!(
		node,
		SyntaxNode::Text { .. } | SyntaxNode::Code { .. } | SyntaxNode::Link { .. } | SyntaxNode::Strong { .. } | SyntaxNode::Emphasis { .. }
	)
}

/// Visit `node` and every descendant in document order (pre-order, depth-first).
pub fn walk<'a>(node: &'a SyntaxNode, visit: &mut impl FnMut(&'a SyntaxNode)) {
	visit(node);
	for child in node.children() {
		walk(child, visit);
	}
}

/// Flatten a heading/paragraph-like node into one string.
///
/// Text values are taken verbatim; links are re-serialized to their literal
/// `[text](url)` form, and strong/emphasis/code keep their delimiters, so the
/// tag grammar can still detect and strip them positionally.
pub fn assemble_text(node: &SyntaxNode) -> String {
	render_inline(node.children())
}

fn render_inline(nodes: &[SyntaxNode]) -> String {
	let mut out = String::new();
	for node in nodes {
		match node {
			SyntaxNode::Text { value } => out.push_str(value),
			SyntaxNode::Code { value } => {
				out.push('`');
				out.push_str(value);
				out.push('`');
			}
			SyntaxNode::Link { target, children } => {
				out.push('[');
				out.push_str(&render_inline(children));
				out.push_str("](");
				out.push_str(target);
				out.push(')');
			}
			SyntaxNode::Strong { children } => {
				out.push_str("**");
				out.push_str(&render_inline(children));
				out.push_str("**");
			}
			SyntaxNode::Emphasis { children } => {
				out.push('*');
				out.push_str(&render_inline(children));
				out.push('*');
			}
			_ => {}
		}
	}
	out
}
