//! Markdown source loading with a stable failure taxonomy.
//!
//! Downstream tooling branches on the failure category, so the
//! `io::ErrorKind` mapping here is part of the contract, not cosmetics.

use std::path::{Path, PathBuf};

use crate::tree::SyntaxNode;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
	#[error("file not found: {}", path.display())]
	NotFound { path: PathBuf },
	#[error("permission denied: {}", path.display())]
	PermissionDenied { path: PathBuf },
	#[error("path is a directory, not a file: {}", path.display())]
	IsADirectory { path: PathBuf },
	#[error("failed to read {}: {source}", path.display())]
	Other {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub fn read_markdown(path: &Path) -> Result<String, ReadError> {
	if path.is_dir() {
		return Err(ReadError::IsADirectory { path: path.to_path_buf() });
	}
	std::fs::read_to_string(path).map_err(|source| match source.kind() {
		std::io::ErrorKind::NotFound => ReadError::NotFound { path: path.to_path_buf() },
		std::io::ErrorKind::PermissionDenied => ReadError::PermissionDenied { path: path.to_path_buf() },
		_ => ReadError::Other {
			path: path.to_path_buf(),
			source,
		},
	})
}

pub fn parse_markdown_file(path: &Path) -> Result<SyntaxNode, ReadError> {
	let content = read_markdown(path)?;
	Ok(SyntaxNode::parse(&content))
}
