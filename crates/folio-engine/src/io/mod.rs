//! Plain-text import and export.
//!
//! One line per block. `# ` to `###### ` prefixes make headings, `> `
//! prefixed lines are grouped into a quote, and ```` ``` ```` fences wrap
//! code blocks. Styles are not represented and are dropped on export.

use std::fs;
use std::path::{Path, PathBuf};

use crate::blocks::{BlockId, Document, DocumentError, ids};
use crate::text::TextBlockContent;

const QUOTE_PREFIX: &str = "> ";
const FENCE: &str = "```";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unclosed code fence opened on line {0}")]
    UnclosedFence(usize),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Read a plain-text file into a new document
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    document_from_text(&text)
}

/// Write a document as plain text
pub fn write_document(path: &Path, document: &Document) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, document_to_text(document)?)?;
    Ok(())
}

pub fn document_from_text(text: &str) -> Result<Document, IoError> {
    let mut document = Document::new();
    let root = document.root();
    let placeholder = document.first_block(root)?;

    let mut lines = text.lines().enumerate().peekable();
    let mut added = false;
    while let Some((number, line)) = lines.next() {
        let block = if line.trim_end() == FENCE {
            let mut body = Vec::new();
            loop {
                match lines.next() {
                    Some((_, line)) if line.trim_end() == FENCE => break,
                    Some((_, line)) => body.push(line),
                    None => return Err(IoError::UnclosedFence(number + 1)),
                }
            }
            text_block(&mut document, ids::CODE, &body.join("\n"))?
        } else if let Some(first) = line.strip_prefix(QUOTE_PREFIX).or(quote_marker(line)) {
            let quote = document.create_block(ids::QUOTE)?;
            let default_child = document.first_block(quote)?;
            let mut quoted = vec![first];
            while let Some(&(_, next)) = lines.peek() {
                match next.strip_prefix(QUOTE_PREFIX).or(quote_marker(next)) {
                    Some(inner) => {
                        quoted.push(inner);
                        lines.next();
                    }
                    None => break,
                }
            }
            for inner in quoted {
                let child = line_block(&mut document, inner)?;
                document.append(quote, child)?;
            }
            if let Some(default_child) = default_child {
                document.remove_block(default_child)?;
            }
            quote
        } else {
            line_block(&mut document, line)?
        };
        document.append(root, block)?;
        added = true;
    }

    if added && let Some(placeholder) = placeholder {
        document.remove_block(placeholder)?;
    }
    Ok(document)
}

/// Renders every block of the document as lines of plain text, ending with
/// a newline.
pub fn document_to_text(document: &Document) -> Result<String, IoError> {
    let mut lines = Vec::new();
    for block in document.children(document.root()) {
        if document.block(block)?.is_collection() {
            for child in document.children(block) {
                for line in block_lines(document, child)? {
                    lines.push(format!("{QUOTE_PREFIX}{line}").trim_end().to_string());
                }
            }
        } else {
            lines.extend(block_lines(document, block)?);
        }
    }
    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// A bare `>` line is an empty quoted paragraph.
fn quote_marker(line: &str) -> Option<&str> {
    (line.trim_end() == ">").then_some("")
}

fn heading_level(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest))
}

fn line_block(document: &mut Document, line: &str) -> Result<BlockId, IoError> {
    match heading_level(line) {
        Some((level, text)) => {
            let heading = text_block(document, ids::HEADING, text)?;
            document.set_attribute(heading, "level", &level.to_string())?;
            Ok(heading)
        }
        None => text_block(document, ids::PARAGRAPH, line),
    }
}

fn text_block(document: &mut Document, descriptor: &str, text: &str) -> Result<BlockId, IoError> {
    Ok(document.create_text_block(descriptor, TextBlockContent::from_text(text))?)
}

fn block_lines(document: &Document, block: BlockId) -> Result<Vec<String>, IoError> {
    let node = document.block(block)?;
    let text = document.text(block)?;
    let lines = match node.descriptor_id() {
        ids::HEADING => {
            let level = node
                .attribute("level")
                .and_then(|level| level.parse::<usize>().ok())
                .unwrap_or(1);
            vec![format!("{} {text}", "#".repeat(level))]
        }
        ids::CODE => {
            let mut lines = vec![FENCE.to_string()];
            lines.extend(text.split('\n').map(str::to_string));
            lines.push(FENCE.to_string());
            lines
        }
        _ => vec![text],
    };
    Ok(lines)
}
