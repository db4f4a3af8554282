use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::block::{Block, BlockData};
use super::descriptor::{BlockCategory, BlockRegistry};
use super::{BlockId, Document, DocumentError};
use crate::text::{TextBlockContent, TextFragment, TextStyle};

/// Type id of the child nodes that carry a text block's styled runs.
pub const RUN_TYPE: &str = "run";

const TEXT_ATTRIBUTE: &str = "text";
const STYLE_ATTRIBUTE: &str = "style";

/// Generic persisted form of a block tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub type_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializedNode>,
}

impl SerializedNode {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SerializedNode>) -> Self {
        self.children = children;
        self
    }

    fn run(fragment: &TextFragment) -> Self {
        let node = Self::new(RUN_TYPE).with_attribute(TEXT_ATTRIBUTE, fragment.text());
        if fragment.style().is_plain() {
            node
        } else {
            node.with_attribute(STYLE_ATTRIBUTE, fragment.style().to_attribute())
        }
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        if self.type_id == RUN_TYPE {
            let text = self.attributes.get(TEXT_ATTRIBUTE).map_or("", String::as_str);
            write!(f, "{indent}{text:?}")?;
            if let Some(style) = self.attributes.get(STYLE_ATTRIBUTE) {
                write!(f, " ({style})")?;
            }
            return writeln!(f);
        }
        write!(f, "{indent}{}", self.type_id)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}={value}")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_outline(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for SerializedNode {
    /// Indented outline, one node per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, 0)
    }
}

impl Document {
    /// Serializes a block and its subtree.
    pub fn serialize(&self, id: BlockId) -> Result<SerializedNode, DocumentError> {
        let block = self.block(id)?;
        let children = match &block.data {
            BlockData::Collection { .. } => self
                .children(id)
                .map(|child| self.serialize(child))
                .collect::<Result<Vec<_>, _>>()?,
            BlockData::Text(content) => content.fragments().iter().map(SerializedNode::run).collect(),
        };
        Ok(self.serialize_properties(id)?.with_children(children))
    }

    /// Type and attributes only; enough to recreate an empty block of the
    /// same type.
    pub fn serialize_properties(&self, id: BlockId) -> Result<SerializedNode, DocumentError> {
        let block = self.block(id)?;
        Ok(SerializedNode {
            type_id: block.descriptor.to_string(),
            attributes: block.attributes.clone(),
            children: Vec::new(),
        })
    }

    pub fn to_serialized(&self) -> Result<SerializedNode, DocumentError> {
        self.serialize(self.root())
    }

    /// Rebuilds a detached block from `node` through the registry.
    pub fn deserialize(&mut self, node: &SerializedNode) -> Result<BlockId, DocumentError> {
        let block = self.instantiate(node)?;
        let category = block.category();
        let id = self.alloc(block);
        if category == BlockCategory::Collection
            && let Err(error) = self.deserialize_children(id, node)
        {
            // Children built so far hang off `id` and go with it.
            self.discard(id)?;
            return Err(error);
        }
        Ok(id)
    }

    /// Builds a whole document; the root node must be a collection type.
    pub fn from_serialized(
        registry: Arc<BlockRegistry>,
        node: &SerializedNode,
    ) -> Result<Document, DocumentError> {
        let root = instantiate(&registry, node)?;
        if root.category() != BlockCategory::Collection {
            return Err(DocumentError::MalformedNode(format!(
                "root node must be a collection, found {}",
                node.type_id
            )));
        }
        let mut document = Document::bare(registry, root);
        let root = document.root();
        document.deserialize_children(root, node)?;
        Ok(document)
    }

    fn instantiate(&self, node: &SerializedNode) -> Result<Block, DocumentError> {
        instantiate(self.registry(), node)
    }

    fn deserialize_children(
        &mut self,
        parent: BlockId,
        node: &SerializedNode,
    ) -> Result<(), DocumentError> {
        for child in &node.children {
            let id = self.deserialize(child)?;
            let last = self.block(parent)?.last_child();
            self.link_after(parent, last, id);
        }
        if self.block(parent)?.child_count() == 0 {
            let default_child = self
                .registry()
                .get(self.block(parent)?.descriptor)?
                .default_child
                .ok_or_else(|| DocumentError::MalformedNode(format!("{} has no children", node.type_id)))?;
            let child = self.registry().get(default_child)?.create_instance();
            let child = self.alloc(child);
            self.link_after(parent, None, child);
        }
        Ok(())
    }
}

fn instantiate(registry: &BlockRegistry, node: &SerializedNode) -> Result<Block, DocumentError> {
    let descriptor = registry.get(&node.type_id)?;
    for (name, value) in &node.attributes {
        descriptor.validate_property(name, value)?;
    }
    let mut block = descriptor.create_instance();
    block
        .attributes
        .extend(node.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    if let BlockData::Text(content) = &mut block.data {
        *content = content_from_runs(node)?;
    }
    Ok(block)
}

fn content_from_runs(node: &SerializedNode) -> Result<TextBlockContent, DocumentError> {
    let fragments = node
        .children
        .iter()
        .map(|run| {
            if run.type_id != RUN_TYPE {
                return Err(DocumentError::MalformedNode(format!(
                    "text block {} contains a {} node",
                    node.type_id, run.type_id
                )));
            }
            let text = run.attributes.get(TEXT_ATTRIBUTE).map_or("", String::as_str);
            let style = match run.attributes.get(STYLE_ATTRIBUTE) {
                Some(style) => TextStyle::from_attribute(style)?,
                None => TextStyle::PLAIN,
            };
            Ok(TextFragment::new(text, style))
        })
        .collect::<Result<Vec<_>, DocumentError>>()?;
    Ok(TextBlockContent::from_fragments(fragments, TextStyle::PLAIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::ids;
    use crate::tests::document_with_paragraphs;
    use crate::text::StyleFlag;
    use pretty_assertions::assert_eq;

    #[test]
    fn outline_shows_structure_and_styles() {
        let mut doc = document_with_paragraphs(&["plain"]);
        let block = doc.content_blocks()[0];
        let content = doc.text_content_mut(block).unwrap();
        let (start, end) = (
            content.offset_from_grapheme_index(1).unwrap(),
            content.offset_from_grapheme_index(3).unwrap(),
        );
        content
            .update_style(start, end, |s| s.with(StyleFlag::Bold, true))
            .unwrap();
        let heading = doc.create_text_block(ids::HEADING, "Title".into()).unwrap();
        doc.insert_block_before(block, heading).unwrap();

        insta::assert_snapshot!(doc.to_serialized().unwrap(), @r#"
        document
          heading level=1
            "Title"
          paragraph
            "p"
            "la" (bold)
            "in"
        "#);
    }

    #[test]
    fn round_trips_through_serde_and_registry() {
        let mut doc = document_with_paragraphs(&["one", "two"]);
        let quote = doc.create_block(ids::QUOTE).unwrap();
        let quoted = doc.first_block(quote).unwrap().unwrap();
        doc.set_text(quoted, "quoted").unwrap();
        doc.append(doc.root(), quote).unwrap();

        let node = doc.to_serialized().unwrap();
        let parsed = toml_round_trip(&node);
        let rebuilt = Document::from_serialized(doc.registry().clone(), &parsed).unwrap();

        assert_eq!(rebuilt, doc);
        assert_ne!(rebuilt.id(), doc.id());
    }

    /// Round trip through the derived serde impls via TOML.
    fn toml_round_trip(node: &SerializedNode) -> SerializedNode {
        let text = toml::to_string(node).unwrap();
        toml::from_str(&text).unwrap()
    }

    #[test]
    fn empty_collections_get_their_default_child() {
        let node = SerializedNode::new(ids::DOCUMENT);
        let doc = Document::from_serialized(Arc::new(BlockRegistry::standard()), &node).unwrap();
        assert_eq!(doc.child_count(doc.root()).unwrap(), 1);
    }

    #[test]
    fn unknown_types_and_bad_properties_are_rejected() {
        let mut doc = Document::new();
        assert_eq!(
            doc.deserialize(&SerializedNode::new("table")),
            Err(DocumentError::UnknownDescriptor("table".to_string()))
        );
        let bad = SerializedNode::new(ids::HEADING).with_attribute("level", "9");
        assert!(matches!(
            doc.deserialize(&bad),
            Err(DocumentError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn text_blocks_only_hold_runs() {
        let mut doc = Document::new();
        let node = SerializedNode::new(ids::PARAGRAPH)
            .with_children(vec![SerializedNode::new(ids::PARAGRAPH)]);
        assert!(matches!(
            doc.deserialize(&node),
            Err(DocumentError::MalformedNode(_))
        ));
    }

    #[test]
    fn failed_subtree_frees_its_partial_blocks() {
        let mut doc = Document::new();
        let blocks = doc.block_count();
        let node = SerializedNode::new(ids::QUOTE).with_children(vec![
            SerializedNode::new(ids::PARAGRAPH),
            SerializedNode::new(ids::QUOTE).with_children(vec![
                SerializedNode::new(ids::PARAGRAPH),
                SerializedNode::new("table"),
            ]),
        ]);

        assert_eq!(
            doc.deserialize(&node),
            Err(DocumentError::UnknownDescriptor("table".to_string()))
        );
        assert_eq!(doc.block_count(), blocks);

        let quote = doc.deserialize(&SerializedNode::new(ids::QUOTE)).unwrap();
        assert_eq!(doc.block_count(), blocks + 2);
        assert!(doc.contains(quote));
    }

    #[test]
    fn serialize_properties_omits_children() {
        let doc = document_with_paragraphs(&["text"]);
        let block = doc.content_blocks()[0];
        assert_eq!(
            doc.serialize_properties(block).unwrap(),
            SerializedNode::new(ids::PARAGRAPH)
        );
    }
}
