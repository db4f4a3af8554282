use std::collections::{BTreeMap, HashMap};

use super::block::{Block, BlockData};
use super::DocumentError;
use crate::text::TextBlockContent;

/// Stable ids of the built-in block types.
pub mod ids {
    pub const DOCUMENT: &str = "document";
    pub const QUOTE: &str = "quote";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const CODE: &str = "code";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCategory {
    Collection,
    Text,
}

/// A named, validated string property a block type declares.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub default: &'static str,
    pub validate: fn(&str) -> bool,
}

/// Registration record of a concrete block type.
///
/// Blocks are always instantiated through their descriptor, keyed by the
/// stable `id`, which is what lets undo recreate a block of the original
/// type from serialized properties alone.
#[derive(Debug, Clone)]
pub struct BlockDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub category: BlockCategory,
    /// Whether `try_break_block` may split blocks of this type.
    pub splittable: bool,
    /// Content block type created to satisfy the non-empty invariant of a
    /// new collection.
    pub default_child: Option<&'static str>,
    pub properties: &'static [PropertyDescriptor],
}

fn heading_level_is_valid(value: &str) -> bool {
    matches!(value.parse::<u8>(), Ok(1..=6))
}

const HEADING_PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor {
    name: "level",
    default: "1",
    validate: heading_level_is_valid,
}];

pub static DOCUMENT_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    id: ids::DOCUMENT,
    display_name: "Document",
    category: BlockCategory::Collection,
    splittable: false,
    default_child: Some(ids::PARAGRAPH),
    properties: &[],
};

pub static QUOTE_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    id: ids::QUOTE,
    display_name: "Quote",
    category: BlockCategory::Collection,
    splittable: false,
    default_child: Some(ids::PARAGRAPH),
    properties: &[],
};

pub static PARAGRAPH_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    id: ids::PARAGRAPH,
    display_name: "Paragraph",
    category: BlockCategory::Text,
    splittable: true,
    default_child: None,
    properties: &[],
};

pub static HEADING_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    id: ids::HEADING,
    display_name: "Heading",
    category: BlockCategory::Text,
    splittable: true,
    default_child: None,
    properties: HEADING_PROPERTIES,
};

pub static CODE_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    id: ids::CODE,
    display_name: "Code",
    category: BlockCategory::Text,
    splittable: false,
    default_child: None,
    properties: &[],
};

impl BlockDescriptor {
    /// Creates a detached block with default property values. Collections
    /// start empty; [`Document::create_block`](super::Document::create_block)
    /// adds their default child.
    pub fn create_instance(&self) -> Block {
        let data = match self.category {
            BlockCategory::Collection => BlockData::empty_collection(),
            BlockCategory::Text => BlockData::Text(TextBlockContent::new()),
        };
        Block::new(self.id, self.default_attributes(), data)
    }

    pub fn default_attributes(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .map(|p| (p.name.to_string(), p.default.to_string()))
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Checks a property value; unknown property names are rejected too.
    pub fn validate_property(&self, name: &str, value: &str) -> Result<(), DocumentError> {
        match self.property(name) {
            Some(property) if (property.validate)(value) => Ok(()),
            _ => Err(DocumentError::InvalidProperty {
                descriptor: self.id.to_string(),
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Lookup table from stable type id to descriptor.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    descriptors: HashMap<&'static str, BlockDescriptor>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in document, quote, paragraph, heading and
    /// code block types.
    pub fn standard() -> Self {
        let descriptors = [
            &DOCUMENT_DESCRIPTOR,
            &QUOTE_DESCRIPTOR,
            &PARAGRAPH_DESCRIPTOR,
            &HEADING_DESCRIPTOR,
            &CODE_DESCRIPTOR,
        ]
        .into_iter()
        .map(|d| (d.id, d.clone()))
        .collect();
        Self { descriptors }
    }

    pub fn register(&mut self, descriptor: BlockDescriptor) -> Result<(), DocumentError> {
        if self.descriptors.contains_key(descriptor.id) {
            return Err(DocumentError::DuplicateDescriptor(descriptor.id.to_string()));
        }
        self.descriptors.insert(descriptor.id, descriptor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&BlockDescriptor, DocumentError> {
        self.descriptors
            .get(id)
            .ok_or_else(|| DocumentError::UnknownDescriptor(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDescriptor> {
        self.descriptors.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_knows_builtin_types() {
        let registry = BlockRegistry::standard();
        for id in [ids::DOCUMENT, ids::QUOTE, ids::PARAGRAPH, ids::HEADING, ids::CODE] {
            assert_eq!(registry.get(id).unwrap().id, id);
        }
        assert!(matches!(
            registry.get("table"),
            Err(DocumentError::UnknownDescriptor(id)) if id == "table"
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = BlockRegistry::standard();
        let result = registry.register(PARAGRAPH_DESCRIPTOR.clone());
        assert_eq!(
            result,
            Err(DocumentError::DuplicateDescriptor("paragraph".to_string()))
        );
    }

    #[test]
    fn heading_instances_default_to_level_one() {
        let block = HEADING_DESCRIPTOR.create_instance();
        assert_eq!(block.attribute("level"), Some("1"));
        assert!(block.text_content().is_some());
    }

    #[test]
    fn heading_level_is_validated() {
        assert!(HEADING_DESCRIPTOR.validate_property("level", "6").is_ok());
        assert!(HEADING_DESCRIPTOR.validate_property("level", "7").is_err());
        assert!(HEADING_DESCRIPTOR.validate_property("level", "two").is_err());
        assert!(HEADING_DESCRIPTOR.validate_property("colour", "red").is_err());
    }

    #[test]
    fn collections_start_empty() {
        let block = QUOTE_DESCRIPTOR.create_instance();
        assert!(block.is_collection());
        assert_eq!(block.child_count(), 0);
    }
}
