use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Presentation index of element properties, keyed by element type name.
///
/// The order does not have to be total: any property without an entry
/// reports index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOrder {
    indices: BTreeMap<String, BTreeMap<String, u32>>,
}

impl PropertyOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, type_name: &str, property: &str, index: u32) -> Self {
        self.set_index(type_name, property, index);
        self
    }

    pub fn set_index(&mut self, type_name: &str, property: &str, index: u32) {
        self.indices
            .entry(type_name.to_string())
            .or_default()
            .insert(property.to_string(), index);
    }

    pub fn index(&self, type_name: &str, property: &str) -> u32 {
        self.indices
            .get(type_name)
            .and_then(|props| props.get(property))
            .copied()
            .unwrap_or(0)
    }
}

/// Settings for one editor session. Built at startup and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo steps kept; `None` keeps everything.
    pub undo_depth: Option<usize>,
    pub property_order: PropertyOrder,
}

impl EditorConfig {
    /// Keep at most `depth` undo steps, dropping the oldest first.
    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = Some(depth);
        self
    }

    pub fn with_property_order(mut self, property_order: PropertyOrder) -> Self {
        self.property_order = property_order;
        self
    }
}
