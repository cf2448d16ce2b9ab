use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use erd_core::{
    CoreError, Element, ElementId, ElementKind, ListenerId, MultiLineString, PropertySchema,
    PropertyValue,
};
use erd_engine::{
    ElementStore, EngineError, Graph, GraphListeners, GraphModificationListener, ObservableGraph,
    PropertyChange,
};

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    id: ElementId,
    name: String,
    columns: Vec<String>,
    comment: MultiLineString,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            id: ElementId::new(),
            name: name.to_string(),
            columns: Vec::new(),
            comment: MultiLineString::default(),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn add_column(&mut self, column: &str) {
        self.columns.push(column.to_string());
    }

    pub fn remove_column(&mut self, column: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c != column);
        self.columns.len() != before
    }

    pub fn comment(&self) -> &MultiLineString {
        &self.comment
    }

    pub fn comment_mut(&mut self) -> &mut MultiLineString {
        &mut self.comment
    }

    /// The first column, by convention.
    pub fn primary_key(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

static TABLE_SCHEMA: LazyLock<PropertySchema<Table>> = LazyLock::new(|| {
    PropertySchema::<Table>::builder("Table")
        .read_only("id", |t| Ok(PropertyValue::ElementRef(t.id)))
        .property(
            "name",
            |t| Ok(PropertyValue::text(&t.name)),
            |t, v| {
                t.name = v.into_text("name")?;
                Ok(())
            },
        )
        .property(
            "columns",
            |t| Ok(PropertyValue::List(t.columns.clone())),
            |t, v| {
                t.columns = v.into_list("columns")?;
                Ok(())
            },
        )
        .property(
            "comment",
            |t| Ok(PropertyValue::Lines(t.comment.clone())),
            |t, v| {
                t.comment = v.into_lines("comment")?;
                Ok(())
            },
        )
        .read_only("primary_key", |t| {
            t.primary_key()
                .map(|pk| PropertyValue::text(pk))
                .ok_or(CoreError::UnreadableProperty {
                    type_name: "Table",
                    property: "primary_key",
                })
        })
        .build()
});

impl Element for Table {
    const KIND: ElementKind = ElementKind::Entity;

    fn id(&self) -> ElementId {
        self.id
    }

    fn schema() -> &'static PropertySchema<Self> {
        &TABLE_SCHEMA
    }
}

// ============================================================================
// Associations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directionality {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl Directionality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Start => "start",
            Self::End => "end",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Directionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directionality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "both" => Ok(Self::Both),
            other => Err(CoreError::InvalidValue {
                property: "directionality",
                reason: format!("unknown directionality {other:?}"),
            }),
        }
    }
}

/// A foreign-key style link from a column of one table to a column of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    id: ElementId,
    start: ElementId,
    end: ElementId,
    directionality: Directionality,
    start_column: String,
    end_column: String,
}

impl Association {
    pub fn new(start: ElementId, end: ElementId) -> Self {
        Self {
            id: ElementId::new(),
            start,
            end,
            directionality: Directionality::default(),
            start_column: String::new(),
            end_column: String::new(),
        }
    }

    pub fn start(&self) -> ElementId {
        self.start
    }

    pub fn end(&self) -> ElementId {
        self.end
    }

    pub fn directionality(&self) -> Directionality {
        self.directionality
    }

    pub fn start_column(&self) -> &str {
        &self.start_column
    }

    pub fn end_column(&self) -> &str {
        &self.end_column
    }

    pub fn touches(&self, table: ElementId) -> bool {
        self.start == table || self.end == table
    }
}

static ASSOCIATION_SCHEMA: LazyLock<PropertySchema<Association>> = LazyLock::new(|| {
    PropertySchema::<Association>::builder("Association")
        .read_only("start", |a| Ok(PropertyValue::ElementRef(a.start)))
        .read_only("end", |a| Ok(PropertyValue::ElementRef(a.end)))
        .property(
            "directionality",
            |a| Ok(PropertyValue::text(a.directionality.as_str())),
            |a, v| {
                a.directionality = v.into_text("directionality")?.parse()?;
                Ok(())
            },
        )
        .property(
            "start_column",
            |a| Ok(PropertyValue::text(&a.start_column)),
            |a, v| {
                a.start_column = v.into_text("start_column")?;
                Ok(())
            },
        )
        .property(
            "end_column",
            |a| Ok(PropertyValue::text(&a.end_column)),
            |a, v| {
                a.end_column = v.into_text("end_column")?;
                Ok(())
            },
        )
        .build()
});

impl Element for Association {
    const KIND: ElementKind = ElementKind::Relation;

    fn id(&self) -> ElementId {
        self.id
    }

    fn schema() -> &'static PropertySchema<Self> {
        &ASSOCIATION_SCHEMA
    }
}

// ============================================================================
// Diagram
// ============================================================================

/// Element contents of a diagram, without listeners or counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramContents {
    pub tables: BTreeMap<ElementId, Table>,
    pub associations: BTreeMap<ElementId, Association>,
}

/// An entity-relationship diagram: tables connected by associations.
#[derive(Debug, Default)]
pub struct Diagram {
    tables: BTreeMap<ElementId, Table>,
    associations: BTreeMap<ElementId, Association>,
    listeners: GraphListeners,
    relayout_requests: usize,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn GraphModificationListener>) -> ListenerId {
        self.listeners.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn GraphModificationListener>> {
        self.listeners.remove_listener(id)
    }

    pub fn table(&self, id: ElementId) -> Option<&Table> {
        self.tables.get(&id)
    }

    /// Direct access for multi-field edits. No notifications are sent.
    pub fn table_mut(&mut self, id: ElementId) -> Option<&mut Table> {
        self.tables.get_mut(&id)
    }

    pub fn association(&self, id: ElementId) -> Option<&Association> {
        self.associations.get(&id)
    }

    pub fn association_mut(&mut self, id: ElementId) -> Option<&mut Association> {
        self.associations.get_mut(&id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    /// Associations with `table` at either end.
    pub fn associations_of(&self, table: ElementId) -> Vec<ElementId> {
        self.associations
            .values()
            .filter(|a| a.touches(table))
            .map(|a| a.id)
            .collect()
    }

    pub fn relayout_requests(&self) -> usize {
        self.relayout_requests
    }

    pub fn contents(&self) -> DiagramContents {
        DiagramContents {
            tables: self.tables.clone(),
            associations: self.associations.clone(),
        }
    }
}

impl Graph for Diagram {
    fn request_relayout(&mut self) {
        self.relayout_requests += 1;
    }

    fn property_changed(&mut self, change: PropertyChange<'_>) {
        self.listeners.property_changed(change);
    }
}

impl ObservableGraph for Diagram {
    fn listeners_mut(&mut self) -> &mut GraphListeners {
        &mut self.listeners
    }
}

impl ElementStore<Table> for Diagram {
    fn element(&self, id: ElementId) -> Option<&Table> {
        self.tables.get(&id)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Table> {
        self.tables.get_mut(&id)
    }

    fn insert(&mut self, element: Table) -> Result<(), EngineError> {
        let id = element.id;
        if self.tables.contains_key(&id) {
            return Err(EngineError::DuplicateElement(id));
        }
        self.tables.insert(id, element);
        self.listeners.entity_added(id);
        Ok(())
    }

    fn remove(&mut self, id: ElementId) -> Option<Table> {
        let table = self.tables.remove(&id)?;
        self.listeners.entity_removed(id);
        Some(table)
    }
}

impl ElementStore<Association> for Diagram {
    fn element(&self, id: ElementId) -> Option<&Association> {
        self.associations.get(&id)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Association> {
        self.associations.get_mut(&id)
    }

    fn insert(&mut self, element: Association) -> Result<(), EngineError> {
        let id = element.id;
        if self.associations.contains_key(&id) {
            return Err(EngineError::DuplicateElement(id));
        }
        for end in [element.start, element.end] {
            if !self.tables.contains_key(&end) {
                return Err(EngineError::ElementNotFound(end));
            }
        }
        self.associations.insert(id, element);
        self.listeners.relation_added(id);
        Ok(())
    }

    fn remove(&mut self, id: ElementId) -> Option<Association> {
        let association = self.associations.remove(&id)?;
        self.listeners.relation_removed(id);
        Some(association)
    }
}
