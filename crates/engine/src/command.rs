use std::fmt;
use std::marker::PhantomData;

use erd_core::{Element, ElementId, PropertyValue, Snapshot};
use tracing::debug;

use crate::error::EngineError;
use crate::listener::PropertyChange;

/// A reversible unit of change applied to a graph `G`.
///
/// `execute` is only valid while the change is not applied and `undo` only
/// while it is. A failure of either means the graph no longer matches the
/// history the command was recorded against.
pub trait Command<G>: fmt::Debug {
    fn execute(&self, graph: &mut G) -> Result<(), EngineError>;

    fn undo(&self, graph: &mut G) -> Result<(), EngineError>;
}

/// The edited graph, as seen by commands.
pub trait Graph {
    /// Ask the graph to recompute its visual layout.
    fn request_relayout(&mut self);

    /// Hook invoked after a command or [`set_property`] wrote a property.
    fn property_changed(&mut self, _change: PropertyChange<'_>) {}
}

/// Storage of one element type inside a graph.
pub trait ElementStore<E: Element>: Graph {
    fn element(&self, id: ElementId) -> Option<&E>;

    fn element_mut(&mut self, id: ElementId) -> Option<&mut E>;

    fn insert(&mut self, element: E) -> Result<(), EngineError>;

    fn remove(&mut self, id: ElementId) -> Option<E>;
}

/// Write a property through the element's schema and notify the graph.
///
/// This is the path interactive edits take; the resulting
/// [`Graph::property_changed`] notification is what observers turn into
/// undoable commands. Returns `false` when the property is read-only.
pub fn set_property<E, G>(
    graph: &mut G,
    id: ElementId,
    property: &str,
    value: PropertyValue,
) -> Result<bool, EngineError>
where
    E: Element,
    G: ElementStore<E>,
{
    let schema = E::schema();
    let index = schema.index_of(property).ok_or_else(|| {
        EngineError::Core(erd_core::CoreError::UnknownProperty {
            type_name: schema.type_name(),
            property: property.to_string(),
        })
    })?;
    let element = graph.element(id).ok_or(EngineError::ElementNotFound(id))?;
    let old = schema
        .get(index)
        .and_then(|d| d.read(element, schema.type_name()).ok());
    write_property::<E, G>(graph, id, index, old.as_ref(), &value)
}

fn write_property<E, G>(
    graph: &mut G,
    id: ElementId,
    index: usize,
    old: Option<&PropertyValue>,
    new: &PropertyValue,
) -> Result<bool, EngineError>
where
    E: Element,
    G: ElementStore<E>,
{
    let schema = E::schema();
    let descriptor = schema.get(index).ok_or(EngineError::UnknownPropertyIndex {
        type_name: schema.type_name(),
        index,
    })?;
    let element = graph.element_mut(id).ok_or(EngineError::ElementNotFound(id))?;
    if !descriptor.write(element, new.snapshot())? {
        debug!(element = %id, property = descriptor.name(), "read-only property, write skipped");
        return Ok(false);
    }
    graph.property_changed(PropertyChange {
        element: id,
        kind: E::KIND,
        property: descriptor.name(),
        old,
        new,
    });
    Ok(true)
}

/// Changes one property of one element between two captured values.
pub struct PropertyChangeCommand<E> {
    element: ElementId,
    index: usize,
    old: PropertyValue,
    new: PropertyValue,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Element> PropertyChangeCommand<E> {
    /// `index` addresses the property in `E::schema()`. Both values are stored
    /// as snapshots so later edits of the element cannot alter them.
    pub(crate) fn new(element: ElementId, index: usize, old: &PropertyValue, new: &PropertyValue) -> Self {
        Self {
            element,
            index,
            old: old.snapshot(),
            new: new.snapshot(),
            _marker: PhantomData,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn property(&self) -> &'static str {
        E::schema().get(self.index).map_or("<unknown>", |d| d.name())
    }

    pub fn old_value(&self) -> &PropertyValue {
        &self.old
    }

    pub fn new_value(&self) -> &PropertyValue {
        &self.new
    }

    fn apply<G: ElementStore<E>>(
        &self,
        graph: &mut G,
        from: &PropertyValue,
        to: &PropertyValue,
    ) -> Result<(), EngineError> {
        write_property::<E, G>(graph, self.element, self.index, Some(from), to)?;
        graph.request_relayout();
        Ok(())
    }
}

impl<E: Element, G: ElementStore<E>> Command<G> for PropertyChangeCommand<E> {
    fn execute(&self, graph: &mut G) -> Result<(), EngineError> {
        self.apply(graph, &self.old, &self.new)
    }

    fn undo(&self, graph: &mut G) -> Result<(), EngineError> {
        self.apply(graph, &self.new, &self.old)
    }
}

impl<E: Element> fmt::Debug for PropertyChangeCommand<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeCommand")
            .field("type", &E::schema().type_name())
            .field("element", &self.element)
            .field("property", &self.property())
            .field("old", &self.old)
            .field("new", &self.new)
            .finish()
    }
}

/// Adds an element to the graph; undo removes it again.
pub struct InsertElementCommand<E> {
    element: E,
}

impl<E: Element + Clone> InsertElementCommand<E> {
    pub fn new(element: E) -> Self {
        Self { element }
    }

    pub fn element_id(&self) -> ElementId {
        self.element.id()
    }
}

impl<E: Element + Clone, G: ElementStore<E>> Command<G> for InsertElementCommand<E> {
    fn execute(&self, graph: &mut G) -> Result<(), EngineError> {
        graph.insert(self.element.clone())?;
        graph.request_relayout();
        Ok(())
    }

    fn undo(&self, graph: &mut G) -> Result<(), EngineError> {
        let id = self.element.id();
        graph.remove(id).ok_or(EngineError::ElementNotFound(id))?;
        graph.request_relayout();
        Ok(())
    }
}

impl<E: Element> fmt::Debug for InsertElementCommand<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertElementCommand")
            .field("type", &E::schema().type_name())
            .field("element", &self.element.id())
            .finish()
    }
}

/// Removes an element from the graph; undo puts back the state captured
/// when the command was created.
pub struct RemoveElementCommand<E> {
    element: E,
}

impl<E: Element + Clone> RemoveElementCommand<E> {
    /// Capture the current state of `id`. `None` if the graph has no such element.
    pub fn capture<G: ElementStore<E>>(graph: &G, id: ElementId) -> Option<Self> {
        graph.element(id).map(|element| Self {
            element: element.clone(),
        })
    }

    pub fn element_id(&self) -> ElementId {
        self.element.id()
    }
}

impl<E: Element + Clone, G: ElementStore<E>> Command<G> for RemoveElementCommand<E> {
    fn execute(&self, graph: &mut G) -> Result<(), EngineError> {
        let id = self.element.id();
        graph.remove(id).ok_or(EngineError::ElementNotFound(id))?;
        graph.request_relayout();
        Ok(())
    }

    fn undo(&self, graph: &mut G) -> Result<(), EngineError> {
        graph.insert(self.element.clone())?;
        graph.request_relayout();
        Ok(())
    }
}

impl<E: Element> fmt::Debug for RemoveElementCommand<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoveElementCommand")
            .field("type", &E::schema().type_name())
            .field("element", &self.element.id())
            .finish()
    }
}
