use std::marker::PhantomData;

use erd_core::{Element, ElementId, PropertyValue, Snapshot};
use tracing::{debug, warn};

use crate::command::{ElementStore, PropertyChangeCommand};
use crate::compound::CompoundCommand;

/// One captured property value.
#[derive(Debug, Clone, PartialEq)]
enum Captured {
    Known(PropertyValue),
    /// The getter failed or does not exist. Never compared.
    Unknown,
}

struct Tracked {
    element: ElementId,
    values: Vec<Captured>,
}

/// Derives undoable commands by diffing an element's properties before and
/// after an edit.
///
/// ```ignore
/// tracker.start_tracking_property_change(diagram.table(id)?);
/// // ... arbitrary edits to the table ...
/// let compound = tracker.stop_tracking_property_change(&diagram);
/// ```
pub struct PropertyChangeTracker<E> {
    tracked: Option<Tracked>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Element> Default for PropertyChangeTracker<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> PropertyChangeTracker<E> {
    pub fn new() -> Self {
        Self {
            tracked: None,
            _marker: PhantomData,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }

    pub fn tracked_element(&self) -> Option<ElementId> {
        self.tracked.as_ref().map(|t| t.element)
    }

    /// Snapshot every property of `element`. Replaces any snapshot in progress.
    pub fn start_tracking_property_change(&mut self, element: &E) {
        if let Some(previous) = &self.tracked {
            debug!(element = %previous.element, "discarding unfinished property snapshot");
        }
        self.tracked = Some(Tracked {
            element: element.id(),
            values: capture(element),
        });
    }

    /// Compare the element's current properties against the snapshot and
    /// return one command per changed property, in schema order.
    ///
    /// The compound may be empty. Properties unreadable on either side are
    /// left out, as is everything when nothing is being tracked or the element
    /// has left the graph.
    pub fn stop_tracking_property_change<G>(&mut self, graph: &G) -> CompoundCommand<G>
    where
        G: ElementStore<E> + 'static,
    {
        let mut compound = CompoundCommand::new();
        for command in self.take_property_changes(graph) {
            compound.push(command);
        }
        compound
    }

    /// Same diff as [`stop_tracking_property_change`](Self::stop_tracking_property_change),
    /// returned as individual commands so the caller can inspect each change.
    pub fn take_property_changes<G>(&mut self, graph: &G) -> Vec<PropertyChangeCommand<E>>
    where
        G: ElementStore<E>,
    {
        let Some(tracked) = self.tracked.take() else {
            debug!("property diff requested without a snapshot");
            return Vec::new();
        };
        let Some(element) = graph.element(tracked.element) else {
            warn!(element = %tracked.element, "tracked element no longer in graph");
            return Vec::new();
        };

        let current = capture(element);
        let changes: Vec<_> = tracked
            .values
            .iter()
            .zip(&current)
            .enumerate()
            .filter_map(|(index, pair)| match pair {
                (Captured::Known(old), Captured::Known(new)) if old != new => {
                    Some(PropertyChangeCommand::new(tracked.element, index, old, new))
                }
                _ => None,
            })
            .collect();
        debug!(
            element = %tracked.element,
            changed = changes.len(),
            "property diff complete"
        );
        changes
    }
}

/// Build a command for a property change the caller already knows about.
///
/// Returns `None` when `property` is not part of `E`'s schema.
pub fn create_property_change_command<E: Element>(
    element: ElementId,
    property: &str,
    old: &PropertyValue,
    new: &PropertyValue,
) -> Option<PropertyChangeCommand<E>> {
    let schema = E::schema();
    match schema.index_of(property) {
        Some(index) => Some(PropertyChangeCommand::new(element, index, old, new)),
        None => {
            debug!(type_name = schema.type_name(), property, "no such property");
            None
        }
    }
}

fn capture<E: Element>(element: &E) -> Vec<Captured> {
    let schema = E::schema();
    schema
        .iter()
        .map(|descriptor| match descriptor.read(element, schema.type_name()) {
            Ok(value) => Captured::Known(value.snapshot()),
            Err(err) => {
                debug!(property = descriptor.name(), error = %err, "property not captured");
                Captured::Unknown
            }
        })
        .collect()
}
