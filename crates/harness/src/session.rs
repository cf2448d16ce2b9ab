use std::rc::Rc;

use erd_core::{EditorConfig, Element, ElementId, ListenerId, PropertyValue};
use erd_engine::{
    Command, ElementStore, EngineError, Graph, InsertElementCommand, ObservableGraph,
    PropertyChange, PropertyChangeTracker, RemoveElementCommand, UndoManager, set_property,
};
use tracing::{debug, info};

use crate::diagram::{Association, Diagram, Table};
use crate::recorder::UndoRecorder;

/// An open diagram together with its undo history.
///
/// Every mutation goes through the session so it lands in the history in the
/// right shape: structural edits as explicit commands, single property writes
/// through the [`UndoRecorder`] listener, and free-form table edits through a
/// property snapshot diff.
pub struct EditorSession {
    diagram: Diagram,
    history: Rc<UndoManager<Diagram>>,
    tracker: PropertyChangeTracker<Table>,
    config: EditorConfig,
    recorder: ListenerId,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let history = Rc::new(UndoManager::from_config(&config));
        let mut diagram = Diagram::new();
        let recorder = diagram.add_listener(Box::new(UndoRecorder::new(history.clone())));
        Self {
            diagram,
            history,
            tracker: PropertyChangeTracker::new(),
            config,
            recorder,
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Mutable access that bypasses the history. Listeners still fire.
    pub fn diagram_mut(&mut self) -> &mut Diagram {
        &mut self.diagram
    }

    pub fn history(&self) -> &UndoManager<Diagram> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn recorder(&self) -> ListenerId {
        self.recorder
    }

    pub fn add_table(&mut self, name: &str, columns: &[&str]) -> Result<ElementId, EngineError> {
        let command = InsertElementCommand::new(Table::new(name).with_columns(columns));
        let id = command.element_id();
        command.execute(&mut self.diagram)?;
        self.history.add(command);
        debug!(table = %id, name, "table added");
        Ok(id)
    }

    pub fn connect(&mut self, start: ElementId, end: ElementId) -> Result<ElementId, EngineError> {
        let command = InsertElementCommand::new(Association::new(start, end));
        let id = command.element_id();
        command.execute(&mut self.diagram)?;
        self.history.add(command);
        debug!(association = %id, %start, %end, "tables connected");
        Ok(id)
    }

    /// Remove a table and every association touching it as one undo step.
    pub fn remove_table(&mut self, id: ElementId) -> Result<(), EngineError> {
        if self.diagram.table(id).is_none() {
            return Err(EngineError::ElementNotFound(id));
        }
        let history = &self.history;
        history.start_tracking();
        let result = self.diagram.compound_operation(|diagram| -> Result<(), EngineError> {
            for link in diagram.associations_of(id) {
                if let Some(command) = RemoveElementCommand::<Association>::capture(&*diagram, link) {
                    command.execute(diagram)?;
                    history.add(command);
                }
            }
            let command = RemoveElementCommand::<Table>::capture(&*diagram, id)
                .ok_or(EngineError::ElementNotFound(id))?;
            command.execute(diagram)?;
            history.add(command);
            Ok(())
        });
        // Whatever was removed before a failure stays undoable.
        history.end_tracking();
        result
    }

    /// Write one table property. The change is recorded by the listener.
    pub fn set_table_property(
        &mut self,
        id: ElementId,
        property: &str,
        value: PropertyValue,
    ) -> Result<bool, EngineError> {
        self.write::<Table>(id, property, value)
    }

    pub fn set_association_property(
        &mut self,
        id: ElementId,
        property: &str,
        value: PropertyValue,
    ) -> Result<bool, EngineError> {
        self.write::<Association>(id, property, value)
    }

    fn write<E>(&mut self, id: ElementId, property: &str, value: PropertyValue) -> Result<bool, EngineError>
    where
        E: Element,
        Diagram: ElementStore<E>,
    {
        let written = set_property::<E, _>(&mut self.diagram, id, property, value)?;
        if written {
            self.diagram.request_relayout();
        }
        Ok(written)
    }

    /// Apply arbitrary edits to a table and record whatever properties they
    /// changed as one undo step. Returns the number of changed properties.
    ///
    /// Listeners see one `property_changed` per changed property, bracketed as
    /// a compound operation. Recording goes through the session's recorder,
    /// the same as for [`set_table_property`](Self::set_table_property).
    pub fn edit_table(
        &mut self,
        id: ElementId,
        edit: impl FnOnce(&mut Table),
    ) -> Result<usize, EngineError> {
        let table = self.diagram.table(id).ok_or(EngineError::ElementNotFound(id))?;
        self.tracker.start_tracking_property_change(table);
        if let Some(table) = self.diagram.table_mut(id) {
            edit(table);
        }
        let changes = self.tracker.take_property_changes(&self.diagram);
        if changes.is_empty() {
            return Ok(0);
        }

        let history = &self.history;
        history.start_tracking();
        self.diagram.compound_operation(|diagram| {
            for change in &changes {
                diagram.property_changed(PropertyChange {
                    element: change.element(),
                    kind: Table::KIND,
                    property: change.property(),
                    old: Some(change.old_value()),
                    new: change.new_value(),
                });
            }
        });
        history.end_tracking();
        self.diagram.request_relayout();
        Ok(changes.len())
    }

    pub fn undo(&mut self) -> Result<bool, EngineError> {
        self.history.undo_command(&mut self.diagram)
    }

    pub fn redo(&mut self) -> Result<bool, EngineError> {
        self.history.redo_command(&mut self.diagram)
    }

    /// Replace the open diagram. History recorded against the previous one is
    /// meaningless afterwards and is cleared. Returns the previous diagram.
    pub fn load(&mut self, diagram: Diagram) -> Diagram {
        let mut previous = std::mem::replace(&mut self.diagram, diagram);
        previous.remove_listener(self.recorder);
        self.recorder = self
            .diagram
            .add_listener(Box::new(UndoRecorder::new(self.history.clone())));
        self.history.clear();
        info!(
            tables = self.diagram.table_count(),
            associations = self.diagram.association_count(),
            "diagram loaded"
        );
        previous
    }

    /// Property names and values of one element in configured display order.
    /// Unreadable properties are listed with `None`.
    pub fn property_panel<E>(
        &self,
        id: ElementId,
    ) -> Result<Vec<(&'static str, Option<PropertyValue>)>, EngineError>
    where
        E: Element,
        Diagram: ElementStore<E>,
    {
        let element = ElementStore::<E>::element(&self.diagram, id)
            .ok_or(EngineError::ElementNotFound(id))?;
        let schema = E::schema();
        Ok(schema
            .display_order(&self.config.property_order)
            .into_iter()
            .map(|descriptor| {
                let value = descriptor.read(element, schema.type_name()).ok();
                (descriptor.name(), value)
            })
            .collect())
    }
}
