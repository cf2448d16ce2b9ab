use std::rc::Rc;

use erd_core::ElementKind;
use erd_engine::{
    Command, GraphModificationListener, PropertyChange, UndoManager, create_property_change_command,
};
use tracing::debug;

use crate::diagram::{Association, Diagram, Table};

/// Turns property-change notifications into undoable commands.
///
/// Registered on a [`Diagram`] so that interactive single-property edits are
/// recorded without the caller building commands by hand. Notifications raised
/// while the manager replays history are dropped by the manager itself.
pub struct UndoRecorder {
    history: Rc<UndoManager<Diagram>>,
}

impl UndoRecorder {
    pub fn new(history: Rc<UndoManager<Diagram>>) -> Self {
        Self { history }
    }
}

impl GraphModificationListener for UndoRecorder {
    fn property_changed(&mut self, change: PropertyChange<'_>) {
        // Without the previous value there is nothing to undo back to.
        let Some(old) = change.old else {
            debug!(
                element = %change.element,
                property = change.property,
                "previous value unknown, change not recordable"
            );
            return;
        };
        let command: Option<Box<dyn Command<Diagram>>> = match change.kind {
            ElementKind::Entity => create_property_change_command::<Table>(
                change.element,
                change.property,
                old,
                change.new,
            )
            .map(|cmd| Box::new(cmd) as Box<dyn Command<Diagram>>),
            ElementKind::Relation => create_property_change_command::<Association>(
                change.element,
                change.property,
                old,
                change.new,
            )
            .map(|cmd| Box::new(cmd) as Box<dyn Command<Diagram>>),
        };
        match command {
            Some(command) => self.history.add_boxed(command),
            None => debug!(
                kind = change.kind.as_str(),
                property = change.property,
                "change not recordable"
            ),
        }
    }
}
