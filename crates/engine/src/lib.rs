pub mod command;
pub mod compound;
pub mod error;
pub mod listener;
pub mod tracker;
pub mod undo;

pub use command::{
    Command, ElementStore, Graph, InsertElementCommand, PropertyChangeCommand,
    RemoveElementCommand, set_property,
};
pub use compound::CompoundCommand;
pub use error::EngineError;
pub use listener::{GraphListeners, GraphModificationListener, ObservableGraph, PropertyChange};
pub use tracker::{PropertyChangeTracker, create_property_change_command};
pub use undo::UndoManager;
