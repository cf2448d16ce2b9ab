use std::fmt;

use tracing::{error, warn};

use crate::command::Command;
use crate::error::EngineError;

/// An ordered group of commands replayed as one step.
///
/// Children execute in insertion order and undo in reverse order. When a child
/// fails part way through, the children already applied in that pass are
/// reverted before the error is returned, so the graph is left as it was.
pub struct CompoundCommand<G> {
    commands: Vec<Box<dyn Command<G>>>,
}

impl<G> Default for CompoundCommand<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> CompoundCommand<G> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: impl Command<G> + 'static) {
        self.commands.push(Box::new(command));
    }

    pub fn push_boxed(&mut self, command: Box<dyn Command<G>>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Command<G>> {
        self.commands.iter().map(|c| c.as_ref())
    }
}

impl<G> Command<G> for CompoundCommand<G> {
    fn execute(&self, graph: &mut G) -> Result<(), EngineError> {
        for (applied, command) in self.commands.iter().enumerate() {
            if let Err(err) = command.execute(graph) {
                warn!(failed_at = applied, error = %err, "compound execute failed, rolling back");
                for done in self.commands[..applied].iter().rev() {
                    if let Err(rollback) = done.undo(graph) {
                        error!(error = %rollback, "rollback of compound execute failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&self, graph: &mut G) -> Result<(), EngineError> {
        for (position, command) in self.commands.iter().enumerate().rev() {
            if let Err(err) = command.undo(graph) {
                warn!(failed_at = position, error = %err, "compound undo failed, rolling back");
                for done in &self.commands[position + 1..] {
                    if let Err(rollback) = done.execute(graph) {
                        error!(error = %rollback, "rollback of compound undo failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

impl<G> fmt::Debug for CompoundCommand<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundCommand")
            .field("commands", &self.commands)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tests::{Node, Sheet, set_x, set_y};

    #[test]
    fn undo_runs_children_in_reverse() {
        let node = Node::new("a");
        let id = node.id;
        let mut sheet = Sheet::with(node);

        // y may never drop below x, so the two edits only invert in reverse order.
        let mut compound: CompoundCommand<Sheet> = CompoundCommand::new();
        compound.push(set_y(id, 0, 10));
        compound.push(set_x(id, 0, 10));
        compound.execute(&mut sheet).unwrap();
        assert_eq!((sheet.node(id).x, sheet.node(id).y), (10, 10));

        compound.undo(&mut sheet).unwrap();
        assert_eq!((sheet.node(id).x, sheet.node(id).y), (0, 0));
        assert_eq!(sheet.changes, vec!["y", "x", "x", "y"]);
    }

    #[test]
    fn failed_execute_rolls_back_applied_children() {
        let node = Node::new("a");
        let id = node.id;
        let mut sheet = Sheet::with(node);

        let mut compound: CompoundCommand<Sheet> = CompoundCommand::new();
        compound.push(set_x(id, 0, 3));
        compound.push(set_y(id, 0, 1)); // rejected: 1 < x
        compound.push(set_x(id, 3, 4));

        let err = compound.execute(&mut sheet).unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
        assert_eq!((sheet.node(id).x, sheet.node(id).y), (0, 0));
    }

    #[test]
    fn failed_undo_reapplies_undone_children() {
        let mut node = Node::new("a");
        node.x = 1;
        let id = node.id;
        let mut sheet = Sheet::with(node);

        let mut compound: CompoundCommand<Sheet> = CompoundCommand::new();
        compound.push(set_y(id, 0, 5));
        compound.push(set_x(id, 1, 2));
        compound.execute(&mut sheet).unwrap();

        // Undo restores x=1 first, after which y=0 is rejected.
        let err = compound.undo(&mut sheet).unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
        assert_eq!((sheet.node(id).x, sheet.node(id).y), (2, 5));
    }

    #[test]
    fn empty_compound_is_a_no_op() {
        let mut sheet = Sheet::default();
        let compound: CompoundCommand<Sheet> = CompoundCommand::new();
        assert!(compound.is_empty());
        compound.execute(&mut sheet).unwrap();
        compound.undo(&mut sheet).unwrap();
        assert_eq!(sheet.relayouts, 0);
    }
}
