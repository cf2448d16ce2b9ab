use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use erd_core::EditorConfig;
use tracing::{debug, error, warn};

use crate::command::Command;
use crate::compound::CompoundCommand;
use crate::error::EngineError;

/// Records commands applied to a graph `G` and replays them backwards and
/// forwards.
///
/// All methods take `&self` so the manager can be shared (typically through an
/// `Rc`) with the graph listeners that feed it. While the manager replays a
/// command it holds changes: anything added during that window, such as the
/// notifications caused by the replay itself, is dropped.
pub struct UndoManager<G> {
    past: RefCell<VecDeque<Box<dyn Command<G>>>>,
    undone: RefCell<Vec<Box<dyn Command<G>>>>,
    tracking: RefCell<Vec<CompoundCommand<G>>>,
    holding: Cell<bool>,
    max_depth: Option<usize>,
}

/// Sets the holding flag for its lifetime and restores the previous value on
/// every exit path, unwinding included.
struct HoldGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> HoldGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for HoldGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl<G: 'static> Default for UndoManager<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: 'static> UndoManager<G> {
    /// A manager with unbounded history.
    pub fn new() -> Self {
        Self {
            past: RefCell::new(VecDeque::new()),
            undone: RefCell::new(Vec::new()),
            tracking: RefCell::new(Vec::new()),
            holding: Cell::new(false),
            max_depth: None,
        }
    }

    /// A manager keeping at most `max_depth` undo steps; the oldest is dropped first.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::new()
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            max_depth: config.undo_depth,
            ..Self::new()
        }
    }

    /// Record a command that has already been applied to the graph.
    ///
    /// Inside a tracking bracket the command joins the innermost open
    /// compound. Otherwise it becomes the newest undo step and the redo
    /// history is discarded. Ignored while the manager is replaying.
    pub fn add(&self, command: impl Command<G> + 'static) {
        self.add_boxed(Box::new(command));
    }

    pub fn add_boxed(&self, command: Box<dyn Command<G>>) {
        if self.holding.get() {
            debug!(?command, "dropping command recorded during replay");
            return;
        }
        if let Some(open) = self.tracking.borrow_mut().last_mut() {
            open.push_boxed(command);
            return;
        }

        self.undone.borrow_mut().clear();
        let mut past = self.past.borrow_mut();
        past.push_back(command);
        if let Some(max) = self.max_depth {
            while past.len() > max {
                past.pop_front();
            }
        }
        debug!(depth = past.len(), "command recorded");
    }

    /// Revert the most recent command. Returns `Ok(false)` when there is
    /// nothing to undo.
    ///
    /// A failing command is dropped from history and its error returned: the
    /// graph has diverged from what the history describes.
    pub fn undo_command(&self, graph: &mut G) -> Result<bool, EngineError> {
        if self.holding.get() {
            warn!("undo requested during replay, ignored");
            return Ok(false);
        }
        let Some(command) = self.past.borrow_mut().pop_back() else {
            return Ok(false);
        };
        {
            let _hold = HoldGuard::engage(&self.holding);
            if let Err(err) = command.undo(graph) {
                error!(?command, error = %err, "undo failed");
                return Err(err);
            }
        }
        self.undone.borrow_mut().push(command);
        debug!(undo = self.undo_depth(), redo = self.redo_depth(), "undo applied");
        Ok(true)
    }

    /// Re-apply the most recently undone command. Returns `Ok(false)` when
    /// there is nothing to redo.
    pub fn redo_command(&self, graph: &mut G) -> Result<bool, EngineError> {
        if self.holding.get() {
            warn!("redo requested during replay, ignored");
            return Ok(false);
        }
        let Some(command) = self.undone.borrow_mut().pop() else {
            return Ok(false);
        };
        {
            let _hold = HoldGuard::engage(&self.holding);
            if let Err(err) = command.execute(graph) {
                error!(?command, error = %err, "redo failed");
                return Err(err);
            }
        }
        self.past.borrow_mut().push_back(command);
        debug!(undo = self.undo_depth(), redo = self.redo_depth(), "redo applied");
        Ok(true)
    }

    /// Open a compound that collects every command added until the matching
    /// [`end_tracking`](Self::end_tracking). Brackets nest.
    pub fn start_tracking(&self) {
        let mut tracking = self.tracking.borrow_mut();
        tracking.push(CompoundCommand::new());
        debug!(depth = tracking.len(), "tracking started");
    }

    /// Close the innermost compound and record it, unless it is empty.
    pub fn end_tracking(&self) {
        let Some(compound) = self.tracking.borrow_mut().pop() else {
            debug!("end_tracking without matching start_tracking");
            return;
        };
        debug!(depth = self.tracking_depth(), size = compound.len(), "tracking ended");
        if !compound.is_empty() {
            self.add(compound);
        }
    }

    /// Forget all history and open compounds, e.g. after loading a new document.
    pub fn clear(&self) {
        self.past.borrow_mut().clear();
        self.undone.borrow_mut().clear();
        self.tracking.borrow_mut().clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.borrow().is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.borrow().len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.borrow().len()
    }

    pub fn is_tracking(&self) -> bool {
        !self.tracking.borrow().is_empty()
    }

    pub fn tracking_depth(&self) -> usize {
        self.tracking.borrow().len()
    }

    pub fn is_holding(&self) -> bool {
        self.holding.get()
    }
}

impl<G> std::fmt::Debug for UndoManager<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("past", &self.past.borrow().len())
            .field("undone", &self.undone.borrow().len())
            .field("tracking", &self.tracking.borrow().len())
            .field("holding", &self.holding.get())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
