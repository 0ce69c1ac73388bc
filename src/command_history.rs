use std::{collections::VecDeque, fmt, mem, num::NonZeroUsize, sync::Arc};

use tracing::{debug, warn};

use crate::{
    batch::Batch,
    config::HistoryConfig,
    event_bus::{EventBus, HistoryEvent, StackState},
    traits::command::Command,
};

type BoxedCommand<Ctx> = Box<dyn Command<Context = Ctx>>;

enum Mode<Ctx> {
    Idle,
    /// Commands already executed but not yet committed as one undo entry.
    Batching(Vec<BoxedCommand<Ctx>>),
}

/// Undo/redo engine with command merging and atomic batches.
///
/// Both stacks keep their most recent entry at the front and evict from the back once
/// they grow past `max_stack_size`. Every transition is announced on the injected
/// [`EventBus`].
///
/// Misuse (a second `begin_batch`, a stray `end_batch`, undo during a batch) never
/// fails: it is logged with `tracing::warn!` where relevant and otherwise ignored.
/// A panic inside a command's own `execute`/`undo` propagates to the caller; the stacks
/// are not repaired afterwards.
pub struct CommandHistory<Ctx> {
    undo: VecDeque<BoxedCommand<Ctx>>,
    redo: VecDeque<BoxedCommand<Ctx>>,
    max_stack_size: usize,
    mode: Mode<Ctx>,
    events: Arc<EventBus>,
}

impl<Ctx: 'static> CommandHistory<Ctx> {
    #[must_use]
    pub fn new(events: Arc<EventBus>, config: HistoryConfig) -> Self {
        let limit = config.max_stack_size.get();

        Self {
            undo: VecDeque::with_capacity(limit.min(64)),
            redo: VecDeque::with_capacity(limit.min(64)),
            max_stack_size: limit,
            mode: Mode::Idle,
            events,
        }
    }

    /// Executes `command` and records it.
    ///
    /// Outside a batch the command is merged into the top undo entry when that entry
    /// accepts it, otherwise pushed as a new entry. The redo stack is cleared either way.
    /// Inside a batch it is only appended to the pending batch.
    pub fn execute<C>(&mut self, command: C, ctx: &mut Ctx)
    where
        C: Command<Context = Ctx> + 'static,
    {
        self.execute_boxed(Box::new(command), ctx);
    }

    pub fn execute_boxed(&mut self, command: BoxedCommand<Ctx>, ctx: &mut Ctx) {
        command.execute(ctx);

        if let Mode::Batching(pending) = &mut self.mode {
            debug!(
                kind = command.kind(),
                description = command.description(),
                pending = pending.len() + 1,
                "command added to batch"
            );
            pending.push(command);
            return;
        }

        let metadata = command.metadata().clone();

        let merged = self.undo.front().and_then(|top| {
            let mergeable = top.as_mergeable()?;
            mergeable
                .can_merge_with(&*command)
                .then(|| mergeable.merge_with(&*command))
        });

        match merged {
            Some(merged) => {
                debug!(
                    kind = merged.kind(),
                    description = merged.description(),
                    "command merged into top entry"
                );
                self.undo[0] = merged;
            }
            None => self.push_undo(command),
        }

        self.redo.clear();

        self.events.emit(&HistoryEvent::Executed { command: metadata });
        self.emit_stack_changed();
    }

    /// Undoes the most recent entry. Returns `false` if there is nothing to undo or a
    /// batch is open.
    pub fn undo(&mut self, ctx: &mut Ctx) -> bool {
        if self.is_batching() {
            warn!("undo called while a batch is in progress; ignoring");
            return false;
        }

        let Some(command) = self.undo.pop_front() else {
            return false;
        };

        command.undo(ctx);
        let metadata = command.metadata().clone();
        self.push_redo(command);

        self.events.emit(&HistoryEvent::Undone { command: metadata });
        self.emit_stack_changed();
        true
    }

    /// Re-applies the most recently undone entry. Returns `false` if there is nothing to
    /// redo or a batch is open. Never merges and never clears the rest of the redo stack.
    pub fn redo(&mut self, ctx: &mut Ctx) -> bool {
        if self.is_batching() {
            warn!("redo called while a batch is in progress; ignoring");
            return false;
        }

        let Some(command) = self.redo.pop_front() else {
            return false;
        };

        command.redo(ctx);
        let metadata = command.metadata().clone();
        self.push_undo(command);

        self.events.emit(&HistoryEvent::Redone { command: metadata });
        self.emit_stack_changed();
        true
    }

    /// Starts collecting executed commands into one undo entry.
    ///
    /// Returns `false`, leaving the open batch untouched, if a batch is already open.
    pub fn begin_batch(&mut self) -> bool {
        if let Mode::Batching(pending) = &self.mode {
            warn!(
                pending = pending.len(),
                "begin_batch called while a batch is already in progress; ignoring"
            );
            return false;
        }

        debug!("batch started");
        self.mode = Mode::Batching(Vec::new());
        true
    }

    /// Commits the open batch as a single undo entry labelled `description`.
    ///
    /// An empty batch is dropped without touching the stacks. Returns `true` only if an
    /// entry was pushed.
    pub fn end_batch(&mut self, description: impl Into<String>) -> bool {
        let pending = match mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Batching(pending) => pending,
            Mode::Idle => {
                warn!("end_batch called with no batch in progress; ignoring");
                return false;
            }
        };

        if pending.is_empty() {
            debug!("empty batch discarded");
            return false;
        }

        let batch = Batch::new(description, pending);
        debug!(
            description = batch.description(),
            commands = batch.len(),
            "batch committed"
        );
        self.push_undo(Box::new(batch));
        self.redo.clear();

        self.emit_stack_changed();
        true
    }

    /// Rolls back every command of the open batch in reverse order and discards it.
    ///
    /// Neither stack is modified. Returns `false` if no batch was open.
    pub fn cancel_batch(&mut self, ctx: &mut Ctx) -> bool {
        let pending = match mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Batching(pending) => pending,
            Mode::Idle => {
                warn!("cancel_batch called with no batch in progress; ignoring");
                return false;
            }
        };

        debug!(commands = pending.len(), "batch cancelled");
        for command in pending.iter().rev() {
            command.undo(ctx);
        }
        true
    }

    /// Empties both stacks, rolling back an open batch first.
    pub fn clear(&mut self, ctx: &mut Ctx) {
        if self.is_batching() {
            self.cancel_batch(ctx);
        }

        self.undo.clear();
        self.redo.clear();
        debug!("history cleared");

        self.emit_stack_changed();
    }

    /// Changes the stack bound, evicting the oldest entries of both stacks that no longer fit.
    ///
    /// Later moves between the stacks keep enforcing the new bound: a redo after a shrink
    /// can push the oldest undo entry out, and an undo can push the oldest redo entry out.
    pub fn set_max_stack_size(&mut self, limit: NonZeroUsize) {
        self.max_stack_size = limit.get();

        let before = self.undo.len() + self.redo.len();
        self.undo.truncate(self.max_stack_size);
        self.redo.truncate(self.max_stack_size);
        let evicted = before - (self.undo.len() + self.redo.len());

        if evicted > 0 {
            debug!(evicted, max_stack_size = self.max_stack_size, "history trimmed");
            self.emit_stack_changed();
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.undo.front().map(|command| command.description())
    }

    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.redo.front().map(|command| command.description())
    }

    #[must_use]
    pub fn undo_stack_size(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_stack_size(&self) -> usize {
        self.redo.len()
    }

    #[must_use]
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Undo labels, most recent first.
    #[must_use]
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.undo.iter().map(|command| command.description()).collect()
    }

    /// Redo labels, most recent first.
    #[must_use]
    pub fn redo_descriptions(&self) -> Vec<&str> {
        self.redo.iter().map(|command| command.description()).collect()
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        matches!(self.mode, Mode::Batching(_))
    }

    /// Number of commands collected by the open batch, zero when idle.
    #[must_use]
    pub fn pending_batch_len(&self) -> usize {
        match &self.mode {
            Mode::Batching(pending) => pending.len(),
            Mode::Idle => 0,
        }
    }

    #[must_use]
    pub fn stack_state(&self) -> StackState {
        StackState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_description: self.undo_description().map(str::to_owned),
            redo_description: self.redo_description().map(str::to_owned),
        }
    }

    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    fn push_undo(&mut self, command: BoxedCommand<Ctx>) {
        debug!(
            kind = command.kind(),
            description = command.description(),
            undo_depth = self.undo.len() + 1,
            "command pushed"
        );
        self.undo.push_front(command);

        while self.undo.len() > self.max_stack_size {
            if let Some(evicted) = self.undo.pop_back() {
                debug!(description = evicted.description(), "oldest undo entry evicted");
            }
        }
    }

    fn push_redo(&mut self, command: BoxedCommand<Ctx>) {
        self.redo.push_front(command);

        while self.redo.len() > self.max_stack_size {
            self.redo.pop_back();
        }
    }

    fn emit_stack_changed(&self) {
        self.events.emit(&HistoryEvent::StackChanged(self.stack_state()));
    }
}

impl<Ctx: 'static> Default for CommandHistory<Ctx> {
    fn default() -> Self {
        Self::new(EventBus::new(), HistoryConfig::default())
    }
}

impl<Ctx> fmt::Debug for CommandHistory<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = match &self.mode {
            Mode::Batching(pending) => Some(pending.len()),
            Mode::Idle => None,
        };

        f.debug_struct("CommandHistory")
            .field("undo", &self.undo)
            .field("redo", &self.redo)
            .field("max_stack_size", &self.max_stack_size)
            .field("batch", &pending)
            .finish_non_exhaustive()
    }
}
