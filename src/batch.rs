use std::{any::Any, fmt};

use crate::traits::command::{Command, CommandMetadata};

/// Kind tag carried by every [`Batch`].
pub const BATCH_KIND: &str = "batch";

/// A composite command that executes and undoes a sequence of commands as one undo step.
///
/// Sub-commands replay in their original order and undo in strict reverse order. The batch
/// owns them outright; nothing else references a sub-command once it is inside a batch.
pub struct Batch<Ctx> {
    commands: Vec<Box<dyn Command<Context = Ctx>>>,
    metadata: CommandMetadata,
}

impl<Ctx> Batch<Ctx> {
    /// Wraps already ordered commands under a single description.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        commands: Vec<Box<dyn Command<Context = Ctx>>>,
    ) -> Self {
        Self {
            commands,
            metadata: CommandMetadata::new(BATCH_KIND, description),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sub-commands in execution order.
    #[must_use]
    pub fn commands(&self) -> &[Box<dyn Command<Context = Ctx>>] {
        &self.commands
    }
}

impl<Ctx: 'static> Command for Batch<Ctx> {
    type Context = Ctx;

    fn execute(&self, ctx: &mut Ctx) {
        for command in &self.commands {
            command.execute(ctx);
        }
    }

    fn undo(&self, ctx: &mut Ctx) {
        for command in self.commands.iter().rev() {
            command.undo(ctx);
        }
    }

    fn redo(&self, ctx: &mut Ctx) {
        for command in &self.commands {
            command.redo(ctx);
        }
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<Ctx> fmt::Debug for Batch<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("description", &self.metadata.description)
            .field("commands", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        name: &'static str,
        meta: CommandMetadata,
    }

    impl Record {
        fn boxed(name: &'static str) -> Box<dyn Command<Context = Vec<String>>> {
            Box::new(Self {
                name,
                meta: CommandMetadata::new("record", name),
            })
        }
    }

    impl Command for Record {
        type Context = Vec<String>;

        fn execute(&self, ctx: &mut Vec<String>) {
            ctx.push(format!("execute:{}", self.name));
        }

        fn undo(&self, ctx: &mut Vec<String>) {
            ctx.push(format!("undo:{}", self.name));
        }

        fn metadata(&self) -> &CommandMetadata {
            &self.meta
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn batch() -> Batch<Vec<String>> {
        Batch::new(
            "Move selection",
            vec![Record::boxed("a"), Record::boxed("b"), Record::boxed("c")],
        )
    }

    #[test]
    fn test_execute_in_order() {
        let batch = batch();
        let mut log = Vec::new();

        batch.execute(&mut log);
        assert_eq!(log, ["execute:a", "execute:b", "execute:c"]);
    }

    #[test]
    fn test_undo_in_reverse_order() {
        let batch = batch();
        let mut log = Vec::new();

        batch.undo(&mut log);
        assert_eq!(log, ["undo:c", "undo:b", "undo:a"]);
    }

    #[test]
    fn test_redo_replays_in_order() {
        let batch = batch();
        let mut log = Vec::new();

        batch.redo(&mut log);
        assert_eq!(log, ["execute:a", "execute:b", "execute:c"]);
    }

    #[test]
    fn test_metadata() {
        let batch = batch();

        assert_eq!(batch.kind(), BATCH_KIND);
        assert_eq!(batch.description(), "Move selection");
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
        assert!(batch.as_mergeable().is_none());

        let names: Vec<_> = batch
            .commands()
            .iter()
            .map(|command| command.description())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
