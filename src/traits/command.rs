use std::{
    any::Any,
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use super::mergeable_command::MergeableCommand;

/// Milliseconds since the Unix epoch, saturating instead of failing on a skewed clock.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Kind tag, UI label and creation time of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    /// Tag naming the command's kind, used for merge matching and diagnostics.
    pub kind: String,
    /// Label shown next to Undo/Redo.
    pub description: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl CommandMetadata {
    /// Creates metadata stamped with the current time.
    #[must_use]
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self::at(kind, description, now_millis())
    }

    /// Creates metadata with an explicit timestamp.
    #[must_use]
    pub fn at(kind: impl Into<String>, description: impl Into<String>, timestamp: u64) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            timestamp,
        }
    }
}

/// A reversible unit of work applied to a context.
///
/// A command captures everything it needs for both directions when it is built, so
/// `execute` and `undo` are exact inverses with respect to the context. The history
/// always calls them in strict alternation for a given entry.
///
/// # Associated Types
///
/// * `Context`: The application state the command mutates.
///
/// # Required Methods
///
/// * `execute(&self, ctx: &mut Self::Context)`: Applies the forward effect.
/// * `undo(&self, ctx: &mut Self::Context)`: Applies the inverse effect.
/// * `metadata(&self) -> &CommandMetadata`: Kind tag, label and creation time.
/// * `as_any(&self) -> &dyn Any`: Lets mergeable commands downcast their peers.
///
/// # Example
///
/// ```
/// use scene_history::prelude::{Command, CommandMetadata};
/// use std::any::Any;
///
/// struct Add {
///     amount: i32,
///     meta: CommandMetadata,
/// }
///
/// impl Command for Add {
///     type Context = i32;
///
///     fn execute(&self, ctx: &mut i32) {
///         *ctx += self.amount;
///     }
///
///     fn undo(&self, ctx: &mut i32) {
///         *ctx -= self.amount;
///     }
///
///     fn metadata(&self) -> &CommandMetadata {
///         &self.meta
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let mut value = 0;
/// let add = Add { amount: 3, meta: CommandMetadata::new("add", "Add 3") };
/// add.execute(&mut value);
/// assert_eq!(value, 3);
/// add.undo(&mut value);
/// assert_eq!(value, 0);
/// assert_eq!(add.description(), "Add 3");
/// ```
pub trait Command {
    type Context;

    /// Applies the forward effect.
    ///
    /// # Arguments
    ///
    /// * `ctx`: A mutable reference to the state the command operates on.
    fn execute(&self, ctx: &mut Self::Context);

    /// Applies the inverse of `execute`.
    ///
    /// # Arguments
    ///
    /// * `ctx`: A mutable reference to the state the command operates on.
    fn undo(&self, ctx: &mut Self::Context);

    /// Re-applies the command after an undo. Defaults to `execute`.
    fn redo(&self, ctx: &mut Self::Context) {
        self.execute(ctx);
    }

    fn metadata(&self) -> &CommandMetadata;

    fn as_any(&self) -> &dyn Any;

    /// Returns the merge capability of this command, if it has one.
    ///
    /// Plain commands keep the default `None`. Mergeable commands return `Some(self)`.
    fn as_mergeable(&self) -> Option<&dyn MergeableCommand<Context = Self::Context>> {
        None
    }

    fn description(&self) -> &str {
        &self.metadata().description
    }

    fn kind(&self) -> &str {
        &self.metadata().kind
    }

    fn timestamp(&self) -> u64 {
        self.metadata().timestamp
    }
}

impl<Ctx> fmt::Debug for dyn Command<Context = Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .field("timestamp", &self.timestamp())
            .field("mergeable", &self.as_mergeable().is_some())
            .finish()
    }
}
