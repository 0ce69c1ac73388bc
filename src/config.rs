use std::num::NonZeroUsize;

use thiserror::Error;

/// Undo depth used when the caller does not pick one.
pub const DEFAULT_MAX_STACK_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max stack size must be at least 1")]
    ZeroStackSize,
}

/// Construction parameters for a [`CommandHistory`](crate::command_history::CommandHistory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Upper bound on entries in each of the undo and redo stacks.
    pub max_stack_size: NonZeroUsize,
}

impl HistoryConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroStackSize`] when `max_stack_size` is zero.
    pub fn new(max_stack_size: usize) -> Result<Self, ConfigError> {
        let max_stack_size =
            NonZeroUsize::new(max_stack_size).ok_or(ConfigError::ZeroStackSize)?;
        Ok(Self { max_stack_size })
    }

    #[must_use]
    pub fn with_max_stack_size(mut self, max_stack_size: NonZeroUsize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
        }
    }
}

impl TryFrom<usize> for HistoryConfig {
    type Error = ConfigError;

    fn try_from(max_stack_size: usize) -> Result<Self, Self::Error> {
        Self::new(max_stack_size)
    }
}
