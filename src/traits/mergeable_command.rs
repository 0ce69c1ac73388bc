use super::command::Command;

/// Merge capability for commands produced by continuous edits, such as dragging a slider.
///
/// The history only ever asks the command at the top of the undo stack whether it can
/// absorb the incoming one. When it can, both are discarded and the command returned by
/// [`merge_with`](MergeableCommand::merge_with) takes the top slot.
///
/// Implementations usually downcast `other` with [`Command::as_any`] and compare the edit
/// target and timestamps.
pub trait MergeableCommand: Command {
    /// Whether `other`, executed right after `self`, can be folded into one undo step.
    fn can_merge_with(&self, other: &dyn Command<Context = Self::Context>) -> bool;

    /// Builds the replacement command.
    ///
    /// The result must restore the state from before `self` on undo and re-apply the state
    /// after `other` on redo. Only called after `can_merge_with(other)` returned `true`.
    fn merge_with(
        &self,
        other: &dyn Command<Context = Self::Context>,
    ) -> Box<dyn Command<Context = Self::Context>>;
}
