//! Property edits on scene entities, the canonical mergeable command.
//!
//! Dragging a numeric field emits one [`SetProperty`] per intermediate value. Consecutive
//! edits of the same `(entity, property)` pair that arrive within the merge window collapse
//! into a single undo step whose `before` is the value from before the drag started.

use std::{any::Any, fmt};

use crate::traits::{
    command::{now_millis, Command, CommandMetadata},
    mergeable_command::MergeableCommand,
};

/// Kind tag carried by every [`SetProperty`].
pub const SET_PROPERTY_KIND: &str = "set-property";

/// Edits closer together than this (in milliseconds) merge.
pub const DEFAULT_MERGE_WINDOW_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Application state that stores named properties on entities.
pub trait PropertyStore {
    type Value;

    fn set_property(&mut self, entity: EntityId, property: &str, value: Self::Value);
}

/// Sets `property` on `entity`, remembering the previous value for undo.
pub struct SetProperty<S: PropertyStore> {
    entity: EntityId,
    property: String,
    before: S::Value,
    after: S::Value,
    merge_window_ms: u64,
    metadata: CommandMetadata,
}

impl<S> SetProperty<S>
where
    S: PropertyStore,
{
    #[must_use]
    pub fn new(
        entity: EntityId,
        property: impl Into<String>,
        before: S::Value,
        after: S::Value,
    ) -> Self {
        Self::at(entity, property, before, after, now_millis())
    }

    /// Same as [`new`](Self::new) with an explicit creation time.
    #[must_use]
    pub fn at(
        entity: EntityId,
        property: impl Into<String>,
        before: S::Value,
        after: S::Value,
        timestamp: u64,
    ) -> Self {
        let property = property.into();
        let description = format!("Set {property}");
        Self {
            entity,
            property,
            before,
            after,
            merge_window_ms: DEFAULT_MERGE_WINDOW_MS,
            metadata: CommandMetadata::at(SET_PROPERTY_KIND, description, timestamp),
        }
    }

    #[must_use]
    pub fn with_merge_window(mut self, merge_window_ms: u64) -> Self {
        self.merge_window_ms = merge_window_ms;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[must_use]
    pub fn before(&self) -> &S::Value {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &S::Value {
        &self.after
    }
}

impl<S> Command for SetProperty<S>
where
    S: PropertyStore + 'static,
    S::Value: Clone + 'static,
{
    type Context = S;

    fn execute(&self, ctx: &mut S) {
        ctx.set_property(self.entity, &self.property, self.after.clone());
    }

    fn undo(&self, ctx: &mut S) {
        ctx.set_property(self.entity, &self.property, self.before.clone());
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_mergeable(&self) -> Option<&dyn MergeableCommand<Context = S>> {
        Some(self)
    }
}

impl<S> MergeableCommand for SetProperty<S>
where
    S: PropertyStore + 'static,
    S::Value: Clone + 'static,
{
    fn can_merge_with(&self, other: &dyn Command<Context = S>) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };

        other.entity == self.entity
            && other.property == self.property
            && other
                .timestamp()
                .checked_sub(self.timestamp())
                .is_some_and(|elapsed| elapsed < self.merge_window_ms)
    }

    fn merge_with(&self, other: &dyn Command<Context = S>) -> Box<dyn Command<Context = S>> {
        let after = other
            .as_any()
            .downcast_ref::<Self>()
            .map_or_else(|| self.after.clone(), |other| other.after.clone());

        Box::new(Self {
            entity: self.entity,
            property: self.property.clone(),
            before: self.before.clone(),
            after,
            merge_window_ms: self.merge_window_ms,
            metadata: CommandMetadata::at(
                self.metadata.kind.clone(),
                self.metadata.description.clone(),
                other.timestamp(),
            ),
        })
    }
}

impl<S> fmt::Debug for SetProperty<S>
where
    S: PropertyStore,
    S::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetProperty")
            .field("entity", &self.entity)
            .field("property", &self.property)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("timestamp", &self.metadata.timestamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct Scene {
        values: HashMap<(EntityId, String), f32>,
    }

    impl PropertyStore for Scene {
        type Value = f32;

        fn set_property(&mut self, entity: EntityId, property: &str, value: f32) {
            self.values.insert((entity, property.to_owned()), value);
        }
    }

    fn set(entity: u64, property: &str, before: f32, after: f32, at: u64) -> SetProperty<Scene> {
        SetProperty::at(EntityId::new(entity), property, before, after, at)
    }

    #[test]
    fn test_execute_and_undo() {
        let mut scene = Scene::default();
        let cmd = set(1, "x", 0.0, 5.0, 0);

        cmd.execute(&mut scene);
        assert_eq!(scene.values[&(EntityId::new(1), "x".to_owned())], 5.0);

        cmd.undo(&mut scene);
        assert_eq!(scene.values[&(EntityId::new(1), "x".to_owned())], 0.0);
        assert_eq!(cmd.description(), "Set x");
        assert_eq!(cmd.kind(), SET_PROPERTY_KIND);
    }

    #[test]
    fn test_merge_window() {
        let first = set(1, "x", 0.0, 1.0, 1_000);

        assert!(first.can_merge_with(&set(1, "x", 1.0, 2.0, 1_299)));
        assert!(!first.can_merge_with(&set(1, "x", 1.0, 2.0, 1_300)));
        assert!(!first.can_merge_with(&set(1, "x", 1.0, 2.0, 999)));
    }

    #[test]
    fn test_merge_requires_same_target() {
        let first = set(1, "x", 0.0, 1.0, 1_000);

        assert!(!first.can_merge_with(&set(2, "x", 1.0, 2.0, 1_010)));
        assert!(!first.can_merge_with(&set(1, "y", 1.0, 2.0, 1_010)));
    }

    #[test]
    fn test_custom_merge_window() {
        let first = set(1, "x", 0.0, 1.0, 1_000).with_merge_window(50);

        assert!(first.can_merge_with(&set(1, "x", 1.0, 2.0, 1_049)));
        assert!(!first.can_merge_with(&set(1, "x", 1.0, 2.0, 1_050)));
    }

    #[test]
    fn test_merged_keeps_first_before_and_last_after() {
        let mut scene = Scene::default();
        let first = set(1, "x", 0.0, 1.0, 1_000);
        let second = set(1, "x", 1.0, 2.0, 1_100);

        let merged = first.merge_with(&second);
        assert_eq!(merged.timestamp(), 1_100);

        merged.execute(&mut scene);
        assert_eq!(scene.values[&(EntityId::new(1), "x".to_owned())], 2.0);
        merged.undo(&mut scene);
        assert_eq!(scene.values[&(EntityId::new(1), "x".to_owned())], 0.0);

        let merged = merged.as_any().downcast_ref::<SetProperty<Scene>>().unwrap();
        assert_eq!(*merged.before(), 0.0);
        assert_eq!(*merged.after(), 2.0);
    }

    #[test]
    fn test_entity_display() {
        assert_eq!(EntityId::new(7).to_string(), "#7");
        assert_eq!(EntityId::new(7).raw(), 7);
    }
}
