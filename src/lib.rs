#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::style)]
#![warn(clippy::correctness)]
#![warn(clippy::complexity)]
#![warn(clippy::suspicious)]
#![warn(clippy::cargo)]

//! Undo/redo history for an interactive scene editor.
//!
//! [`CommandHistory`](command_history::CommandHistory) records reversible
//! [`Command`](traits::command::Command)s applied to an application context. It merges
//! bursts of related edits, groups multi-step operations into atomic
//! [`Batch`](batch::Batch)es, bounds its depth and announces every change on an
//! [`EventBus`](event_bus::EventBus).
//!
//! ```
//! use std::collections::HashMap;
//! use scene_history::prelude::*;
//!
//! #[derive(Default)]
//! struct Scene(HashMap<(EntityId, String), f32>);
//!
//! impl PropertyStore for Scene {
//!     type Value = f32;
//!
//!     fn set_property(&mut self, entity: EntityId, property: &str, value: f32) {
//!         self.0.insert((entity, property.to_owned()), value);
//!     }
//! }
//!
//! let mut scene = Scene::default();
//! let mut history = CommandHistory::new(EventBus::new(), HistoryConfig::default());
//! let cube = EntityId::new(1);
//!
//! history.execute(SetProperty::<Scene>::at(cube, "x", 0.0, 0.5, 1_000), &mut scene);
//! history.execute(SetProperty::<Scene>::at(cube, "x", 0.5, 1.0, 1_100), &mut scene);
//! assert_eq!(history.undo_stack_size(), 1);
//!
//! history.undo(&mut scene);
//! assert_eq!(scene.0[&(cube, "x".to_owned())], 0.0);
//! ```

pub mod batch;
pub mod command_history;
pub mod config;
pub mod event_bus;
pub mod property_command;
pub mod traits;

pub mod prelude {
	pub use crate::batch::Batch;
	pub use crate::command_history::CommandHistory;
	pub use crate::config::{ConfigError, HistoryConfig};
	pub use crate::event_bus::{EventBus, HistoryEvent, StackState, SubscriptionId, Topic};
	pub use crate::property_command::{EntityId, PropertyStore, SetProperty};
	pub use crate::traits::command::{Command, CommandMetadata};
	pub use crate::traits::mergeable_command::MergeableCommand;
}
