pub mod command;
pub mod mergeable_command;
