//! Data models for taskflow API resources.
//!
//! - `Task`, `TaskPayload`, `TaskQuery`: task resources, write bodies and list filters
//! - `CompletedTask`: entries of the completion history
//! - `TaskStatistics`: dashboard counters
//! - `Page`, `Listing`: pagination envelopes

pub mod page;
pub mod task;

pub use page::{Listing, Page};
pub use task::{
    CompletedTask, ParseEnumError, Task, TaskPayload, TaskPriority, TaskQuery, TaskStatistics,
    TaskStatus, UserRef,
};
