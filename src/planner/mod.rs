//! Update planning: stream records in, line-indexed patches out.

pub mod config;
pub mod errors;
pub mod format;
pub mod plan;

pub use config::PlannerConfig;
pub use errors::PlanError;
pub use format::format_var;
pub use plan::{plan_str, plan_updates, Planner, UpdateRequest};
