//! Search orchestration
//!
//! [`plan`] picks a route from the location input, [`stages`] holds the pure
//! filtering, dedup and mapping rules, and [`Orchestrator`] runs the network
//! stages around them.

mod orchestrator;
pub mod plan;
pub mod stages;

pub use orchestrator::Orchestrator;
pub use plan::{plan, ScrapePlan, SearchOutcome, SearchPath, StageOutcome};
