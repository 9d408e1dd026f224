//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod ai;
pub mod plans;
pub mod rate_limit;

pub use plans::PlanService;
