//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod fitness_goals;
pub mod plans;

pub use fitness_goals::{FitnessGoalsRepository, UpsertFitnessGoals};
pub use plans::{CreatePlan, PlanRecord, PlanRepository};
