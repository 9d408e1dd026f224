//! Macroplan Shared Library
//!
//! This crate contains the pure domain logic shared across the backend:
//! metabolic calculations, the plan content model, the template fallback
//! generator, and API wire types.

pub mod metabolics;
pub mod plan;
pub mod templates;
pub mod types;

// Re-export commonly used items
pub use metabolics::*;
pub use plan::*;
pub use templates::template_plan;
