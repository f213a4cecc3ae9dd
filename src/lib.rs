//! Ripple: Propagation and Scheduling Core
//!
//! The per-event propagation context of a forward-chaining rule engine: the
//! descriptor that travels with each insert, update, or delete through the
//! matching network, the two-tier action queue drained at safe points, and
//! the adapter that re-expresses property-reactive modification masks in the
//! property ordering of a different type view.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod marshal;
pub mod mask;
pub mod registry;
pub mod session;
pub mod types;
