//! Instruction-based, cycle-accurate simulation of a [Context](cash_ir::Context).
//!
//! The simulator borrows its context for its whole lifetime, builds one
//! instruction per node and advances the design one clock tick per
//! [Simulator::tick].
mod configuration;
mod errors;
mod instruction;
mod simulator;

pub use configuration::RuntimeConfig;
pub use errors::{SimError, SimResult};
pub use simulator::Simulator;
