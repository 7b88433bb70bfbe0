//! # cash
//!
//! Plumbs together the cash crates and provides the `cash` command line
//! tool. Libraries should depend on [`cash_ir`], [`cash_sim`] and
//! [`cash_backend`] directly.
pub mod cmdline;
pub mod designs;
pub mod driver;

pub use cash_backend as backend;
pub use cash_ir as ir;
pub use cash_sim as sim;
pub use cash_utils as utils;
