//! Shared utilities for the cash toolchain.
mod errors;
mod id;
mod namegenerator;
mod out_file;
mod position;

pub use errors::{CashResult, Error};
pub use id::{GetName, Id};
pub use namegenerator::NameGenerator;
pub use out_file::OutputFile;
pub use position::SrcLoc;
