//! Errors generated while building and lowering a design.
use crate::Id;
use itertools::Itertools;
use thiserror::Error;

/// Convenience wrapper to represent success or meaningful compiler error.
pub type CashResult<T> = std::result::Result<T, Error>;

/// Errors raised by the graph IR and the tools built on top of it.
///
/// Node identities are carried as raw `u32` values since the id type lives in
/// the IR crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A construction call was made while no context was entered.
    #[error("no active context on the current thread")]
    NoActiveContext,

    /// Widths must be strictly positive.
    #[error("invalid width {width} for `{name}`")]
    InvalidWidth { name: Id, width: u32 },

    #[error("node #{id} does not exist")]
    UnknownNode { id: u32 },

    /// A source slot was filled with something the node cannot accept.
    #[error("invalid source {pos} of node #{node}: {reason}")]
    InvalidSource {
        node: u32,
        pos: usize,
        reason: String,
    },

    #[error("context exhausted its node ids (limit {limit})")]
    NodeIdOverflow { limit: u32 },

    /// Members are listed in dependency order, starting from the node where
    /// the cycle was first observed.
    #[error("combinational cycle: {}", render_cycle(.cycle))]
    CombinationalCycle { cycle: Vec<(u32, Id)> },

    #[error("node #{id} is a {found}, expected a {expected}")]
    WrongKind {
        id: u32,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Misc(String),
}

fn render_cycle(cycle: &[(u32, Id)]) -> String {
    cycle
        .iter()
        .map(|(id, name)| format!("{name}#{id}"))
        .chain(cycle.first().map(|(id, name)| format!("{name}#{id}")))
        .join(" -> ")
}

impl Error {
    pub fn misc<S: ToString>(msg: S) -> Self {
        Error::Misc(msg.to_string())
    }

    pub fn invalid_source<S: ToString>(node: u32, pos: usize, reason: S) -> Self {
        Error::InvalidSource {
            node,
            pos,
            reason: reason.to_string(),
        }
    }
}
