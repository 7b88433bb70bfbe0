use cash_ir::NodeId;
use itertools::Itertools;
use thiserror::Error;

/// A type alias for a result with a [SimError] as the error type
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while building or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Instructions that were skipped during a pass because a slot they
    /// read or write was absent.
    #[error("skipped {} instruction(s) with missing values: {}", .nodes.len(), .nodes.iter().join(", "))]
    MissingValues { nodes: Vec<NodeId> },

    #[error("node {0} is not part of the simulated context")]
    UnknownNode(NodeId),

    #[error("cannot store a {given}-bit value in {node}, which is {expected} bits wide")]
    WidthMismatch {
        node: NodeId,
        expected: u32,
        given: u32,
    },

    /// Wrapper for errors coming from the IR, e.g. a combinational cycle
    #[error(transparent)]
    Ir(#[from] cash_utils::Error),
}

impl From<SimError> for cash_utils::Error {
    fn from(err: SimError) -> Self {
        match err {
            SimError::Ir(err) => err,
            err => cash_utils::Error::misc(err.to_string()),
        }
    }
}
