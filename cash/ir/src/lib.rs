//! Graph intermediate representation for hardware designs.
//!
//! A design is a [Context] owning a dense arena of [Node]s. Nodes reference
//! their sources by [NodeId]; the only sequential edges are register `next`
//! inputs and memory write ports, so every other edge must be acyclic.
mod common;
mod config;
mod context;
mod idx;
mod node;
mod scope;
mod value;

pub use common::{RRC, WRC, rrc};
pub use config::{ContextConfig, MAX_NODE_ID};
pub use context::{Context, MemoryPorts, OpSpec};
pub use idx::{NodeId, NodeMap, SecondaryNodeMap};
pub use node::{Node, NodeKind, Opcode, Sources};
pub use scope::{ContextScope, ctx_curr, try_with_ctx_curr, with_ctx_curr};
pub use value::Value;

// Re-export types from the utils crate.
pub use cash_utils::{CashResult, Error, GetName, Id, SrcLoc};
