//! Lowering of a [Context](cash_ir::Context) to Verilog and Graphviz DOT.
mod dag;
mod naming;
mod reserved_names;
mod traits;
mod verilog;

pub use dag::{DagBackend, DagWriter, to_dag};
pub use naming::NodeNames;
pub use traits::Backend;
pub use verilog::{VerilogBackend, VerilogWriter, to_verilog};
