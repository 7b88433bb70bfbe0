//! Graphviz rendering of a [Context], optionally annotated with the values
//! held by a running [Simulator].
use crate::{Backend, NodeNames};
use cash_ir::{Context, Node, NodeId, NodeKind};
use cash_sim::Simulator;
use cash_utils::{CashResult, GetName, OutputFile};
use petgraph::{
    dot::{Config, Dot},
    graph::{DiGraph, NodeIndex},
};
use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

#[derive(Debug, Clone)]
pub struct DagNode {
    pub id: NodeId,
    pub label: String,
}

impl Display for DagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Edge from a source to its consumer.
#[derive(Debug, Clone)]
pub struct DagEdge {
    pub pos: usize,
    /// Register `next` or memory write port.
    pub sequential: bool,
    /// Value carried by the source, when simulated.
    pub value: Option<String>,
}

impl Display for DagEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}: {v}", self.pos),
            None => write!(f, "{}", self.pos),
        }
    }
}

pub type Dag = DiGraph<DagNode, DagEdge>;

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

pub struct DagWriter<'a> {
    ctx: &'a Context,
    names: NodeNames,
    sim: Option<&'a Simulator<'a>>,
}

impl<'a> DagWriter<'a> {
    pub fn new(ctx: &'a Context, sim: Option<&'a Simulator<'a>>) -> CashResult<Self> {
        let order = ctx.get_eval_list()?;
        let names = NodeNames::new(ctx, &order, &[]);
        Ok(DagWriter { ctx, names, sim })
    }

    fn label(&self, node: &Node) -> String {
        let mut label = format!(
            "{}{}\n{}<{}>",
            self.names.name(node.id()),
            node.id(),
            node.kind.kind_name(),
            node.width()
        );
        match &node.kind {
            NodeKind::Literal { value } => label.push_str(&format!("\n{value}")),
            NodeKind::Operation { op, signed } => {
                label.push_str(&format!("\n{}{op}", if *signed { "s" } else { "" }))
            }
            NodeKind::Memory { depth, .. } => label.push_str(&format!("\ndepth {depth}")),
            _ => {}
        }
        if let Some(v) = self.sim.and_then(|sim| sim.value(node.id())) {
            label.push_str(&format!("\n= {v}"));
        }
        label
    }

    /// One graph node per IR node, one edge per connected source.
    pub fn graph(&self) -> Dag {
        let mut graph = Dag::with_capacity(self.ctx.len(), self.ctx.len());
        let idx: Vec<NodeIndex> = self
            .ctx
            .nodes()
            .map(|node| {
                graph.add_node(DagNode {
                    id: node.id(),
                    label: self.label(node),
                })
            })
            .collect();
        for node in self.ctx.nodes() {
            for (pos, src) in node.srcs().iter().enumerate() {
                if let Some(src) = src {
                    let edge = DagEdge {
                        pos,
                        sequential: node.kind.is_sequential_edge(pos),
                        value: self
                            .sim
                            .and_then(|sim| sim.value(*src))
                            .map(ToString::to_string),
                    };
                    graph.add_edge(idx[src.index()], idx[node.id().index()], edge);
                }
            }
        }
        graph
    }

    pub fn print<W: Write + ?Sized>(&self, f: &mut W) -> io::Result<()> {
        let graph = self.graph();
        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, e| {
                let w = e.weight();
                let style = if w.sequential { ", style=dashed" } else { "" };
                format!("label=\"{w}\"{style}")
            },
            &|_, (_, n)| format!("shape=box, label=\"{}\"", escape(&n.label)),
        );
        writeln!(f, "{dot}")
    }
}

/// Write `ctx` as a DOT graph to `path`, with live values when `sim` is
/// given.
pub fn to_dag<P: AsRef<Path>>(
    path: P,
    ctx: &Context,
    sim: Option<&Simulator<'_>>,
) -> CashResult<()> {
    let writer = DagWriter::new(ctx, sim)?;
    let mut f = BufWriter::new(File::create(path.as_ref())?);
    writer.print(&mut f)?;
    f.flush()?;
    log::info!("Wrote DAG of `{}` to {}", ctx.name(), path.as_ref().display());
    Ok(())
}

#[derive(Default)]
pub struct DagBackend<'a> {
    sim: Option<&'a Simulator<'a>>,
}

impl<'a> DagBackend<'a> {
    pub fn with_simulator(sim: &'a Simulator<'a>) -> Self {
        DagBackend { sim: Some(sim) }
    }
}

impl Backend for DagBackend<'_> {
    fn name(&self) -> &'static str {
        "dag"
    }

    fn validate(&self, ctx: &Context) -> CashResult<()> {
        ctx.get_eval_list().map(|_| ())
    }

    fn emit(&self, ctx: &Context, file: &mut OutputFile) -> CashResult<()> {
        let writer = DagWriter::new(ctx, self.sim)?;
        let mut f = file.get_write()?;
        writer.print(&mut f)?;
        f.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash_ir::{Opcode, SrcLoc, Value};

    fn counter() -> Context {
        let mut ctx = Context::new("top");
        let l = SrcLoc::unknown();
        let one = ctx.try_create_literal(Value::from_u64(1, 4), "one", l).unwrap();
        let r = ctx.try_create_register(4, None, "cnt", l).unwrap();
        let inc = ctx.try_create_op(Opcode::Add, r, one, "inc", l).unwrap();
        ctx.set_next(r, inc).unwrap();
        ctx
    }

    #[test]
    fn edges_follow_sources() {
        let ctx = counter();
        let graph = DagWriter::new(&ctx, None).unwrap().graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        let seq = graph.edge_weights().filter(|e| e.sequential).count();
        assert_eq!(seq, 1);
    }

    #[test]
    fn live_values_are_labelled() {
        let ctx = counter();
        let mut sim = Simulator::new(&ctx).unwrap();
        sim.tick_n(3).unwrap();
        let mut buf = Vec::new();
        DagWriter::new(&ctx, Some(&sim))
            .unwrap()
            .print(&mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("digraph {"));
        assert!(text.contains("cnt#1\\nregister<4>\\n= 4'h2"));
        assert!(text.contains("label=\"1: 4'h3\", style=dashed"));
        assert!(text.contains("one#0\\nliteral<4>\\n4'h1"));
    }
}
