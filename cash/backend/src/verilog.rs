//! Lowers a [Context] to a single Verilog module named `top`.
use crate::{Backend, NodeNames};
use cash_ir::{Context, Node, NodeId, NodeKind, Opcode};
use cash_utils::{CashResult, Id, OutputFile};
use itertools::Itertools;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    time::Instant,
};

/// Port added when a sequential node has no clock of its own.
const CLOCK: &str = "clk";

fn width_decl(width: u32) -> String {
    if width == 1 {
        String::new()
    } else {
        format!(" [{}:0]", width - 1)
    }
}

/// Implements a simple Verilog backend. Names and statement order are pure
/// functions of the graph, so repeated runs print identical text.
pub struct VerilogWriter<'a> {
    ctx: &'a Context,
    order: Vec<NodeId>,
    names: NodeNames,
    /// Consumers of each node, in id order.
    uses: Vec<Vec<NodeId>>,
    implicit_clock: bool,
}

impl<'a> VerilogWriter<'a> {
    pub fn new(ctx: &'a Context) -> CashResult<Self> {
        let order = ctx.get_eval_list()?;
        let mut uses = vec![Vec::new(); ctx.len()];
        for node in ctx.nodes() {
            for src in node.srcs().iter().flatten() {
                uses[src.index()].push(node.id());
            }
        }
        let implicit_clock = ctx.nodes().any(|node| match node.kind {
            NodeKind::Register { clock, .. } => clock.is_none(),
            NodeKind::Memory { clock, .. } => {
                clock.is_none() && node.src(NodeKind::MEM_WEN).is_some()
            }
            _ => false,
        });
        let reserved: &[&str] = if implicit_clock { &[CLOCK] } else { &[] };
        let names = NodeNames::new(ctx, &order, reserved);
        Ok(VerilogWriter {
            ctx,
            order,
            names,
            uses,
            implicit_clock,
        })
    }

    pub fn names(&self) -> &NodeNames {
        &self.names
    }

    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        self.uses.get(id.index()).map_or(&[], Vec::as_slice)
    }

    fn name(&self, id: NodeId) -> Id {
        self.names.name(id)
    }

    /// A proxy read only by output ports. The outputs name its driver
    /// directly and the proxy itself is not emitted.
    fn is_subsumed(&self, id: NodeId) -> bool {
        matches!(self.ctx[id].kind, NodeKind::Proxy)
            && !self.uses(id).is_empty()
            && self
                .uses(id)
                .iter()
                .all(|user| matches!(self.ctx[*user].kind, NodeKind::Output))
    }

    fn clock_of(&self, clock: Option<NodeId>) -> Id {
        clock.map_or_else(|| Id::from(CLOCK), |c| self.name(c))
    }

    pub fn print<W: Write + ?Sized>(&self, f: &mut W) -> io::Result<()> {
        self.emit_header(f)?;
        self.emit_decls(f)?;
        writeln!(f)?;
        for &id in &self.order {
            self.emit_logic(&self.ctx[id], f)?;
        }
        writeln!(f, "endmodule")
    }

    fn emit_header<W: Write + ?Sized>(&self, f: &mut W) -> io::Result<()> {
        let mut ports = Vec::new();
        if self.implicit_clock {
            ports.push(format!("input {CLOCK}"));
        }
        for id in self.ctx.inputs().chain(self.ctx.outputs()).sorted() {
            let node = &self.ctx[id];
            let dir = if matches!(node.kind, NodeKind::Input { .. }) {
                "input"
            } else {
                "output"
            };
            ports.push(format!("{dir}{} {}", width_decl(node.width()), self.name(id)));
        }
        if ports.is_empty() {
            return writeln!(f, "module top ();");
        }
        writeln!(f, "module top (")?;
        writeln!(f, "{}", ports.iter().map(|p| format!("  {p}")).join(",\n"))?;
        writeln!(f, ");")
    }

    fn emit_decls<W: Write + ?Sized>(&self, f: &mut W) -> io::Result<()> {
        for &id in &self.order {
            let node = &self.ctx[id];
            let width = width_decl(node.width());
            let name = self.name(id);
            match &node.kind {
                NodeKind::Input { .. } | NodeKind::Output => {}
                NodeKind::Proxy if self.is_subsumed(id) => {}
                NodeKind::Register { .. } => writeln!(f, "  reg{width} {name};")?,
                NodeKind::Memory { depth, .. } => {
                    let storage = self.names.storage(id).unwrap_or(name);
                    writeln!(f, "  reg{width} {storage} [0:{}];", depth - 1)?;
                    writeln!(f, "  wire{width} {name};")?;
                }
                _ => writeln!(f, "  wire{width} {name};")?,
            }
        }
        Ok(())
    }

    fn warn<W: Write + ?Sized>(&self, f: &mut W, msg: String) -> io::Result<()> {
        log::warn!("{msg}");
        writeln!(f, "  // WARNING: {msg}")
    }

    fn emit_logic<W: Write + ?Sized>(&self, node: &Node, f: &mut W) -> io::Result<()> {
        let id = node.id();
        let name = self.name(id);
        match &node.kind {
            NodeKind::Input { .. } => Ok(()),
            NodeKind::Literal { value } => writeln!(f, "  assign {name} = {value};"),
            NodeKind::Output => {
                let driver = node.src(0).and_then(|proxy| {
                    if self.is_subsumed(proxy) {
                        self.ctx[proxy].src(0)
                    } else {
                        Some(proxy)
                    }
                });
                match driver {
                    Some(d) => writeln!(f, "  assign {name} = {};", self.name(d)),
                    None => self.warn(f, format!("output `{name}` has no driver")),
                }
            }
            NodeKind::Proxy if self.is_subsumed(id) => Ok(()),
            NodeKind::Proxy => match node.src(0) {
                Some(src) => writeln!(f, "  assign {name} = {};", self.name(src)),
                None => self.warn(f, format!("proxy `{name}` has no driver")),
            },
            NodeKind::Operation { op, signed } => self.emit_op(node, *op, *signed, f),
            NodeKind::Register { clock, reset, .. } => {
                let Some(next) = node.src(NodeKind::REG_NEXT) else {
                    return self.warn(f, format!("register `{name}` has no next value"));
                };
                let clk = self.clock_of(*clock);
                let next = self.name(next);
                match (reset, node.src(NodeKind::REG_INIT)) {
                    (Some(rst), Some(init)) => writeln!(
                        f,
                        "  always @(posedge {clk}) {name} <= {} ? {} : {next};",
                        self.name(*rst),
                        self.name(init)
                    ),
                    (None, Some(init)) => {
                        if let Some(value) = self.ctx.const_value(init) {
                            writeln!(f, "  initial {name} = {};", value.truncate(node.width()))?;
                        }
                        writeln!(f, "  always @(posedge {clk}) {name} <= {next};")
                    }
                    _ => writeln!(f, "  always @(posedge {clk}) {name} <= {next};"),
                }
            }
            NodeKind::Memory { init, clock, .. } => {
                let storage = self.names.storage(id).unwrap_or(name);
                let nonzero = init.iter().enumerate().filter(|(_, v)| v.is_true()).collect_vec();
                if !nonzero.is_empty() {
                    writeln!(f, "  initial begin")?;
                    for (i, v) in nonzero {
                        writeln!(f, "    {storage}[{i}] = {v};")?;
                    }
                    writeln!(f, "  end")?;
                }
                let raddr = node
                    .src(NodeKind::MEM_RADDR)
                    .map_or_else(|| "0".to_string(), |a| self.name(a).to_string());
                writeln!(f, "  assign {name} = {storage}[{raddr}];")?;
                let port = (
                    node.src(NodeKind::MEM_WADDR),
                    node.src(NodeKind::MEM_WDATA),
                    node.src(NodeKind::MEM_WEN),
                );
                match port {
                    (Some(waddr), Some(wdata), Some(wen)) => writeln!(
                        f,
                        "  always @(posedge {}) if ({}) {storage}[{}] <= {};",
                        self.clock_of(*clock),
                        self.name(wen),
                        self.name(waddr),
                        self.name(wdata)
                    ),
                    (None, None, None) => Ok(()),
                    _ => self.warn(f, format!("memory `{name}` has an incomplete write port")),
                }
            }
        }
    }

    fn emit_op<W: Write + ?Sized>(
        &self,
        node: &Node,
        op: Opcode,
        signed: bool,
        f: &mut W,
    ) -> io::Result<()> {
        let name = self.name(node.id());
        let operand = |pos: usize, wrap: bool| {
            node.src(pos).map(|src| {
                if wrap {
                    format!("$signed({})", self.name(src))
                } else {
                    self.name(src).to_string()
                }
            })
        };
        if op.is_unary() {
            return match operand(0, signed) {
                Some(a) => writeln!(f, "  assign {name} = {}{a};", op.symbol()),
                None => self.warn(f, format!("operation `{name}` has no operand")),
            };
        }
        // Shift amounts are always unsigned.
        match (operand(0, signed), operand(1, signed && !op.is_shift())) {
            (Some(a), Some(b)) => {
                let sym = if signed && op == Opcode::Shr {
                    ">>>"
                } else {
                    op.symbol()
                };
                writeln!(f, "  assign {name} = {a} {sym} {b};")
            }
            _ => self.warn(f, format!("operation `{name}` is missing an operand")),
        }
    }
}

/// Write `ctx` as Verilog to the file at `path`.
pub fn to_verilog<P: AsRef<Path>>(path: P, ctx: &Context) -> CashResult<()> {
    let writer = VerilogWriter::new(ctx)?;
    let time = Instant::now();
    let mut f = BufWriter::new(File::create(path.as_ref())?);
    writer.print(&mut f)?;
    f.flush()?;
    log::info!("Generated `top` in {:?}", time.elapsed());
    Ok(())
}

#[derive(Default)]
pub struct VerilogBackend;

impl Backend for VerilogBackend {
    fn name(&self) -> &'static str {
        "verilog"
    }

    fn validate(&self, ctx: &Context) -> CashResult<()> {
        ctx.get_eval_list().map(|_| ())
    }

    fn emit(&self, ctx: &Context, file: &mut OutputFile) -> CashResult<()> {
        let writer = VerilogWriter::new(ctx)?;
        let mut f = file.get_write()?;
        writer.print(&mut f)?;
        f.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash_ir::{SrcLoc, Value};

    fn emit(ctx: &Context) -> String {
        let mut buf = Vec::new();
        VerilogWriter::new(ctx).unwrap().print(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn passthrough_subsumes_output_proxy() {
        let mut ctx = Context::new("top");
        let l = SrcLoc::unknown();
        let a = ctx.try_create_input(1, "a", l).unwrap();
        let y = ctx.try_create_output(1, "y", l).unwrap();
        ctx.bind_output(y, ctx.input_proxy(a).unwrap()).unwrap();
        assert_eq!(
            emit(&ctx),
            "module top (\n  input a,\n  output y\n);\n  wire a_1;\n\n  assign a_1 = a;\n  assign y = a_1;\nendmodule\n"
        );
    }

    #[test]
    fn signed_ops_and_missing_operands() {
        let mut ctx = Context::new("top");
        let l = SrcLoc::unknown();
        let a = ctx.try_create_literal(Value::from_u64(0x8, 4), "a", l).unwrap();
        let s = ctx.try_create_literal(Value::from_u64(1, 2), "s", l).unwrap();
        ctx.try_create_op_with(cash_ir::OpSpec::new(Opcode::Shr).signed(), a, Some(s), "sra", l)
            .unwrap();
        ctx.try_create_op_with(cash_ir::OpSpec::new(Opcode::Lt).signed(), a, Some(a), "lt", l)
            .unwrap();
        let hole = ctx
            .try_create_node(
                NodeKind::Operation { op: Opcode::Add, signed: false },
                4,
                [Some(a), None],
                "hole",
                l,
            )
            .unwrap();
        let text = emit(&ctx);
        assert!(text.contains("  assign a = 4'h8;\n"));
        assert!(text.contains("  assign s = 2'h1;\n"));
        assert!(text.contains("  assign sra = $signed(a) >>> s;\n"));
        assert!(text.contains("  assign lt = $signed(a) < $signed(a);\n"));
        assert!(text.contains("  // WARNING: operation `hole` is missing an operand\n"));
        assert!(text.contains("  wire [3:0] hole;\n"));
        assert!(ctx.node(hole).is_some());
        assert!(text.starts_with("module top ();\n"));
    }

    #[test]
    fn register_with_reset_and_memory() {
        let mut ctx = Context::new("top");
        let l = SrcLoc::unknown();
        let rst = ctx.try_create_input(1, "reset", l).unwrap();
        ctx.set_default_reset(rst).unwrap();
        let zero = ctx.try_create_literal(Value::zero(2), "zero", l).unwrap();
        let r = ctx.try_create_register(2, Some(zero), "r", l).unwrap();
        ctx.set_next(r, r).unwrap();
        let m = ctx
            .try_create_memory(8, 2, vec![Value::zero(8), Value::from_u64(7, 8)], "m", l)
            .unwrap();
        ctx.set_src(m, NodeKind::MEM_WEN, Some(rst)).unwrap();
        let text = emit(&ctx);
        assert!(text.starts_with("module top (\n  input clk,\n  input reset\n);\n"));
        assert!(text.contains("  reg [1:0] r;\n"));
        assert!(text.contains("  always @(posedge clk) r <= reset ? zero : r;\n"));
        assert!(text.contains("  reg [7:0] m_data [0:1];\n  wire [7:0] m;\n"));
        assert!(text.contains("  initial begin\n    m_data[1] = 8'h7;\n  end\n"));
        assert!(text.contains("  assign m = m_data[0];\n"));
        assert!(text.contains("  // WARNING: memory `m` has an incomplete write port\n"));
        assert!(text.ends_with("endmodule\n"));
    }

    #[test]
    fn unbound_output_warns() {
        let mut ctx = Context::new("top");
        ctx.try_create_output(3, "y", SrcLoc::unknown()).unwrap();
        let text = emit(&ctx);
        assert!(text.starts_with("module top (\n  output [2:0] y\n);\n"));
        assert!(text.contains("  // WARNING: output `y` has no driver\n"));
        assert!(!text.contains("y_1"));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut ctx = Context::new("top");
        let l = SrcLoc::unknown();
        let a = ctx.try_create_input(8, "a", l).unwrap();
        let pa = ctx.input_proxy(a).unwrap();
        let r = ctx.try_create_register(8, None, "acc", l).unwrap();
        let sum = ctx.try_create_op(Opcode::Add, r, pa, "", l).unwrap();
        ctx.set_next(r, sum).unwrap();
        let y = ctx.try_create_output(8, "y", l).unwrap();
        ctx.bind_output(y, r).unwrap();
        let first = emit(&ctx);
        assert_eq!(first, emit(&ctx));
        assert!(first.contains("  assign add = acc + a_1;\n"));
        assert!(first.contains("  always @(posedge clk) acc <= add;\n"));
        assert!(first.contains("  assign y = acc;\n"));
    }
}
