use crate::{
    ContextConfig, Node, NodeId, NodeKind, NodeMap, Opcode, RRC, Sources, Value, WRC,
};
use cash_utils::{CashResult, Error, GetName, Id, SrcLoc};
use std::collections::HashMap;
use std::ops;

/// Opcode plus the optional attributes of an operation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec {
    pub op: Opcode,
    pub signed: bool,
    /// Explicit result width. Defaults to [Opcode::result_width].
    pub width: Option<u32>,
}

impl OpSpec {
    pub fn new(op: Opcode) -> Self {
        OpSpec {
            op,
            signed: false,
            width: None,
        }
    }

    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn sized(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}

impl From<Opcode> for OpSpec {
    fn from(op: Opcode) -> Self {
        OpSpec::new(op)
    }
}

/// Port connections of a memory node. `None` leaves a port unconnected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryPorts {
    pub raddr: Option<NodeId>,
    pub waddr: Option<NodeId>,
    pub wdata: Option<NodeId>,
    pub wen: Option<NodeId>,
}

/// Log a failed construction and drop the error.
fn logged<T>(res: CashResult<T>) -> Option<T> {
    res.map_err(|err| log::error!("{err}")).ok()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Owner of every node of one circuit.
#[derive(Debug)]
pub struct Context {
    name: Id,
    nodes: NodeMap<Node>,
    /// First node created under each name.
    by_name: HashMap<Id, NodeId>,
    default_clock: Option<NodeId>,
    default_reset: Option<NodeId>,
    parent: Option<WRC<Context>>,
    config: ContextConfig,
}

impl GetName for Context {
    fn name(&self) -> Id {
        self.name
    }
}

impl ops::Index<NodeId> for Context {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl Context {
    pub fn new<S: Into<Id>>(name: S) -> Self {
        Self::with_config(name, ContextConfig::default())
    }

    pub fn with_config<S: Into<Id>>(name: S, config: ContextConfig) -> Self {
        Context {
            name: name.into(),
            nodes: NodeMap::new(),
            by_name: HashMap::new(),
            default_clock: None,
            default_reset: None,
            parent: None,
            config,
        }
    }

    /// A context nested under `parent`. Only a weak link is kept, so the
    /// child never extends the parent's lifetime.
    pub fn new_child<S: Into<Id>>(name: S, parent: &RRC<Context>) -> Self {
        let mut ctx = Self::with_config(name, parent.borrow().config);
        ctx.parent = Some(WRC::from(parent));
        ctx
    }

    pub fn parent(&self) -> Option<RRC<Context>> {
        self.parent.as_ref().and_then(WRC::upgrade)
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn try_node(&self, id: NodeId) -> CashResult<&Node> {
        self.nodes
            .get(id)
            .ok_or(Error::UnknownNode { id: id.raw() })
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    fn ids_where(&self, pred: fn(&NodeKind) -> bool) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, n)| pred(&n.kind))
            .map(|(id, _)| id)
    }

    pub fn inputs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids_where(|k| matches!(k, NodeKind::Input { .. }))
    }

    pub fn outputs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids_where(|k| matches!(k, NodeKind::Output))
    }

    pub fn registers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids_where(|k| matches!(k, NodeKind::Register { .. }))
    }

    pub fn memories(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids_where(|k| matches!(k, NodeKind::Memory { .. }))
    }

    /// The first node created with `name`.
    pub fn find<S: Into<Id>>(&self, name: S) -> Option<NodeId> {
        self.by_name.get(&name.into()).copied()
    }

    /// Follow proxies from `id` and return the literal at the end, if any.
    pub fn const_value(&self, id: NodeId) -> Option<&Value> {
        let mut cur = self.node(id)?;
        // A proxy chain visits each node at most once.
        for _ in 0..self.len() {
            match &cur.kind {
                NodeKind::Literal { value } => return Some(value),
                NodeKind::Proxy => cur = self.node(cur.src(0)?)?,
                _ => return None,
            }
        }
        None
    }

    /// The id the next created node will receive.
    pub fn next_node_id(&self) -> CashResult<NodeId> {
        self.check_room(1)?;
        Ok(self.nodes.peek_next_idx())
    }

    /// Fail unless `count` more nodes fit under the id ceiling.
    fn check_room(&self, count: u64) -> CashResult<()> {
        let last = self.nodes.len() as u64 + count.saturating_sub(1);
        if last > self.config.id_limit as u64 {
            return Err(Error::NodeIdOverflow {
                limit: self.config.id_limit,
            });
        }
        Ok(())
    }

    fn check_width(name: Id, width: u32) -> CashResult<()> {
        if width == 0 {
            Err(Error::InvalidWidth { name, width })
        } else {
            Ok(())
        }
    }

    fn check_src(&self, node: NodeId, pos: usize, src: Option<NodeId>) -> CashResult<()> {
        match src {
            Some(src) if !self.nodes.contains(src) => Err(Error::invalid_source(
                node.raw(),
                pos,
                format!("{src} is not part of context `{}`", self.name),
            )),
            _ => Ok(()),
        }
    }

    fn expect_kind(&self, id: NodeId, expected: &'static str) -> CashResult<&Node> {
        let node = self.try_node(id)?;
        let found = node.kind.kind_name();
        if found == expected {
            Ok(node)
        } else {
            Err(Error::WrongKind {
                id: id.raw(),
                expected,
                found,
            })
        }
    }

    /// Validate and store a node. Every other factory funnels through here.
    pub fn try_create_node<S, I>(
        &mut self,
        kind: NodeKind,
        width: u32,
        srcs: I,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId>
    where
        S: Into<Id>,
        I: IntoIterator<Item = Option<NodeId>>,
    {
        let name = name.into();
        Self::check_width(name, width)?;
        let id = self.next_node_id()?;
        let srcs: Sources = srcs.into_iter().collect();
        if srcs.len() > kind.max_srcs() {
            return Err(Error::invalid_source(
                id.raw(),
                srcs.len() - 1,
                format!(
                    "a {} takes at most {} source(s)",
                    kind.kind_name(),
                    kind.max_srcs()
                ),
            ));
        }
        for (pos, src) in srcs.iter().enumerate() {
            self.check_src(id, pos, *src)?;
        }

        let node = Node::new(id, kind, width, srcs, name, loc);
        log::trace!("{}: created {node} at {loc}", self.name);
        self.nodes.push(node);
        self.by_name.entry(name).or_insert(id);
        Ok(id)
    }

    pub fn create_node<S, I>(
        &mut self,
        kind: NodeKind,
        width: u32,
        srcs: I,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId>
    where
        S: Into<Id>,
        I: IntoIterator<Item = Option<NodeId>>,
    {
        logged(self.try_create_node(kind, width, srcs, name, loc))
    }

    pub fn try_create_literal<S: Into<Id>>(
        &mut self,
        value: Value,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let width = value.width();
        self.try_create_node(NodeKind::Literal { value }, width, [], name, loc)
    }

    pub fn create_literal<S: Into<Id>>(
        &mut self,
        value: Value,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_literal(value, name, loc))
    }

    /// Create an input port and its companion proxy. Returns the input; the
    /// proxy is reachable through [Context::input_proxy].
    pub fn try_create_input<S: Into<Id>>(
        &mut self,
        width: u32,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let name = name.into();
        Self::check_width(name, width)?;
        // Both nodes or neither.
        self.check_room(2)?;
        let kind = NodeKind::Input {
            default: Value::zero(width),
            driver: None,
            proxy: None,
        };
        let input = self.try_create_node(kind, width, [], name, loc)?;
        let proxy = self.try_create_node(NodeKind::Proxy, width, [Some(input)], name, loc)?;
        if let NodeKind::Input { proxy: p, .. } = &mut self.nodes[input].kind {
            *p = Some(proxy);
        }
        Ok(input)
    }

    pub fn create_input<S: Into<Id>>(
        &mut self,
        width: u32,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_input(width, name, loc))
    }

    /// Create an output port fed by a fresh, unconnected proxy.
    pub fn try_create_output<S: Into<Id>>(
        &mut self,
        width: u32,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let name = name.into();
        Self::check_width(name, width)?;
        self.check_room(2)?;
        let proxy = self.try_create_node(NodeKind::Proxy, width, [None], name, loc)?;
        self.try_create_node(NodeKind::Output, width, [Some(proxy)], name, loc)
    }

    pub fn create_output<S: Into<Id>>(
        &mut self,
        width: u32,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_output(width, name, loc))
    }

    /// Create a register clocked by the current default clock and reset.
    pub fn try_create_register<S: Into<Id>>(
        &mut self,
        width: u32,
        init: Option<NodeId>,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let kind = NodeKind::Register {
            clock: self.default_clock,
            reset: self.default_reset,
            enable: None,
        };
        self.try_create_node(kind, width, [init, None], name, loc)
    }

    pub fn create_register<S: Into<Id>>(
        &mut self,
        width: u32,
        init: Option<NodeId>,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_register(width, init, name, loc))
    }

    /// General operation factory. `rhs` must be present exactly when the
    /// opcode is binary.
    pub fn try_create_op_with<S: Into<Id>>(
        &mut self,
        spec: OpSpec,
        lhs: NodeId,
        rhs: Option<NodeId>,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let OpSpec { op, signed, width } = spec;
        let id = self.next_node_id()?;
        if rhs.is_some() != (op.arity() == 2) {
            return Err(Error::invalid_source(
                id.raw(),
                1,
                format!("`{op}` takes {} operand(s)", op.arity()),
            ));
        }
        let lw = self.try_node(lhs)?.width();
        let rw = rhs.map(|r| self.try_node(r).map(Node::width)).transpose()?;
        if let Some(rw) = rw {
            if self.config.strict_widths && !op.is_shift() && lw != rw {
                return Err(Error::invalid_source(
                    id.raw(),
                    1,
                    format!("`{op}` operands differ in width ({lw} vs {rw})"),
                ));
            }
        }
        let width = width.unwrap_or_else(|| op.result_width(lw, rw));
        let srcs = std::iter::once(Some(lhs)).chain(rhs.map(Some));
        self.try_create_node(NodeKind::Operation { op, signed }, width, srcs, name, loc)
    }

    pub fn try_create_op<S: Into<Id>>(
        &mut self,
        op: Opcode,
        lhs: NodeId,
        rhs: NodeId,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        self.try_create_op_with(OpSpec::new(op), lhs, Some(rhs), name, loc)
    }

    pub fn create_op<S: Into<Id>>(
        &mut self,
        op: Opcode,
        lhs: NodeId,
        rhs: NodeId,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_op(op, lhs, rhs, name, loc))
    }

    pub fn create_op_sized<S: Into<Id>>(
        &mut self,
        op: Opcode,
        width: u32,
        lhs: NodeId,
        rhs: NodeId,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_op_with(OpSpec::new(op).sized(width), lhs, Some(rhs), name, loc))
    }

    pub fn create_unop<S: Into<Id>>(
        &mut self,
        op: Opcode,
        src: NodeId,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_op_with(OpSpec::new(op), src, None, name, loc))
    }

    pub fn try_create_proxy<S: Into<Id>>(
        &mut self,
        src: NodeId,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let width = self.try_node(src)?.width();
        self.try_create_node(NodeKind::Proxy, width, [Some(src)], name, loc)
    }

    pub fn create_proxy<S: Into<Id>>(
        &mut self,
        src: NodeId,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_proxy(src, name, loc))
    }

    /// Create a `depth`-entry memory of `width`-bit words. Missing trailing
    /// `init` entries are zero.
    pub fn try_create_memory<S: Into<Id>>(
        &mut self,
        width: u32,
        depth: u32,
        init: Vec<Value>,
        name: S,
        loc: SrcLoc,
    ) -> CashResult<NodeId> {
        let name = name.into();
        Self::check_width(name, width)?;
        if depth == 0 || init.len() > depth as usize {
            return Err(Error::misc(format!(
                "memory `{name}` of depth {depth} cannot hold {} initial word(s)",
                init.len()
            )));
        }
        let mut init: Vec<Value> = init.iter().map(|v| v.truncate(width)).collect();
        init.resize(depth as usize, Value::zero(width));
        let kind = NodeKind::Memory {
            depth,
            init,
            clock: self.default_clock,
        };
        self.try_create_node(kind, width, [None; 4], name, loc)
    }

    pub fn create_memory<S: Into<Id>>(
        &mut self,
        width: u32,
        depth: u32,
        init: Vec<Value>,
        name: S,
        loc: SrcLoc,
    ) -> Option<NodeId> {
        logged(self.try_create_memory(width, depth, init, name, loc))
    }

    /// Connect (or clear) positional source `pos` of `node`.
    pub fn set_src(&mut self, node: NodeId, pos: usize, src: Option<NodeId>) -> CashResult<()> {
        let max = self.try_node(node)?.kind.max_srcs();
        if pos >= max {
            return Err(Error::invalid_source(
                node.raw(),
                pos,
                format!("only {max} source position(s) available"),
            ));
        }
        self.check_src(node, pos, src)?;
        self.nodes[node].set_src(pos, src);
        Ok(())
    }

    pub fn set_next(&mut self, reg: NodeId, next: NodeId) -> CashResult<()> {
        self.expect_kind(reg, "register")?;
        self.set_src(reg, NodeKind::REG_NEXT, Some(next))
    }

    pub fn get_next(&self, reg: NodeId) -> Option<NodeId> {
        self.expect_kind(reg, "register")
            .ok()
            .and_then(|n| n.src(NodeKind::REG_NEXT))
    }

    /// The proxy standing in for `input` at its use sites.
    pub fn input_proxy(&self, input: NodeId) -> Option<NodeId> {
        match self.node(input)?.kind {
            NodeKind::Input { proxy, .. } => proxy,
            _ => None,
        }
    }

    /// The node recorded by [Context::set_input_driver].
    pub fn input_driver(&self, input: NodeId) -> Option<NodeId> {
        match self.node(input)?.kind {
            NodeKind::Input { driver, .. } => driver,
            _ => None,
        }
    }

    /// The proxy collecting the value driven onto `output`.
    pub fn output_proxy(&self, output: NodeId) -> Option<NodeId> {
        self.expect_kind(output, "output").ok()?.src(0)
    }

    pub fn bind_output(&mut self, output: NodeId, driver: NodeId) -> CashResult<()> {
        let proxy = self.expect_kind(output, "output")?.src(0).ok_or_else(|| {
            Error::invalid_source(output.raw(), 0, "output lost its proxy")
        })?;
        self.set_src(proxy, 0, Some(driver))
    }

    /// Record the node driving `input` from an enclosing design.
    pub fn set_input_driver(&mut self, input: NodeId, driver: NodeId) -> CashResult<()> {
        self.expect_kind(input, "input")?;
        self.check_src(input, 0, Some(driver))?;
        if let NodeKind::Input { driver: d, .. } = &mut self.nodes[input].kind {
            *d = Some(driver);
        }
        Ok(())
    }

    /// Value an input holds until something is injected.
    pub fn set_input_default(&mut self, input: NodeId, value: Value) -> CashResult<()> {
        let width = self.expect_kind(input, "input")?.width();
        if let NodeKind::Input { default, .. } = &mut self.nodes[input].kind {
            *default = value.truncate(width);
        }
        Ok(())
    }

    pub fn connect_memory(&mut self, mem: NodeId, ports: MemoryPorts) -> CashResult<()> {
        self.expect_kind(mem, "memory")?;
        self.set_src(mem, NodeKind::MEM_RADDR, ports.raddr)?;
        self.set_src(mem, NodeKind::MEM_WADDR, ports.waddr)?;
        self.set_src(mem, NodeKind::MEM_WDATA, ports.wdata)?;
        self.set_src(mem, NodeKind::MEM_WEN, ports.wen)
    }

    pub fn set_default_clock(&mut self, clock: NodeId) -> CashResult<()> {
        self.try_node(clock)?;
        self.default_clock = Some(clock);
        Ok(())
    }

    pub fn default_clock(&self) -> Option<NodeId> {
        self.default_clock
    }

    pub fn set_default_reset(&mut self, reset: NodeId) -> CashResult<()> {
        self.try_node(reset)?;
        self.default_reset = Some(reset);
        Ok(())
    }

    pub fn default_reset(&self) -> Option<NodeId> {
        self.default_reset
    }

    /// Topological evaluation order of every node.
    ///
    /// Iterative depth-first search: roots in ascending id order, sources in
    /// positional order. Register `next` inputs and memory write ports are
    /// not ordering dependencies, so feedback through state is legal; any
    /// other cycle is an error.
    pub fn get_eval_list(&self) -> CashResult<Vec<NodeId>> {
        let mut marks = vec![Mark::White; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        // Node being expanded and the next source position to look at.
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for root in self.nodes.keys() {
            if marks[root.index()] != Mark::White {
                continue;
            }
            marks[root.index()] = Mark::Gray;
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let (id, pos) = *top;
                let node = &self.nodes[id];
                if pos == node.srcs().len() {
                    marks[id.index()] = Mark::Black;
                    order.push(id);
                    stack.pop();
                    continue;
                }
                top.1 += 1;
                let Some(src) = node.srcs()[pos] else {
                    continue;
                };
                if node.kind.is_sequential_edge(pos) {
                    continue;
                }
                match marks[src.index()] {
                    Mark::White => {
                        marks[src.index()] = Mark::Gray;
                        stack.push((src, 0));
                    }
                    Mark::Gray => return Err(self.cycle_error(&stack, src)),
                    Mark::Black => {}
                }
            }
        }
        Ok(order)
    }

    fn cycle_error(&self, stack: &[(NodeId, usize)], entry: NodeId) -> Error {
        let start = stack.iter().position(|(id, _)| *id == entry).unwrap_or(0);
        let cycle = stack[start..]
            .iter()
            .map(|(id, _)| (id.raw(), self.nodes[*id].name()))
            .collect();
        let err = Error::CombinationalCycle { cycle };
        log::error!("{}: {err}", self.name);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rrc;
    use proptest::prelude::*;

    fn loc() -> SrcLoc {
        SrcLoc::caller()
    }

    fn lit(ctx: &mut Context, v: u64, w: u32) -> NodeId {
        ctx.try_create_literal(Value::from_u64(v, w), "k", loc()).unwrap()
    }

    #[test]
    fn input_and_output_come_with_proxies() {
        let mut ctx = Context::new("top");
        let a = ctx.try_create_input(4, "a", loc()).unwrap();
        let y = ctx.try_create_output(4, "y", loc()).unwrap();
        let pa = ctx.input_proxy(a).unwrap();
        let py = ctx.output_proxy(y).unwrap();
        assert_eq!(ctx[pa].src(0), Some(a));
        assert!(py < y);
        ctx.bind_output(y, pa).unwrap();
        assert_eq!(ctx[py].src(0), Some(pa));
        assert_eq!(ctx.inputs().collect::<Vec<_>>(), vec![a]);
        assert_eq!(ctx.outputs().collect::<Vec<_>>(), vec![y]);
        assert_eq!(ctx.find("a"), Some(a));
    }

    #[test]
    fn rejects_bad_construction() {
        let mut ctx = Context::new("top");
        assert!(matches!(
            ctx.try_create_input(0, "a", loc()),
            Err(Error::InvalidWidth { width: 0, .. })
        ));
        let k = lit(&mut ctx, 1, 4);
        let ghost = NodeId::new(99);
        assert!(matches!(
            ctx.try_create_op(Opcode::Add, k, ghost, "bad", loc()),
            Err(Error::UnknownNode { id: 99 })
        ));
        assert!(matches!(
            ctx.try_create_op_with(OpSpec::new(Opcode::Not), k, Some(k), "bad", loc()),
            Err(Error::InvalidSource { .. })
        ));
        assert!(matches!(ctx.set_next(k, k), Err(Error::WrongKind { .. })));
        assert!(ctx.create_unop(Opcode::Add, k, "bad", loc()).is_none());
        // Failed attempts do not consume ids.
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn op_widths_follow_operands() {
        let mut ctx = Context::new("top");
        let a = lit(&mut ctx, 1, 4);
        let b = lit(&mut ctx, 1, 8);
        let add = ctx.create_op(Opcode::Add, a, b, "add", loc()).unwrap();
        let lt = ctx.create_op(Opcode::Lt, a, b, "lt", loc()).unwrap();
        let sized = ctx.create_op_sized(Opcode::Mul, 12, a, b, "mul", loc()).unwrap();
        assert_eq!(ctx[add].width(), 8);
        assert_eq!(ctx[lt].width(), 1);
        assert_eq!(ctx[sized].width(), 12);

        let mut strict = Context::with_config(
            "strict",
            ContextConfig::builder().strict_widths(true).build(),
        );
        let a = lit(&mut strict, 1, 4);
        let b = lit(&mut strict, 1, 8);
        assert!(strict.try_create_op(Opcode::Add, a, b, "add", loc()).is_err());
        assert!(strict.try_create_op(Opcode::Shl, a, b, "shl", loc()).is_ok());
    }

    #[test]
    fn id_ceiling_fails_fast() {
        let mut ctx = Context::with_config("tiny", ContextConfig::builder().id_limit(2).build());
        for _ in 0..3 {
            lit(&mut ctx, 0, 1);
        }
        assert!(matches!(
            ctx.try_create_literal(Value::zero(1), "k", loc()),
            Err(Error::NodeIdOverflow { limit: 2 })
        ));
        assert!(ctx.create_literal(Value::zero(1), "k", loc()).is_none());
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn ports_at_the_ceiling_leave_no_half() {
        let mut ctx = Context::with_config("tiny", ContextConfig::builder().id_limit(1).build());
        lit(&mut ctx, 0, 1);
        assert!(matches!(
            ctx.try_create_input(4, "a", loc()),
            Err(Error::NodeIdOverflow { limit: 1 })
        ));
        assert!(matches!(
            ctx.try_create_output(4, "y", loc()),
            Err(Error::NodeIdOverflow { limit: 1 })
        ));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.inputs().count(), 0);
        assert_eq!(ctx.find("a"), None);
        assert_eq!(ctx.find("y"), None);

        // The last two ids still fit a port.
        let mut ctx = Context::with_config("pair", ContextConfig::builder().id_limit(2).build());
        lit(&mut ctx, 0, 1);
        let a = ctx.try_create_input(4, "a", loc()).unwrap();
        assert_eq!(ctx.input_proxy(a), Some(NodeId::new(2)));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn input_driver_is_checked() {
        let mut ctx = Context::new("top");
        let k = lit(&mut ctx, 1, 4);
        let a = ctx.try_create_input(4, "a", loc()).unwrap();
        assert_eq!(ctx.input_driver(a), None);
        ctx.set_input_driver(a, k).unwrap();
        assert_eq!(ctx.input_driver(a), Some(k));

        assert!(matches!(
            ctx.set_input_driver(k, a),
            Err(Error::WrongKind { expected: "input", found: "literal", .. })
        ));
        assert!(matches!(
            ctx.set_input_driver(NodeId::new(40), k),
            Err(Error::UnknownNode { id: 40 })
        ));
        assert!(matches!(
            ctx.set_input_driver(a, NodeId::new(40)),
            Err(Error::InvalidSource { .. })
        ));
        assert_eq!(ctx.input_driver(a), Some(k));
    }

    #[test]
    fn register_feedback_is_not_a_cycle() {
        let mut ctx = Context::new("top");
        let zero = lit(&mut ctx, 0, 4);
        let one = lit(&mut ctx, 1, 4);
        let cnt = ctx.try_create_register(4, Some(zero), "cnt", loc()).unwrap();
        let inc = ctx.try_create_op(Opcode::Add, cnt, one, "inc", loc()).unwrap();
        ctx.set_next(cnt, inc).unwrap();
        assert_eq!(ctx.get_next(cnt), Some(inc));
        let order = ctx.get_eval_list().unwrap();
        let pos = |id| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(cnt) < pos(inc));
        assert!(pos(zero) < pos(cnt));
    }

    #[test]
    fn combinational_loop_is_reported() {
        let mut ctx = Context::new("top");
        let a = ctx.try_create_node(NodeKind::Proxy, 4, [None], "a", loc()).unwrap();
        let b = ctx.try_create_proxy(a, "b", loc()).unwrap();
        ctx.set_src(a, 0, Some(b)).unwrap();
        match ctx.get_eval_list() {
            Err(Error::CombinationalCycle { cycle }) => {
                let ids: Vec<u32> = cycle.iter().map(|(id, _)| *id).collect();
                assert_eq!(ids, vec![a.raw(), b.raw()]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_loop_is_reported() {
        let mut ctx = Context::new("top");
        let a = ctx.try_create_node(NodeKind::Proxy, 4, [None], "a", loc()).unwrap();
        ctx.set_src(a, 0, Some(a)).unwrap();
        assert!(ctx.get_eval_list().is_err());
    }

    #[test]
    fn registers_pick_up_default_clock() {
        let mut ctx = Context::new("top");
        let clk = ctx.try_create_input(1, "clk", loc()).unwrap();
        let rst = ctx.try_create_input(1, "reset", loc()).unwrap();
        ctx.set_default_clock(clk).unwrap();
        ctx.set_default_reset(rst).unwrap();
        let r = ctx.try_create_register(2, None, "r", loc()).unwrap();
        assert_eq!(
            ctx[r].kind,
            NodeKind::Register {
                clock: Some(clk),
                reset: Some(rst),
                enable: None
            }
        );
        assert!(ctx.set_default_clock(NodeId::new(1000)).is_err());
    }

    #[test]
    fn const_value_sees_through_proxies() {
        let mut ctx = Context::new("top");
        let k = lit(&mut ctx, 3, 2);
        let p = ctx.try_create_proxy(k, "p", loc()).unwrap();
        let q = ctx.try_create_proxy(p, "q", loc()).unwrap();
        assert_eq!(ctx.const_value(q), Some(&Value::from_u64(3, 2)));
        let i = ctx.try_create_input(2, "i", loc()).unwrap();
        assert_eq!(ctx.const_value(i), None);
    }

    #[test]
    fn memory_init_is_padded() {
        let mut ctx = Context::new("top");
        let m = ctx
            .try_create_memory(8, 4, vec![Value::from_u64(0x1ff, 9)], "m", loc())
            .unwrap();
        match &ctx[m].kind {
            NodeKind::Memory { init, depth, .. } => {
                assert_eq!(*depth, 4);
                assert_eq!(init.len(), 4);
                assert_eq!(init[0], Value::from_u64(0xff, 8));
            }
            other => panic!("not a memory: {other:?}"),
        }
        assert!(ctx.try_create_memory(8, 1, vec![Value::zero(8); 2], "m", loc()).is_err());
    }

    #[test]
    fn child_context_keeps_weak_parent() {
        let parent = rrc(Context::new("parent"));
        let child = Context::new_child("child", &parent);
        assert_eq!(child.parent().map(|p| p.borrow().name()), Some(Id::from("parent")));
        drop(parent);
        assert!(child.parent().is_none());
    }

    fn ranked_dag() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize)>)> {
        (2usize..24).prop_flat_map(|n| {
            (
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                prop::collection::vec((any::<usize>(), any::<usize>()), n),
            )
        })
    }

    proptest! {
        #[test]
        fn ids_are_unique_and_increasing(widths in prop::collection::vec(1u32..70, 1..40)) {
            let mut ctx = Context::new("ids");
            let mut last = None;
            for w in widths {
                let id = ctx.try_create_literal(Value::zero(w), "k", SrcLoc::unknown()).unwrap();
                prop_assert!(last.is_none_or(|l| l < id));
                last = Some(id);
            }
        }

        #[test]
        fn eval_list_is_topological((ranks, picks) in ranked_dag()) {
            let n = ranks.len();
            let mut ctx = Context::new("dag");
            let kind = NodeKind::Operation { op: Opcode::Add, signed: false };
            let ids: Vec<NodeId> = (0..n)
                .map(|i| {
                    ctx.try_create_node(kind.clone(), 4, [None, None], format!("n{i}"), SrcLoc::unknown())
                        .unwrap()
                })
                .collect();
            let mut by_rank = ids.clone();
            for (i, r) in ranks.iter().enumerate() {
                by_rank[*r] = ids[i];
            }
            for r in 1..n {
                let (a, b) = picks[r];
                ctx.set_src(by_rank[r], 0, Some(by_rank[a % r])).unwrap();
                ctx.set_src(by_rank[r], 1, Some(by_rank[b % r])).unwrap();
            }
            // A register fed from anywhere never constrains the order.
            let reg = ctx.try_create_register(4, None, "r", SrcLoc::unknown()).unwrap();
            ctx.set_next(reg, by_rank[n - 1]).unwrap();
            ctx.set_src(by_rank[0], 0, Some(reg)).unwrap();

            let order = ctx.get_eval_list().unwrap();
            prop_assert_eq!(order.len(), ctx.len());
            let mut pos = vec![usize::MAX; ctx.len()];
            for (i, id) in order.iter().enumerate() {
                prop_assert_eq!(pos[id.index()], usize::MAX);
                pos[id.index()] = i;
            }
            for node in ctx.nodes() {
                for dep in node.ordering_deps() {
                    prop_assert!(pos[dep.index()] < pos[node.id().index()]);
                }
            }
        }
    }
}
