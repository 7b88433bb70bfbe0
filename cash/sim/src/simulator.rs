use crate::{
    RuntimeConfig,
    errors::{SimError, SimResult},
    instruction::{Instruction, MissingSlot, Update, ValueMap},
};
use cash_ir::{Context, GetName, Node, NodeId, NodeKind, SecondaryNodeMap, Value};

/// Value a slot holds right after initialization and after [Simulator::reset].
fn power_on_value(ctx: &Context, node: &Node) -> Value {
    match &node.kind {
        NodeKind::Literal { value } => value.clone(),
        NodeKind::Input { default, .. } => default.clone(),
        NodeKind::Register { .. } => node
            .src(NodeKind::REG_INIT)
            .and_then(|init| {
                let value = ctx.const_value(init);
                if value.is_none() {
                    log::debug!("{}: non-constant init ignored at power-on", node.name());
                }
                value
            })
            .map(|v| v.resize(node.width(), false))
            .unwrap_or_else(|| Value::zero(node.width())),
        _ => Value::zero(node.width()),
    }
}

fn skip(strict: bool, id: NodeId, slot: MissingSlot, missing: &mut Vec<NodeId>) -> SimResult<()> {
    if !missing.contains(&id) {
        log::warn!("skipping {id}: no value for {}", slot.0);
        missing.push(id);
    }
    if strict {
        return Err(SimError::MissingValues {
            nodes: std::mem::take(missing),
        });
    }
    Ok(())
}

/// Run the combinational instructions of `ids`, in order.
fn evaluate(
    ids: &[NodeId],
    instrs: &SecondaryNodeMap<Instruction>,
    values: &mut ValueMap,
    strict: bool,
    missing: &mut Vec<NodeId>,
) -> SimResult<()> {
    for &id in ids {
        let Some(instr) = instrs.get(id) else {
            continue;
        };
        if let Err(slot) = instr.eval(id, values) {
            skip(strict, id, slot, missing)?;
        }
    }
    Ok(())
}

/// Cycle simulator over a borrowed [Context].
///
/// A tick models one clock edge. All combinational nodes are first settled
/// on the current state and inputs, then every sequential element (register,
/// memory write port) samples those values and updates at once, and finally
/// the nodes that depend on state are settled again so outputs show the new
/// state.
///
/// The first pass after power-on or [reset](Self::reset) is not an edge for
/// elements whose sampled values depend on state: those keep their power-on
/// value through it. For `cnt.next = cnt + 1` the count thus reads `k - 1`
/// after tick `k`, while a register fed from literals or inputs alone takes
/// its next value on the first tick.
pub struct Simulator<'a> {
    ctx: &'a Context,
    config: RuntimeConfig,
    /// Topological order of every node.
    order: Vec<NodeId>,
    /// Nodes of `order` whose value depends on a register or memory.
    dependent: Vec<NodeId>,
    /// Registers and memories in id order, flagged when every slot they
    /// sample is independent of state.
    sequential: Vec<(NodeId, bool)>,
    instrs: SecondaryNodeMap<Instruction>,
    values: ValueMap,
    ticks: u64,
}

impl<'a> Simulator<'a> {
    pub fn new(ctx: &'a Context) -> SimResult<Self> {
        Self::with_config(ctx, RuntimeConfig::default())
    }

    pub fn with_config(ctx: &'a Context, config: RuntimeConfig) -> SimResult<Self> {
        let mut sim = Simulator {
            ctx,
            config,
            order: Vec::new(),
            dependent: Vec::new(),
            sequential: Vec::new(),
            instrs: SecondaryNodeMap::with_capacity(ctx.len()),
            values: ValueMap::with_capacity(ctx.len()),
            ticks: 0,
        };
        sim.initialize()?;
        Ok(sim)
    }

    /// Order the graph, allocate one slot per node and build the
    /// instructions. Fails on a combinational cycle.
    pub fn initialize(&mut self) -> SimResult<()> {
        self.order = self.ctx.get_eval_list()?;
        self.values.clear();
        self.instrs.clear();
        self.dependent.clear();
        self.sequential.clear();

        let mut stateless = SecondaryNodeMap::with_capacity(self.ctx.len());
        for &id in &self.order {
            let node = &self.ctx[id];
            let is_stateless = match &node.kind {
                NodeKind::Literal { .. } | NodeKind::Input { .. } => true,
                NodeKind::Register { .. } | NodeKind::Memory { .. } => false,
                _ => node
                    .srcs()
                    .iter()
                    .flatten()
                    .all(|src| stateless.get(*src).copied().unwrap_or(false)),
            };
            stateless.insert(id, is_stateless);
            if !is_stateless {
                self.dependent.push(id);
            }
            self.values.insert(id, power_on_value(self.ctx, node));
            if let Some(instr) = Instruction::build(node) {
                self.instrs.insert(id, instr);
            }
        }
        for (id, instr) in self.instrs.iter() {
            if instr.is_sequential() {
                let primed = instr
                    .sampled()
                    .all(|src| stateless.get(src).copied().unwrap_or(false));
                self.sequential.push((id, primed));
            }
        }
        self.ticks = 0;
        log::debug!(
            "simulating `{}`: {} nodes, {} instructions, {} sequential",
            self.ctx.name(),
            self.order.len(),
            self.instrs.count(),
            self.sequential.len()
        );
        Ok(())
    }

    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Cached evaluation order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Passes run since initialization or the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one pass: settle, commit sequential state, settle again.
    ///
    /// Instructions with a missing slot are skipped and the pass carries on;
    /// the skipped nodes are reported once the pass is over.
    pub fn eval(&mut self) -> SimResult<()> {
        let strict = self.config.strict;
        let mut missing = Vec::new();

        evaluate(&self.order, &self.instrs, &mut self.values, strict, &mut missing)?;

        let first = self.ticks == 0;
        let mut updates = Vec::with_capacity(self.sequential.len());
        for &(id, primed) in &self.sequential {
            if first && !primed {
                continue;
            }
            let Some(instr) = self.instrs.get(id) else {
                continue;
            };
            match instr.sample(id, &self.values) {
                Ok(Some(update)) => updates.push(update),
                Ok(None) => {}
                Err(slot) => skip(strict, id, slot, &mut missing)?,
            }
        }
        for update in updates {
            match update {
                Update::Register(id, value) => {
                    if let Some(slot) = self.values.get_mut(id) {
                        *slot = value;
                    }
                }
                Update::MemWrite { mem, addr, data } => {
                    log::trace!("{mem}[{addr}] <= {data}");
                    if let Some(instr) = self.instrs.get_mut(mem) {
                        instr.store(addr, data);
                    }
                }
            }
        }

        evaluate(&self.dependent, &self.instrs, &mut self.values, strict, &mut missing)?;

        self.ticks += 1;
        if self.config.trace {
            self.trace();
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SimError::MissingValues { nodes: missing })
        }
    }

    /// Advance one clock tick.
    pub fn tick(&mut self) -> SimResult<()> {
        self.eval()
    }

    /// Advance `n` ticks, stopping at the first failing one.
    pub fn tick_n(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(())
    }

    /// Return every slot and memory to its power-on state. Instructions stay
    /// cached.
    pub fn reset(&mut self) {
        for &id in &self.order {
            self.values.insert(id, power_on_value(self.ctx, &self.ctx[id]));
        }
        for &(id, _) in &self.sequential {
            if let Some(instr) = self.instrs.get_mut(id) {
                instr.reset();
            }
        }
        self.ticks = 0;
        log::debug!("reset `{}`", self.ctx.name());
    }

    fn node(&self, id: NodeId) -> SimResult<&'a Node> {
        self.ctx.node(id).ok_or(SimError::UnknownNode(id))
    }

    /// Overwrite the slot of `id`. The value must match the node width.
    pub fn set_value(&mut self, id: NodeId, value: Value) -> SimResult<()> {
        let node = self.node(id)?;
        if value.width() != node.width() {
            return Err(SimError::WidthMismatch {
                node: id,
                expected: node.width(),
                given: value.width(),
            });
        }
        self.values.insert(id, value);
        Ok(())
    }

    /// Overwrite the slot of `id` with `value` truncated to the node width.
    pub fn set_u64(&mut self, id: NodeId, value: u64) -> SimResult<()> {
        let width = self.node(id)?.width();
        self.set_value(id, Value::from_u64(value, width))
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn get_u64(&self, id: NodeId) -> Option<u64> {
        self.value(id).and_then(Value::to_u64)
    }

    /// Discard the slot of `id`. Instructions touching it are skipped until
    /// the next [reset](Self::reset) or [set_value](Self::set_value).
    pub fn remove_value(&mut self, id: NodeId) -> Option<Value> {
        self.values.remove(id)
    }

    /// Current contents of memory `mem`.
    pub fn memory(&self, mem: NodeId) -> Option<&[Value]> {
        self.instrs.get(mem).and_then(Instruction::storage)
    }

    fn trace(&self) {
        let watched = self
            .ctx
            .inputs()
            .chain(self.ctx.outputs())
            .chain(self.ctx.registers());
        for id in watched {
            if let Some(v) = self.values.get(id) {
                log::trace!("[{}] {} = {v}", self.ticks, self.ctx[id].name());
            }
        }
    }
}
