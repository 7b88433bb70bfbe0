use cash_ir::{Node, NodeId, NodeKind, Opcode, SecondaryNodeMap, Value};
use num_traits::ToPrimitive;

pub(crate) type ValueMap = SecondaryNodeMap<Value>;

/// A slot an instruction needed was absent from the value map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MissingSlot(pub NodeId);

/// State change produced by the commit phase, applied once every sequential
/// instruction has sampled its inputs.
#[derive(Debug)]
pub(crate) enum Update {
    Register(NodeId, Value),
    MemWrite {
        mem: NodeId,
        addr: usize,
        data: Value,
    },
}

#[derive(Debug)]
pub(crate) struct MemoryState {
    width: u32,
    depth: u32,
    raddr: Option<NodeId>,
    waddr: Option<NodeId>,
    wdata: Option<NodeId>,
    wen: Option<NodeId>,
    init: Vec<Value>,
    storage: Vec<Value>,
}

impl MemoryState {
    fn index(&self, addr: &Value) -> usize {
        (addr.to_big_uint() % self.depth).to_usize().unwrap_or(0)
    }
}

/// How one node is evaluated. Literals have no instruction.
#[derive(Debug)]
pub(crate) enum Instruction {
    /// Driven from outside the design.
    Input,
    /// Output ports and proxies forward their driver.
    Copy { src: Option<NodeId>, width: u32 },
    Op {
        op: Opcode,
        signed: bool,
        width: u32,
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
    },
    Register {
        next: Option<NodeId>,
        /// Taken instead of `next` while `reset` is high.
        init: Option<NodeId>,
        reset: Option<NodeId>,
        width: u32,
    },
    Memory(MemoryState),
}

fn read(values: &ValueMap, src: Option<NodeId>) -> Result<Option<Value>, MissingSlot> {
    match src {
        None => Ok(None),
        Some(id) => values.get(id).cloned().map(Some).ok_or(MissingSlot(id)),
    }
}

fn write(values: &mut ValueMap, id: NodeId, v: Value) -> Result<(), MissingSlot> {
    let slot = values.get_mut(id).ok_or(MissingSlot(id))?;
    *slot = v;
    Ok(())
}

fn present(values: &ValueMap, id: NodeId) -> Result<(), MissingSlot> {
    if values.contains(id) {
        Ok(())
    } else {
        Err(MissingSlot(id))
    }
}

/// Result of `op` truncated to `width`, or `None` on division by zero.
///
/// Operands are extended (by sign when `signed`) to the widest of the
/// operands and the result before computing, so explicit narrow results
/// truncate the way a Verilog assignment does.
pub(crate) fn eval_op(op: Opcode, signed: bool, width: u32, lhs: &Value, rhs: &Value) -> Option<Value> {
    let w = if op.is_unary() || op.is_shift() {
        width.max(lhs.width())
    } else {
        width.max(lhs.width()).max(rhs.width())
    };
    let a = lhs.resize(w, signed);
    let b = rhs.resize(w, signed);
    let shamt = || rhs.to_u64().unwrap_or(u64::MAX);
    let ord = || {
        let cw = lhs.width().max(rhs.width());
        lhs.resize(cw, signed).compare(&rhs.resize(cw, signed), signed)
    };
    let flag = |bit: bool| Value::from_bool(bit).resize(w, false);
    let out = match op {
        Opcode::Add => a.add(&b),
        Opcode::Sub => a.sub(&b),
        Opcode::Mul => a.mul(&b),
        Opcode::Div => a.checked_div(&b, signed)?,
        Opcode::Mod => a.checked_rem(&b, signed)?,
        Opcode::And => a.and(&b),
        Opcode::Or => a.or(&b),
        Opcode::Xor => a.xor(&b),
        Opcode::Not => a.not(),
        Opcode::Neg => a.neg(),
        Opcode::Shl => a.shl(shamt()),
        Opcode::Shr => a.shr(shamt(), signed),
        Opcode::Eq => flag(ord().is_eq()),
        Opcode::Ne => flag(ord().is_ne()),
        Opcode::Lt => flag(ord().is_lt()),
        Opcode::Le => flag(ord().is_le()),
        Opcode::Gt => flag(ord().is_gt()),
        Opcode::Ge => flag(ord().is_ge()),
    };
    Some(out.truncate(width))
}

impl Instruction {
    pub fn build(node: &Node) -> Option<Self> {
        let width = node.width();
        Some(match &node.kind {
            NodeKind::Literal { .. } => return None,
            NodeKind::Input { .. } => Instruction::Input,
            NodeKind::Output | NodeKind::Proxy => Instruction::Copy {
                src: node.src(0),
                width,
            },
            NodeKind::Operation { op, signed } => Instruction::Op {
                op: *op,
                signed: *signed,
                width,
                lhs: node.src(0),
                rhs: node.src(1),
            },
            NodeKind::Register { reset, .. } => Instruction::Register {
                next: node.src(NodeKind::REG_NEXT),
                init: node.src(NodeKind::REG_INIT),
                reset: *reset,
                width,
            },
            NodeKind::Memory { depth, init, .. } => Instruction::Memory(MemoryState {
                width,
                depth: *depth,
                raddr: node.src(NodeKind::MEM_RADDR),
                waddr: node.src(NodeKind::MEM_WADDR),
                wdata: node.src(NodeKind::MEM_WDATA),
                wen: node.src(NodeKind::MEM_WEN),
                init: init.clone(),
                storage: init.clone(),
            }),
        })
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Instruction::Register { .. } | Instruction::Memory(_))
    }

    /// Combinational evaluation of node `id`.
    pub fn eval(&self, id: NodeId, values: &mut ValueMap) -> Result<(), MissingSlot> {
        match self {
            Instruction::Input | Instruction::Register { .. } => present(values, id),
            Instruction::Copy { src, width } => match read(values, *src)? {
                Some(v) => write(values, id, v.resize(*width, false)),
                None => present(values, id),
            },
            Instruction::Op {
                op,
                signed,
                width,
                lhs,
                rhs,
            } => {
                let zero = Value::zero(*width);
                let a = read(values, *lhs)?.unwrap_or_else(|| zero.clone());
                let b = read(values, *rhs)?.unwrap_or(zero);
                let out = eval_op(*op, *signed, *width, &a, &b).unwrap_or_else(|| {
                    log::warn!("{id}: `{op}` by zero, result forced to 0");
                    Value::zero(*width)
                });
                write(values, id, out)
            }
            Instruction::Memory(mem) => {
                let addr = read(values, mem.raddr)?.map_or(0, |a| mem.index(&a));
                let word = mem
                    .storage
                    .get(addr)
                    .cloned()
                    .unwrap_or_else(|| Value::zero(mem.width));
                write(values, id, word)
            }
        }
    }

    /// Slots read by [sample](Self::sample).
    pub fn sampled(&self) -> impl Iterator<Item = NodeId> {
        let srcs = match self {
            Instruction::Register {
                next, init, reset, ..
            } => [*next, *init, *reset],
            Instruction::Memory(mem) => [mem.waddr, mem.wdata, mem.wen],
            _ => [None; 3],
        };
        srcs.into_iter().flatten()
    }

    /// Sample the inputs of a sequential element from the values settled
    /// before the clock edge.
    pub fn sample(&self, id: NodeId, values: &ValueMap) -> Result<Option<Update>, MissingSlot> {
        match self {
            Instruction::Register {
                next,
                init,
                reset,
                width,
            } => {
                present(values, id)?;
                let in_reset = read(values, *reset)?.is_some_and(|r| r.is_true());
                let src = if in_reset && init.is_some() { *init } else { *next };
                // Missing next: the register holds.
                Ok(read(values, src)?.map(|v| Update::Register(id, v.resize(*width, false))))
            }
            Instruction::Memory(mem) => {
                if !read(values, mem.wen)?.is_some_and(|en| en.is_true()) {
                    return Ok(None);
                }
                let addr = read(values, mem.waddr)?.map_or(0, |a| mem.index(&a));
                let data = read(values, mem.wdata)?
                    .map(|d| d.resize(mem.width, false))
                    .unwrap_or_else(|| Value::zero(mem.width));
                Ok(Some(Update::MemWrite { mem: id, addr, data }))
            }
            _ => Ok(None),
        }
    }

    pub fn store(&mut self, addr: usize, data: Value) {
        if let Instruction::Memory(mem) = self {
            if let Some(word) = mem.storage.get_mut(addr) {
                *word = data;
            }
        }
    }

    /// Current contents of a memory instruction.
    pub fn storage(&self) -> Option<&[Value]> {
        match self {
            Instruction::Memory(mem) => Some(&mem.storage),
            _ => None,
        }
    }

    /// Drop state accumulated since power-on.
    pub fn reset(&mut self) {
        if let Instruction::Memory(mem) = self {
            mem.storage.clone_from(&mem.init);
        }
    }
}
