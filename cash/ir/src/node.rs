use crate::{NodeId, Value};
use cash_utils::{GetName, Id, SrcLoc};
use smallvec::SmallVec;
use std::fmt;

/// Positional source list of a node. Unconnected slots are `None`.
pub type Sources = SmallVec<[Option<NodeId>; 2]>;

/// Operators carried by [NodeKind::Operation].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Neg,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Opcode {
    pub const ALL: [Opcode; 18] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Not,
        Opcode::Neg,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Eq,
        Opcode::Ne,
        Opcode::Lt,
        Opcode::Le,
        Opcode::Gt,
        Opcode::Ge,
    ];

    pub fn is_unary(self) -> bool {
        matches!(self, Opcode::Not | Opcode::Neg)
    }

    pub fn is_compare(self) -> bool {
        matches!(
            self,
            Opcode::Eq | Opcode::Ne | Opcode::Lt | Opcode::Le | Opcode::Gt | Opcode::Ge
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, Opcode::Shl | Opcode::Shr)
    }

    pub fn arity(self) -> usize {
        if self.is_unary() { 1 } else { 2 }
    }

    /// Width of the result when none is requested explicitly.
    pub fn result_width(self, lhs: u32, rhs: Option<u32>) -> u32 {
        if self.is_compare() {
            1
        } else if self.is_unary() || self.is_shift() {
            lhs
        } else {
            lhs.max(rhs.unwrap_or(lhs))
        }
    }

    /// Verilog operator. Signed right shifts use `>>>` instead.
    pub fn symbol(self) -> &'static str {
        match self {
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            Opcode::Div => "/",
            Opcode::Mod => "%",
            Opcode::And => "&",
            Opcode::Or => "|",
            Opcode::Xor => "^",
            Opcode::Not => "~",
            Opcode::Neg => "-",
            Opcode::Shl => "<<",
            Opcode::Shr => ">>",
            Opcode::Eq => "==",
            Opcode::Ne => "!=",
            Opcode::Lt => "<",
            Opcode::Le => "<=",
            Opcode::Gt => ">",
            Opcode::Ge => ">=",
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Not => "not",
            Opcode::Neg => "neg",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Eq => "eq",
            Opcode::Ne => "ne",
            Opcode::Lt => "lt",
            Opcode::Le => "le",
            Opcode::Gt => "gt",
            Opcode::Ge => "ge",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Kind-specific payload of a [Node].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal {
        value: Value,
    },
    /// Top-level input port. `driver` is an optional back-reference that
    /// never takes part in evaluation ordering.
    Input {
        default: Value,
        driver: Option<NodeId>,
        proxy: Option<NodeId>,
    },
    /// Top-level output port. Source 0 is the port's proxy.
    Output,
    /// Sources: [`NodeKind::REG_INIT`], [`NodeKind::REG_NEXT`].
    Register {
        clock: Option<NodeId>,
        reset: Option<NodeId>,
        enable: Option<NodeId>,
    },
    Operation {
        op: Opcode,
        signed: bool,
    },
    /// Pass-through. Source 0 is the driver.
    Proxy,
    /// Asynchronous-read, synchronous-write storage. Sources are the
    /// `MEM_*` positions.
    Memory {
        depth: u32,
        init: Vec<Value>,
        clock: Option<NodeId>,
    },
}

impl NodeKind {
    pub const REG_INIT: usize = 0;
    pub const REG_NEXT: usize = 1;
    pub const MEM_RADDR: usize = 0;
    pub const MEM_WADDR: usize = 1;
    pub const MEM_WDATA: usize = 2;
    pub const MEM_WEN: usize = 3;

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "literal",
            NodeKind::Input { .. } => "input",
            NodeKind::Output => "output",
            NodeKind::Register { .. } => "register",
            NodeKind::Operation { .. } => "operation",
            NodeKind::Proxy => "proxy",
            NodeKind::Memory { .. } => "memory",
        }
    }

    /// Maximum number of positional sources.
    pub fn max_srcs(&self) -> usize {
        match self {
            NodeKind::Literal { .. } | NodeKind::Input { .. } => 0,
            NodeKind::Output | NodeKind::Proxy => 1,
            NodeKind::Register { .. } => 2,
            NodeKind::Operation { op, .. } => op.arity(),
            NodeKind::Memory { .. } => 4,
        }
    }

    /// Whether the edge into source `pos` crosses a clock boundary.
    pub fn is_sequential_edge(&self, pos: usize) -> bool {
        match self {
            NodeKind::Register { .. } => pos == Self::REG_NEXT,
            NodeKind::Memory { .. } => pos != Self::MEM_RADDR,
            _ => false,
        }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, NodeKind::Register { .. } | NodeKind::Memory { .. })
    }
}

/// A vertex of the design graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: Id,
    width: u32,
    loc: SrcLoc,
    srcs: Sources,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        kind: NodeKind,
        width: u32,
        srcs: Sources,
        name: Id,
        loc: SrcLoc,
    ) -> Self {
        Node {
            id,
            name,
            width,
            loc,
            srcs,
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn loc(&self) -> SrcLoc {
        self.loc
    }

    pub fn srcs(&self) -> &[Option<NodeId>] {
        &self.srcs
    }

    pub fn src(&self, pos: usize) -> Option<NodeId> {
        self.srcs.get(pos).copied().flatten()
    }

    pub(crate) fn set_src(&mut self, pos: usize, src: Option<NodeId>) {
        if pos >= self.srcs.len() {
            self.srcs.resize(pos + 1, None);
        }
        self.srcs[pos] = src;
    }

    /// Connected sources whose edges constrain evaluation order, in
    /// positional order.
    pub fn ordering_deps(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.srcs
            .iter()
            .enumerate()
            .filter(|(pos, _)| !self.kind.is_sequential_edge(*pos))
            .filter_map(|(_, src)| *src)
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, NodeKind::Literal { .. })
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Literal { value } => Some(value),
            _ => None,
        }
    }

    /// Shallow structural equality: kind and payload, width, name and source
    /// ids. Ids and locations are ignored.
    pub fn equals(&self, other: &Node) -> bool {
        self.width == other.width
            && self.name == other.name
            && self.srcs == other.srcs
            && self.kind == other.kind
    }
}

impl GetName for Node {
    fn name(&self) -> Id {
        self.name
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {}<{}>", self.name, self.id, self.kind.kind_name(), self.width)?;
        if let NodeKind::Operation { op, signed } = self.kind {
            write!(f, " {}{op}", if signed { "s" } else { "" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn result_widths() {
        assert_eq!(Opcode::Add.result_width(4, Some(8)), 8);
        assert_eq!(Opcode::Lt.result_width(4, Some(8)), 1);
        assert_eq!(Opcode::Shl.result_width(4, Some(8)), 4);
        assert_eq!(Opcode::Not.result_width(6, None), 6);
        assert!(Opcode::ALL.iter().filter(|op| op.is_unary()).all(|op| op.arity() == 1));
    }

    #[test]
    fn register_next_is_not_an_ordering_dep() {
        let reg = Node::new(
            NodeId::new(3),
            NodeKind::Register {
                clock: None,
                reset: None,
                enable: None,
            },
            4,
            smallvec![Some(NodeId::new(0)), Some(NodeId::new(2))],
            Id::from("r"),
            SrcLoc::unknown(),
        );
        assert_eq!(reg.ordering_deps().collect::<Vec<_>>(), vec![NodeId::new(0)]);
        assert_eq!(reg.to_string(), "r#3 register<4>");
    }

    #[test]
    fn structural_equality_ignores_identity() {
        let lit = |name: &str| {
            Node::new(
                NodeId::new(0),
                NodeKind::Literal {
                    value: Value::from_u64(1, 4),
                },
                4,
                Sources::new(),
                Id::from(name),
                SrcLoc::unknown(),
            )
        };
        assert!(lit("a").equals(&lit("a")));
        assert!(!lit("a").equals(&lit("b")));
    }
}
