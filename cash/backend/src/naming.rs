use crate::reserved_names::RESERVED_NAMES;
use cash_ir::{Context, GetName, Node, NodeId, NodeKind, SecondaryNodeMap};
use cash_utils::{Id, NameGenerator};
use itertools::Itertools;

/// Replace everything that is not a Verilog identifier character.
pub(crate) fn sanitize(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn base_name(node: &Node) -> String {
    let name = sanitize(node.name().as_str());
    if !name.is_empty() {
        return name;
    }
    match &node.kind {
        NodeKind::Literal { .. } => "lit",
        NodeKind::Input { .. } => "in",
        NodeKind::Output => "out",
        NodeKind::Register { .. } => "r",
        NodeKind::Operation { op, .. } => op.mnemonic(),
        NodeKind::Proxy => "p",
        NodeKind::Memory { .. } => "mem",
    }
    .to_string()
}

/// Unique, identifier-safe names for every node of a context.
///
/// Ports are named first, in id order, so they keep the name they were
/// created with whenever it is legal. The remaining nodes follow in
/// evaluation order. The result only depends on the graph.
#[derive(Debug, Clone)]
pub struct NodeNames {
    names: SecondaryNodeMap<Id>,
    /// Backing array of each memory.
    storage: SecondaryNodeMap<Id>,
}

impl NodeNames {
    pub fn new(ctx: &Context, order: &[NodeId], reserved: &[&str]) -> Self {
        let mut namegen = NameGenerator::with_prev_defined_names(
            RESERVED_NAMES.iter().chain(reserved).map(|s| Id::from(*s)),
        );
        let mut names = SecondaryNodeMap::with_capacity(ctx.len());
        let mut storage = SecondaryNodeMap::new();

        let ports = ctx.inputs().chain(ctx.outputs()).sorted();
        for id in ports.chain(order.iter().copied()) {
            if names.contains(id) {
                continue;
            }
            let node = &ctx[id];
            let name = namegen.gen_name(base_name(node));
            if matches!(node.kind, NodeKind::Memory { .. }) {
                storage.insert(id, namegen.gen_name(format!("{name}_data")));
            }
            names.insert(id, name);
        }
        NodeNames { names, storage }
    }

    pub fn get(&self, id: NodeId) -> Option<Id> {
        self.names.get(id).copied()
    }

    /// Name of `id`, or a positional placeholder for nodes outside the
    /// named set.
    pub fn name(&self, id: NodeId) -> Id {
        self.get(id)
            .unwrap_or_else(|| Id::from(format!("_n{}", id.raw())))
    }

    pub fn storage(&self, mem: NodeId) -> Option<Id> {
        self.storage.get(mem).copied()
    }
}
