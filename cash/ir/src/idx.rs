//! Dense node indices and the maps keyed by them.
use std::{fmt, ops};

/// Identity of a node within its owning [Context](crate::Context).
///
/// Ids are handed out in creation order and double as the arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(input: usize) -> Self {
        Self(input as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(input: u32) -> Self {
        NodeId(input)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primary storage: one entry per node, in id order.
#[derive(Debug, Clone)]
pub struct NodeMap<D> {
    data: Vec<D>,
}

impl<D> Default for NodeMap<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> NodeMap<D> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(size: usize) -> Self {
        Self {
            data: Vec::with_capacity(size),
        }
    }

    pub fn get(&self, index: NodeId) -> Option<&D> {
        self.data.get(index.index())
    }

    pub fn get_mut(&mut self, index: NodeId) -> Option<&mut D> {
        self.data.get_mut(index.index())
    }

    pub fn contains(&self, index: NodeId) -> bool {
        index.index() < self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push(&mut self, item: D) -> NodeId {
        self.data.push(item);
        NodeId::new(self.data.len() - 1)
    }

    pub fn peek_next_idx(&self) -> NodeId {
        NodeId::new(self.data.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &D)> {
        self.data.iter().enumerate().map(|(i, v)| (NodeId::new(i), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &D> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeId> + use<D> {
        (0..self.data.len()).map(NodeId::new)
    }
}

impl<D> ops::Index<NodeId> for NodeMap<D> {
    type Output = D;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.data[index.index()]
    }
}

impl<D> ops::IndexMut<NodeId> for NodeMap<D> {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.data[index.index()]
    }
}

/// Sparse side table keyed by [NodeId]. Absent entries read as `None`.
#[derive(Debug, Clone)]
pub struct SecondaryNodeMap<D> {
    data: Vec<Option<D>>,
}

impl<D> Default for SecondaryNodeMap<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> SecondaryNodeMap<D> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(size: usize) -> Self {
        Self {
            data: Vec::with_capacity(size),
        }
    }

    pub fn insert(&mut self, index: NodeId, item: D) -> Option<D> {
        if index.index() >= self.data.len() {
            self.data.resize_with(index.index() + 1, || None);
        }
        self.data[index.index()].replace(item)
    }

    pub fn remove(&mut self, index: NodeId) -> Option<D> {
        self.data.get_mut(index.index()).and_then(Option::take)
    }

    pub fn get(&self, index: NodeId) -> Option<&D> {
        self.data.get(index.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: NodeId) -> Option<&mut D> {
        self.data.get_mut(index.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, index: NodeId) -> bool {
        self.get(index).is_some()
    }

    pub fn clear(&mut self) {
        self.data.clear()
    }

    /// Number of populated entries.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|d| d.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &D)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (NodeId::new(i), v)))
    }
}
