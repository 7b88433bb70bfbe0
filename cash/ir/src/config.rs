use bon::Builder;

/// Largest id a context hands out by default. `u32::MAX` itself is kept free
/// so the id count always fits in a `u32`.
pub const MAX_NODE_ID: u32 = u32::MAX - 1;

/// Construction-time settings of a [Context](crate::Context).
#[derive(Debug, Clone, Copy, Builder)]
pub struct ContextConfig {
    /// largest node id the context may allocate
    #[builder(default = MAX_NODE_ID)]
    pub id_limit: u32,
    /// reject operations whose operand widths differ
    #[builder(default)]
    pub strict_widths: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            id_limit: MAX_NODE_ID,
            strict_widths: false,
        }
    }
}
