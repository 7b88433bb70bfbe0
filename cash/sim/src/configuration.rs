use bon::Builder;

// this can be a copy type because it's just a bunch of bools
/// Configuration struct controlling how a simulation pass behaves.
#[derive(Debug, Default, Clone, Copy, Builder)]
pub struct RuntimeConfig {
    /// abort a pass at the first missing value instead of skipping
    #[builder(default)]
    pub strict: bool,
    /// log port and register values after every tick at trace level
    #[builder(default)]
    pub trace: bool,
}
