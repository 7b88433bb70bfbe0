//! Sample designs built through the node factories.
pub mod counter;
pub mod fifo;

use cash_ir::{Context, ContextScope, RRC, rrc, with_ctx_curr};
use cash_utils::CashResult;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Design {
    #[default]
    Counter,
    Fifo,
}

impl FromStr for Design {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Design::Counter),
            "fifo" => Ok(Design::Fifo),
            _ => Err(format!(
                "unknown design `{s}`, expected one of: counter, fifo"
            )),
        }
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Design::Counter => write!(f, "counter"),
            Design::Fifo => write!(f, "fifo"),
        }
    }
}

impl Design {
    /// Build the design in a fresh context made current for the duration of
    /// construction.
    pub fn build(self, width: u32) -> CashResult<RRC<Context>> {
        let ctx = rrc(Context::new(self.to_string()));
        let _scope = ContextScope::enter(&ctx);
        with_ctx_curr(|ctx| match self {
            Design::Counter => counter::build(ctx, width).map(|_| ()),
            Design::Fifo => fifo::build(ctx, width).map(|_| ()),
        })?;
        Ok(ctx)
    }
}
