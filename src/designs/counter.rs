use cash_ir::{Context, NodeId, Opcode, SrcLoc, Value};
use cash_utils::CashResult;

/// Handles into a free-running counter.
#[derive(Debug, Clone, Copy)]
pub struct Counter {
    pub clk: NodeId,
    pub reset: NodeId,
    pub cnt: NodeId,
    /// Current count.
    pub out: NodeId,
    /// Bitwise complement of the count.
    pub out_n: NodeId,
}

/// `cnt <= cnt + 1` with a synchronous reset to zero.
pub fn build(ctx: &mut Context, width: u32) -> CashResult<Counter> {
    let loc = SrcLoc::caller();
    let clk = ctx.try_create_input(1, "clk", loc)?;
    let reset = ctx.try_create_input(1, "reset", loc)?;
    ctx.set_default_clock(clk)?;
    ctx.set_default_reset(reset)?;

    let zero = ctx.try_create_literal(Value::zero(width), "zero", loc)?;
    let one = ctx.try_create_literal(Value::from_u64(1, width), "one", loc)?;
    let cnt = ctx.try_create_register(width, Some(zero), "cnt", loc)?;
    let inc = ctx.try_create_op(Opcode::Add, cnt, one, "inc", loc)?;
    ctx.set_next(cnt, inc)?;

    let ncnt = ctx.try_create_op_with(Opcode::Not.into(), cnt, None, "ncnt", loc)?;
    let out = ctx.try_create_output(width, "out", loc)?;
    ctx.bind_output(out, cnt)?;
    let out_n = ctx.try_create_output(width, "out_n", loc)?;
    ctx.bind_output(out_n, ncnt)?;

    Ok(Counter {
        clk,
        reset,
        cnt,
        out,
        out_n,
    })
}
