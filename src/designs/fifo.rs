use cash_ir::{Context, MemoryPorts, NodeId, Opcode, SrcLoc, Value};
use cash_utils::CashResult;

/// Number of entries. Pointers carry one extra bit to tell full from empty.
pub const DEPTH: u32 = 2;
const ADDR_WIDTH: u32 = 1;
const PTR_WIDTH: u32 = ADDR_WIDTH + 1;

/// Handles into a two-entry synchronous FIFO.
#[derive(Debug, Clone, Copy)]
pub struct Fifo {
    pub clk: NodeId,
    pub reset: NodeId,
    pub push: NodeId,
    pub pop: NodeId,
    pub din: NodeId,
    pub dout: NodeId,
    pub empty: NodeId,
    pub full: NodeId,
    pub mem: NodeId,
    pub wptr: NodeId,
    pub rptr: NodeId,
}

pub fn build(ctx: &mut Context, width: u32) -> CashResult<Fifo> {
    let loc = SrcLoc::caller();
    let clk = ctx.try_create_input(1, "clk", loc)?;
    let reset = ctx.try_create_input(1, "reset", loc)?;
    ctx.set_default_clock(clk)?;
    ctx.set_default_reset(reset)?;

    let push = ctx.try_create_input(1, "push", loc)?;
    let pop = ctx.try_create_input(1, "pop", loc)?;
    let din = ctx.try_create_input(width, "din", loc)?;
    let proxy = |ctx: &Context, input: NodeId| {
        ctx.input_proxy(input)
            .ok_or(cash_utils::Error::UnknownNode { id: input.raw() })
    };
    let (push_p, pop_p, din_p) = (proxy(ctx, push)?, proxy(ctx, pop)?, proxy(ctx, din)?);

    let zero = ctx.try_create_literal(Value::zero(PTR_WIDTH), "zero", loc)?;
    let mask = ctx.try_create_literal(Value::from_u64(1, PTR_WIDTH), "mask", loc)?;
    let depth = ctx.try_create_literal(Value::from_u64(DEPTH as u64, PTR_WIDTH), "depth", loc)?;
    let wptr = ctx.try_create_register(PTR_WIDTH, Some(zero), "wptr", loc)?;
    let rptr = ctx.try_create_register(PTR_WIDTH, Some(zero), "rptr", loc)?;

    // Pointers are equal when empty and `DEPTH` apart when full.
    let empty = ctx.try_create_op(Opcode::Eq, wptr, rptr, "is_empty", loc)?;
    let used = ctx.try_create_op(Opcode::Sub, wptr, rptr, "used", loc)?;
    let full = ctx.try_create_op(Opcode::Eq, used, depth, "is_full", loc)?;

    let not_full = ctx.try_create_op_with(Opcode::Not.into(), full, None, "not_full", loc)?;
    let not_empty = ctx.try_create_op_with(Opcode::Not.into(), empty, None, "not_empty", loc)?;
    let do_push = ctx.try_create_op(Opcode::And, push_p, not_full, "do_push", loc)?;
    let do_pop = ctx.try_create_op(Opcode::And, pop_p, not_empty, "do_pop", loc)?;

    let wnext = ctx.try_create_op(Opcode::Add, wptr, do_push, "wptr_next", loc)?;
    let rnext = ctx.try_create_op(Opcode::Add, rptr, do_pop, "rptr_next", loc)?;
    ctx.set_next(wptr, wnext)?;
    ctx.set_next(rptr, rnext)?;

    let sized = cash_ir::OpSpec::new(Opcode::And).sized(ADDR_WIDTH);
    let waddr = ctx.try_create_op_with(sized, wptr, Some(mask), "waddr", loc)?;
    let raddr = ctx.try_create_op_with(sized, rptr, Some(mask), "raddr", loc)?;

    let mem = ctx.try_create_memory(width, DEPTH, Vec::new(), "mem", loc)?;
    ctx.connect_memory(
        mem,
        MemoryPorts {
            raddr: Some(raddr),
            waddr: Some(waddr),
            wdata: Some(din_p),
            wen: Some(do_push),
        },
    )?;

    let dout = ctx.try_create_output(width, "dout", loc)?;
    ctx.bind_output(dout, mem)?;
    let empty_out = ctx.try_create_output(1, "empty", loc)?;
    ctx.bind_output(empty_out, empty)?;
    let full_out = ctx.try_create_output(1, "full", loc)?;
    ctx.bind_output(full_out, full)?;

    Ok(Fifo {
        clk,
        reset,
        push,
        pop,
        din,
        dout,
        empty: empty_out,
        full: full_out,
        mem,
        wptr,
        rptr,
    })
}
