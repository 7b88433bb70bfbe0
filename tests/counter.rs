use cash::designs::{Design, counter};
use cash_ir::Context;
use cash_sim::Simulator;
use proptest::prelude::*;

fn counter_ctx(width: u32) -> (Context, counter::Counter) {
    let mut ctx = Context::new("counter");
    let handles = counter::build(&mut ctx, width).unwrap();
    (ctx, handles)
}

#[test]
fn register_lags_one_tick() {
    let (ctx, c) = counter_ctx(4);
    let mut sim = Simulator::new(&ctx).unwrap();
    for k in 1..=18u64 {
        sim.tick().unwrap();
        let cnt = sim.get_u64(c.out).unwrap();
        assert_eq!(cnt, (k - 1) % 16, "count after tick {k}");
        assert_eq!(sim.get_u64(c.cnt), Some(cnt));
        assert_eq!(sim.get_u64(c.out_n), Some(15 - cnt), "complement after tick {k}");
    }
}

#[test]
fn synchronous_reset_restarts_the_count() {
    let (ctx, c) = counter_ctx(4);
    let mut sim = Simulator::new(&ctx).unwrap();
    sim.tick_n(6).unwrap();
    assert_eq!(sim.get_u64(c.out), Some(5));
    // The reset input is sampled at the edge of the same tick.
    sim.set_u64(c.reset, 1).unwrap();
    sim.tick().unwrap();
    assert_eq!(sim.get_u64(c.out), Some(0));
    sim.set_u64(c.reset, 0).unwrap();
    sim.tick_n(3).unwrap();
    assert_eq!(sim.get_u64(c.out), Some(3));
}

#[test]
fn simulator_reset_rewinds() {
    let (ctx, c) = counter_ctx(8);
    let mut sim = Simulator::new(&ctx).unwrap();
    sim.tick_n(40).unwrap();
    assert_eq!(sim.get_u64(c.out), Some(39));
    sim.reset();
    assert_eq!(sim.ticks(), 0);
    sim.tick().unwrap();
    assert_eq!(sim.get_u64(c.out), Some(0));
    assert_eq!(sim.get_u64(c.out_n), Some(0xff));
}

#[test]
fn built_through_the_current_context() {
    let ctx = Design::Counter.build(4).unwrap();
    assert!(cash_ir::ctx_curr().is_none());
    let ctx = ctx.borrow();
    assert_eq!(ctx.inputs().count(), 2);
    assert_eq!(ctx.outputs().count(), 2);
    assert_eq!(ctx.registers().count(), 1);
    let clk = ctx.find("clk").unwrap();
    assert_eq!(ctx.default_clock(), Some(clk));
}

proptest! {
    #[test]
    fn wraps_at_any_width(width in 1u32..=16, ticks in 1u64..100) {
        let (ctx, c) = counter_ctx(width);
        let mut sim = Simulator::new(&ctx).unwrap();
        sim.tick_n(ticks).unwrap();
        let mask = (1u64 << width) - 1;
        prop_assert_eq!(sim.get_u64(c.out), Some((ticks - 1) & mask));
        prop_assert_eq!(sim.get_u64(c.out_n), Some(!(ticks - 1) & mask));
    }
}
