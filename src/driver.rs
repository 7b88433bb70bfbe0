//! Driver for the `cash` binary.
use crate::cmdline::{BackendOpt, Opts};
use cash_backend::{Backend, DagBackend, VerilogBackend};
use cash_ir::{Context, GetName};
use cash_sim::{RuntimeConfig, Simulator};
use cash_utils::{CashResult, OutputFile};
use itertools::Itertools;
use std::io::Write;

/// Build the requested design and hand it to the selected backend.
pub fn run() -> CashResult<()> {
    let opts = Opts::get_opts()?;

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(opts.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    let ctx = opts.design.build(opts.width)?;
    let ctx = ctx.borrow();
    log::info!("built `{}` with {} nodes", ctx.name(), ctx.len());

    let config = RuntimeConfig::builder().strict(opts.strict).build();
    match opts.backend {
        BackendOpt::Verilog => VerilogBackend.run(&ctx, opts.output),
        BackendOpt::Dag if opts.annotate => {
            let mut sim = simulator(&ctx, config)?;
            sim.tick_n(opts.cycles)?;
            DagBackend::with_simulator(&sim).run(&ctx, opts.output)
        }
        BackendOpt::Dag => DagBackend::default().run(&ctx, opts.output),
        BackendOpt::Sim => {
            let mut sim = simulator(&ctx, config)?;
            dump_ports(&mut sim, opts.cycles, opts.output)
        }
    }
}

fn simulator(ctx: &Context, config: RuntimeConfig) -> CashResult<Simulator<'_>> {
    Ok(Simulator::with_config(ctx, config)?)
}

/// Tick `cycles` times, writing one line of port values per tick.
fn dump_ports(sim: &mut Simulator<'_>, cycles: u64, mut output: OutputFile) -> CashResult<()> {
    let ctx = sim.context();
    let ports = ctx.inputs().chain(ctx.outputs()).sorted().collect_vec();
    let mut out = output.get_write()?;
    writeln!(
        out,
        "tick {}",
        ports.iter().map(|p| ctx[*p].name()).join(" ")
    )?;
    for _ in 0..cycles {
        sim.tick()?;
        let values = ports
            .iter()
            .map(|p| sim.value(*p).map_or("x".to_string(), ToString::to_string))
            .join(" ");
        writeln!(out, "{} {values}", sim.ticks())?;
    }
    out.flush()?;
    Ok(())
}
