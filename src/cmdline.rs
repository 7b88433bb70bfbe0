//! Command line parsing for the `cash` binary.
use crate::designs::Design;
use argh::FromArgs;
use cash_utils::{CashResult, Error, OutputFile};
use std::{fmt, str::FromStr};

/// Ways to consume a built design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendOpt {
    #[default]
    Verilog,
    Dag,
    Sim,
}

fn backends() -> Vec<(&'static str, BackendOpt)> {
    vec![
        ("verilog", BackendOpt::Verilog),
        ("dag", BackendOpt::Dag),
        ("sim", BackendOpt::Sim),
    ]
}

impl FromStr for BackendOpt {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let backends = backends();
        backends
            .iter()
            .find(|(name, _)| *name == input)
            .map(|(_, opt)| *opt)
            .ok_or_else(|| {
                let names = backends.iter().map(|(name, _)| *name).collect::<Vec<_>>();
                format!(
                    "`{input}` is not a valid backend.\nValid backends: {}",
                    names.join(", ")
                )
            })
    }
}

impl fmt::Display for BackendOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendOpt::Verilog => "verilog",
            BackendOpt::Dag => "dag",
            BackendOpt::Sim => "sim",
        };
        write!(f, "{name}")
    }
}

#[derive(FromArgs, Debug)]
/// Build a sample hardware design, then lower or simulate it.
pub struct Opts {
    /// design to build: counter or fifo
    #[argh(option, default = "Design::Counter")]
    pub design: Design,

    /// backend: verilog, dag or sim
    #[argh(option, short = 'b', default = "BackendOpt::default()")]
    pub backend: BackendOpt,

    /// output file, default is stdout
    #[argh(option, short = 'o', default = "OutputFile::Stdout")]
    pub output: OutputFile,

    /// number of ticks to simulate before dumping
    #[argh(option, default = "8")]
    pub cycles: u64,

    /// data width of the design
    #[argh(option, default = "4")]
    pub width: u32,

    /// annotate the graph with simulated values (dag backend only)
    #[argh(switch)]
    pub annotate: bool,

    /// abort simulation passes at the first missing value
    #[argh(switch)]
    pub strict: bool,

    /// logging level
    #[argh(option, long = "log-level", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,
}

impl Opts {
    pub fn get_opts() -> CashResult<Opts> {
        let opts: Opts = argh::from_env();
        if opts.width == 0 {
            return Err(Error::misc("--width must be at least 1"));
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let opts = Opts::from_args(&["cash"], &[]).unwrap();
        assert_eq!(opts.design, Design::Counter);
        assert_eq!(opts.backend, BackendOpt::Verilog);
        assert_eq!(opts.cycles, 8);
        assert_eq!(opts.log_level, log::LevelFilter::Warn);

        let opts = Opts::from_args(
            &["cash"],
            &["--design", "fifo", "-b", "dag", "--annotate", "-o", "<null>"],
        )
        .unwrap();
        assert_eq!(opts.design, Design::Fifo);
        assert_eq!(opts.backend, BackendOpt::Dag);
        assert!(opts.annotate);
        assert!(matches!(opts.output, OutputFile::Null));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!("vhdl".parse::<BackendOpt>().is_err());
        assert!(Opts::from_args(&["cash"], &["-b", "vhdl"]).is_err());
    }
}
