use crate::CashResult;
use std::{
    fmt,
    io::{self, BufWriter},
    path::PathBuf,
    str::FromStr,
};

/// Possible choices for output streams. Used by the `-o` option of the driver.
/// * "-" and "<out>" are treated as stdout.
/// * "<err>" is treated as stderr.
/// * "<null>" is treated as a null output stream.
/// * All other strings are treated as file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFile {
    Null,
    Stdout,
    Stderr,
    File {
        path: PathBuf,
        // Has the writer been initialized?
        init: bool,
    },
}

impl OutputFile {
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        OutputFile::File {
            path: path.into(),
            init: false,
        }
    }

    /// Open a writer for this stream. The first call on a file truncates it and
    /// later calls append.
    pub fn get_write(&mut self) -> CashResult<Box<dyn io::Write>> {
        Ok(match self {
            OutputFile::Stdout => Box::new(BufWriter::new(io::stdout())),
            OutputFile::Stderr => Box::new(BufWriter::new(io::stderr())),
            OutputFile::File { path, init } => {
                let file = if *init {
                    std::fs::OpenOptions::new().append(true).open(&*path)?
                } else {
                    *init = true;
                    std::fs::File::create(&*path)?
                };
                Box::new(BufWriter::new(file))
            }
            OutputFile::Null => Box::new(io::sink()),
        })
    }
}

impl FromStr for OutputFile {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" => Err("empty output path".to_string()),
            "-" | "<out>" => Ok(OutputFile::Stdout),
            "<err>" => Ok(OutputFile::Stderr),
            "<null>" => Ok(OutputFile::Null),
            _ => Ok(OutputFile::file(s)),
        }
    }
}

impl fmt::Display for OutputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFile::Stdout => f.write_str("-"),
            OutputFile::Stderr => f.write_str("<err>"),
            OutputFile::Null => f.write_str("<null>"),
            OutputFile::File { path, .. } => {
                write!(f, "{}", path.to_string_lossy())
            }
        }
    }
}
