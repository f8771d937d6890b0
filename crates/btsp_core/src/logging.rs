use std::{
    fs::File,
    io::{self, Write},
};

use env_logger::{Builder, Target, WriteStyle, fmt::Formatter};
use log::Record;

use crate::{
    Error, Result,
    io::options::{LogFormat, SolverOptions},
};

/// Installs the global logger described by `options`. Fails when a logger
/// is already installed.
pub fn init_logger(options: &SolverOptions) -> Result<()> {
    let line = LineFormat {
        format: options.log_format,
        timestamp: options.log_timestamp,
    };

    let mut builder = Builder::new();
    builder
        .filter_level(options.log_level.to_filter())
        .write_style(WriteStyle::Never)
        .format(move |buf, record| line.write(buf, record))
        .target(log_target(options)?);

    builder
        .try_init()
        .map_err(|e| Error::other(format!("logger init failed: {e}")))
}

#[derive(Clone, Copy, Debug)]
struct LineFormat {
    format: LogFormat,
    timestamp: bool,
}

impl LineFormat {
    fn write(&self, buf: &mut Formatter, record: &Record<'_>) -> io::Result<()> {
        if self.timestamp {
            write!(buf, "{} ", buf.timestamp_millis())?;
        }
        match self.format {
            LogFormat::Compact => writeln!(buf, "{:<5} {}", record.level(), record.args()),
            LogFormat::Pretty => writeln!(
                buf,
                "{:<5} [{}] {}",
                record.level(),
                short_target(record.target()),
                record.args()
            ),
        }
    }
}

/// Drops the crate prefix: `btsp_core::search` logs as `search`.
fn short_target(target: &str) -> &str {
    target
        .split_once("::")
        .map_or(target, |(_, module)| module)
}

fn log_target(options: &SolverOptions) -> Result<Target> {
    let Some(path) = options.log_output_path() else {
        return Ok(Target::Stderr);
    };
    let file = File::create(path).map_err(|e| {
        Error::other(format!(
            "failed to create log output file {}: {e}",
            path.display()
        ))
    })?;
    Ok(Target::Pipe(Box::new(file)))
}
