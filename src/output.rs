//! Logging setup and row-oriented output writers.

use crate::configuration::Configuration;
use color_eyre::eyre::{Result, WrapErr};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime as StdSystemTime;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Route all tracing output to the given log file, plain text, one record
/// per line with a seconds-precision timestamp.
pub fn setup_logging(path: &str) -> Result<()> {
    let log = File::create(path).wrap_err_with(|| format!("cannot create log file {}", path))?;
    let file_layer = layer()
        .with_writer(log)
        .with_timer(SecondPrecisionTimer)
        .with_ansi(false)
        .with_target(false);
    Registry::default().with(file_layer).init();
    Ok(())
}

/// Buffered writer for XYZ trajectory frames.
pub struct XyzWriter {
    out: BufWriter<File>,
}

impl XyzWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())
            .wrap_err_with(|| format!("cannot create xyz file {}", path.as_ref().display()))?;
        Ok(XyzWriter {
            out: BufWriter::new(file),
        })
    }

    /// One frame: particle count, blank comment line, then one
    /// `Ar x y 0.0` row per disk.
    pub fn write_frame(&mut self, configuration: &Configuration) -> Result<()> {
        writeln!(self.out, "{}", configuration.n())?;
        writeln!(self.out)?;
        for p in &configuration.positions {
            writeln!(self.out, "Ar {:.6} {:.6} 0.0", p.x, p.y)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Buffered writer for whitespace-separated numeric rows.
pub struct RowWriter {
    out: BufWriter<File>,
}

impl RowWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())
            .wrap_err_with(|| format!("cannot create output file {}", path.as_ref().display()))?;
        Ok(RowWriter {
            out: BufWriter::new(file),
        })
    }

    pub fn write_row(&mut self, row: &[f64]) -> Result<()> {
        for (k, value) in row.iter().enumerate() {
            if k > 0 {
                write!(self.out, " ")?;
            }
            write!(self.out, "{:.6}", value)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn write_pair(&mut self, a: f64, b: f64) -> Result<()> {
        writeln!(self.out, "{:.6} {:.6}", a, b)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
