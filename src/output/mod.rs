use crate::models::TravelReport;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Output handler for travel reports
pub struct OutputHandler {
    format: OutputFormat,
    writer: Box<dyn Write + Send>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "console" => Ok(OutputFormat::Console),
            other => Err(format!(
                "unknown output format '{}' (expected json, jsonl or console)",
                other
            )),
        }
    }
}

impl OutputHandler {
    /// Create a new output handler. Without a file path, output goes to stdout.
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match file_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };

        Ok(OutputHandler { format, writer })
    }

    /// Write to an arbitrary sink
    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        OutputHandler { format, writer }
    }

    /// Write a travel report
    pub fn write_report(&mut self, report: &TravelReport) -> io::Result<()> {
        let output = match self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(report)?),
            OutputFormat::Jsonl => format!("{}\n", serde_json::to_string(report)?),
            OutputFormat::Console => format!("{}\n", Self::console_line(report)),
        };

        self.writer.write_all(output.as_bytes())?;
        self.writer.flush()
    }

    fn console_line(report: &TravelReport) -> String {
        let speed = if report.speed_kmh.is_infinite() {
            "unbounded".to_string()
        } else {
            format!("{:.0} km/h", report.speed_kmh)
        };
        format!(
            "[{}] {} {} -> {} ({} -> {}): {:.1} km in {:.2} h, {}",
            if report.suspicious { "SUSPICIOUS" } else { "ok" },
            report.username,
            report.from_event_id,
            report.to_event_id,
            report.from_timestamp,
            report.to_timestamp,
            report.distance_km,
            report.elapsed_hours,
            speed
        )
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
