//! Sync progress reporting.
//!
//! Long sync passes report what is being hashed and ingested so users can
//! tell a slow pass from a stuck one. Progress is emitted on **stderr** so
//! stdout stays parseable for scripts.

use std::io::Write;

/// A single progress event during a sync pass.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// Scan phase: n files hashed out of total.
    Hashing { n: u64, total: u64 },
    /// Ingest phase: n files stored out of total; `file` is the current one.
    Ingesting { file: String, n: u64, total: u64 },
}

/// Reports sync progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress: "sync  hashing  12 / 40 files".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Hashing { n, total } => {
                format!(
                    "sync  hashing  {} / {} files\n",
                    format_number(*n),
                    format_number(*total)
                )
            }
            ProgressEvent::Ingesting { file, n, total } => {
                format!(
                    "sync  ingesting  {} / {} files  ({})\n",
                    format_number(*n),
                    format_number(*total),
                    file
                )
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Hashing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "hashing",
                "n": n,
                "total": total
            }),
            ProgressEvent::Ingesting { file, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "ingesting",
                "file": file,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl std::str::FromStr for ProgressMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human, or json.",
                other
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn mode_parses_known_names() {
        assert_eq!("off".parse::<ProgressMode>().unwrap(), ProgressMode::Off);
        assert_eq!("human".parse::<ProgressMode>().unwrap(), ProgressMode::Human);
        assert_eq!("json".parse::<ProgressMode>().unwrap(), ProgressMode::Json);
        assert!("loud".parse::<ProgressMode>().is_err());
    }
}
