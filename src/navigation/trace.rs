use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One navigation event, written as a JSON line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavTraceEvent {
    pub timestamp_ms: u128,

    /// Sequence number of the `navigate`/`open` call this event belongs to
    pub navigation: u64,

    /// "backtrace", "step" or "open"
    pub event: String,

    pub page: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NavTraceEvent {
    pub fn now(navigation: u64, event: &str, page: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            navigation,
            event: event.to_string(),
            page: page.to_string(),
            dest: None,
            step: None,
            rule: None,
            displayed: None,
            url: None,
        }
    }

    pub fn with_dest(mut self, dest: impl ToString) -> Self {
        self.dest = Some(dest.to_string());
        self
    }

    pub fn with_step(mut self, step: impl ToString, rule: impl ToString) -> Self {
        self.step = Some(step.to_string());
        self.rule = Some(rule.to_string());
        self
    }

    pub fn with_displayed(mut self, displayed: bool) -> Self {
        self.displayed = Some(displayed);
        self
    }

    pub fn with_url(mut self, url: impl ToString) -> Self {
        self.url = Some(url.to_string());
        self
    }
}

/// Appends `NavTraceEvent`s to a JSONL file. Write failures are logged and
/// otherwise ignored; tracing never fails a navigation.
pub struct TraceLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                warn!(path, error = %e, "could not open navigation trace file");
                Self { file: None }
            }
        }
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn log(&self, event: &NavTraceEvent) {
        let Some(file_mutex) = &self.file else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize trace event");
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "trace logger lock poisoned");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(error = %e, "failed to write trace event");
        }
    }
}
