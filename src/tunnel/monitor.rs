//! Readiness monitoring for freshly spawned tunnel processes.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::output::OutputSanitizer;

/// Default startup window.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Markers whose presence in a line signals readiness.
pub const DEFAULT_SUCCESS_MARKERS: &[&str] = &["Public URL:", "https://", "http://"];

/// Success predicate applied to each output line.
///
/// Matching is a plain substring test. Any line mentioning a URL counts,
/// including unrelated diagnostics, so a tool that prints a documentation
/// link before failing will be reported as ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessMatcher {
    markers: Vec<String>,
}

impl ReadinessMatcher {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Whether `line` contains any marker.
    pub fn matches(&self, line: &str) -> bool {
        self.markers.iter().any(|m| line.contains(m.as_str()))
    }
}

impl Default for ReadinessMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_MARKERS.iter().copied())
    }
}

/// Why a monitored process did not become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The startup window elapsed first.
    DeadlineExceeded,
    /// Output ended without a matching line.
    ProcessExited,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::ProcessExited => f.write_str("process exited"),
        }
    }
}

/// The single result of monitoring one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// A line matched; `output` is everything captured up to and
    /// including it.
    Success { output: String },
    /// No match; `output` is everything captured so far.
    Failure {
        output: String,
        reason: FailureReason,
    },
}

impl MonitorOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Captured, sanitized output.
    pub fn output(&self) -> &str {
        match self {
            Self::Success { output } | Self::Failure { output, .. } => output,
        }
    }

    /// First URL in the captured output.
    pub fn public_url(&self) -> Option<&str> {
        extract_url(self.output())
    }
}

/// Find the first `http://` or `https://` URL in `text`.
pub fn extract_url(text: &str) -> Option<&str> {
    text.split_whitespace().find_map(|token| {
        let (start, scheme) = ["https://", "http://"]
            .into_iter()
            .find_map(|scheme| token.find(scheme).map(|i| (i, scheme)))?;
        let url = token[start..].trim_end_matches(|c: char| ",.;:)]}>'\"".contains(c));
        (url.len() > scheme.len()).then_some(url)
    })
}

/// Watches incremental output for readiness within a fixed deadline.
#[derive(Debug, Clone)]
pub struct TunnelMonitor {
    deadline: Duration,
    matcher: ReadinessMatcher,
}

impl TunnelMonitor {
    pub fn new(deadline: Duration, matcher: ReadinessMatcher) -> Self {
        Self { deadline, matcher }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn matcher(&self) -> &ReadinessMatcher {
        &self.matcher
    }

    /// Consume `lines` until the matcher matches, the stream ends, or the
    /// deadline passes, whichever comes first.
    ///
    /// Reading happens on its own task, which keeps draining `lines`
    /// after the outcome is decided so the producer never blocks. This
    /// call returns no later than the deadline.
    pub async fn watch(&self, lines: mpsc::Receiver<String>) -> MonitorOutcome {
        let transcript = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = oneshot::channel();

        tokio::spawn(read_until_ready(
            lines,
            self.matcher.clone(),
            Arc::clone(&transcript),
            tx,
        ));

        match tokio::time::timeout(self.deadline, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Reader task went away without reporting.
            Ok(Err(_)) => MonitorOutcome::Failure {
                output: render(&transcript),
                reason: FailureReason::ProcessExited,
            },
            Err(_) => MonitorOutcome::Failure {
                output: render(&transcript),
                reason: FailureReason::DeadlineExceeded,
            },
        }
    }
}

impl Default for TunnelMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE, ReadinessMatcher::default())
    }
}

fn render(transcript: &Mutex<Vec<String>>) -> String {
    let lines = transcript.lock().unwrap_or_else(PoisonError::into_inner);
    OutputSanitizer::sanitize(&lines.join("\n"))
}

async fn read_until_ready(
    mut lines: mpsc::Receiver<String>,
    matcher: ReadinessMatcher,
    transcript: Arc<Mutex<Vec<String>>>,
    tx: oneshot::Sender<MonitorOutcome>,
) {
    let mut tx = Some(tx);

    while let Some(raw) = lines.recv().await {
        // Decided, or nobody is listening any more: just drain.
        if tx.as_ref().map_or(true, oneshot::Sender::is_closed) {
            tracing::trace!(line = %raw, "tunnel output");
            continue;
        }

        let line = OutputSanitizer::strip_ansi_str(&raw);
        let matched = matcher.matches(&line);
        transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);

        if matched {
            if let Some(tx) = tx.take() {
                let _ = tx.send(MonitorOutcome::Success {
                    output: render(&transcript),
                });
            }
        }
    }

    if let Some(tx) = tx.take() {
        let _ = tx.send(MonitorOutcome::Failure {
            output: render(&transcript),
            reason: FailureReason::ProcessExited,
        });
    }
}
