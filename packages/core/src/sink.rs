//! The `progress|finding|warning|done` event stream, and its two
//! consumers: a tty progress bar and a newline-delimited JSON writer.
//!
//! Both implementations of [`EventSink`] consume the identical event
//! stream the Orchestrator emits; nothing about the orchestration logic
//! changes based on which one is in use.

use std::io::Write;

use serde::Serialize;
use stet_findings_models::Finding;

/// Final counters reported once a run completes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunStats {
    pub count: usize,
    pub eval_duration_ns: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Consumer of the orchestrator's event stream.
pub trait EventSink: Send {
    /// `hunk` is 1-based; `total` is the count of hunks in this run.
    fn progress(&mut self, hunk: usize, total: usize, file: &str);
    fn finding(&mut self, finding: &Finding);
    fn warning(&mut self, message: &str);
    fn done(&mut self, stats: &RunStats);
}

/// A carriage-returned progress line on stderr, with findings and
/// warnings printed as they arrive. Used when not streaming.
#[derive(Default)]
pub struct TtyProgressSink;

impl EventSink for TtyProgressSink {
    fn progress(&mut self, hunk: usize, total: usize, file: &str) {
        eprint!("\rreviewing {hunk}/{total}: {file}\x1b[K");
        let _ = std::io::stderr().flush();
    }

    fn finding(&mut self, finding: &Finding) {
        eprintln!(
            "\n{file}:{line}: [{severity}] {message}",
            file = finding.file,
            line = finding.line,
            severity = finding.severity.as_str(),
            message = finding.message
        );
    }

    fn warning(&mut self, message: &str) {
        eprintln!("\nwarning: {message}");
    }

    fn done(&mut self, stats: &RunStats) {
        eprintln!(
            "\ndone: {} finding(s), {} prompt tokens, {} completion tokens",
            stats.count, stats.prompt_tokens, stats.completion_tokens
        );
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Event<'a> {
    Progress { hunk: usize, total: usize, file: &'a str },
    Finding(&'a Finding),
    Warning { message: &'a str },
    Done {
        count: usize,
        eval_duration_ns: u64,
        prompt_tokens: u64,
        completion_tokens: u64,
    },
}

/// One JSON object per line, written to an arbitrary [`Write`]r. Used when
/// streaming is requested, so a caller can consume progress programmatically.
pub struct NdjsonSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> NdjsonSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_event(&mut self, event: &Event<'_>) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(self.writer, "{line}");
        }
    }
}

impl<W: Write + Send> EventSink for NdjsonSink<W> {
    fn progress(&mut self, hunk: usize, total: usize, file: &str) {
        self.write_event(&Event::Progress { hunk, total, file });
    }

    fn finding(&mut self, finding: &Finding) {
        self.write_event(&Event::Finding(finding));
    }

    fn warning(&mut self, message: &str) {
        self.write_event(&Event::Warning { message });
    }

    fn done(&mut self, stats: &RunStats) {
        self.write_event(&Event::Done {
            count: stats.count,
            eval_duration_ns: stats.eval_duration_ns,
            prompt_tokens: stats.prompt_tokens,
            completion_tokens: stats.completion_tokens,
        });
    }
}

#[cfg(test)]
mod tests {
    use stet_findings_models::{Category, Finding, Severity};

    use super::*;

    fn sample_finding() -> Finding {
        Finding::new(
            "a.rs".to_string(),
            1,
            None,
            Severity::Warning,
            Category::Bug,
            0.9,
            "looks off".to_string(),
            None,
        )
    }

    #[test]
    fn ndjson_sink_emits_one_line_per_event() {
        let mut buf = Vec::new();
        {
            let mut sink = NdjsonSink::new(&mut buf);
            sink.progress(1, 2, "a.rs");
            sink.finding(&sample_finding());
            sink.warning("malformed response");
            sink.done(&RunStats {
                count: 1,
                eval_duration_ns: 100,
                prompt_tokens: 10,
                completion_tokens: 20,
            });
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("\"type\":\"progress\""));
        assert!(lines[1].contains("\"type\":\"finding\""));
        assert!(lines[2].contains("\"type\":\"warning\""));
        assert!(lines[3].contains("\"type\":\"done\""));
    }
}
