//! Line classification for `cargo -v` logs.
//!
//! A diagnostic location line (`  --> src/lib.rs:3:5`) only counts when it
//! directly follows a `warning: ` header, so the scanner keeps one bit of
//! state between lines.

use regex::Regex;
use std::sync::LazyLock;

static RUSTC_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ +Running `(?:\S*/)?rustc (.*)`$").expect("valid rustc pattern")
});

static WARNING_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *--> ([^:]*):[0-9]+").expect("valid location pattern"));

const WARNING_HEADER: &str = "warning: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine<'a> {
    /// rustc arguments of a `Running` line
    Invocation(&'a str),
    DiagnosticHeader,
    /// File path of a `-->` line
    DiagnosticLocation(&'a str),
    Other,
}

pub fn classify(line: &str) -> LogLine<'_> {
    if line.starts_with(WARNING_HEADER) {
        return LogLine::DiagnosticHeader;
    }
    if let Some(caps) = RUSTC_CALL.captures(line)
        && let Some(args) = caps.get(1)
    {
        return LogLine::Invocation(args.as_str());
    }
    if let Some(caps) = WARNING_LOCATION.captures(line)
        && let Some(path) = caps.get(1)
    {
        return LogLine::DiagnosticLocation(path.as_str());
    }
    LogLine::Other
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ScanState {
    #[default]
    Idle,
    AfterDiagnosticHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent<'a> {
    Invocation { line_num: usize, args: &'a str },
    WarnedFile(&'a str),
}

/// Feeds log lines in order and reports the ones that matter.
#[derive(Debug, Default)]
pub struct LogScanner {
    state: ScanState,
    line_num: usize,
}

impl LogScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed<'a>(&mut self, line: &'a str) -> Option<LogEvent<'a>> {
        self.line_num += 1;
        let previous = self.state;
        let kind = classify(line);
        self.state = match kind {
            LogLine::DiagnosticHeader => ScanState::AfterDiagnosticHeader,
            _ => ScanState::Idle,
        };
        match (previous, kind) {
            (_, LogLine::Invocation(args)) => Some(LogEvent::Invocation {
                line_num: self.line_num,
                args,
            }),
            (ScanState::AfterDiagnosticHeader, LogLine::DiagnosticLocation(path)) => {
                Some(LogEvent::WarnedFile(path))
            }
            _ => None,
        }
    }
}
