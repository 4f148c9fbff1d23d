use std::fmt;

/// Kind of target a test binary was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunType {
    #[default]
    Tests,
    Doctests,
    Benchmarks,
    Examples,
    Lib,
    Bins,
    AllTargets,
}

impl RunType {
    /// Parse the `ty` field of a binary launch; anything unrecognised is `Tests`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Doctests" => RunType::Doctests,
            "Benchmarks" => RunType::Benchmarks,
            "Examples" => RunType::Examples,
            "Lib" => RunType::Lib,
            "Bins" => RunType::Bins,
            "AllTargets" => RunType::AllTargets,
            _ => RunType::Tests,
        }
    }
}

/// POSIX signals a traced process can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Sighup,
    Sigint,
    Sigill,
    Sigquit,
    Sigabrt,
    Sigfpe,
    Sigkill,
    Sigsegv,
    Sigpipe,
    Sigalrm,
    Sigterm,
    Sigusr1,
    Sigusr2,
    Sigchld,
    Sigcont,
    Sigstop,
    Sigtstp,
    Sigttin,
    Sigttou,
    Unknown,
}

const SIGNAL_NAMES: [(Signal, &str); 19] = [
    (Signal::Sighup, "SIGHUP"),
    (Signal::Sigint, "SIGINT"),
    (Signal::Sigill, "SIGILL"),
    (Signal::Sigquit, "SIGQUIT"),
    (Signal::Sigabrt, "SIGABRT"),
    (Signal::Sigfpe, "SIGFPE"),
    (Signal::Sigkill, "SIGKILL"),
    (Signal::Sigsegv, "SIGSEGV"),
    (Signal::Sigpipe, "SIGPIPE"),
    (Signal::Sigalrm, "SIGALRM"),
    (Signal::Sigterm, "SIGTERM"),
    (Signal::Sigusr1, "SIGUSR1"),
    (Signal::Sigusr2, "SIGUSR2"),
    (Signal::Sigchld, "SIGCHLD"),
    (Signal::Sigcont, "SIGCONT"),
    (Signal::Sigstop, "SIGSTOP"),
    (Signal::Sigtstp, "SIGTSTP"),
    (Signal::Sigttin, "SIGTTIN"),
    (Signal::Sigttou, "SIGTTOU"),
];

impl Signal {
    /// Unrecognised names map to [`Signal::Unknown`] rather than failing.
    pub fn from_name(name: &str) -> Self {
        SIGNAL_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(sig, _)| *sig)
            .unwrap_or(Signal::Unknown)
    }

    pub fn name(self) -> &'static str {
        SIGNAL_NAMES
            .iter()
            .find(|(sig, _)| *sig == self)
            .map(|(_, n)| *n)
            .unwrap_or("UNKNOWN")
    }

    /// Signals that mean the traced process crashed
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Signal::Sigsegv | Signal::Sigill | Signal::Sigfpe | Signal::Sigabrt
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u64,
}

/// A test binary being launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLaunch {
    pub path: String,
    pub run_type: Option<RunType>,
    pub cargo_dir: Option<String>,
    pub pkg_name: Option<String>,
    pub should_panic: bool,
}

/// A single traced operation on a process or thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceEvent {
    pub pid: Option<u64>,
    pub child: Option<u64>,
    pub signal: Option<Signal>,
    pub addr: Option<u64>,
    pub return_code: Option<i64>,
    pub location: Option<SourceLocation>,
    pub description: String,
}

impl TraceEvent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_pid(mut self, pid: u64) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_child(mut self, child: u64) -> Self {
        self.child = Some(child);
        self
    }

    pub fn with_return_code(mut self, code: i64) -> Self {
        self.return_code = Some(code);
        self
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u64) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line,
        });
        self
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pid) = self.pid {
            writeln!(f, "pid: {}", pid)?;
        }
        if let Some(child) = self.child {
            writeln!(f, "child: {}", child)?;
        }
        if let Some(signal) = self.signal {
            writeln!(f, "{}", signal)?;
        }
        if let Some(addr) = self.addr {
            writeln!(f, "addr: {:#x}", addr)?;
        }
        if let Some(ret) = self.return_code {
            writeln!(f, "return: {}", ret)?;
        }
        if let Some(loc) = &self.location {
            writeln!(f, "{}:{}", loc.file, loc.line)?;
        }
        f.write_str(&self.description)
    }
}

/// One entry of the execution event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Config { name: String },
    Binary(BinaryLaunch),
    Trace(TraceEvent),
    Marker,
}

impl Event {
    pub fn config(name: impl Into<String>) -> Self {
        Event::Config { name: name.into() }
    }

    pub fn binary(path: impl Into<String>) -> Self {
        Event::Binary(BinaryLaunch {
            path: path.into(),
            run_type: None,
            cargo_dir: None,
            pkg_name: None,
            should_panic: false,
        })
    }

    pub fn as_trace(&self) -> Option<&TraceEvent> {
        match self {
            Event::Trace(trace) => Some(trace),
            _ => None,
        }
    }

    /// Short tag used in listings
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Config { .. } => "Config",
            Event::Binary(_) => "Binary",
            Event::Trace(_) => "Trace",
            Event::Marker => "Marker",
        }
    }

    /// Text the renderer measures and draws for this event
    pub fn label(&self) -> String {
        match self {
            Event::Config { name } => name.clone(),
            Event::Binary(bin) => bin.path.clone(),
            Event::Trace(trace) => trace.to_string(),
            Event::Marker => String::new(),
        }
    }
}

impl From<TraceEvent> for Event {
    fn from(trace: TraceEvent) -> Self {
        Event::Trace(trace)
    }
}

pub fn pid_of(event: &Event) -> Option<u64> {
    event.as_trace().and_then(|t| t.pid)
}

pub fn child_of(event: &Event) -> Option<u64> {
    event.as_trace().and_then(|t| t.child)
}

/// A trace with a return code closes its call chain; every other event kind
/// is terminal by definition.
pub fn is_terminal(event: &Event) -> bool {
    match event {
        Event::Trace(trace) => trace.return_code.is_some(),
        _ => true,
    }
}

pub fn is_marker(event: &Event) -> bool {
    matches!(event, Event::Marker)
}

pub fn is_failing(event: &Event) -> bool {
    match event {
        Event::Trace(trace) => {
            trace.return_code.map_or(false, |code| code != 0)
                || trace.signal.map_or(false, Signal::is_fatal)
        }
        _ => false,
    }
}
