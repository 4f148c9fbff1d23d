//! Reading execution event logs from JSON
//!
//! Each log entry is a single-key object naming the event kind. Optional
//! fields that are missing or have the wrong type are treated as absent; only
//! a document that is not JSON, or has no event array, fails the load.

use crate::error::{LoadError, LoadResult};
use crate::event::{BinaryLaunch, Event, RunType, Signal, SourceLocation, TraceEvent};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Anything that can hand the core an ordered event sequence
pub trait EventSource {
    fn events(&self) -> LoadResult<Vec<Event>>;
}

/// Event log stored as JSON, either in a file or in memory
#[derive(Debug, Clone)]
pub struct JsonEventLog {
    origin: Origin,
    project_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Text(String),
}

impl JsonEventLog {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
            project_root: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Text(text.into()),
            project_root: None,
        }
    }

    pub fn with_project_root(mut self, root: Option<PathBuf>) -> Self {
        self.project_root = root;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Text(_) => None,
        }
    }
}

impl EventSource for JsonEventLog {
    fn events(&self) -> LoadResult<Vec<Event>> {
        let document: Value = match &self.origin {
            Origin::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text)?
            }
            Origin::Text(text) => serde_json::from_str(text)?,
        };

        let events = parse_events(&document, self.project_root.as_deref())?;
        tracing::debug!(count = events.len(), "parsed event log");
        Ok(events)
    }
}

/// Parse a document shaped like `{"events": [...]}` or a bare array.
pub fn parse_events(document: &Value, project_root: Option<&Path>) -> LoadResult<Vec<Event>> {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(obj) => obj
            .get("events")
            .and_then(Value::as_array)
            .ok_or(LoadError::MissingEvents)?,
        _ => return Err(LoadError::MissingEvents),
    };

    let mut events = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            tracing::warn!(position, "skipping event log entry that is not an object");
            continue;
        };
        for (tag, body) in obj {
            match parse_entry(tag, body, project_root) {
                Some(event) => events.push(event),
                None => tracing::warn!(position, tag = %tag, "skipping unrecognised event"),
            }
        }
    }
    Ok(events)
}

fn parse_entry(tag: &str, body: &Value, project_root: Option<&Path>) -> Option<Event> {
    match tag {
        "ConfigLaunch" => {
            let name = body
                .as_str()
                .or_else(|| body.get("name").and_then(Value::as_str))
                .unwrap_or_default();
            Some(Event::config(name))
        }
        "BinaryLaunch" => Some(Event::Binary(parse_binary(
            body.as_object().unwrap_or(&Map::new()),
            project_root,
        ))),
        "Trace" => Some(Event::Trace(parse_trace(
            body.as_object().unwrap_or(&Map::new()),
        ))),
        "Marker" => Some(Event::Marker),
        _ => None,
    }
}

fn parse_binary(obj: &Map<String, Value>, project_root: Option<&Path>) -> BinaryLaunch {
    let path = get_str(obj, "path").unwrap_or_default();
    BinaryLaunch {
        path: normalize_path(&path, project_root),
        run_type: get_str(obj, "ty").map(|ty| RunType::from_name(&ty)),
        cargo_dir: get_str(obj, "cargo_dir"),
        pkg_name: get_str(obj, "pkg_name"),
        should_panic: obj
            .get("should_panic")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn parse_trace(obj: &Map<String, Value>) -> TraceEvent {
    TraceEvent {
        pid: obj.get("pid").and_then(Value::as_u64),
        child: obj.get("child").and_then(Value::as_u64),
        signal: get_str(obj, "signal").map(|s| Signal::from_name(&s)),
        addr: obj.get("addr").and_then(Value::as_u64),
        return_code: obj.get("return_val").and_then(Value::as_i64),
        location: obj.get("location").and_then(parse_location),
        description: get_str(obj, "description").unwrap_or_default(),
    }
}

/// Accepts `{"file": .., "line": ..}` as well as a `[file, line]` pair.
fn parse_location(value: &Value) -> Option<SourceLocation> {
    let (file, line) = match value {
        Value::Object(obj) => (obj.get("file")?, obj.get("line")?),
        Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
        _ => return None,
    };
    Some(SourceLocation {
        file: file.as_str()?.to_string(),
        line: line.as_u64()?,
    })
}

fn get_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Show binaries relative to the project root, or by file name when they
/// live elsewhere.
pub fn normalize_path(path: &str, project_root: Option<&Path>) -> String {
    let raw = Path::new(path);
    if let Some(relative) = project_root.and_then(|root| raw.strip_prefix(root).ok()) {
        if !relative.as_os_str().is_empty() {
            return relative.to_string_lossy().into_owned();
        }
    }
    raw.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> LoadResult<Vec<Event>> {
        JsonEventLog::from_text(text).events()
    }

    #[test]
    fn parses_every_event_kind() {
        let events = load(
            r#"{"events": [
                {"ConfigLaunch": "debug"},
                {"BinaryLaunch": {"path": "/work/target/debug/deps/t1-abc", "should_panic": true, "ty": "Doctests", "pkg_name": "t1"}},
                {"Trace": {"pid": 10, "child": 11, "signal": "SIGSEGV", "addr": 4096, "return_val": -1,
                           "location": {"file": "src/lib.rs", "line": 3}, "description": "crash"}},
                {"Marker": null}
            ]}"#,
        )
        .unwrap();

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], Event::config("debug"));
        match &events[1] {
            Event::Binary(bin) => {
                assert_eq!(bin.path, "t1-abc");
                assert!(bin.should_panic);
                assert_eq!(bin.run_type, Some(RunType::Doctests));
                assert_eq!(bin.pkg_name.as_deref(), Some("t1"));
                assert!(bin.cargo_dir.is_none());
            }
            other => panic!("expected binary, got {:?}", other),
        }
        let trace = events[2].as_trace().unwrap();
        assert_eq!(trace.pid, Some(10));
        assert_eq!(trace.child, Some(11));
        assert_eq!(trace.signal, Some(Signal::Sigsegv));
        assert_eq!(trace.addr, Some(4096));
        assert_eq!(trace.return_code, Some(-1));
        assert_eq!(trace.location.as_ref().unwrap().line, 3);
        assert_eq!(events[3], Event::Marker);
    }

    #[test]
    fn malformed_optional_fields_are_absent() {
        let events = load(
            r#"[{"Trace": {"pid": "seven", "signal": "SIGNOPE", "location": ["a.rs"], "description": "x"}}]"#,
        )
        .unwrap();
        let trace = events[0].as_trace().unwrap();
        assert_eq!(trace.pid, None);
        assert_eq!(trace.signal, Some(Signal::Unknown));
        assert!(trace.location.is_none());
        assert_eq!(trace.description, "x");
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let events = load(r#"{"events": [{"Bogus": 1}, {"ConfigLaunch": {"name": "release"}}, 5]}"#)
            .unwrap();
        assert_eq!(events, vec![Event::config("release")]);
    }

    #[test]
    fn unparseable_documents_fail() {
        assert!(matches!(load("{not json"), Err(LoadError::Json(_))));
        assert!(matches!(load(r#"{"start": 0}"#), Err(LoadError::MissingEvents)));
        assert!(matches!(load("42"), Err(LoadError::MissingEvents)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let log = JsonEventLog::from_path("/definitely/not/here.json");
        assert!(matches!(log.events(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn paths_relative_to_project_root() {
        let root = Path::new("/work/project");
        assert_eq!(
            normalize_path("/work/project/target/debug/t1", Some(root)),
            "target/debug/t1"
        );
        assert_eq!(normalize_path("/elsewhere/bin/t2", Some(root)), "t2");
        assert_eq!(normalize_path("/elsewhere/bin/t2", None), "t2");
    }

    #[test]
    fn project_root_is_applied_to_binaries() {
        let log = JsonEventLog::from_text(
            r#"{"events": [{"BinaryLaunch": {"path": "/w/p/target/t1", "should_panic": false}}]}"#,
        )
        .with_project_root(Some(PathBuf::from("/w/p")));
        let events = log.events().unwrap();
        assert_eq!(events[0].label(), "target/t1");
    }
}
