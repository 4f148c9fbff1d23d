use serde_json::{json, Value};
use tracelane_core::event::{Signal, TraceEvent};
use tracelane_core::Event;

/// An event log together with what a correct build of it looks like
pub struct LogFixture {
    pub document: Value,
    pub expected_nodes: usize,
    pub expected_lanes: usize,
    pub expected_failures: usize,
    pub expected_parents: Vec<Option<usize>>,
}

impl LogFixture {
    pub fn text(&self) -> String {
        self.document.to_string()
    }
}

/// Config, binary, then a pid 1 call chain that exits with 1
pub fn single_chain_fixture() -> LogFixture {
    LogFixture {
        document: json!({
            "events": [
                {"ConfigLaunch": "debug"},
                {"BinaryLaunch": {"path": "t1", "should_panic": false}},
                {"Trace": {"pid": 1, "description": "start"}},
                {"Trace": {"pid": 1, "return_val": 1, "description": "end"}}
            ]
        }),
        expected_nodes: 4,
        expected_lanes: 1,
        expected_failures: 1,
        expected_parents: vec![None, Some(0), Some(1), Some(2)],
    }
}

/// A fork whose child reports before the parent waits on it
pub fn fork_fixture() -> LogFixture {
    LogFixture {
        document: json!({
            "events": [
                {"BinaryLaunch": {"path": "/work/proj/target/debug/deps/forker-1f2e", "should_panic": false, "ty": "Tests"}},
                {"Trace": {"pid": 1, "child": 2, "description": "fork"}},
                {"Trace": {"pid": 2, "description": "child runs"}},
                {"Trace": {"pid": 2, "signal": "SIGSEGV", "addr": 48879,
                           "location": {"file": "src/lib.rs", "line": 12}, "description": "crash"}},
                {"Marker": {}},
                {"Trace": {"pid": 1, "description": "wait"}},
                {"Trace": {"pid": 1, "return_val": 0, "description": "exit"}}
            ]
        }),
        expected_nodes: 6,
        expected_lanes: 2,
        expected_failures: 1,
        expected_parents: vec![None, Some(0), Some(1), Some(2), Some(1), Some(4)],
    }
}

/// Two test binaries under one configuration, separated by a marker
pub fn two_binaries_fixture() -> LogFixture {
    LogFixture {
        document: json!([
            {"ConfigLaunch": {"name": "release"}},
            {"BinaryLaunch": {"path": "a", "should_panic": false}},
            {"Trace": {"pid": 10, "description": "main"}},
            {"Trace": {"pid": 10, "return_val": 0, "description": "exit"}},
            {"Marker": null},
            {"BinaryLaunch": {"path": "b", "should_panic": true}},
            {"Trace": {"pid": 20, "description": "main"}},
            {"Trace": {"pid": 20, "return_val": 101, "description": "panic"}},
            {"Unknown": {"ignored": true}}
        ]),
        expected_nodes: 7,
        expected_lanes: 2,
        expected_failures: 1,
        expected_parents: vec![None, Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)],
    }
}

/// Pid 5 exits and is later reused by an unrelated process
pub fn pid_reuse_events() -> Vec<Event> {
    vec![
        Event::binary("t1"),
        TraceEvent::new("first").with_pid(5).into(),
        TraceEvent::new("first exit").with_pid(5).with_return_code(0).into(),
        TraceEvent::new("second").with_pid(5).into(),
        TraceEvent::new("abort")
            .with_pid(5)
            .with_signal(Signal::Sigabrt)
            .into(),
    ]
}
