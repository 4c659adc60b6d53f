use core_state::EditorState;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing::dispatcher::Dispatch;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[derive(Clone, Debug)]
struct CapturedEvent {
    target: String,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct FieldCollector {
    fields: Vec<(String, String)>,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            fields: collector.fields,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let capture = Capture::default();
    let events = capture.events.clone();
    let dispatch = Dispatch::new(Registry::default().with(capture));
    tracing::dispatcher::with_default(&dispatch, f);
    let out = events.lock().unwrap().clone();
    out
}

#[test]
fn edit_logs_never_contain_typed_text() {
    let secret = "hunter2 passphrase";
    let events = capture(|| {
        let mut st = EditorState::new();
        st.insert(secret);
        st.set_selection(0, 7);
        st.cut();
        st.paste();
        st.delete_backward(true);
        st.undo();
        st.redo();
        st.clear();
    });

    assert!(events.iter().any(|e| e.target == "state.edit"));
    assert!(events.iter().any(|e| e.target == "state.undo"));
    for event in &events {
        for (name, value) in &event.fields {
            assert!(
                !value.contains("hunter2") && !value.contains("passphrase"),
                "{} field `{name}` leaked content: {value}",
                event.target
            );
        }
    }
}

#[test]
fn insert_event_reports_length() {
    let events = capture(|| {
        let mut st = EditorState::new();
        st.insert("abcd");
    });
    let insert = events
        .iter()
        .find(|e| {
            e.target == "state.edit"
                && e.fields.iter().any(|(n, v)| n == "op" && v.contains("insert"))
        })
        .expect("missing insert event");
    assert!(
        insert
            .fields
            .iter()
            .any(|(n, v)| n == "chars" && v == "4")
    );
}

#[test]
fn duplicate_commit_is_traced_as_skip() {
    let events = capture(|| {
        let mut st = EditorState::new();
        st.insert("a");
        // Selecting and replacing with identical text yields identical content.
        st.select_all();
        st.insert("a");
    });
    assert!(events.iter().any(|e| {
        e.target == "state.undo"
            && e
                .fields
                .iter()
                .any(|(n, v)| n == "message" && v.contains("snapshot_dedupe_skip"))
    }));
}
