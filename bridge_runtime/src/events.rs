use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::feedback::FeedbackSink;
use crate::gateway::{EventListener, WorldEvent};

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("valid regex"));

/// Remove every `<...>` tag from an event description.
pub fn strip_markup(input: &str) -> Cow<'_, str> {
    MARKUP_RE.replace_all(input, "")
}

/// Relays world history events to the event channel as single clean lines.
#[derive(Clone)]
pub struct EventForwarder {
    sink: Arc<dyn FeedbackSink>,
}

impl EventForwarder {
    pub fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self { sink }
    }

    /// Returns whether a line was written.
    pub fn forward(&self, description: &str) -> bool {
        let cleaned = strip_markup(description);
        let line = cleaned
            .lines()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if line.is_empty() {
            debug!(target: "state_bridge::events", "event.skipped=blank");
            return false;
        }

        match self.sink.append(&line) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target: "state_bridge::events",
                    error = %err,
                    "event.append_failed"
                );
                false
            }
        }
    }

    /// Wrap the forwarder as a listener for [`crate::WorldGateway::subscribe_events`].
    pub fn into_listener<E: WorldEvent + 'static>(self) -> EventListener<E> {
        Box::new(move |event: &E| {
            self.forward(&event.description());
        })
    }
}
