//! Per-tick orchestration: poll the medium, then dispatch buffered commands.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::capabilities::CapabilityTable;
use crate::config::BridgeConfig;
use crate::dispatch::{CommandDispatcher, DispatchOutcome};
use crate::events::EventForwarder;
use crate::feedback::{FeedbackSink, FileChannel};
use crate::gateway::WorldGateway;
use crate::medium::QueueMedium;
use crate::queue::CommandQueue;
use crate::source::{CommandSource, PollOutcome};

/// What one call to [`CommandBridge::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// `None` when the poll was skipped because commands were still buffered,
    /// or when it failed.
    pub poll: Option<PollOutcome>,
    pub poll_failed: bool,
    pub outcomes: Vec<DispatchOutcome>,
    /// Commands left buffered for the next tick.
    pub remaining: usize,
}

pub struct CommandBridge<W: WorldGateway + 'static> {
    source: CommandSource,
    queue: CommandQueue,
    dispatcher: CommandDispatcher<W>,
    events: Arc<dyn FeedbackSink>,
    max_per_tick: Option<usize>,
}

impl<W: WorldGateway + 'static> CommandBridge<W> {
    pub fn new(
        source: CommandSource,
        dispatcher: CommandDispatcher<W>,
        events: Arc<dyn FeedbackSink>,
        max_per_tick: Option<usize>,
    ) -> Self {
        Self {
            source,
            queue: CommandQueue::new(),
            dispatcher,
            events,
            max_per_tick,
        }
    }

    /// Wire file channels and the queue medium described by `config`.
    pub fn from_config(config: &BridgeConfig, capabilities: CapabilityTable<W>) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        info!(
            target: "state_bridge::dispatch",
            seed,
            queue = %config.queue_path.display(),
            feedback = %config.feedback_path.display(),
            events = %config.event_path().display(),
            capabilities = ?capabilities.ids(),
            "bridge.configured"
        );

        let medium = QueueMedium::new(config.queue_path.clone(), config.lock_stale_after());
        let source = CommandSource::new(medium, config.poll_interval());
        let feedback: Arc<dyn FeedbackSink> = Arc::new(FileChannel::new(config.feedback_path.clone()));
        let events: Arc<dyn FeedbackSink> = if config.event_path.is_some() {
            Arc::new(FileChannel::new(config.event_path().to_path_buf()))
        } else {
            Arc::clone(&feedback)
        };
        let dispatcher =
            CommandDispatcher::new(capabilities, feedback, ChaCha8Rng::seed_from_u64(seed));

        Self::new(source, dispatcher, events, config.max_commands_per_tick)
    }

    pub fn source(&self) -> &CommandSource {
        &self.source
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<W> {
        &self.dispatcher
    }

    /// Forwarder writing to the event channel, ready to subscribe to a world.
    pub fn event_forwarder(&self) -> EventForwarder {
        EventForwarder::new(Arc::clone(&self.events))
    }

    /// Buffer a command without going through the medium.
    pub fn submit(&mut self, command: impl Into<String>) {
        self.queue.push(command);
    }

    /// The medium is only polled once every buffered command has been
    /// dispatched, so a capped backlog is finished before new lines arrive.
    pub fn tick(&mut self, world: &mut W, now: Duration) -> TickReport {
        let mut report = TickReport::default();

        if self.queue.is_empty() {
            match self.source.poll(now, &mut self.queue) {
                Ok(outcome) => report.poll = Some(outcome),
                Err(err) => {
                    warn!(
                        target: "state_bridge::source",
                        error = %err,
                        "queue.poll_failed"
                    );
                    report.poll_failed = true;
                }
            }
        }

        let budget = self.max_per_tick.unwrap_or(usize::MAX);
        while report.outcomes.len() < budget {
            let Some(command) = self.queue.pop() else {
                break;
            };
            debug!(target: "state_bridge::dispatch", %command, "command.dispatch");
            report.outcomes.push(self.dispatcher.dispatch(world, &command));
        }

        report.remaining = self.queue.len();
        if report.remaining > 0 {
            debug!(
                target: "state_bridge::dispatch",
                remaining = report.remaining,
                "queue.backlog"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::MemoryChannel;
    use crate::testing::{FakeWorld, FAKE_CAPABILITIES};
    use std::fs;

    struct Harness {
        bridge: CommandBridge<FakeWorld>,
        feedback: Arc<MemoryChannel>,
        events: Arc<MemoryChannel>,
        _dir: tempfile::TempDir,
    }

    fn harness(max_per_tick: Option<usize>) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let medium = QueueMedium::new(
            dir.path().join("commands_queue.txt"),
            Duration::from_secs(3600),
        );
        let source = CommandSource::new(medium, Duration::from_secs(5));
        let feedback = Arc::new(MemoryChannel::new());
        let events = Arc::new(MemoryChannel::new());
        let dispatcher = CommandDispatcher::new(
            CapabilityTable::new(FAKE_CAPABILITIES).expect("valid table"),
            feedback.clone(),
            ChaCha8Rng::seed_from_u64(5),
        );
        Harness {
            bridge: CommandBridge::new(source, dispatcher, events.clone(), max_per_tick),
            feedback,
            events,
            _dir: dir,
        }
    }

    #[test]
    fn polled_commands_are_dispatched_in_the_same_tick() {
        let mut h = harness(None);
        let mut world = FakeWorld::arcadia();
        fs::write(
            h.bridge.source().medium().path(),
            "register alice\ninfo Nowhere\n",
        )
        .unwrap();

        let report = h.bridge.tick(&mut world, Duration::from_secs(5));

        assert_eq!(report.poll, Some(PollOutcome::Enqueued(2)));
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.remaining, 0);
        assert_eq!(
            h.feedback.take(),
            vec![
                "alice has been registered".to_string(),
                "there is no Nowhere country.".to_string()
            ]
        );
    }

    #[test]
    fn capped_ticks_finish_the_backlog_before_polling_again() {
        let mut h = harness(Some(2));
        let mut world = FakeWorld::with_names(&["A", "B", "C", "D"]);
        let path = h.bridge.source().medium().path().to_path_buf();
        fs::write(&path, "register a\nregister b\nregister c\n").unwrap();

        let first = h.bridge.tick(&mut world, Duration::from_secs(5));
        assert_eq!(first.outcomes.len(), 2);
        assert_eq!(first.remaining, 1);

        fs::write(&path, "register d\n").unwrap();
        let second = h.bridge.tick(&mut world, Duration::from_secs(20));
        assert_eq!(second.poll, None);
        assert_eq!(second.outcomes.len(), 1);
        assert_eq!(second.remaining, 0);

        let third = h.bridge.tick(&mut world, Duration::from_secs(21));
        assert_eq!(third.poll, Some(PollOutcome::Enqueued(1)));
        assert_eq!(h.bridge.dispatcher().registry().names(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn submitted_commands_skip_the_medium() {
        let mut h = harness(None);
        let mut world = FakeWorld::with_names(&["A"]);
        h.bridge.submit("start");

        let report = h.bridge.tick(&mut world, Duration::ZERO);

        assert_eq!(report.poll, None);
        assert_eq!(report.outcomes, vec![DispatchOutcome::MapGenerated]);
        assert_eq!(h.feedback.take(), vec!["map generated".to_string()]);
    }

    #[test]
    fn event_forwarder_writes_to_the_event_channel() {
        let h = harness(None);
        let forwarder = h.bridge.event_forwarder();
        assert!(forwarder.forward("<i>Plague</i> in Calder"));
        assert_eq!(h.events.messages(), vec!["Plague in Calder".to_string()]);
        assert!(h.feedback.messages().is_empty());
    }

    #[test]
    fn from_config_writes_events_to_the_feedback_file_by_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BridgeConfig {
            queue_path: dir.path().join("queue.txt"),
            feedback_path: dir.path().join("feedback.txt"),
            poll_interval_secs: 0.0,
            rng_seed: Some(1),
            ..BridgeConfig::default()
        };
        let mut bridge = CommandBridge::from_config(
            &config,
            CapabilityTable::new(FAKE_CAPABILITIES).expect("valid table"),
        );
        let mut world = FakeWorld::with_names(&["A"]);
        fs::write(&config.queue_path, "register zed\n").unwrap();

        bridge.tick(&mut world, Duration::ZERO);
        bridge.event_forwarder().forward("<b>Drought</b>");

        assert_eq!(
            fs::read_to_string(&config.feedback_path).unwrap(),
            "zed has been registered\nDrought\n"
        );
    }
}
