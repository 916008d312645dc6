use std::time::Duration;

use tracing::{debug, info};

use crate::medium::{DrainOutcome, MediumError, QueueMedium};
use crate::queue::CommandQueue;

/// Outcome of one scheduling tick of the [`CommandSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    NotDue,
    Absent,
    /// The controller held the lock; the poll is retried next tick.
    Busy,
    Enqueued(usize),
}

/// Polls the queue medium on a fixed interval and feeds drained lines into
/// the [`CommandQueue`].
#[derive(Debug, Clone)]
pub struct CommandSource {
    medium: QueueMedium,
    interval: Duration,
    last_poll: Duration,
}

impl CommandSource {
    pub fn new(medium: QueueMedium, interval: Duration) -> Self {
        Self {
            medium,
            interval,
            last_poll: Duration::ZERO,
        }
    }

    pub fn medium(&self) -> &QueueMedium {
        &self.medium
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now.saturating_sub(self.last_poll) >= self.interval
    }

    /// `now` is the host's elapsed time. Errors leave the poll timer reset so
    /// a failing medium is retried once per interval, not once per tick.
    pub fn poll(&mut self, now: Duration, queue: &mut CommandQueue) -> Result<PollOutcome, MediumError> {
        if !self.is_due(now) {
            return Ok(PollOutcome::NotDue);
        }

        let outcome = self.medium.drain();
        if !matches!(outcome, Ok(DrainOutcome::Busy)) {
            self.last_poll = now;
        }

        match outcome? {
            DrainOutcome::Absent => Ok(PollOutcome::Absent),
            DrainOutcome::Busy => Ok(PollOutcome::Busy),
            DrainOutcome::Drained(lines) => {
                let count = lines.len();
                if count > 0 {
                    info!(
                        target: "state_bridge::source",
                        path = %self.medium.path().display(),
                        count,
                        "queue.drained"
                    );
                } else {
                    debug!(target: "state_bridge::source", "queue.drained=empty");
                }
                queue.extend(lines);
                Ok(PollOutcome::Enqueued(count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn source_in(dir: &tempfile::TempDir) -> CommandSource {
        let medium = QueueMedium::new(
            dir.path().join("commands_queue.txt"),
            Duration::from_secs(3600),
        );
        CommandSource::new(medium, Duration::from_secs(5))
    }

    #[test]
    fn waits_for_the_interval_before_polling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = source_in(&dir);
        let mut queue = CommandQueue::new();
        fs::write(source.medium().path(), "start\n").unwrap();

        assert_eq!(
            source.poll(Duration::from_secs(4), &mut queue).unwrap(),
            PollOutcome::NotDue
        );
        assert!(queue.is_empty());

        assert_eq!(
            source.poll(Duration::from_secs(5), &mut queue).unwrap(),
            PollOutcome::Enqueued(1)
        );
        assert_eq!(
            source.poll(Duration::from_secs(9), &mut queue).unwrap(),
            PollOutcome::NotDue
        );
        assert_eq!(
            source.poll(Duration::from_secs(10), &mut queue).unwrap(),
            PollOutcome::Enqueued(0)
        );
    }

    #[test]
    fn drained_lines_arrive_in_order_and_medium_is_emptied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = source_in(&dir);
        let mut queue = CommandQueue::new();
        queue.push("already buffered");
        fs::write(source.medium().path(), "register a\ninfo a\n").unwrap();

        source.poll(Duration::from_secs(6), &mut queue).unwrap();

        let buffered: Vec<&str> = queue.iter().collect();
        assert_eq!(buffered, vec!["already buffered", "register a", "info a"]);
        assert_eq!(fs::read_to_string(source.medium().path()).unwrap(), "");
    }

    #[test]
    fn busy_medium_is_retried_on_the_next_tick() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = source_in(&dir);
        let mut queue = CommandQueue::new();
        fs::write(source.medium().path(), "start\n").unwrap();

        let guard = source.medium().try_lock().unwrap().expect("free");
        assert_eq!(
            source.poll(Duration::from_secs(5), &mut queue).unwrap(),
            PollOutcome::Busy
        );
        drop(guard);

        assert_eq!(
            source
                .poll(Duration::from_millis(5_016), &mut queue)
                .unwrap(),
            PollOutcome::Enqueued(1)
        );
    }

    #[test]
    fn absent_medium_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = source_in(&dir);
        let mut queue = CommandQueue::new();
        assert_eq!(
            source.poll(Duration::from_secs(5), &mut queue).unwrap(),
            PollOutcome::Absent
        );
        assert!(queue.is_empty());
    }
}
