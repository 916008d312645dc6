use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::capabilities::CapabilityTable;
use crate::command_text::{parse_command_line, BridgeCommand, CommandParseError};
use crate::feedback::FeedbackSink;
use crate::gateway::WorldGateway;
use crate::registry::{Allocation, NameRegistry};
use crate::report::state_report;

pub const MAP_GENERATED: &str = "map generated";

/// What a single command did. Feedback, when any, has already been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    MapGenerated,
    Registered { name: String },
    AlreadyRegistered { name: String },
    NoStatesAvailable { name: String },
    Reported { name: String },
    UnknownState { name: String },
    Invoked { operation: String, summary: String },
    CapabilityFailed { operation: String, reason: String },
    StatesNotFound { subject: String, target: String },
    /// Diagnostic only; no feedback is written.
    UnknownCapability { operation: String },
    /// Diagnostic only; no feedback is written.
    Malformed { command: String },
    Empty,
}

/// Routes parsed commands to the registry, the world and the capability table.
pub struct CommandDispatcher<W: WorldGateway + 'static> {
    registry: NameRegistry,
    capabilities: CapabilityTable<W>,
    feedback: Arc<dyn FeedbackSink>,
    rng: ChaCha8Rng,
}

impl<W: WorldGateway + 'static> CommandDispatcher<W> {
    pub fn new(capabilities: CapabilityTable<W>, feedback: Arc<dyn FeedbackSink>, rng: ChaCha8Rng) -> Self {
        Self {
            registry: NameRegistry::new(),
            capabilities,
            feedback,
            rng,
        }
    }

    pub fn with_registry(mut self, registry: NameRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    pub fn capabilities(&self) -> &CapabilityTable<W> {
        &self.capabilities
    }

    pub fn dispatch(&mut self, world: &mut W, line: &str) -> DispatchOutcome {
        match parse_command_line(line) {
            Ok(BridgeCommand::Start) => self.start(world),
            Ok(BridgeCommand::Register { name }) => self.register(world, name),
            Ok(BridgeCommand::Info { name }) => self.info(world, name),
            Ok(BridgeCommand::Invoke {
                subject,
                operation,
                target,
            }) => self.invoke(world, subject, operation, target),
            Err(CommandParseError::Empty) => DispatchOutcome::Empty,
            Err(err @ CommandParseError::InvalidFormat(_)) => {
                warn!(target: "state_bridge::dispatch", "{}", err);
                DispatchOutcome::Malformed {
                    command: line.trim().to_string(),
                }
            }
        }
    }

    fn start(&mut self, world: &mut W) -> DispatchOutcome {
        world.reset_world();
        let released = self.registry.len();
        self.registry.clear();
        info!(
            target: "state_bridge::dispatch",
            released,
            "world.reset"
        );
        self.send_feedback(MAP_GENERATED);
        DispatchOutcome::MapGenerated
    }

    fn register(&mut self, world: &mut W, name: String) -> DispatchOutcome {
        let claimed = self.registry.contains(&name);
        if claimed || world.find_by_display_name(&name).is_some() {
            let reason = if claimed { "claimed" } else { "display_name_in_use" };
            info!(
                target: "state_bridge::dispatch",
                %name,
                reason,
                "register.rejected=already_registered"
            );
            self.send_feedback(&format!("User '{name}' is already registered."));
            return DispatchOutcome::AlreadyRegistered { name };
        }

        match self.registry.allocate(world, &name, &mut self.rng) {
            Allocation::Assigned(entity) => {
                info!(
                    target: "state_bridge::dispatch",
                    %name,
                    entity = ?entity,
                    "register.assigned"
                );
                self.send_feedback(&format!("{name} has been registered"));
                DispatchOutcome::Registered { name }
            }
            Allocation::AlreadyClaimed => {
                self.send_feedback(&format!("User '{name}' is already registered."));
                DispatchOutcome::AlreadyRegistered { name }
            }
            Allocation::Exhausted => {
                warn!(
                    target: "state_bridge::dispatch",
                    %name,
                    claimed = self.registry.len(),
                    "register.rejected=no_states_available"
                );
                self.send_feedback(&format!(
                    "Sorry, no countries to be assigned for you - {name}"
                ));
                DispatchOutcome::NoStatesAvailable { name }
            }
        }
    }

    fn info(&mut self, world: &mut W, name: String) -> DispatchOutcome {
        let report = world
            .find_by_display_name(&name)
            .and_then(|entity| state_report(&*world, entity));

        match report {
            Some(report) => {
                self.send_feedback(&report);
                DispatchOutcome::Reported { name }
            }
            None => {
                self.send_feedback(&format!("there is no {name} country."));
                DispatchOutcome::UnknownState { name }
            }
        }
    }

    fn invoke(&mut self, world: &mut W, subject: String, operation: String, target: String) -> DispatchOutcome {
        let subject_ref = world.find_by_ui_name(&subject);
        let target_ref = world.find_by_ui_name(&target);
        let (Some(subject_ref), Some(target_ref)) = (subject_ref, target_ref) else {
            warn!(
                target: "state_bridge::capability",
                "One or both states not found for command: {} {} {}",
                subject,
                operation,
                target
            );
            self.send_feedback(&format!("{subject} or {target} not found."));
            return DispatchOutcome::StatesNotFound { subject, target };
        };

        let Some(spec) = self.capabilities.get(&operation) else {
            warn!(
                target: "state_bridge::capability",
                "Capability '{}' not found for command: {} {} {}",
                operation,
                subject,
                operation,
                target
            );
            return DispatchOutcome::UnknownCapability { operation };
        };

        match (spec.handler)(world, subject_ref, target_ref) {
            Ok(summary) => {
                info!(
                    target: "state_bridge::capability",
                    %summary,
                    "Capability '{}' successfully invoked on {} with {}",
                    operation,
                    subject,
                    target
                );
                DispatchOutcome::Invoked { operation, summary }
            }
            Err(err) => {
                warn!(
                    target: "state_bridge::capability",
                    error = %err,
                    "Capability '{}' failed on {} with {}",
                    operation,
                    subject,
                    target
                );
                DispatchOutcome::CapabilityFailed {
                    operation,
                    reason: err.to_string(),
                }
            }
        }
    }

    fn send_feedback(&self, message: &str) {
        info!(target: "state_bridge::feedback", "{}", message);
        if let Err(err) = self.feedback.append(message) {
            warn!(
                target: "state_bridge::feedback",
                error = %err,
                "feedback.append_failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::MemoryChannel;
    use crate::testing::{FakeWorld, FAKE_CAPABILITIES};
    use rand::SeedableRng;

    fn dispatcher() -> (CommandDispatcher<FakeWorld>, Arc<MemoryChannel>) {
        let channel = Arc::new(MemoryChannel::new());
        let table = CapabilityTable::new(FAKE_CAPABILITIES).expect("valid table");
        let dispatcher =
            CommandDispatcher::new(table, channel.clone(), ChaCha8Rng::seed_from_u64(11));
        (dispatcher, channel)
    }

    #[test]
    fn register_binds_name_and_reports_success() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Arcadia", "Boravia", "Calder"]);

        let outcome = dispatcher.dispatch(&mut world, "register alice");

        assert_eq!(
            outcome,
            DispatchOutcome::Registered {
                name: "alice".to_string()
            }
        );
        assert!(world.find_by_display_name("alice").is_some());
        assert!(dispatcher.registry().contains("alice"));
        assert_eq!(feedback.take(), vec!["alice has been registered".to_string()]);
    }

    #[test]
    fn second_register_is_rejected_and_holder_unchanged() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Arcadia", "Boravia", "Calder"]);
        dispatcher.dispatch(&mut world, "register alice");
        let holder = world.find_by_display_name("alice");
        feedback.take();

        let outcome = dispatcher.dispatch(&mut world, "register alice");

        assert_eq!(
            outcome,
            DispatchOutcome::AlreadyRegistered {
                name: "alice".to_string()
            }
        );
        assert_eq!(world.find_by_display_name("alice"), holder);
        assert_eq!(
            feedback.take(),
            vec!["User 'alice' is already registered.".to_string()]
        );
    }

    #[test]
    fn register_rejects_names_the_world_already_uses() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Arcadia", "Boravia"]);

        let outcome = dispatcher.dispatch(&mut world, "register Boravia");

        assert!(matches!(outcome, DispatchOutcome::AlreadyRegistered { .. }));
        assert!(dispatcher.registry().is_empty());
        assert_eq!(world.rename_notifications, 0);
        assert_eq!(
            feedback.take(),
            vec!["User 'Boravia' is already registered.".to_string()]
        );
    }

    #[test]
    fn register_without_free_states_leaves_registry_unchanged() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Arcadia"]);
        dispatcher.dispatch(&mut world, "register alice");
        feedback.take();

        let outcome = dispatcher.dispatch(&mut world, "register bob");

        assert_eq!(
            outcome,
            DispatchOutcome::NoStatesAvailable {
                name: "bob".to_string()
            }
        );
        assert_eq!(dispatcher.registry().names(), vec!["alice"]);
        assert_eq!(world.display_names(), vec!["alice"]);
        assert_eq!(
            feedback.take(),
            vec!["Sorry, no countries to be assigned for you - bob".to_string()]
        );
    }

    #[test]
    fn start_resets_world_and_releases_names() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Arcadia"]);
        dispatcher.dispatch(&mut world, "register alice");
        assert!(matches!(
            dispatcher.dispatch(&mut world, "register bob"),
            DispatchOutcome::NoStatesAvailable { .. }
        ));

        assert_eq!(
            dispatcher.dispatch(&mut world, "start"),
            DispatchOutcome::MapGenerated
        );
        assert!(dispatcher.registry().is_empty());
        assert_eq!(world.resets, 1);
        assert_eq!(world.display_names(), vec!["Arcadia"]);

        assert!(matches!(
            dispatcher.dispatch(&mut world, "register bob"),
            DispatchOutcome::Registered { .. }
        ));
        assert!(feedback.messages().contains(&MAP_GENERATED.to_string()));
    }

    #[test]
    fn info_reports_known_states_and_misses() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::arcadia();

        assert!(matches!(
            dispatcher.dispatch(&mut world, "info Arcadia"),
            DispatchOutcome::Reported { .. }
        ));
        assert!(matches!(
            dispatcher.dispatch(&mut world, "info Atlantis"),
            DispatchOutcome::UnknownState { .. }
        ));

        let messages = feedback.take();
        assert!(messages[0].starts_with("Name: Kingdom of Arcadia-Color: "));
        assert!(messages[0].ends_with("traits: Coastal, Mercantile-Enemies: Boravia"));
        assert_eq!(messages[1], "there is no Atlantis country.");
    }

    #[test]
    fn info_follows_the_registered_display_name() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Solo"]);
        dispatcher.dispatch(&mut world, "register alice");
        feedback.take();

        dispatcher.dispatch(&mut world, "info alice");
        let messages = feedback.take();
        assert!(messages[0].starts_with("Name: Kingdom of alice-"));
    }

    #[test]
    fn capability_invocation_uses_ui_names() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["Arcadia", "Boravia"]);
        world.rename(0, "alice");

        let outcome = dispatcher.dispatch(&mut world, "Arcadia declare_war Boravia");
        assert!(matches!(outcome, DispatchOutcome::Invoked { .. }));
        assert_eq!(world.enemies_of(0), vec![1]);

        // Display names are not a valid capability axis.
        let outcome = dispatcher.dispatch(&mut world, "alice declare_war Boravia");
        assert_eq!(
            outcome,
            DispatchOutcome::StatesNotFound {
                subject: "alice".to_string(),
                target: "Boravia".to_string()
            }
        );
        assert_eq!(
            feedback.take(),
            vec!["alice or Boravia not found.".to_string()]
        );
    }

    #[test]
    fn unknown_capability_is_diagnostic_only() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::arcadia();
        let before: Vec<_> = world
            .list_entities()
            .into_iter()
            .map(|entity| (world.enemies_of(entity), world.states[entity].gold))
            .collect();

        let outcome = dispatcher.dispatch(&mut world, "Arcadia reset_world Boravia");

        assert_eq!(
            outcome,
            DispatchOutcome::UnknownCapability {
                operation: "reset_world".to_string()
            }
        );
        let after: Vec<_> = world
            .list_entities()
            .into_iter()
            .map(|entity| (world.enemies_of(entity), world.states[entity].gold))
            .collect();
        assert_eq!(before, after);
        assert_eq!(world.resets, 0);
        assert!(feedback.messages().is_empty());
    }

    #[test]
    fn failing_capability_is_logged_not_fed_back() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["A", "B"]);

        let outcome = dispatcher.dispatch(&mut world, "A declare_war A");
        assert_eq!(
            outcome,
            DispatchOutcome::CapabilityFailed {
                operation: "declare_war".to_string(),
                reason: "subject and target are the same state".to_string()
            }
        );
        assert!(feedback.messages().is_empty());
    }

    #[test]
    fn malformed_commands_produce_no_feedback() {
        let (mut dispatcher, feedback) = dispatcher();
        let mut world = FakeWorld::with_names(&["A"]);

        assert_eq!(
            dispatcher.dispatch(&mut world, "two tokens"),
            DispatchOutcome::Malformed {
                command: "two tokens".to_string()
            }
        );
        assert!(matches!(
            dispatcher.dispatch(&mut world, "register"),
            DispatchOutcome::Malformed { .. }
        ));
        assert_eq!(dispatcher.dispatch(&mut world, ""), DispatchOutcome::Empty);
        assert!(feedback.messages().is_empty());
        assert_eq!(world.display_names(), vec!["A"]);
    }
}
