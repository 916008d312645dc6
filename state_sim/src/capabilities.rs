//! Operations controllers may invoke as `<subject> <operation> <target>`.

use bridge_runtime::{CapabilityError, CapabilitySpec, CapabilityTable, CapabilityTableError};

use crate::world::{HistoryKind, StateId, StateWorld};

pub const STATE_CAPABILITIES: &[CapabilitySpec<StateWorld>] = &[
    CapabilitySpec {
        id: "declare_war",
        description: "Subject and target become mutual enemies.",
        handler: declare_war,
    },
    CapabilitySpec {
        id: "make_peace",
        description: "End the war between subject and target.",
        handler: make_peace,
    },
    CapabilitySpec {
        id: "send_tribute",
        description: "Subject pays a tenth of its treasury to target.",
        handler: send_tribute,
    },
];

pub fn state_capability_table() -> Result<CapabilityTable<StateWorld>, CapabilityTableError> {
    CapabilityTable::new(STATE_CAPABILITIES)
}

fn distinct(subject: StateId, target: StateId) -> Result<(), CapabilityError> {
    if subject == target {
        Err(CapabilityError::SameState)
    } else {
        Ok(())
    }
}

fn declare_war(world: &mut StateWorld, subject: StateId, target: StateId) -> Result<String, CapabilityError> {
    distinct(subject, target)?;
    if world.are_enemies(subject, target) {
        return Err(CapabilityError::Rejected("already at war".to_string()));
    }
    world.set_war(subject, target, true);
    let description = format!(
        "{} declared war on {}",
        world.tagged_name(subject),
        world.tagged_name(target)
    );
    world.record_event(HistoryKind::WarDeclared, description);
    Ok(format!("{subject} at war with {target}"))
}

fn make_peace(world: &mut StateWorld, subject: StateId, target: StateId) -> Result<String, CapabilityError> {
    distinct(subject, target)?;
    if !world.are_enemies(subject, target) {
        return Err(CapabilityError::Rejected("states are not at war".to_string()));
    }
    world.set_war(subject, target, false);
    let description = format!(
        "{} made peace with {}",
        world.tagged_name(subject),
        world.tagged_name(target)
    );
    world.record_event(HistoryKind::PeaceSigned, description);
    Ok(format!("{subject} at peace with {target}"))
}

fn send_tribute(world: &mut StateWorld, subject: StateId, target: StateId) -> Result<String, CapabilityError> {
    distinct(subject, target)?;
    let treasury = world.state(subject).map_or(0, |state| state.gold);
    if treasury <= 0 {
        return Err(CapabilityError::Rejected("treasury is empty".to_string()));
    }
    let moved = world.transfer_gold(subject, target, (treasury / 10).max(1));
    let description = format!(
        "{} sent <i>{moved} gold</i> in tribute to {}",
        world.tagged_name(subject),
        world.tagged_name(target)
    );
    world.record_event(HistoryKind::TributePaid, description);
    Ok(format!("{subject} paid {moved} gold to {target}"))
}
