//! Command bridge between an out-of-process controller and a running
//! simulation of named states.
//!
//! Commands arrive through a lock-guarded queue file, are buffered in a FIFO
//! and dispatched against a [`WorldGateway`]. Replies go to an append-only
//! feedback channel; world history events are relayed to an event channel.
//! Nothing here depends on a particular engine; `state_sim` provides the
//! bevy host.

pub mod bridge;
pub mod capabilities;
pub mod command_text;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod feedback;
pub mod gateway;
pub mod medium;
pub mod queue;
pub mod registry;
pub mod report;
pub mod source;

#[cfg(test)]
mod testing;

pub use bridge::{CommandBridge, TickReport};
pub use capabilities::{
    CapabilityError, CapabilityHandler, CapabilitySpec, CapabilityTable, CapabilityTableError,
};
pub use command_text::{parse_command_line, BridgeCommand, CommandParseError};
pub use config::{
    bridge_config_schema, load_bridge_config, load_bridge_config_from_env, BridgeConfig,
    BridgeConfigError, BridgeConfigMetadata, BRIDGE_CONFIG_ENV,
};
pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use events::{strip_markup, EventForwarder};
pub use feedback::{ChannelError, FeedbackSink, FileChannel, MemoryChannel};
pub use gateway::{EventListener, StateAttributes, WorldEvent, WorldGateway};
pub use medium::{split_commands, DrainOutcome, MediumError, QueueLock, QueueMedium};
pub use queue::CommandQueue;
pub use registry::{Allocation, NameRegistry};
pub use report::state_report;
pub use source::{CommandSource, PollOutcome};
