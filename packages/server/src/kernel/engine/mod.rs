pub mod manager;
pub mod store;

pub use manager::{
    ControlError, InstanceInfo, LifecycleEngine, SignalOutcome, StartedInstance,
};
pub use store::{
    in_memory_store, InMemoryInstanceStore, InstanceSnapshot, InstanceStore, RunStatus,
    WorkflowPhase,
};
