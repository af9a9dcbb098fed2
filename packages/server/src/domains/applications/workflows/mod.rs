pub mod lifecycle;

pub use lifecycle::{LifecycleConfig, LifecycleRun, LifecycleSignal};
