//! Configuration and dependency initialization for the demo.

mod dependencies;

pub use dependencies::{ConnectionMode, DemoConfig, Dependencies, StoreKind};
