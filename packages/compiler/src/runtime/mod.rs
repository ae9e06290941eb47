//! Runtime Module
//!
//! The reactive view over a component's data. Reads and writes go through
//! the component's mapping tree so a write updates the rendered output and a
//! read of missing data recovers it from what was rendered.

pub mod view;

pub use view::{
    getter, setter, BoundView, Getter, Key, ReactiveState, RuntimeMapping, Setter, Slot, ViewId, MAX_ARRAY_LENGTH,
};
