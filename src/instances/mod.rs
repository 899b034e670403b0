//! Investigation instances and the active selection

mod store;

pub use store::{InstanceMap, InstanceStore};
