//! Shared types used throughout the library.

mod component;
mod shape;

pub use component::ComponentType;
pub use shape::{ElementShape, ViewTarget};
