//! Domain layer: value objects shared by the services and the HTTP layer.

pub mod value_objects;

pub use value_objects::*;
