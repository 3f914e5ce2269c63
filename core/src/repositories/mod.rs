//! Repository contracts over database sessions

pub mod crud;

#[cfg(test)]
mod tests;

pub use crud::{GeneralCrudAsync, GeneralCrudSync};
