//! Value objects representing immutable domain concepts.

pub mod current_user;

pub use current_user::CurrentUser;
