//! Business logic services.

pub mod account;
pub mod relationship;

pub use account::{AccountService, StatusesQuery, UpdateCredentialsInput};
pub use relationship::RelationshipService;
