//! Domain models with validation at construction
//!
//! Request input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod pagination;
pub mod user;
pub mod validation;

pub use pagination::{Range, RangeParams};
pub use user::{EmailAddress, NewUser, User, UserName};
pub use validation::ValidationError;
