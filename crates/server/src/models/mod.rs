//! Domain models.
//!
//! Validated domain objects, separate from database row types. Every model
//! serializes with `camelCase` field names for the JSON API.

pub mod friendship;
pub mod session;
pub mod store;
pub mod user;
pub mod walk;

pub use friendship::{Friendship, PendingRequest};
pub use session::{CurrentUser, keys as session_keys};
pub use store::{NewStore, NewStoreTraffic, Store, StoreTraffic};
pub use user::{NewUser, User};
pub use walk::{NewWalk, Walk};
