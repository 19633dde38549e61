//! Record shapes and path addressing for the planet bank store.
//!
//! Everything here is pure: no I/O, no async. The `service` crate moves these
//! values in and out of the remote key-path database.

pub mod admin;
pub mod errors;
pub mod lenient;
pub mod path;
pub mod planet;
pub mod shop;
pub mod user;

pub use admin::AdminEntry;
pub use errors::ModelError;
pub use path::RecordPath;
pub use planet::PlanetCollection;
pub use shop::{CatalogItem, ShopItem, ShopItemPatch};
pub use user::{NewUser, Rank, UserPatch, UserRecord};
