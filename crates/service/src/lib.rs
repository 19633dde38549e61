//! Service layer over the remote key-path store.
//! - `store`: path-addressed CRUD with memory, file and Firebase backends.
//! - `gate` / `session`: fail-closed admin allow-list and per-identity context.
//! - `directory`, `catalog`, `batch`: bank users, shop items and bulk writes.

pub mod batch;
pub mod bulk_import;
pub mod catalog;
pub mod directory;
pub mod errors;
pub mod gate;
pub mod session;
pub mod store;

pub use batch::{BatchOutcome, ItemOutcome};
pub use catalog::ShopCatalog;
pub use directory::UserDirectory;
pub use errors::{ServiceError, StoreError};
pub use gate::AllowListGate;
pub use session::SessionContext;
pub use store::{RecordStore, SharedStore};
