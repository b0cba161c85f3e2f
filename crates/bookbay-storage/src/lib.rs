pub mod catalog;
pub mod mem;
pub mod persistent;
pub mod snapshot;
pub mod traits;
pub mod wal;

pub use catalog::StaticCatalog;
pub use mem::InMemoryStore;
pub use persistent::PersistentStore;
pub use traits::*;
