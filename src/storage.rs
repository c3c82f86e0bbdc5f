pub mod directory;
mod inventory;
mod memory;
mod record;
mod store;

pub use directory::{Directory, LoadError};
use inventory::Inventory;
pub use memory::MemoryStore;
pub use store::{Stats, Store, StoreError};
