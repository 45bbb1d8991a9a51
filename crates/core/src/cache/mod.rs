mod entry;
mod error;
mod keys;
mod traits;

pub use entry::{CacheEntry, CacheEvent, CachedValue, Snapshot};
pub use error::{CacheError, Result};
pub use keys::{Collection, QueryKey};
pub use traits::CacheStore;
