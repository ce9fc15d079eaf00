//! Where tasks live on disk.
//!
//! - [`selector`] picks a medium at startup by probing candidates in order
//! - [`file`] and [`kv`] are the two [`RecordStore`](crate::traits::RecordStore) kinds
//! - [`persistence`] turns a store into load/save with backup recovery

pub mod file;
pub mod kv;
pub mod persistence;
pub mod selector;

pub use file::FileRecordStore;
pub use kv::KeyValueStore;
pub use persistence::{LoadOutcome, PersistenceEngine, SaveReport};
pub use selector::{
    BackendSelector, FsProbe, InvalidStrategy, SelectedBackend, StorageLocations, StorageStrategy,
};
