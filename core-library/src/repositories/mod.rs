//! Data access for collections and their records

pub mod collection;

pub use collection::SqliteCollectionStore;
