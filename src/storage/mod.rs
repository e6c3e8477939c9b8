pub mod archive;

pub use archive::{snapshot_key, SnapshotArchive};
