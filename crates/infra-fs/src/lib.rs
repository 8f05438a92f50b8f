// Snapback Infrastructure - Local Filesystem Adapter
// Implements: ArtifactStore

mod local_store;

pub use local_store::LocalArtifactStore;
