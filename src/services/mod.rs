pub mod drop_queue;
pub mod location;
pub mod metadata_store;
pub mod session;
pub mod storage;
pub mod upload;
pub mod worker;
