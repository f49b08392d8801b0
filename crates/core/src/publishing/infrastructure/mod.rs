pub mod firebase_store;
pub mod memory_store;
