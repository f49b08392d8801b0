pub mod decision_publisher;
pub mod decision_store;
