/// Database model definitions.
pub mod models;
/// Score persistence contract and its backends.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
