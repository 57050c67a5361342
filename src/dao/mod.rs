/// Persistence entities.
pub mod models;
/// Store abstraction for users, plays and scores.
pub mod play_store;
/// Storage error types shared by every backend.
pub mod storage;
