/// OpenAPI documentation generation.
pub mod documentation;
/// Round lifecycle and score write-through.
pub mod engine_service;
/// Health check service.
pub mod health_service;
/// Player registration.
pub mod player_service;
/// Leaderboard computation and window rollover.
pub mod ranking_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
