/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Background persistence of inventory deltas and power-up usage.
pub mod inventory_sync;
/// Ranked top scores.
pub mod leaderboard_service;
/// Daily prize distribution.
pub mod payout_service;
/// Play lifecycle: entry, flips, power-ups, reset.
pub mod play_service;
/// Linear-backoff retries for best-effort store calls.
pub mod retry;
/// Final time computation and leaderboard rows.
pub mod score_service;
/// Server-Sent Events snapshot streams.
pub mod sse_service;
/// Users, display names and durable inventory.
pub mod user_service;
