use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Flip Match Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::plays::start_play,
        crate::routes::plays::get_play,
        crate::routes::plays::end_play,
        crate::routes::plays::pay_entry,
        crate::routes::plays::flip,
        crate::routes::plays::use_powerup,
        crate::routes::plays::purchase_powerup,
        crate::routes::plays::reset_play,
        crate::routes::sse::play_events,
        crate::routes::users::get_user,
        crate::routes::users::upsert_user,
        crate::routes::users::update_username,
        crate::routes::users::adjust_inventory,
        crate::routes::leaderboard::leaderboard,
        crate::routes::payouts::daily_payout,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::play::StartPlayRequest,
            crate::dto::play::FlipRequest,
            crate::dto::play::UsePowerUpRequest,
            crate::dto::play::PurchasePowerUpRequest,
            crate::dto::play::PlaySnapshot,
            crate::dto::play::CardView,
            crate::dto::play::FlipResult,
            crate::dto::play::FlipResponse,
            crate::dto::play::PowerUpResponse,
            crate::dto::play::PurchaseResponse,
            crate::dto::play::EntryResponse,
            crate::dto::play::ScoreSubmission,
            crate::dto::user::UserView,
            crate::dto::user::UpsertUserRequest,
            crate::dto::user::UpdateUsernameRequest,
            crate::dto::user::UsernameUpdated,
            crate::dto::user::InventoryAdjustmentRequest,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::payout::PayoutReport,
            crate::dto::payout::PayoutLine,
            crate::payments::TransferReceipt,
            crate::state::inventory::PowerUpKind,
            crate::state::inventory::Inventory,
            crate::state::state_machine::TurnPhase,
            crate::state::state_machine::LockReason,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "plays", description = "Flip-match sessions"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "users", description = "Players and their power-up stock"),
        (name = "leaderboard", description = "Rankings and payouts"),
    )
)]
pub struct ApiDoc;
