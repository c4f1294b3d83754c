use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Gauntlet Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::players::login,
        crate::routes::games::init_round,
        crate::routes::games::play_move,
        crate::routes::games::submit_score,
        crate::routes::games::player_score,
        crate::routes::rankings::rankings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::players::LoginRequest,
            crate::dto::players::LoginResponse,
            crate::dto::games::InitResponse,
            crate::dto::games::MoveResponse,
            crate::dto::games::ScoreResponse,
            crate::dto::rankings::RankingsResponse,
            crate::dto::rankings::GameRanking,
            crate::dto::rankings::RankedPlayer,
            crate::games::GameKind,
            crate::games::MoveStatus,
            crate::games::InitView,
            crate::games::MoveDelta,
            crate::dao::models::RankOrder,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "players", description = "Player registration"),
        (name = "games", description = "Minigame rounds"),
        (name = "rankings", description = "Leaderboard announcements"),
    )
)]
pub struct ApiDoc;
