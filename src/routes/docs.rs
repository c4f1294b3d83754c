use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where the Swagger UI is mounted.
pub const DOCS_PATH: &str = "/docs";
/// Where the raw OpenAPI document is served.
pub const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Swagger UI subtree; it needs no state of its own.
pub fn router() -> Router<SharedState> {
    Router::new().merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_public_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/players/login",
            "/games/{game}/init",
            "/games/{game}/move",
            "/games/{game}/score",
            "/games/{game}/scores",
            "/api/rankings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
