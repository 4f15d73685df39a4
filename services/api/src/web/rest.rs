//! services/api/src/web/rest.rs
//!
//! The health check and the master definition for the OpenAPI specification.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::web::dto::{
    HistoryResponse, LoginRequest, MovieDto, MovieListResponse, MovieUpsertRequest,
    RegisterRequest, ResultResponse, SessionDto, SessionRequest, SessionUpsertRequest,
    TokenResponse, WatchEntryDto,
};
use crate::web::{movie, ticket, user, watch};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        ping_handler,
        user::register_handler,
        user::login_handler,
        movie::create_movie_handler,
        movie::list_movies_handler,
        movie::update_movie_handler,
        movie::delete_movie_handler,
        ticket::book_ticket_handler,
        watch::watch_handler,
        watch::history_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, TokenResponse, ResultResponse,
            MovieUpsertRequest, SessionUpsertRequest, MovieDto, SessionDto, MovieListResponse,
            SessionRequest, WatchEntryDto, HistoryResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Cinema API", description = "Movie catalog, ticket booking and watch history.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Health Check
//=========================================================================================

/// GET / - Liveness probe
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn ping_handler() -> &'static str {
    "pong"
}
