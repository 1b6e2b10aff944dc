use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/generations", generation_routes())
}

fn generation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::generation::list_generations,
            handlers::generation::create_generation
        ))
        .routes(routes!(handlers::generation::get_generation))
}
