use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    // Serve finished artifacts from the same directory the workers write
    // to; the success payload's audio_path points here.
    let audio_dir = state.service.store().dir().to_path_buf();

    Router::new()
        .route("/", get(handlers::home))
        .route("/status", get(handlers::status))
        .route("/synthesize", post(handlers::synthesize))
        .nest_service("/static/audio", ServeDir::new(audio_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
