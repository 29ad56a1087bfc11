pub mod room;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Most rooms the registry will hold at once.
const MAX_ROOMS: usize = 100;
/// How often the background sweep looks for reclaimable rooms.
const RECLAIM_INTERVAL: Duration = Duration::from_secs(30);

/// Build a fully configured Router + shared state, and start the room
/// reclamation sweep.
pub fn build_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(MAX_ROOMS));

    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RECLAIM_INTERVAL);
            loop {
                interval.tick().await;
                let removed = state.reclaim_rooms();
                if removed > 0 {
                    println!("[registry] reclaimed {removed} expired rooms");
                }
            }
        });
    }

    let app = Router::new()
        .route("/health", get(routes::health))
        .route(
            "/room/{room_id}",
            post(routes::create_room).get(routes::attach_room),
        )
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}
