pub mod error;
pub mod feed;
pub mod routes;
pub mod state;
pub mod ws;

use axum::Router;

pub use error::{AppError, AppResult};
pub use feed::{RunFeed, ServerEvent, ValueTrend};
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    routes::router(state)
}
