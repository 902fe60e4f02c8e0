pub mod error;
pub mod handlers;
pub mod prices;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
