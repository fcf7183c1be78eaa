pub mod handlers;
pub mod routes;
pub mod sessions;
pub mod state;

pub use routes::create_router;
pub use sessions::SessionStore;
pub use state::{AppState, SessionSettings};
