pub mod routes;

pub use self::routes::{create_router, AppState};
