pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod operations;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;
