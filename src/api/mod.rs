pub mod analyze;
pub mod error;
pub mod export;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use types::ApiContext;
