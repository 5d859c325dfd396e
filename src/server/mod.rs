pub mod dto;
pub mod extract;
mod repos;
pub mod response;
mod router;
mod sync;

pub use router::{AppState, api_router, create_router};
