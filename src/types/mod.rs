mod models;
mod sync;

pub use models::*;
pub use sync::*;
