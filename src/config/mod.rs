mod server;

pub use server::{DEFAULT_MAX_PUSH_BYTES, ServerConfig};
