mod loader;

pub use loader::{Config, LogConfig};
