mod repository;
mod yaml;

pub use repository::SessionRepository;
#[allow(unused_imports)]
pub use yaml::{StoreError, YamlSessionStore};
