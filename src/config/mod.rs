pub mod session;

pub use session::{validate_production_config, SessionConfig, SessionLayer};
