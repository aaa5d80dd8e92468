//! ---
//! cap_section: "01-core-functionality"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Shared configuration and logging for the R-CAP tools."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
pub mod config;
pub mod logging;

pub use config::AppConfig;
pub use logging::{init_tracing, LogFormat};
