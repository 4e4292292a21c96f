//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors at once)
//!     → AppConfig (validated, immutable)
//!     → settings handed to the engine, rate limiter and HTTP layer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ApiKeyConfig, AppConfig, CacheConfig, EngineConfig, ExternalRoutingConfig, LogFormat,
    NetworkConfig, ObservabilityConfig, RateLimitConfig, RetryConfig, ServerConfig, TierConfig,
};
pub use validation::{validate_config, ValidationError};
