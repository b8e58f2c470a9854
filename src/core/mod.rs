// Public modules
pub mod code;
pub mod config;
pub mod content;
pub mod drush;
pub mod error;
pub mod exec;
pub mod identity;
pub mod lock;
pub mod output;
pub mod preflight;
pub mod registry;
pub mod rsync;
pub mod topology;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use config::Config;
pub use error::{Error, ErrorCode, Result};
pub use output::{CodeOutput, ContentOutput, StepReport};
