pub mod config;
pub mod daemon;
pub mod env;
pub mod error;
pub mod inference;
pub mod installer;
pub mod paths;
pub mod report;
pub mod runtime;
pub mod templates;
pub mod updater;
pub mod version;

pub use config::{Config, InferenceConfig, State};
pub use error::{BerthError, Result};
pub use paths::Paths;
pub use report::{Console, Reporter};
pub use runtime::{ComposeRuntime, Container, ContainerRuntime, LogOptions};
