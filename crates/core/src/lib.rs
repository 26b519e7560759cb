//! Shared types, configuration and errors for the wave targeting engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{TargetingError, TargetingResult};
pub use types::{
    CustomerRecord, CutoffRule, MailDecision, ScenarioKey, ScenarioOverrides, ScenarioParams,
    ScoredTable,
};
