use std::io;
use thiserror::Error;

/// Custom error type for g14mon
#[derive(Error, Debug)]
pub enum MonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported machine: {0}")]
    UnsupportedMachine(String),

    #[error("Power plan error: {0}")]
    PowerPlan(String),

    #[error("Power plan not found: {0}")]
    PlanNotFound(String),

    #[error("Power plan name '{name}' is ambiguous ({} matches)", ids.len())]
    AmbiguousPlan { name: String, ids: Vec<String> },

    #[error("WMI error: {0}")]
    Wmi(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("Monitor runtime error: {0}")]
    Runtime(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for g14mon
pub type Result<T> = std::result::Result<T, MonError>;

impl MonError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonError::Config(msg.into())
    }

    pub fn unsupported_machine<S: Into<String>>(model: S) -> Self {
        MonError::UnsupportedMachine(model.into())
    }

    pub fn power_plan<S: Into<String>>(msg: S) -> Self {
        MonError::PowerPlan(msg.into())
    }

    pub fn wmi<S: Into<String>>(msg: S) -> Self {
        MonError::Wmi(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        MonError::MetricCollection(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        MonError::Runtime(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MonError::Other(msg.into())
    }
}
