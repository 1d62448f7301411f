//! Error types for the twin_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for twin_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Genotype label has no entry in the lookup table
    #[error("Invalid genotype: {0}")]
    InvalidGenotype(String),

    /// Resolved phenotype carries no usable half-life
    #[error("Invalid phenotype: {0}")]
    InvalidPhenotype(String),

    /// Dose is non-numeric or not strictly positive
    #[error("Invalid dose amount: {0}")]
    InvalidDoseAmount(String),

    /// Body weight is non-numeric or not strictly positive
    #[error("Invalid body weight: {0}")]
    InvalidBodyWeight(String),

    /// Clock time could not be parsed as HH:MM
    #[error("Invalid clock time: {0:?}")]
    InvalidClockTime(String),

    /// No substance profile for the named substance
    #[error("Missing substance profile: {0}")]
    MissingSubstanceProfile(String),

    /// Substance profile has unusable pharmacokinetic parameters
    #[error("Invalid substance profile: {0}")]
    InvalidSubstanceProfile(String),

    /// No phenotype could be resolved for the entry
    #[error("Missing phenotype for {0}")]
    MissingPhenotype(String),

    /// Knowledge base validation error
    #[error("Knowledge base validation error: {0}")]
    KnowledgeValidation(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
