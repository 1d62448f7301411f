#![forbid(unsafe_code)]

//! Core domain model and simulation engines for Biotwin.
//!
//! This crate provides:
//! - Domain types (substances, phenotypes, timelines, health state)
//! - Built-in substance knowledge base and genotype resolution
//! - Clearance curves, stack simulation and long-horizon prognosis
//! - Risk detection, habit aggregation and CSV export

pub mod types;
pub mod error;
pub mod clock;
pub mod config;
pub mod logging;
pub mod knowledge;
pub mod genotype;
pub mod clearance;
pub mod stack;
pub mod risk;
pub mod prognosis;
pub mod habits;
pub mod summary;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::ClockTime;
pub use config::Config;
pub use knowledge::{get_default_knowledge, EnrichedStack, KnowledgeBase};
pub use genotype::{lookup_genotype, resolve_phenotype};
pub use clearance::{calculate_clearance, ClearanceReport, ClearanceRequest, CrashTime, DecayPoint};
pub use stack::{simulate_stack, StackReport};
pub use prognosis::{project_health, project_health_from_today, Checkpoint, ForecastReport};
pub use habits::habits_from_logs;
pub use summary::{summarize, TimelineSummary};
