// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod provider;
pub mod resilience;
pub mod schemas;
pub mod sentiment;
pub mod upstream;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::config::{ProviderKind, ProviderSettings};
pub use crate::decision::{Decision, Proposal, Verdict};
pub use crate::engine::{engine_for, VotingEngine, VotingMethod};
pub use crate::error::{ProviderError, ProviderResult};
pub use crate::provider::{build_provider, DynProvider, LlmProvider};
