//! Resilience primitives shared by every upstream-backed provider.

pub mod breaker;
pub mod cache;
pub mod executor;

pub use breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use cache::TtlCache;
pub use executor::{fingerprint, Cacheable, CachedValue, ExecutorConfig, ResilientExecutor};
