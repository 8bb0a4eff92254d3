//! Resilience adapters.

mod in_memory_circuit_breaker;

pub use in_memory_circuit_breaker::InMemoryCircuitBreaker;
