//! Resource and economic guardrails layered in front of consensus

pub mod manager;

pub use manager::{SecurityConfig, SecurityError, SecurityManager};
