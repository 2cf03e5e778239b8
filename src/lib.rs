//! Deterministic FIRE projections for six retirement strategies (standard, lean,
//! fat, coast, barista and couples), plus the HTTP host that serves them.

pub mod api;
pub mod core;
