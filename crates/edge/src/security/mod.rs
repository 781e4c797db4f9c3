//! Response hardening for responses the edge generates itself

mod headers;

pub use headers::apply_gate_headers;
