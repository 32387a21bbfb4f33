// handlers/mod.rs - Two-tier handler layout
//
// Public (no identity) -> Protected (oracle-verified identity + policy)
pub mod public;    // Tier 1: service info and health
pub mod protected; // Tier 2: identity header required (/profiles/*)
