//! Pipeline operations. Each operation owns its stages and wiring.

pub mod backup;
