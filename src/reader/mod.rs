// src/reader/mod.rs
mod directory;
mod session;
mod validator;

pub use session::Pl2Reader;
pub use validator::{SpikeConsistency, SpikeSamplesAdvisory};
