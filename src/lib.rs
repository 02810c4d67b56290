// src/lib.rs
//! # pl2-rs
//!
//! A Rust access layer for PL2 neurophysiology recording files, built on the
//! vendor's closed-source PL2FileReader engine.
//!
//! The crate does no decoding of its own. It owns the data-exchange contract
//! with the engine: byte-exact `#[repr(C)]` record schemas, the
//! pre-allocated-buffer marshalling protocol for variable-length output, and
//! a session object that keeps handle lifetime explicit.
//!
//! ## Features
//!
//! - **Byte-exact schemas**: record layouts mirror the engine's structs,
//!   with layout assertions so a relayout cannot slip through
//! - **Safe marshalling**: buffer capacities derived from each channel's own
//!   metadata immediately before the call that needs them
//! - **Three addressing schemes**: channels by index, by name, or by
//!   source + one-based index within the source
//! - **Scoped handles**: a [`Pl2Reader`] session releases its handle on
//!   every exit path
//! - **Swappable engine**: the [`RecordingEngine`] trait lets tests (or a
//!   cross-process relay) stand in for the native library
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pl2_rs::*;
//!
//! fn main() -> Result<()> {
//!     let reader = Pl2Reader::open("session01.pl2")?;
//!
//!     let info = reader.file_info();
//!     println!(
//!         "{} analog, {} spike, {} digital channels",
//!         info.total_number_of_analog_channels,
//!         info.total_number_of_spike_channels,
//!         info.number_of_digital_channels,
//!     );
//!
//!     // Any addressing scheme works: index, name, or source pair.
//!     let wideband = reader.get_analog_channel_data("WB01")?;
//!     println!(
//!         "{} samples in {} fragments",
//!         wideband.num_values(),
//!         wideband.num_fragments(),
//!     );
//!
//!     let spikes = reader.get_spike_channel_data(0u32)?;
//!     if let Some(first) = spikes.waveform(0) {
//!         println!("first waveform has {} samples", first.len());
//!     }
//!
//!     Ok(())
//! } // handle released on scope exit
//! ```
//!
//! ## Engine location
//!
//! The native library is looked up in a `bin` directory next to the current
//! executable by default; [`Pl2Reader::open_with_engine_dir`] or
//! [`NativeEngine::load_from`] override that. A missing engine is a fatal
//! error naming the attempted path.

// Modules
pub mod engine;
pub mod error;
pub mod marshal;
pub mod reader;
pub mod schema;
pub mod types;

mod utils;

// Re-export commonly used types at the crate root for convenience
pub use error::{Pl2Error, Result};

// Type exports
pub use types::{ChannelSelector, FileHandle, Status};

// Schema exports
pub use schema::{
    AnalogChannelInfo, DigitalChannelInfo, FileInfo, SpikeChannelInfo, StartStopChannelInfo,
    TimeOfDay,
};

// Engine exports
pub use engine::{NativeEngine, RecordingEngine};

// Marshalling exports
pub use marshal::{AnalogData, DigitalData, SpikeData, StartStopData};

// Reader exports
pub use reader::{Pl2Reader, SpikeConsistency, SpikeSamplesAdvisory};

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use pl2_rs::prelude::*;
    //! ```

    pub use crate::engine::RecordingEngine;
    pub use crate::error::{Pl2Error, Result};
    pub use crate::reader::Pl2Reader;
    pub use crate::types::ChannelSelector;
}

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
