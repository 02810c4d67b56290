// src/engine/mod.rs
//! The call surface of the native PL2 engine.
//!
//! [`RecordingEngine`] is the seam between this crate and the closed-source
//! decoder: one method per engine call family, with a [`ChannelSelector`]
//! argument where the engine offers index/name/source addressing variants.
//! The concrete [`NativeEngine`] binds the vendor's shared library; tests
//! substitute a fake implementation returning canned records.
//!
//! Every input and output crossing this seam is a plain value: `Pod`
//! records, scalar slots, and caller-owned slices. That keeps the contract
//! intact when an implementation relays the call to an engine in another
//! process: the relay serializes the inputs, invokes the engine, and
//! copies the outputs back, still synchronously.

mod native;

pub use native::NativeEngine;

use std::path::Path;

use crate::schema::{
    AnalogChannelInfo, DigitalChannelInfo, FileInfo, SpikeChannelInfo, StartStopChannelInfo,
};
use crate::types::{ChannelSelector, FileHandle, Status};

/// Capability interface over the native engine's entry points.
///
/// # Call model
///
/// Calls are strictly synchronous: a single call in flight at a time, and a
/// returned `Status` means all output buffers are fully populated (no
/// partial-write visibility). Implementations must be safe to share across
/// threads, serializing calls internally if the engine requires it.
///
/// # Buffer contract
///
/// Data queries never allocate. The caller sizes every slice from a prior
/// info query on the *same channel* (see [`crate::marshal`] for the
/// derivation rules) and the engine fills at most that capacity, reporting
/// how many entries it actually wrote through the returned-count slots.
/// Only the first N entries of each slice are meaningful afterwards. On a
/// failure status, none of the outputs are meaningful.
pub trait RecordingEngine: Send + Sync {
    /// Open a recording and write its handle into `handle`.
    ///
    /// A failure status leaves `handle` invalid (zero).
    fn open_file(&self, path: &Path, handle: &mut FileHandle) -> Status;

    /// Release one handle. Closing an invalid or already-closed handle is a
    /// no-op and must not disturb later opens.
    fn close_file(&self, handle: FileHandle);

    /// Release every handle the engine currently holds.
    fn close_all_files(&self);

    /// Fill `buffer` with the engine's description of the last failure,
    /// null-terminated when it fits.
    fn last_error(&self, buffer: &mut [u8]) -> Status;

    fn file_info(&self, handle: FileHandle, info: &mut FileInfo) -> Status;

    fn analog_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut AnalogChannelInfo,
    ) -> Status;

    /// Fetch analog channel data.
    ///
    /// Capacities: `fragment_timestamps` and `fragment_counts` per
    /// `maximum_number_of_fragments`, `values` per `number_of_values`.
    #[allow(clippy::too_many_arguments)]
    fn analog_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_fragments_returned: &mut u64,
        num_values_returned: &mut u64,
        fragment_timestamps: &mut [i64],
        fragment_counts: &mut [u64],
        values: &mut [i16],
    ) -> Status;

    fn spike_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut SpikeChannelInfo,
    ) -> Status;

    /// Fetch spike channel data.
    ///
    /// Capacities: `timestamps` and `units` per `number_of_spikes`,
    /// `waveforms` per `number_of_spikes * samples_per_spike`, with the
    /// multiplier taken from *this* channel's info, freshly queried.
    fn spike_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_spikes_returned: &mut u64,
        timestamps: &mut [u64],
        units: &mut [u16],
        waveforms: &mut [i16],
    ) -> Status;

    fn digital_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut DigitalChannelInfo,
    ) -> Status;

    /// Fetch digital-event data. Capacities per `number_of_events`.
    fn digital_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_events_returned: &mut u64,
        timestamps: &mut [i64],
        values: &mut [u16],
    ) -> Status;

    fn start_stop_channel_info(
        &self,
        handle: FileHandle,
        info: &mut StartStopChannelInfo,
    ) -> Status;

    /// Fetch start/stop marker data. Capacities per the start/stop
    /// channel's `number_of_events`.
    fn start_stop_channel_data(
        &self,
        handle: FileHandle,
        num_events_returned: &mut u64,
        timestamps: &mut [i64],
        values: &mut [u16],
    ) -> Status;
}
