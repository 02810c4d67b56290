// src/marshal/mod.rs
//! Buffer marshalling for data queries.
//!
//! Every call that moves array data across the engine boundary goes through
//! here. The protocol is strict pre-allocation: the required capacity of
//! each output array comes from a previously queried info record, the
//! engine fills caller-owned storage, and a returned-count scalar bounds
//! the valid prefix of each array. This module derives the capacities,
//! allocates, invokes the engine, and truncates the results so callers only
//! ever see the valid prefixes.
//!
//! Derivation rules:
//!
//! | query       | array                    | capacity field                        |
//! |-------------|--------------------------|---------------------------------------|
//! | analog      | values                   | `number_of_values`                    |
//! | analog      | fragment ts / counts     | `maximum_number_of_fragments`         |
//! | spike       | timestamps / sort units  | `number_of_spikes`                    |
//! | spike       | waveform samples         | `number_of_spikes * samples_per_spike`|
//! | digital     | timestamps / values      | `number_of_events`                    |
//! | start/stop  | timestamps / values      | `number_of_events`                    |
//!
//! The spike multiplier is the failure-prone one: `samples_per_spike` is a
//! per-channel field, so it is re-read from the queried channel's own info
//! record immediately before every data call. Caching it across channels
//! truncates or overruns the waveform buffer for any channel whose value
//! differs from the cached one.

use bytemuck::Zeroable;

use crate::engine::RecordingEngine;
use crate::error::{Pl2Error, Result};
use crate::schema::{
    AnalogChannelInfo, DigitalChannelInfo, SpikeChannelInfo, StartStopChannelInfo,
};
use crate::types::{ChannelSelector, FileHandle};
use crate::utils::text::decode_padded;

/// Capacity of the caller-supplied buffer for last-error text.
pub const LAST_ERROR_CAPACITY: usize = 512;

/// Analog channel data: gap-separated fragments plus the raw A/D values.
///
/// Each vector holds only the valid prefix reported by the engine;
/// `fragment_timestamps.len() == fragment_counts.len()` is the number of
/// fragments actually present, which may be fewer than the channel's
/// `maximum_number_of_fragments`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogData {
    /// Start time of each fragment, in clock ticks.
    pub fragment_timestamps: Vec<i64>,
    /// Sample count of each fragment.
    pub fragment_counts: Vec<u64>,
    /// Raw A/D values; multiply by `coeff_to_convert_to_units` for units.
    pub values: Vec<i16>,
}

impl AnalogData {
    pub fn num_fragments(&self) -> usize {
        self.fragment_timestamps.len()
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }
}

/// Spike channel data: per-spike timestamps, sort-unit labels, and the
/// concatenated waveforms (`samples_per_spike` samples per spike).
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeData {
    /// In clock ticks.
    pub timestamps: Vec<u64>,
    /// Sort-unit label per spike; 0 is unsorted.
    pub units: Vec<u16>,
    /// `num_spikes * samples_per_spike` raw samples, spike-major.
    pub waveforms: Vec<i16>,
    /// The multiplier the waveforms were sized with, from this channel's
    /// own info record.
    pub samples_per_spike: u32,
}

impl SpikeData {
    pub fn num_spikes(&self) -> usize {
        self.timestamps.len()
    }

    /// Waveform samples of one spike, or `None` past the end.
    pub fn waveform(&self, spike: usize) -> Option<&[i16]> {
        let width = self.samples_per_spike as usize;
        if width == 0 || spike >= self.num_spikes() {
            return None;
        }
        self.waveforms.get(spike * width..(spike + 1) * width)
    }
}

/// Digital-event channel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalData {
    /// In clock ticks.
    pub timestamps: Vec<i64>,
    pub values: Vec<u16>,
}

impl DigitalData {
    pub fn num_events(&self) -> usize {
        self.timestamps.len()
    }
}

/// Recording start/stop marker data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartStopData {
    /// In clock ticks.
    pub timestamps: Vec<i64>,
    /// Marker kind per event (start or stop).
    pub values: Vec<u16>,
}

impl StartStopData {
    pub fn num_events(&self) -> usize {
        self.timestamps.len()
    }
}

/// Required buffer capacities for an analog data query:
/// `(fragments, values)`.
pub fn analog_capacities(info: &AnalogChannelInfo) -> (usize, usize) {
    (
        info.maximum_number_of_fragments as usize,
        info.number_of_values as usize,
    )
}

/// Required buffer capacities for a spike data query:
/// `(spikes, waveform_samples)`.
pub fn spike_capacities(info: &SpikeChannelInfo) -> (usize, usize) {
    (
        info.number_of_spikes as usize,
        info.waveform_sample_capacity(),
    )
}

/// Required buffer capacity for a digital data query.
pub fn digital_capacity(info: &DigitalChannelInfo) -> usize {
    info.number_of_events as usize
}

/// Retrieve the engine's last-error text, if any.
pub(crate) fn last_error_text(engine: &dyn RecordingEngine) -> Option<String> {
    let mut buffer = [0u8; LAST_ERROR_CAPACITY];
    if !engine.last_error(&mut buffer).is_success() {
        return None;
    }
    let text = decode_padded(&buffer);
    (!text.is_empty()).then_some(text)
}

fn call_failed(engine: &dyn RecordingEngine, call: &'static str) -> Pl2Error {
    Pl2Error::CallFailed {
        call,
        detail: last_error_text(engine),
    }
}

/// Analog data query: size from a fresh info query, call, truncate to the
/// returned counts.
pub(crate) fn fetch_analog_data(
    engine: &dyn RecordingEngine,
    handle: FileHandle,
    selector: &ChannelSelector,
) -> Result<AnalogData> {
    let mut info = AnalogChannelInfo::zeroed();
    if !engine.analog_channel_info(handle, selector, &mut info).is_success() {
        return Err(Pl2Error::ChannelNotFound(selector.describe()));
    }
    let (max_fragments, max_values) = analog_capacities(&info);

    let mut num_fragments: u64 = 0;
    let mut num_values: u64 = 0;
    let mut fragment_timestamps = vec![0i64; max_fragments];
    let mut fragment_counts = vec![0u64; max_fragments];
    let mut values = vec![0i16; max_values];

    let status = engine.analog_channel_data(
        handle,
        selector,
        &mut num_fragments,
        &mut num_values,
        &mut fragment_timestamps,
        &mut fragment_counts,
        &mut values,
    );
    if !status.is_success() {
        return Err(call_failed(engine, "PL2_GetAnalogChannelData"));
    }

    // Only the returned prefix is meaningful, and never more than the
    // capacity the info record promised.
    fragment_timestamps.truncate((num_fragments as usize).min(max_fragments));
    fragment_counts.truncate((num_fragments as usize).min(max_fragments));
    values.truncate((num_values as usize).min(max_values));

    Ok(AnalogData {
        fragment_timestamps,
        fragment_counts,
        values,
    })
}

/// Spike data query. The waveform capacity multiplier comes from a fresh
/// info query on this exact selector, never from another channel.
pub(crate) fn fetch_spike_data(
    engine: &dyn RecordingEngine,
    handle: FileHandle,
    selector: &ChannelSelector,
) -> Result<SpikeData> {
    let mut info = SpikeChannelInfo::zeroed();
    if !engine.spike_channel_info(handle, selector, &mut info).is_success() {
        return Err(Pl2Error::ChannelNotFound(selector.describe()));
    }
    let (max_spikes, max_samples) = spike_capacities(&info);

    let mut num_spikes: u64 = 0;
    let mut timestamps = vec![0u64; max_spikes];
    let mut units = vec![0u16; max_spikes];
    let mut waveforms = vec![0i16; max_samples];

    let status = engine.spike_channel_data(
        handle,
        selector,
        &mut num_spikes,
        &mut timestamps,
        &mut units,
        &mut waveforms,
    );
    if !status.is_success() {
        return Err(call_failed(engine, "PL2_GetSpikeChannelData"));
    }

    let num_spikes = (num_spikes as usize).min(max_spikes);
    timestamps.truncate(num_spikes);
    units.truncate(num_spikes);
    waveforms.truncate(num_spikes * info.samples_per_spike as usize);

    Ok(SpikeData {
        timestamps,
        units,
        waveforms,
        samples_per_spike: info.samples_per_spike,
    })
}

/// Digital-event data query.
pub(crate) fn fetch_digital_data(
    engine: &dyn RecordingEngine,
    handle: FileHandle,
    selector: &ChannelSelector,
) -> Result<DigitalData> {
    let mut info = DigitalChannelInfo::zeroed();
    if !engine.digital_channel_info(handle, selector, &mut info).is_success() {
        return Err(Pl2Error::ChannelNotFound(selector.describe()));
    }
    let max_events = digital_capacity(&info);

    let mut num_events: u64 = 0;
    let mut timestamps = vec![0i64; max_events];
    let mut values = vec![0u16; max_events];

    let status =
        engine.digital_channel_data(handle, selector, &mut num_events, &mut timestamps, &mut values);
    if !status.is_success() {
        return Err(call_failed(engine, "PL2_GetDigitalChannelData"));
    }

    let num_events = (num_events as usize).min(max_events);
    timestamps.truncate(num_events);
    values.truncate(num_events);

    Ok(DigitalData { timestamps, values })
}

/// Start/stop marker data query.
pub(crate) fn fetch_start_stop_data(
    engine: &dyn RecordingEngine,
    handle: FileHandle,
) -> Result<StartStopData> {
    let mut info = StartStopChannelInfo::zeroed();
    if !engine.start_stop_channel_info(handle, &mut info).is_success() {
        return Err(call_failed(engine, "PL2_GetStartStopChannelInfo"));
    }
    let max_events = info.number_of_events as usize;

    let mut num_events: u64 = 0;
    let mut timestamps = vec![0i64; max_events];
    let mut values = vec![0u16; max_events];

    let status =
        engine.start_stop_channel_data(handle, &mut num_events, &mut timestamps, &mut values);
    if !status.is_success() {
        return Err(call_failed(engine, "PL2_GetStartStopChannelData"));
    }

    let num_events = (num_events as usize).min(max_events);
    timestamps.truncate(num_events);
    values.truncate(num_events);

    Ok(StartStopData { timestamps, values })
}
