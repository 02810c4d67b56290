// src/schema/records.rs
//! Fixed-layout records exchanged with the native engine.
//!
//! Every struct here mirrors an engine-side C struct byte for byte. The
//! engine fills these records directly across the call boundary, so field
//! order, integer widths, and the absence of implicit padding are part of
//! the contract: any relayout silently corrupts every field after the
//! change. Do not reorder, resize, or insert fields.
//!
//! All records are plain old data (`bytemuck::Pod`): a fresh record is
//! `Zeroable::zeroed()`, and a filled record can be viewed as bytes when a
//! relay transport needs to move it between processes.

use bytemuck::{Pod, Zeroable};

use crate::utils::text::decode_padded;

/// Calendar time in C `tm` layout: 9 consecutive 32-bit signed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct TimeOfDay {
    pub seconds: i32,
    pub minutes: i32,
    pub hours: i32,
    pub month_day: i32,
    /// Zero-based month, as in C `tm_mon`.
    pub month: i32,
    /// Years since 1900, as in C `tm_year`.
    pub year: i32,
    pub week_day: i32,
    pub year_day: i32,
    pub is_dst: i32,
}

impl TimeOfDay {
    /// Full calendar year (C `tm_year` is years since 1900).
    pub fn calendar_year(&self) -> i32 {
        self.year + 1900
    }

    /// One-based calendar month (C `tm_mon` is zero-based).
    pub fn calendar_month(&self) -> i32 {
        self.month + 1
    }
}

/// File-level header: provenance, clock frequency, channel counts, and the
/// recording window. Filled by a single info query; a read-only snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct FileInfo {
    pub creator_comment: [u8; 256],
    pub creator_software_name: [u8; 64],
    pub creator_software_version: [u8; 16],
    pub creator_date_time: TimeOfDay,
    pub creator_date_time_milliseconds: i32,
    /// Ticks per second of the sampling clock; timestamps elsewhere are in
    /// these ticks.
    pub timestamp_frequency: f64,
    pub number_of_channel_headers: u32,
    pub total_number_of_spike_channels: u32,
    pub number_of_recorded_spike_channels: u32,
    pub total_number_of_analog_channels: u32,
    pub number_of_recorded_analog_channels: u32,
    pub number_of_digital_channels: u32,
    pub minimum_trodality: u32,
    pub maximum_trodality: u32,
    pub number_of_non_omniplex_sources: u32,
    pub unused: i32,
    pub reprocessor_comment: [u8; 256],
    pub reprocessor_software_name: [u8; 64],
    pub reprocessor_software_version: [u8; 16],
    pub reprocessor_date_time: TimeOfDay,
    pub reprocessor_date_time_milliseconds: i32,
    /// In clock ticks.
    pub start_recording_time: u64,
    /// In clock ticks.
    pub duration_of_recording: u64,
}

impl FileInfo {
    pub fn creator_comment(&self) -> String {
        decode_padded(&self.creator_comment)
    }

    pub fn creator_software_name(&self) -> String {
        decode_padded(&self.creator_software_name)
    }

    pub fn creator_software_version(&self) -> String {
        decode_padded(&self.creator_software_version)
    }

    pub fn reprocessor_comment(&self) -> String {
        decode_padded(&self.reprocessor_comment)
    }

    pub fn reprocessor_software_name(&self) -> String {
        decode_padded(&self.reprocessor_software_name)
    }

    pub fn reprocessor_software_version(&self) -> String {
        decode_padded(&self.reprocessor_software_version)
    }

    /// Recording duration in seconds, derived from the tick duration and
    /// the sampling-clock frequency.
    pub fn duration_seconds(&self) -> f64 {
        if self.timestamp_frequency == 0.0 {
            return 0.0;
        }
        self.duration_of_recording as f64 / self.timestamp_frequency
    }
}

/// Metadata for one continuous-signal channel.
///
/// `number_of_values` and `maximum_number_of_fragments` are the
/// authoritative upper bounds a caller must use to size data buffers.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct AnalogChannelInfo {
    pub name: [u8; 64],
    pub source: u32,
    pub channel: u32,
    pub channel_enabled: u32,
    pub channel_recording_enabled: u32,
    pub units: [u8; 16],
    pub samples_per_second: f64,
    pub coeff_to_convert_to_units: f64,
    pub source_trodality: u32,
    pub one_based_trode: u16,
    pub one_based_channel_in_trode: u16,
    pub number_of_values: u64,
    pub maximum_number_of_fragments: u64,
}

impl AnalogChannelInfo {
    pub fn name(&self) -> String {
        decode_padded(&self.name)
    }

    pub fn units(&self) -> String {
        decode_padded(&self.units)
    }

    pub fn is_enabled(&self) -> bool {
        self.channel_enabled != 0
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.channel_recording_enabled != 0
    }
}

/// Metadata for one spike channel.
///
/// `number_of_spikes` and `samples_per_spike` are the authoritative sizing
/// fields; the waveform buffer for a data query holds
/// `number_of_spikes * samples_per_spike` samples. `samples_per_spike` is a
/// per-channel value, not a file-wide constant.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SpikeChannelInfo {
    pub name: [u8; 64],
    pub source: u32,
    pub channel: u32,
    pub channel_enabled: u32,
    pub channel_recording_enabled: u32,
    pub units: [u8; 16],
    pub samples_per_second: f64,
    pub coeff_to_convert_to_units: f64,
    pub samples_per_spike: u32,
    pub threshold: i32,
    pub pre_threshold_samples: u32,
    pub sort_enabled: u32,
    pub sort_method: u32,
    pub number_of_units: u32,
    pub sort_range_start: u32,
    pub sort_range_end: u32,
    /// Per-sort-unit spike counts. Always 256 slots regardless of how many
    /// sort units exist; unused entries are zero.
    pub unit_counts: [u64; 256],
    pub source_trodality: u32,
    pub one_based_trode: u16,
    pub one_based_channel_in_trode: u16,
    pub number_of_spikes: u64,
}

impl SpikeChannelInfo {
    pub fn name(&self) -> String {
        decode_padded(&self.name)
    }

    pub fn units(&self) -> String {
        decode_padded(&self.units)
    }

    pub fn is_enabled(&self) -> bool {
        self.channel_enabled != 0
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.channel_recording_enabled != 0
    }

    pub fn is_sort_enabled(&self) -> bool {
        self.sort_enabled != 0
    }

    /// The populated prefix of the fixed 256-slot unit-count array.
    pub fn unit_counts(&self) -> &[u64] {
        let n = (self.number_of_units as usize).min(self.unit_counts.len());
        &self.unit_counts[..n]
    }

    /// Required waveform-sample buffer capacity for a data query on this
    /// channel.
    pub fn waveform_sample_capacity(&self) -> usize {
        self.number_of_spikes as usize * self.samples_per_spike as usize
    }
}

/// Metadata for one digital-event channel. `number_of_events` is the
/// authoritative sizing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct DigitalChannelInfo {
    pub name: [u8; 64],
    pub source: u32,
    pub channel: u32,
    pub channel_enabled: u32,
    pub channel_recording_enabled: u32,
    pub number_of_events: u64,
}

impl DigitalChannelInfo {
    pub fn name(&self) -> String {
        decode_padded(&self.name)
    }

    pub fn is_enabled(&self) -> bool {
        self.channel_enabled != 0
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.channel_recording_enabled != 0
    }
}

/// Metadata for the recording start/stop marker stream. The engine call
/// exchanges a bare event count; the record exists to keep the sizing
/// discipline uniform with the other channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct StartStopChannelInfo {
    pub number_of_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn test_zeroed_records_decode_empty() {
        let info = FileInfo::zeroed();
        assert_eq!(info.creator_software_name(), "");
        assert_eq!(info.total_number_of_spike_channels, 0);
        assert_eq!(info.duration_seconds(), 0.0);
    }

    #[test]
    fn test_time_of_day_calendar_accessors() {
        let mut t = TimeOfDay::zeroed();
        t.year = 116;
        t.month = 4;
        assert_eq!(t.calendar_year(), 2016);
        assert_eq!(t.calendar_month(), 5);
    }

    #[test]
    fn test_analog_name_decoding() {
        let mut info = AnalogChannelInfo::zeroed();
        info.name[..4].copy_from_slice(b"WB01");
        info.units[..2].copy_from_slice(b"mV");
        info.channel_enabled = 1;
        assert_eq!(info.name(), "WB01");
        assert_eq!(info.units(), "mV");
        assert!(info.is_enabled());
        assert!(!info.is_recording_enabled());
    }

    #[test]
    fn test_spike_unit_counts_prefix() {
        let mut info = SpikeChannelInfo::zeroed();
        info.unit_counts[0] = 120;
        info.unit_counts[1] = 34;
        info.unit_counts[2] = 7;
        info.number_of_units = 2;
        assert_eq!(info.unit_counts(), &[120, 34]);

        // A corrupt count never reads past the fixed array.
        info.number_of_units = 1000;
        assert_eq!(info.unit_counts().len(), 256);
    }

    #[test]
    fn test_waveform_sample_capacity() {
        let mut info = SpikeChannelInfo::zeroed();
        info.number_of_spikes = 100;
        info.samples_per_spike = 40;
        assert_eq!(info.waveform_sample_capacity(), 4000);
    }
}
