// tests/common/mod.rs
//! A canned in-process [`RecordingEngine`] for exercising the public API
//! without the vendor library.
//!
//! The fake honors the engine contract: status codes 0/1, records filled in
//! place, data written into caller-owned buffers with returned-count slots,
//! and a retrievable last-error text. Unlike the real engine it also
//! *checks* buffer capacities and fails the call when a buffer is too
//! small, so sizing bugs surface as test failures instead of memory
//! corruption.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytemuck::Zeroable;
use parking_lot::Mutex;

use pl2_rs::{
    AnalogChannelInfo, ChannelSelector, DigitalChannelInfo, FileHandle, FileInfo,
    RecordingEngine, SpikeChannelInfo, StartStopChannelInfo, Status,
};

pub fn padded<const N: usize>(text: &str) -> [u8; N] {
    let mut field = [0u8; N];
    field[..text.len()].copy_from_slice(text.as_bytes());
    field
}

#[derive(Clone)]
pub struct FakeAnalogChannel {
    pub info: AnalogChannelInfo,
    pub fragment_timestamps: Vec<i64>,
    pub fragment_counts: Vec<u64>,
    pub values: Vec<i16>,
}

impl FakeAnalogChannel {
    /// Channel whose samples are a ramp split into the given fragments.
    pub fn new(name: &str, source: u32, channel: u32, fragments: &[(i64, u64)]) -> Self {
        let total: u64 = fragments.iter().map(|(_, n)| n).sum();
        let mut info = AnalogChannelInfo::zeroed();
        info.name = padded(name);
        info.source = source;
        info.channel = channel;
        info.channel_enabled = 1;
        info.channel_recording_enabled = 1;
        info.units = padded("mV");
        info.samples_per_second = 40_000.0;
        info.coeff_to_convert_to_units = 0.001;
        info.source_trodality = 1;
        info.number_of_values = total;
        info.maximum_number_of_fragments = fragments.len() as u64;
        FakeAnalogChannel {
            info,
            fragment_timestamps: fragments.iter().map(|(t, _)| *t).collect(),
            fragment_counts: fragments.iter().map(|(_, n)| *n).collect(),
            values: (0..total).map(|i| i as i16).collect(),
        }
    }

    /// Advertise more fragment capacity than the channel actually has, so
    /// data queries return fewer entries than the allocated maximum.
    pub fn with_max_fragments(mut self, max: u64) -> Self {
        assert!(max >= self.fragment_timestamps.len() as u64);
        self.info.maximum_number_of_fragments = max;
        self
    }
}

#[derive(Clone)]
pub struct FakeSpikeChannel {
    pub info: SpikeChannelInfo,
    pub timestamps: Vec<u64>,
    pub units: Vec<u16>,
    pub waveforms: Vec<i16>,
}

impl FakeSpikeChannel {
    pub fn new(
        name: &str,
        source: u32,
        channel: u32,
        samples_per_spike: u32,
        num_spikes: u64,
    ) -> Self {
        let mut info = SpikeChannelInfo::zeroed();
        info.name = padded(name);
        info.source = source;
        info.channel = channel;
        info.channel_enabled = 1;
        info.channel_recording_enabled = 1;
        info.units = padded("uV");
        info.samples_per_second = 40_000.0;
        info.coeff_to_convert_to_units = 0.000_1;
        info.samples_per_spike = samples_per_spike;
        info.threshold = -45;
        info.pre_threshold_samples = samples_per_spike / 4;
        info.number_of_units = 2;
        info.unit_counts[0] = num_spikes / 2;
        info.unit_counts[1] = num_spikes - num_spikes / 2;
        info.source_trodality = 1;
        info.number_of_spikes = num_spikes;
        FakeSpikeChannel {
            info,
            timestamps: (0..num_spikes).map(|i| i * 1000).collect(),
            units: (0..num_spikes).map(|i| (i % 3) as u16).collect(),
            waveforms: (0..num_spikes * samples_per_spike as u64)
                .map(|i| i as i16)
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct FakeDigitalChannel {
    pub info: DigitalChannelInfo,
    pub timestamps: Vec<i64>,
    pub values: Vec<u16>,
}

impl FakeDigitalChannel {
    pub fn new(name: &str, source: u32, channel: u32, events: &[(i64, u16)]) -> Self {
        let mut info = DigitalChannelInfo::zeroed();
        info.name = padded(name);
        info.source = source;
        info.channel = channel;
        info.channel_enabled = 1;
        info.channel_recording_enabled = 1;
        info.number_of_events = events.len() as u64;
        FakeDigitalChannel {
            info,
            timestamps: events.iter().map(|(t, _)| *t).collect(),
            values: events.iter().map(|(_, v)| *v).collect(),
        }
    }
}

/// The canned recording the fake engine serves.
#[derive(Clone)]
pub struct FakeFile {
    pub file_info: FileInfo,
    pub analog: Vec<FakeAnalogChannel>,
    pub spike: Vec<FakeSpikeChannel>,
    pub digital: Vec<FakeDigitalChannel>,
    pub start_stop_timestamps: Vec<i64>,
    pub start_stop_values: Vec<u16>,
}

impl FakeFile {
    pub fn new() -> Self {
        let mut file_info = FileInfo::zeroed();
        file_info.creator_comment = padded("fake recording");
        file_info.creator_software_name = padded("OmniPlex");
        file_info.creator_software_version = padded("1.19.3");
        file_info.timestamp_frequency = 40_000.0;
        file_info.minimum_trodality = 1;
        file_info.maximum_trodality = 1;
        file_info.start_recording_time = 0;
        file_info.duration_of_recording = 2_400_000;
        FakeFile {
            file_info,
            analog: Vec::new(),
            spike: Vec::new(),
            digital: Vec::new(),
            start_stop_timestamps: vec![0, 2_400_000],
            start_stop_values: vec![1, 2],
        }
    }

    pub fn with_analog(mut self, channel: FakeAnalogChannel) -> Self {
        self.analog.push(channel);
        self.file_info.total_number_of_analog_channels = self.analog.len() as u32;
        self.file_info.number_of_recorded_analog_channels = self.analog.len() as u32;
        self
    }

    pub fn with_spike(mut self, channel: FakeSpikeChannel) -> Self {
        self.spike.push(channel);
        self.file_info.total_number_of_spike_channels = self.spike.len() as u32;
        self.file_info.number_of_recorded_spike_channels = self.spike.len() as u32;
        self
    }

    pub fn with_digital(mut self, channel: FakeDigitalChannel) -> Self {
        self.digital.push(channel);
        self.file_info.number_of_digital_channels = self.digital.len() as u32;
        self
    }

    /// A representative recording: two analog, two spike, one digital
    /// channel, homogeneous samples-per-spike.
    pub fn representative() -> Self {
        FakeFile::new()
            .with_analog(FakeAnalogChannel::new("WB01", 1, 1, &[(0, 600), (100_000, 400)]))
            .with_analog(FakeAnalogChannel::new("WB02", 1, 2, &[(0, 1000)]))
            .with_spike(FakeSpikeChannel::new("SPK01", 2, 1, 40, 100))
            .with_spike(FakeSpikeChannel::new("SPK02", 2, 2, 40, 25))
            .with_digital(FakeDigitalChannel::new("EVT01", 3, 1, &[(5, 1), (17, 0), (90, 1)]))
    }
}

#[derive(Default)]
struct FakeState {
    next_handle: i32,
    open_handles: HashSet<i32>,
    last_error: String,
    spike_info_queries: usize,
}

/// In-process stand-in for the native engine, serving one canned file.
pub struct FakeEngine {
    path: PathBuf,
    file: FakeFile,
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new(path: impl Into<PathBuf>, file: FakeFile) -> Self {
        FakeEngine {
            path: path.into(),
            file,
            state: Mutex::new(FakeState {
                next_handle: 1,
                ..FakeState::default()
            }),
        }
    }

    pub fn open_handle_count(&self) -> usize {
        self.state.lock().open_handles.len()
    }

    /// How many spike info queries the engine has served; data queries must
    /// re-derive the waveform multiplier, so each one adds at least one.
    pub fn spike_info_query_count(&self) -> usize {
        self.state.lock().spike_info_queries
    }

    fn fail(&self, message: &str) -> Status {
        self.state.lock().last_error = message.to_string();
        Status::FAILURE
    }

    fn check_handle(&self, handle: FileHandle) -> bool {
        self.state.lock().open_handles.contains(&handle.0)
    }
}

/// Resolve a selector against a channel list the way the engine does:
/// by position, by first name match, or by one-based position within the
/// selected source.
fn resolve_channel<T>(
    channels: &[T],
    selector: &ChannelSelector,
    name_of: impl Fn(&T) -> String,
    source_of: impl Fn(&T) -> u32,
) -> Option<usize> {
    match selector {
        ChannelSelector::Index(index) => {
            let index = *index as usize;
            (index < channels.len()).then_some(index)
        }
        ChannelSelector::Name(name) => channels.iter().position(|c| &name_of(c) == name),
        ChannelSelector::Source { source, channel } => {
            let mut seen = 0u32;
            for (position, candidate) in channels.iter().enumerate() {
                if source_of(candidate) == *source {
                    seen += 1;
                    if seen == *channel {
                        return Some(position);
                    }
                }
            }
            None
        }
    }
}

/// Copy `data` into `out`, failing if the caller's buffer is too small.
fn fill<T: Copy>(out: &mut [T], data: &[T]) -> bool {
    if out.len() < data.len() {
        return false;
    }
    out[..data.len()].copy_from_slice(data);
    true
}

impl RecordingEngine for FakeEngine {
    fn open_file(&self, path: &Path, handle: &mut FileHandle) -> Status {
        *handle = FileHandle(0);
        if path != self.path {
            return self.fail("file not found");
        }
        let mut state = self.state.lock();
        let id = state.next_handle;
        state.next_handle += 1;
        state.open_handles.insert(id);
        *handle = FileHandle(id);
        Status::SUCCESS
    }

    fn close_file(&self, handle: FileHandle) {
        self.state.lock().open_handles.remove(&handle.0);
    }

    fn close_all_files(&self) {
        self.state.lock().open_handles.clear();
    }

    fn last_error(&self, buffer: &mut [u8]) -> Status {
        let state = self.state.lock();
        let bytes = state.last_error.as_bytes();
        let n = bytes.len().min(buffer.len().saturating_sub(1));
        buffer[..n].copy_from_slice(&bytes[..n]);
        buffer[n..].fill(0);
        Status::SUCCESS
    }

    fn file_info(&self, handle: FileHandle, info: &mut FileInfo) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        *info = self.file.file_info;
        Status::SUCCESS
    }

    fn analog_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut AnalogChannelInfo,
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        match resolve_channel(&self.file.analog, selector, |c| c.info.name(), |c| c.info.source) {
            Some(position) => {
                *info = self.file.analog[position].info;
                Status::SUCCESS
            }
            None => self.fail("analog channel not found"),
        }
    }

    fn analog_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_fragments_returned: &mut u64,
        num_values_returned: &mut u64,
        fragment_timestamps: &mut [i64],
        fragment_counts: &mut [u64],
        values: &mut [i16],
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        let Some(position) =
            resolve_channel(&self.file.analog, selector, |c| c.info.name(), |c| c.info.source)
        else {
            return self.fail("analog channel not found");
        };
        let channel = &self.file.analog[position];
        if !fill(fragment_timestamps, &channel.fragment_timestamps)
            || !fill(fragment_counts, &channel.fragment_counts)
            || !fill(values, &channel.values)
        {
            return self.fail("analog buffer too small");
        }
        *num_fragments_returned = channel.fragment_timestamps.len() as u64;
        *num_values_returned = channel.values.len() as u64;
        Status::SUCCESS
    }

    fn spike_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut SpikeChannelInfo,
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        self.state.lock().spike_info_queries += 1;
        match resolve_channel(&self.file.spike, selector, |c| c.info.name(), |c| c.info.source) {
            Some(position) => {
                *info = self.file.spike[position].info;
                Status::SUCCESS
            }
            None => self.fail("spike channel not found"),
        }
    }

    fn spike_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_spikes_returned: &mut u64,
        timestamps: &mut [u64],
        units: &mut [u16],
        waveforms: &mut [i16],
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        let Some(position) =
            resolve_channel(&self.file.spike, selector, |c| c.info.name(), |c| c.info.source)
        else {
            return self.fail("spike channel not found");
        };
        let channel = &self.file.spike[position];
        if !fill(timestamps, &channel.timestamps)
            || !fill(units, &channel.units)
            || !fill(waveforms, &channel.waveforms)
        {
            return self.fail("spike buffer too small");
        }
        *num_spikes_returned = channel.timestamps.len() as u64;
        Status::SUCCESS
    }

    fn digital_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut DigitalChannelInfo,
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        match resolve_channel(&self.file.digital, selector, |c| c.info.name(), |c| c.info.source)
        {
            Some(position) => {
                *info = self.file.digital[position].info;
                Status::SUCCESS
            }
            None => self.fail("digital channel not found"),
        }
    }

    fn digital_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_events_returned: &mut u64,
        timestamps: &mut [i64],
        values: &mut [u16],
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        let Some(position) =
            resolve_channel(&self.file.digital, selector, |c| c.info.name(), |c| c.info.source)
        else {
            return self.fail("digital channel not found");
        };
        let channel = &self.file.digital[position];
        if !fill(timestamps, &channel.timestamps) || !fill(values, &channel.values) {
            return self.fail("digital buffer too small");
        }
        *num_events_returned = channel.timestamps.len() as u64;
        Status::SUCCESS
    }

    fn start_stop_channel_info(
        &self,
        handle: FileHandle,
        info: &mut StartStopChannelInfo,
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        info.number_of_events = self.file.start_stop_timestamps.len() as u64;
        Status::SUCCESS
    }

    fn start_stop_channel_data(
        &self,
        handle: FileHandle,
        num_events_returned: &mut u64,
        timestamps: &mut [i64],
        values: &mut [u16],
    ) -> Status {
        if !self.check_handle(handle) {
            return self.fail("invalid handle");
        }
        if !fill(timestamps, &self.file.start_stop_timestamps)
            || !fill(values, &self.file.start_stop_values)
        {
            return self.fail("start/stop buffer too small");
        }
        *num_events_returned = self.file.start_stop_timestamps.len() as u64;
        Status::SUCCESS
    }
}
