// src/reader/validator.rs
//! Post-open sanity check over spike-channel metadata.
//!
//! All spike channels in a file are expected to share one
//! `samples_per_spike` value. A file that violates this is still usable;
//! only bulk spike-waveform retrieval is in question, particularly when the
//! engine sits behind a cross-platform call bridge that sizes transfers
//! from a single channel's multiplier. A mismatch therefore produces a
//! non-fatal advisory, not an error.

use tracing::warn;

use crate::engine::RecordingEngine;
use crate::schema::{FileInfo, SpikeChannelInfo};
use crate::types::{ChannelSelector, FileHandle};
use bytemuck::Zeroable;

/// Validator state: the check runs exactly once per successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeConsistency {
    Unchecked,
    Checked,
}

/// Advisory describing the first `samples_per_spike` mismatch found.
///
/// Emitted at most once per open; scanning stops at the first disagreeing
/// channel even if later channels also disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikeSamplesAdvisory {
    /// The first spike channel's `samples_per_spike`, used as reference.
    pub reference_samples_per_spike: u32,
    /// Zero-based index of the first channel that disagrees.
    pub channel_index: u32,
    pub channel_name: String,
    /// That channel's own `samples_per_spike`.
    pub samples_per_spike: u32,
}

impl std::fmt::Display for SpikeSamplesAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "spike channel {} ({:?}) has {} samples per spike, but the first \
             spike channel has {}; bulk waveform retrieval may be unreliable \
             for this file",
            self.channel_index,
            self.channel_name,
            self.samples_per_spike,
            self.reference_samples_per_spike
        )
    }
}

#[derive(Debug)]
pub(crate) struct SpikeConsistencyCheck {
    state: SpikeConsistency,
    advisory: Option<SpikeSamplesAdvisory>,
}

impl SpikeConsistencyCheck {
    pub(crate) fn new() -> Self {
        SpikeConsistencyCheck {
            state: SpikeConsistency::Unchecked,
            advisory: None,
        }
    }

    pub(crate) fn state(&self) -> SpikeConsistency {
        self.state
    }

    pub(crate) fn advisory(&self) -> Option<&SpikeSamplesAdvisory> {
        self.advisory.as_ref()
    }

    /// Scan the file's spike channels once, comparing every channel's
    /// `samples_per_spike` against the first channel's value.
    ///
    /// Idempotent: after the first run the state is `Checked` and further
    /// calls do nothing, so the advisory fires at most once per open.
    pub(crate) fn run(
        &mut self,
        engine: &dyn RecordingEngine,
        handle: FileHandle,
        file_info: &FileInfo,
    ) {
        if self.state == SpikeConsistency::Checked {
            return;
        }
        self.state = SpikeConsistency::Checked;

        let total = file_info.total_number_of_spike_channels;
        if total == 0 {
            return;
        }

        let Some(reference) = spike_info_at(engine, handle, 0) else {
            // Counts said channel 0 exists but the query failed; nothing
            // to compare against.
            return;
        };

        for index in 1..total {
            let Some(info) = spike_info_at(engine, handle, index) else {
                continue;
            };
            if info.samples_per_spike != reference.samples_per_spike {
                let advisory = SpikeSamplesAdvisory {
                    reference_samples_per_spike: reference.samples_per_spike,
                    channel_index: index,
                    channel_name: info.name(),
                    samples_per_spike: info.samples_per_spike,
                };
                warn!(%advisory, "spike channel metadata inconsistency");
                self.advisory = Some(advisory);
                return;
            }
        }
    }
}

fn spike_info_at(
    engine: &dyn RecordingEngine,
    handle: FileHandle,
    index: u32,
) -> Option<SpikeChannelInfo> {
    let mut info = SpikeChannelInfo::zeroed();
    engine
        .spike_channel_info(handle, &ChannelSelector::Index(index), &mut info)
        .is_success()
        .then_some(info)
}
