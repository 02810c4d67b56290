// src/reader/directory.rs
//! Channel directory: metadata lookup by any of the three addressing
//! schemes.
//!
//! A channel of a given kind can be addressed by zero-based index, by
//! ASCII name, or by source id plus its one-based index within that
//! source. All three must resolve to a record with identical field values
//! for the same physical channel; resolution is performed by the engine,
//! so this module only dispatches and maps failure codes to errors.
//! The format does not guarantee unique names; when a name matches more
//! than one channel, which one the engine returns is unspecified.

use bytemuck::Zeroable;

use crate::error::{Pl2Error, Result};
use crate::reader::Pl2Reader;
use crate::schema::{AnalogChannelInfo, DigitalChannelInfo, SpikeChannelInfo};
use crate::types::ChannelSelector;

impl Pl2Reader {
    /// Analog channel metadata for the selected channel.
    ///
    /// An out-of-range index, unmatched name, or unmatched source pair
    /// yields [`Pl2Error::ChannelNotFound`]; the record is never partially
    /// filled on failure.
    pub fn get_analog_channel_info(
        &self,
        selector: impl Into<ChannelSelector>,
    ) -> Result<AnalogChannelInfo> {
        self.ensure_open()?;
        let selector = selector.into();
        let mut info = AnalogChannelInfo::zeroed();
        if !self
            .engine()
            .analog_channel_info(self.handle(), &selector, &mut info)
            .is_success()
        {
            return Err(Pl2Error::ChannelNotFound(selector.describe()));
        }
        Ok(info)
    }

    /// Spike channel metadata for the selected channel.
    pub fn get_spike_channel_info(
        &self,
        selector: impl Into<ChannelSelector>,
    ) -> Result<SpikeChannelInfo> {
        self.ensure_open()?;
        let selector = selector.into();
        let mut info = SpikeChannelInfo::zeroed();
        if !self
            .engine()
            .spike_channel_info(self.handle(), &selector, &mut info)
            .is_success()
        {
            return Err(Pl2Error::ChannelNotFound(selector.describe()));
        }
        Ok(info)
    }

    /// Digital-event channel metadata for the selected channel.
    pub fn get_digital_channel_info(
        &self,
        selector: impl Into<ChannelSelector>,
    ) -> Result<DigitalChannelInfo> {
        self.ensure_open()?;
        let selector = selector.into();
        let mut info = DigitalChannelInfo::zeroed();
        if !self
            .engine()
            .digital_channel_info(self.handle(), &selector, &mut info)
            .is_success()
        {
            return Err(Pl2Error::ChannelNotFound(selector.describe()));
        }
        Ok(info)
    }

    /// Metadata for every analog channel, in index order.
    pub fn analog_channels(&self) -> Result<Vec<AnalogChannelInfo>> {
        (0..self.file_info().total_number_of_analog_channels)
            .map(|index| self.get_analog_channel_info(index))
            .collect()
    }

    /// Metadata for every spike channel, in index order.
    pub fn spike_channels(&self) -> Result<Vec<SpikeChannelInfo>> {
        (0..self.file_info().total_number_of_spike_channels)
            .map(|index| self.get_spike_channel_info(index))
            .collect()
    }

    /// Metadata for every digital-event channel, in index order.
    pub fn digital_channels(&self) -> Result<Vec<DigitalChannelInfo>> {
        (0..self.file_info().number_of_digital_channels)
            .map(|index| self.get_digital_channel_info(index))
            .collect()
    }
}
