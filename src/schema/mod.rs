// src/schema/mod.rs
//! Record schemas shared with the native engine.

mod records;

pub use records::{
    AnalogChannelInfo, DigitalChannelInfo, FileInfo, SpikeChannelInfo, StartStopChannelInfo,
    TimeOfDay,
};

// The engine addresses these records positionally; the sizes below are part
// of its ABI. A compile failure here means a record was relayouted.
const _: () = assert!(std::mem::size_of::<TimeOfDay>() == 36);
const _: () = assert!(std::mem::size_of::<FileInfo>() == 816);
const _: () = assert!(std::mem::size_of::<AnalogChannelInfo>() == 136);
const _: () = assert!(std::mem::size_of::<SpikeChannelInfo>() == 2208);
const _: () = assert!(std::mem::size_of::<DigitalChannelInfo>() == 88);
const _: () = assert!(std::mem::size_of::<StartStopChannelInfo>() == 8);
