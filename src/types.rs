// src/types.rs

/// Engine call status: every entry point returns 1 on success, 0 on failure.
///
/// Not-found lookups (bad index, unmatched name, unmatched source pair) come
/// back as the same failure code as any other error; only the call site knows
/// the difference. Output records and buffers must not be trusted after a
/// failure return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Status(pub i32);

impl Status {
    pub const FAILURE: Status = Status(0);
    pub const SUCCESS: Status = Status(1);

    pub fn is_success(self) -> bool {
        self.0 == 1
    }
}

/// Opaque reference to an open recording, issued by the engine.
///
/// Zero is the invalid/closed handle. The engine never hands out zero for a
/// successful open, so `is_valid()` doubles as the open-failure check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileHandle(pub i32);

impl FileHandle {
    pub const INVALID: FileHandle = FileHandle(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for FileHandle {
    fn default() -> Self {
        FileHandle::INVALID
    }
}

/// One of the three equivalent ways to address a channel of a given kind.
///
/// For the same physical channel, all three must resolve to identical
/// metadata. Resolution itself is owned by the engine; this crate only
/// dispatches to the matching entry-point variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelector {
    /// Zero-based index within the channel kind's total count.
    Index(u32),
    /// ASCII channel name. The format does not guarantee uniqueness.
    Name(String),
    /// Numeric source id plus the one-based index of the channel within
    /// that source.
    Source { source: u32, channel: u32 },
}

impl ChannelSelector {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            ChannelSelector::Index(i) => format!("index {}", i),
            ChannelSelector::Name(name) => format!("name {:?}", name),
            ChannelSelector::Source { source, channel } => {
                format!("source {} channel {}", source, channel)
            }
        }
    }
}

impl From<u32> for ChannelSelector {
    fn from(index: u32) -> Self {
        ChannelSelector::Index(index)
    }
}

impl From<&str> for ChannelSelector {
    fn from(name: &str) -> Self {
        ChannelSelector::Name(name.to_string())
    }
}

impl From<String> for ChannelSelector {
    fn from(name: String) -> Self {
        ChannelSelector::Name(name)
    }
}
