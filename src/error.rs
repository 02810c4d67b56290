// src/error.rs
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Pl2Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(
        "can't load the PL2 engine library at {}: {source}. \
         The engine ships with the vendor's C++ PL2 Offline Files SDK \
         (www.plexon.com); contact support@plexon.com for more information",
        .path.display()
    )]
    EngineLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("engine library is missing the `{name}` entry point: {source}")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("failed to open recording {}{}", .path.display(), detail_suffix(.detail))]
    OpenFailed {
        path: PathBuf,
        detail: Option<String>,
    },

    #[error("engine call {call} failed{}", detail_suffix(.detail))]
    CallFailed {
        call: &'static str,
        detail: Option<String>,
    },

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("operation on a closed file handle")]
    HandleClosed,

    #[error("text too long for a {capacity}-byte field: {text:?}")]
    TextTooLong { text: String, capacity: usize },

    #[error("text is not ASCII: {0:?}")]
    NonAsciiText(String),

    #[error("embedded NUL in channel name: {0:?}")]
    EmbeddedNul(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Pl2Error>;
