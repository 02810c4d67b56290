// src/reader/session.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::Zeroable;
use tracing::debug;

use crate::engine::{NativeEngine, RecordingEngine};
use crate::error::{Pl2Error, Result};
use crate::marshal::{
    self, AnalogData, DigitalData, SpikeData, StartStopData,
};
use crate::reader::validator::{SpikeConsistency, SpikeConsistencyCheck, SpikeSamplesAdvisory};
use crate::schema::{FileInfo, StartStopChannelInfo};
use crate::types::{ChannelSelector, FileHandle};

/// An open PL2 recording session.
///
/// The session owns its [`FileHandle`] and is the only way to talk to the
/// engine about that file: every query goes through it, and the handle is
/// released on every exit path, explicitly via [`close`](Self::close) or
/// implicitly on drop. There is no global handle state.
///
/// ```no_run
/// use pl2_rs::Pl2Reader;
///
/// fn main() -> pl2_rs::Result<()> {
///     let reader = Pl2Reader::open("session01.pl2")?;
///     println!("{} spike channels", reader.file_info().total_number_of_spike_channels);
///
///     let data = reader.get_spike_channel_data("SPK01")?;
///     println!("{} spikes", data.num_spikes());
///     Ok(())
/// } // handle released here
/// ```
pub struct Pl2Reader {
    engine: Arc<dyn RecordingEngine>,
    handle: FileHandle,
    path: PathBuf,
    /// Header snapshot taken at open; see [`refresh_file_info`](Self::refresh_file_info).
    file_info: FileInfo,
    consistency: SpikeConsistencyCheck,
}

impl Pl2Reader {
    /// Open a recording with the native engine loaded from its default
    /// location (`bin/` next to the current executable).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let engine = Arc::new(NativeEngine::load()?);
        Self::open_with_engine(engine, path)
    }

    /// Open a recording with the native engine loaded from `engine_dir`.
    pub fn open_with_engine_dir(
        engine_dir: impl AsRef<Path>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let engine = Arc::new(NativeEngine::load_from(engine_dir)?);
        Self::open_with_engine(engine, path)
    }

    /// Open a recording through an already constructed engine.
    ///
    /// This is the seam for substituting a non-native [`RecordingEngine`]
    /// (a test fake, or a relay to an engine in another process).
    pub fn open_with_engine(
        engine: Arc<dyn RecordingEngine>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut handle = FileHandle::INVALID;
        let status = engine.open_file(&path, &mut handle);
        if !status.is_success() || !handle.is_valid() {
            return Err(Pl2Error::OpenFailed {
                path,
                detail: marshal::last_error_text(&*engine),
            });
        }
        debug!(path = %path.display(), handle = handle.0, "opened recording");

        let mut file_info = FileInfo::zeroed();
        if !engine.file_info(handle, &mut file_info).is_success() {
            // Release the handle on this early error path too.
            let err = Pl2Error::CallFailed {
                call: "PL2_GetFileInfo",
                detail: marshal::last_error_text(&*engine),
            };
            engine.close_file(handle);
            return Err(err);
        }

        let mut consistency = SpikeConsistencyCheck::new();
        consistency.run(&*engine, handle, &file_info);

        Ok(Pl2Reader {
            engine,
            handle,
            path,
            file_info,
            consistency,
        })
    }

    /// The path this session was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw engine handle. Zero once the session is closed.
    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    /// The file-level header snapshot taken at open.
    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    /// Re-query the file-level header from the engine.
    pub fn refresh_file_info(&mut self) -> Result<&FileInfo> {
        self.ensure_open()?;
        let mut info = FileInfo::zeroed();
        if !self.engine.file_info(self.handle, &mut info).is_success() {
            return Err(self.call_failed("PL2_GetFileInfo"));
        }
        self.file_info = info;
        Ok(&self.file_info)
    }

    /// Outcome of the post-open spike-channel consistency check.
    pub fn spike_consistency(&self) -> SpikeConsistency {
        self.consistency.state()
    }

    /// The advisory from the post-open consistency check, if one fired.
    pub fn spike_samples_advisory(&self) -> Option<&SpikeSamplesAdvisory> {
        self.consistency.advisory()
    }

    /// The engine's description of the most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        marshal::last_error_text(&*self.engine)
    }

    /// Fetch analog channel data, buffers sized from a fresh info query on
    /// the selected channel.
    pub fn get_analog_channel_data(
        &self,
        selector: impl Into<ChannelSelector>,
    ) -> Result<AnalogData> {
        self.ensure_open()?;
        marshal::fetch_analog_data(&*self.engine, self.handle, &selector.into())
    }

    /// Fetch spike channel data. The waveform buffer is sized with the
    /// selected channel's own `samples_per_spike`, re-read for this call.
    pub fn get_spike_channel_data(
        &self,
        selector: impl Into<ChannelSelector>,
    ) -> Result<SpikeData> {
        self.ensure_open()?;
        marshal::fetch_spike_data(&*self.engine, self.handle, &selector.into())
    }

    /// Fetch digital-event channel data.
    pub fn get_digital_channel_data(
        &self,
        selector: impl Into<ChannelSelector>,
    ) -> Result<DigitalData> {
        self.ensure_open()?;
        marshal::fetch_digital_data(&*self.engine, self.handle, &selector.into())
    }

    /// Query the start/stop marker stream's event count.
    pub fn get_start_stop_channel_info(&self) -> Result<StartStopChannelInfo> {
        self.ensure_open()?;
        let mut info = StartStopChannelInfo::zeroed();
        if !self
            .engine
            .start_stop_channel_info(self.handle, &mut info)
            .is_success()
        {
            return Err(self.call_failed("PL2_GetStartStopChannelInfo"));
        }
        Ok(info)
    }

    /// Fetch the recording start/stop markers.
    pub fn get_start_stop_channel_data(&self) -> Result<StartStopData> {
        self.ensure_open()?;
        marshal::fetch_start_stop_data(&*self.engine, self.handle)
    }

    /// Release the handle now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    /// Ask the engine to release every handle it holds, this session's
    /// included.
    pub fn close_all(mut self) {
        self.engine.close_all_files();
        self.handle = FileHandle::INVALID;
    }

    pub(crate) fn engine(&self) -> &dyn RecordingEngine {
        &*self.engine
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.handle.is_valid() {
            Ok(())
        } else {
            Err(Pl2Error::HandleClosed)
        }
    }

    pub(crate) fn call_failed(&self, call: &'static str) -> Pl2Error {
        Pl2Error::CallFailed {
            call,
            detail: marshal::last_error_text(&*self.engine),
        }
    }

    fn release(&mut self) {
        if self.handle.is_valid() {
            debug!(handle = self.handle.0, "closing recording");
            self.engine.close_file(self.handle);
            self.handle = FileHandle::INVALID;
        }
    }
}

impl Drop for Pl2Reader {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Pl2Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pl2Reader")
            .field("path", &self.path)
            .field("handle", &self.handle)
            .field("consistency", &self.consistency.state())
            .finish()
    }
}
