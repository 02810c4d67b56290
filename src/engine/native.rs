// src/engine/native.rs
//! Binding to the vendor's PL2FileReader shared library.
//!
//! Every entry point is resolved eagerly at load time into a table of typed
//! `extern "C"` function pointers; a missing library or symbol is fatal for
//! the binding instance, with the attempted path in the error. No retry, no
//! fallback.
//!
//! The engine does not document reentrancy, so a process-wide binding
//! serializes all calls behind one lock: single call in flight, as the call
//! model requires.

use std::ffi::CString;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};

use libloading::Library;
use parking_lot::Mutex;
use tracing::debug;

use crate::engine::RecordingEngine;
use crate::error::{Pl2Error, Result};
use crate::schema::{
    AnalogChannelInfo, DigitalChannelInfo, FileInfo, SpikeChannelInfo, StartStopChannelInfo,
};
use crate::types::{ChannelSelector, FileHandle, Status};
use crate::utils::text::name_to_cstring;

type OpenFileFn = unsafe extern "C" fn(*const c_char, *mut i32) -> i32;
type CloseFileFn = unsafe extern "C" fn(i32);
type CloseAllFilesFn = unsafe extern "C" fn();
type LastErrorFn = unsafe extern "C" fn(*mut c_char, i32) -> i32;
type FileInfoFn = unsafe extern "C" fn(i32, *mut FileInfo) -> i32;

type AnalogInfoFn = unsafe extern "C" fn(i32, i32, *mut AnalogChannelInfo) -> i32;
type AnalogInfoByNameFn = unsafe extern "C" fn(i32, *const c_char, *mut AnalogChannelInfo) -> i32;
type AnalogInfoBySourceFn = unsafe extern "C" fn(i32, i32, i32, *mut AnalogChannelInfo) -> i32;
type AnalogDataFn =
    unsafe extern "C" fn(i32, i32, *mut u64, *mut u64, *mut i64, *mut u64, *mut i16) -> i32;
type AnalogDataByNameFn = unsafe extern "C" fn(
    i32,
    *const c_char,
    *mut u64,
    *mut u64,
    *mut i64,
    *mut u64,
    *mut i16,
) -> i32;
type AnalogDataBySourceFn =
    unsafe extern "C" fn(i32, i32, i32, *mut u64, *mut u64, *mut i64, *mut u64, *mut i16) -> i32;

type SpikeInfoFn = unsafe extern "C" fn(i32, i32, *mut SpikeChannelInfo) -> i32;
type SpikeInfoByNameFn = unsafe extern "C" fn(i32, *const c_char, *mut SpikeChannelInfo) -> i32;
type SpikeInfoBySourceFn = unsafe extern "C" fn(i32, i32, i32, *mut SpikeChannelInfo) -> i32;
type SpikeDataFn = unsafe extern "C" fn(i32, i32, *mut u64, *mut u64, *mut u16, *mut i16) -> i32;
type SpikeDataByNameFn =
    unsafe extern "C" fn(i32, *const c_char, *mut u64, *mut u64, *mut u16, *mut i16) -> i32;
type SpikeDataBySourceFn =
    unsafe extern "C" fn(i32, i32, i32, *mut u64, *mut u64, *mut u16, *mut i16) -> i32;

type DigitalInfoFn = unsafe extern "C" fn(i32, i32, *mut DigitalChannelInfo) -> i32;
type DigitalInfoByNameFn = unsafe extern "C" fn(i32, *const c_char, *mut DigitalChannelInfo) -> i32;
type DigitalInfoBySourceFn =
    unsafe extern "C" fn(i32, i32, i32, *mut DigitalChannelInfo) -> i32;
type DigitalDataFn = unsafe extern "C" fn(i32, i32, *mut u64, *mut i64, *mut u16) -> i32;
type DigitalDataByNameFn =
    unsafe extern "C" fn(i32, *const c_char, *mut u64, *mut i64, *mut u16) -> i32;
type DigitalDataBySourceFn =
    unsafe extern "C" fn(i32, i32, i32, *mut u64, *mut i64, *mut u16) -> i32;

type StartStopInfoFn = unsafe extern "C" fn(i32, *mut u64) -> i32;
type StartStopDataFn = unsafe extern "C" fn(i32, *mut u64, *mut i64, *mut u16) -> i32;

/// Engine entry points, resolved once at load.
#[derive(Debug)]
struct SymbolTable {
    open_file: OpenFileFn,
    close_file: CloseFileFn,
    close_all_files: CloseAllFilesFn,
    last_error: LastErrorFn,
    file_info: FileInfoFn,

    analog_info: AnalogInfoFn,
    analog_info_by_name: AnalogInfoByNameFn,
    analog_info_by_source: AnalogInfoBySourceFn,
    analog_data: AnalogDataFn,
    analog_data_by_name: AnalogDataByNameFn,
    analog_data_by_source: AnalogDataBySourceFn,

    spike_info: SpikeInfoFn,
    spike_info_by_name: SpikeInfoByNameFn,
    spike_info_by_source: SpikeInfoBySourceFn,
    spike_data: SpikeDataFn,
    spike_data_by_name: SpikeDataByNameFn,
    spike_data_by_source: SpikeDataBySourceFn,

    digital_info: DigitalInfoFn,
    digital_info_by_name: DigitalInfoByNameFn,
    digital_info_by_source: DigitalInfoBySourceFn,
    digital_data: DigitalDataFn,
    digital_data_by_name: DigitalDataByNameFn,
    digital_data_by_source: DigitalDataBySourceFn,

    start_stop_info: StartStopInfoFn,
    start_stop_data: StartStopDataFn,
}

/// Copy a function pointer out of the library, keeping its name in the
/// error on failure.
///
/// # Safety
/// `T` must be the exact `extern "C"` signature of the named export.
unsafe fn resolve<T: Copy + 'static>(lib: &Library, name: &'static str) -> Result<T> {
    lib.get::<T>(name.as_bytes())
        .map(|symbol| *symbol)
        .map_err(|source| Pl2Error::MissingSymbol { name, source })
}

/// The concrete [`RecordingEngine`] backed by the vendor's shared library.
#[derive(Debug)]
pub struct NativeEngine {
    symbols: SymbolTable,
    /// Single call in flight; the engine's reentrancy is undocumented.
    call_lock: Mutex<()>,
    /// Keeps the resolved function pointers alive.
    _library: Library,
}

impl NativeEngine {
    /// Load the engine from the default location: a `bin` subdirectory next
    /// to the current executable (falling back to `./bin`).
    pub fn load() -> Result<Self> {
        Self::load_from(default_engine_dir())
    }

    /// Load the engine library from `dir`.
    ///
    /// Fails fast with [`Pl2Error::EngineLoad`] naming the attempted path
    /// if the library cannot be loaded, or [`Pl2Error::MissingSymbol`] if
    /// an entry point is absent.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self> {
        let path = engine_library_path(dir.as_ref());
        debug!(path = %path.display(), "loading PL2 engine library");

        // Safety: the engine library's initializers are the vendor's; we
        // require the path to point at a genuine PL2FileReader build.
        let library = unsafe { Library::new(&path) }.map_err(|source| Pl2Error::EngineLoad {
            path: path.clone(),
            source,
        })?;

        // Safety: each signature matches the engine's C declaration for
        // that export; see the schema records for the struct layouts.
        let symbols = unsafe {
            SymbolTable {
                open_file: resolve(&library, "PL2_OpenFile")?,
                close_file: resolve(&library, "PL2_CloseFile")?,
                close_all_files: resolve(&library, "PL2_CloseAllFiles")?,
                last_error: resolve(&library, "PL2_GetLastError")?,
                file_info: resolve(&library, "PL2_GetFileInfo")?,

                analog_info: resolve(&library, "PL2_GetAnalogChannelInfo")?,
                analog_info_by_name: resolve(&library, "PL2_GetAnalogChannelInfoByName")?,
                analog_info_by_source: resolve(&library, "PL2_GetAnalogChannelInfoBySource")?,
                analog_data: resolve(&library, "PL2_GetAnalogChannelData")?,
                analog_data_by_name: resolve(&library, "PL2_GetAnalogChannelDataByName")?,
                analog_data_by_source: resolve(&library, "PL2_GetAnalogChannelDataBySource")?,

                spike_info: resolve(&library, "PL2_GetSpikeChannelInfo")?,
                spike_info_by_name: resolve(&library, "PL2_GetSpikeChannelInfoByName")?,
                spike_info_by_source: resolve(&library, "PL2_GetSpikeChannelInfoBySource")?,
                spike_data: resolve(&library, "PL2_GetSpikeChannelData")?,
                spike_data_by_name: resolve(&library, "PL2_GetSpikeChannelDataByName")?,
                spike_data_by_source: resolve(&library, "PL2_GetSpikeChannelDataBySource")?,

                digital_info: resolve(&library, "PL2_GetDigitalChannelInfo")?,
                digital_info_by_name: resolve(&library, "PL2_GetDigitalChannelInfoByName")?,
                digital_info_by_source: resolve(&library, "PL2_GetDigitalChannelInfoBySource")?,
                digital_data: resolve(&library, "PL2_GetDigitalChannelData")?,
                digital_data_by_name: resolve(&library, "PL2_GetDigitalChannelDataByName")?,
                digital_data_by_source: resolve(&library, "PL2_GetDigitalChannelDataBySource")?,

                start_stop_info: resolve(&library, "PL2_GetStartStopChannelInfo")?,
                start_stop_data: resolve(&library, "PL2_GetStartStopChannelData")?,
            }
        };

        debug!("PL2 engine library loaded");
        Ok(NativeEngine {
            symbols,
            call_lock: Mutex::new(()),
            _library: library,
        })
    }
}

/// `bin` next to the current executable, or plain `bin` when the
/// executable's path is unavailable.
fn default_engine_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join("bin"))
        .unwrap_or_else(|| PathBuf::from("bin"))
}

/// Platform library file name inside the engine directory, e.g.
/// `PL2FileReader.dll` on Windows, `libPL2FileReader.so` on Linux.
fn engine_library_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        "{}PL2FileReader{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    ))
}

impl RecordingEngine for NativeEngine {
    fn open_file(&self, path: &Path, handle: &mut FileHandle) -> Status {
        let _guard = self.call_lock.lock();
        let Ok(c_path) = CString::new(path.to_string_lossy().as_bytes()) else {
            return Status::FAILURE;
        };
        let mut raw: i32 = 0;
        // Safety: c_path is null-terminated and raw outlives the call.
        let code = unsafe { (self.symbols.open_file)(c_path.as_ptr(), &mut raw) };
        *handle = FileHandle(raw);
        Status(code)
    }

    fn close_file(&self, handle: FileHandle) {
        if !handle.is_valid() {
            return;
        }
        let _guard = self.call_lock.lock();
        // Safety: takes the handle by value; invalid handles already
        // filtered out above.
        unsafe { (self.symbols.close_file)(handle.0) };
    }

    fn close_all_files(&self) {
        let _guard = self.call_lock.lock();
        // Safety: no arguments.
        unsafe { (self.symbols.close_all_files)() };
    }

    fn last_error(&self, buffer: &mut [u8]) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: the engine writes at most `len` bytes into `buffer`.
        let code = unsafe {
            (self.symbols.last_error)(buffer.as_mut_ptr() as *mut c_char, buffer.len() as i32)
        };
        Status(code)
    }

    fn file_info(&self, handle: FileHandle, info: &mut FileInfo) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: `info` is a Pod record with the engine's exact layout.
        Status(unsafe { (self.symbols.file_info)(handle.0, info) })
    }

    fn analog_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut AnalogChannelInfo,
    ) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: `info` is a Pod record with the engine's exact layout;
        // name selectors are converted to null-terminated C strings.
        let code = match selector {
            ChannelSelector::Index(index) => unsafe {
                (self.symbols.analog_info)(handle.0, *index as i32, info)
            },
            ChannelSelector::Name(name) => {
                let Ok(c_name) = name_to_cstring(name) else {
                    return Status::FAILURE;
                };
                unsafe { (self.symbols.analog_info_by_name)(handle.0, c_name.as_ptr(), info) }
            }
            ChannelSelector::Source { source, channel } => unsafe {
                (self.symbols.analog_info_by_source)(
                    handle.0,
                    *source as i32,
                    *channel as i32,
                    info,
                )
            },
        };
        Status(code)
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
        let _guard = self.call_lock.lock();
        // Safety: all output slices were sized by the caller from this
        // channel's info record; the engine fills at most those capacities.
        let code = match selector {
            ChannelSelector::Index(index) => unsafe {
                (self.symbols.analog_data)(
                    handle.0,
                    *index as i32,
                    num_fragments_returned,
                    num_values_returned,
                    fragment_timestamps.as_mut_ptr(),
                    fragment_counts.as_mut_ptr(),
                    values.as_mut_ptr(),
                )
            },
            ChannelSelector::Name(name) => {
                let Ok(c_name) = name_to_cstring(name) else {
                    return Status::FAILURE;
                };
                unsafe {
                    (self.symbols.analog_data_by_name)(
                        handle.0,
                        c_name.as_ptr(),
                        num_fragments_returned,
                        num_values_returned,
                        fragment_timestamps.as_mut_ptr(),
                        fragment_counts.as_mut_ptr(),
                        values.as_mut_ptr(),
                    )
                }
            }
            ChannelSelector::Source { source, channel } => unsafe {
                (self.symbols.analog_data_by_source)(
                    handle.0,
                    *source as i32,
                    *channel as i32,
                    num_fragments_returned,
                    num_values_returned,
                    fragment_timestamps.as_mut_ptr(),
                    fragment_counts.as_mut_ptr(),
                    values.as_mut_ptr(),
                )
            },
        };
        Status(code)
    }

    fn spike_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut SpikeChannelInfo,
    ) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: as for analog_channel_info.
        let code = match selector {
            ChannelSelector::Index(index) => unsafe {
                (self.symbols.spike_info)(handle.0, *index as i32, info)
            },
            ChannelSelector::Name(name) => {
                let Ok(c_name) = name_to_cstring(name) else {
                    return Status::FAILURE;
                };
                unsafe { (self.symbols.spike_info_by_name)(handle.0, c_name.as_ptr(), info) }
            }
            ChannelSelector::Source { source, channel } => unsafe {
                (self.symbols.spike_info_by_source)(
                    handle.0,
                    *source as i32,
                    *channel as i32,
                    info,
                )
            },
        };
        Status(code)
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
        let _guard = self.call_lock.lock();
        // Safety: slices sized from this channel's own info record,
        // including the per-channel samples_per_spike multiplier.
        let code = match selector {
            ChannelSelector::Index(index) => unsafe {
                (self.symbols.spike_data)(
                    handle.0,
                    *index as i32,
                    num_spikes_returned,
                    timestamps.as_mut_ptr(),
                    units.as_mut_ptr(),
                    waveforms.as_mut_ptr(),
                )
            },
            ChannelSelector::Name(name) => {
                let Ok(c_name) = name_to_cstring(name) else {
                    return Status::FAILURE;
                };
                unsafe {
                    (self.symbols.spike_data_by_name)(
                        handle.0,
                        c_name.as_ptr(),
                        num_spikes_returned,
                        timestamps.as_mut_ptr(),
                        units.as_mut_ptr(),
                        waveforms.as_mut_ptr(),
                    )
                }
            }
            ChannelSelector::Source { source, channel } => unsafe {
                (self.symbols.spike_data_by_source)(
                    handle.0,
                    *source as i32,
                    *channel as i32,
                    num_spikes_returned,
                    timestamps.as_mut_ptr(),
                    units.as_mut_ptr(),
                    waveforms.as_mut_ptr(),
                )
            },
        };
        Status(code)
    }

    fn digital_channel_info(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        info: &mut DigitalChannelInfo,
    ) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: as for analog_channel_info.
        let code = match selector {
            ChannelSelector::Index(index) => unsafe {
                (self.symbols.digital_info)(handle.0, *index as i32, info)
            },
            ChannelSelector::Name(name) => {
                let Ok(c_name) = name_to_cstring(name) else {
                    return Status::FAILURE;
                };
                unsafe { (self.symbols.digital_info_by_name)(handle.0, c_name.as_ptr(), info) }
            }
            ChannelSelector::Source { source, channel } => unsafe {
                (self.symbols.digital_info_by_source)(
                    handle.0,
                    *source as i32,
                    *channel as i32,
                    info,
                )
            },
        };
        Status(code)
    }

    fn digital_channel_data(
        &self,
        handle: FileHandle,
        selector: &ChannelSelector,
        num_events_returned: &mut u64,
        timestamps: &mut [i64],
        values: &mut [u16],
    ) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: slices sized from this channel's number_of_events.
        let code = match selector {
            ChannelSelector::Index(index) => unsafe {
                (self.symbols.digital_data)(
                    handle.0,
                    *index as i32,
                    num_events_returned,
                    timestamps.as_mut_ptr(),
                    values.as_mut_ptr(),
                )
            },
            ChannelSelector::Name(name) => {
                let Ok(c_name) = name_to_cstring(name) else {
                    return Status::FAILURE;
                };
                unsafe {
                    (self.symbols.digital_data_by_name)(
                        handle.0,
                        c_name.as_ptr(),
                        num_events_returned,
                        timestamps.as_mut_ptr(),
                        values.as_mut_ptr(),
                    )
                }
            }
            ChannelSelector::Source { source, channel } => unsafe {
                (self.symbols.digital_data_by_source)(
                    handle.0,
                    *source as i32,
                    *channel as i32,
                    num_events_returned,
                    timestamps.as_mut_ptr(),
                    values.as_mut_ptr(),
                )
            },
        };
        Status(code)
    }

    fn start_stop_channel_info(
        &self,
        handle: FileHandle,
        info: &mut StartStopChannelInfo,
    ) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: the engine call exchanges a single u64 event count.
        Status(unsafe { (self.symbols.start_stop_info)(handle.0, &mut info.number_of_events) })
    }

    fn start_stop_channel_data(
        &self,
        handle: FileHandle,
        num_events_returned: &mut u64,
        timestamps: &mut [i64],
        values: &mut [u16],
    ) -> Status {
        let _guard = self.call_lock.lock();
        // Safety: slices sized from the start/stop channel's event count.
        let code = unsafe {
            (self.symbols.start_stop_data)(
                handle.0,
                num_events_returned,
                timestamps.as_mut_ptr(),
                values.as_mut_ptr(),
            )
        };
        Status(code)
    }
}
