// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for asset loading and device management.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors raised by the audio pipeline.
///
/// Loading errors ([`AudioError::Io`], [`AudioError::ShortRead`]) are returned
/// to whoever asked for the load. Device errors are logged where they happen
/// and kept as the engine's last error; they never abort engine construction.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The waveform file could not be opened or read.
    #[error("failed to read waveform '{}': {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// An in-memory waveform ended before the bytes its header promised.
    #[error("waveform data ends early: expected {expected} bytes, found {found}")]
    ShortRead {
        /// Number of bytes required by the header.
        expected: usize,
        /// Number of bytes actually available.
        found: usize,
    },

    /// The output device failed.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The asset arena has no free slot left.
    #[error("asset arena is full (capacity {capacity})")]
    ArenaFull {
        /// The fixed capacity of the arena.
        capacity: usize,
    },

    /// A playback channel index does not exist.
    #[error("no playback channel at index {0}")]
    UnknownChannel(usize),
}

impl AudioError {
    /// Returns `true` for errors caused by reading waveform data.
    pub fn is_io(&self) -> bool {
        matches!(self, AudioError::Io { .. } | AudioError::ShortRead { .. })
    }
}

/// Failures of the output device layer.
///
/// Cloneable so that the engine can keep the last one around for diagnostics
/// while also handing it to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device was used before `initialize` succeeded, or after `shutdown`.
    #[error("audio device is not initialized")]
    NotInitialized,

    /// The platform reports no default output device.
    #[error("no default audio output device available")]
    NoOutputDevice,

    /// Output devices could not be enumerated.
    #[error("failed to enumerate audio output devices: {0}")]
    Enumeration(String),

    /// The device cannot open a stream with the requested configuration.
    #[error("unsupported stream configuration: {0}")]
    UnsupportedConfig(String),

    /// The stream could not be created.
    #[error("failed to build audio stream: {0}")]
    BuildStream(String),

    /// The stream could not be started.
    #[error("failed to start audio stream: {0}")]
    Play(String),

    /// The backend reported an error while the stream was running.
    #[error("audio stream error: {0}")]
    Stream(String),
}
