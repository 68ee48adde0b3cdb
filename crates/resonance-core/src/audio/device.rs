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

//! Defines the abstract `AudioDevice` and `DataSource` traits.

use super::error::{AudioError, DeviceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output sample rate requested from the device, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Number of interleaved output channels (stereo).
pub const DEFAULT_CHANNELS: u16 = 2;

/// Frames delivered per pull, a tenth of a second at 44.1 kHz.
pub const DEFAULT_DECODE_BLOCK_SIZE: u32 = 4_410;

/// Sample encodings an output stream can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Signed 16-bit linear PCM.
    #[default]
    Pcm16,
}

impl SampleFormat {
    /// Size of one sample in bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Pcm16 => 2,
        }
    }
}

/// The stream the engine asks the device to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Encoding of each sample.
    pub format: SampleFormat,
    /// Number of frames (one sample per channel) the device requests per pull.
    pub decode_block_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            format: SampleFormat::Pcm16,
            decode_block_size: DEFAULT_DECODE_BLOCK_SIZE,
        }
    }
}

impl StreamConfig {
    /// Number of frames (one sample per channel) in a decode block.
    pub fn frames_per_block(&self) -> u32 {
        self.decode_block_size
    }

    /// Number of interleaved samples in one pull: every frame holds one sample per channel.
    pub fn samples_per_block(&self) -> usize {
        self.decode_block_size as usize * usize::from(self.channels)
    }

    /// Wall-clock time covered by one decode block.
    pub fn block_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(
            u64::from(self.frames_per_block()) * 1_000_000_000 / u64::from(self.sample_rate),
        )
    }

    /// Returns the stream info a device reports once this config is opened.
    pub fn stream_info(&self) -> StreamInfo {
        StreamInfo {
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }
}

/// A struct providing information about the running audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// The number of channels (e.g., 2 for stereo).
    pub channels: u16,
    /// The number of samples per second (e.g., 44100 Hz).
    pub sample_rate: u32,
}

/// Units a seek request can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Position in PCM frames.
    Pcm,
    /// Position in bytes of PCM data.
    PcmBytes,
    /// Position in milliseconds.
    Milliseconds,
}

/// Diagnostic description of an output device found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDeviceInfo {
    /// Human readable device name.
    pub name: String,
    /// Whether this is the platform's default output.
    pub is_default: bool,
}

/// The capability a stream pulls its audio from.
///
/// Both methods are called on the backend's audio thread. Implementations must
/// return in bounded time, must not allocate, and must not take any lock that
/// the game thread could be holding.
pub trait DataSource: Send {
    /// Fills `output` with the next block of interleaved samples.
    ///
    /// The returned `Result` exists for the streaming contract; there is no
    /// way for a backend to recover from a mid-stream error, so backends
    /// ignore it.
    fn pull(&mut self, output: &mut [i16]) -> Result<(), AudioError>;

    /// Moves the read position of the stream.
    fn seek(&mut self, position: u32, unit: TimeUnit) -> Result<(), AudioError>;
}

/// The abstract contract for a hardware audio device backend.
///
/// This trait is the boundary between the engine's playback logic and the
/// platform-specific infrastructure that talks to the sound card. It is
/// pull-driven: the engine hands over a [`DataSource`] and the backend calls it
/// whenever it needs more audio.
///
/// The expected call order is `initialize`, `output_devices` (optional),
/// `create_stream`, `play`, and finally `shutdown`. `shutdown` must be safe to
/// call at any point of that sequence, including after a failed step.
pub trait AudioDevice {
    /// Acquires the platform audio host and default output device.
    ///
    /// `max_voices` is the number of voices the engine intends to use.
    fn initialize(&mut self, max_voices: u32) -> Result<(), DeviceError>;

    /// Lists the output devices the platform exposes.
    fn output_devices(&self) -> Result<Vec<OutputDeviceInfo>, DeviceError>;

    /// Opens a stream with `config` that pulls its samples from `source`.
    ///
    /// Errors the backend observes while the stream is running are sent on
    /// `errors` rather than logged on the audio thread.
    fn create_stream(
        &mut self,
        config: &StreamConfig,
        source: Box<dyn DataSource>,
        errors: flume::Sender<DeviceError>,
    ) -> Result<StreamInfo, DeviceError>;

    /// Starts delivering pull callbacks.
    fn play(&mut self) -> Result<(), DeviceError>;

    /// The format of the open stream, if one has been created.
    fn stream_info(&self) -> Option<StreamInfo>;

    /// Stops the stream and releases every platform resource.
    fn shutdown(&mut self);
}
