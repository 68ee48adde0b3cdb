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

//! Defines the core asset type for PCM audio data.

use resonance_core::asset::Asset;
use std::time::Duration;

/// A decoded waveform, ready for playback.
///
/// Samples are stored exactly as the container held them: signed 16-bit,
/// interleaved if the source had several channels. No resampling or bit-depth
/// conversion happens, so callers must match the asset to the output stream.
///
/// The sample buffer cannot be modified after construction, which is what makes
/// it safe to read from the audio thread while the game thread holds the same
/// asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformAsset {
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    samples: Box<[i16]>,
}

impl WaveformAsset {
    /// Creates a waveform from its header fields and decoded samples.
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            samples: samples.into_boxed_slice(),
        }
    }

    /// Samples per second, as declared by the container.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count, as declared by the container.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Bits per sample, as declared by the container.
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Number of 16-bit samples held (across all channels).
    pub fn sample_count(&self) -> u32 {
        self.samples.len() as u32
    }

    /// The raw PCM samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Size of the sample buffer in bytes, always `sample_count * 2`.
    pub fn data_len(&self) -> usize {
        self.samples.len() * std::mem::size_of::<i16>()
    }

    /// Returns `true` if the waveform holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length according to the declared rate and channel count.
    ///
    /// Garbage headers (zero rate or zero channels) report a zero duration.
    pub fn duration(&self) -> Duration {
        let per_second = u64::from(self.sample_rate) * u64::from(self.channels);
        if per_second == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.samples.len() as u64 * 1_000_000_000 / per_second)
    }
}

impl Asset for WaveformAsset {}
