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

//! Implements a fixed-layout loader for uncompressed 16-bit PCM waveform files.
//!
//! The loader does not walk chunks. It reads five little-endian fields at the
//! offsets of the canonical 44-byte header and treats everything after byte 44
//! as sample data:
//!
//! | Offset | Type  | Field           |
//! |--------|-------|-----------------|
//! | 22     | `u16` | channel count   |
//! | 24     | `u32` | sample rate     |
//! | 34     | `u16` | bits per sample |
//! | 40     | `u32` | data length     |
//! | 44     | `i16` | PCM samples     |
//!
//! Containers with extra chunks before `data` are not rejected; they load with
//! whatever values sit at those offsets.

use crate::asset_lane::AssetLoaderLane;
use resonance_core::{
    audio::AudioError,
    lane::{Lane, LaneKind},
};
use resonance_data::assets::WaveformAsset;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

/// Size of the fixed header; sample data starts right after it.
pub const HEADER_LEN: usize = 44;

const CHANNELS_OFFSET: usize = 22;
const SAMPLE_RATE_OFFSET: usize = 24;
const BITS_PER_SAMPLE_OFFSET: usize = 34;
const DATA_LEN_OFFSET: usize = 40;

/// The header fields of a waveform container, read from their fixed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformHeader {
    /// Channel count (offset 22).
    pub channels: u16,
    /// Sample rate in Hz (offset 24).
    pub sample_rate: u32,
    /// Bits per sample (offset 34).
    pub bits_per_sample: u16,
    /// Length of the sample data in bytes (offset 40).
    pub data_len: u32,
}

impl WaveformHeader {
    /// Reads the header fields out of the first [`HEADER_LEN`] bytes of a file.
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        Self {
            channels: u16_at(CHANNELS_OFFSET),
            sample_rate: u32_at(SAMPLE_RATE_OFFSET),
            bits_per_sample: u16_at(BITS_PER_SAMPLE_OFFSET),
            data_len: u32_at(DATA_LEN_OFFSET),
        }
    }

    /// Number of 16-bit samples in the data chunk. An odd trailing byte is dropped.
    pub fn sample_count(&self) -> usize {
        self.data_len as usize / 2
    }

    /// Number of data bytes actually decoded.
    fn payload_len(&self) -> usize {
        self.sample_count() * 2
    }

    fn into_asset(self, samples: Vec<i16>) -> WaveformAsset {
        WaveformAsset::new(
            self.sample_rate,
            self.channels,
            self.bits_per_sample,
            samples,
        )
    }
}

/// An `AssetLoaderLane` that decodes fixed-layout PCM waveform containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaveformLoaderLane;

impl WaveformLoaderLane {
    /// Creates a new instance of `WaveformLoaderLane`.
    pub fn new() -> Self {
        Self
    }

    /// Opens `path` and decodes it.
    ///
    /// The samples are read straight into the final buffer, so a load performs
    /// a single allocation of `data_len / 2` samples.
    ///
    /// # Errors
    /// Returns [`AudioError::Io`] if the file cannot be opened, is shorter than
    /// the header, or holds fewer data bytes than the header declares.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<WaveformAsset, AudioError> {
        let path = path.as_ref();
        let io_error = |source: io::Error| AudioError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let file_len = file.metadata().map_err(io_error)?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header).map_err(io_error)?;
        let header = WaveformHeader::parse(&header);

        // Refuse before allocating when the file cannot hold the declared data.
        let available = file_len.saturating_sub(HEADER_LEN as u64);
        if (header.payload_len() as u64) > available {
            return Err(io_error(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "header declares {} data bytes but only {available} follow it",
                    header.data_len
                ),
            )));
        }

        let mut samples = vec![0i16; header.sample_count()];
        reader
            .read_exact(bytemuck::cast_slice_mut(&mut samples))
            .map_err(io_error)?;
        for sample in &mut samples {
            *sample = i16::from_le(*sample);
        }

        let asset = header.into_asset(samples);
        log::debug!(
            "Loaded waveform '{}': {} Hz, {} channel(s), {} bits, {} samples",
            path.display(),
            asset.sample_rate(),
            asset.channels(),
            asset.bits_per_sample(),
            asset.sample_count()
        );
        Ok(asset)
    }
}

impl AssetLoaderLane<WaveformAsset> for WaveformLoaderLane {
    /// Decodes an in-memory waveform container.
    fn load(&self, bytes: &[u8]) -> Result<WaveformAsset, AudioError> {
        let header: &[u8; HEADER_LEN] = bytes
            .get(..HEADER_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(AudioError::ShortRead {
                expected: HEADER_LEN,
                found: bytes.len(),
            })?;
        let header = WaveformHeader::parse(header);

        let expected = HEADER_LEN + header.payload_len();
        let payload = bytes
            .get(HEADER_LEN..expected)
            .ok_or(AudioError::ShortRead {
                expected,
                found: bytes.len(),
            })?;

        let samples = payload
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(header.into_asset(samples))
    }
}

impl Lane for WaveformLoaderLane {
    fn strategy_name(&self) -> &'static str {
        "WaveformLoader"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Asset
    }
}
