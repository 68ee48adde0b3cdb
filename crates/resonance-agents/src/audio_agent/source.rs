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

use resonance_core::audio::{AudioError, DataSource, TimeUnit};
use resonance_lanes::audio_lane::{AudioMixingLane, ChannelMixingLane};
use std::sync::Arc;

/// The data source an [`AudioEngine`](super::AudioEngine) registers with its device.
///
/// It holds its own reference to the mixing lane, so it stays valid for as
/// long as the device keeps it, independently of the engine.
#[derive(Debug, Clone)]
pub struct EngineDataSource {
    mixer: Arc<ChannelMixingLane>,
}

impl EngineDataSource {
    /// Creates a source that renders `mixer`.
    pub fn new(mixer: Arc<ChannelMixingLane>) -> Self {
        Self { mixer }
    }
}

impl DataSource for EngineDataSource {
    fn pull(&mut self, output: &mut [i16]) -> Result<(), AudioError> {
        output.fill(0);
        self.mixer.mix(output);
        Ok(())
    }

    /// Streams are not seekable; playback position lives on each channel.
    fn seek(&mut self, _position: u32, _unit: TimeUnit) -> Result<(), AudioError> {
        Ok(())
    }
}
