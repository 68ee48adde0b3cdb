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

use resonance_core::audio::StreamConfig;
use serde::{Deserialize, Serialize};

/// Configuration of an [`AudioEngine`](super::AudioEngine).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Voice budget requested from the device at initialization.
    pub max_voices: u32,
    /// Number of playback channels the engine creates. Channel 0 is the main channel.
    pub voices: usize,
    /// Maximum number of distinct waveforms the engine can load.
    pub arena_capacity: usize,
    /// The output stream requested from the device.
    pub stream: StreamConfig,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_voices: 50,
            voices: 1,
            arena_capacity: 64,
            stream: StreamConfig::default(),
        }
    }
}
