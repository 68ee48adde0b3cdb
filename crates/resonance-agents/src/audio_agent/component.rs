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

use super::{AudioConfig, AudioEngine};
use resonance_core::{asset::AssetId, audio::AudioDevice};
use resonance_infra::audio::CpalAudioDevice;

/// Property naming the waveform file a component plays when it is configured.
pub const SOUND_PROPERTY: &str = "sound";

/// The scene-facing owner of an [`AudioEngine`].
///
/// Creating the component brings the device up; dropping it shuts the device down.
#[derive(Debug)]
pub struct AudioComponent {
    engine: AudioEngine,
}

impl AudioComponent {
    /// Creates a component whose engine drives `device`.
    pub fn new(device: Box<dyn AudioDevice>, config: AudioConfig) -> Self {
        Self {
            engine: AudioEngine::new(device, config),
        }
    }

    /// Creates a component on the host's default output device.
    pub fn with_default_device() -> Self {
        Self::new(Box::new(CpalAudioDevice::new()), AudioConfig::default())
    }

    /// Applies a property bag read from a scene file.
    ///
    /// Only [`SOUND_PROPERTY`] is recognized: its path is loaded and played on
    /// the main channel. A file that fails to load is logged and skipped so the
    /// rest of the scene can still load. Returns the id of the waveform now
    /// playing, if any.
    pub fn set_properties(&mut self, properties: &serde_json::Value) -> Option<AssetId> {
        let sound = properties.get(SOUND_PROPERTY)?;
        let Some(path) = sound.as_str() else {
            log::warn!("Ignoring non-string '{SOUND_PROPERTY}' property: {sound}");
            return None;
        };

        match self.engine.play_file(path) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Audio component could not play '{path}': {e}");
                None
            }
        }
    }

    /// The engine, for control from game logic.
    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    /// Mutable access to the engine, for loading and error polling.
    pub fn engine_mut(&mut self) -> &mut AudioEngine {
        &mut self.engine
    }
}
