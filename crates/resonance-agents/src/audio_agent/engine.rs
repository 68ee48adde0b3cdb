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

//! Contains the `AudioEngine`, which owns the output device and the voices it plays.

use super::{AudioConfig, EngineDataSource};
use resonance_core::{
    asset::AssetId,
    audio::{AudioDevice, AudioError, DeviceError, StreamInfo},
    lane::Lane,
};
use resonance_data::assets::{AssetArena, WaveformAsset};
use resonance_lanes::{
    asset_lane::WaveformLoaderLane,
    audio_lane::{ChannelMixingLane, PlaybackChannel},
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Running,
    ShutDown,
}

/// Owns an output device and the playback channels that feed it.
///
/// The engine registers an [`EngineDataSource`] with the device; from then on
/// the device's own thread pulls audio from the channels while the owning
/// thread controls them through [`channel`](Self::channel) and friends.
///
/// Device failures never make construction fail. They are logged, kept as
/// [`last_error`](Self::last_error), and leave the engine usable but silent.
pub struct AudioEngine {
    device: Box<dyn AudioDevice>,
    config: AudioConfig,
    mixer: Arc<ChannelMixingLane>,
    loader: WaveformLoaderLane,
    loaded: HashMap<PathBuf, AssetId>,
    state: EngineState,
    stream_info: Option<StreamInfo>,
    stream_errors: Option<flume::Receiver<DeviceError>>,
    last_error: Option<DeviceError>,
    stream_failed: bool,
}

impl AudioEngine {
    /// Creates the engine and immediately tries to start `device`.
    ///
    /// # Arguments
    /// * `device`: A boxed, concrete implementation of the `AudioDevice` trait.
    /// * `config`: Voice counts, arena size, and the stream to request.
    pub fn new(device: Box<dyn AudioDevice>, config: AudioConfig) -> Self {
        let assets = Arc::new(AssetArena::with_capacity(config.arena_capacity));
        let mut engine = Self {
            device,
            config,
            mixer: Arc::new(ChannelMixingLane::new(config.voices, assets)),
            loader: WaveformLoaderLane::new(),
            loaded: HashMap::new(),
            state: EngineState::Uninitialized,
            stream_info: None,
            stream_errors: None,
            last_error: None,
            stream_failed: false,
        };
        // Failures are already logged and recorded.
        let _ = engine.initialize();
        engine
    }

    /// Brings the device up and starts the stream.
    ///
    /// Does nothing if the engine is already running. On failure the error is
    /// logged and recorded, the device is shut down again, and the engine
    /// stays silent until `initialize` is called again.
    pub fn initialize(&mut self) -> Result<(), DeviceError> {
        if self.state == EngineState::Running {
            return Ok(());
        }

        match self.start_device() {
            Ok(info) => {
                log::info!(
                    "Audio engine running: {} Hz, {} channel(s), {} voice(s) on {}",
                    info.sample_rate,
                    info.channels,
                    self.mixer.channels().len(),
                    self.mixer.label()
                );
                self.stream_info = Some(info);
                self.stream_failed = false;
                self.state = EngineState::Running;
                Ok(())
            }
            Err(e) => {
                log::error!("Audio device initialization failed: {e}");
                self.device.shutdown();
                self.stream_errors = None;
                self.stream_info = None;
                self.state = EngineState::Uninitialized;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn start_device(&mut self) -> Result<StreamInfo, DeviceError> {
        self.device.initialize(self.config.max_voices)?;

        // Informational only; the default device is used either way.
        match self.device.output_devices() {
            Ok(devices) => {
                for device in &devices {
                    let marker = if device.is_default { " (default)" } else { "" };
                    log::info!("Audio output device: {}{marker}", device.name);
                }
            }
            Err(e) => log::warn!("{e}"),
        }

        let (errors_tx, errors_rx) = flume::unbounded();
        let source = EngineDataSource::new(Arc::clone(&self.mixer));
        let info = self
            .device
            .create_stream(&self.config.stream, Box::new(source), errors_tx)?;
        self.stream_errors = Some(errors_rx);

        self.device.play()?;
        Ok(info)
    }

    /// Loads the waveform at `path`, or returns the id it was loaded under before.
    ///
    /// # Errors
    /// Returns the loader's I/O error, or [`AudioError::ArenaFull`] once
    /// `arena_capacity` distinct files have been loaded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<AssetId, AudioError> {
        let path = path.as_ref();
        if let Some(&id) = self.loaded.get(path) {
            return Ok(id);
        }

        let waveform = self.loader.load_path(path).inspect_err(|e| {
            log::error!("{} failed: {e}", self.loader.label());
        })?;
        self.check_format(path, &waveform);

        let id = self.mixer.assets().insert(waveform).inspect_err(|e| {
            log::error!("Cannot keep '{}': {e}", path.display());
        })?;
        self.loaded.insert(path.to_path_buf(), id);
        Ok(id)
    }

    fn check_format(&self, path: &Path, waveform: &WaveformAsset) {
        let stream = &self.config.stream;
        if waveform.sample_rate() != stream.sample_rate {
            log::warn!(
                "'{}' is {} Hz but the stream runs at {} Hz; it will play at the wrong speed",
                path.display(),
                waveform.sample_rate(),
                stream.sample_rate
            );
        }
        if waveform.channels() != 1 {
            log::warn!(
                "'{}' has {} channels; its samples are played as a single mono voice",
                path.display(),
                waveform.channels()
            );
        }
    }

    /// Loads `path` and starts it on the main channel from the first sample.
    pub fn play_file(&mut self, path: impl AsRef<Path>) -> Result<AssetId, AudioError> {
        let path = path.as_ref();
        let id = self.load(path)?;
        self.main_channel().play(Some(id));
        log::debug!("Playing '{}' as {id}", path.display());
        Ok(id)
    }

    /// Starts an already loaded asset on the channel at `channel`.
    pub fn play_asset(&self, channel: usize, id: AssetId) -> Result<(), AudioError> {
        let channel = self
            .channel(channel)
            .ok_or(AudioError::UnknownChannel(channel))?;
        channel.play(Some(id));
        Ok(())
    }

    /// Returns the channel at `index`, if it exists.
    pub fn channel(&self, index: usize) -> Option<&PlaybackChannel> {
        self.mixer.channel(index)
    }

    /// The default voice used by [`play_file`](Self::play_file).
    pub fn main_channel(&self) -> &PlaybackChannel {
        self.mixer.main_channel()
    }

    /// Number of playback channels.
    pub fn channel_count(&self) -> usize {
        self.mixer.channels().len()
    }

    /// A loaded waveform.
    pub fn asset(&self, id: AssetId) -> Option<&WaveformAsset> {
        self.mixer.assets().get(id)
    }

    /// The arena holding every loaded waveform.
    pub fn assets(&self) -> &AssetArena<WaveformAsset> {
        self.mixer.assets()
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Returns `true` while the device stream is running.
    pub fn is_initialized(&self) -> bool {
        self.state == EngineState::Running
    }

    /// The most recent device failure, if any.
    pub fn last_error(&self) -> Option<&DeviceError> {
        self.last_error.as_ref()
    }

    /// Format of the running stream.
    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.stream_info
    }

    /// Collects the errors the device reported from its own thread since the last call.
    ///
    /// Each one is logged; the last becomes [`last_error`](Self::last_error).
    pub fn poll_device_errors(&mut self) -> Vec<DeviceError> {
        let Some(errors) = &self.stream_errors else {
            return Vec::new();
        };
        let drained: Vec<DeviceError> = errors.try_iter().collect();
        for e in &drained {
            log::error!("{e}");
        }
        if let Some(last) = drained.last() {
            self.last_error = Some(last.clone());
        }
        if drained.iter().any(|e| matches!(e, DeviceError::Stream(_))) {
            self.stream_failed = true;
        }
        drained
    }

    /// Returns `true` once the device has reported a stream error.
    ///
    /// The backend may have stopped pulling, so channels can stay "playing"
    /// forever. Cleared by a successful [`initialize`](Self::initialize).
    pub fn stream_failed(&self) -> bool {
        self.stream_failed
    }

    /// Stops every channel and closes the device. Calling it twice does nothing.
    pub fn shutdown(&mut self) {
        if self.state == EngineState::ShutDown {
            return;
        }
        self.mixer.stop_all();
        self.device.shutdown();
        self.stream_errors = None;
        self.stream_info = None;
        self.state = EngineState::ShutDown;
        log::info!("Audio engine shut down");
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("stream_info", &self.stream_info)
            .field("channels", &self.mixer.channels().len())
            .field("assets", &self.mixer.assets().len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
