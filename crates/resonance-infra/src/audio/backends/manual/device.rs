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

//! Contains the `ManualAudioDevice` struct and its control handle.

use resonance_core::audio::{
    AudioDevice, DataSource, DeviceError, OutputDeviceInfo, StreamConfig, StreamInfo, TimeUnit,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name reported by the single output a `ManualAudioDevice` exposes.
pub const MANUAL_OUTPUT_NAME: &str = "Manual Output";

/// A lifecycle step at which a `ManualAudioDevice` can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// `initialize` reports that no output device exists.
    Initialize,
    /// `output_devices` fails to enumerate.
    Enumerate,
    /// `create_stream` rejects the configuration.
    CreateStream,
    /// `play` fails to start the stream.
    Play,
}

#[derive(Default)]
struct State {
    initialized: bool,
    max_voices: u32,
    config: Option<StreamConfig>,
    source: Option<Box<dyn DataSource>>,
    errors: Option<flume::Sender<DeviceError>>,
    playing: bool,
    shutdown_count: usize,
    fail_at: Option<FailureStage>,
}

impl State {
    fn fails_at(&self, stage: FailureStage) -> bool {
        self.fail_at == Some(stage)
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    // The state stays consistent across a panicking test thread.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An `AudioDevice` with no sound card behind it.
///
/// The stream never runs on its own: whoever holds the paired
/// [`ManualDeviceHandle`] decides when a block is pulled and inspects what
/// the engine asked the device to do. Used for headless runs and tests.
pub struct ManualAudioDevice {
    state: Arc<Mutex<State>>,
}

/// The caller's side of a [`ManualAudioDevice`].
///
/// Cloneable, and usable from any thread.
#[derive(Clone)]
pub struct ManualDeviceHandle {
    state: Arc<Mutex<State>>,
}

impl ManualAudioDevice {
    /// Creates a working device and the handle that drives it.
    pub fn pair() -> (Self, ManualDeviceHandle) {
        Self::with_state(State::default())
    }

    /// Creates a device whose `stage` step fails.
    pub fn failing_at(stage: FailureStage) -> (Self, ManualDeviceHandle) {
        Self::with_state(State {
            fail_at: Some(stage),
            ..State::default()
        })
    }

    fn with_state(state: State) -> (Self, ManualDeviceHandle) {
        let state = Arc::new(Mutex::new(state));
        (
            Self {
                state: Arc::clone(&state),
            },
            ManualDeviceHandle { state },
        )
    }
}

impl AudioDevice for ManualAudioDevice {
    fn initialize(&mut self, max_voices: u32) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        if state.fails_at(FailureStage::Initialize) {
            return Err(DeviceError::NoOutputDevice);
        }
        state.initialized = true;
        state.max_voices = max_voices;
        log::debug!("Manual audio device initialized with {max_voices} voices");
        Ok(())
    }

    fn output_devices(&self) -> Result<Vec<OutputDeviceInfo>, DeviceError> {
        let state = lock(&self.state);
        if !state.initialized {
            return Err(DeviceError::NotInitialized);
        }
        if state.fails_at(FailureStage::Enumerate) {
            return Err(DeviceError::Enumeration("injected failure".into()));
        }
        Ok(vec![OutputDeviceInfo {
            name: MANUAL_OUTPUT_NAME.to_owned(),
            is_default: true,
        }])
    }

    fn create_stream(
        &mut self,
        config: &StreamConfig,
        source: Box<dyn DataSource>,
        errors: flume::Sender<DeviceError>,
    ) -> Result<StreamInfo, DeviceError> {
        let mut state = lock(&self.state);
        if !state.initialized {
            return Err(DeviceError::NotInitialized);
        }
        if state.fails_at(FailureStage::CreateStream) {
            return Err(DeviceError::UnsupportedConfig("injected failure".into()));
        }
        state.config = Some(*config);
        state.source = Some(source);
        state.errors = Some(errors);
        Ok(config.stream_info())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        if state.source.is_none() {
            return Err(DeviceError::NotInitialized);
        }
        if state.fails_at(FailureStage::Play) {
            return Err(DeviceError::Play("injected failure".into()));
        }
        state.playing = true;
        Ok(())
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        lock(&self.state).config.map(|config| config.stream_info())
    }

    fn shutdown(&mut self) {
        let mut state = lock(&self.state);
        state.playing = false;
        state.source = None;
        state.errors = None;
        state.config = None;
        state.initialized = false;
        state.shutdown_count += 1;
    }
}

impl ManualDeviceHandle {
    /// Runs one pull callback into `output`.
    ///
    /// Returns `false` without touching `output` unless the stream is playing.
    pub fn pull_into(&self, output: &mut [i16]) -> bool {
        let mut state = lock(&self.state);
        if !state.playing {
            return false;
        }
        match state.source.as_mut() {
            Some(source) => {
                let _ = source.pull(output);
                true
            }
            None => false,
        }
    }

    /// Pulls one decode block of the configured size, interleaved.
    pub fn pull_block(&self) -> Option<Vec<i16>> {
        let len = self.stream_config()?.samples_per_block();
        let mut block = vec![0i16; len];
        self.pull_into(&mut block).then_some(block)
    }

    /// Runs the seek callback. Returns `false` if no stream is open.
    pub fn seek(&self, position: u32, unit: TimeUnit) -> bool {
        let mut state = lock(&self.state);
        match state.source.as_mut() {
            Some(source) => source.seek(position, unit).is_ok(),
            None => false,
        }
    }

    /// Reports an asynchronous stream error, as a backend would from its own thread.
    ///
    /// Returns `false` if no stream is open or nobody is listening.
    pub fn raise_stream_error(&self, message: impl Into<String>) -> bool {
        let state = lock(&self.state);
        state
            .errors
            .as_ref()
            .is_some_and(|errors| errors.send(DeviceError::Stream(message.into())).is_ok())
    }

    /// The configuration of the open stream.
    pub fn stream_config(&self) -> Option<StreamConfig> {
        lock(&self.state).config
    }

    /// The voice budget requested at initialization.
    pub fn max_voices(&self) -> u32 {
        lock(&self.state).max_voices
    }

    /// Whether `initialize` succeeded and `shutdown` has not run since.
    pub fn is_initialized(&self) -> bool {
        lock(&self.state).initialized
    }

    /// Whether the stream has been started.
    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    /// Whether the device currently holds a data source.
    pub fn has_source(&self) -> bool {
        lock(&self.state).source.is_some()
    }

    /// How many times `shutdown` has been called.
    pub fn shutdown_count(&self) -> usize {
        lock(&self.state).shutdown_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonance_core::audio::AudioError;

    struct Counter {
        pulls: i16,
        seeks: Arc<Mutex<Vec<(u32, TimeUnit)>>>,
    }

    impl DataSource for Counter {
        fn pull(&mut self, output: &mut [i16]) -> Result<(), AudioError> {
            self.pulls += 1;
            output.fill(self.pulls);
            Ok(())
        }

        fn seek(&mut self, position: u32, unit: TimeUnit) -> Result<(), AudioError> {
            self.seeks.lock().unwrap().push((position, unit));
            Ok(())
        }
    }

    fn counter() -> (Box<dyn DataSource>, Arc<Mutex<Vec<(u32, TimeUnit)>>>) {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let source = Counter {
            pulls: 0,
            seeks: Arc::clone(&seeks),
        };
        (Box::new(source), seeks)
    }

    #[test]
    fn test_full_lifecycle() {
        let (mut device, handle) = ManualAudioDevice::pair();
        let (tx, rx) = flume::unbounded();
        let (source, seeks) = counter();

        device.initialize(50).unwrap();
        assert_eq!(handle.max_voices(), 50);
        assert_eq!(device.output_devices().unwrap()[0].name, MANUAL_OUTPUT_NAME);

        let info = device
            .create_stream(&StreamConfig::default(), source, tx)
            .unwrap();
        assert_eq!(info.sample_rate, 44_100);
        assert_eq!(device.stream_info(), Some(info));

        // Not started yet.
        assert!(handle.pull_block().is_none());

        device.play().unwrap();
        let block = handle.pull_block().unwrap();
        assert_eq!(block.len(), 8_820);
        assert!(block.iter().all(|&s| s == 1));

        assert!(handle.seek(10, TimeUnit::Milliseconds));
        assert_eq!(*seeks.lock().unwrap(), [(10, TimeUnit::Milliseconds)]);

        assert!(handle.raise_stream_error("underrun"));
        assert_eq!(rx.try_recv(), Ok(DeviceError::Stream("underrun".into())));

        device.shutdown();
        assert!(!handle.is_playing());
        assert!(!handle.has_source());
        assert_eq!(handle.shutdown_count(), 1);
        assert!(!handle.pull_into(&mut [0; 4]));
        assert!(!handle.raise_stream_error("late"));
    }

    #[test]
    fn test_calls_out_of_order_fail() {
        let (mut device, _handle) = ManualAudioDevice::pair();
        let (tx, _rx) = flume::unbounded();
        let (source, _) = counter();

        assert_eq!(device.output_devices(), Err(DeviceError::NotInitialized));
        assert_eq!(device.play(), Err(DeviceError::NotInitialized));
        assert_eq!(
            device
                .create_stream(&StreamConfig::default(), source, tx)
                .err(),
            Some(DeviceError::NotInitialized)
        );
    }

    #[test]
    fn test_injected_failures() {
        let (mut device, handle) = ManualAudioDevice::failing_at(FailureStage::Initialize);
        assert_eq!(device.initialize(1), Err(DeviceError::NoOutputDevice));
        assert!(!handle.is_initialized());

        let (mut device, _) = ManualAudioDevice::failing_at(FailureStage::Enumerate);
        device.initialize(1).unwrap();
        assert!(matches!(
            device.output_devices(),
            Err(DeviceError::Enumeration(_))
        ));

        let (mut device, handle) = ManualAudioDevice::failing_at(FailureStage::Play);
        let (tx, _rx) = flume::unbounded();
        device.initialize(1).unwrap();
        device
            .create_stream(&StreamConfig::default(), counter().0, tx)
            .unwrap();
        assert!(matches!(device.play(), Err(DeviceError::Play(_))));
        assert!(!handle.is_playing());
        assert!(handle.has_source());
    }
}
