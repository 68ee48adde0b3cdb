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

//! Contains the `CpalAudioDevice` struct.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use resonance_core::audio::{
    AudioDevice, DataSource, DeviceError, OutputDeviceInfo, SampleFormat, StreamConfig,
    StreamInfo,
};

/// An `AudioDevice` implementation that uses the host's default audio output device via CPAL.
///
/// The stream lives inside the device and is dropped by `shutdown`; nothing
/// is leaked to keep it alive.
#[derive(Default)]
pub struct CpalAudioDevice {
    host: Option<cpal::Host>,
    device: Option<cpal::Device>,
    stream: Option<cpal::Stream>,
    stream_info: Option<StreamInfo>,
    max_voices: u32,
}

impl CpalAudioDevice {
    /// Creates a new instance of the CPAL audio device backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// The voice budget passed to `initialize`.
    pub fn max_voices(&self) -> u32 {
        self.max_voices
    }
}

#[allow(deprecated)]
fn device_name(device: &cpal::Device) -> String {
    device
        .name()
        .unwrap_or_else(|_| String::from("<unnamed device>"))
}

/// Picks the cpal stream configuration for `config`.
///
/// The device must list a range with the same channel count and sample
/// format that covers the requested rate. The decode block size becomes a
/// fixed buffer size when that range allows it; otherwise the host default
/// is used and pulls are sized by the host.
fn negotiate(
    device: &cpal::Device,
    config: &StreamConfig,
) -> Result<cpal::StreamConfig, DeviceError> {
    let wanted_format = match config.format {
        SampleFormat::Pcm16 => cpal::SampleFormat::I16,
    };

    let range = device
        .supported_output_configs()
        .map_err(|e| DeviceError::UnsupportedConfig(e.to_string()))?
        .find(|range| {
            range.channels() == config.channels
                && range.sample_format() == wanted_format
                && range.min_sample_rate() <= config.sample_rate
                && config.sample_rate <= range.max_sample_rate()
        })
        .ok_or_else(|| {
            DeviceError::UnsupportedConfig(format!(
                "no {wanted_format} output with {} channel(s) at {} Hz",
                config.channels, config.sample_rate
            ))
        })?;

    let frames = config.frames_per_block();
    let buffer_size = match range.buffer_size() {
        cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&frames) => {
            cpal::BufferSize::Fixed(frames)
        }
        _ => {
            log::warn!(
                "Output device cannot use a fixed buffer of {frames} frames, using the host default"
            );
            cpal::BufferSize::Default
        }
    };

    Ok(cpal::StreamConfig {
        channels: config.channels,
        sample_rate: config.sample_rate,
        buffer_size,
    })
}

impl AudioDevice for CpalAudioDevice {
    fn initialize(&mut self, max_voices: u32) -> Result<(), DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceError::NoOutputDevice)?;

        log::info!(
            "Audio host '{}' opened default output '{}' ({max_voices} voices)",
            host.id().name(),
            device_name(&device)
        );

        self.max_voices = max_voices;
        self.host = Some(host);
        self.device = Some(device);
        Ok(())
    }

    fn output_devices(&self) -> Result<Vec<OutputDeviceInfo>, DeviceError> {
        let host = self.host.as_ref().ok_or(DeviceError::NotInitialized)?;
        let default_name = self.device.as_ref().map(device_name);

        let devices = host
            .output_devices()
            .map_err(|e| DeviceError::Enumeration(e.to_string()))?;

        Ok(devices
            .map(|device| {
                let name = device_name(&device);
                OutputDeviceInfo {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    name,
                }
            })
            .collect())
    }

    fn create_stream(
        &mut self,
        config: &StreamConfig,
        mut source: Box<dyn DataSource>,
        errors: flume::Sender<DeviceError>,
    ) -> Result<StreamInfo, DeviceError> {
        let device = self.device.as_ref().ok_or(DeviceError::NotInitialized)?;
        let stream_config = negotiate(device, config)?;

        let audio_callback = move |output: &mut [i16], _: &cpal::OutputCallbackInfo| {
            // A failed pull cannot be retried inside the callback.
            let _ = source.pull(output);
        };

        let error_callback = move |err: cpal::StreamError| {
            // The engine may already be gone.
            let _ = errors.send(DeviceError::Stream(err.to_string()));
        };

        let stream = device
            .build_output_stream(&stream_config, audio_callback, error_callback, None)
            .map_err(|e| DeviceError::BuildStream(e.to_string()))?;

        let info = config.stream_info();
        log::debug!(
            "Built output stream: {} Hz, {} channel(s), buffer {:?}",
            info.sample_rate,
            info.channels,
            stream_config.buffer_size
        );

        self.stream = Some(stream);
        self.stream_info = Some(info);
        Ok(info)
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        let stream = self.stream.as_ref().ok_or(DeviceError::NotInitialized)?;
        stream.play().map_err(|e| DeviceError::Play(e.to_string()))
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.stream_info
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause output stream during shutdown: {e}");
            }
            // Dropping the stream joins the callback thread and frees the data source.
            drop(stream);
            log::debug!("Output stream closed");
        }
        self.stream_info = None;
        self.device = None;
        self.host = None;
    }
}
