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

// Resonance Sandbox
// Plays the waveform file given as the first argument until it ends.

use anyhow::{Context, Result};
use resonance_agents::audio_agent::AudioComponent;
use std::path::PathBuf;

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: sandbox <file.wav>")?;

    let mut component = AudioComponent::with_default_device();
    if !component.engine().is_initialized() {
        log::error!("No audio output available, nothing to play");
        return Ok(());
    }

    let engine = component.engine_mut();
    let id = engine.play_file(&path)?;
    if let Some(waveform) = engine.asset(id) {
        log::info!(
            "Playing '{}' ({:.2}s)",
            path.display(),
            waveform.duration().as_secs_f32()
        );
    }

    let tick = engine.config().stream.block_duration();
    while engine.main_channel().is_playing() {
        std::thread::sleep(tick);
        engine.poll_device_errors();
        if engine.stream_failed() {
            log::error!("Output stream failed, stopping playback");
            break;
        }
    }

    log::info!("Playback finished");
    Ok(())
}
