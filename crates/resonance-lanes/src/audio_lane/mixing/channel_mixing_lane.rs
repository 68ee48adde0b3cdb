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

//! The lane that routes a device block to a fixed set of playback channels.

use super::AudioMixingLane;
use crate::audio_lane::PlaybackChannel;
use resonance_core::lane::{Lane, LaneKind};
use resonance_data::assets::{AssetArena, WaveformAsset};
use std::sync::Arc;

/// A mixing lane over a fixed number of voices.
///
/// The channel set is allocated once at construction and never resized, so the
/// lane can be shared with the audio thread through an `Arc` and driven from
/// there without locking. Channel 0 is the main channel.
///
/// Channels render in index order and write rather than sum: where two voices
/// overlap, the higher index wins.
#[derive(Debug)]
pub struct ChannelMixingLane {
    channels: Box<[PlaybackChannel]>,
    assets: Arc<AssetArena<WaveformAsset>>,
}

impl ChannelMixingLane {
    /// Creates a lane with `voices` channels (at least one) reading from `assets`.
    pub fn new(voices: usize, assets: Arc<AssetArena<WaveformAsset>>) -> Self {
        Self {
            channels: (0..voices.max(1)).map(|_| PlaybackChannel::new()).collect(),
            assets,
        }
    }

    /// The default voice.
    pub fn main_channel(&self) -> &PlaybackChannel {
        &self.channels[0]
    }

    /// Returns the channel at `index`, if it exists.
    pub fn channel(&self, index: usize) -> Option<&PlaybackChannel> {
        self.channels.get(index)
    }

    /// All channels, main channel first.
    pub fn channels(&self) -> &[PlaybackChannel] {
        &self.channels
    }

    /// The arena the channels resolve their asset ids against.
    pub fn assets(&self) -> &AssetArena<WaveformAsset> {
        &self.assets
    }

    /// Stops every channel.
    pub fn stop_all(&self) {
        for channel in self.channels.iter() {
            channel.stop();
        }
    }

    /// Number of channels currently producing sound.
    pub fn active_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_playing()).count()
    }
}

impl AudioMixingLane for ChannelMixingLane {
    fn mix(&self, output: &mut [i16]) {
        for channel in self.channels.iter() {
            channel.write_samples(output, &self.assets);
        }
    }
}

impl Lane for ChannelMixingLane {
    fn strategy_name(&self) -> &'static str {
        "ChannelMixing"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Audio
    }
}
