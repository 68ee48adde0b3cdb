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

//! Defines `PlaybackChannel`, one independently controlled voice.

use resonance_core::asset::AssetId;
use resonance_data::assets::{AssetArena, WaveformAsset};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

// State word layout, high to low: generation (12 bits), slot (20 bits), cursor (32 bits).
const SLOT_BITS: u32 = 20;
const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;
const GENERATION_MASK: u64 = (1 << 12) - 1;
const NO_ASSET: u32 = SLOT_MASK as u32;

/// Highest arena slot a channel can address; larger ids are refused by `play`.
pub const MAX_CHANNEL_SLOT: u32 = NO_ASSET - 1;

const fn pack(generation: u32, slot: u32, cursor: u32) -> u64 {
    ((generation as u64 & GENERATION_MASK) << (32 + SLOT_BITS))
        | ((slot as u64 & SLOT_MASK) << 32)
        | cursor as u64
}

const fn unpack(state: u64) -> (u32, u32, u32) {
    (
        ((state >> (32 + SLOT_BITS)) & GENERATION_MASK) as u32,
        ((state >> 32) & SLOT_MASK) as u32,
        state as u32,
    )
}

/// A single voice: which waveform is playing, where, and how.
///
/// Every field is an atomic so the game thread can steer the voice while the
/// audio thread renders it, without either side ever taking a lock. The
/// assigned asset and the cursor share one 64-bit word with a generation
/// counter that every `play` and `stop` bumps. The audio thread publishes its
/// progress with a compare-exchange on that word, so a `play` or `stop` issued
/// mid-block always wins over the block that was in flight, even when it
/// restarts the same asset.
///
/// The channel never owns the waveform it plays. It holds an [`AssetId`] into
/// an [`AssetArena`], so any number of channels can play the same asset.
#[derive(Debug)]
pub struct PlaybackChannel {
    state: AtomicU64,
    looping: AtomicBool,
    paused: AtomicBool,
    volume: AtomicU32,
}

impl Default for PlaybackChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackChannel {
    /// Creates a stopped channel at full volume, not looping, not paused.
    pub fn new() -> Self {
        Self {
            state: AtomicU64::new(pack(0, NO_ASSET, 0)),
            looping: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            volume: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    /// Starts `asset` from its first sample.
    ///
    /// Whatever was playing is dropped immediately; there is no crossfade.
    /// The channel is unpaused, loop and volume settings are kept. Passing
    /// `None` is the same as [`stop`](Self::stop), and so is an id above
    /// [`MAX_CHANNEL_SLOT`].
    pub fn play(&self, asset: Option<AssetId>) {
        let Some(id) = asset else {
            self.stop();
            return;
        };
        if id.index() > MAX_CHANNEL_SLOT {
            log::warn!("{id} is beyond the slots a playback channel can address");
            self.stop();
            return;
        }
        self.paused.store(false, Ordering::Release);
        self.replace_state(id.index());
    }

    /// Clears the assigned asset. Stopping a stopped channel does nothing.
    pub fn stop(&self) {
        self.replace_state(NO_ASSET);
    }

    fn replace_state(&self, slot: u32) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let (generation, _, _) = unpack(state);
                Some(pack(generation.wrapping_add(1), slot, 0))
            });
    }

    /// Pauses or resumes the voice without losing its position.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Returns `true` if the voice is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Chooses whether the voice restarts at the first sample when it reaches the end.
    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Release);
    }

    /// Returns `true` if the voice loops.
    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Acquire)
    }

    /// Sets the gain applied to every sample, clamped into `[0.0, 1.0]`.
    ///
    /// `NaN` is stored as silence.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume.store(volume.to_bits(), Ordering::Release);
    }

    /// The clamped gain.
    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Acquire))
    }

    /// The asset currently assigned, or `None` once stopped.
    pub fn asset(&self) -> Option<AssetId> {
        let (_, slot, _) = unpack(self.state.load(Ordering::Acquire));
        (slot != NO_ASSET).then(|| AssetId::from_index(slot))
    }

    /// Index of the next source sample. Only meaningful while an asset is assigned.
    pub fn position(&self) -> u32 {
        unpack(self.state.load(Ordering::Acquire)).2
    }

    /// Returns `true` if an asset is assigned and the voice is not paused.
    pub fn is_playing(&self) -> bool {
        self.asset().is_some() && !self.is_paused()
    }

    /// Returns `true` if no asset is assigned.
    pub fn is_stopped(&self) -> bool {
        self.asset().is_none()
    }

    /// Renders the voice into an interleaved stereo block.
    ///
    /// Called from the audio thread. Each source sample is scaled by the
    /// volume and written to both the left and right slot of one output pair,
    /// so `output.len()` samples consume `output.len() / 2` source samples.
    ///
    /// - Stopped, paused, or pointing at an unfilled arena slot: nothing is
    ///   written.
    /// - End of the asset while looping: the cursor restarts at 0.
    /// - End of the asset otherwise: the channel stops and the rest of
    ///   `output` is left untouched. The caller is expected to have cleared it.
    ///
    /// Runs in time proportional to `output.len()`, allocates nothing, and
    /// takes no lock.
    pub fn write_samples(&self, output: &mut [i16], assets: &AssetArena<WaveformAsset>) {
        if self.is_paused() {
            return;
        }
        let start = self.state.load(Ordering::Acquire);
        if let Some(end) = self.render(start, output, assets) {
            self.publish(start, end);
        }
    }

    /// Renders from the state word `start` and returns the word to publish,
    /// or `None` if nothing was played.
    fn render(
        &self,
        start: u64,
        output: &mut [i16],
        assets: &AssetArena<WaveformAsset>,
    ) -> Option<u64> {
        let (generation, slot, cursor) = unpack(start);
        if slot == NO_ASSET {
            return None;
        }
        let waveform = assets.get(AssetId::from_index(slot))?;

        let samples = waveform.samples();
        let looping = self.is_looping();
        let volume = self.volume();

        let mut cursor = cursor as usize;
        let mut finished = false;

        for frame in output.chunks_exact_mut(2) {
            if cursor >= samples.len() {
                if looping && !samples.is_empty() {
                    cursor = 0;
                } else {
                    finished = true;
                    break;
                }
            }

            let value = attenuate(samples[cursor], volume);
            frame[0] = value;
            frame[1] = value;
            cursor += 1;
        }

        // Keep `cursor < sample_count` true between blocks.
        if !finished && cursor >= samples.len() {
            if looping && !samples.is_empty() {
                cursor = 0;
            } else {
                finished = true;
            }
        }

        Some(if finished {
            pack(generation, NO_ASSET, 0)
        } else {
            pack(generation, slot, cursor as u32)
        })
    }

    /// Stores `end` unless the game thread called `play` or `stop` since
    /// `start` was read; its state is kept.
    fn publish(&self, start: u64, end: u64) {
        let _ = self
            .state
            .compare_exchange(start, end, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// Scales a sample in floating point and truncates back to 16 bits.
#[inline]
fn attenuate(sample: i16, volume: f32) -> i16 {
    (f32::from(sample) * volume) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::{sync::Arc, thread};

    fn arena_with(samples: Vec<i16>) -> (AssetArena<WaveformAsset>, AssetId) {
        let arena = AssetArena::with_capacity(4);
        let id = arena
            .insert(WaveformAsset::new(44_100, 1, 16, samples))
            .unwrap();
        (arena, id)
    }

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| (i * 10) as i16).collect()
    }

    #[test]
    fn test_defaults() {
        let channel = PlaybackChannel::new();
        assert!(channel.is_stopped());
        assert!(!channel.is_paused());
        assert!(!channel.is_looping());
        assert_relative_eq!(channel.volume(), 1.0);
    }

    #[test]
    fn test_volume_is_clamped() {
        let channel = PlaybackChannel::new();
        let cases = [
            (-1.0, 0.0),
            (-0.001, 0.0),
            (0.0, 0.0),
            (0.25, 0.25),
            (0.5, 0.5),
            (1.0, 1.0),
            (1.0001, 1.0),
            (7.5, 1.0),
            (f32::INFINITY, 1.0),
            (f32::NEG_INFINITY, 0.0),
            (f32::NAN, 0.0),
        ];

        for (input, expected) in cases {
            channel.set_volume(input);
            assert_relative_eq!(channel.volume(), expected);
        }
    }

    #[test]
    fn test_toggles() {
        let channel = PlaybackChannel::new();
        channel.set_paused(true);
        channel.set_looping(true);
        assert!(channel.is_paused());
        assert!(channel.is_looping());
        channel.set_paused(false);
        channel.set_looping(false);
        assert!(!channel.is_paused());
        assert!(!channel.is_looping());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_, id) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        channel.stop();
        assert!(channel.is_stopped());

        channel.play(Some(id));
        channel.stop();
        channel.stop();
        assert!(channel.is_stopped());
    }

    #[test]
    fn test_play_none_stops() {
        let (_, id) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        channel.play(Some(id));
        channel.play(None);
        assert!(channel.is_stopped());
    }

    #[test]
    fn test_play_unpauses_and_keeps_settings() {
        let (_, id) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        channel.set_paused(true);
        channel.set_looping(true);
        channel.set_volume(0.3);

        channel.play(Some(id));

        assert!(channel.is_playing());
        assert!(channel.is_looping());
        assert_relative_eq!(channel.volume(), 0.3);
        assert_eq!(channel.position(), 0);
    }

    #[test]
    fn test_write_without_asset_leaves_buffer() {
        let (arena, _) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        let mut output = [7i16; 8];
        channel.write_samples(&mut output, &arena);
        assert_eq!(output, [7; 8]);
    }

    #[test]
    fn test_write_while_paused_leaves_buffer() {
        let (arena, id) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        channel.play(Some(id));
        channel.set_paused(true);

        let mut output = [7i16; 8];
        channel.write_samples(&mut output, &arena);

        assert_eq!(output, [7; 8]);
        assert_eq!(channel.position(), 0);
    }

    #[test]
    fn test_write_with_unfilled_slot_leaves_buffer() {
        let (arena, _) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        channel.play(Some(AssetId::from_index(3)));

        let mut output = [7i16; 4];
        channel.write_samples(&mut output, &arena);
        assert_eq!(output, [7; 4]);
        assert_eq!(channel.asset(), Some(AssetId::from_index(3)));
    }

    #[test]
    fn test_full_volume_duplicates_source() {
        let source = vec![100, -200, 300, i16::MIN, i16::MAX, -1];
        let (arena, id) = arena_with(source.clone());
        let channel = PlaybackChannel::new();
        channel.play(Some(id));

        let mut output = [0i16; 8];
        channel.write_samples(&mut output, &arena);

        assert_eq!(output, [100, 100, -200, -200, 300, 300, i16::MIN, i16::MIN]);
        assert_eq!(channel.position(), 4);
        assert!(channel.is_playing());
    }

    #[test]
    fn test_zero_volume_writes_silence() {
        let (arena, id) = arena_with(vec![i16::MAX; 16]);
        let channel = PlaybackChannel::new();
        channel.set_volume(0.0);
        channel.play(Some(id));

        let mut output = [9i16; 16];
        channel.write_samples(&mut output, &arena);
        assert!(output.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_attenuation_truncates_toward_zero() {
        let (arena, id) = arena_with(vec![3, -3, 101]);
        let channel = PlaybackChannel::new();
        channel.set_volume(0.5);
        channel.play(Some(id));

        let mut output = [0i16; 6];
        channel.write_samples(&mut output, &arena);
        assert_eq!(output, [1, 1, -1, -1, 50, 50]);
    }

    #[test]
    fn test_non_looping_stops_at_end() {
        let (arena, id) = arena_with(vec![1, 2, 3]);
        let channel = PlaybackChannel::new();
        channel.play(Some(id));

        let mut output = [-5i16; 10];
        channel.write_samples(&mut output, &arena);

        assert_eq!(output, [1, 1, 2, 2, 3, 3, -5, -5, -5, -5]);
        assert!(channel.is_stopped());

        let mut next = [-5i16; 4];
        channel.write_samples(&mut next, &arena);
        assert_eq!(next, [-5; 4], "a stopped channel must not write");
    }

    #[test]
    fn test_non_looping_stops_when_block_ends_on_last_sample() {
        let (arena, id) = arena_with(vec![1, 2]);
        let channel = PlaybackChannel::new();
        channel.play(Some(id));

        let mut output = [0i16; 4];
        channel.write_samples(&mut output, &arena);

        assert_eq!(output, [1, 1, 2, 2]);
        assert!(channel.is_stopped());
    }

    #[test]
    fn test_looping_wraps_without_stopping() {
        let (arena, id) = arena_with(vec![1, 2, 3]);
        let channel = PlaybackChannel::new();
        channel.set_looping(true);
        channel.play(Some(id));

        for _ in 0..100 {
            let mut output = [0i16; 10];
            channel.write_samples(&mut output, &arena);
            assert!(channel.is_playing());
            assert!(channel.position() < 3);
        }

        channel.play(Some(id));
        let mut output = [0i16; 14];
        channel.write_samples(&mut output, &arena);
        assert_eq!(output, [1, 1, 2, 2, 3, 3, 1, 1, 2, 2, 3, 3, 1, 1]);
        assert_eq!(channel.position(), 1);
    }

    #[test]
    fn test_looping_empty_asset_stops() {
        let (arena, id) = arena_with(Vec::new());
        let channel = PlaybackChannel::new();
        channel.set_looping(true);
        channel.play(Some(id));

        let mut output = [4i16; 4];
        channel.write_samples(&mut output, &arena);

        assert_eq!(output, [4; 4]);
        assert!(channel.is_stopped());
    }

    #[test]
    fn test_odd_trailing_slot_is_not_written() {
        let (arena, id) = arena_with(vec![8, 9]);
        let channel = PlaybackChannel::new();
        channel.set_looping(true);
        channel.play(Some(id));

        let mut output = [0i16; 5];
        channel.write_samples(&mut output, &arena);
        assert_eq!(output, [8, 8, 9, 9, 0]);
    }

    fn loop_over_four_device_blocks(source_len: usize) -> u32 {
        // One block is 4410 stereo frames, a tenth of a second at 44.1 kHz.
        const FRAMES: usize = 4_410;

        let (arena, id) = arena_with(ramp(source_len));
        let channel = PlaybackChannel::new();
        channel.set_looping(true);
        channel.set_volume(0.5);
        channel.play(Some(id));

        for block in 0..4 {
            let mut output = vec![0i16; FRAMES * 2];
            channel.write_samples(&mut output, &arena);

            for (k, frame) in output.chunks_exact(2).enumerate() {
                let expected = (((block * FRAMES + k) % source_len) * 5) as i16;
                assert_eq!(frame, [expected, expected], "block {block}, frame {k}");
            }
            assert!(!channel.is_stopped());
        }
        channel.position()
    }

    #[test]
    fn test_looping_source_over_four_device_blocks() {
        assert_eq!(loop_over_four_device_blocks(3_000), 2_640);
        assert_eq!(loop_over_four_device_blocks(2_205), 0);
        assert_eq!(loop_over_four_device_blocks(1_000), 640);
    }

    #[test]
    fn test_play_replaces_current_asset() {
        let arena = AssetArena::with_capacity(2);
        let first = arena
            .insert(WaveformAsset::new(44_100, 1, 16, vec![1; 32]))
            .unwrap();
        let second = arena
            .insert(WaveformAsset::new(44_100, 1, 16, vec![2; 32]))
            .unwrap();

        let channel = PlaybackChannel::new();
        channel.play(Some(first));
        let mut output = [0i16; 8];
        channel.write_samples(&mut output, &arena);
        assert_eq!(channel.position(), 4);

        channel.play(Some(second));
        assert_eq!(channel.asset(), Some(second));
        assert_eq!(channel.position(), 0);

        channel.write_samples(&mut output, &arena);
        assert_eq!(output, [2; 8]);
    }

    #[test]
    fn test_restart_during_block_survives_publish() {
        let (arena, id) = arena_with(ramp(64));
        let channel = PlaybackChannel::new();
        channel.play(Some(id));

        let start = channel.state.load(Ordering::Acquire);
        // Same asset, same cursor: only the generation tells the words apart.
        channel.play(Some(id));
        let mut output = [0i16; 8];
        let end = channel.render(start, &mut output, &arena).unwrap();
        channel.publish(start, end);

        assert_eq!(channel.asset(), Some(id));
        assert_eq!(channel.position(), 0);
    }

    #[test]
    fn test_stop_then_replay_during_block_survives_publish() {
        let (arena, id) = arena_with(ramp(64));
        let channel = PlaybackChannel::new();
        channel.play(Some(id));

        let start = channel.state.load(Ordering::Acquire);
        channel.stop();
        channel.play(Some(id));
        let mut output = [0i16; 8];
        let end = channel.render(start, &mut output, &arena).unwrap();
        channel.publish(start, end);

        assert_eq!(channel.position(), 0);
        assert!(channel.is_playing());
    }

    #[test]
    fn test_generation_wraparound_keeps_playing() {
        let (arena, id) = arena_with(ramp(64));
        let channel = PlaybackChannel::new();
        channel.play(Some(id));
        for _ in 0..5000 {
            channel.stop();
        }
        channel.play(Some(id));

        let mut output = [0i16; 8];
        channel.write_samples(&mut output, &arena);
        assert_eq!(channel.position(), 4);
    }

    #[test]
    fn test_unaddressable_asset_id_stops() {
        let (_arena, id) = arena_with(ramp(4));
        let channel = PlaybackChannel::new();
        channel.play(Some(id));

        channel.play(Some(AssetId::from_index(MAX_CHANNEL_SLOT + 1)));
        assert!(channel.is_stopped());
    }

    #[test]
    fn test_game_thread_and_audio_thread_together() {
        let arena = Arc::new(AssetArena::with_capacity(2));
        let id = arena
            .insert(WaveformAsset::new(44_100, 1, 16, ramp(500)))
            .unwrap();
        let channel = Arc::new(PlaybackChannel::new());
        channel.set_looping(true);
        channel.play(Some(id));

        let audio = {
            let arena = Arc::clone(&arena);
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let mut output = [0i16; 256];
                for _ in 0..2_000 {
                    channel.write_samples(&mut output, &arena);
                }
            })
        };

        for i in 0..2_000 {
            match i % 4 {
                0 => channel.play(Some(id)),
                1 => channel.set_volume((i % 10) as f32 / 10.0),
                2 => channel.set_paused(i % 8 == 2),
                _ => channel.stop(),
            }
        }
        audio.join().unwrap();

        channel.play(Some(id));
        channel.set_paused(false);
        let mut output = [0i16; 4];
        channel.write_samples(&mut output, &arena);
        assert!(channel.is_playing());
        assert!(channel.position() < 500);
    }
}
