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

//! A fixed-capacity, append-only storage for loaded assets.

use resonance_core::asset::{Asset, AssetId};
use resonance_core::audio::AudioError;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    OnceLock,
};

/// An arena of write-once slots for a single asset type `A`.
///
/// Every slot is allocated up front, so inserting never reallocates and a
/// reader never races with a resize. Each slot is filled at most once and is
/// never cleared, which means an [`AssetId`] handed out by the arena stays
/// valid for the whole life of the arena.
///
/// Lookups only perform an atomic load, so [`AssetArena::get`] may be called
/// from the audio thread. Insertions are expected on the game thread.
pub struct AssetArena<A: Asset> {
    slots: Box<[OnceLock<A>]>,
    reserved: AtomicUsize,
}

impl<A: Asset> AssetArena<A> {
    /// Creates an arena able to hold `capacity` assets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            reserved: AtomicUsize::new(0),
        }
    }

    /// Stores `asset` in the next free slot and returns its id.
    ///
    /// # Errors
    /// Returns [`AudioError::ArenaFull`] once every slot has been used.
    pub fn insert(&self, asset: A) -> Result<AssetId, AudioError> {
        let capacity = self.slots.len();
        let index = self
            .reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                (next < capacity).then_some(next + 1)
            })
            .map_err(|_| AudioError::ArenaFull { capacity })?;

        // Each index is reserved exactly once, so the slot is still empty.
        if self.slots[index].set(asset).is_err() {
            log::error!("Asset arena slot {index} was filled twice");
        }
        log::trace!("Stored asset in arena slot {index}/{capacity}");

        Ok(AssetId::from_index(index as u32))
    }

    /// Returns the asset stored under `id`, if that slot has been filled.
    pub fn get(&self, id: AssetId) -> Option<&A> {
        self.slots.get(id.index() as usize)?.get()
    }

    /// Checks whether `id` refers to a filled slot.
    pub fn contains(&self, id: AssetId) -> bool {
        self.get(id).is_some()
    }

    /// Number of slots handed out so far.
    pub fn len(&self) -> usize {
        self.reserved.load(Ordering::Acquire)
    }

    /// Returns `true` if nothing has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<A: Asset> std::fmt::Debug for AssetArena<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetArena")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
