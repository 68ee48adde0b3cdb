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

use std::fmt;

/// A stable handle to an asset stored in an arena.
///
/// An `AssetId` is a plain slot index. It is `Copy` and fits in a single
/// atomic word, which is what lets a playback channel publish "the sound I am
/// playing" to the audio thread without a lock. Arenas never reuse a slot, so
/// an id stays valid for as long as the arena that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u32);

impl AssetId {
    /// Creates an id referring to the given arena slot.
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena slot this id refers to.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trips() {
        let id = AssetId::from_index(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "asset#7");
    }
}
