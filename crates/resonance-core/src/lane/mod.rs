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

//! # Lane Abstraction
//!
//! A **Lane** is a reusable, swappable processing strategy owned by an agent.
//! Each lane encapsulates one algorithmic approach to a domain task, such as
//! decoding a waveform container or mixing voices into a device block.
//!
//! The hierarchy has two levels:
//!
//! 1. **`Lane`** (this trait): identity and classification shared by all lanes.
//! 2. **Domain traits** extending it with the actual work, e.g.
//!    `AssetLoaderLane<A>: Lane` and `AudioMixingLane: Lane`.
//!
//! Lanes do not receive a type-erased context here: the mixing lane runs on the
//! audio thread, where building a context map per block would allocate.

use std::fmt;

/// Classification of lane types, used for routing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Audio mixing and voice playback.
    Audio,
    /// Asset loading and decoding.
    Asset,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Audio => write!(f, "Audio"),
            LaneKind::Asset => write!(f, "Asset"),
        }
    }
}

/// The common interface of every lane.
pub trait Lane: Send + Sync {
    /// A short, stable name for the strategy (e.g. `"WaveformLoader"`).
    fn strategy_name(&self) -> &'static str;

    /// The domain this lane belongs to.
    fn lane_kind(&self) -> LaneKind;

    /// A `kind/name` label for logs.
    fn label(&self) -> String {
        format!("{}/{}", self.lane_kind(), self.strategy_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullLane;

    impl Lane for NullLane {
        fn strategy_name(&self) -> &'static str {
            "Null"
        }

        fn lane_kind(&self) -> LaneKind {
            LaneKind::Audio
        }
    }

    #[test]
    fn test_label_combines_kind_and_name() {
        assert_eq!(NullLane.label(), "Audio/Null");
    }
}
