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

//! Provides the foundational traits and primitive types for the asset system.
//!
//! This module has no knowledge of how assets are loaded or stored. It defines:
//! - The [`Asset`] trait: a marker for all types that can be treated as assets.
//! - [`AssetId`]: the stable identifier other systems hold instead of a pointer.

mod id;

pub use id::*;

/// A marker trait for types that can be managed by the asset system.
///
/// The supertraits enforce the guarantees the playback pipeline relies on:
/// - `Send` + `Sync`: a loaded asset is read concurrently by the game thread
///   and the audio device thread.
/// - `'static`: the asset does not borrow anything, so it can live in an
///   arena for the lifetime of its owner.
///
/// # Examples
///
/// ```
/// use resonance_core::asset::Asset;
///
/// struct Impulse {
///     taps: Vec<i16>,
/// }
///
/// impl Asset for Impulse {}
/// ```
pub trait Asset: Send + Sync + 'static {}
