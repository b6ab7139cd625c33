//! Core library for the Character Showcase application.
//!
//! A showcase presents a small catalog of 3D characters one at a time. The
//! user steps through them with the arrow keys; each change fades the stage
//! out, swaps the model and its background music, and fades back in. Mesh
//! rendering and audio decoding are left to external runtimes reached through
//! the [`AssetLoader`], [`Track`] and [`Presentation`] traits.

pub mod assets;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod input;
pub mod props;
pub mod render;
pub mod scene;
pub mod showcase;
pub mod timeline;
pub mod transition;

pub use assets::{
    import_gltf, AnimationClip, AssetLoader, GltfLoader, LoadCompleter, LoadedAsset, PendingLoad,
    SceneGraph, SceneId,
};
pub use audio::{AudioTrackManager, InteractionGate, SilentTrack, Track};
pub use catalog::{Catalog, CharacterEntry, CharacterKey, ShowcaseManifest, Transform};
pub use config::{AppConfig, AudioConfig, FrameRate, InputConfig, TransitionConfig};
pub use error::{Result, ShowcaseError};
pub use input::{action_for_key, Action};
pub use props::{PropInstance, PropSet, PropSpec};
pub use render::{ConsolePresentation, Presentation, PresentationSignal};
pub use scene::{filter_clips, ActiveModel, ClipMixer};
pub use showcase::Showcase;
pub use timeline::{clamp_delta, FadeTimer, FrameClock, MAX_TICK_SECONDS};
pub use transition::{Direction, TransitionController, TransitionEvent, TransitionPhase};
