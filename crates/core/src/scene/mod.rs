use crate::{
    assets::{AnimationClip, LoadedAsset, SceneGraph},
    catalog::{CharacterEntry, Transform},
};

/// Playback state for the clips of one scene. At most one clip plays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipMixer {
    playing: Option<usize>,
    time_seconds: f32,
}

impl ClipMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(&self) -> Option<usize> {
        self.playing
    }

    pub fn time_seconds(&self) -> f32 {
        self.time_seconds
    }

    /// Starts `index` from its first frame, replacing whatever was playing.
    pub fn play_from_start(&mut self, index: usize) {
        self.playing = Some(index);
        self.time_seconds = 0.0;
    }

    pub fn stop(&mut self) {
        self.playing = None;
        self.time_seconds = 0.0;
    }

    /// Advances the playing clip, looping at its duration.
    pub fn update(&mut self, delta: f32, clips: &[AnimationClip]) {
        let Some(clip) = self.playing.and_then(|index| clips.get(index)) else {
            return;
        };
        self.time_seconds += delta.max(0.0);
        if clip.duration_seconds > 0.0 {
            self.time_seconds %= clip.duration_seconds;
        }
    }
}

/// Keeps the clips named in `allowed`, in that order. Names the asset does
/// not carry are skipped.
pub fn filter_clips(available: &[AnimationClip], allowed: &[String]) -> Vec<AnimationClip> {
    allowed
        .iter()
        .filter_map(|name| {
            let clip = available.iter().find(|clip| &clip.name == name);
            if clip.is_none() {
                tracing::warn!(clip = %name, "allowed animation missing from asset");
            }
            clip.cloned()
        })
        .collect()
}

/// The character currently on stage.
#[derive(Debug, Clone)]
pub struct ActiveModel {
    pub index: usize,
    pub scene: SceneGraph,
    pub transform: Transform,
    clips: Vec<AnimationClip>,
    mixer: ClipMixer,
    current_animation: usize,
}

impl ActiveModel {
    /// Builds the model for catalog slot `index` and starts its first clip.
    pub fn install(index: usize, entry: &CharacterEntry, asset: LoadedAsset) -> Self {
        let clips = filter_clips(&asset.clips, &entry.allowed_animations);
        let mut mixer = ClipMixer::new();
        if !clips.is_empty() {
            mixer.play_from_start(0);
        }

        Self {
            index,
            scene: asset.scene,
            transform: entry.transform,
            clips,
            mixer,
            current_animation: 0,
        }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn current_animation(&self) -> usize {
        self.current_animation
    }

    pub fn mixer(&self) -> &ClipMixer {
        &self.mixer
    }

    pub fn playing_clip(&self) -> Option<&AnimationClip> {
        self.mixer.playing().and_then(|index| self.clips.get(index))
    }

    /// Stops the current clip and starts the next one from the beginning,
    /// wrapping at the end of the list. Returns the new clip, or `None` if the
    /// model has no clips.
    pub fn advance_animation(&mut self) -> Option<&AnimationClip> {
        if self.clips.is_empty() {
            return None;
        }

        self.mixer.stop();
        let next = (self.current_animation + 1) % self.clips.len();
        self.mixer.play_from_start(next);
        self.current_animation = next;

        let clip = &self.clips[next];
        tracing::info!(clip = %clip.name, "current animation");
        Some(clip)
    }

    pub fn rotate_y(&mut self, radians: f32) {
        self.transform.rotate_y(radians);
    }

    pub fn update(&mut self, delta: f32) {
        self.mixer.update(delta, &self.clips);
    }
}
