//! The fixed set of selectable characters.
//!
//! Each character is one immutable [`CharacterEntry`] keyed by a
//! [`CharacterKey`]. The key doubles as the background and audio identifier,
//! so the catalog is the only place the set of characters is spelled out.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{props::PropSpec, Result, ShowcaseError};

/// Stable identifier of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterKey(String);

impl CharacterKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CharacterKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Scale, position and Euler rotation (radians) applied to a loaded scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub scale: [f32; 3],
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl Transform {
    pub fn uniform(scale: f32, position: [f32; 3]) -> Self {
        Self {
            scale: [scale; 3],
            position,
            rotation: [0.0; 3],
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.rotation[1] = yaw;
        self
    }

    /// Rotates around the vertical axis.
    pub fn rotate_y(&mut self, radians: f32) {
        self.rotation[1] += radians;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::uniform(1.0, [0.0; 3])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub key: CharacterKey,
    pub display_name: String,
    pub asset_path: PathBuf,
    #[serde(default)]
    pub transform: Transform,
    /// Clip names that may play on this character, in cycling order.
    #[serde(default)]
    pub allowed_animations: Vec<String>,
    pub audio_path: PathBuf,
    pub background_path: PathBuf,
    #[serde(default)]
    pub info_text: String,
}

/// On-disk layout of a showcase manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcaseManifest {
    pub characters: Vec<CharacterEntry>,
    #[serde(default)]
    pub props: Vec<PropSpec>,
}

impl ShowcaseManifest {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The Sonic characters and props shipped with the showcase.
    pub fn builtin() -> Self {
        Self {
            characters: builtin_characters(),
            props: PropSpec::builtin(),
        }
    }

    /// Splits the manifest into a validated catalog and its props.
    pub fn into_parts(self) -> Result<(Catalog, Vec<PropSpec>)> {
        Ok((Catalog::new(self.characters)?, self.props))
    }
}

/// Validated, non-empty list of characters with unique keys.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CharacterEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CharacterEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ShowcaseError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(&entry.key) {
                return Err(ShowcaseError::DuplicateCharacter(entry.key.to_string()));
            }
        }

        Ok(Self { entries })
    }

    pub fn builtin() -> Self {
        Self {
            entries: builtin_characters(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index` wrapped into the catalog range.
    pub fn entry(&self, index: usize) -> &CharacterEntry {
        &self.entries[index % self.entries.len()]
    }

    pub fn entries(&self) -> &[CharacterEntry] {
        &self.entries
    }

    pub fn position(&self, key: &CharacterKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }
}

fn builtin_characters() -> Vec<CharacterEntry> {
    vec![
        CharacterEntry {
            key: "sonic-lost-world".into(),
            display_name: "Sonic the Hedgehog (Modern)".to_string(),
            asset_path: "sonic/sonic-lost-world/scene.gltf".into(),
            transform: Transform::uniform(1.0, [0.0, -0.5, 0.0]),
            allowed_animations: names(&["Idle", "Up", "Walk", "Jog", "Hurt"]),
            audio_path: "sound/SonicModern.mp3".into(),
            background_path: "img/sonicLostWord.jpg".into(),
            info_text: "The fast blue hedgehog and main hero, always ready for action. \
                        He is brave and confident, uses spins and boost attacks, and keeps \
                        foiling Dr. Eggman's robot armies."
                .to_string(),
        },
        CharacterEntry {
            key: "junio_sonic".into(),
            display_name: "Sonic the Hedgehog (Classic)".to_string(),
            asset_path: "sonic/junio_sonic/scene.gltf".into(),
            transform: Transform::uniform(3.0, [0.0, 0.0, 0.0]),
            allowed_animations: names(&["look", "pose 1", "jogging"]),
            audio_path: "sound/SonicRetro.mp3".into(),
            background_path: "img/junioSonic.jpg".into(),
            info_text: "The original Sonic, loved by retro fans. Fast and optimistic, he \
                        spin-attacks his way through simpler but just as dangerous robots."
                .to_string(),
        },
        CharacterEntry {
            key: "shadow".into(),
            display_name: "Shadow the Hedgehog".to_string(),
            asset_path: "sonic/shadow/scene.gltf".into(),
            transform: Transform::uniform(1.2, [0.0, -0.8, 0.0]),
            allowed_animations: names(&["pose 1", "Animation"]),
            audio_path: "sound/Shadow.mp3".into(),
            background_path: "img/shadow.jpg".into(),
            info_text: "A dark and powerful hedgehog created by Gerald Robotnik as the \
                        ultimate life form. Serious, driven, and a master of Chaos Control."
                .to_string(),
        },
        CharacterEntry {
            key: "metal_sonic".into(),
            display_name: "Metal Sonic".to_string(),
            asset_path: "sonic/metal_sonic/scene.gltf".into(),
            transform: Transform::uniform(0.36, [0.0, 1.8, 0.0]).with_yaw(10.9),
            allowed_animations: names(&["IDLE", "OVA IDLE", "READY TO RACE"]),
            audio_path: "sound/MetalSonic.mp3".into(),
            background_path: "img/metalSonic.jpg".into(),
            info_text: "A robotic copy of Sonic built by Dr. Eggman. Cold and calculating, \
                        it matches Sonic's speed and lives to outrun its rival."
                .to_string(),
        },
    ]
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}
