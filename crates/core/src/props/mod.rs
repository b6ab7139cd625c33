//! Decorative models loaded once at startup (logo, rings). They never take
//! part in character transitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    assets::{AnimationClip, AssetLoader, LoadedAsset, PendingLoad, SceneGraph},
    catalog::Transform,
    render::Presentation,
    scene::ClipMixer,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropSpec {
    pub name: String,
    pub asset_path: PathBuf,
    /// One placement per copy of the asset.
    pub instances: Vec<Transform>,
    #[serde(default)]
    pub spin_radians_per_second: f32,
    /// Clip played on a loop on every instance.
    #[serde(default)]
    pub looping_clip: Option<String>,
}

impl PropSpec {
    pub fn builtin() -> Vec<Self> {
        vec![
            Self {
                name: "logo".to_string(),
                asset_path: "sonic/sega_logo/scene.gltf".into(),
                instances: vec![Transform::uniform(0.08, [-5.6, -1.3, 0.0])],
                spin_radians_per_second: 0.72,
                looping_clip: None,
            },
            Self {
                name: "ring".to_string(),
                asset_path: "sonic/ring/scene.gltf".into(),
                instances: vec![
                    Transform::uniform(0.2, [2.5, 3.9, 2.0]),
                    Transform::uniform(0.2, [2.1, 2.0, 2.0]),
                    Transform::uniform(0.2, [2.6, 0.2, 2.0]),
                ],
                spin_radians_per_second: 0.0,
                looping_clip: Some("Action".to_string()),
            },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PropInstance {
    pub scene: SceneGraph,
    pub transform: Transform,
    clip: Option<AnimationClip>,
    mixer: ClipMixer,
}

impl PropInstance {
    pub fn mixer(&self) -> &ClipMixer {
        &self.mixer
    }
}

#[derive(Debug)]
struct PendingProp {
    spec: PropSpec,
    load: PendingLoad,
}

#[derive(Debug)]
struct LoadedProp {
    spin_radians_per_second: f32,
    instances: Vec<PropInstance>,
}

/// Every prop of the showcase, pending or placed.
#[derive(Debug, Default)]
pub struct PropSet {
    pending: Vec<PendingProp>,
    loaded: Vec<LoadedProp>,
}

impl PropSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests every prop asset.
    pub fn request(&mut self, specs: &[PropSpec], loader: &mut impl AssetLoader) {
        for spec in specs {
            self.pending.push(PendingProp {
                spec: spec.clone(),
                load: loader.begin_load(&spec.asset_path),
            });
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn instances(&self) -> impl Iterator<Item = &PropInstance> {
        self.loaded.iter().flat_map(|prop| prop.instances.iter())
    }

    /// Places finished loads, spins and animates the placed instances.
    pub fn tick(&mut self, delta: f32, presentation: &mut impl Presentation) {
        let mut index = 0;
        while index < self.pending.len() {
            match self.pending[index].load.poll() {
                None => index += 1,
                Some(result) => {
                    let PendingProp { spec, .. } = self.pending.swap_remove(index);
                    match result {
                        Ok(asset) => self.place(spec, asset, presentation),
                        Err(err) => tracing::error!(prop = %spec.name, %err, "failed to load prop"),
                    }
                }
            }
        }

        for prop in &mut self.loaded {
            let spin = prop.spin_radians_per_second * delta;
            for instance in &mut prop.instances {
                if spin != 0.0 {
                    instance.transform.rotate_y(spin);
                    presentation.set_transform(instance.scene.id, &instance.transform);
                }
                if let Some(clip) = &instance.clip {
                    instance.mixer.update(delta, std::slice::from_ref(clip));
                }
            }
        }
    }

    fn place(&mut self, spec: PropSpec, asset: LoadedAsset, presentation: &mut impl Presentation) {
        let clip = spec.looping_clip.as_ref().and_then(|name| {
            let clip = asset.clips.iter().find(|clip| &clip.name == name).cloned();
            if clip.is_none() {
                tracing::warn!(prop = %spec.name, clip = %name, "prop clip not found");
            }
            clip
        });

        let instances = spec
            .instances
            .iter()
            .map(|transform| {
                let scene = asset.scene.instance();
                presentation.attach_scene(&scene, transform);
                let mut mixer = ClipMixer::new();
                if let Some(clip) = &clip {
                    mixer.play_from_start(0);
                    presentation.set_animation(scene.id, Some(&clip.name));
                }
                PropInstance {
                    scene,
                    transform: *transform,
                    clip: clip.clone(),
                    mixer,
                }
            })
            .collect();

        tracing::debug!(prop = %spec.name, count = spec.instances.len(), "placed prop");
        self.loaded.push(LoadedProp {
            spin_radians_per_second: spec.spin_radians_per_second,
            instances,
        });
    }
}
