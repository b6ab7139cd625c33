//! Asset loader gateway.
//!
//! Loads are asynchronous: [`AssetLoader::begin_load`] hands back a
//! [`PendingLoad`] that the frame loop polls until the result arrives.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, Sender, TryRecvError},
    },
    thread,
};

use serde::{Deserialize, Serialize};

use crate::{Result, ShowcaseError};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded scene graph, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(u64);

impl SceneId {
    pub fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Handle to a scene graph owned by the rendering runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    pub id: SceneId,
    pub name: String,
    pub node_count: usize,
    pub mesh_count: usize,
}

impl SceneGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::next(),
            name: name.into(),
            node_count: 0,
            mesh_count: 0,
        }
    }

    /// Copy of this graph under a fresh id, for placing one asset several times.
    pub fn instance(&self) -> Self {
        Self {
            id: SceneId::next(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration_seconds: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration_seconds: f32) -> Self {
        Self {
            name: name.into(),
            duration_seconds,
        }
    }
}

/// Result of a successful load: the scene plus every clip the file carries.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub scene: SceneGraph,
    pub clips: Vec<AnimationClip>,
}

/// Gateway to the external asset runtime.
pub trait AssetLoader {
    fn begin_load(&mut self, path: &Path) -> PendingLoad;
}

/// Receiving half of an in-flight load.
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    receiver: Receiver<Result<LoadedAsset>>,
}

/// Sending half of an in-flight load. Dropping it without calling
/// [`LoadCompleter::complete`] fails the load.
#[derive(Debug)]
pub struct LoadCompleter {
    sender: Sender<Result<LoadedAsset>>,
}

impl LoadCompleter {
    pub fn complete(self, result: Result<LoadedAsset>) {
        // The receiver may already be gone; nothing is waiting on the result then.
        let _ = self.sender.send(result);
    }
}

impl PendingLoad {
    pub fn channel(path: impl Into<PathBuf>) -> (LoadCompleter, PendingLoad) {
        let (sender, receiver) = mpsc::channel();
        (
            LoadCompleter { sender },
            PendingLoad {
                path: path.into(),
                receiver,
            },
        )
    }

    /// A load whose result is already known.
    pub fn ready(path: impl Into<PathBuf>, result: Result<LoadedAsset>) -> Self {
        let (completer, pending) = Self::channel(path);
        completer.complete(result);
        pending
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the result once it is available. A dropped completer is
    /// reported as a load failure so callers always observe an outcome.
    pub fn poll(&mut self) -> Option<Result<LoadedAsset>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ShowcaseError::load(
                &self.path,
                "loader dropped the request",
            ))),
        }
    }
}

/// Loads glTF files on a worker thread, resolving paths against `root`.
#[derive(Debug, Clone, Default)]
pub struct GltfLoader {
    root: PathBuf,
}

impl GltfLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for GltfLoader {
    fn begin_load(&mut self, path: &Path) -> PendingLoad {
        let full_path = self.root.join(path);
        let (completer, pending) = PendingLoad::channel(path);
        tracing::debug!(path = %full_path.display(), "loading glTF asset");

        let spawned = thread::Builder::new()
            .name("gltf-loader".to_string())
            .spawn(move || completer.complete(import_gltf(&full_path)));

        if let Err(err) = spawned {
            // The completer moved into the closure and was dropped, so `poll`
            // reports the failure.
            tracing::error!(%err, "could not spawn asset loader thread");
        }

        pending
    }
}

/// Imports a glTF file synchronously and summarises its scene and clips.
pub fn import_gltf(path: &Path) -> Result<LoadedAsset> {
    let (document, buffers, _) =
        gltf::import(path).map_err(|err| ShowcaseError::load(path, err))?;

    let name = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .and_then(|scene| scene.name().map(str::to_string))
        .or_else(|| {
            path.parent()
                .and_then(|dir| dir.file_name())
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "scene".to_string());

    let scene = SceneGraph {
        id: SceneId::next(),
        name,
        node_count: document.nodes().count(),
        mesh_count: document.meshes().count(),
    };

    let clips = document
        .animations()
        .enumerate()
        .map(|(index, animation)| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{index}"));

            let duration_seconds = animation
                .channels()
                .filter_map(|channel| {
                    let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                    reader.read_inputs().and_then(|inputs| inputs.last())
                })
                .fold(0.0_f32, f32::max);

            AnimationClip::new(name, duration_seconds)
        })
        .collect();

    Ok(LoadedAsset { scene, clips })
}
