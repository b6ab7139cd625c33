use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use crate::{
    assets::{SceneGraph, SceneId},
    catalog::Transform,
};

/// Surface the showcase drives: overlay toggles, info panel, background and
/// the scene graphs attached to the renderer, with their pose and clip.
pub trait Presentation {
    fn set_overlay_visible(&mut self, visible: bool);
    fn set_title_visible(&mut self, visible: bool);
    fn set_info_visible(&mut self, visible: bool);
    fn set_info_text(&mut self, text: &str);
    fn set_background(&mut self, image: &Path);
    fn attach_scene(&mut self, scene: &SceneGraph, transform: &Transform);
    fn detach_scene(&mut self, scene: SceneId);
    /// New pose for an attached scene.
    fn set_transform(&mut self, scene: SceneId, transform: &Transform);
    /// Clip now playing on an attached scene, `None` when it stops.
    fn set_animation(&mut self, scene: SceneId, clip: Option<&str>);
}

/// One call made against a [`Presentation`].
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationSignal {
    Overlay(bool),
    Title(bool),
    Info(bool),
    InfoText(String),
    Background(PathBuf),
    Attach(SceneId),
    Detach(SceneId),
    Transform(SceneId, Transform),
    Animation(SceneId, Option<String>),
}

/// Presentation that logs every signal and remembers the most recent ones.
#[derive(Debug)]
pub struct ConsolePresentation {
    capacity: usize,
    history: VecDeque<PresentationSignal>,
    attached: Vec<SceneId>,
}

impl Default for ConsolePresentation {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ConsolePresentation {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history: VecDeque::new(),
            attached: Vec::new(),
        }
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &PresentationSignal> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Scenes attached and not yet detached, in attach order.
    pub fn attached(&self) -> &[SceneId] {
        &self.attached
    }

    fn record(&mut self, signal: PresentationSignal) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(signal);
    }
}

impl Presentation for ConsolePresentation {
    fn set_overlay_visible(&mut self, visible: bool) {
        tracing::debug!(visible, "overlay");
        self.record(PresentationSignal::Overlay(visible));
    }

    fn set_title_visible(&mut self, visible: bool) {
        tracing::debug!(visible, "title");
        self.record(PresentationSignal::Title(visible));
    }

    fn set_info_visible(&mut self, visible: bool) {
        tracing::debug!(visible, "character info");
        self.record(PresentationSignal::Info(visible));
    }

    fn set_info_text(&mut self, text: &str) {
        tracing::info!("{text}");
        self.record(PresentationSignal::InfoText(text.to_string()));
    }

    fn set_background(&mut self, image: &Path) {
        tracing::debug!(image = %image.display(), "background");
        self.record(PresentationSignal::Background(image.to_path_buf()));
    }

    fn attach_scene(&mut self, scene: &SceneGraph, transform: &Transform) {
        tracing::debug!(
            scene = %scene.name,
            id = scene.id.get(),
            position = ?transform.position,
            "attach scene"
        );
        self.attached.push(scene.id);
        self.record(PresentationSignal::Attach(scene.id));
    }

    fn detach_scene(&mut self, scene: SceneId) {
        tracing::debug!(id = scene.get(), "detach scene");
        self.attached.retain(|id| *id != scene);
        self.record(PresentationSignal::Detach(scene));
    }

    fn set_transform(&mut self, scene: SceneId, transform: &Transform) {
        tracing::trace!(id = scene.get(), rotation = ?transform.rotation, "transform");
        self.record(PresentationSignal::Transform(scene, *transform));
    }

    fn set_animation(&mut self, scene: SceneId, clip: Option<&str>) {
        tracing::debug!(id = scene.get(), clip, "animation");
        self.record(PresentationSignal::Animation(scene, clip.map(str::to_string)));
    }
}
