use std::time::Duration;

use crate::{
    assets::{AssetLoader, LoadedAsset},
    audio::{AudioTrackManager, Track},
    catalog::{Catalog, CharacterEntry},
    config::AppConfig,
    input::{action_for_key, Action},
    props::{PropSet, PropSpec},
    render::Presentation,
    scene::ActiveModel,
    timeline::clamp_delta,
    transition::{Direction, TransitionController, TransitionEvent, TransitionPhase},
    Result,
};

/// Owns every piece of mutable showcase state: the transition controller,
/// the character on stage, the audio tracks and the props.
pub struct Showcase<L, T, P> {
    catalog: Catalog,
    config: AppConfig,
    loader: L,
    audio: AudioTrackManager<T>,
    presentation: P,
    transition: TransitionController,
    active: Option<ActiveModel>,
    props: PropSet,
    prop_specs: Vec<PropSpec>,
    started: bool,
}

impl<L, T, P> Showcase<L, T, P>
where
    L: AssetLoader,
    T: Track,
    P: Presentation,
{
    /// Builds a showcase with one track per catalog entry, created by
    /// `make_track`.
    pub fn new(
        catalog: Catalog,
        prop_specs: Vec<PropSpec>,
        config: AppConfig,
        loader: L,
        presentation: P,
        mut make_track: impl FnMut(&CharacterEntry) -> Result<T>,
    ) -> Result<Self> {
        let tracks = catalog
            .entries()
            .iter()
            .map(|entry| make_track(entry).map(|track| (entry.key.clone(), track)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            transition: TransitionController::new(config.transition.clone()),
            audio: AudioTrackManager::new(tracks),
            catalog,
            config,
            loader,
            presentation,
            active: None,
            props: PropSet::new(),
            prop_specs,
            started: false,
        })
    }

    /// Requests the props and the first character. The first character
    /// appears without a fade; its track waits for the first interaction.
    /// A failed start leaves the showcase unstarted, so it can be retried.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }

        let entry = self.catalog.entry(0);
        self.audio.play_track_for(&entry.key)?;
        let pending = self.loader.begin_load(&entry.asset_path);
        if !self.transition.begin_initial_load(0, pending) {
            tracing::error!(
                phase = self.transition.phase().name(),
                "first character requested while a transition is running"
            );
            return Ok(());
        }
        tracing::info!(character = %entry.display_name, "loading first character");

        self.presentation.set_overlay_visible(false);
        self.presentation.set_title_visible(true);
        self.props.request(&self.prop_specs, &mut self.loader);
        self.started = true;
        Ok(())
    }

    /// Handles a key press: opens the audio gate, then performs the mapped
    /// action. Returns the action, if the key mapped to one.
    pub fn handle_key(&mut self, key: &str) -> Option<Action> {
        self.on_interaction();

        let action = action_for_key(key)?;
        match action {
            Action::CycleAnimation => {
                self.advance_animation();
            }
            Action::Rotate { sign } => {
                self.rotate_active(sign * self.config.input.rotation_step);
            }
            Action::ChangeCharacter(direction) => {
                self.request_index_change(direction);
            }
        }
        Some(action)
    }

    /// Mouse click. Only matters as a first interaction.
    pub fn on_click(&mut self) {
        self.on_interaction();
    }

    /// Starts a transition to the neighbouring character. Returns `false`
    /// before [`Showcase::start`] or while another transition is running.
    pub fn request_index_change(&mut self, direction: Direction) -> bool {
        if !self.started {
            tracing::debug!(?direction, "showcase not started, request dropped");
            return false;
        }
        let Some(target) = self
            .transition
            .request_index_change(direction, self.catalog.len())
        else {
            return false;
        };

        tracing::info!(
            target,
            character = %self.catalog.entry(target).display_name,
            "changing character"
        );
        self.presentation.set_overlay_visible(true);
        self.presentation.set_info_visible(false);
        self.presentation.set_title_visible(false);
        true
    }

    /// Plays the next allowed clip on the active model. Returns its name.
    pub fn advance_animation(&mut self) -> Option<&str> {
        let model = self.active.as_mut()?;
        let scene = model.scene.id;
        let clip = model.advance_animation()?;
        self.presentation.set_animation(scene, Some(&clip.name));
        Some(clip.name.as_str())
    }

    /// Rotates the active model around its vertical axis. No-op without one.
    pub fn rotate_active(&mut self, radians: f32) -> bool {
        match self.active.as_mut() {
            Some(model) => {
                model.rotate_y(radians);
                self.presentation.set_transform(model.scene.id, &model.transform);
                true
            }
            None => false,
        }
    }

    /// Advances one frame: audio, animation mixers, props and the transition.
    /// Any delta is accepted; it is clamped to [`crate::MAX_TICK_SECONDS`].
    pub fn tick(&mut self, delta: f32) {
        let delta = clamp_delta(delta);
        self.audio.advance(Duration::from_secs_f32(delta));
        if let Some(model) = self.active.as_mut() {
            model.update(delta);
        }
        self.props.tick(delta, &mut self.presentation);

        // Later steps in the same frame see no extra time, so a load that is
        // already complete is still applied right away.
        let mut step = delta;
        while let Some(event) = self.transition.tick(step) {
            step = 0.0;
            self.handle_transition_event(event);
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn current_index(&self) -> usize {
        self.transition.current_index()
    }

    pub fn in_progress(&self) -> bool {
        self.transition.in_progress()
    }

    pub fn phase(&self) -> &TransitionPhase {
        self.transition.phase()
    }

    pub fn active_model(&self) -> Option<&ActiveModel> {
        self.active.as_ref()
    }

    pub fn audio(&self) -> &AudioTrackManager<T> {
        &self.audio
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    fn on_interaction(&mut self) {
        if let Err(err) = self.audio.open_gate() {
            tracing::error!(%err, "could not start audio");
        }
    }

    fn handle_transition_event(&mut self, event: TransitionEvent) {
        match event {
            TransitionEvent::FadeOutComplete { target } => {
                let entry = self.catalog.entry(target);
                if let Err(err) = self.audio.play_track_for(&entry.key) {
                    tracing::error!(%err, character = %entry.key, "could not switch track");
                }
                let pending = self.loader.begin_load(&entry.asset_path);
                self.transition.attach_load(pending);
            }
            TransitionEvent::LoadFinished {
                target,
                result,
                reveal,
            } => {
                let installed = self.finish_load(target, result);
                if reveal {
                    self.presentation.set_overlay_visible(false);
                    self.presentation.set_title_visible(true);
                    self.presentation.set_info_visible(true);
                } else if installed {
                    self.presentation.set_info_visible(true);
                }
            }
            TransitionEvent::Settled => {
                tracing::debug!(index = self.transition.current_index(), "transition settled");
            }
        }
    }

    /// Installs the loaded model, or keeps the current one on failure.
    /// Returns whether a new model went on stage.
    fn finish_load(&mut self, target: usize, result: Result<LoadedAsset>) -> bool {
        let asset = match result {
            Ok(asset) => asset,
            Err(err) => {
                tracing::error!(%err, target, "failed to load character");
                self.restore_displayed();
                return false;
            }
        };

        let entry = self.catalog.entry(target);
        if let Some(previous) = self.active.take() {
            self.presentation.detach_scene(previous.scene.id);
        }

        let model = ActiveModel::install(target, entry, asset);
        self.presentation.attach_scene(&model.scene, &model.transform);
        if let Some(clip) = model.playing_clip() {
            self.presentation.set_animation(model.scene.id, Some(&clip.name));
        }
        self.presentation.set_background(&entry.background_path);
        self.presentation.set_info_text(&entry.info_text);
        tracing::info!(
            character = %entry.display_name,
            clips = model.clips().len(),
            "character on stage"
        );
        self.active = Some(model);
        true
    }

    /// Points selection and audio back at the character still on stage.
    fn restore_displayed(&mut self) {
        let Some(displayed) = self.active.as_ref().map(|model| model.index) else {
            return;
        };
        if displayed == self.transition.current_index() {
            return;
        }

        self.transition.restore_index(displayed);
        let key = &self.catalog.entry(displayed).key;
        if let Err(err) = self.audio.play_track_for(key) {
            tracing::error!(%err, character = %key, "could not restore track");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        f32::consts::PI,
        io,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::{
        assets::{AnimationClip, LoadCompleter, PendingLoad, SceneGraph},
        audio::SilentTrack,
        render::{ConsolePresentation, PresentationSignal},
        CharacterKey, ShowcaseError,
    };

    /// Loader whose requests are completed by the test.
    #[derive(Default)]
    struct HeldLoader {
        requests: Vec<(PathBuf, LoadCompleter)>,
    }

    impl HeldLoader {
        fn complete(&mut self, path_fragment: &str, result: impl FnOnce(&Path) -> Result<LoadedAsset>) {
            let index = self
                .requests
                .iter()
                .position(|(path, _)| path.to_string_lossy().contains(path_fragment))
                .unwrap_or_else(|| panic!("no request for {path_fragment}"));
            let (path, completer) = self.requests.remove(index);
            completer.complete(result(&path));
        }
    }

    impl AssetLoader for HeldLoader {
        fn begin_load(&mut self, path: &Path) -> PendingLoad {
            let (completer, pending) = PendingLoad::channel(path);
            self.requests.push((path.to_path_buf(), completer));
            pending
        }
    }

    type TestShowcase = Showcase<HeldLoader, SilentTrack, ConsolePresentation>;

    fn model(path: &Path) -> Result<LoadedAsset> {
        Ok(LoadedAsset {
            scene: SceneGraph::new(path.to_string_lossy()),
            clips: ["Idle", "Up", "Walk", "look", "pose 1", "Animation", "IDLE"]
                .iter()
                .map(|name| AnimationClip::new(*name, 1.0))
                .collect(),
        })
    }

    fn broken(path: &Path) -> Result<LoadedAsset> {
        Err(ShowcaseError::load(path, "corrupt buffer"))
    }

    fn showcase() -> TestShowcase {
        Showcase::new(
            Catalog::builtin(),
            Vec::new(),
            AppConfig::default(),
            HeldLoader::default(),
            ConsolePresentation::default(),
            |_| Ok(SilentTrack::new()),
        )
        .unwrap()
    }

    /// Started showcase with the first character on stage.
    fn started() -> TestShowcase {
        let mut showcase = showcase();
        showcase.start().unwrap();
        showcase.loader_mut().complete("sonic-lost-world", model);
        showcase.tick(0.0);
        showcase
    }

    /// Runs the current transition to idle, answering its load with `result`.
    fn finish_transition(showcase: &mut TestShowcase, fragment: &str, result: fn(&Path) -> Result<LoadedAsset>) {
        showcase.tick(0.5);
        showcase.loader_mut().complete(fragment, result);
        showcase.tick(0.0);
        showcase.tick(0.5);
    }

    fn key(name: &str) -> CharacterKey {
        CharacterKey::from(name)
    }

    #[test]
    fn first_character_appears_without_transition() {
        let showcase = started();

        let model = showcase.active_model().unwrap();
        assert_eq!(model.index, 0);
        assert_eq!(model.clips().len(), 3);
        assert!(!showcase.in_progress());
        assert!(showcase
            .presentation()
            .history()
            .any(|signal| signal == &PresentationSignal::Info(true)));
    }

    #[test]
    fn audio_waits_for_first_interaction() {
        let mut showcase = started();
        assert_eq!(showcase.audio().playing().count(), 0);
        assert_eq!(showcase.audio().current(), Some(&key("sonic-lost-world")));

        showcase.on_click();
        let playing: Vec<_> = showcase.audio().playing().cloned().collect();
        assert_eq!(playing, vec![key("sonic-lost-world")]);
    }

    #[test]
    fn key_press_counts_as_interaction() {
        let mut showcase = started();
        assert_eq!(showcase.handle_key("q"), None);
        assert!(showcase.audio().gate().is_open());
        assert_eq!(showcase.audio().playing().count(), 1);
    }

    #[test]
    fn rapid_arrow_up_runs_one_transition() {
        let mut showcase = started();
        for _ in 0..3 {
            showcase.handle_key("ArrowUp");
        }
        assert_eq!(showcase.current_index(), 1);

        finish_transition(&mut showcase, "junio_sonic", model);
        assert!(!showcase.in_progress());
        assert_eq!(showcase.current_index(), 1);
        assert_eq!(showcase.active_model().unwrap().index, 1);
        assert!(showcase.loader_mut().requests.is_empty());
    }

    #[test]
    fn arrow_down_from_first_wraps_to_last() {
        let mut showcase = started();
        showcase.handle_key("ArrowDown");
        finish_transition(&mut showcase, "metal_sonic", model);

        assert_eq!(showcase.current_index(), 3);
        assert_eq!(showcase.audio().current(), Some(&key("metal_sonic")));
    }

    #[test]
    fn swap_happens_between_fades() {
        let mut showcase = started();
        showcase.on_click();
        let first_scene = showcase.active_model().unwrap().scene.id;
        showcase.presentation.clear_history();

        showcase.request_index_change(Direction::Next);
        showcase.tick(0.25);
        assert_eq!(showcase.audio().current(), Some(&key("sonic-lost-world")));
        assert!(showcase.loader_mut().requests.is_empty());

        showcase.tick(0.25);
        assert_eq!(showcase.audio().current(), Some(&key("junio_sonic")));
        assert_eq!(showcase.audio().playing().count(), 1);
        assert_eq!(showcase.loader_mut().requests.len(), 1);
        assert_eq!(showcase.active_model().unwrap().index, 0);

        showcase.loader_mut().complete("junio_sonic", model);
        showcase.tick(0.0);
        showcase.tick(0.5);

        let history: Vec<_> = showcase.presentation().history().cloned().collect();
        let new_scene = showcase.active_model().unwrap().scene.id;
        let entry = showcase.catalog().entry(1).clone();
        assert_eq!(
            history,
            vec![
                PresentationSignal::Overlay(true),
                PresentationSignal::Info(false),
                PresentationSignal::Title(false),
                PresentationSignal::Detach(first_scene),
                PresentationSignal::Attach(new_scene),
                PresentationSignal::Animation(new_scene, Some("look".to_string())),
                PresentationSignal::Background(entry.background_path),
                PresentationSignal::InfoText(entry.info_text),
                PresentationSignal::Overlay(false),
                PresentationSignal::Title(true),
                PresentationSignal::Info(true),
            ]
        );
    }

    #[test]
    fn failed_load_keeps_previous_model() {
        let mut showcase = started();
        showcase.on_click();
        showcase.handle_key("ArrowUp");
        finish_transition(&mut showcase, "junio_sonic", model);
        let displayed = showcase.active_model().unwrap().scene.id;

        showcase.handle_key("ArrowUp");
        assert_eq!(showcase.current_index(), 2);
        finish_transition(&mut showcase, "shadow", broken);

        assert!(!showcase.in_progress());
        assert_eq!(showcase.current_index(), 1);
        let model = showcase.active_model().unwrap();
        assert_eq!(model.index, 1);
        assert_eq!(model.scene.id, displayed);
        assert_eq!(showcase.audio().current(), Some(&key("junio_sonic")));
        assert_eq!(showcase.presentation().attached(), &[displayed]);

        // The next navigation is the retry.
        showcase.handle_key("ArrowUp");
        assert_eq!(showcase.current_index(), 2);
    }

    /// Log sink shared between the subscriber and the test body.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn failed_load_is_logged_as_error() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::ERROR)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut showcase = started();
            showcase.handle_key("ArrowUp");
            finish_transition(&mut showcase, "junio_sonic", model);
            showcase.handle_key("ArrowUp");
            finish_transition(&mut showcase, "shadow", broken);
        });

        let output = logs.contents();
        let line = output
            .lines()
            .find(|line| line.contains("failed to load character"))
            .unwrap_or_else(|| panic!("no load failure logged in:\n{output}"));
        assert!(line.contains("ERROR"));
        assert!(line.contains("target=2"));
        assert!(line.contains("sonic/shadow/scene.gltf"));
        assert!(line.contains("corrupt buffer"));
    }

    #[test]
    fn dropped_load_request_does_not_wedge() {
        let mut showcase = started();
        showcase.handle_key("ArrowUp");
        showcase.tick(0.5);
        showcase.loader_mut().requests.clear();
        showcase.tick(0.0);
        showcase.tick(0.5);

        assert!(!showcase.in_progress());
        assert_eq!(showcase.current_index(), 0);
    }

    #[test]
    fn rotation_keys_turn_active_model() {
        let mut showcase = started();
        showcase.handle_key("ArrowRight");
        showcase.handle_key("ArrowRight");
        showcase.handle_key("ArrowLeft");

        let yaw = showcase.active_model().unwrap().transform.rotation[1];
        assert!((yaw + PI / 8.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_reaches_presentation() {
        let mut showcase = started();
        let scene = showcase.active_model().unwrap().scene.id;
        showcase.presentation.clear_history();

        showcase.handle_key("ArrowLeft");

        let history: Vec<_> = showcase.presentation().history().cloned().collect();
        let [PresentationSignal::Transform(id, transform)] = history.as_slice() else {
            panic!("expected one transform signal, got {history:?}");
        };
        assert_eq!(*id, scene);
        assert!((transform.rotation[1] - PI / 8.0).abs() < 1e-5);
        assert_eq!(transform, &showcase.active_model().unwrap().transform);
    }

    #[test]
    fn clip_change_reaches_presentation() {
        let mut showcase = started();
        let scene = showcase.active_model().unwrap().scene.id;
        showcase.presentation.clear_history();

        showcase.handle_key("h");

        let history: Vec<_> = showcase.presentation().history().cloned().collect();
        assert_eq!(
            history,
            vec![PresentationSignal::Animation(scene, Some("Up".to_string()))]
        );
    }

    #[test]
    fn extreme_deltas_are_clamped() {
        let mut showcase = started();
        showcase.on_click();
        showcase.handle_key("ArrowUp");

        showcase.tick(1e20);
        showcase.tick(f32::INFINITY);
        showcase.tick(f32::NAN);
        showcase.tick(-3.0);
        assert_eq!(showcase.audio().current(), Some(&key("junio_sonic")));

        showcase.loader_mut().complete("junio_sonic", model);
        showcase.tick(f32::INFINITY);
        showcase.tick(f32::INFINITY);
        assert!(!showcase.in_progress());
        assert_eq!(showcase.active_model().unwrap().index, 1);

        let model = showcase.active_model().unwrap();
        assert!(model.mixer().time_seconds().is_finite());
        let track = showcase.audio().track(&key("junio_sonic")).unwrap();
        assert!(track.position() <= std::time::Duration::from_secs(3));
    }

    #[test]
    fn rotation_without_model_is_ignored() {
        let mut showcase = showcase();
        assert!(!showcase.rotate_active(1.0));
        assert_eq!(showcase.handle_key("ArrowLeft"), Some(Action::Rotate { sign: 1.0 }));
        assert!(showcase.active_model().is_none());
    }

    #[test]
    fn h_cycles_allowed_clips() {
        let mut showcase = started();
        assert_eq!(showcase.advance_animation(), Some("Up"));
        showcase.handle_key("H");
        showcase.handle_key("h");

        let model = showcase.active_model().unwrap();
        assert_eq!(model.current_animation(), 0);
        assert_eq!(model.playing_clip().unwrap().name, "Idle");
    }

    #[test]
    fn navigation_before_start_is_ignored() {
        let mut showcase = showcase();
        assert!(!showcase.request_index_change(Direction::Next));
        assert_eq!(showcase.handle_key("ArrowUp"), Some(Action::ChangeCharacter(Direction::Next)));
        assert!(!showcase.in_progress());

        showcase.start().unwrap();
        assert_eq!(showcase.current_index(), 0);
        assert_eq!(showcase.loader_mut().requests.len(), 1);
        showcase.loader_mut().complete("sonic-lost-world", model);
        showcase.tick(0.0);
        assert_eq!(showcase.active_model().unwrap().index, 0);
    }

    #[test]
    fn failed_start_can_be_retried() {
        let mut showcase = showcase();
        showcase.audio = AudioTrackManager::new(Vec::new());

        assert!(showcase.start().is_err());
        assert!(showcase.loader_mut().requests.is_empty());
        assert_eq!(showcase.presentation().history().len(), 0);

        showcase.audio = AudioTrackManager::new(
            showcase
                .catalog()
                .entries()
                .iter()
                .map(|entry| (entry.key.clone(), SilentTrack::new()))
                .collect::<Vec<_>>(),
        );
        showcase.start().unwrap();
        assert_eq!(showcase.loader_mut().requests.len(), 1);
    }

    #[test]
    fn start_is_idempotent() {
        let mut showcase = showcase();
        showcase.start().unwrap();
        showcase.start().unwrap();
        assert_eq!(showcase.loader_mut().requests.len(), 1);
    }
}
