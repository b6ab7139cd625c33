use std::{collections::HashMap, fmt, time::Duration};

use crate::{CharacterKey, Result, ShowcaseError};

/// A looping background track owned by the audio runtime.
pub trait Track {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    /// Moves the playhead back to the start without changing play state.
    fn rewind(&mut self) -> Result<()>;
    fn is_playing(&self) -> bool;
    /// Advances any locally tracked playback position.
    fn advance(&mut self, _delta: Duration) {}
}

/// Track that keeps time without producing sound. Used when audio is muted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SilentTrack {
    playing: bool,
    position: Duration,
}

impl SilentTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Duration {
        self.position
    }
}

impl Track for SilentTrack {
    fn play(&mut self) -> Result<()> {
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.playing = false;
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = Duration::ZERO;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn advance(&mut self, delta: Duration) {
        if self.playing {
            self.position = self.position.saturating_add(delta);
        }
    }
}

/// Latch that stays closed until the first user interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionGate {
    open: bool,
}

impl InteractionGate {
    pub fn is_open(self) -> bool {
        self.open
    }

    /// Opens the gate. Returns `true` only for the call that opened it.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.open, true)
    }
}

/// One looping track per character, at most one of them audible.
pub struct AudioTrackManager<T> {
    tracks: HashMap<CharacterKey, T>,
    current: Option<CharacterKey>,
    gate: InteractionGate,
}

impl<T: Track> AudioTrackManager<T> {
    pub fn new(tracks: impl IntoIterator<Item = (CharacterKey, T)>) -> Self {
        Self {
            tracks: tracks.into_iter().collect(),
            current: None,
            gate: InteractionGate::default(),
        }
    }

    pub fn current(&self) -> Option<&CharacterKey> {
        self.current.as_ref()
    }

    pub fn gate(&self) -> InteractionGate {
        self.gate
    }

    pub fn track(&self, key: &CharacterKey) -> Option<&T> {
        self.tracks.get(key)
    }

    /// Keys whose track is currently playing.
    pub fn playing(&self) -> impl Iterator<Item = &CharacterKey> {
        self.tracks
            .iter()
            .filter(|(_, track)| track.is_playing())
            .map(|(key, _)| key)
    }

    /// Selects `key`, then stops and rewinds the previous track. The new
    /// track only starts if the interaction gate is open; otherwise it
    /// starts when [`AudioTrackManager::open_gate`] is called. A previous
    /// track that fails to stop is logged and does not block the switch.
    pub fn play_track_for(&mut self, key: &CharacterKey) -> Result<()> {
        if !self.tracks.contains_key(key) {
            return Err(ShowcaseError::UnknownCharacter(key.to_string()));
        }

        if let Some(previous) = self.current.replace(key.clone()) {
            if let Some(track) = self.tracks.get_mut(&previous) {
                if let Err(err) = stop(track) {
                    tracing::warn!(%err, character = %previous, "could not stop previous track");
                }
            }
        }

        if self.gate.is_open() {
            self.start_current()?;
        } else {
            tracing::debug!(%key, "audio gate closed, deferring playback");
        }
        Ok(())
    }

    /// Opens the interaction gate and starts the selected track. Returns
    /// `false` when the gate was already open.
    pub fn open_gate(&mut self) -> Result<bool> {
        if !self.gate.open() {
            return Ok(false);
        }
        tracing::info!("first interaction received, enabling audio");
        self.start_current()?;
        Ok(true)
    }

    /// Feeds elapsed frame time to every track.
    pub fn advance(&mut self, delta: Duration) {
        for track in self.tracks.values_mut() {
            track.advance(delta);
        }
    }

    fn start_current(&mut self) -> Result<()> {
        let Some(key) = &self.current else {
            return Ok(());
        };
        if let Some(track) = self.tracks.get_mut(key) {
            tracing::info!(%key, "playing track");
            track.play()?;
        }
        Ok(())
    }
}

fn stop(track: &mut impl Track) -> Result<()> {
    track.pause()?;
    track.rewind()
}

impl<T> fmt::Debug for AudioTrackManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioTrackManager")
            .field("tracks", &self.tracks.len())
            .field("current", &self.current)
            .field("gate", &self.gate)
            .finish()
    }
}
