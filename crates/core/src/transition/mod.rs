//! Character transition state machine.
//!
//! A transition runs `Idle -> FadingOut -> Swapping -> FadingIn -> Idle`.
//! Requests that arrive outside `Idle` are dropped. The controller only keeps
//! time and phase; the owner reacts to the [`TransitionEvent`]s it returns.

use crate::{
    assets::{LoadedAsset, PendingLoad},
    config::TransitionConfig,
    timeline::FadeTimer,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Index reached from `current` in a catalog of `len` entries.
    pub fn step(self, current: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let current = current % len;
        match self {
            Direction::Next => (current + 1) % len,
            Direction::Previous => (current + len - 1) % len,
        }
    }
}

#[derive(Debug)]
pub enum TransitionPhase {
    Idle,
    FadingOut {
        target: usize,
        timer: FadeTimer,
    },
    /// Waiting for the asset of `target`. `reveal` is false for the initial
    /// load, which appears without a fade.
    Swapping {
        target: usize,
        load: Option<PendingLoad>,
        reveal: bool,
    },
    FadingIn {
        timer: FadeTimer,
    },
}

impl TransitionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionPhase::Idle => "idle",
            TransitionPhase::FadingOut { .. } => "fading-out",
            TransitionPhase::Swapping { .. } => "swapping",
            TransitionPhase::FadingIn { .. } => "fading-in",
        }
    }
}

/// Something the owner of the controller has to act on.
#[derive(Debug)]
pub enum TransitionEvent {
    /// The screen is dark; switch audio and start loading `target`.
    FadeOutComplete { target: usize },
    /// The load for `target` finished. When `reveal` is set the fade-in has
    /// already begun.
    LoadFinished {
        target: usize,
        result: Result<LoadedAsset>,
        reveal: bool,
    },
    /// Back to idle.
    Settled,
}

#[derive(Debug)]
pub struct TransitionController {
    config: TransitionConfig,
    current_index: usize,
    phase: TransitionPhase,
}

impl TransitionController {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            current_index: 0,
            phase: TransitionPhase::Idle,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn phase(&self) -> &TransitionPhase {
        &self.phase
    }

    pub fn in_progress(&self) -> bool {
        !matches!(self.phase, TransitionPhase::Idle)
    }

    /// Starts a transition toward the neighbouring index. Returns the target,
    /// or `None` if a transition is already running.
    pub fn request_index_change(&mut self, direction: Direction, len: usize) -> Option<usize> {
        if self.in_progress() {
            tracing::debug!(phase = self.phase.name(), ?direction, "transition busy, request dropped");
            return None;
        }

        let target = direction.step(self.current_index, len);
        self.current_index = target;
        self.phase = TransitionPhase::FadingOut {
            target,
            timer: FadeTimer::new(self.config.fade_out_seconds),
        };
        Some(target)
    }

    /// Jumps straight to `Swapping` for `index` without fading. Used for the
    /// very first character.
    pub fn begin_initial_load(&mut self, index: usize, load: PendingLoad) -> bool {
        if self.in_progress() {
            return false;
        }
        self.current_index = index;
        self.phase = TransitionPhase::Swapping {
            target: index,
            load: Some(load),
            reveal: false,
        };
        true
    }

    /// Hands the controller the load started after a fade-out.
    pub fn attach_load(&mut self, pending: PendingLoad) {
        if let TransitionPhase::Swapping { load, .. } = &mut self.phase {
            if load.is_none() {
                tracing::debug!(path = %pending.path().display(), "waiting for asset load");
                *load = Some(pending);
                return;
            }
        }
        tracing::warn!(phase = self.phase.name(), "asset load attached outside swap phase");
    }

    /// Points the selection back at `index`, used when a load fails.
    pub fn restore_index(&mut self, index: usize) {
        self.current_index = index;
    }

    /// Advances timers and polls the pending load.
    pub fn tick(&mut self, delta: f32) -> Option<TransitionEvent> {
        match &mut self.phase {
            TransitionPhase::Idle => None,
            TransitionPhase::FadingOut { target, timer } => {
                if !timer.advance(delta) {
                    return None;
                }
                let target = *target;
                self.phase = TransitionPhase::Swapping {
                    target,
                    load: None,
                    reveal: true,
                };
                Some(TransitionEvent::FadeOutComplete { target })
            }
            TransitionPhase::Swapping {
                target,
                load,
                reveal,
            } => {
                let result = load.as_mut()?.poll()?;
                let (target, reveal) = (*target, *reveal);
                self.phase = if reveal {
                    TransitionPhase::FadingIn {
                        timer: FadeTimer::new(self.config.fade_in_seconds),
                    }
                } else {
                    TransitionPhase::Idle
                };
                Some(TransitionEvent::LoadFinished {
                    target,
                    result,
                    reveal,
                })
            }
            TransitionPhase::FadingIn { timer } => {
                if !timer.advance(delta) {
                    return None;
                }
                self.phase = TransitionPhase::Idle;
                Some(TransitionEvent::Settled)
            }
        }
    }
}
