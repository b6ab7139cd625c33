use crate::transition::Direction;

/// What a key press asks the showcase to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    CycleAnimation,
    /// Rotate around the vertical axis by `sign * rotation_step`.
    Rotate { sign: f32 },
    ChangeCharacter(Direction),
}

/// Maps a key identifier (DOM `KeyboardEvent.key` style, any case) to its
/// action. Unknown keys map to `None`.
pub fn action_for_key(key: &str) -> Option<Action> {
    match key.trim().to_lowercase().as_str() {
        "h" => Some(Action::CycleAnimation),
        "arrowright" => Some(Action::Rotate { sign: -1.0 }),
        "arrowleft" => Some(Action::Rotate { sign: 1.0 }),
        "arrowup" => Some(Action::ChangeCharacter(Direction::Next)),
        "arrowdown" => Some(Action::ChangeCharacter(Direction::Previous)),
        _ => None,
    }
}
