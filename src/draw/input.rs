#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Z,
    Y,
    Escape,
    Space,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn press(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self {
            key,
            modifiers,
            pressed: true,
        }
    }

    pub fn release(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
            pressed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Undo,
    Redo,
    RequestExit,
    BeginPan,
    EndPan,
}

const CTRL_ONLY: KeyModifiers = KeyModifiers {
    ctrl: true,
    shift: false,
};

pub fn command_for_key(event: KeyEvent) -> Option<InputCommand> {
    if !event.pressed {
        return matches!(event.key, KeyCode::Space).then_some(InputCommand::EndPan);
    }

    match (event.key, event.modifiers) {
        (KeyCode::Escape, _) => Some(InputCommand::RequestExit),
        (KeyCode::Space, _) => Some(InputCommand::BeginPan),
        (KeyCode::Z, CTRL_ONLY) => Some(InputCommand::Undo),
        (KeyCode::Y, CTRL_ONLY) => Some(InputCommand::Redo),
        _ => None,
    }
}
