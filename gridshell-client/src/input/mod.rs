//! Keyboard input routing
//!
//! Prefix-key state machine in the tmux tradition: `Ctrl-b` arms the
//! prefix, the next key picks a command. Everything else translates to
//! PTY bytes for the active session.

mod keys;

pub use keys::translate_key;

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// How long an armed prefix stays armed
const PREFIX_TIMEOUT_MS: u64 = 500;

/// Input handling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Input goes to the active session
    Normal,
    /// Prefix pressed, waiting for the command key
    PrefixPending,
}

/// Result of processing a key event
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// Nothing to do
    None,
    /// Send bytes to the active session's PTY
    SendToSession(Vec<u8>),
    /// Create a new session
    NewSession,
    /// Close the active session
    CloseSession,
    /// Cycle to the next session
    NextSession,
    /// Cycle to the previous session
    PrevSession,
    /// Jump to a tab by 1-based number
    JumpTo(usize),
    /// Toggle between tabs and grid view
    ToggleGrid,
    /// Quit the client
    Quit,
}

/// Prefix-key state machine
pub struct InputHandler {
    mode: InputMode,
    prefix: KeyEvent,
    prefix_time: Option<Instant>,
    prefix_timeout: Duration,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            mode: InputMode::Normal,
            prefix: KeyEvent::new(KeyCode::Char('b'), KeyModifiers::CONTROL),
            prefix_time: None,
            prefix_timeout: Duration::from_millis(PREFIX_TIMEOUT_MS),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Process a key event and return the resulting action
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        self.check_prefix_timeout();

        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::PrefixPending => self.handle_prefix_key(key),
        }
    }

    fn check_prefix_timeout(&mut self) {
        if self.mode == InputMode::PrefixPending {
            if let Some(time) = self.prefix_time {
                if time.elapsed() > self.prefix_timeout {
                    self.mode = InputMode::Normal;
                    self.prefix_time = None;
                }
            }
        }
    }

    fn is_prefix_key(&self, key: &KeyEvent) -> bool {
        key.code == self.prefix.code && key.modifiers == self.prefix.modifiers
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> InputAction {
        if self.is_prefix_key(&key) {
            self.mode = InputMode::PrefixPending;
            self.prefix_time = Some(Instant::now());
            return InputAction::None;
        }

        match translate_key(&key) {
            Some(bytes) => InputAction::SendToSession(bytes),
            None => InputAction::None,
        }
    }

    fn handle_prefix_key(&mut self, key: KeyEvent) -> InputAction {
        self.mode = InputMode::Normal;
        self.prefix_time = None;

        // Prefix twice sends a literal prefix to the session
        if self.is_prefix_key(&key) {
            if let Some(bytes) = translate_key(&key) {
                return InputAction::SendToSession(bytes);
            }
        }

        match key.code {
            KeyCode::Char('c') => InputAction::NewSession,
            KeyCode::Char('x') => InputAction::CloseSession,
            KeyCode::Char('n') => InputAction::NextSession,
            KeyCode::Char('p') => InputAction::PrevSession,
            KeyCode::Char('g') => InputAction::ToggleGrid,
            KeyCode::Char('d') => InputAction::Quit,
            KeyCode::Char(c @ '1'..='9') => {
                InputAction::JumpTo(c.to_digit(10).unwrap_or(0) as usize)
            }
            _ => InputAction::None,
        }
    }
}
