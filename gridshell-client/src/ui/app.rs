//! Main application loop

use std::time::Duration;

use gridshell_protocol::{ClientRequest, HostEvent};
use gridshell_utils::Result;

use crate::connection::Connection;
use crate::input::{InputAction, InputHandler};
use crate::session::{SessionManager, ViewMode};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::{self, VisibleCell};
use crate::ui::terminal::Terminal;

/// Tick rate for the event loop; also the fit pass debounce interval
const TICK_RATE: Duration = Duration::from_millis(50);

pub struct App {
    sessions: SessionManager,
    connection: Connection,
    input: InputHandler,
    events: EventHandler,
    /// Session cells drawn in the most recent frame
    visible: Vec<VisibleCell>,
    /// A state change happened; run the fit pass on the next tick
    fit_pending: bool,
    should_quit: bool,
}

impl App {
    pub fn new(connection: Connection, default_cwd: Option<String>, view_mode: ViewMode, scrollback: usize) -> Self {
        Self {
            sessions: SessionManager::new(default_cwd, view_mode, scrollback),
            connection,
            input: InputHandler::new(),
            events: EventHandler::new(TICK_RATE),
            visible: Vec::new(),
            fit_pending: false,
            should_quit: false,
        }
    }

    /// Run the main loop until quit
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = Terminal::new()?;

        self.events.start_input_polling();

        // The window opens with one live shell
        self.connection.send(self.sessions.request_create())?;

        while !self.should_quit {
            self.draw(&mut terminal)?;

            if let Some(event) = self.events.next().await {
                self.handle_event(event)?;
            }
        }

        self.connection.send(ClientRequest::Shutdown)?;
        self.connection.disconnect().await;
        Ok(())
    }

    fn draw(&mut self, terminal: &mut Terminal) -> Result<()> {
        let sessions = &self.sessions;
        let mut visible = Vec::new();
        terminal.terminal_mut().draw(|frame| {
            visible = render::draw(frame, sessions);
        })?;
        self.visible = visible;
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Key(key) => {
                let action = self.input.handle_key(key);
                self.handle_action(action)?;
            }
            AppEvent::Resize => {
                self.fit_pending = true;
            }
            AppEvent::Tick => {
                self.drain_host_events()?;
                if self.fit_pending {
                    self.fit_pending = false;
                    self.run_fit_pass()?;
                }
            }
        }
        Ok(())
    }

    fn handle_action(&mut self, action: InputAction) -> Result<()> {
        match action {
            InputAction::None => {}
            InputAction::SendToSession(bytes) => {
                if let Some(request) = self.sessions.write_to_active(bytes) {
                    self.connection.send(request)?;
                }
            }
            InputAction::NewSession => {
                // Capacity is the host's call; a refusal comes back as
                // CreateFailed and lands in the status line
                self.connection.send(self.sessions.request_create())?;
            }
            InputAction::CloseSession => match self.sessions.close_active() {
                Some(request) => {
                    self.connection.send(request)?;
                    self.fit_pending = true;
                }
                None => {
                    self.sessions.set_status("Cannot close the last session");
                }
            },
            InputAction::NextSession => {
                self.sessions.next_session();
                self.fit_pending = true;
            }
            InputAction::PrevSession => {
                self.sessions.prev_session();
                self.fit_pending = true;
            }
            InputAction::JumpTo(number) => {
                self.sessions.jump_to(number);
                self.fit_pending = true;
            }
            InputAction::ToggleGrid => {
                self.sessions.toggle_view_mode();
                self.fit_pending = true;
            }
            InputAction::Quit => {
                self.should_quit = true;
            }
        }
        Ok(())
    }

    /// Apply all host events that arrived since the last tick
    fn drain_host_events(&mut self) -> Result<()> {
        while let Some(event) = self.connection.try_recv() {
            if matches!(
                event,
                HostEvent::Created { .. } | HostEvent::Ended { .. }
            ) {
                self.fit_pending = true;
            }
            for request in self.sessions.apply_event(event) {
                self.connection.send(request)?;
            }
        }
        Ok(())
    }

    /// Compare each visible cell with the session's known size and
    /// resize where they differ
    ///
    /// Runs one tick after a layout-changing event, so bursts of
    /// changes collapse into a single resize per session.
    fn run_fit_pass(&mut self) -> Result<()> {
        for cell in self.visible.clone() {
            if let Some(request) = self.sessions.record_resize(cell.id, cell.cols, cell.rows) {
                tracing::debug!(session = %cell.id, cols = cell.cols, rows = cell.rows, "fit resize");
                self.connection.send(request)?;
            }
        }
        Ok(())
    }
}
