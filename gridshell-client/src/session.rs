//! Client-side session state
//!
//! Tracks every live session, the active one, and the view mode. State
//! changes that need host cooperation return `ClientRequest` values for
//! the caller to send; local state only changes when the corresponding
//! `HostEvent` arrives. That keeps this module free of I/O and easy to
//! test.

use tui_term::vt100::{Parser, Screen};

use gridshell_protocol::{ClientRequest, HostEvent, SessionId, SessionInfo};

/// How sessions are laid out on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// One session visible, tab bar on top
    Tabs,
    /// All sessions visible in a near-square grid
    Grid,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Tabs => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Tabs,
        }
    }
}

/// One session as the client sees it
pub struct SessionView {
    pub id: SessionId,
    pub serial: u64,
    pub title: String,
    parser: Parser,
    pub cols: u16,
    pub rows: u16,
}

impl SessionView {
    fn new(info: &SessionInfo, scrollback: usize) -> Self {
        Self {
            id: info.id,
            serial: info.serial,
            title: format!("shell {}", info.serial),
            parser: Parser::new(info.rows, info.cols, scrollback),
            cols: info.cols,
            rows: info.rows,
        }
    }

    /// Feed raw PTY output into the emulator
    pub fn process(&mut self, data: &[u8]) {
        self.parser.process(data);
    }

    /// Current screen contents for rendering
    pub fn screen(&self) -> &Screen {
        self.parser.screen()
    }
}

impl std::fmt::Debug for SessionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionView")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .field("size", &(self.cols, self.rows))
            .finish_non_exhaustive()
    }
}

/// All client session state
pub struct SessionManager {
    /// Insertion order is tab order
    sessions: Vec<SessionView>,
    active_id: Option<SessionId>,
    view_mode: ViewMode,
    /// Working directory sent with create requests
    default_cwd: Option<String>,
    /// Scrollback lines per session emulator
    scrollback: usize,
    /// Transient message for the status line
    status_message: Option<String>,
}

impl SessionManager {
    pub fn new(default_cwd: Option<String>, view_mode: ViewMode, scrollback: usize) -> Self {
        Self {
            sessions: Vec::new(),
            active_id: None,
            view_mode,
            default_cwd,
            scrollback,
            status_message: None,
        }
    }

    pub fn sessions(&self) -> &[SessionView] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active_id
    }

    pub fn active(&self) -> Option<&SessionView> {
        self.active_id
            .and_then(|id| self.sessions.iter().find(|s| s.id == id))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_id
            .and_then(|id| self.sessions.iter().position(|s| s.id == id))
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut SessionView> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = self.view_mode.toggled();
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Request a new session
    pub fn request_create(&self) -> ClientRequest {
        ClientRequest::Create {
            cwd: self.default_cwd.clone(),
        }
    }

    /// Close the active session
    ///
    /// Refused when it is the only session; the window always shows at
    /// least one live shell.
    pub fn close_active(&mut self) -> Option<ClientRequest> {
        let id = self.active_id?;
        self.close_session(id)
    }

    /// Close a session by id; no-op for unknown ids or the last session
    pub fn close_session(&mut self, id: SessionId) -> Option<ClientRequest> {
        if self.sessions.len() <= 1 {
            return None;
        }
        let index = self.sessions.iter().position(|s| s.id == id)?;
        self.sessions.remove(index);

        if self.active_id == Some(id) {
            self.activate_neighbor(index);
        }

        Some(ClientRequest::Destroy { id })
    }

    /// Make a session active; unknown ids are ignored
    pub fn set_active(&mut self, id: SessionId) {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active_id = Some(id);
        }
    }

    /// Cycle to the next session in tab order, wrapping
    pub fn next_session(&mut self) {
        self.cycle(1);
    }

    /// Cycle to the previous session in tab order, wrapping
    pub fn prev_session(&mut self) {
        self.cycle(-1);
    }

    fn cycle(&mut self, step: isize) {
        if self.sessions.is_empty() {
            return;
        }
        let len = self.sessions.len() as isize;
        let current = self.active_index().unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.active_id = Some(self.sessions[next].id);
    }

    /// Jump to a 1-based tab number; out-of-range numbers are ignored
    pub fn jump_to(&mut self, number: usize) {
        if number == 0 {
            return;
        }
        if let Some(session) = self.sessions.get(number - 1) {
            self.active_id = Some(session.id);
        }
    }

    /// Build a write request against the active session
    pub fn write_to_active(&self, data: Vec<u8>) -> Option<ClientRequest> {
        let id = self.active_id?;
        Some(ClientRequest::Write { id, data })
    }

    /// Write a command line to the active session and submit it
    pub fn send_command(&self, text: &str) -> Option<ClientRequest> {
        let mut data = text.as_bytes().to_vec();
        data.push(b'\r');
        self.write_to_active(data)
    }

    /// Record a new size for a session after a fit pass
    ///
    /// Resizes the emulator and returns the resize request when the
    /// size actually changed.
    pub fn record_resize(&mut self, id: SessionId, cols: u16, rows: u16) -> Option<ClientRequest> {
        let session = self.get_mut(id)?;
        if (session.cols, session.rows) == (cols, rows) || cols == 0 || rows == 0 {
            return None;
        }
        session.cols = cols;
        session.rows = rows;
        session.parser.set_size(rows, cols);
        Some(ClientRequest::Resize { id, cols, rows })
    }

    /// Apply a host event
    ///
    /// Returns follow-up requests to send (currently only the
    /// replacement create when the last session ends).
    pub fn apply_event(&mut self, event: HostEvent) -> Vec<ClientRequest> {
        match event {
            HostEvent::Created { session } => {
                let view = SessionView::new(&session, self.scrollback);
                self.active_id = Some(view.id);
                self.sessions.push(view);
                self.status_message = None;
                Vec::new()
            }
            HostEvent::CreateFailed { error } => {
                self.status_message = Some(error.to_string());
                Vec::new()
            }
            HostEvent::Output { id, data } => {
                if let Some(session) = self.get_mut(id) {
                    session.process(&data);
                }
                Vec::new()
            }
            HostEvent::Ended { id, exit_code } => self.handle_ended(id, exit_code),
        }
    }

    fn handle_ended(&mut self, id: SessionId, exit_code: i32) -> Vec<ClientRequest> {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            // Already removed locally (close_session); nothing to do
            return Vec::new();
        };

        let session = self.sessions.remove(index);
        tracing::debug!(session = %session.id, exit_code, "session ended");

        if self.active_id == Some(id) {
            self.activate_neighbor(index);
        }

        if self.sessions.is_empty() {
            // The window always shows a live shell; replace the last one
            vec![self.request_create()]
        } else {
            Vec::new()
        }
    }

    /// Select the session that takes over after index `removed` left
    fn activate_neighbor(&mut self, removed: usize) {
        if self.sessions.is_empty() {
            self.active_id = None;
        } else {
            let index = removed % self.sessions.len();
            self.active_id = Some(self.sessions[index].id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridshell_protocol::CreateError;

    fn manager() -> SessionManager {
        SessionManager::new(None, ViewMode::Tabs, 100)
    }

    fn created(serial: u64) -> (SessionId, HostEvent) {
        let id = SessionId::generate();
        let event = HostEvent::Created {
            session: SessionInfo {
                id,
                serial,
                cwd: None,
                cols: 80,
                rows: 24,
            },
        };
        (id, event)
    }

    fn with_sessions(n: u64) -> (SessionManager, Vec<SessionId>) {
        let mut mgr = manager();
        let mut ids = Vec::new();
        for serial in 1..=n {
            let (id, event) = created(serial);
            assert!(mgr.apply_event(event).is_empty());
            ids.push(id);
        }
        (mgr, ids)
    }

    #[test]
    fn test_created_appends_and_activates() {
        let (mgr, ids) = with_sessions(3);
        assert_eq!(mgr.len(), 3);
        assert_eq!(mgr.active_id(), Some(ids[2]));
        assert_eq!(mgr.sessions()[0].title, "shell 1");
        assert_eq!(mgr.sessions()[2].title, "shell 3");
    }

    #[test]
    fn test_close_last_session_refused() {
        let (mut mgr, ids) = with_sessions(1);
        assert!(mgr.close_active().is_none());
        assert!(mgr.close_session(ids[0]).is_none());
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_close_unknown_session_noop() {
        let (mut mgr, _ids) = with_sessions(2);
        assert!(mgr.close_session(SessionId::generate()).is_none());
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_close_active_selects_next() {
        let (mut mgr, ids) = with_sessions(3);
        mgr.set_active(ids[1]);

        let request = mgr.close_active().unwrap();
        assert_eq!(request, ClientRequest::Destroy { id: ids[1] });
        assert_eq!(mgr.len(), 2);
        // The session after the closed one takes over
        assert_eq!(mgr.active_id(), Some(ids[2]));
    }

    #[test]
    fn test_close_last_in_order_wraps_to_first() {
        let (mut mgr, ids) = with_sessions(3);
        mgr.set_active(ids[2]);

        mgr.close_active().unwrap();
        assert_eq!(mgr.active_id(), Some(ids[0]));
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let (mut mgr, ids) = with_sessions(3);
        mgr.set_active(ids[0]);

        mgr.close_session(ids[2]).unwrap();
        assert_eq!(mgr.active_id(), Some(ids[0]));
    }

    #[test]
    fn test_set_active_unknown_noop() {
        let (mut mgr, ids) = with_sessions(2);
        mgr.set_active(SessionId::generate());
        assert_eq!(mgr.active_id(), Some(ids[1]));
    }

    #[test]
    fn test_cycle_wraps_both_directions() {
        let (mut mgr, ids) = with_sessions(3);
        mgr.set_active(ids[2]);

        mgr.next_session();
        assert_eq!(mgr.active_id(), Some(ids[0]));

        mgr.prev_session();
        assert_eq!(mgr.active_id(), Some(ids[2]));

        mgr.prev_session();
        assert_eq!(mgr.active_id(), Some(ids[1]));
    }

    #[test]
    fn test_cycle_empty_noop() {
        let mut mgr = manager();
        mgr.next_session();
        mgr.prev_session();
        assert!(mgr.active_id().is_none());
    }

    #[test]
    fn test_jump_to_tab_number() {
        let (mut mgr, ids) = with_sessions(3);

        mgr.jump_to(1);
        assert_eq!(mgr.active_id(), Some(ids[0]));

        mgr.jump_to(3);
        assert_eq!(mgr.active_id(), Some(ids[2]));

        // Out of range and zero are ignored
        mgr.jump_to(9);
        assert_eq!(mgr.active_id(), Some(ids[2]));
        mgr.jump_to(0);
        assert_eq!(mgr.active_id(), Some(ids[2]));
    }

    #[test]
    fn test_write_routes_to_active() {
        let (mut mgr, ids) = with_sessions(2);
        mgr.set_active(ids[0]);

        let request = mgr.write_to_active(b"ls\r".to_vec()).unwrap();
        assert_eq!(
            request,
            ClientRequest::Write {
                id: ids[0],
                data: b"ls\r".to_vec()
            }
        );
    }

    #[test]
    fn test_send_command_appends_return() {
        let (mgr, ids) = with_sessions(1);
        let request = mgr.send_command("ls -la").unwrap();
        assert_eq!(
            request,
            ClientRequest::Write {
                id: ids[0],
                data: b"ls -la\r".to_vec()
            }
        );
    }

    #[test]
    fn test_write_without_sessions() {
        let mgr = manager();
        assert!(mgr.write_to_active(b"x".to_vec()).is_none());
    }

    #[test]
    fn test_output_feeds_parser() {
        let (mut mgr, ids) = with_sessions(1);
        mgr.apply_event(HostEvent::Output {
            id: ids[0],
            data: b"hello".to_vec(),
        });

        let screen = mgr.sessions()[0].screen();
        let row: String = (0..5)
            .filter_map(|col| screen.cell(0, col))
            .map(|c| c.contents())
            .collect();
        assert_eq!(row, "hello");
    }

    #[test]
    fn test_output_unknown_session_ignored() {
        let (mut mgr, _ids) = with_sessions(1);
        let requests = mgr.apply_event(HostEvent::Output {
            id: SessionId::generate(),
            data: b"noise".to_vec(),
        });
        assert!(requests.is_empty());
    }

    #[test]
    fn test_ended_removes_and_selects_next() {
        let (mut mgr, ids) = with_sessions(3);
        mgr.set_active(ids[1]);

        let requests = mgr.apply_event(HostEvent::Ended {
            id: ids[1],
            exit_code: 0,
        });
        assert!(requests.is_empty());
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.active_id(), Some(ids[2]));
    }

    #[test]
    fn test_last_ended_requests_replacement() {
        let (mut mgr, ids) = with_sessions(1);

        let requests = mgr.apply_event(HostEvent::Ended {
            id: ids[0],
            exit_code: 0,
        });
        assert_eq!(requests, vec![ClientRequest::Create { cwd: None }]);
        assert!(mgr.is_empty());
        assert!(mgr.active_id().is_none());
    }

    #[test]
    fn test_ended_after_close_is_noop() {
        let (mut mgr, ids) = with_sessions(2);
        mgr.set_active(ids[0]);
        mgr.close_active().unwrap();

        // The host confirms with Ended for a session already gone locally
        let requests = mgr.apply_event(HostEvent::Ended {
            id: ids[0],
            exit_code: 0,
        });
        assert!(requests.is_empty());
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_create_failed_sets_status_only() {
        let (mut mgr, ids) = with_sessions(1);

        let requests = mgr.apply_event(HostEvent::CreateFailed {
            error: CreateError::CapacityExceeded { max: 9 },
        });
        assert!(requests.is_empty());
        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.active_id(), Some(ids[0]));
        assert!(mgr.status_message().unwrap().contains('9'));
    }

    #[test]
    fn test_created_clears_status() {
        let mut mgr = manager();
        mgr.set_status("old message");
        let (_, event) = created(1);
        mgr.apply_event(event);
        assert!(mgr.status_message().is_none());
    }

    #[test]
    fn test_record_resize() {
        let (mut mgr, ids) = with_sessions(1);

        let request = mgr.record_resize(ids[0], 120, 40).unwrap();
        assert_eq!(
            request,
            ClientRequest::Resize {
                id: ids[0],
                cols: 120,
                rows: 40
            }
        );

        // Same size again is a no-op
        assert!(mgr.record_resize(ids[0], 120, 40).is_none());
        // Zero-sized cells are ignored
        assert!(mgr.record_resize(ids[0], 0, 40).is_none());
        // Unknown session is ignored
        assert!(mgr.record_resize(SessionId::generate(), 10, 10).is_none());
    }

    #[test]
    fn test_toggle_view_mode() {
        let mut mgr = manager();
        assert_eq!(mgr.view_mode(), ViewMode::Tabs);
        mgr.toggle_view_mode();
        assert_eq!(mgr.view_mode(), ViewMode::Grid);
        mgr.toggle_view_mode();
        assert_eq!(mgr.view_mode(), ViewMode::Tabs);
    }

    #[test]
    fn test_close_active_in_grid_view() {
        use crate::ui::layout::grid_dims;

        let (mut mgr, ids) = with_sessions(3);
        mgr.set_view_mode(ViewMode::Grid);
        assert_eq!(grid_dims(mgr.len()), (2, 2));

        mgr.set_active(ids[1]);
        let request = mgr.close_active().unwrap();
        assert_eq!(request, ClientRequest::Destroy { id: ids[1] });

        // The next session in insertion order takes over and the grid
        // shrinks to one cell per survivor
        assert_eq!(mgr.active_id(), Some(ids[2]));
        assert_eq!(grid_dims(mgr.len()), (2, 1));
    }

    #[test]
    fn test_replacement_becomes_active() {
        let (mut mgr, ids) = with_sessions(1);
        mgr.apply_event(HostEvent::Ended {
            id: ids[0],
            exit_code: 1,
        });

        let (id, event) = created(2);
        mgr.apply_event(event);
        assert_eq!(mgr.active_id(), Some(id));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_request_create_carries_cwd() {
        let mgr = SessionManager::new(Some("/srv/work".into()), ViewMode::Tabs, 100);
        assert_eq!(
            mgr.request_create(),
            ClientRequest::Create {
                cwd: Some("/srv/work".into())
            }
        );
    }
}
