//! Frame composition
//!
//! Pure drawing over the session state: tab bar, content area (tabs or
//! grid), status line. Returns the inner size of every visible session
//! cell so the app can run the fit pass against what was actually
//! drawn.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};
use tui_term::widget::PseudoTerminal;

use gridshell_protocol::SessionId;

use crate::session::{SessionManager, SessionView, ViewMode};
use crate::ui::layout::grid_cells;

/// A session cell drawn this frame, with its inner size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleCell {
    pub id: SessionId,
    pub cols: u16,
    pub rows: u16,
}

const ACTIVE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Cyan)
    .add_modifier(Modifier::BOLD);

/// Draw a full frame
pub fn draw(frame: &mut Frame, manager: &SessionManager) -> Vec<VisibleCell> {
    let [tab_bar, content, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tab_bar(frame, tab_bar, manager);
    draw_status_line(frame, status, manager);

    match manager.view_mode() {
        ViewMode::Tabs => draw_tabs_content(frame, content, manager),
        ViewMode::Grid => draw_grid_content(frame, content, manager),
    }
}

fn draw_tab_bar(frame: &mut Frame, area: Rect, manager: &SessionManager) {
    let mut spans = Vec::new();
    for (index, session) in manager.sessions().iter().enumerate() {
        let label = format!(" {}:{} ", index + 1, session.title);
        let style = if manager.active_id() == Some(session.id) {
            ACTIVE_STYLE
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_status_line(frame: &mut Frame, area: Rect, manager: &SessionManager) {
    let line = match manager.status_message() {
        Some(message) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "Ctrl-b: c new  x close  n/p cycle  1-9 jump  g grid  d quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_tabs_content(frame: &mut Frame, area: Rect, manager: &SessionManager) -> Vec<VisibleCell> {
    let Some(session) = manager.active() else {
        return Vec::new();
    };
    vec![draw_session(frame, area, session, true)]
}

fn draw_grid_content(frame: &mut Frame, area: Rect, manager: &SessionManager) -> Vec<VisibleCell> {
    let cells = grid_cells(area, manager.len());
    manager
        .sessions()
        .iter()
        .zip(cells)
        .map(|(session, cell)| {
            let active = manager.active_id() == Some(session.id);
            draw_session(frame, cell, session, active)
        })
        .collect()
}

fn draw_session(
    frame: &mut Frame,
    area: Rect,
    session: &SessionView,
    active: bool,
) -> VisibleCell {
    let border_style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::bordered()
        .title(session.title.clone())
        .border_style(border_style);
    let inner = block.inner(area);

    frame.render_widget(PseudoTerminal::new(session.screen()).block(block), area);

    VisibleCell {
        id: session.id,
        cols: inner.width,
        rows: inner.height,
    }
}
