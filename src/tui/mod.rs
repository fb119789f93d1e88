// TUI module for rendering the terminal interface
pub mod colors;
pub mod helpers;
pub mod input;

// Re-exports
pub use colors::*;
pub use helpers::{ListViewport, RowPart};
pub use input::{
    handle_confirm_input, handle_key_event, handle_mouse_event, handle_text_input, KeyAction,
    MouseAction, TextInput,
};

use crate::domain::reorder::DragUpdate;
use crate::domain::SUPPORTED_EXTENSIONS;
use crate::session::{MergePlan, Session, StatusReport};
use helpers::{checkbox, scroll_to_fit, truncate_middle, HANDLE};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::path::Path;
use tracing::debug;

/// UI view state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Main file list
    Browsing,
    /// Help overlay visible
    Help,
    /// Welcome screen shown on first launch
    Welcome,
    /// Asking whether to replace an existing output
    ConfirmOverwrite,
    /// Typing the output file name
    EditingName,
    /// A merge is running
    Merging,
}

/// Front-end state that is not part of the session: where the cursor is,
/// what is scrolled into view and which overlay is open.
#[derive(Debug, Clone)]
pub struct UiState {
    pub view: ViewState,
    pub cursor: usize,
    pub scroll: usize,
    /// Output name while it is being edited
    pub name_buffer: String,
    /// Plan waiting for the overwrite answer
    pub pending_plan: Option<MergePlan>,
    /// Where the file list was drawn last frame, for mouse hit-testing
    pub viewport: ListViewport,
}

impl UiState {
    pub fn new(view: ViewState) -> Self {
        Self {
            view,
            cursor: 0,
            scroll: 0,
            name_buffer: String::new(),
            pending_plan: None,
            viewport: ListViewport::default(),
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self, len: usize) {
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Keeps the cursor on an existing row after the list shrank.
    pub fn clamp_cursor(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Name of the entry under the cursor.
    pub fn current_name(&self, session: &Session) -> Option<String> {
        session
            .registry()
            .get(self.cursor)
            .map(|entry| entry.name.clone())
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(ViewState::Browsing)
    }
}

/// Renders the main screen. Updates the list viewport and scroll offset in
/// `ui` so mouse events can be mapped back to rows.
pub fn render(frame: &mut Frame, session: &Session, ui: &mut UiState) {
    let options_height = if session.registry().has_selection() {
        3
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),              // Directory and filters
            Constraint::Min(0),                 // File list
            Constraint::Length(options_height), // Format and name
            Constraint::Length(1),              // Status
            Constraint::Length(3),              // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], session);
    render_file_list(frame, chunks[1], session, ui);
    if options_height > 0 {
        render_options(frame, chunks[2], session);
    }
    render_status(frame, chunks[3], session.status());
    render_footer(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, session: &Session) {
    let width = usize::from(area.width.saturating_sub(16));
    let directory = match session.source_dir() {
        Some(dir) => Span::styled(
            truncate_middle(&dir.display().to_string(), width),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("No directory", Style::default().fg(TEXT_SECONDARY)),
    };

    let title_line = Line::from(vec![
        Span::styled(
            " Directory: ",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ),
        directory,
    ]);

    let mut chips = vec![Span::styled(" Filters: ", Style::default().fg(TEXT_SECONDARY))];
    for (i, ext) in SUPPORTED_EXTENSIONS.iter().enumerate() {
        let style = if session.filters().contains(*ext) {
            Style::default()
                .fg(ACCENT_SECONDARY)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_SECONDARY)
        };
        chips.push(Span::styled(format!("{} {}", i + 1, ext), style));
        chips.push(Span::raw("  "));
    }

    let header = Paragraph::new(vec![title_line, Line::from(chips)])
        .block(
            Block::default()
                .title(Span::styled(
                    " docmerger ",
                    Style::default()
                        .fg(ACCENT_HIGHLIGHT)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Left);

    frame.render_widget(header, area);
}

fn render_file_list(frame: &mut Frame, area: Rect, session: &Session, ui: &mut UiState) {
    let registry = session.registry();
    let block = Block::default()
        .title(Span::styled(
            format!(
                " Files ({} selected of {}) ",
                registry.selected_count(),
                registry.len()
            ),
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let len = registry.len();
    let height = usize::from(inner.height);
    ui.clamp_cursor(len);
    ui.scroll = scroll_to_fit(ui.scroll, ui.cursor, height).min(len.saturating_sub(height));
    ui.viewport = ListViewport::new(inner, ui.scroll);

    if registry.is_empty() {
        frame.render_widget(render_empty_state_widget(session), inner);
        return;
    }

    // Position of each selected entry in the merge order.
    let mut next = 0;
    let positions: Vec<Option<usize>> = registry
        .entries()
        .iter()
        .map(|entry| {
            entry.selected.then(|| {
                next += 1;
                next
            })
        })
        .collect();

    let dragged = session.reorder().dragged_entry();
    let label_width = usize::from(inner.width)
        .saturating_sub(HANDLE.chars().count() + checkbox(false).len() + 5);

    let lines: Vec<Line> = registry
        .entries()
        .iter()
        .enumerate()
        .skip(ui.scroll)
        .take(height)
        .map(|(index, entry)| {
            let is_dragged = dragged == Some(entry.name.as_str());
            let mut row_style = Style::default().fg(TEXT_PRIMARY);
            if index == ui.cursor {
                row_style = row_style.bg(BG_CURSOR);
            }
            if is_dragged {
                row_style = row_style.fg(ACCENT_HIGHLIGHT).add_modifier(Modifier::BOLD);
            }

            let handle_style = if is_dragged {
                row_style
            } else {
                row_style.fg(TEXT_SECONDARY)
            };
            let box_style = if entry.selected {
                row_style.fg(ACCENT_SECONDARY)
            } else {
                row_style.fg(TEXT_SECONDARY)
            };

            let mut spans = vec![
                Span::styled(HANDLE, handle_style),
                Span::styled(checkbox(entry.selected), box_style),
                Span::styled(truncate_middle(&entry.name, label_width), row_style),
            ];
            if let Some(position) = positions[index] {
                spans.push(Span::styled(
                    format!(" #{}", position),
                    row_style.fg(ACCENT_HIGHLIGHT),
                ));
            }
            Line::from(spans).style(row_style)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_empty_state_widget(session: &Session) -> Paragraph<'static> {
    let hint = if session.filters().is_empty() {
        "All filters are off. Press 1-5 to enable one."
    } else {
        "No files match the active filters."
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No Files",
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(TEXT_SECONDARY))),
    ];

    Paragraph::new(lines).alignment(Alignment::Center)
}

/// Format choices and output name. Only drawn while something is selected.
fn render_options(frame: &mut Frame, area: Rect, session: &Session) {
    let mut spans = vec![Span::styled("Format: ", Style::default().fg(TEXT_SECONDARY))];
    for format in session.eligible_formats() {
        if *format == session.format() {
            spans.push(Span::styled(
                format!("[{}]", format.label()),
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(
                format!(" {} ", format.label()),
                Style::default().fg(TEXT_SECONDARY),
            ));
        }
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled("   Output: ", Style::default().fg(TEXT_SECONDARY)));
    match session.output_path() {
        Some(path) => spans.push(Span::styled(
            display_name(&path),
            Style::default().fg(TEXT_PRIMARY),
        )),
        None => spans.push(Span::styled(
            "press n to name it",
            Style::default()
                .fg(TEXT_SECONDARY)
                .add_modifier(Modifier::ITALIC),
        )),
    }

    let options = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_COLOR)),
    );

    frame.render_widget(options, area);
}

fn render_status(frame: &mut Frame, area: Rect, status: Option<&StatusReport>) {
    let Some(status) = status else {
        return;
    };

    let color = match status {
        StatusReport::Success(_) => ACCENT_SECONDARY,
        StatusReport::Failure(_) => ACCENT_PRIMARY,
        _ => TEXT_SECONDARY,
    };

    let line = Paragraph::new(Line::from(Span::styled(
        format!(" {}", status),
        Style::default().fg(color),
    )));
    frame.render_widget(line, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let controls = Line::from(vec![
        Span::styled("Space ", Style::default().fg(ACCENT_SECONDARY)),
        Span::raw("Select"),
        Span::raw("  "),
        Span::styled("⠿/⇧↑↓ ", Style::default().fg(ACCENT_HIGHLIGHT)),
        Span::raw("Reorder"),
        Span::raw("  "),
        Span::styled("f ", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("Format"),
        Span::raw("  "),
        Span::styled("n ", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("Name"),
        Span::raw("  "),
        Span::styled("m ", Style::default().fg(ACCENT_HIGHLIGHT)),
        Span::raw("Merge"),
        Span::raw("  "),
        Span::styled("? ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Help", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  "),
        Span::styled("q ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Quit", Style::default().fg(TEXT_SECONDARY)),
    ]);

    let footer = Paragraph::new(controls)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let area = frame.area();
    let help_area = centered_rect(60, 80, area);

    // Clear background
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let key = |k: &'static str| Span::styled(k, Style::default().fg(ACCENT_SECONDARY));
    let help_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![key("  ↑↓ / j k    "), Span::raw("Move cursor")]),
        Line::from(vec![key("  ⇧↑↓ / K J   "), Span::raw("Move file in merge order")]),
        Line::from(vec![key("  Space       "), Span::raw("Select / deselect")]),
        Line::from(vec![key("  a / x       "), Span::raw("Select all / none")]),
        Line::from(vec![key("  1-5         "), Span::raw("Toggle extension filter")]),
        Line::from(vec![key("  f / Tab     "), Span::raw("Next output format")]),
        Line::from(vec![key("  n           "), Span::raw("Edit output name")]),
        Line::from(vec![key("  m / Enter   "), Span::raw("Merge")]),
        Line::from(vec![key("  o           "), Span::raw("Open result folder")]),
        Line::from(vec![key("  r           "), Span::raw("Refresh directory")]),
        Line::from(vec![key("  q / Esc     "), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled(
            "Mouse",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![key("  ⠿ drag      "), Span::raw("Reorder")]),
        Line::from(vec![key("  [ ] click   "), Span::raw("Select / deselect")]),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the welcome dialog overlay
pub fn render_welcome_overlay(frame: &mut Frame) {
    let area = centered_rect(80, 70, frame.area());

    // Clear background
    frame.render_widget(Clear, area);

    let step = |n: &'static str, text: &'static str| {
        Line::from(vec![
            Span::styled(n, Style::default().fg(TEXT_SECONDARY)),
            Span::raw(text),
        ])
    };

    let welcome_lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "Welcome to docmerger!",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![Span::raw(
            "Combine PDFs, images and text files into a single document.",
        )]),
        Line::from(""),
        step("  1. ", "Pick which extensions to show with keys 1-5"),
        step("  2. ", "Select files with Space or by clicking their box"),
        step("  3. ", "Drag the ⠿ handle (or Shift+↑↓) to set the merge order"),
        step("  4. ", "Choose a format with f and a name with n"),
        step("  5. ", "Press m to merge into the result folder"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Images can also be stacked into one "),
            Span::styled("PNG", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Text files can also be joined into one "),
            Span::styled("TXT", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to start...",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )]),
    ];

    let welcome_text = Paragraph::new(welcome_lines)
        .block(
            Block::default()
                .title(Span::styled(
                    " Welcome ",
                    Style::default()
                        .fg(ACCENT_HIGHLIGHT)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
                .style(Style::default().bg(BG_DARK)),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(welcome_text, area);
}

/// Renders the overwrite confirmation dialog
pub fn render_confirm_overwrite_overlay(frame: &mut Frame, output: &Path) {
    let area = frame.area();
    let confirm_area = centered_rect(60, 40, area);

    // Clear background
    frame.render_widget(Clear, confirm_area);

    let block = Block::default()
        .title(" ⚠ File Exists ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_PRIMARY))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(confirm_area);
    frame.render_widget(block, confirm_area);

    let confirm_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "The file '{}' already exists. Do you want to overwrite it?",
                display_name(output)
            ),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Y]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("es  "),
            Span::styled("[Enter]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("     "),
            Span::styled("[N]", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("o  "),
            Span::styled("[Esc]", Style::default().fg(ACCENT_PRIMARY)),
        ]),
    ];

    let paragraph = Paragraph::new(confirm_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, inner);
}

/// Renders the output name editor
pub fn render_name_editor(frame: &mut Frame, buffer: &str, extension: &str) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Output Name ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  > ", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::styled(buffer.to_string(), Style::default().fg(TEXT_PRIMARY)),
            Span::styled("█", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::styled(extension.to_string(), Style::default().fg(TEXT_SECONDARY)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Enter to save, Esc to cancel",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(TEXT_PRIMARY)),
        inner,
    );
}

/// Renders the overlay shown while a merge runs
pub fn render_merging_overlay(frame: &mut Frame, plan: &MergePlan) {
    let area = frame.area();
    let loading_area = centered_rect(50, 30, area);

    // Clear background
    frame.render_widget(Clear, loading_area);

    let block = Block::default()
        .title(" Merging ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(loading_area);
    frame.render_widget(block, loading_area);

    // Simple animation based on current time
    let spinners = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let spinner = spinners[(now / 100) as usize % spinners.len()];

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("  {} ", spinner),
                Style::default().fg(ACCENT_HIGHLIGHT),
            ),
            Span::styled(
                format!("Merging {} files", plan.inputs.len()),
                Style::default().fg(TEXT_PRIMARY),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Into: ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled(
                display_name(&plan.output),
                Style::default()
                    .fg(TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Please wait...",
            Style::default()
                .fg(TEXT_SECONDARY)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Applies a mouse action to the session, using the viewport recorded by the
/// last [`render`].
pub fn apply_mouse_action(session: &mut Session, ui: &mut UiState, action: MouseAction) {
    let len = session.registry().len();
    match action {
        MouseAction::Press { index, part } => {
            ui.cursor = index;
            let Some(name) = ui.current_name(session) else {
                return;
            };
            match part {
                RowPart::Handle => {
                    let y = ui.viewport.row_top(index) + 0.5;
                    session.begin_drag(Some(name.as_str()), y);
                }
                RowPart::Checkbox => {
                    if let Err(e) = session.toggle(&name) {
                        debug!(error = %e, "toggle failed");
                    }
                }
                RowPart::Label => {}
            }
        }
        MouseAction::DragTo { row } => {
            let Some(dragged) = session
                .reorder()
                .dragged_entry()
                .and_then(|name| session.registry().index_of(name))
            else {
                session.end_drag();
                return;
            };
            let rows = ui.viewport.other_rows(dragged, len);
            let y = ui.viewport.pointer_y(row, dragged);
            match session.drag_to(y, &rows) {
                DragUpdate::Moved { to, .. } => ui.cursor = to,
                DragUpdate::Pending { target } => ui.cursor = target,
                DragUpdate::Unchanged | DragUpdate::Aborted => {}
            }
        }
        MouseAction::Release => {
            if let DragUpdate::Moved { to, .. } = session.end_drag() {
                ui.cursor = to;
            }
        }
        MouseAction::ScrollUp => ui.cursor_up(),
        MouseAction::ScrollDown => ui.cursor_down(len),
        MouseAction::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::fixtures::write_text;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn session_with(names: &[&str]) -> (TempDir, Session) {
        let temp_dir = TempDir::new().unwrap();
        for name in names {
            write_text(temp_dir.path(), name, "x");
        }
        let mut session = Session::new(SUPPORTED_EXTENSIONS.iter().copied());
        session.open_directory(temp_dir.path());
        (temp_dir, session)
    }

    fn draw(session: &Session, ui: &mut UiState) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                render(frame, session, ui);
            })
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let content = buffer.content();
        content.iter().map(|c| c.symbol()).collect()
    }

    fn draw_overlay(f: impl FnOnce(&mut Frame)) -> String {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(f).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let content = buffer.content();
        content.iter().map(|c| c.symbol()).collect()
    }

    fn names(session: &Session) -> Vec<&str> {
        session.entries().iter().map(|e| e.name.as_str()).collect()
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn test_render_empty_state() {
            let (_dir, session) = session_with(&[]);
            let mut ui = UiState::default();

            let buffer_str = draw(&session, &mut ui);
            assert!(
                buffer_str.contains("No Files"),
                "Expected empty state message, got: {}",
                buffer_str
            );
        }

        #[test]
        fn test_render_rows_and_merge_positions() {
            let (_dir, mut session) = session_with(&["a.pdf", "b.txt", "c.png"]);
            session.toggle("c.png").unwrap();
            session.toggle("a.pdf").unwrap();
            let mut ui = UiState::default();

            let buffer_str = draw(&session, &mut ui);

            assert!(buffer_str.contains("⠿ [x] a.pdf #1"));
            assert!(buffer_str.contains("⠿ [ ] b.txt"));
            assert!(buffer_str.contains("⠿ [x] c.png #2"));
            assert!(buffer_str.contains("2 selected of 3"));
        }

        #[test]
        fn test_render_filter_chips() {
            let (_dir, session) = session_with(&["a.pdf"]);
            let mut ui = UiState::default();

            let buffer_str = draw(&session, &mut ui);
            assert!(buffer_str.contains("1 .pdf"));
            assert!(buffer_str.contains("5 .jpeg"));
        }

        #[test]
        fn test_format_panel_only_with_selection() {
            let (_dir, mut session) = session_with(&["a.txt"]);
            let mut ui = UiState::default();

            assert!(!draw(&session, &mut ui).contains("Format:"));

            session.select_all();
            session.set_output_name("notes");
            let buffer_str = draw(&session, &mut ui);
            assert!(buffer_str.contains("Format:"));
            assert!(buffer_str.contains("[PDF]"));
            assert!(buffer_str.contains("TXT"));
            assert!(buffer_str.contains("notes.pdf"));
        }

        #[test]
        fn test_render_status_line() {
            let (_dir, mut session) = session_with(&["a.pdf"]);
            session.set_status(StatusReport::Failure("Select at least one file!".to_string()));
            let mut ui = UiState::default();

            assert!(draw(&session, &mut ui).contains("Error: Select at least one file!"));
        }

        #[test]
        fn test_render_footer() {
            let (_dir, session) = session_with(&[]);
            let mut ui = UiState::default();

            let buffer_str = draw(&session, &mut ui);
            for hint in ["Select", "Reorder", "Format", "Name", "Merge", "Help", "Quit"] {
                assert!(buffer_str.contains(hint), "footer is missing {hint}");
            }
        }

        #[test]
        fn test_render_records_viewport_and_scrolls_to_cursor() {
            let names: Vec<String> = (0..40).map(|i| format!("f{:02}.pdf", i)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let (_dir, session) = session_with(&refs);
            let mut ui = UiState {
                cursor: 30,
                ..UiState::default()
            };

            let buffer_str = draw(&session, &mut ui);

            assert!(ui.viewport.area.height > 0);
            let height = usize::from(ui.viewport.area.height);
            assert_eq!(ui.scroll, 31 - height);
            assert!(buffer_str.contains("f30.pdf"));
            assert!(!buffer_str.contains("f00.pdf"));
        }
    }

    mod overlay_tests {
        use super::*;

        #[test]
        fn test_render_help_overlay() {
            let buffer_str = draw_overlay(render_help_overlay);
            assert!(buffer_str.contains("Help"));
            assert!(buffer_str.contains("Reorder"));
        }

        #[test]
        fn test_render_welcome_overlay() {
            let buffer_str = draw_overlay(render_welcome_overlay);
            assert!(buffer_str.contains("Welcome to docmerger!"));
        }

        #[test]
        fn test_render_confirm_overwrite() {
            let buffer_str = draw_overlay(|frame| {
                render_confirm_overwrite_overlay(frame, Path::new("/tmp/result/out.pdf"))
            });
            assert!(buffer_str.contains("out.pdf"));
            assert!(buffer_str.contains("already exists"));
        }

        #[test]
        fn test_render_name_editor() {
            let buffer_str = draw_overlay(|frame| render_name_editor(frame, "report", ".pdf"));
            assert!(buffer_str.contains("report"));
            assert!(buffer_str.contains(".pdf"));
        }

        #[test]
        fn test_render_merging_overlay() {
            let plan = MergePlan {
                inputs: vec!["a.pdf".into(), "b.pdf".into()],
                format: crate::domain::format::OutputFormat::Pdf,
                output: "/tmp/result/out.pdf".into(),
                requires_confirmation: false,
            };
            let buffer_str = draw_overlay(|frame| render_merging_overlay(frame, &plan));
            assert!(buffer_str.contains("Merging 2 files"));
            assert!(buffer_str.contains("out.pdf"));
        }
    }

    mod mouse_tests {
        use super::*;

        #[test]
        fn test_click_checkbox_toggles() {
            let (_dir, mut session) = session_with(&["a.pdf", "b.pdf"]);
            let mut ui = UiState::default();
            draw(&session, &mut ui);

            apply_mouse_action(
                &mut session,
                &mut ui,
                MouseAction::Press {
                    index: 1,
                    part: RowPart::Checkbox,
                },
            );

            assert_eq!(ui.cursor, 1);
            assert!(session.entries()[1].selected);
            assert!(!session.reorder().is_dragging());
        }

        #[test]
        fn test_drag_handle_moves_entry_down() {
            let (_dir, mut session) = session_with(&["a.pdf", "b.pdf", "c.pdf"]);
            session.toggle("a.pdf").unwrap();
            let mut ui = UiState::default();
            draw(&session, &mut ui);
            let top = ui.viewport.area.y;

            apply_mouse_action(
                &mut session,
                &mut ui,
                MouseAction::Press {
                    index: 0,
                    part: RowPart::Handle,
                },
            );
            assert!(session.reorder().is_dragging());

            apply_mouse_action(&mut session, &mut ui, MouseAction::DragTo { row: top + 2 });
            apply_mouse_action(&mut session, &mut ui, MouseAction::Release);

            assert_eq!(names(&session), vec!["b.pdf", "c.pdf", "a.pdf"]);
            assert_eq!(ui.cursor, 2);
            // Reordering leaves selection alone.
            assert!(session.entries()[2].selected);
            assert!(!session.reorder().is_dragging());
        }

        #[test]
        fn test_drag_one_row_at_a_time() {
            let (_dir, mut session) = session_with(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);
            let mut ui = UiState::default();
            draw(&session, &mut ui);
            let top = ui.viewport.area.y;

            apply_mouse_action(
                &mut session,
                &mut ui,
                MouseAction::Press {
                    index: 3,
                    part: RowPart::Handle,
                },
            );
            apply_mouse_action(&mut session, &mut ui, MouseAction::DragTo { row: top + 2 });
            assert_eq!(names(&session), vec!["a.pdf", "b.pdf", "d.pdf", "c.pdf"]);

            // Same row again does not oscillate.
            apply_mouse_action(&mut session, &mut ui, MouseAction::DragTo { row: top + 2 });
            assert_eq!(names(&session), vec!["a.pdf", "b.pdf", "d.pdf", "c.pdf"]);

            apply_mouse_action(&mut session, &mut ui, MouseAction::DragTo { row: top });
            apply_mouse_action(&mut session, &mut ui, MouseAction::Release);
            assert_eq!(names(&session), vec!["d.pdf", "a.pdf", "b.pdf", "c.pdf"]);
        }

        #[test]
        fn test_press_on_label_does_not_drag() {
            let (_dir, mut session) = session_with(&["a.pdf", "b.pdf"]);
            let mut ui = UiState::default();
            draw(&session, &mut ui);

            apply_mouse_action(
                &mut session,
                &mut ui,
                MouseAction::Press {
                    index: 0,
                    part: RowPart::Label,
                },
            );
            apply_mouse_action(&mut session, &mut ui, MouseAction::DragTo { row: 40 });

            assert_eq!(names(&session), vec!["a.pdf", "b.pdf"]);
            assert!(!session.entries()[0].selected);
        }

        #[test]
        fn test_scroll_moves_cursor() {
            let (_dir, mut session) = session_with(&["a.pdf", "b.pdf"]);
            let mut ui = UiState::default();

            apply_mouse_action(&mut session, &mut ui, MouseAction::ScrollDown);
            apply_mouse_action(&mut session, &mut ui, MouseAction::ScrollDown);
            assert_eq!(ui.cursor, 1);

            apply_mouse_action(&mut session, &mut ui, MouseAction::ScrollUp);
            assert_eq!(ui.cursor, 0);
        }
    }
}
