use super::helpers::{ListViewport, RowPart};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Move the cursor up one row
    CursorUp,
    /// Move the cursor down one row
    CursorDown,
    /// Move the entry under the cursor one place earlier in merge order
    MoveUp,
    /// Move the entry under the cursor one place later in merge order
    MoveDown,
    /// Toggle selection of the entry under the cursor
    ToggleSelect,
    SelectAll,
    SelectNone,
    /// Toggle the extension filter at this position in the filter bar
    ToggleFilter(usize),
    /// Switch to the next eligible output format
    CycleFormat,
    /// Edit the output file name
    EditName,
    Merge,
    /// Open the result directory
    OpenResult,
    /// Re-read the directory
    Refresh,
    /// Toggle help overlay
    Help,
    /// Overwrite the existing output
    ConfirmOverwrite,
    /// Keep the existing output
    CancelOverwrite,
    /// No action
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q, Esc or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        // Reorder: Shift+arrows, or K / J
        (KeyCode::Up, KeyModifiers::SHIFT) => KeyAction::MoveUp,
        (KeyCode::Down, KeyModifiers::SHIFT) => KeyAction::MoveDown,
        (KeyCode::Char('K'), _) => KeyAction::MoveUp,
        (KeyCode::Char('J'), _) => KeyAction::MoveDown,

        // Cursor
        (KeyCode::Up, KeyModifiers::NONE) => KeyAction::CursorUp,
        (KeyCode::Down, KeyModifiers::NONE) => KeyAction::CursorDown,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::CursorUp,
        (KeyCode::Char('j'), KeyModifiers::NONE) => KeyAction::CursorDown,

        // Selection
        (KeyCode::Char(' '), KeyModifiers::NONE) => KeyAction::ToggleSelect,
        (KeyCode::Char('a'), KeyModifiers::NONE) => KeyAction::SelectAll,
        (KeyCode::Char('x'), KeyModifiers::NONE) => KeyAction::SelectNone,

        // Filters 1-5
        (KeyCode::Char(c @ '1'..='5'), KeyModifiers::NONE) => {
            KeyAction::ToggleFilter(c as usize - '1' as usize)
        }

        // Output
        (KeyCode::Char('f'), KeyModifiers::NONE) => KeyAction::CycleFormat,
        (KeyCode::Tab, KeyModifiers::NONE) => KeyAction::CycleFormat,
        (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::EditName,
        (KeyCode::Char('m'), KeyModifiers::NONE) => KeyAction::Merge,
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::Merge,
        (KeyCode::Char('o'), KeyModifiers::NONE) => KeyAction::OpenResult,
        (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Refresh,

        // Help: ?
        (KeyCode::Char('?'), _) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Maps keyboard events to confirmation actions
/// Used when ViewState is ConfirmOverwrite
pub fn handle_confirm_input(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Confirm: y or Enter
        (KeyCode::Char('y'), KeyModifiers::NONE) => KeyAction::ConfirmOverwrite,
        (KeyCode::Char('Y'), _) => KeyAction::ConfirmOverwrite,
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::ConfirmOverwrite,

        // Cancel: n or Esc
        (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::CancelOverwrite,
        (KeyCode::Char('N'), _) => KeyAction::CancelOverwrite,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::CancelOverwrite,

        _ => KeyAction::None,
    }
}

/// Keys while the output name is being typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    Insert(char),
    Backspace,
    Submit,
    Cancel,
    None,
}

pub fn handle_text_input(key: KeyEvent) -> TextInput {
    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) => TextInput::Submit,
        (KeyCode::Esc, _) => TextInput::Cancel,
        (KeyCode::Backspace, _) => TextInput::Backspace,
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => TextInput::Insert(c),
        _ => TextInput::None,
    }
}

/// Result of handling a mouse event over the file list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    /// Left button pressed on a row
    Press { index: usize, part: RowPart },
    /// Pointer moved to this terminal row while a drag is active
    DragTo { row: u16 },
    /// Left button released while a drag is active
    Release,
    ScrollUp,
    ScrollDown,
    None,
}

/// Maps mouse events to actions. `len` is the number of listed entries and
/// `dragging` whether a reorder gesture is in progress.
pub fn handle_mouse_event(
    mouse: MouseEvent,
    viewport: &ListViewport,
    len: usize,
    dragging: bool,
) -> MouseAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => viewport
            .hit(mouse.column, mouse.row, len)
            .map(|(index, part)| MouseAction::Press { index, part })
            .unwrap_or(MouseAction::None),
        MouseEventKind::Drag(MouseButton::Left) if dragging => {
            MouseAction::DragTo { row: mouse.row }
        }
        MouseEventKind::Up(MouseButton::Left) if dragging => MouseAction::Release,
        MouseEventKind::ScrollUp if viewport.hit(mouse.column, mouse.row, usize::MAX).is_some() => {
            MouseAction::ScrollUp
        }
        MouseEventKind::ScrollDown
            if viewport.hit(mouse.column, mouse.row, usize::MAX).is_some() =>
        {
            MouseAction::ScrollDown
        }
        _ => MouseAction::None,
    }
}
