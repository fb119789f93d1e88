use ratatui::style::Color;

/// Errors, destructive prompts
pub const ACCENT_PRIMARY: Color = Color::Rgb(255, 107, 107);
/// Success, selected checkboxes
pub const ACCENT_SECONDARY: Color = Color::Rgb(105, 219, 124);
/// Titles, active choices, the row being dragged
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(116, 192, 252);

pub const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 235);
pub const TEXT_SECONDARY: Color = Color::Rgb(140, 142, 155);

pub const BG_DARK: Color = Color::Rgb(24, 24, 32);
pub const BG_CURSOR: Color = Color::Rgb(48, 50, 66);
pub const BORDER_COLOR: Color = Color::Rgb(72, 74, 96);
