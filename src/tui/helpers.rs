//! Geometry and formatting helpers shared by rendering and mouse handling.

use crate::domain::reorder::RowGeometry;
use ratatui::layout::Rect;

/// Grip drawn at the start of every row; pressing it starts a drag.
pub const HANDLE: &str = "⠿ ";
pub const HANDLE_WIDTH: u16 = 2;
/// `[x] ` right after the handle.
pub const CHECKBOX_WIDTH: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPart {
    Handle,
    Checkbox,
    Label,
}

/// Where the file list was last drawn: the inner area of its block and the
/// index of the first visible entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListViewport {
    pub area: Rect,
    pub scroll: usize,
}

impl ListViewport {
    pub fn new(area: Rect, scroll: usize) -> Self {
        Self { area, scroll }
    }

    /// Screen row of entry `index`, as a float so rows scrolled out of view
    /// get offsets above or below the area.
    pub fn row_top(&self, index: usize) -> f64 {
        f64::from(self.area.y) + index as f64 - self.scroll as f64
    }

    /// Entry and row part under a terminal cell, if any.
    pub fn hit(&self, column: u16, row: u16, len: usize) -> Option<(usize, RowPart)> {
        let area = self.area;
        if column < area.x
            || column >= area.x.saturating_add(area.width)
            || row < area.y
            || row >= area.y.saturating_add(area.height)
        {
            return None;
        }

        let index = self.scroll + usize::from(row - area.y);
        if index >= len {
            return None;
        }

        let offset = column - area.x;
        let part = if offset < HANDLE_WIDTH {
            RowPart::Handle
        } else if offset < HANDLE_WIDTH + CHECKBOX_WIDTH {
            RowPart::Checkbox
        } else {
            RowPart::Label
        };
        Some((index, part))
    }

    /// Geometry of every row except `dragged`, in display order.
    pub fn other_rows(&self, dragged: usize, len: usize) -> Vec<RowGeometry> {
        (0..len)
            .filter(|&i| i != dragged)
            .map(|i| RowGeometry::new(self.row_top(i), 1.0))
            .collect()
    }

    /// Pointer position for a drag over terminal row `row`.
    ///
    /// Cells are one row tall, so the pointer is placed past the midpoint of
    /// the row it hovers when moving down and before it when moving up. Over
    /// the dragged row itself it sits on the midpoint.
    pub fn pointer_y(&self, row: u16, dragged: usize) -> f64 {
        let row = f64::from(row);
        let dragged_top = self.row_top(dragged);
        if row < dragged_top {
            row + 0.25
        } else if row > dragged_top {
            row + 0.75
        } else {
            row + 0.5
        }
    }
}

/// First visible index so that `cursor` stays inside `height` rows.
pub fn scroll_to_fit(scroll: usize, cursor: usize, height: usize) -> usize {
    if height == 0 {
        scroll
    } else if cursor < scroll {
        cursor
    } else if cursor >= scroll + height {
        cursor + 1 - height
    } else {
        scroll
    }
}

pub fn checkbox(selected: bool) -> &'static str {
    if selected {
        "[x] "
    } else {
        "[ ] "
    }
}

/// Shortens `text` to `max` characters by replacing its middle with `…`.
pub fn truncate_middle(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    if max <= 1 {
        return "…".chars().take(max).collect();
    }
    let keep = max - 1;
    let head = keep.div_ceil(2);
    let tail = keep / 2;
    let start: String = text.chars().take(head).collect();
    let end: String = text.chars().skip(count - tail).collect();
    format!("{}…{}", start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> ListViewport {
        ListViewport::new(Rect::new(2, 5, 30, 4), 0)
    }

    mod hit_tests {
        use super::*;

        #[test]
        fn test_hit_parts() {
            let vp = viewport();
            assert_eq!(vp.hit(2, 5, 3), Some((0, RowPart::Handle)));
            assert_eq!(vp.hit(3, 6, 3), Some((1, RowPart::Handle)));
            assert_eq!(vp.hit(4, 6, 3), Some((1, RowPart::Checkbox)));
            assert_eq!(vp.hit(10, 7, 3), Some((2, RowPart::Label)));
        }

        #[test]
        fn test_hit_outside_or_past_end() {
            let vp = viewport();
            assert_eq!(vp.hit(1, 5, 3), None);
            assert_eq!(vp.hit(2, 4, 3), None);
            assert_eq!(vp.hit(32, 5, 3), None);
            // Row 8 is inside the area but there are only three entries.
            assert_eq!(vp.hit(5, 8, 3), None);
        }

        #[test]
        fn test_hit_respects_scroll() {
            let vp = ListViewport::new(Rect::new(0, 0, 10, 2), 5);
            assert_eq!(vp.hit(0, 1, 10), Some((6, RowPart::Handle)));
        }
    }

    mod drag_geometry_tests {
        use super::*;
        use crate::domain::reorder::target_index;

        #[test]
        fn test_other_rows_skip_dragged() {
            let vp = viewport();
            let rows = vp.other_rows(1, 3);
            assert_eq!(
                rows,
                vec![RowGeometry::new(5.0, 1.0), RowGeometry::new(7.0, 1.0)]
            );
        }

        #[test]
        fn test_hovering_next_row_moves_down_one() {
            let vp = viewport();
            let rows = vp.other_rows(0, 3);
            let y = vp.pointer_y(6, 0);
            assert_eq!(target_index(y, &rows), 1);
        }

        #[test]
        fn test_hovering_previous_row_moves_up_one() {
            let vp = viewport();
            let rows = vp.other_rows(2, 3);
            let y = vp.pointer_y(6, 2);
            assert_eq!(target_index(y, &rows), 1);
        }

        #[test]
        fn test_hovering_own_row_is_stable() {
            let vp = viewport();
            for dragged in 0..3 {
                let rows = vp.other_rows(dragged, 3);
                let y = vp.pointer_y(5 + dragged as u16, dragged);
                assert_eq!(target_index(y, &rows), dragged);
            }
        }

        #[test]
        fn test_above_list_targets_front() {
            let vp = viewport();
            let rows = vp.other_rows(2, 3);
            assert_eq!(target_index(vp.pointer_y(0, 2), &rows), 0);
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn test_scroll_to_fit() {
            assert_eq!(scroll_to_fit(0, 2, 5), 0);
            assert_eq!(scroll_to_fit(0, 7, 5), 3);
            assert_eq!(scroll_to_fit(4, 1, 5), 1);
            assert_eq!(scroll_to_fit(3, 3, 0), 3);
        }

        #[test]
        fn test_checkbox() {
            assert_eq!(checkbox(true), "[x] ");
            assert_eq!(checkbox(false), "[ ] ");
        }

        #[test]
        fn test_truncate_middle() {
            assert_eq!(truncate_middle("short.pdf", 20), "short.pdf");
            assert_eq!(truncate_middle("abcdefghij", 5), "ab…ij");
            assert_eq!(truncate_middle("abcdefghij", 6), "abc…ij");
            assert_eq!(truncate_middle("abc", 1), "…");
        }
    }
}
