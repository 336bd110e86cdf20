//! Column resize sessions.

/// An in-progress column resize drag.
///
/// Created when the pointer goes down on a resize handle and dropped on
/// release. While it exists the grid is "resizing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    /// Column being resized.
    pub column_id: String,
    /// Pointer x at drag start.
    pub start_x: i32,
    /// Column width at drag start.
    pub start_width: u32,
}

impl ResizeSession {
    /// Starts a session.
    pub fn new(column_id: impl Into<String>, start_x: i32, start_width: u32) -> Self {
        Self {
            column_id: column_id.into(),
            start_x,
            start_width,
        }
    }

    /// Unclamped width for a pointer position.
    pub fn width_at(&self, x: i32) -> i64 {
        self.start_width as i64 + (x as i64 - self.start_x as i64)
    }
}
