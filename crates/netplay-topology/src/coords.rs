//! Page to canvas coordinate translation.

/// A point in page coordinates, as reported by a drop event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PagePosition {
    pub x: f64,
    pub y: f64,
}

impl PagePosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in canvas-local render coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

impl CanvasPosition {
    /// Canvas origin (top-left corner).
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Translates drop points into canvas coordinates.
///
/// The side panel width is measured once, when the view is built, and stays
/// fixed for the lifetime of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinateAdapter {
    side_panel_width: f64,
}

impl CoordinateAdapter {
    /// Create an adapter for a side panel of the given width.
    pub const fn new(side_panel_width: f64) -> Self {
        Self { side_panel_width }
    }

    /// Adapter for a layout without a side panel.
    pub const fn without_side_panel() -> Self {
        Self::new(0.0)
    }

    /// Width subtracted from every horizontal coordinate.
    pub const fn side_panel_width(&self) -> f64 {
        self.side_panel_width
    }

    /// Convert a page point to canvas coordinates.
    pub fn to_canvas_position(&self, page_x: f64, page_y: f64) -> CanvasPosition {
        CanvasPosition::new(page_x - self.side_panel_width, page_y)
    }

    /// Convert a [`PagePosition`] to canvas coordinates.
    pub fn translate(&self, page: PagePosition) -> CanvasPosition {
        self.to_canvas_position(page.x, page.y)
    }
}
