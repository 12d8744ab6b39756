//! Page geometry around the canvas: where the container sits, how far the
//! page is scrolled, and where that puts the canvas inside the window.

use winit::event::MouseScrollDelta;

use crate::types::{ContainerLayout, ResponseMode};

/// Logical pixels scrolled per wheel line.
pub const LINE_HEIGHT: f32 = 40.0;

/// Largest share of the window height an auto-sized container takes in scroll modes.
pub const SCROLL_FIT: f32 = 0.5;

/// Window inner size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowExtent {
    pub width: f32,
    pub height: f32,
}

impl WindowExtent {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Rectangle relative to the window's top-left corner, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// A rectangle in normalized device coordinates, `(x0, y0)` bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl ClipRect {
    /// The whole window.
    pub const FULL: Self = Self {
        x0: -1.0,
        y0: -1.0,
        x1: 1.0,
        y1: 1.0,
    };

    pub fn as_array(self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// The container on a vertically scrollable page.
#[derive(Debug, Clone)]
pub struct Page {
    left: f32,
    top: f32,
    width: Option<f32>,
    bottom_padding: f32,
    fit_window: bool,
    scroll: f32,
}

impl Page {
    /// Resolves unset layout values against the window the engine mounts in.
    ///
    /// In scroll modes the container starts below the fold and has room to
    /// scroll out of view above it.
    pub fn new(layout: ContainerLayout, mode: ResponseMode, window: WindowExtent) -> Self {
        let scroll_mode = mode.is_scroll();
        let auto = if scroll_mode { window.height } else { 0.0 };
        Self {
            left: layout.left,
            top: layout.top.unwrap_or(auto),
            width: layout.width,
            bottom_padding: layout.bottom_padding.unwrap_or(auto),
            fit_window: scroll_mode && layout.width.is_none(),
            scroll: 0.0,
        }
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll
    }

    /// Width the container occupies in a window of the given extent.
    ///
    /// `image_aspect` (height over width) caps an unset width in scroll modes.
    pub fn container_width(&self, window: WindowExtent, image_aspect: f32) -> f32 {
        let mut width = self.width.unwrap_or(window.width - self.left);
        if self.fit_window && image_aspect > 0.0 {
            width = width.min(window.height * SCROLL_FIT / image_aspect);
        }
        width.max(1.0)
    }

    fn page_height(&self, container_height: f32, window: WindowExtent) -> f32 {
        (self.top + container_height + self.bottom_padding).max(window.height)
    }

    /// Applies a wheel delta; returns true if the offset moved.
    pub fn scroll_by(&mut self, delta: f32, container_height: f32, window: WindowExtent) -> bool {
        let max = self.page_height(container_height, window) - window.height;
        let next = (self.scroll + delta).clamp(0.0, max.max(0.0));
        let moved = next != self.scroll;
        self.scroll = next;
        moved
    }

    /// Re-clamps the offset after the window or container changed size.
    pub fn clamp_scroll(&mut self, container_height: f32, window: WindowExtent) {
        self.scroll_by(0.0, container_height, window);
    }

    /// The container's rectangle as seen from the window.
    pub fn bounding_rect(&self, css_width: f32, css_height: f32) -> BoundingRect {
        BoundingRect {
            left: self.left,
            top: self.top - self.scroll,
            width: css_width,
            height: css_height,
        }
    }
}

/// Converts a wheel delta into page pixels; positive scrolls the page down.
pub fn wheel_pixels(delta: MouseScrollDelta, scale_factor: f64) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, lines) => -lines * LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(position) => {
            -(position.to_logical::<f64>(scale_factor).y as f32)
        }
    }
}

/// Where the canvas lands in clip space of a window of the given extent.
pub fn composite_rect(rect: BoundingRect, window: WindowExtent) -> ClipRect {
    let width = window.width.max(1.0);
    let height = window.height.max(1.0);
    ClipRect {
        x0: rect.left / width * 2.0 - 1.0,
        y0: 1.0 - (rect.top + rect.height) / height * 2.0,
        x1: (rect.left + rect.width) / width * 2.0 - 1.0,
        y1: 1.0 - rect.top / height * 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    const WINDOW: WindowExtent = WindowExtent {
        width: 800.0,
        height: 600.0,
    };

    fn page(top: f32, width: Option<f32>, bottom_padding: f32) -> Page {
        let layout = ContainerLayout {
            left: 100.0,
            top: Some(top),
            width,
            bottom_padding: Some(bottom_padding),
        };
        Page::new(layout, ResponseMode::PointerMove, WINDOW)
    }

    #[test]
    fn container_fills_remaining_width_by_default() {
        assert_eq!(page(0.0, None, 0.0).container_width(WINDOW, 0.75), 700.0);
        assert_eq!(
            page(0.0, Some(320.0), 0.0).container_width(WINDOW, 0.75),
            320.0
        );
    }

    #[test]
    fn pointer_mode_defaults_to_page_top() {
        let mut page = Page::new(ContainerLayout::default(), ResponseMode::PointerMove, WINDOW);
        assert_eq!(page.container_width(WINDOW, 0.75), 800.0);
        assert_eq!(page.bounding_rect(800.0, 600.0).top, 0.0);
        assert!(!page.scroll_by(40.0, 600.0, WINDOW));
    }

    #[test]
    fn scroll_modes_default_below_the_fold() {
        let mut page = Page::new(ContainerLayout::default(), ResponseMode::ScrollOnY, WINDOW);
        // half the window height at a 0.75 aspect
        assert_eq!(page.container_width(WINDOW, 0.75), 400.0);
        assert_eq!(page.bounding_rect(400.0, 300.0).top, 600.0);

        // page height = 600 + 300 + 600 => max scroll 900
        page.scroll_by(10_000.0, 300.0, WINDOW);
        assert_eq!(page.scroll_offset(), 900.0);
        assert_eq!(page.bounding_rect(400.0, 300.0).top, -300.0);
    }

    #[test]
    fn scroll_modes_keep_explicit_values() {
        let layout = ContainerLayout {
            left: 0.0,
            top: Some(300.0),
            width: Some(700.0),
            bottom_padding: None,
        };
        let page = Page::new(layout, ResponseMode::ScrollOnBoth, WINDOW);
        assert_eq!(page.container_width(WINDOW, 0.75), 700.0);
        assert_eq!(page.bounding_rect(700.0, 525.0).top, 300.0);

        let unset_width = ContainerLayout {
            width: None,
            ..layout
        };
        let page = Page::new(unset_width, ResponseMode::ScrollOnBoth, WINDOW);
        assert_eq!(page.container_width(WINDOW, 0.75), 400.0);
    }

    #[test]
    fn scroll_is_clamped_to_page() {
        // page height = 500 + 300 + 400 = 1200 => max scroll 600
        let mut page = page(500.0, Some(400.0), 400.0);
        assert!(!page.scroll_by(-50.0, 300.0, WINDOW));
        assert_eq!(page.scroll_offset(), 0.0);
        assert!(page.scroll_by(250.0, 300.0, WINDOW));
        assert_eq!(page.bounding_rect(400.0, 300.0).top, 250.0);
        page.scroll_by(10_000.0, 300.0, WINDOW);
        assert_eq!(page.scroll_offset(), 600.0);
        page.clamp_scroll(300.0, WindowExtent::new(800.0, 1000.0));
        assert_eq!(page.scroll_offset(), 200.0);
    }

    #[test]
    fn short_pages_do_not_scroll() {
        let mut page = page(0.0, Some(400.0), 0.0);
        assert!(!page.scroll_by(120.0, 300.0, WINDOW));
        assert_eq!(page.scroll_offset(), 0.0);
    }

    #[test]
    fn wheel_lines_scroll_forty_pixels() {
        assert_eq!(wheel_pixels(MouseScrollDelta::LineDelta(0.0, -2.0), 1.0), 80.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 30.0));
        assert_eq!(wheel_pixels(pixels, 2.0), -15.0);
    }

    #[test]
    fn composite_rect_maps_to_clip_space() {
        let full = composite_rect(
            BoundingRect {
                left: 0.0,
                top: 0.0,
                width: 800.0,
                height: 600.0,
            },
            WINDOW,
        );
        assert_eq!(full.as_array(), [-1.0, -1.0, 1.0, 1.0]);

        let quarter = composite_rect(
            BoundingRect {
                left: 400.0,
                top: 0.0,
                width: 400.0,
                height: 300.0,
            },
            WINDOW,
        );
        assert_eq!(quarter.as_array(), [0.0, 0.0, 1.0, 1.0]);
    }
}
