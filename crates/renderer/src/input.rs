//! Maps pointer, touch and scroll events onto a normalized target displacement.
//!
//! Exactly one [`InputSource`] is chosen when the engine mounts. Events from
//! any other source are not listened to and leave the target untouched.

use crate::motion::Displacement;
use crate::page::{BoundingRect, WindowExtent};
use crate::types::{PointerDevice, ResponseMode};

/// Axis driven by scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    X,
    Y,
    Both,
}

/// The one listener set attached for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Pointer,
    Touch,
    Scroll(ScrollAxis),
}

impl InputSource {
    pub fn select(mode: ResponseMode, device: PointerDevice) -> Self {
        match (mode, device) {
            (ResponseMode::PointerMove, PointerDevice::Mouse) => Self::Pointer,
            (ResponseMode::PointerMove, PointerDevice::Touch) => Self::Touch,
            (ResponseMode::ScrollOnX, _) => Self::Scroll(ScrollAxis::X),
            (ResponseMode::ScrollOnY, _) => Self::Scroll(ScrollAxis::Y),
            (ResponseMode::ScrollOnBoth, _) => Self::Scroll(ScrollAxis::Both),
        }
    }
}

/// A raw event, already translated out of the windowing system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Cursor position relative to the window's top-left corner.
    PointerMoved { x: f32, y: f32 },
    /// Touch position relative to the container's top-left corner.
    TouchMoved { x: f32, y: f32 },
    /// The page scrolled; carries the container's bounding rectangle afterwards.
    Scrolled { container: BoundingRect },
}

#[derive(Debug, Clone, Copy)]
pub struct InputNormalizer {
    source: InputSource,
    reverse: bool,
}

impl InputNormalizer {
    pub fn new(source: InputSource, reverse: bool) -> Self {
        Self { source, reverse }
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    /// Updates `target` from `event`; returns false when the event was ignored.
    pub fn handle(&self, event: InputEvent, window: WindowExtent, target: &mut Displacement) -> bool {
        let computed = match (self.source, event) {
            (InputSource::Pointer, InputEvent::PointerMoved { x, y })
            | (InputSource::Touch, InputEvent::TouchMoved { x, y }) => {
                Some(pointer_displacement(x, y, window))
            }
            (InputSource::Scroll(axis), InputEvent::Scrolled { container }) => {
                scroll_displacement(container, window, axis)
            }
            _ => None,
        };

        match computed {
            Some(value) => {
                *target = if self.reverse { value.negated() } else { value };
                true
            }
            None => false,
        }
    }
}

fn pointer_displacement(x: f32, y: f32, window: WindowExtent) -> Displacement {
    let half_x = window.width / 2.0;
    let half_y = window.height / 2.0;
    Displacement::new((half_x - x) / half_x, (half_y - y) / half_y)
}

/// Position of a visible container within its scroll range, rounded to hundredths.
///
/// Returns `None` unless `0 < top < viewport_height - height`.
pub(crate) fn scroll_fraction(container: BoundingRect, viewport_height: f32) -> Option<f32> {
    let travel = viewport_height - container.height;
    let on_screen = container.top < travel && container.top > 0.0;
    if !on_screen {
        return None;
    }
    Some((container.top / travel * 100.0).round() / 100.0)
}

fn scroll_displacement(
    container: BoundingRect,
    window: WindowExtent,
    axis: ScrollAxis,
) -> Option<Displacement> {
    let fraction = scroll_fraction(container, window.height)?;
    let value = 2.0 * fraction - 1.0;
    Some(match axis {
        ScrollAxis::X => Displacement::new(value, 0.0),
        ScrollAxis::Y => Displacement::new(0.0, value),
        ScrollAxis::Both => Displacement::new(value, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: WindowExtent = WindowExtent {
        width: 800.0,
        height: 600.0,
    };

    fn rect(top: f32, height: f32) -> BoundingRect {
        BoundingRect {
            left: 0.0,
            top,
            width: 400.0,
            height,
        }
    }

    #[test]
    fn pointer_displacement_stays_in_unit_range() {
        let normalizer = InputNormalizer::new(InputSource::Pointer, false);
        for step_x in 0..=16 {
            for step_y in 0..=12 {
                let mut target = Displacement::ZERO;
                let event = InputEvent::PointerMoved {
                    x: step_x as f32 * 50.0,
                    y: step_y as f32 * 50.0,
                };
                assert!(normalizer.handle(event, WINDOW, &mut target));
                assert!((-1.0..=1.0).contains(&target.x), "{target:?}");
                assert!((-1.0..=1.0).contains(&target.y), "{target:?}");
            }
        }
    }

    #[test]
    fn pointer_corners_and_centre() {
        let normalizer = InputNormalizer::new(InputSource::Pointer, false);
        let mut target = Displacement::ZERO;
        normalizer.handle(InputEvent::PointerMoved { x: 0.0, y: 0.0 }, WINDOW, &mut target);
        assert_eq!(target, Displacement::new(1.0, 1.0));
        normalizer.handle(
            InputEvent::PointerMoved { x: 800.0, y: 600.0 },
            WINDOW,
            &mut target,
        );
        assert_eq!(target, Displacement::new(-1.0, -1.0));
        normalizer.handle(
            InputEvent::PointerMoved { x: 400.0, y: 300.0 },
            WINDOW,
            &mut target,
        );
        assert_eq!(target, Displacement::ZERO);
    }

    #[test]
    fn reversal_negates_exactly() {
        let events = [
            InputEvent::PointerMoved { x: 123.0, y: 456.0 },
            InputEvent::PointerMoved { x: 799.0, y: 1.0 },
        ];
        for event in events {
            let mut plain = Displacement::ZERO;
            let mut reversed = Displacement::ZERO;
            InputNormalizer::new(InputSource::Pointer, false).handle(event, WINDOW, &mut plain);
            InputNormalizer::new(InputSource::Pointer, true).handle(event, WINDOW, &mut reversed);
            assert_eq!(reversed, plain.negated());
        }

        let scroll = InputEvent::Scrolled {
            container: rect(150.0, 300.0),
        };
        for axis in [ScrollAxis::X, ScrollAxis::Y, ScrollAxis::Both] {
            let mut plain = Displacement::ZERO;
            let mut reversed = Displacement::ZERO;
            InputNormalizer::new(InputSource::Scroll(axis), false).handle(scroll, WINDOW, &mut plain);
            InputNormalizer::new(InputSource::Scroll(axis), true).handle(
                scroll,
                WINDOW,
                &mut reversed,
            );
            assert_eq!(reversed, plain.negated());
        }
    }

    #[test]
    fn scroll_outside_window_leaves_target_unchanged() {
        let normalizer = InputNormalizer::new(InputSource::Scroll(ScrollAxis::Both), false);
        let before = Displacement::new(0.25, -0.5);
        for top in [600.0, 0.0, -20.0, 300.0, 450.0] {
            let mut target = before;
            let applied = normalizer.handle(
                InputEvent::Scrolled {
                    container: rect(top, 300.0),
                },
                WINDOW,
                &mut target,
            );
            assert!(!applied, "top {top} should be gated");
            assert_eq!(target, before);
        }
    }

    #[test]
    fn scroll_maps_fraction_onto_axes() {
        // travel = 600 - 300 = 300; top 75 => 0.25 => -0.5
        let container = rect(75.0, 300.0);
        let cases = [
            (ScrollAxis::X, Displacement::new(-0.5, 0.0)),
            (ScrollAxis::Y, Displacement::new(0.0, -0.5)),
            (ScrollAxis::Both, Displacement::new(-0.5, -0.5)),
        ];
        for (axis, expected) in cases {
            let mut target = Displacement::new(9.0, 9.0);
            InputNormalizer::new(InputSource::Scroll(axis), false).handle(
                InputEvent::Scrolled { container },
                WINDOW,
                &mut target,
            );
            assert_eq!(target, expected);
        }
    }

    #[test]
    fn scroll_fraction_rounds_to_hundredths() {
        // 100 / 300 = 0.333.. => 0.33
        assert_eq!(scroll_fraction(rect(100.0, 300.0), 600.0), Some(0.33));
        // 200 / 300 = 0.666.. => 0.67
        assert_eq!(scroll_fraction(rect(200.0, 300.0), 600.0), Some(0.67));
    }

    #[test]
    fn other_sources_are_not_listened_to() {
        let mut target = Displacement::new(0.1, 0.2);
        let pointer = InputNormalizer::new(InputSource::Pointer, false);
        assert!(!pointer.handle(InputEvent::TouchMoved { x: 0.0, y: 0.0 }, WINDOW, &mut target));
        assert!(!pointer.handle(
            InputEvent::Scrolled {
                container: rect(100.0, 300.0)
            },
            WINDOW,
            &mut target
        ));
        let touch = InputNormalizer::new(InputSource::Touch, false);
        assert!(!touch.handle(InputEvent::PointerMoved { x: 0.0, y: 0.0 }, WINDOW, &mut target));
        assert_eq!(target, Displacement::new(0.1, 0.2));
        assert!(touch.handle(InputEvent::TouchMoved { x: 0.0, y: 600.0 }, WINDOW, &mut target));
        assert_eq!(target, Displacement::new(1.0, -1.0));
    }

    #[test]
    fn selects_single_source() {
        assert_eq!(
            InputSource::select(ResponseMode::PointerMove, PointerDevice::Mouse),
            InputSource::Pointer
        );
        assert_eq!(
            InputSource::select(ResponseMode::PointerMove, PointerDevice::Touch),
            InputSource::Touch
        );
        assert_eq!(
            InputSource::select(ResponseMode::ScrollOnY, PointerDevice::Touch),
            InputSource::Scroll(ScrollAxis::Y)
        );
    }
}
