// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility providers consulted at the start of every sort step.

use kurbo::Rect;

use crate::types::IsoBox;

/// Decides which objects take part in a sort step.
///
/// Stands in for the host's camera: [`World::step`](crate::World::step)
/// takes an `Option<&dyn Visibility>`, and `None` means nothing is visible.
pub trait Visibility {
    /// Whether an object with iso `bounds`, projecting to `screen`, is visible.
    fn is_visible(&self, bounds: &IsoBox, screen: Rect) -> bool;
}

/// Accepts every object.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllVisible;

impl Visibility for AllVisible {
    #[inline]
    fn is_visible(&self, _bounds: &IsoBox, _screen: Rect) -> bool {
        true
    }
}

/// Accepts objects whose screen bounds overlap a screen rectangle.
///
/// Edges count as overlap, so an object touching the view is visible.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenView(pub Rect);

impl Visibility for ScreenView {
    #[inline]
    fn is_visible(&self, _bounds: &IsoBox, screen: Rect) -> bool {
        let view = self.0;
        view.x0 <= screen.x1 && screen.x0 <= view.x1 && view.y0 <= screen.y1 && screen.y0 <= view.y1
    }
}

impl<F: Fn(&IsoBox) -> bool> Visibility for F {
    #[inline]
    fn is_visible(&self, bounds: &IsoBox, _screen: Rect) -> bool {
        self(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    #[test]
    fn screen_view_overlap_is_inclusive() {
        let view = ScreenView(Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = IsoBox::new(Vec3::ZERO, Vec3::ONE);
        assert!(view.is_visible(&b, Rect::new(50.0, 50.0, 60.0, 60.0)));
        assert!(view.is_visible(&b, Rect::new(100.0, 0.0, 110.0, 10.0)));
        assert!(!view.is_visible(&b, Rect::new(100.5, 0.0, 110.0, 10.0)));
        assert!(!view.is_visible(&b, Rect::new(-20.0, -20.0, -10.0, -0.1)));
    }

    #[test]
    fn closures_filter_on_iso_bounds() {
        let ground_only = |b: &IsoBox| b.position().z <= 0.0;
        let low = IsoBox::new(Vec3::ZERO, Vec3::ONE);
        let high = IsoBox::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ONE);
        assert!(ground_only.is_visible(&low, Rect::ZERO));
        assert!(!ground_only.is_visible(&high, Rect::ZERO));
        assert!(AllVisible.is_visible(&high, Rect::ZERO));
    }
}
