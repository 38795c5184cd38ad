// ── Idle overlay ──────────────────────────────────────────────────────────────
//
// The decorative screen that covers the main window after a period without
// input.  This module is the pure state machine: which inputs dismiss it,
// where the sprite is, how it moves per tick.  Window creation, timers and
// painting belong to the platform layer, driven by the controller.
//
//   Idle ──idle timer──▶ Active ──dismissing input──▶ Idle
//
// Two profiles:
//   • Simple       any pointer move, click or key dismisses; the sprite
//                  travels diagonally and bounces off the margins.
//   • Interactive  pointer move or click dismisses; W/A/S/D and the arrow
//                  keys steer the sprite while held; any other key dismisses
//                  and is handed back to the editor.

use serde::{Deserialize, Serialize};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Radius of the sprite circle in pixels.
pub(crate) const SPRITE_RADIUS: i32 = 10;

/// Distance the sprite centre keeps from every edge.
pub(crate) const MARGIN: i32 = 10;

const START: Point = Point { x: 100, y: 100 };
const SIMPLE_VELOCITY: Point = Point { x: 2, y: 2 };
const STEER_SPEED: i32 = 5;

/// Win32 virtual-key codes of the steering keys.
pub(crate) mod vk {
    pub(crate) const LEFT: u32 = 0x25;
    pub(crate) const UP: u32 = 0x26;
    pub(crate) const RIGHT: u32 = 0x27;
    pub(crate) const DOWN: u32 = 0x28;
    pub(crate) const A: u32 = 0x41;
    pub(crate) const D: u32 = 0x44;
    pub(crate) const S: u32 = 0x53;
    pub(crate) const W: u32 = 0x57;
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// A 2D point or velocity in overlay client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Point {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

/// Client-area size of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Size {
    pub(crate) width: i32,
    pub(crate) height: i32,
}

/// Allowed `[lo, hi]` range for a coordinate along an axis of `extent` pixels.
fn axis_range(extent: i32) -> (i32, i32) {
    (MARGIN, (extent - MARGIN).max(MARGIN))
}

// ── Profile ───────────────────────────────────────────────────────────────────

/// Which idle-screen behaviour is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OverlayProfile {
    Simple,
    #[default]
    Interactive,
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// A key press as received, kept intact so it can be replayed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyStroke {
    /// Virtual-key code (`WPARAM` of `WM_KEYDOWN`).
    pub(crate) vk: u32,
    /// Repeat count, scan code and flags (`LPARAM` of `WM_KEYDOWN`).
    pub(crate) flags: isize,
}

/// Input delivered to the overlay while it is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Input {
    PointerMove(Point),
    PointerButton,
    KeyDown(KeyStroke),
    KeyUp(u32),
}

/// What the overlay did with an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reaction {
    /// Nothing changed.
    Ignored,
    /// A steering key changed state.
    Steered,
    /// The overlay is now inactive.  `forward` is a key press that should be
    /// delivered to the editor as if typed there.
    Dismissed { forward: Option<KeyStroke> },
}

// ── Steering keys ─────────────────────────────────────────────────────────────

/// Held state of the eight steering keys.  Letters and arrows are two groups
/// mapped onto the same two axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DirectionKeys {
    w: bool,
    a: bool,
    s: bool,
    d: bool,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl DirectionKeys {
    /// Record `key` as held or released.  Returns `false` for other keys.
    fn set(&mut self, key: u32, held: bool) -> bool {
        let slot = match key {
            vk::W => &mut self.w,
            vk::A => &mut self.a,
            vk::S => &mut self.s,
            vk::D => &mut self.d,
            vk::UP => &mut self.up,
            vk::DOWN => &mut self.down,
            vk::LEFT => &mut self.left,
            vk::RIGHT => &mut self.right,
            _ => return false,
        };
        *slot = held;
        true
    }

    /// Sum of one `speed` impulse per held direction.
    fn velocity(&self, speed: i32) -> Point {
        let mut v = Point::default();
        if self.a || self.left {
            v.x -= speed;
        }
        if self.d || self.right {
            v.x += speed;
        }
        if self.w || self.up {
            v.y -= speed;
        }
        if self.s || self.down {
            v.y += speed;
        }
        v
    }
}

// ── IdleOverlay ───────────────────────────────────────────────────────────────

/// Idle-screen state: activity flag, sprite kinematics and held keys.
#[derive(Debug, Clone)]
pub(crate) struct IdleOverlay {
    profile: OverlayProfile,
    active: bool,
    bounds: Size,
    position: Point,
    velocity: Point,
    keys: DirectionKeys,
    /// First pointer position seen after activation.  Windows reports a
    /// synthetic move when a window appears under the cursor; only a move
    /// away from this point counts as user input.
    pointer_anchor: Option<Point>,
}

impl IdleOverlay {
    pub(crate) fn new(profile: OverlayProfile) -> Self {
        Self {
            profile,
            active: false,
            bounds: Size::default(),
            position: START,
            velocity: Point::default(),
            keys: DirectionKeys::default(),
            pointer_anchor: None,
        }
    }

    pub(crate) fn profile(&self) -> OverlayProfile {
        self.profile
    }

    /// Change profile.  Takes effect at the next activation.
    pub(crate) fn set_profile(&mut self, profile: OverlayProfile) {
        self.profile = profile;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Centre of the sprite.
    pub(crate) fn position(&self) -> Point {
        self.position
    }

    #[cfg(test)]
    pub(crate) fn velocity(&self) -> Point {
        self.velocity
    }

    /// Enter the active state over a client area of `bounds`, resetting the
    /// sprite.
    pub(crate) fn activate(&mut self, bounds: Size) {
        let (lo_x, hi_x) = axis_range(bounds.width);
        let (lo_y, hi_y) = axis_range(bounds.height);
        self.active = true;
        self.bounds = bounds;
        self.position = Point {
            x: START.x.clamp(lo_x, hi_x),
            y: START.y.clamp(lo_y, hi_y),
        };
        self.velocity = match self.profile {
            OverlayProfile::Simple => SIMPLE_VELOCITY,
            OverlayProfile::Interactive => Point::default(),
        };
        self.keys = DirectionKeys::default();
        self.pointer_anchor = None;
        log::debug!("idle overlay active ({:?}, {}x{})", self.profile, bounds.width, bounds.height);
    }

    /// Leave the active state unconditionally.
    pub(crate) fn deactivate(&mut self) {
        if self.active {
            log::debug!("idle overlay dismissed");
        }
        self.active = false;
        self.keys = DirectionKeys::default();
    }

    /// Feed one input event.  Inputs while inactive are ignored.
    pub(crate) fn handle_input(&mut self, input: Input) -> Reaction {
        if !self.active {
            return Reaction::Ignored;
        }

        let dismiss = |this: &mut Self, forward| {
            this.deactivate();
            Reaction::Dismissed { forward }
        };

        match (self.profile, input) {
            (_, Input::PointerMove(at)) => match self.pointer_anchor {
                None => {
                    self.pointer_anchor = Some(at);
                    Reaction::Ignored
                }
                Some(anchor) if anchor == at => Reaction::Ignored,
                Some(_) => dismiss(self, None),
            },
            (_, Input::PointerButton) => dismiss(self, None),

            (OverlayProfile::Simple, Input::KeyDown(_)) => dismiss(self, None),
            (OverlayProfile::Simple, Input::KeyUp(_)) => Reaction::Ignored,

            (OverlayProfile::Interactive, Input::KeyDown(stroke)) => {
                if self.keys.set(stroke.vk, true) {
                    Reaction::Steered
                } else {
                    dismiss(self, Some(stroke))
                }
            }
            (OverlayProfile::Interactive, Input::KeyUp(key)) => {
                if self.keys.set(key, false) {
                    Reaction::Steered
                } else {
                    Reaction::Ignored
                }
            }
        }
    }

    /// Advance the sprite by one animation step.
    pub(crate) fn tick(&mut self) {
        if !self.active {
            return;
        }
        let (lo_x, hi_x) = axis_range(self.bounds.width);
        let (lo_y, hi_y) = axis_range(self.bounds.height);

        match self.profile {
            OverlayProfile::Simple => {
                self.position.x += self.velocity.x;
                self.position.y += self.velocity.y;
                (self.position.x, self.velocity.x) =
                    bounce(self.position.x, self.velocity.x, lo_x, hi_x);
                (self.position.y, self.velocity.y) =
                    bounce(self.position.y, self.velocity.y, lo_y, hi_y);
            }
            OverlayProfile::Interactive => {
                self.velocity = self.keys.velocity(STEER_SPEED);
                self.position.x = (self.position.x + self.velocity.x).clamp(lo_x, hi_x);
                self.position.y = (self.position.y + self.velocity.y).clamp(lo_y, hi_y);
            }
        }
    }
}

/// Elastic reflection on one axis: at or past a margin, clamp to it and point
/// the velocity back inside.
fn bounce(pos: i32, vel: i32, lo: i32, hi: i32) -> (i32, i32) {
    if pos <= lo && vel < 0 {
        (lo, -vel)
    } else if pos >= hi && vel > 0 {
        (hi, -vel)
    } else {
        (pos.clamp(lo, hi), vel)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Size = Size { width: 200, height: 150 };

    fn key(vk: u32) -> KeyStroke {
        KeyStroke { vk, flags: 0x001E_0001 }
    }

    fn active(profile: OverlayProfile) -> IdleOverlay {
        let mut overlay = IdleOverlay::new(profile);
        overlay.activate(BOUNDS);
        overlay
    }

    #[test]
    fn starts_inactive_and_ignores_input() {
        let mut overlay = IdleOverlay::new(OverlayProfile::Simple);
        assert!(!overlay.is_active());
        assert_eq!(overlay.handle_input(Input::PointerButton), Reaction::Ignored);
        overlay.tick();
        assert_eq!(overlay.position(), START);
    }

    #[test]
    fn click_dismisses_in_both_profiles() {
        for profile in [OverlayProfile::Simple, OverlayProfile::Interactive] {
            let mut overlay = active(profile);
            assert_eq!(
                overlay.handle_input(Input::PointerButton),
                Reaction::Dismissed { forward: None }
            );
            assert!(!overlay.is_active());
        }
    }

    #[test]
    fn first_pointer_move_only_anchors() {
        let mut overlay = active(OverlayProfile::Interactive);
        let at = Point { x: 40, y: 40 };
        assert_eq!(overlay.handle_input(Input::PointerMove(at)), Reaction::Ignored);
        assert_eq!(overlay.handle_input(Input::PointerMove(at)), Reaction::Ignored);
        assert!(overlay.is_active());
        assert_eq!(
            overlay.handle_input(Input::PointerMove(Point { x: 41, y: 40 })),
            Reaction::Dismissed { forward: None }
        );
    }

    #[test]
    fn simple_profile_dismisses_on_any_key() {
        let mut overlay = active(OverlayProfile::Simple);
        assert_eq!(
            overlay.handle_input(Input::KeyDown(key(vk::W))),
            Reaction::Dismissed { forward: None }
        );
    }

    #[test]
    fn interactive_steering_keys_do_not_dismiss() {
        let mut overlay = active(OverlayProfile::Interactive);
        assert_eq!(overlay.handle_input(Input::KeyDown(key(vk::RIGHT))), Reaction::Steered);
        assert_eq!(overlay.handle_input(Input::KeyDown(key(vk::S))), Reaction::Steered);
        overlay.tick();
        assert_eq!(overlay.velocity(), Point { x: STEER_SPEED, y: STEER_SPEED });
        assert_eq!(overlay.position(), Point { x: 105, y: 105 });

        assert_eq!(overlay.handle_input(Input::KeyUp(vk::RIGHT)), Reaction::Steered);
        overlay.tick();
        assert_eq!(overlay.velocity(), Point { x: 0, y: STEER_SPEED });
        assert!(overlay.is_active());
    }

    #[test]
    fn letter_and_arrow_groups_share_axes() {
        let mut overlay = active(OverlayProfile::Interactive);
        overlay.handle_input(Input::KeyDown(key(vk::A)));
        overlay.handle_input(Input::KeyDown(key(vk::LEFT)));
        overlay.tick();
        assert_eq!(overlay.velocity().x, -STEER_SPEED);

        overlay.handle_input(Input::KeyDown(key(vk::D)));
        overlay.tick();
        assert_eq!(overlay.velocity().x, 0, "opposite impulses cancel");
    }

    #[test]
    fn interactive_other_key_is_forwarded() {
        let mut overlay = active(OverlayProfile::Interactive);
        let stroke = key(0x48); // 'H'
        assert_eq!(
            overlay.handle_input(Input::KeyDown(stroke)),
            Reaction::Dismissed { forward: Some(stroke) }
        );
        assert!(!overlay.is_active());
    }

    #[test]
    fn interactive_clamps_to_margin() {
        let mut overlay = active(OverlayProfile::Interactive);
        overlay.handle_input(Input::KeyDown(key(vk::UP)));
        for _ in 0..100 {
            overlay.tick();
        }
        assert_eq!(overlay.position().y, MARGIN);
    }

    #[test]
    fn activation_resets_sprite_and_keys() {
        let mut overlay = active(OverlayProfile::Interactive);
        overlay.handle_input(Input::KeyDown(key(vk::D)));
        overlay.tick();
        overlay.handle_input(Input::PointerButton);

        overlay.activate(BOUNDS);
        assert_eq!(overlay.position(), START);
        overlay.tick();
        assert_eq!(overlay.position(), START, "keys were cleared");
    }

    #[test]
    fn start_is_clamped_into_small_bounds() {
        let mut overlay = IdleOverlay::new(OverlayProfile::Simple);
        overlay.activate(Size { width: 60, height: 300 });
        assert_eq!(overlay.position(), Point { x: 50, y: 100 });
    }

    #[test]
    fn simple_bounce_stays_within_margins() {
        for bounds in [Size { width: 200, height: 150 }, Size { width: 37, height: 523 }] {
            let mut overlay = IdleOverlay::new(OverlayProfile::Simple);
            overlay.activate(bounds);
            let (lo_x, hi_x) = axis_range(bounds.width);
            let (lo_y, hi_y) = axis_range(bounds.height);

            for _ in 0..2_000 {
                let before = overlay.velocity();
                overlay.tick();
                let p = overlay.position();
                let v = overlay.velocity();
                assert!((lo_x..=hi_x).contains(&p.x), "x={} out of range", p.x);
                assert!((lo_y..=hi_y).contains(&p.y), "y={} out of range", p.y);

                let touching_x = p.x == lo_x || p.x == hi_x;
                let touching_y = p.y == lo_y || p.y == hi_y;
                if v.x != before.x {
                    assert!(touching_x, "x velocity flipped away from a margin");
                    assert_eq!(v.x, -before.x);
                }
                if v.y != before.y {
                    assert!(touching_y, "y velocity flipped away from a margin");
                    assert_eq!(v.y, -before.y);
                }
            }
        }
    }

    #[test]
    fn bounce_flips_only_when_heading_out() {
        assert_eq!(bounce(8, -2, 10, 190), (10, 2));
        assert_eq!(bounce(10, -2, 10, 190), (10, 2));
        assert_eq!(bounce(10, 2, 10, 190), (10, 2));
        assert_eq!(bounce(191, 2, 10, 190), (190, -2));
        assert_eq!(bounce(100, 2, 10, 190), (100, 2));
    }

    #[test]
    fn profile_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OverlayProfile::Simple).expect("json"), r#""simple""#);
    }
}
