//! Local heading integration and key sampling

use macroquad::prelude::*;
use shared::ROTATION_SPEED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnDirection {
    #[default]
    Straight,
    Left,
    Right,
}

impl TurnDirection {
    /// Right wins when both keys are held.
    pub fn from_keys(left: bool, right: bool) -> Self {
        if right {
            TurnDirection::Right
        } else if left {
            TurnDirection::Left
        } else {
            TurnDirection::Straight
        }
    }

    fn sign(self) -> f32 {
        match self {
            TurnDirection::Straight => 0.0,
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }
}

/// Heading of the local player, advanced once per render tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationIntegrator {
    angle: f32,
    angular_velocity: f32,
}

impl RotationIntegrator {
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            angular_velocity: ROTATION_SPEED,
        }
    }

    /// `delta` is the frame-normalized tick length (1.0 at 60 fps).
    pub fn advance(&mut self, delta: f32, direction: TurnDirection) -> f32 {
        self.angle += direction.sign() * self.angular_velocity * delta;
        self.angle
    }
}

impl Default for RotationIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

/// One frame of sampled keyboard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputFrame {
    pub direction: TurnDirection,
    pub leave: bool,
    pub confirm: bool,
    pub dismiss_notice: bool,
}

/// Raw held-key state for one frame
#[derive(Debug, Clone, Copy, Default)]
struct KeySample {
    left: bool,
    right: bool,
    escape: bool,
    enter: bool,
    space: bool,
}

impl KeySample {
    fn read() -> Self {
        Self {
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            escape: is_key_down(KeyCode::Escape),
            enter: is_key_down(KeyCode::Enter),
            space: is_key_down(KeyCode::Space),
        }
    }
}

/// Samples turn keys and edge-triggered control keys from macroquad.
pub struct InputManager {
    // Previous frame key states for edge detection
    prev_escape: bool,
    prev_enter: bool,
    prev_space: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_escape: false,
            prev_enter: false,
            prev_space: false,
        }
    }

    pub fn update(&mut self) -> InputFrame {
        self.apply(KeySample::read())
    }

    fn apply(&mut self, keys: KeySample) -> InputFrame {
        let frame = InputFrame {
            direction: TurnDirection::from_keys(keys.left, keys.right),
            leave: keys.escape && !self.prev_escape,
            confirm: keys.enter && !self.prev_enter,
            dismiss_notice: keys.space && !self.prev_space,
        };

        self.prev_escape = keys.escape;
        self.prev_enter = keys.enter;
        self.prev_space = keys.space;

        frame
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_integrator_starts_at_zero() {
        let integrator = RotationIntegrator::new();
        assert_eq!(integrator.angle, 0.0);
    }

    #[test]
    fn test_integrator_turns_by_speed_times_delta() {
        let mut integrator = RotationIntegrator::new();
        integrator.advance(1.0, TurnDirection::Right);
        assert_approx_eq!(integrator.advance(2.0, TurnDirection::Right), 0.15, 1e-6);
        assert_approx_eq!(integrator.advance(1.0, TurnDirection::Left), 0.10, 1e-6);
        assert_approx_eq!(integrator.advance(5.0, TurnDirection::Straight), 0.10, 1e-6);
    }

    #[test]
    fn test_right_key_wins() {
        assert_eq!(TurnDirection::from_keys(true, true), TurnDirection::Right);
        assert_eq!(TurnDirection::from_keys(true, false), TurnDirection::Left);
        assert_eq!(
            TurnDirection::from_keys(false, false),
            TurnDirection::Straight
        );
    }

    #[test]
    fn test_control_keys_fire_once_per_press() {
        let mut input = InputManager::new();
        let escape = KeySample {
            escape: true,
            ..Default::default()
        };

        assert!(input.apply(escape).leave);
        // still held
        assert!(!input.apply(escape).leave);
        assert!(!input.apply(KeySample::default()).leave);
        assert!(input.apply(escape).leave);
    }

    #[test]
    fn test_turn_keys_are_level_triggered() {
        let mut input = InputManager::new();
        let both = KeySample {
            left: true,
            right: true,
            enter: true,
            ..Default::default()
        };

        let first = input.apply(both);
        assert_eq!(first.direction, TurnDirection::Right);
        assert!(first.confirm);

        let second = input.apply(both);
        assert_eq!(second.direction, TurnDirection::Right);
        assert!(!second.confirm);
        assert!(!second.dismiss_notice);
    }
}
