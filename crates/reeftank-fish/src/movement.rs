//! Movement integrator
//!
//! Kinematic steering, no physics engine: the chosen target becomes a nudge
//! plus a blend toward a desired velocity, then the velocity is clamped,
//! vertically damped and integrated. Tank walls clamp the position and
//! reflect the offending velocity axis.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorState;
use crate::fish::Fish;
use crate::tank::TankBounds;

/// Reference frame rate the per-tick tuning constants were authored at
const REFERENCE_FPS: f32 = 60.0;
/// Distance to a food target below which the fish lunges
pub const TURBO_RANGE: f32 = 15.0;
const TURBO_SPEED: f32 = 2.5;
/// Share of the base speed a fish may actually reach
const CRUISE_FRACTION: f32 = 0.8;
/// Desired vertical speed is scaled by this so swimming reads horizontal
const VERTICAL_BIAS: f32 = 0.6;
/// Length of the post-hatch drift (seconds)
pub const NEWBORN_DRIFT_SECS: f32 = 1.5;

/// Per-state steering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub speed_multiplier: f32,
    /// Direct nudge per point of the speed gene
    pub seek_factor: f32,
    /// Velocity alignment rate toward the desired velocity (1/s)
    pub align_rate: f32,
    /// Vertical velocity damping (1/s)
    pub vertical_damping: f32,
}

impl MotionProfile {
    pub fn for_state(state: &BehaviorState) -> Self {
        match state {
            BehaviorState::Wander | BehaviorState::Dead(_) => Self {
                speed_multiplier: 1.0,
                seek_factor: 0.15,
                align_rate: 1.5,
                vertical_damping: 3.0,
            },
            BehaviorState::SeekFood(_) => Self {
                speed_multiplier: 1.3,
                seek_factor: 0.20,
                align_rate: 4.0,
                vertical_damping: 1.0,
            },
            BehaviorState::SeekMate(_) => Self {
                speed_multiplier: 1.15,
                seek_factor: 0.17,
                align_rate: 3.0,
                vertical_damping: 1.0,
            },
            BehaviorState::Ritual { .. } => Self {
                speed_multiplier: 0.6,
                seek_factor: 0.15,
                align_rate: 2.5,
                vertical_damping: 1.5,
            },
            BehaviorState::Flee { .. } => Self {
                speed_multiplier: 1.6,
                seek_factor: 0.15,
                align_rate: 6.0,
                vertical_damping: 0.6,
            },
        }
    }
}

/// Where to steer and, optionally, what to look at instead of the velocity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    pub target: Option<Vec2>,
    pub face: Option<Vec2>,
}

impl Steering {
    pub fn toward(target: Vec2) -> Self {
        Self {
            target: Some(target),
            face: None,
        }
    }
}

/// `(20 + speed * 10) * state multiplier`
pub fn base_speed(fish: &Fish) -> f32 {
    let profile = MotionProfile::for_state(&fish.state);
    (20.0 + f32::from(fish.genes.speed) * 10.0) * profile.speed_multiplier
}

/// Advance position and velocity by one step. Returns the distance travelled.
pub fn integrate(
    fish: &mut Fish,
    steering: &Steering,
    bounds: &TankBounds,
    decor_boost: f32,
    dt: f32,
) -> f32 {
    let profile = MotionProfile::for_state(&fish.state);
    let mut speed = base_speed(fish);

    if let Some(target) = steering.target {
        let to_target = target - fish.position;
        let distance = to_target.length();
        if let Some(dir) = to_target.try_normalize() {
            let turbo = matches!(fish.state, BehaviorState::SeekFood(_)) && distance < TURBO_RANGE;
            if turbo {
                speed *= TURBO_SPEED;
            }

            fish.velocity += dir * f32::from(fish.genes.speed) * profile.seek_factor * dt * REFERENCE_FPS;

            let mut desired = dir * speed;
            desired.y *= VERTICAL_BIAS;
            let blend = if turbo { 1.0 } else { (profile.align_rate * dt).min(1.0) };
            fish.velocity = fish.velocity.lerp(desired, blend);
        }
    }

    fish.velocity.y *= (1.0 - profile.vertical_damping * dt).max(0.0);
    fish.velocity = fish
        .velocity
        .clamp_length_max(speed * CRUISE_FRACTION * decor_boost.max(0.0));

    let start = fish.position;
    fish.position += fish.velocity * dt;
    contain(fish, bounds);

    let facing = steering
        .face
        .map(|point| point - fish.position)
        .unwrap_or(fish.velocity);
    if let Some(heading) = facing.try_normalize() {
        fish.heading = heading;
    }

    fish.position.distance(start)
}

/// Keep the fish inside the tank, flipping velocity on the axis that hit a wall
pub fn contain(fish: &mut Fish, bounds: &TankBounds) {
    let margin = fish.size * 0.5;
    let clamped = bounds.clamp_point(fish.position, margin);
    if clamped.x != fish.position.x {
        fish.velocity.x = -fish.velocity.x;
    }
    if clamped.y != fish.position.y {
        fish.velocity.y = -fish.velocity.y;
    }
    fish.position = clamped;
}

/// Post-hatch drift: physics is frozen while the fry eases away from its
/// birth point, then it is released to normal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewbornDrift {
    pub origin: Vec2,
    pub destination: Vec2,
    pub elapsed: f32,
    pub duration: f32,
}

impl NewbornDrift {
    pub fn new(origin: Vec2, destination: Vec2) -> Self {
        Self {
            origin,
            destination,
            elapsed: 0.0,
            duration: NEWBORN_DRIFT_SECS,
        }
    }

    /// Eased position at the current elapsed time
    pub fn position(&self) -> Vec2 {
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = 1.0 - (1.0 - t).powi(3);
        self.origin.lerp(self.destination, eased)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Advance a newborn's drift. Returns true while the drift is still running.
pub fn drift_newborn(fish: &mut Fish, dt: f32) -> bool {
    let Some(drift) = fish.newborn.as_mut() else {
        return false;
    };
    drift.elapsed += dt;
    let position = drift.position();
    let direction = drift.destination - drift.origin;
    let finished = drift.is_finished();

    fish.position = position;
    fish.velocity = Vec2::ZERO;
    if let Some(heading) = direction.try_normalize() {
        fish.heading = heading;
    }
    if finished {
        fish.newborn = None;
        // Leave with a little momentum along the drift
        fish.velocity = fish.heading * 10.0;
    }
    !finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::FoodTarget;
    use crate::fish::FishOverrides;
    use crate::types::PelletId;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn fish_at(position: Vec2) -> Fish {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let mut fish = Fish::spawn(
            FishOverrides {
                position: Some(position),
                birth_size: Some(8.0),
                max_size: Some(20.0),
                ..Default::default()
            },
            &mut rng,
        );
        fish.genes.speed = 5;
        fish
    }

    #[test]
    fn test_base_speed_per_state() {
        let mut fish = fish_at(Vec2::ZERO);
        assert_eq!(base_speed(&fish), 70.0);
        fish.state = BehaviorState::Flee {
            from: Vec2::ZERO,
            remaining: 10.0,
        };
        assert!((base_speed(&fish) - 112.0).abs() < 1e-4);
    }

    #[test]
    fn test_velocity_is_clamped() {
        let bounds = TankBounds::new(1000.0, 1000.0);
        let mut fish = fish_at(Vec2::new(500.0, 500.0));
        fish.velocity = Vec2::new(1000.0, 0.0);
        integrate(&mut fish, &Steering::default(), &bounds, 1.0, 0.016);
        assert!(fish.velocity.length() <= 70.0 * CRUISE_FRACTION + 1e-3);
    }

    #[test]
    fn test_moves_toward_target() {
        let bounds = TankBounds::new(1000.0, 1000.0);
        let mut fish = fish_at(Vec2::new(500.0, 500.0));
        for _ in 0..30 {
            integrate(
                &mut fish,
                &Steering::toward(Vec2::new(800.0, 500.0)),
                &bounds,
                1.0,
                1.0 / 60.0,
            );
        }
        assert!(fish.position.x > 500.0);
        assert!(fish.heading.x > 0.9);
    }

    #[test]
    fn test_turbo_near_food() {
        let bounds = TankBounds::new(1000.0, 1000.0);
        let mut fish = fish_at(Vec2::new(500.0, 500.0));
        fish.state = BehaviorState::SeekFood(FoodTarget::Pellet(PelletId(1)));
        integrate(
            &mut fish,
            &Steering::toward(Vec2::new(510.0, 500.0)),
            &bounds,
            1.0,
            1.0 / 60.0,
        );
        // Alignment is instant and the cap is lifted beyond the normal cruise speed
        let cruise_cap = base_speed(&fish) * CRUISE_FRACTION;
        assert!(fish.velocity.length() > cruise_cap);
    }

    #[test]
    fn test_walls_reflect_velocity() {
        let bounds = TankBounds::new(200.0, 200.0);
        let mut fish = fish_at(Vec2::new(195.0, 100.0));
        fish.velocity = Vec2::new(50.0, 0.0);
        integrate(&mut fish, &Steering::default(), &bounds, 1.0, 0.5);
        assert!(fish.position.x <= 200.0 - fish.size * 0.5);
        assert!(fish.velocity.x < 0.0);
    }

    #[test]
    fn test_vertical_damping() {
        let bounds = TankBounds::new(1000.0, 1000.0);
        let mut fish = fish_at(Vec2::new(500.0, 500.0));
        fish.velocity = Vec2::new(0.0, 40.0);
        integrate(&mut fish, &Steering::default(), &bounds, 1.0, 0.1);
        assert!(fish.velocity.y < 40.0 * 0.8);
    }

    #[test]
    fn test_face_overrides_heading() {
        let bounds = TankBounds::new(1000.0, 1000.0);
        let mut fish = fish_at(Vec2::new(500.0, 500.0));
        fish.velocity = Vec2::new(30.0, 0.0);
        let steering = Steering {
            target: None,
            face: Some(Vec2::new(400.0, 500.0)),
        };
        integrate(&mut fish, &steering, &bounds, 1.0, 0.016);
        assert!(fish.heading.x < -0.9);
    }

    #[test]
    fn test_newborn_drift_completes() {
        let mut fish = fish_at(Vec2::new(100.0, 100.0));
        fish.newborn = Some(NewbornDrift::new(Vec2::new(100.0, 100.0), Vec2::new(70.0, 100.0)));
        let mut steps = 0;
        while drift_newborn(&mut fish, 0.1) {
            steps += 1;
            assert_eq!(fish.velocity, Vec2::ZERO);
            assert!(fish.position.x <= 100.0 && fish.position.x >= 70.0);
        }
        assert!(steps >= 13);
        assert!(fish.newborn.is_none());
        assert!((fish.position.x - 70.0).abs() < 1e-3);
        assert!(fish.heading.x < 0.0);
    }
}
