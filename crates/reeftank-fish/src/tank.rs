//! Tank environment: bounds, sinking food pellets and decorations

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::PelletId;

/// Range around a decoration's edge inside which it influences a fish
pub const DECOR_INFLUENCE: f32 = 40.0;

/// Visible tank area. The origin is the top-left corner, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankBounds {
    pub width: f32,
    pub height: f32,
}

impl TankBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Clamp a point into the tank, keeping `margin` away from every wall
    pub fn clamp_point(&self, point: Vec2, margin: f32) -> Vec2 {
        let mx = margin.min(self.width * 0.5);
        let my = margin.min(self.height * 0.5);
        Vec2::new(
            point.x.clamp(mx, self.width - mx),
            point.y.clamp(my, self.height - my),
        )
    }

    /// Centre of the tank
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for TankBounds {
    fn default() -> Self {
        Self::new(960.0, 540.0)
    }
}

/// A food pellet sinking toward the tank floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pellet {
    pub id: PelletId,
    pub position: Vec2,
    /// Sinking speed in px/s, zero once resting on the floor
    pub fall_speed: f32,
    pub radius: f32,
}

impl Pellet {
    pub const DEFAULT_FALL_SPEED: f32 = 18.0;
    pub const DEFAULT_RADIUS: f32 = 2.5;

    pub fn new(id: PelletId, position: Vec2) -> Self {
        Self {
            id,
            position,
            fall_speed: Self::DEFAULT_FALL_SPEED,
            radius: Self::DEFAULT_RADIUS,
        }
    }

    /// Sink by one step, settling on the floor
    pub fn update(&mut self, dt: f32, bounds: &TankBounds) {
        if self.fall_speed <= 0.0 {
            return;
        }
        self.position.y += self.fall_speed * dt;
        let floor = bounds.height - self.radius;
        if self.position.y >= floor {
            self.position.y = floor;
            self.fall_speed = 0.0;
        }
    }

    pub fn is_resting(&self) -> bool {
        self.fall_speed <= 0.0
    }
}

/// Kind of scenery placed in the tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorKind {
    /// Fish swim faster near plants
    Plant,
    /// Juveniles slow down near rocks
    Rock,
    /// Raises the shiny chance of fry born nearby
    Coral,
}

/// A decoration with a circular footprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorKind,
    pub position: Vec2,
    pub radius: f32,
}

impl Decoration {
    pub fn new(kind: DecorKind, position: Vec2, radius: f32) -> Self {
        Self {
            kind,
            position,
            radius: radius.max(0.0),
        }
    }
}

/// Whether any decoration of `kind` lies within `range` of `position`,
/// measured from the decoration's edge.
pub fn near_decor(decorations: &[Decoration], kind: DecorKind, position: Vec2, range: f32) -> bool {
    decorations
        .iter()
        .filter(|d| d.kind == kind)
        .any(|d| d.position.distance(position) <= d.radius + range)
}

/// Speed multiplier from nearby scenery: plants speed everyone up, rocks slow
/// juveniles down.
pub fn decor_boost(decorations: &[Decoration], position: Vec2, is_adult: bool) -> f32 {
    let mut boost = 1.0;
    if near_decor(decorations, DecorKind::Plant, position, DECOR_INFLUENCE) {
        boost += 0.2;
    }
    if !is_adult && near_decor(decorations, DecorKind::Rock, position, DECOR_INFLUENCE) {
        boost -= 0.2;
    }
    boost
}
