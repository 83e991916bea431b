//! The tank simulation context
//!
//! [`World`] owns every fish, pellet and decoration together with the RNG,
//! the discovery tracker and the event sink. One call to [`World::update`]
//! advances everything by `dt` seconds:
//!
//! 1. corpses eaten away or floated out during earlier updates are dropped,
//! 2. pellets sink,
//! 3. each fish is updated in order (decide, move, eat),
//! 4. queued births join the tank.
//!
//! Despawns happen before the per-fish pass and births after it, so the pass
//! always sees a stable population and a corpse finished off in one update
//! stays visible until the next, wherever it sits in the list. Pellets are
//! removed as they are eaten.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use crate::behavior::{self, BehaviorState};
use crate::breeding::{self, RitualCheck, CORAL_RANGE, LITTER_SIZE};
use crate::error::WorldError;
use crate::feeding;
use crate::fish::Fish;
use crate::lifecycle::{self, AgeOutcome, DiscoveryTracker};
use crate::movement::{self, Steering};
use crate::snapshot::{FishRecord, FishSnapshot};
use crate::tank::{self, DecorKind, Decoration, Pellet, TankBounds};
use crate::traits::{LogEvents, TankEvents};
use crate::types::{FishId, PelletId};

/// Share of its base speed a fleeing fish is credited per second, moving or not
const MIN_FLEE_PROGRESS: f32 = 0.5;

/// Tank dimensions and population limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankSettings {
    pub width: f32,
    pub height: f32,
    /// Breeding stops and `add_fish` fails at this many fish
    pub max_population: usize,
}

impl Default for TankSettings {
    fn default() -> Self {
        let bounds = TankBounds::default();
        Self {
            width: bounds.width,
            height: bounds.height,
            max_population: 30,
        }
    }
}

/// Running totals since the world was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    pub births: u64,
    pub deaths: u64,
    pub litters: u64,
    pub despawned: u64,
    pub released: u64,
    pub max_generation: u32,
}

/// Changes collected during the per-fish pass, applied once it is over
#[derive(Default)]
struct PendingChanges {
    births: Vec<Fish>,
}

/// The fish tank
pub struct World {
    fishes: Vec<Fish>,
    pellets: Vec<Pellet>,
    decorations: Vec<Decoration>,
    bounds: TankBounds,
    max_population: usize,
    discoveries: DiscoveryTracker,
    rng: Xoshiro256StarStar,
    events: Box<dyn TankEvents>,
    tick: u64,
    next_pellet_id: u64,
    stats: WorldStats,
}

impl World {
    /// Empty tank seeded from the thread RNG
    pub fn new(settings: TankSettings) -> Self {
        Self::from_rng(settings, Xoshiro256StarStar::from_rng(&mut rand::rng()))
    }

    /// Empty tank with a reproducible RNG
    pub fn with_seed(settings: TankSettings, seed: u64) -> Self {
        Self::from_rng(settings, Xoshiro256StarStar::seed_from_u64(seed))
    }

    fn from_rng(settings: TankSettings, rng: Xoshiro256StarStar) -> Self {
        Self {
            fishes: Vec::new(),
            pellets: Vec::new(),
            decorations: Vec::new(),
            bounds: TankBounds::new(settings.width, settings.height),
            max_population: settings.max_population,
            discoveries: DiscoveryTracker::new(),
            rng,
            events: Box::new(LogEvents),
            tick: 0,
            next_pellet_id: 1,
            stats: WorldStats::default(),
        }
    }

    /// Replace the event sink
    pub fn with_events(mut self, events: impl TankEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn bounds(&self) -> TankBounds {
        self.bounds
    }

    /// Change the tank size. Fish and pellets are pulled back inside.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = TankBounds::new(width, height);
        for fish in &mut self.fishes {
            fish.position = self.bounds.clamp_point(fish.position, fish.size * 0.5);
            if let Some(drift) = &mut fish.newborn {
                drift.origin = self.bounds.clamp_point(drift.origin, fish.size * 0.5);
                drift.destination = self.bounds.clamp_point(drift.destination, fish.size * 0.5);
            }
            fish.wander_target = None;
        }
        for pellet in &mut self.pellets {
            pellet.position = self.bounds.clamp_point(pellet.position, pellet.radius);
            if pellet.is_resting() {
                // Settle on the new floor
                pellet.position.y = self.bounds.height - pellet.radius;
            }
        }
        log::info!("Tank resized to {}x{}", self.bounds.width, self.bounds.height);
    }

    pub fn max_population(&self) -> usize {
        self.max_population
    }

    pub fn set_max_population(&mut self, max_population: usize) {
        self.max_population = max_population;
    }

    /// Add a fish, clamped into the tank. Fails when the tank is full.
    pub fn add_fish(&mut self, mut fish: Fish) -> Result<FishId, WorldError> {
        if self.fishes.len() >= self.max_population {
            return Err(WorldError::PopulationFull {
                limit: self.max_population,
            });
        }
        fish.position = self.bounds.clamp_point(fish.position, fish.size * 0.5);
        let id = fish.id;
        log::info!("Added {} ({:?}, gen {})", id, fish.sex, fish.generation);
        self.admit(fish);
        Ok(id)
    }

    /// Fill the tank with up to `count` random fish. Returns how many were added.
    pub fn seed_population(&mut self, count: usize) -> usize {
        let mut added = 0;
        for _ in 0..count {
            let position = Vec2::new(
                self.rng.random_range(0.0..=self.bounds.width),
                self.rng.random_range(0.0..=self.bounds.height),
            );
            let fish = Fish::random(position, &mut self.rng);
            if self.add_fish(fish).is_err() {
                break;
            }
            added += 1;
        }
        log::info!("Seeded {} fish", added);
        added
    }

    /// Take a fish out of the tank. A partner left mid-ritual falls back to
    /// wandering on its next update.
    pub fn remove_fish(&mut self, id: FishId) -> Result<Fish, WorldError> {
        let idx = self
            .index_of(id)
            .ok_or(WorldError::UnknownFish(id))?;
        let fish = self.fishes.remove(idx);
        self.stats.released += 1;
        log::info!("Released {}", id);
        Ok(fish)
    }

    /// Drop a pellet at `position`. It sinks from there.
    pub fn drop_pellet(&mut self, position: Vec2) -> PelletId {
        let id = PelletId(self.next_pellet_id);
        self.next_pellet_id += 1;
        let position = Vec2::new(
            position.x.clamp(0.0, self.bounds.width),
            position.y.clamp(0.0, self.bounds.height - Pellet::DEFAULT_RADIUS),
        );
        self.pellets.push(Pellet::new(id, position));
        id
    }

    pub fn add_decoration(&mut self, decoration: Decoration) {
        self.decorations.push(decoration);
    }

    pub fn get(&self, id: FishId) -> Option<&Fish> {
        self.fishes.iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, id: FishId) -> Option<&mut Fish> {
        self.fishes.iter_mut().find(|f| f.id == id)
    }

    pub fn fish(&self) -> &[Fish] {
        &self.fishes
    }

    pub fn pellets(&self) -> &[Pellet] {
        &self.pellets
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Number of fish in the tank, corpses included
    pub fn count(&self) -> usize {
        self.fishes.len()
    }

    pub fn living_count(&self) -> usize {
        self.fishes.iter().filter(|f| !f.is_dead()).count()
    }

    /// Whether the population leaves room for another litter
    pub fn can_breed(&self) -> bool {
        self.fishes.len() < self.max_population
    }

    pub fn discoveries(&self) -> &DiscoveryTracker {
        &self.discoveries
    }

    pub fn stats(&self) -> &WorldStats {
        &self.stats
    }

    /// Number of completed updates
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn snapshots(&self) -> Vec<FishSnapshot> {
        self.fishes.iter().map(FishSnapshot::from).collect()
    }

    pub fn records(&self) -> Vec<FishRecord> {
        self.fishes.iter().map(FishRecord::from).collect()
    }

    /// Replace the population with loaded records. Returns the new count.
    pub fn load_records(&mut self, records: Vec<FishRecord>) -> usize {
        self.fishes.clear();
        for record in records {
            let mut fish = record.into_fish(&mut self.rng);
            fish.position = self.bounds.clamp_point(fish.position, fish.size * 0.5);
            self.admit(fish);
        }
        log::info!("Loaded {} fish", self.fishes.len());
        self.fishes.len()
    }

    fn admit(&mut self, fish: Fish) {
        if self.discoveries.record(fish.genes.pattern, fish.genes.fin) {
            log::debug!(
                "Discovered {:?} with {:?} fins",
                fish.genes.pattern,
                fish.genes.fin
            );
        }
        self.stats.max_generation = self.stats.max_generation.max(fish.generation);
        self.fishes.push(fish);
    }

    fn index_of(&self, id: FishId) -> Option<usize> {
        self.fishes.iter().position(|f| f.id == id)
    }

    /// Advance the whole tank by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.tick += 1;

        self.despawn_expired();

        for pellet in &mut self.pellets {
            pellet.update(dt, &self.bounds);
        }

        let mut pending = PendingChanges::default();
        for idx in 0..self.fishes.len() {
            self.update_fish(idx, dt, &mut pending);
        }

        for mut fry in pending.births {
            let margin = fry.size * 0.5;
            fry.position = self.bounds.clamp_point(fry.position, margin);
            if let Some(drift) = &mut fry.newborn {
                drift.origin = self.bounds.clamp_point(drift.origin, margin);
                drift.destination = self.bounds.clamp_point(drift.destination, margin);
            }
            self.stats.births += 1;
            self.admit(fry);
        }
    }

    fn despawn_expired(&mut self) {
        let stats = &mut self.stats;
        self.fishes.retain(|fish| {
            if lifecycle::corpse_expired(fish) {
                stats.despawned += 1;
                log::info!("Despawned {}", fish.id);
                false
            } else {
                true
            }
        });
    }

    fn update_fish(&mut self, idx: usize, dt: f32, pending: &mut PendingChanges) {
        let tick = self.tick;
        let fish = &mut self.fishes[idx];

        if fish.is_dead() {
            lifecycle::float_corpse(fish, dt);
            return;
        }

        fish.tick_timers(dt);
        if fish.newborn.is_some() {
            movement::drift_newborn(fish, dt);
            return;
        }
        if lifecycle::check_age(fish) == AgeOutcome::Died {
            self.stats.deaths += 1;
            return;
        }
        breeding::tick_ritual(fish, tick, dt);
        if matches!(fish.state, BehaviorState::Flee { .. }) && !fish.state.is_fleeing() {
            fish.state = BehaviorState::Wander;
        }

        let steering = match fish.state {
            BehaviorState::Flee { from, .. } => {
                Steering::toward(behavior::flee_target(fish, from, &self.bounds))
            }
            BehaviorState::Ritual { .. } => match self.ritual_steering(idx, dt, pending) {
                Some(steering) => steering,
                None => return,
            },
            _ => self.decide(idx, dt),
        };

        let fish = &mut self.fishes[idx];
        let boost = tank::decor_boost(&self.decorations, fish.position, fish.is_adult());
        let moved = movement::integrate(fish, &steering, &self.bounds, boost, dt);
        // A fish pinned by a wall still uses up its flight
        let min_progress = movement::base_speed(fish) * MIN_FLEE_PROGRESS * dt;
        if let BehaviorState::Flee { remaining, .. } = &mut fish.state {
            *remaining -= moved.max(min_progress);
            if *remaining <= 0.0 {
                fish.state = BehaviorState::Wander;
            }
        }

        self.feed(idx);
    }

    /// Validate and steer an ongoing ritual. Returns `None` when the fish is
    /// done for this tick: the ritual completed or its deferred death applied.
    fn ritual_steering(
        &mut self,
        idx: usize,
        dt: f32,
        pending: &mut PendingChanges,
    ) -> Option<Steering> {
        match breeding::check_ritual(idx, &self.fishes) {
            RitualCheck::Continue { partner_position } => {
                let fish = &self.fishes[idx];
                let target = (fish.position.distance(partner_position) > fish.size)
                    .then_some(partner_position);
                Some(Steering {
                    target,
                    face: Some(partner_position),
                })
            }
            RitualCheck::Abort { release_partner } => {
                if release_partner {
                    if let Some(partner) = self.fishes[idx]
                        .ritual_partner()
                        .and_then(|id| self.index_of(id))
                    {
                        self.leave_ritual(partner);
                    }
                }
                self.leave_ritual(idx);
                let fish = &mut self.fishes[idx];
                if fish.is_dead() {
                    return None;
                }
                Some(Steering::toward(behavior::wander_target(
                    fish,
                    &self.bounds,
                    dt,
                    &mut self.rng,
                )))
            }
            RitualCheck::Complete { partner } => {
                self.complete_ritual(idx, partner, pending);
                None
            }
        }
    }

    /// Drop out of a broken ritual, honoring a death deferred during it
    fn leave_ritual(&mut self, idx: usize) {
        let fish = &mut self.fishes[idx];
        breeding::abort_ritual(fish);
        if fish.die_after_ritual {
            lifecycle::die(fish);
            self.stats.deaths += 1;
        }
    }

    /// Pair up, or pick food, a mate or a wander point
    fn decide(&mut self, idx: usize, dt: f32) -> Steering {
        let allow_mating = self.can_breed();

        if allow_mating {
            if let Some(partner) = breeding::find_trigger_partner(idx, &self.fishes) {
                let tick = self.tick;
                let (me, other) = pair_mut(&mut self.fishes, idx, partner);
                breeding::pair(me, other, tick);
                return Steering {
                    target: None,
                    face: Some(other.position),
                };
            }
        }

        let choice = behavior::select_target(
            idx,
            &self.fishes,
            &self.pellets,
            allow_mating,
            &mut self.rng,
        );
        let fish = &mut self.fishes[idx];
        fish.state = choice.state;
        let target = match choice.target {
            Some(target) => target,
            None => behavior::wander_target(fish, &self.bounds, dt, &mut self.rng),
        };
        Steering::toward(target)
    }

    /// Female side of a finished ritual: spawn the litter, reset both parents
    fn complete_ritual(&mut self, mother: usize, father: usize, pending: &mut PendingChanges) {
        let has_room = self.fishes.len() + pending.births.len() < self.max_population;
        if has_room {
            let (m, f) = (&self.fishes[mother], &self.fishes[father]);
            let midpoint = (m.position + f.position) * 0.5;
            let coral = tank::near_decor(&self.decorations, DecorKind::Coral, midpoint, CORAL_RANGE);
            let litter = breeding::breed(m, f, coral, &mut self.rng);
            let name = m.name.clone().unwrap_or_else(|| m.id.to_string());
            log::info!(
                "{} and {} had {} fry (gen {})",
                m.id,
                f.id,
                litter.len(),
                litter.first().map(|fry| fry.generation).unwrap_or_default()
            );
            pending.births.extend(litter);
            self.stats.litters += 1;
            self.events.generation_advanced();
            self.events.toast(&format!("{} had {} babies!", name, LITTER_SIZE));
        } else {
            log::warn!(
                "Tank full ({} fish), no litter from {}",
                self.max_population,
                self.fishes[mother].id
            );
        }

        for idx in [mother, father] {
            let parent = &mut self.fishes[idx];
            breeding::finish_ritual(parent);
            if parent.die_after_ritual {
                lifecycle::die(parent);
                self.stats.deaths += 1;
            }
        }
    }

    /// Eat a pellet in reach, otherwise bite a corpse in reach
    fn feed(&mut self, idx: usize) {
        if !feeding::can_eat(&self.fishes[idx]) {
            return;
        }
        if let Some(p) = feeding::pellet_in_reach(&self.fishes[idx], &self.pellets) {
            let pellet = self.pellets.remove(p);
            let fish = &mut self.fishes[idx];
            feeding::eat_pellet(fish);
            log::trace!("{} ate {}", fish.id, pellet.id);
        } else if let Some(c) = feeding::corpse_in_reach(idx, &self.fishes) {
            let (eater, corpse) = pair_mut(&mut self.fishes, idx, c);
            if feeding::bite_corpse(eater, corpse) {
                log::trace!("{} bit {}", eater.id, corpse.id);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(TankSettings::default())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("fish", &self.fishes.len())
            .field("pellets", &self.pellets.len())
            .field("decorations", &self.decorations.len())
            .field("bounds", &self.bounds)
            .field("tick", &self.tick)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Two distinct fish borrowed mutably at once
fn pair_mut(fishes: &mut [Fish], a: usize, b: usize) -> (&mut Fish, &mut Fish) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = fishes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = fishes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::{FishOverrides, ADULT_AGE};
    use crate::types::Sex;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn world() -> World {
        World::with_seed(
            TankSettings {
                width: 400.0,
                height: 300.0,
                max_population: 10,
            },
            7,
        )
        .with_events(crate::traits::NoEvents)
    }

    fn adult(world: &mut World, sex: Sex, position: Vec2) -> FishId {
        let fish = Fish::spawn(
            FishOverrides {
                sex: Some(sex),
                position: Some(position),
                birth_size: Some(8.0),
                max_size: Some(24.0),
                size: Some(20.0),
                age: Some(ADULT_AGE + 1.0),
                max_age: Some(10_000.0),
                ..Default::default()
            },
            &mut world.rng,
        );
        world.add_fish(fish).expect("room in tank")
    }

    #[derive(Default)]
    struct Recorder {
        generations: Rc<RefCell<u32>>,
        toasts: Rc<RefCell<Vec<String>>>,
    }

    impl TankEvents for Recorder {
        fn generation_advanced(&mut self) {
            *self.generations.borrow_mut() += 1;
        }

        fn toast(&mut self, message: &str) {
            self.toasts.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_add_fish_respects_limit() {
        let mut world = world();
        assert_eq!(world.seed_population(25), 10);
        assert_eq!(world.count(), 10);
        assert!(!world.can_breed());
        let extra = Fish::random(Vec2::ZERO, &mut world.rng);
        assert_eq!(
            world.add_fish(extra),
            Err(WorldError::PopulationFull { limit: 10 })
        );
    }

    #[test]
    fn test_remove_unknown_fish() {
        let mut world = world();
        let id = FishId::next();
        assert_eq!(world.remove_fish(id).err(), Some(WorldError::UnknownFish(id)));
    }

    #[test]
    fn test_remove_fish_releases_it() {
        let mut world = world();
        let id = adult(&mut world, Sex::Male, Vec2::new(50.0, 50.0));
        let released = world.remove_fish(id).expect("fish exists");
        assert_eq!(released.id, id);
        assert!(world.get(id).is_none());
        assert_eq!(world.stats().released, 1);
    }

    #[test]
    fn test_pellets_get_increasing_ids_and_sink() {
        let mut world = world();
        let a = world.drop_pellet(Vec2::new(100.0, -50.0));
        let b = world.drop_pellet(Vec2::new(120.0, 10.0));
        assert!(b.0 > a.0);
        assert_eq!(world.pellets()[0].position.y, 0.0);
        world.update(1.0);
        assert!(world.pellets()[1].position.y > 10.0);
    }

    #[test]
    fn test_resize_keeps_fish_inside() {
        let mut world = world();
        let id = adult(&mut world, Sex::Female, Vec2::new(390.0, 290.0));
        world.resize(200.0, 100.0);
        let fish = world.get(id).expect("fish exists");
        assert!(fish.position.x <= 200.0 - fish.size * 0.5);
        assert!(fish.position.y <= 100.0 - fish.size * 0.5);
    }

    #[test]
    fn test_litter_fires_events_once() {
        let recorder = Recorder::default();
        let generations = Rc::clone(&recorder.generations);
        let toasts = Rc::clone(&recorder.toasts);
        let mut world = world().with_events(recorder);

        let male = adult(&mut world, Sex::Male, Vec2::new(100.0, 100.0));
        let female = adult(&mut world, Sex::Female, Vec2::new(110.0, 100.0));
        world.get_mut(male).expect("male").genes.sense = 9;
        world.get_mut(female).expect("female").genes.sense = 9;

        world.update(0.1);
        for id in [male, female] {
            if let Some(BehaviorState::Ritual { timer, .. }) =
                world.get_mut(id).map(|f| &mut f.state)
            {
                *timer = 0.0;
            }
        }
        world.update(0.1);

        assert_eq!(world.count(), 2 + LITTER_SIZE);
        assert_eq!(*generations.borrow(), 1);
        assert_eq!(toasts.borrow().len(), 1);
        assert_eq!(world.stats().litters, 1);
        assert_eq!(world.stats().births, LITTER_SIZE as u64);
        assert_eq!(world.stats().max_generation, 1);
    }

    #[test]
    fn test_full_tank_suppresses_litter() {
        let mut world = world();
        world.set_max_population(2);
        let male = adult(&mut world, Sex::Male, Vec2::new(100.0, 100.0));
        let female = adult(&mut world, Sex::Female, Vec2::new(110.0, 100.0));
        for id in [male, female] {
            world.get_mut(id).expect("fish").genes.sense = 9;
        }
        // No pairing can start while the tank is full
        world.update(0.1);
        assert!(world.get(male).and_then(Fish::ritual_partner).is_none());
        assert_eq!(world.count(), 2);
    }

    #[test]
    fn test_discoveries_include_offspring() {
        let mut world = world();
        let mut fish = Fish::random(Vec2::new(100.0, 100.0), &mut world.rng);
        fish.genes.pattern = crate::genetics::PatternType::Marble;
        fish.genes.fin = crate::genetics::FinShape::Veil;
        world.add_fish(fish).expect("room");
        assert!(world
            .discoveries()
            .contains(crate::genetics::PatternType::Marble, crate::genetics::FinShape::Veil));
        assert_eq!(world.discoveries().len(), 1);
    }

    #[test]
    fn test_records_round_trip_through_world() {
        let mut world = world();
        world.seed_population(4);
        let records = world.records();
        let ids: Vec<FishId> = world.fish().iter().map(|f| f.id).collect();

        let mut other = World::with_seed(TankSettings::default(), 99);
        assert_eq!(other.load_records(records), 4);
        let loaded: Vec<FishId> = other.fish().iter().map(|f| f.id).collect();
        assert_eq!(loaded, ids);
        assert_eq!(other.snapshots().len(), 4);
    }
}
