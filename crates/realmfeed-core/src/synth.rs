// ── Entity synthesizer ──
//
// Stand-in data source for mock mode. A `Population` holds the synthetic
// entities and evolves them one tick at a time; the `Synthesizer` wraps it
// with a cancellable cadence timer and publishes every change through the
// emitter, in exactly the shape live data uses.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::config::SynthConfig;
use crate::emitter::Emitter;
use crate::model::{AXES, Coordinate, Entity, EntityId, FeedEvent, Realm};
use crate::timer::Timer;

/// Chance per tick of retiring entities while inside the population band.
const REMOVAL_CHANCE: f64 = 0.3;
/// Chance that a walked entity changes realm.
const REALM_SHIFT_CHANCE: f64 = 0.02;
/// Spawns per tick once the floor is reached.
const BAND_SPAWNS: usize = 2;

// ── Population ───────────────────────────────────────────────────────

/// The set of synthetic entities and the randomness that drives them.
pub struct Population {
    entities: Vec<Entity>,
    rng: StdRng,
    next_seq: u64,
}

impl Population {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            entities: Vec::new(),
            rng,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Advance one tick. Returns the events describing what changed.
    ///
    /// At most `spawn_batch` upserts are produced and the population never
    /// exceeds `population_ceiling`.
    pub fn step(&mut self, config: &SynthConfig, now: DateTime<Utc>) -> Vec<FeedEvent> {
        let ceiling = config.population_ceiling;
        let floor = config.population_floor.min(ceiling);
        let budget = config.spawn_batch;
        let mut events = Vec::new();

        // Retire a few while inside the band.
        if self.len() > floor && self.rng.random_bool(REMOVAL_CHANCE) {
            let count = self.rng.random_range(1..=2).min(self.len() - floor);
            for _ in 0..count {
                let idx = self.rng.random_range(0..self.len());
                let gone = self.entities.swap_remove(idx);
                events.push(FeedEvent::EntityRemoved { id: gone.id });
            }
        }

        let room = ceiling.saturating_sub(self.len());
        let spawns = if self.len() < floor {
            budget.min(room)
        } else {
            self.rng.random_range(0..=BAND_SPAWNS).min(budget).min(room)
        };
        for _ in 0..spawns {
            let entity = self.spawn(config, now);
            events.push(FeedEvent::EntityUpsert(entity.clone()));
            self.entities.push(entity);
        }

        let walk_budget = budget - spawns;
        if walk_budget > 0 && !self.is_empty() {
            let walks = self.rng.random_range(0..=walk_budget);
            for _ in 0..walks {
                let idx = self.rng.random_range(0..self.len());
                let entity = self.walk(idx, config, now);
                events.push(FeedEvent::EntityUpsert(entity));
            }
        }

        events
    }

    /// Remove every entity, returning one removal event each.
    pub fn retire(&mut self) -> Vec<FeedEvent> {
        self.entities
            .drain(..)
            .map(|e| FeedEvent::EntityRemoved { id: e.id })
            .collect()
    }

    fn spawn(&mut self, config: &SynthConfig, now: DateTime<Utc>) -> Entity {
        self.next_seq += 1;
        let mut axes = [0.0; AXES];
        for (v, bounds) in axes.iter_mut().zip(config.domain.axes()) {
            *v = self.rng.random_range(bounds.min..=bounds.max);
        }
        Entity {
            id: EntityId::new(format!("mock-{}", self.next_seq)),
            coordinate: Coordinate(axes),
            realm: self.pick_realm(),
            updated_at: now,
        }
    }

    /// Bounded random step for the entity at `idx`, clamped to the domain.
    fn walk(&mut self, idx: usize, config: &SynthConfig, now: DateTime<Utc>) -> Entity {
        let mut axes = self.entities[idx].coordinate.0;
        for (v, bounds) in axes.iter_mut().zip(config.domain.axes()) {
            let step = bounds.span() * config.max_step_fraction;
            *v = bounds.clamp(*v + self.rng.random_range(-step..=step));
        }
        let shift = self.rng.random_bool(REALM_SHIFT_CHANCE);
        let realm = if shift { Some(self.pick_realm()) } else { None };

        let entity = &mut self.entities[idx];
        entity.coordinate = Coordinate(axes);
        if let Some(realm) = realm {
            entity.realm = realm;
        }
        entity.updated_at = now;
        entity.clone()
    }

    /// Weighted draw over [`Realm::weight`].
    fn pick_realm(&mut self) -> Realm {
        let total: u32 = Realm::iter().map(Realm::weight).sum();
        let mut roll = self.rng.random_range(0..total);
        for realm in Realm::iter() {
            if roll < realm.weight() {
                return realm;
            }
            roll -= realm.weight();
        }
        Realm::Void
    }
}

// ── Synthesizer ──────────────────────────────────────────────────────

/// Periodic producer of synthetic entity updates.
///
/// The cadence timer does not touch the population itself: it calls the
/// `wake` hook given to [`start`](Self::start) with the run's generation,
/// and the owner feeds that back into [`on_tick`](Self::on_tick) from its
/// own execution context. Wake-ups from a stopped run are ignored.
pub struct Synthesizer {
    config: SynthConfig,
    emitter: Emitter,
    population: Population,
    ticker: Option<Timer>,
    generation: u64,
}

impl Synthesizer {
    pub fn new(config: SynthConfig, emitter: Emitter) -> Self {
        let population = Population::new(config.seed);
        Self {
            config,
            emitter,
            population,
            ticker: None,
            generation: 0,
        }
    }

    /// Begin periodic production. No-op (returns `false`) if already running.
    pub fn start<W>(&mut self, wake: W) -> bool
    where
        W: Fn(u64) + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        self.generation += 1;
        let generation = self.generation;
        self.ticker = Some(Timer::every(self.config.cadence, move || wake(generation)));
        info!(
            cadence_ms = duration_ms(self.config.cadence),
            ceiling = self.config.population_ceiling,
            "synthetic feed started"
        );
        true
    }

    /// Halt production and retire the synthetic population.
    ///
    /// Safe to call when not running (returns `false`, publishes nothing).
    pub fn stop(&mut self) -> bool {
        if self.ticker.take().is_none() {
            return false;
        }
        let removals = self.population.retire();
        info!(retired = removals.len(), "synthetic feed stopped");
        for event in &removals {
            self.emitter.publish(event);
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn population(&self) -> usize {
        self.population.len()
    }

    /// Handle a wake-up. Runs one tick only if `generation` is the live run.
    pub fn on_tick(&mut self, generation: u64) -> bool {
        if !self.is_running() || generation != self.generation {
            debug!(generation, current = self.generation, "ignoring stale synth tick");
            return false;
        }
        self.tick();
        true
    }

    /// Produce and publish one tick's worth of events.
    pub fn tick(&mut self) -> usize {
        let events = self.population.step(&self.config, Utc::now());
        for event in &events {
            self.emitter.publish(event);
        }
        events.len()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── Tests ────────────────────────────────────────────────────────────
