use crate::atom::{Atom, AtomId, AtomSeed};
use crate::error::{EngineError, Result};
use crate::grid::UniformGrid;
use gas_atoms_common::{clamp, BroadPhase, EngineParams, Frame, InteractionState, Vec2};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Summary of one `apply_interaction` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionOutcome {
    /// State whose profile was applied.
    pub previous: InteractionState,
    /// State the engine is in now.
    pub state: InteractionState,
    pub speed_multiplier: f32,
    /// Atoms whose velocity now points at the tap.
    pub retargeted: usize,
    /// Atoms sitting exactly on the tap point; their velocity was left unchanged.
    pub degenerate: usize,
    /// The tap point was NaN or infinite, so no atom was retargeted.
    pub invalid_point: bool,
}

/// Owns the atom population and advances it one tick at a time.
///
/// All randomness (placement, initial velocities, tap colors) comes from the
/// injected RNG, so two engines built from the same seed evolve identically.
/// Operations take `&mut self`; a driver dispatching from several threads must
/// serialize access itself.
pub struct Engine<R: Rng = StdRng> {
    params: EngineParams,
    atoms: Vec<Atom>,
    width: f32,
    height: f32,
    state: InteractionState,
    speed_multiplier: f32,
    tick: u64,
    next_id: u64,
    grid: Option<UniformGrid>,
    rng: R,
}

impl Engine<StdRng> {
    /// Creates an engine whose RNG is a `StdRng` seeded from `seed`.
    pub fn seeded(seed: u64, params: EngineParams) -> Result<Self> {
        Self::with_rng(StdRng::seed_from_u64(seed), params)
    }
}

impl<R: Rng> Engine<R> {
    /// Creates an empty engine. Call [`Engine::reset`] to bind an arena and seed atoms.
    pub fn with_rng(rng: R, params: EngineParams) -> Result<Self> {
        let radius = params.atom_radius;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "atom radius must be positive, got {radius}"
            )));
        }
        if let BroadPhase::UniformGrid { cell_size } = params.broad_phase {
            if !(cell_size.is_finite() && cell_size >= 2.0 * radius) {
                return Err(EngineError::InvalidConfiguration(format!(
                    "grid cell size {cell_size} is smaller than an atom diameter ({})",
                    2.0 * radius
                )));
            }
        }

        Ok(Engine {
            params,
            atoms: Vec::new(),
            width: 0.0,
            height: 0.0,
            state: InteractionState::Initial,
            speed_multiplier: 1.0,
            tick: 0,
            next_id: 0,
            grid: None,
            rng,
        })
    }

    /// Discards all atoms and seeds `count` new ones at uniformly random positions in
    /// `[0, width] x [0, height]` with velocity components in `[-1, 1]`.
    ///
    /// Positions are not clamped here; the first [`Engine::advance`] does that.
    pub fn reset(&mut self, width: f32, height: f32, count: usize) -> Result<()> {
        self.check_arena(width, height)?;
        let grid = self.build_grid(width, height)?;

        let mut seeds = Vec::with_capacity(count);
        for _ in 0..count {
            let position = Vec2::new(
                self.rng.random_range(0.0..=width),
                self.rng.random_range(0.0..=height),
            );
            let velocity = Vec2::new(
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
            );
            seeds.push(AtomSeed { position, velocity });
        }
        self.install(width, height, seeds, grid);
        Ok(())
    }

    /// Like [`Engine::reset`], but with explicit starting positions and velocities.
    pub fn reset_with_atoms(&mut self, width: f32, height: f32, seeds: Vec<AtomSeed>) -> Result<()> {
        self.check_arena(width, height)?;
        if let Some(idx) = seeds
            .iter()
            .position(|s| !(s.position.is_finite() && s.velocity.is_finite()))
        {
            return Err(EngineError::InvalidConfiguration(format!(
                "atom seed {idx} has a non-finite position or velocity"
            )));
        }
        let grid = self.build_grid(width, height)?;
        self.install(width, height, seeds, grid);
        Ok(())
    }

    fn check_arena(&self, width: f32, height: f32) -> Result<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "arena must have positive finite size, got {width}x{height}"
            )));
        }
        let diameter = 2.0 * self.params.atom_radius;
        if width < diameter || height < diameter {
            return Err(EngineError::InvalidConfiguration(format!(
                "arena {width}x{height} is smaller than one atom diameter ({diameter})"
            )));
        }
        Ok(())
    }

    fn build_grid(&self, width: f32, height: f32) -> Result<Option<UniformGrid>> {
        match self.params.broad_phase {
            BroadPhase::BruteForce => Ok(None),
            BroadPhase::UniformGrid { cell_size } => UniformGrid::new(cell_size, width, height).map(Some),
        }
    }

    fn install(&mut self, width: f32, height: f32, seeds: Vec<AtomSeed>, grid: Option<UniformGrid>) {
        self.width = width;
        self.height = height;
        self.state = InteractionState::Initial;
        self.speed_multiplier = 1.0;
        self.tick = 0;

        let radius = self.params.atom_radius;
        self.atoms.clear();
        self.atoms.reserve(seeds.len());
        for seed in seeds {
            let id = AtomId(self.next_id);
            self.next_id += 1;
            self.atoms.push(Atom::new(id, seed.position, seed.velocity, radius));
        }

        self.grid = grid;

        info!(
            "Engine reset: {} atoms in a {:.1}x{:.1} arena (radius {:.1}, broad phase {:?}).",
            self.atoms.len(),
            width,
            height,
            radius,
            self.params.broad_phase
        );
    }

    /// Runs one physics tick: integrate and bounce every atom, then resolve collisions.
    pub fn advance(&mut self) {
        let multiplier = self.speed_multiplier;
        let (width, height) = (self.width, self.height);
        for atom in &mut self.atoms {
            atom.position += atom.velocity * multiplier;
            let radius = atom.radius();
            bounce_axis(&mut atom.position.x, &mut atom.velocity.x, radius, width);
            bounce_axis(&mut atom.position.y, &mut atom.velocity.y, radius, height);
        }

        let swaps = self.resolve_collisions();
        self.tick += 1;
        trace!("Tick {} done: {} velocity swaps.", self.tick, swaps);
    }

    // Single pass over pairs in (i, j) order; later pairs see earlier swaps.
    fn resolve_collisions(&mut self) -> usize {
        let mut swaps = 0;
        match self.grid.as_mut() {
            None => {
                let n = self.atoms.len();
                for i in 0..n {
                    for j in (i + 1)..n {
                        if collide_pair(&mut self.atoms, i, j) {
                            swaps += 1;
                        }
                    }
                }
            }
            Some(grid) => {
                let positions: Vec<Vec2> = self.atoms.iter().map(|a| a.position).collect();
                grid.rebuild(positions.iter().copied());
                for (i, j) in grid.candidate_pairs(&positions) {
                    if collide_pair(&mut self.atoms, i, j) {
                        swaps += 1;
                    }
                }
            }
        }
        swaps
    }

    /// Handles one tap at `point` (arena coordinates).
    ///
    /// Applies the profile of the current state, moves to the successor state, and
    /// points every atom at the tap with speed equal to the new multiplier. Atoms
    /// located exactly on the tap keep their velocity; they still get a new color.
    /// A non-finite `point` still advances the cycle and recolors, but aims nothing.
    pub fn apply_interaction(&mut self, point: Vec2) -> InteractionOutcome {
        let previous = self.state;
        let profile = previous.profile();
        self.speed_multiplier = profile.speed_multiplier;
        self.state = previous.successor();

        let multiplier = self.speed_multiplier;
        let invalid_point = !point.is_finite();
        if invalid_point {
            warn!(
                "Tap at non-finite point ({}, {}); keeping every atom's velocity.",
                point.x, point.y
            );
        }

        let mut retargeted = 0;
        let mut degenerate = 0;
        for atom in &mut self.atoms {
            if !invalid_point {
                match direction_to(atom.position, point) {
                    Some(direction) => {
                        atom.velocity = direction * multiplier;
                        retargeted += 1;
                    }
                    None => {
                        degenerate += 1;
                        warn!(
                            "{} sits on the tap point ({:.2}, {:.2}); keeping its velocity.",
                            atom.id(),
                            point.x,
                            point.y
                        );
                    }
                }
            }
            atom.color = profile.palette.choose(&mut self.rng).copied().unwrap_or_default();
        }

        let outcome = InteractionOutcome {
            previous,
            state: self.state,
            speed_multiplier: multiplier,
            retargeted,
            degenerate,
            invalid_point,
        };
        debug!(
            "Tap at ({:.1}, {:.1}): {} -> {}, speed x{}, {} atoms retargeted.",
            point.x, point.y, outcome.previous, outcome.state, multiplier, outcome.retargeted
        );
        outcome
    }

    /// Atoms in insertion order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Ticks advanced since the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Serializable snapshot for renderers.
    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.tick,
            state: self.state,
            speed_multiplier: self.speed_multiplier,
            arena_width: self.width,
            arena_height: self.height,
            atoms: self.atoms.iter().map(Atom::to_frame).collect(),
        }
    }
}

/// Unit vector from `from` to `to`, or `None` when the two points coincide.
///
/// Both points must be finite. When the length overflows, both points are
/// scaled down by four first; the direction is unchanged and the length fits.
fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    let mut direction = to - from;
    let mut length = direction.length();
    if !length.is_finite() {
        direction = to * 0.25 - from * 0.25;
        length = direction.length();
    }
    (length > 0.0).then(|| direction / length)
}

// Hard wall: any violation flips the velocity component and clamps the position.
#[inline(always)]
fn bounce_axis(position: &mut f32, velocity: &mut f32, radius: f32, bound: f32) {
    if *position < radius || *position > bound - radius {
        *velocity = -*velocity;
        *position = clamp(*position, radius, bound - radius);
    }
}

/// Swaps the velocities of atoms `i < j` when they overlap and approach each other.
/// Returns whether a swap happened.
#[inline(always)]
fn collide_pair(atoms: &mut [Atom], i: usize, j: usize) -> bool {
    let (head, tail) = atoms.split_at_mut(j);
    let (a, b) = (&mut head[i], &mut tail[0]);

    let distance = a.position.distance(b.position);
    if distance < a.radius() + b.radius() {
        let normal = b.position - a.position;
        let relative_velocity = b.velocity - a.velocity;
        if normal.dot(relative_velocity) < 0.0 {
            std::mem::swap(&mut a.velocity, &mut b.velocity);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_atoms_common::AtomColor;

    fn engine() -> Engine {
        Engine::seeded(1, EngineParams::default()).unwrap()
    }

    fn place(engine: &mut Engine, width: f32, height: f32, atoms: &[((f32, f32), (f32, f32))]) {
        let seeds = atoms.iter().map(|&(p, v)| AtomSeed::new(p, v)).collect();
        engine.reset_with_atoms(width, height, seeds).unwrap();
    }

    #[test]
    fn bounce_axis_flips_and_clamps_low_side() {
        let (mut p, mut v) = (8.0, -3.0);
        bounce_axis(&mut p, &mut v, 10.0, 400.0);
        assert_eq!((p, v), (10.0, 3.0));
    }

    #[test]
    fn bounce_axis_flips_and_clamps_high_side() {
        let (mut p, mut v) = (395.0, 2.0);
        bounce_axis(&mut p, &mut v, 10.0, 400.0);
        assert_eq!((p, v), (390.0, -2.0));
    }

    #[test]
    fn bounce_axis_leaves_interior_alone() {
        let (mut p, mut v) = (10.0, -1.0);
        bounce_axis(&mut p, &mut v, 10.0, 400.0);
        assert_eq!((p, v), (10.0, -1.0));
    }

    #[test]
    fn collide_pair_requires_overlap() {
        let mut e = engine();
        place(&mut e, 400.0, 400.0, &[((50.0, 200.0), (1.0, 0.0)), ((70.0, 200.0), (-1.0, 0.0))]);
        // Distance 20 equals the radius sum: touching is not overlapping.
        assert!(!collide_pair(&mut e.atoms, 0, 1));
    }

    #[test]
    fn later_pairs_see_earlier_swaps() {
        let mut e = engine();
        place(
            &mut e,
            400.0,
            400.0,
            &[
                ((100.0, 100.0), (1.0, 0.0)),
                ((110.0, 100.0), (0.0, 0.0)),
                ((120.0, 100.0), (-1.0, 0.0)),
            ],
        );
        assert_eq!(e.resolve_collisions(), 2);
        // (0,1) swaps first, leaving atom1 moving right; (0,2) only touches;
        // (1,2) then swaps using atom1's post-swap velocity.
        let v: Vec<Vec2> = e.atoms().iter().map(|a| a.velocity()).collect();
        assert_eq!(v, vec![Vec2::new(0.0, 0.0), Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)]);
    }

    #[test]
    fn direction_to_normalizes_and_rejects_coincident_points() {
        let d = direction_to(Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0)).unwrap();
        assert_eq!(d, Vec2::new(0.6, 0.8));
        assert_eq!(direction_to(Vec2::new(7.0, 7.0), Vec2::new(7.0, 7.0)), None);
        // Difference overflows f32 outright.
        let d = direction_to(Vec2::new(-f32::MAX, 0.0), Vec2::new(f32::MAX, 0.0)).unwrap();
        assert_eq!(d, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn reset_clears_interaction_state() {
        let mut e = engine();
        e.reset(200.0, 200.0, 4).unwrap();
        e.apply_interaction(Vec2::new(5.0, 5.0));
        e.advance();
        assert_eq!(e.state(), InteractionState::Touch1);
        e.reset(200.0, 200.0, 4).unwrap();
        assert_eq!(e.state(), InteractionState::Initial);
        assert_eq!(e.speed_multiplier(), 1.0);
        assert_eq!(e.tick(), 0);
        assert!(e.atoms().iter().all(|a| a.color() == AtomColor::White));
    }

    #[test]
    fn rejects_bad_radius_and_grid() {
        let params = EngineParams { atom_radius: 0.0, ..EngineParams::default() };
        assert!(matches!(
            Engine::seeded(0, params),
            Err(EngineError::InvalidConfiguration(_))
        ));
        let params = EngineParams {
            atom_radius: 10.0,
            broad_phase: BroadPhase::UniformGrid { cell_size: 15.0 },
        };
        assert!(Engine::seeded(0, params).is_err());
    }

    #[test]
    fn frame_mirrors_engine() {
        let mut e = engine();
        e.reset(300.0, 150.0, 3).unwrap();
        e.advance();
        let frame = e.frame();
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.arena_width, 300.0);
        assert_eq!(frame.arena_height, 150.0);
        assert_eq!(frame.atoms.len(), 3);
        for (view, atom) in frame.atoms.iter().zip(e.atoms()) {
            assert_eq!(view.id, atom.id().get());
            assert_eq!((view.x, view.y), (atom.position().x, atom.position().y));
        }
    }
}
