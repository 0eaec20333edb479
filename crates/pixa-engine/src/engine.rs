//! Fixed-timestep engine loop.
//!
//! The [`Engine`] owns the ECS [`World`] and the [`AssetRegistry`] and drives
//! them forward one tick at a time. Each tick runs every registered system in
//! registration order with the same fixed `dt`, then advances the tick
//! counter. Simulation time is derived from the counter (`tick_count *
//! fixed_dt`), never accumulated.
//!
//! The animation system is registered first, under
//! [`ANIMATION_SYSTEM_NAME`].
//!
//! # Example
//!
//! ```
//! use pixa_engine::prelude::*;
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.add_system("spin", |_world, _registry, _dt| {
//!     // gameplay logic here
//! });
//!
//! engine.run_ticks(10);
//! assert_eq!(engine.tick_count(), 10);
//! assert_eq!(engine.system_names(), vec!["animation", "spin"]);
//! ```

use std::time::{Duration, Instant};

use anyhow::Context;
use pixa_assets::registry::AssetRegistry;
use pixa_ecs::world::World;

use crate::animation::{reset_animators, update_animators, ANIMATION_SYSTEM_NAME};
use crate::components::{Animator, Sprite};
use crate::config::EngineConfig;

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// A system function run once per tick with the fixed time step in seconds.
pub type SystemFn = fn(&mut World, &mut AssetRegistry, f32);

#[derive(Debug)]
struct RegisteredSystem {
    name: String,
    func: SystemFn,
}

// ---------------------------------------------------------------------------
// PlayMode
// ---------------------------------------------------------------------------

/// Whether the game is running or being edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayMode {
    #[default]
    Edit,
    Play,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The deterministic fixed-timestep engine.
///
/// Given the same initial world, the same assets, the same systems in the
/// same order and the same inputs, repeated runs produce identical worlds.
pub struct Engine {
    world: World,
    registry: AssetRegistry,
    systems: Vec<RegisteredSystem>,
    tick_counter: u64,
    fixed_dt: f64,
    config: EngineConfig,
    mode: PlayMode,
    last_diagnostics: TickDiagnostics,
}

impl Engine {
    /// Create an engine with an empty world and a registry built from
    /// `config.assets`.
    ///
    /// # Panics
    ///
    /// Panics if `config.tick.fixed_dt` is not positive and finite.
    pub fn new(config: EngineConfig) -> Self {
        let registry = AssetRegistry::new(config.assets.clone());
        Self::with_parts(World::new(), registry, config)
    }

    /// Create an engine around an existing world and registry.
    ///
    /// # Panics
    ///
    /// Panics if `config.tick.fixed_dt` is not positive and finite.
    pub fn with_parts(mut world: World, registry: AssetRegistry, config: EngineConfig) -> Self {
        assert!(
            config.tick.fixed_dt > 0.0 && config.tick.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.tick.fixed_dt
        );
        world.register_component::<Animator>("animator");
        world.register_component::<Sprite>("sprite");

        let mut engine = Self {
            world,
            registry,
            systems: Vec::new(),
            tick_counter: 0,
            fixed_dt: config.tick.fixed_dt,
            config,
            mode: PlayMode::Edit,
            last_diagnostics: TickDiagnostics::default(),
        };
        engine.add_system(ANIMATION_SYSTEM_NAME, update_animators);
        engine
    }

    /// Register a system to be run each tick, after every system registered
    /// before it.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Unregister a system. Returns `false` if no system has that name.
    pub fn remove_system(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name != name);
        self.systems.len() != before
    }

    // -- lifecycle ----------------------------------------------------------

    /// Load the UUID cache and index every package under the asset root.
    pub fn startup(&mut self) -> anyhow::Result<()> {
        self.registry
            .initialize()
            .context("failed to initialize asset registry")?;

        let root = self.config.assets.asset_root.clone();
        let indexed = if root.is_dir() {
            self.registry.scan_all_packages(&root, |done, total, path| {
                tracing::trace!(done, total, path = %path.display(), "scanning packages");
            })
        } else {
            tracing::warn!(root = %root.display(), "asset root does not exist");
            0
        };

        tracing::info!(
            root = %root.display(),
            packages = indexed,
            systems = self.systems.len(),
            "engine started"
        );
        Ok(())
    }

    /// Release loaded assets and persist the UUID cache.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        self.registry
            .shutdown()
            .context("failed to shut down asset registry")?;
        tracing::info!(ticks = self.tick_counter, "engine shut down");
        Ok(())
    }

    /// Switch to play mode. Animators restart from their default states.
    pub fn enter_play_mode(&mut self) {
        reset_animators(&mut self.world);
        self.mode = PlayMode::Play;
        tracing::info!("entered play mode");
    }

    /// Switch back to edit mode, discarding animation progress.
    pub fn exit_play_mode(&mut self) {
        reset_animators(&mut self.world);
        self.mode = PlayMode::Edit;
        tracing::info!("exited play mode");
    }

    // -- ticking ------------------------------------------------------------

    /// Execute one simulation tick: run every system in order, then advance
    /// the tick counter.
    pub fn tick(&mut self) {
        let tick_start = Instant::now();
        let dt = self.fixed_dt as f32;
        let mut system_times = Vec::with_capacity(self.systems.len());

        for system in &self.systems {
            let sys_start = Instant::now();
            (system.func)(&mut self.world, &mut self.registry, dt);
            system_times.push((system.name.clone(), sys_start.elapsed()));
        }

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
        };
    }

    /// Run multiple ticks in sequence.
    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds elapsed, `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlayMode::Play
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.tick_counter)
            .field("fixed_dt", &self.fixed_dt)
            .field("mode", &self.mode)
            .field("systems", &self.system_names())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TickConfig;
    use pixa_assets::uuid::AssetUuid;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Counter(u64);

    fn count_system(world: &mut World, _registry: &mut AssetRegistry, _dt: f32) {
        for (_, counter) in world.query_mut::<Counter>() {
            counter.0 += 1;
        }
    }

    fn double_system(world: &mut World, _registry: &mut AssetRegistry, _dt: f32) {
        for (_, counter) in world.query_mut::<Counter>() {
            counter.0 *= 2;
        }
    }

    #[test]
    fn animation_system_is_registered_by_default() {
        let engine = Engine::new(EngineConfig::default());
        assert_eq!(engine.system_names(), vec![ANIMATION_SYSTEM_NAME]);
        assert!(engine.world().registry().is_registered::<Animator>());
        assert!(!engine.is_playing());
    }

    #[test]
    fn systems_run_in_registration_order() {
        let mut engine = Engine::new(EngineConfig::default());
        let e = engine.world_mut().spawn_with(Counter(1));
        engine.add_system("count", count_system);
        engine.add_system("double", double_system);

        engine.tick();
        assert_eq!(engine.world().get_component::<Counter>(e), Some(&Counter(4)));

        let diag = engine.last_diagnostics();
        let names: Vec<&str> = diag.system_times.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["animation", "count", "double"]);
    }

    #[test]
    #[should_panic(expected = "duplicate system name")]
    fn duplicate_system_name_panics() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.add_system("count", count_system);
        engine.add_system("count", double_system);
    }

    #[test]
    #[should_panic(expected = "fixed_dt must be positive")]
    fn zero_dt_panics() {
        let mut config = EngineConfig::default();
        config.tick = TickConfig { fixed_dt: 0.0 };
        let _ = Engine::new(config);
    }

    #[test]
    fn sim_time_is_derived_from_tick_count() {
        let mut config = EngineConfig::default();
        config.tick.fixed_dt = 0.1;
        let mut engine = Engine::new(config);
        engine.run_ticks(30);
        assert_eq!(engine.tick_count(), 30);
        assert_eq!(engine.sim_time(), 30.0 * 0.1);
    }

    #[test]
    fn remove_system_stops_it_running() {
        let mut engine = Engine::new(EngineConfig::default());
        let e = engine.world_mut().spawn_with(Counter(0));
        engine.add_system("count", count_system);
        engine.tick();
        assert!(engine.remove_system("count"));
        assert!(!engine.remove_system("count"));
        engine.tick();
        assert_eq!(engine.world().get_component::<Counter>(e), Some(&Counter(1)));
    }

    #[test]
    fn play_mode_resets_animators() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut animator = Animator::new(AssetUuid::from_raw(3));
        animator.current_state = "run".into();
        animator.state_time = 1.0;
        let e = engine.world_mut().spawn_with(animator);

        engine.enter_play_mode();
        assert!(engine.is_playing());
        let animator = engine.world().get_component::<Animator>(e).unwrap();
        assert!(animator.current_state.is_empty());
        assert_eq!(animator.state_time, 0.0);

        engine
            .world_mut()
            .get_component_mut::<Animator>(e)
            .unwrap()
            .current_state = "idle".into();
        engine.exit_play_mode();
        assert_eq!(engine.mode(), PlayMode::Edit);
        assert!(engine
            .world()
            .get_component::<Animator>(e)
            .unwrap()
            .current_state
            .is_empty());
    }
}
