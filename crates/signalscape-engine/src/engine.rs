//! RF session: the stateful shell around the pure propagation engine.
//!
//! `RfSession` owns the hecs world holding transmitters and the probe
//! vehicle, applies queued commands at tick boundaries, runs the systems
//! and produces `SessionSnapshot`s. Ray bundles are rebuilt on a worker
//! thread and swapped in when they arrive. Headless, so every behavior is
//! testable without a renderer.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glam::DVec3;
use hecs::World;

use signalscape_core::commands::{CameraCommand, SessionCommand};
use signalscape_core::components::{Location, Radio};
use signalscape_core::config::EngineConfig;
use signalscape_core::constants::*;
use signalscape_core::events::SessionEvent;
use signalscape_core::state::{DriveTestResult, ProbeResult, RayBundle, SessionSnapshot};
use signalscape_core::types::{SimTime, Transmitter, TransmitterId};

use crate::cache::BundleCache;
use crate::drive_test::analyze_path_with_config;
use crate::explain::{self, ExplanationService, PointAnalysis};
use crate::interference::{FieldParams, FieldPlane, FieldSources};
use crate::probe::{probe_into, ProbeParams, Prober};
use crate::rebuild::{RebuildError, RebuildOutput, RebuildWorker, SharedIndex};
use crate::systems;
use crate::systems::snapshot::SnapshotInputs;
use crate::throttle::ProbeThrottle;
use crate::world_setup;

/// The session. Owns the ECS world and all derived engine state.
pub struct RfSession {
    world: World,
    index: SharedIndex,
    config: EngineConfig,
    time: SimTime,
    command_queue: VecDeque<SessionCommand>,
    camera_queue: VecDeque<CameraCommand>,
    events: Vec<SessionEvent>,
    next_transmitter_id: TransmitterId,

    // --- Derived from the transmitter set ---
    revision: u64,
    synced_revision: Option<u64>,
    transmitters: Vec<Transmitter>,
    field: FieldSources,

    // --- Ray bundles ---
    rebuild: Option<RebuildWorker>,
    /// Cache used when the worker is gone and bundles are built inline.
    fallback_cache: BundleCache,
    /// Generation and revision of the last rebuild request.
    requested: Option<(u64, u64)>,
    bundles: Vec<RayBundle>,
    bundles_revision: Option<u64>,

    // --- Probe vehicle ---
    throttle: ProbeThrottle,
    prober: Prober,
    last_probe: Option<ProbeResult>,
}

impl RfSession {
    /// Create a session over `index` and start its rebuild worker.
    pub fn new(index: SharedIndex, config: EngineConfig) -> Result<Self, RebuildError> {
        let rebuild = RebuildWorker::spawn(index.clone(), config.clone())?;
        tracing::info!(
            max_bounces = config.max_bounces,
            base_ray_count = config.base_ray_count,
            "RF session started"
        );
        Ok(Self {
            world: World::new(),
            index,
            time: SimTime::default(),
            command_queue: VecDeque::new(),
            camera_queue: VecDeque::new(),
            events: Vec::new(),
            next_transmitter_id: 1,
            revision: 0,
            synced_revision: None,
            transmitters: Vec::new(),
            field: FieldSources::default(),
            rebuild: Some(rebuild),
            fallback_cache: BundleCache::new(),
            requested: None,
            bundles: Vec::new(),
            bundles_revision: None,
            throttle: ProbeThrottle::new(config.probe_interval_secs),
            prober: Prober::new(ProbeParams::from(&config)),
            last_probe: None,
            config,
        })
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SessionCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SessionCommand>) {
        self.command_queue.extend(commands);
    }

    /// Ask the camera controller to fly to `target`. Delivered with the next snapshot.
    pub fn request_fly_to(&mut self, target: DVec3, distance: f64) {
        self.camera_queue
            .push_back(CameraCommand::FlyTo { target, distance });
    }

    /// Advance the session by `dt` seconds and return the resulting snapshot.
    pub fn tick(&mut self, dt: f64) -> SessionSnapshot {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.process_commands();
        self.time.advance(dt);
        self.run_systems(dt);

        let events = std::mem::take(&mut self.events);
        let camera = self.camera_queue.drain(..).collect();
        systems::snapshot::build_snapshot(
            &self.world,
            SnapshotInputs {
                time: self.time,
                revision: self.revision,
                bundles_revision: self.bundles_revision,
                bundles: &self.bundles,
                last_probe: self.last_probe.as_ref(),
                events,
                camera,
            },
        )
    }

    /// Block until bundles match the current revision or `timeout` passes.
    ///
    /// Returns true when bundles are current. Intended for headless callers.
    pub fn wait_for_bundles(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.sync_transmitters();
            self.request_rebuild();
            if self.bundles_revision == Some(self.revision) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let Some(worker) = self.rebuild.as_mut() else {
                // Inline rebuilds complete in `request_rebuild`.
                continue;
            };
            match worker.wait_latest(remaining) {
                Ok(Some(output)) => self.accept_bundles(output),
                Ok(None) => {}
                Err(err) => self.lose_worker(err),
            }
        }
    }

    // --- Accessors ---

    /// Copy of the transmitter set, ordered by id.
    pub fn transmitters(&self) -> Vec<Transmitter> {
        systems::snapshot::collect_transmitters(&self.world)
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn bundles_revision(&self) -> Option<u64> {
        self.bundles_revision
    }

    pub fn bundles(&self) -> &[RayBundle] {
        &self.bundles
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Latest throttled analysis at the probe vehicle.
    pub fn vehicle_probe(&self) -> Option<&ProbeResult> {
        self.last_probe.as_ref()
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    // --- Engine queries over the transmitter set as of the last tick ---

    /// Probe an arbitrary point (cursor click).
    pub fn probe_point(&self, point: DVec3) -> ProbeResult {
        let mut result = ProbeResult::default();
        probe_into(
            point,
            &self.transmitters,
            self.index.as_ref(),
            &ProbeParams::from(&self.config),
            &mut result,
        );
        result
    }

    /// Run a full drive-test analysis along `route`.
    pub fn analyze_route(&self, route: &[DVec3]) -> DriveTestResult {
        analyze_path_with_config(route, &self.transmitters, self.index.as_ref(), &self.config)
    }

    /// Interference field intensity at `point` at the current session time.
    pub fn field_intensity(&self, point: DVec3) -> f64 {
        self.field.intensity(point, self.time.elapsed_secs)
    }

    /// Sample the interference field over `plane` at the current session time.
    pub fn sample_field(&self, plane: &FieldPlane, out: &mut Vec<f32>) {
        self.field.sample_plane(plane, self.time.elapsed_secs, out);
    }

    /// Probe `point` and attach a narrative from `service`, if it answers.
    pub fn explain_point<S: ExplanationService + ?Sized>(
        &self,
        point: DVec3,
        service: &S,
    ) -> PointAnalysis {
        explain::explain_point(
            point,
            &self.transmitters,
            self.index.as_ref(),
            &ProbeParams::from(&self.config),
            service,
        )
    }

    // --- Tick internals ---

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single session command.
    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::AddTransmitter {
                position,
                power_dbm,
                frequency_mhz,
                mobility,
            } => {
                if !position.is_finite() {
                    tracing::warn!(?position, "ignoring transmitter with non-finite position");
                    return;
                }
                let id = self.next_transmitter_id;
                self.next_transmitter_id += 1;
                let power = power_dbm
                    .filter(|p| p.is_finite())
                    .unwrap_or(DEFAULT_TX_POWER_DBM);
                let frequency = frequency_mhz
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .unwrap_or(DEFAULT_TX_FREQUENCY_MHZ);
                world_setup::spawn_transmitter(
                    &mut self.world,
                    id,
                    position,
                    power,
                    frequency,
                    mobility,
                );
                tracing::debug!(id, power, frequency, "transmitter added");
                self.events.push(SessionEvent::TransmitterAdded { id });
                self.bump_revision();
            }
            SessionCommand::RemoveTransmitter { id } => {
                match world_setup::find_transmitter(&self.world, id) {
                    Some(entity) => {
                        let _ = self.world.despawn(entity);
                        tracing::debug!(id, "transmitter removed");
                        self.events.push(SessionEvent::TransmitterRemoved { id });
                        self.bump_revision();
                    }
                    None => tracing::debug!(id, "remove: no such transmitter"),
                }
            }
            SessionCommand::ClearTransmitters => {
                let entities = world_setup::transmitter_entities(&self.world);
                if entities.is_empty() {
                    return;
                }
                for (entity, id) in entities {
                    let _ = self.world.despawn(entity);
                    self.events.push(SessionEvent::TransmitterRemoved { id });
                }
                self.bump_revision();
            }
            SessionCommand::MoveTransmitter { id, position } => {
                if !position.is_finite() {
                    tracing::warn!(id, ?position, "ignoring move to non-finite position");
                    return;
                }
                let moved = self.with_transmitter(id, |world, entity| {
                    world
                        .get::<&mut Location>(entity)
                        .map(|mut location| location.0 = position)
                        .is_ok()
                });
                if moved {
                    self.bump_revision();
                }
            }
            SessionCommand::SetPower { id, power_dbm } => {
                if !power_dbm.is_finite() {
                    tracing::warn!(id, power_dbm, "ignoring non-finite power");
                    return;
                }
                if self.update_radio(id, |radio| radio.power_dbm = power_dbm) {
                    self.bump_revision();
                }
            }
            SessionCommand::SetFrequency { id, frequency_mhz } => {
                if !(frequency_mhz.is_finite() && frequency_mhz > 0.0) {
                    tracing::warn!(id, frequency_mhz, "ignoring invalid frequency");
                    return;
                }
                if self.update_radio(id, |radio| radio.frequency_mhz = frequency_mhz) {
                    self.bump_revision();
                }
            }
            SessionCommand::SetMobility { id, mobility } => {
                // Positions change on the next mobility step, which bumps the revision.
                self.with_transmitter(id, |world, entity| {
                    world.insert_one(entity, mobility).is_ok()
                });
            }
            SessionCommand::FocusTransmitter { id } => {
                let target = world_setup::find_transmitter(&self.world, id).and_then(|entity| {
                    self.world
                        .get::<&Location>(entity)
                        .ok()
                        .map(|location| location.0)
                });
                match target {
                    Some(target) => self.request_fly_to(target, FOCUS_DISTANCE_M),
                    None => tracing::debug!(id, "focus: no such transmitter"),
                }
            }
            SessionCommand::SetProbeRoute { points, speed } => {
                self.clear_probe_vehicle();
                let waypoints = points.len();
                if world_setup::spawn_probe_vehicle(&mut self.world, points, speed).is_some() {
                    tracing::debug!(waypoints, speed, "probe route set");
                }
            }
            SessionCommand::ClearProbeRoute => {
                self.clear_probe_vehicle();
            }
        }
    }

    /// Run `f` on the entity of transmitter `id`. False if there is none.
    fn with_transmitter(
        &mut self,
        id: TransmitterId,
        f: impl FnOnce(&mut World, hecs::Entity) -> bool,
    ) -> bool {
        match world_setup::find_transmitter(&self.world, id) {
            Some(entity) => f(&mut self.world, entity),
            None => {
                tracing::debug!(id, "command for unknown transmitter");
                false
            }
        }
    }

    fn update_radio(&mut self, id: TransmitterId, f: impl FnOnce(&mut Radio)) -> bool {
        self.with_transmitter(id, |world, entity| {
            world
                .get::<&mut Radio>(entity)
                .map(|mut radio| f(&mut *radio))
                .is_ok()
        })
    }

    fn clear_probe_vehicle(&mut self) {
        for entity in world_setup::probe_vehicle_entities(&self.world) {
            let _ = self.world.despawn(entity);
        }
        self.last_probe = None;
        self.throttle.reset();
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        // 1. Mobility (transmitters and probe vehicle)
        if systems::mobility::run(&mut self.world, dt) {
            self.bump_revision();
        }
        // 2. Engine-side copy of the transmitter set
        self.sync_transmitters();
        // 3. Swap in finished bundles, then ask for the current revision
        self.collect_bundles();
        self.request_rebuild();
        // 4. Throttled live probe at the vehicle
        if self.throttle.try_acquire(self.time.elapsed_secs) {
            if let Some(result) = systems::probe_vehicle::run(
                &mut self.world,
                &self.transmitters,
                self.index.as_ref(),
                &mut self.prober,
                &mut self.events,
            ) {
                self.last_probe = Some(result);
            }
        }
    }

    fn sync_transmitters(&mut self) {
        if self.synced_revision == Some(self.revision) {
            return;
        }
        self.transmitters = systems::snapshot::collect_transmitters(&self.world);
        self.field = FieldSources::new(&self.transmitters, &FieldParams::from(&self.config));
        self.synced_revision = Some(self.revision);
    }

    fn collect_bundles(&mut self) {
        let Some(worker) = self.rebuild.as_mut() else {
            return;
        };
        match worker.poll() {
            Ok(Some(output)) => self.accept_bundles(output),
            Ok(None) => {}
            Err(err) => self.lose_worker(err),
        }
    }

    /// Request bundles for the current revision unless already requested.
    ///
    /// Waits for an in-flight job to finish first, so every result the
    /// worker returns is for the latest request.
    fn request_rebuild(&mut self) {
        if self.requested.is_some_and(|(_, revision)| revision == self.revision) {
            return;
        }
        match self.rebuild.as_mut() {
            Some(worker) => {
                if !worker.is_idle() {
                    return;
                }
                match worker.request(self.transmitters.clone()) {
                    Ok(generation) => self.requested = Some((generation, self.revision)),
                    Err(err) => self.lose_worker(err),
                }
            }
            None => {
                let generation = self.requested.map_or(1, |(generation, _)| generation + 1);
                self.requested = Some((generation, self.revision));
                let (bundles, counts) = self.fallback_cache.rebuild(
                    &self.transmitters,
                    self.index.as_ref(),
                    &self.config,
                );
                self.accept_bundles(RebuildOutput {
                    generation,
                    bundles,
                    counts,
                });
            }
        }
    }

    fn accept_bundles(&mut self, output: RebuildOutput) {
        let Some((generation, revision)) = self.requested else {
            return;
        };
        if output.generation != generation {
            tracing::debug!(
                generation = output.generation,
                expected = generation,
                "ignoring rebuild for an older request"
            );
            return;
        }
        self.events.push(SessionEvent::BundlesRebuilt {
            generation,
            bundle_count: output.bundles.len(),
        });
        self.bundles = output.bundles;
        self.bundles_revision = Some(revision);
    }

    /// Switch to inline rebuilds after the worker fails.
    fn lose_worker(&mut self, err: RebuildError) {
        tracing::warn!(%err, "ray rebuild worker lost, rebuilding inline");
        self.rebuild = None;
        // Whatever was in flight is gone; ask again.
        self.requested = None;
    }
}

impl std::fmt::Debug for RfSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RfSession")
            .field("time", &self.time)
            .field("revision", &self.revision)
            .field("bundles_revision", &self.bundles_revision)
            .field("transmitters", &self.transmitters.len())
            .finish_non_exhaustive()
    }
}
