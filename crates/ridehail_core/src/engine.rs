//! The block-stepping engine that front ends drive.
//!
//! [`TimeStepEngine`] owns the world and the block schedule. Front ends call
//! [`TimeStepEngine::step`] directly, or send [`ControlCommand`]s and call
//! [`TimeStepEngine::tick`] once per frame. Commands are applied between
//! blocks only; a step always runs to completion.

use bevy_ecs::prelude::{Schedule, World};

use crate::clock::BlockClock;
use crate::control::{ControlCommand, ParameterUpdate, RunMode};
use crate::dispatch::DispatchPolicy;
use crate::equilibration::EquilibrationController;
use crate::error::ConfigResult;
use crate::registry::{TripRegistry, VehicleRegistry};
use crate::runner::{run_block, simulation_schedule};
use crate::scenario::{build_world, SimConfig};
use crate::telemetry::{BlockSnapshot, BlockSummary, History, LatestSummary};

pub struct TimeStepEngine {
    world: World,
    schedule: Schedule,
    /// Configuration a reset returns to. Live edits made by parameter updates
    /// are folded in; fleet sizes chosen by equilibration are not.
    base_config: SimConfig,
    mode: RunMode,
}

impl TimeStepEngine {
    pub fn new(config: SimConfig) -> ConfigResult<Self> {
        let world = build_world(&config)?;
        tracing::info!(
            city_size = config.city_size,
            vehicles = config.vehicle_count,
            request_rate = config.request_rate,
            dispatch = ?config.dispatch,
            equilibration = ?config.equilibration.method,
            seed = config.seed,
            "engine created"
        );
        Ok(Self {
            world,
            schedule: simulation_schedule(),
            base_config: config,
            mode: RunMode::Paused,
        })
    }

    /// Runs one block and returns its summary.
    pub fn step(&mut self) -> BlockSummary {
        run_block(&mut self.world, &mut self.schedule)
    }

    /// Runs `blocks` blocks and returns the summary of each.
    pub fn run(&mut self, blocks: u64) -> Vec<BlockSummary> {
        (0..blocks).map(|_| self.step()).collect()
    }

    /// Steps only while playing.
    pub fn tick(&mut self) -> Option<BlockSummary> {
        match self.mode {
            RunMode::Playing => Some(self.step()),
            RunMode::Paused => None,
        }
    }

    /// End-of-block view of the most recent block. Before the first block the
    /// summary is empty.
    pub fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot::capture(
            self.world.resource::<LatestSummary>().0.clone(),
            self.vehicles(),
            self.trips(),
        )
    }

    /// Back to block 0 with empty registries, a fresh controller and the
    /// random stream reseeded from the base configuration.
    pub fn reset(&mut self) -> ConfigResult<()> {
        self.world = build_world(&self.base_config)?;
        tracing::info!(seed = self.base_config.seed, "engine reset");
        Ok(())
    }

    /// Resets with a new base configuration. On error the engine is unchanged.
    pub fn reset_with(&mut self, config: SimConfig) -> ConfigResult<()> {
        self.world = build_world(&config)?;
        tracing::info!(
            city_size = config.city_size,
            vehicles = config.vehicle_count,
            seed = config.seed,
            "engine reset with new configuration"
        );
        self.base_config = config;
        Ok(())
    }

    /// Applies a control command between blocks. `SingleStep` returns the
    /// snapshot of the block it ran.
    pub fn apply(&mut self, command: ControlCommand) -> ConfigResult<Option<BlockSnapshot>> {
        match command {
            ControlCommand::Play => self.mode = RunMode::Playing,
            ControlCommand::Pause => self.mode = RunMode::Paused,
            ControlCommand::SingleStep => {
                self.mode = RunMode::Paused;
                self.step();
                return Ok(Some(self.snapshot()));
            }
            ControlCommand::Reset => self.reset()?,
            ControlCommand::UpdateParameters(update) => self.update_parameters(&update)?,
        }
        Ok(None)
    }

    /// Validates the update against both the base and the live configuration
    /// before changing either. A new city size resets the simulation.
    pub fn update_parameters(&mut self, update: &ParameterUpdate) -> ConfigResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        let mut base = self.base_config.clone();
        update.apply_to(&mut base);
        base.validate()?;
        if update.changes_city_size(&self.base_config) {
            return self.reset_with(base);
        }

        let current = self.config().clone();
        let mut live = current.clone();
        update.apply_to(&mut live);
        live.validate()?;

        if live.dispatch != current.dispatch {
            self.world.insert_resource(DispatchPolicy::from_config(&live));
        }
        if live.equilibration.method != current.equilibration.method {
            self.world
                .resource_mut::<EquilibrationController>()
                .set_method(live.equilibration.method);
        }
        tracing::debug!(block = self.block(), ?update, "parameters updated");
        self.world.insert_resource(live);
        self.base_config = base;
        Ok(())
    }

    /// Index of the next block to run.
    pub fn block(&self) -> u64 {
        self.world.resource::<BlockClock>().now()
    }

    /// Live configuration, including fleet sizes set by equilibration.
    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn base_config(&self) -> &SimConfig {
        &self.base_config
    }

    pub fn is_playing(&self) -> bool {
        self.mode == RunMode::Playing
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn vehicles(&self) -> &VehicleRegistry {
        self.world.resource::<VehicleRegistry>()
    }

    pub fn trips(&self) -> &TripRegistry {
        self.world.resource::<TripRegistry>()
    }

    pub fn controller(&self) -> &EquilibrationController {
        self.world.resource::<EquilibrationController>()
    }

    pub fn history(&self) -> &History {
        self.world.resource::<History>()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
