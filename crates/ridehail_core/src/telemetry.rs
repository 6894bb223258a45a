//! Per-block aggregates: rolling history, window statistics and the snapshots
//! handed to front ends.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::buffer::CircularBuffer;
use crate::city::{Direction, Location};
use crate::entities::{TripId, TripPhase, VehicleId, VehiclePhase};
use crate::equilibration::CycleReport;
use crate::error::ConfigResult;
use crate::registry::{TripRegistry, VehicleRegistry};
use crate::scenario::Economics;

/// Vehicles in each phase at the end of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub idle: usize,
    pub dispatched: usize,
    pub with_rider: usize,
}

impl PhaseCounts {
    pub fn of(vehicles: &VehicleRegistry) -> Self {
        let mut counts = Self::default();
        for vehicle in vehicles.iter() {
            match vehicle.phase {
                VehiclePhase::Idle => counts.idle += 1,
                VehiclePhase::Dispatched => counts.dispatched += 1,
                VehiclePhase::WithRider => counts.with_rider += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.idle + self.dispatched + self.with_rider
    }
}

/// Live trips in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripCounts {
    pub unassigned: usize,
    pub waiting: usize,
    pub riding: usize,
}

impl TripCounts {
    pub fn of(trips: &TripRegistry) -> Self {
        let mut counts = Self::default();
        for trip in trips.iter_live() {
            match trip.phase {
                TripPhase::Unassigned => counts.unassigned += 1,
                TripPhase::Waiting => counts.waiting += 1,
                TripPhase::Riding => counts.riding += 1,
                _ => {}
            }
        }
        counts
    }
}

/// What happened during the current block. Cleared when the block starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Resource)]
pub struct BlockActivity {
    pub requests: usize,
    pub matches: usize,
    pub completions: usize,
    pub cancellations: usize,
    /// Request-to-pickup blocks summed over trips completed this block.
    pub wait_blocks: u64,
    /// Pickup-to-dropoff blocks summed over trips completed this block.
    pub ride_blocks: u64,
    pub retired: usize,
    /// Trips purged by garbage collection this block.
    pub collected: usize,
    pub vehicles_added: usize,
    pub vehicles_removed: usize,
    pub cycle: Option<CycleReport>,
}

/// Statistics over the rolling history window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub blocks: usize,
    /// Share of vehicle-blocks spent idle.
    pub p1: f64,
    /// Share of vehicle-blocks spent dispatched.
    pub p2: f64,
    /// Share of vehicle-blocks spent with a rider.
    pub p3: f64,
    pub mean_vehicle_count: f64,
    pub request_rate: f64,
    pub completed_trips: u64,
    pub cancelled_trips: u64,
    pub mean_wait: Option<f64>,
    pub mean_ride: Option<f64>,
    /// Waiting share of a completed trip's total time.
    pub wait_fraction: Option<f64>,
    /// Driver income per vehicle-block.
    pub mean_income: f64,
    /// Income above the reservation wage.
    pub vehicle_utility: f64,
}

/// Rolling per-block history, one buffer per series.
#[derive(Debug, Clone, Resource)]
pub struct History {
    idle: CircularBuffer,
    dispatched: CircularBuffer,
    with_rider: CircularBuffer,
    requests: CircularBuffer,
    completions: CircularBuffer,
    cancellations: CircularBuffer,
    wait_blocks: CircularBuffer,
    ride_blocks: CircularBuffer,
}

impl History {
    pub fn new(window: usize) -> ConfigResult<Self> {
        let series = || CircularBuffer::try_new(window, "results window");
        Ok(Self {
            idle: series()?,
            dispatched: series()?,
            with_rider: series()?,
            requests: series()?,
            completions: series()?,
            cancellations: series()?,
            wait_blocks: series()?,
            ride_blocks: series()?,
        })
    }

    pub fn window(&self) -> usize {
        self.idle.capacity()
    }

    pub fn blocks(&self) -> usize {
        self.idle.len()
    }

    pub fn record(&mut self, counts: PhaseCounts, activity: &BlockActivity) {
        self.idle.push(counts.idle as f64);
        self.dispatched.push(counts.dispatched as f64);
        self.with_rider.push(counts.with_rider as f64);
        self.requests.push(activity.requests as f64);
        self.completions.push(activity.completions as f64);
        self.cancellations.push(activity.cancellations as f64);
        self.wait_blocks.push(activity.wait_blocks as f64);
        self.ride_blocks.push(activity.ride_blocks as f64);
    }

    pub fn stats(&self, economics: &Economics) -> WindowStats {
        let blocks = self.blocks();
        let idle = self.idle.sum();
        let dispatched = self.dispatched.sum();
        let with_rider = self.with_rider.sum();
        let vehicle_blocks = idle + dispatched + with_rider;
        let (p1, p2, p3) = if vehicle_blocks > 0.0 {
            (
                idle / vehicle_blocks,
                dispatched / vehicle_blocks,
                with_rider / vehicle_blocks,
            )
        } else {
            (1.0, 0.0, 0.0)
        };

        let completed = self.completions.sum();
        let wait = self.wait_blocks.sum();
        let ride = self.ride_blocks.sum();
        let (mean_wait, mean_ride) = if completed > 0.0 {
            (Some(wait / completed), Some(ride / completed))
        } else {
            (None, None)
        };
        let wait_fraction = if completed > 0.0 && wait + ride > 0.0 {
            Some(wait / (wait + ride))
        } else if completed > 0.0 {
            Some(0.0)
        } else {
            None
        };

        let per_block = |total: f64| {
            if blocks == 0 {
                0.0
            } else {
                total / blocks as f64
            }
        };
        let mean_income = economics.driver_fare() * p3;

        WindowStats {
            blocks,
            p1,
            p2,
            p3,
            mean_vehicle_count: per_block(vehicle_blocks),
            request_rate: per_block(self.requests.sum()),
            completed_trips: completed as u64,
            cancelled_trips: self.cancellations.sum() as u64,
            mean_wait,
            mean_ride,
            wait_fraction,
            mean_income,
            vehicle_utility: mean_income - economics.reservation_wage,
        }
    }

    pub fn clear(&mut self) {
        for series in [
            &mut self.idle,
            &mut self.dispatched,
            &mut self.with_rider,
            &mut self.requests,
            &mut self.completions,
            &mut self.cancellations,
            &mut self.wait_blocks,
            &mut self.ride_blocks,
        ] {
            series.clear();
        }
    }
}

/// Aggregates reported at the end of every block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub block: u64,
    pub vehicles: usize,
    pub vehicle_phases: PhaseCounts,
    pub trip_phases: TripCounts,
    pub live_trips: usize,
    /// Completed, cancelled and inactive trips not yet collected.
    pub dead_trips: usize,
    pub activity: BlockActivity,
    pub window: WindowStats,
}

/// Latest summary, written by the last stage of the block. Holds the default
/// (empty) summary until the first block has run.
#[derive(Debug, Clone, Default, Resource)]
pub struct LatestSummary(pub BlockSummary);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub phase: VehiclePhase,
    pub location: Location,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub id: TripId,
    pub phase: TripPhase,
    pub origin: Location,
    pub destination: Location,
    pub distance: u32,
}

/// Read-only end-of-block view for rendering and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub summary: BlockSummary,
    pub vehicles: Vec<VehicleSnapshot>,
    /// Live trips only.
    pub trips: Vec<TripSnapshot>,
}

impl BlockSnapshot {
    pub fn capture(summary: BlockSummary, vehicles: &VehicleRegistry, trips: &TripRegistry) -> Self {
        Self {
            summary,
            vehicles: vehicles
                .iter()
                .map(|v| VehicleSnapshot {
                    id: v.id,
                    phase: v.phase,
                    location: v.location,
                    direction: v.direction,
                })
                .collect(),
            trips: trips
                .iter_live()
                .map(|t| TripSnapshot {
                    id: t.id,
                    phase: t.phase,
                    origin: t.origin,
                    destination: t.destination,
                    distance: t.distance,
                })
                .collect(),
        }
    }
}
