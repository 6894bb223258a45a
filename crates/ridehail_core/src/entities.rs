//! Vehicles and trips, their identifiers and their phase state machines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::city::{Direction, Location};
use crate::error::InvariantViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Vehicle phases. The numbering follows the usual P1/P2/P3 time fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehiclePhase {
    Idle,
    Dispatched,
    WithRider,
}

impl VehiclePhase {
    /// IDLE -> DISPATCHED -> WITH_RIDER -> IDLE.
    pub fn can_transition_to(self, next: VehiclePhase) -> bool {
        matches!(
            (self, next),
            (VehiclePhase::Idle, VehiclePhase::Dispatched)
                | (VehiclePhase::Dispatched, VehiclePhase::WithRider)
                | (VehiclePhase::WithRider, VehiclePhase::Idle)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripPhase {
    Inactive,
    Unassigned,
    Waiting,
    Riding,
    Completed,
    Cancelled,
}

impl TripPhase {
    /// Completed, cancelled and inactive trips are dead: scans skip them and
    /// garbage collection purges them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TripPhase::Completed | TripPhase::Cancelled | TripPhase::Inactive
        )
    }

    pub fn is_live(self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(self, next: TripPhase) -> bool {
        matches!(
            (self, next),
            (TripPhase::Inactive, TripPhase::Unassigned)
                | (TripPhase::Unassigned, TripPhase::Waiting)
                | (TripPhase::Unassigned, TripPhase::Cancelled)
                | (TripPhase::Waiting, TripPhase::Riding)
                | (TripPhase::Waiting, TripPhase::Cancelled)
                | (TripPhase::Riding, TripPhase::Completed)
                | (TripPhase::Completed, TripPhase::Inactive)
                | (TripPhase::Cancelled, TripPhase::Inactive)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub phase: VehiclePhase,
    pub location: Location,
    pub direction: Direction,
    /// Trip being served: WAITING while dispatched, RIDING while with rider.
    pub trip: Option<TripId>,
    /// Trip queued by forward dispatch while the current ride finishes.
    pub next_trip: Option<TripId>,
}

impl Vehicle {
    pub fn new(id: VehicleId, location: Location, direction: Direction) -> Self {
        Self {
            id,
            phase: VehiclePhase::Idle,
            location,
            direction,
            trip: None,
            next_trip: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == VehiclePhase::Idle
    }

    pub(crate) fn advance(&mut self, next: VehiclePhase) -> Result<(), InvariantViolation> {
        if !self.phase.can_transition_to(next) {
            return Err(InvariantViolation::IllegalVehicleTransition {
                vehicle: self.id,
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub phase: TripPhase,
    pub origin: Location,
    pub destination: Location,
    /// Wraparound distance from origin to destination.
    pub distance: u32,
    pub vehicle: Option<VehicleId>,
    pub requested_at: u64,
    /// Blocks the trip will wait unassigned before cancelling; `None` waits forever.
    pub cancel_after: Option<u32>,
    pub matched_at: Option<u64>,
    pub pickup_at: Option<u64>,
    pub dropoff_at: Option<u64>,
    pub cancelled_at: Option<u64>,
}

impl Trip {
    /// Blocks from request to pickup, once picked up.
    pub fn wait_time(&self) -> Option<u64> {
        self.pickup_at
            .map(|pickup| pickup.saturating_sub(self.requested_at))
    }

    /// Blocks from pickup to dropoff, once completed.
    pub fn ride_time(&self) -> Option<u64> {
        match (self.pickup_at, self.dropoff_at) {
            (Some(pickup), Some(dropoff)) => Some(dropoff.saturating_sub(pickup)),
            _ => None,
        }
    }

    pub fn has_waited_too_long(&self, now: u64) -> bool {
        self.cancel_after
            .is_some_and(|limit| now.saturating_sub(self.requested_at) > u64::from(limit))
    }

    pub(crate) fn advance(&mut self, next: TripPhase) -> Result<(), InvariantViolation> {
        if !self.phase.can_transition_to(next) {
            return Err(InvariantViolation::IllegalTripTransition {
                trip: self.id,
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}
