use crate::city::Location;
use crate::entities::{TripId, VehicleId};

/// A vehicle that could take a trip this block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleCandidate {
    pub id: VehicleId,
    /// Where the vehicle will be once free: its position when idle, the
    /// current drop-off point when finishing a ride.
    pub location: Location,
    /// Blocks until the vehicle is free; 0 for idle vehicles and for rides
    /// already at their drop-off point.
    pub busy_for: u32,
    pub idle: bool,
}

impl VehicleCandidate {
    pub fn idle(id: VehicleId, location: Location) -> Self {
        Self {
            id,
            location,
            busy_for: 0,
            idle: true,
        }
    }

    /// A vehicle still carrying a rider, offered at its drop-off point.
    pub fn finishing(id: VehicleId, drop_off: Location, busy_for: u32) -> Self {
        Self {
            id,
            location: drop_off,
            busy_for,
            idle: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }
}

/// An unassigned trip waiting for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripRequest {
    pub id: TripId,
    pub origin: Location,
}

/// One vehicle-trip pairing produced by a dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub vehicle: VehicleId,
    pub trip: TripId,
}
