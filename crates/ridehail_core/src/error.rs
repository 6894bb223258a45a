//! Error types: configuration errors are returned, registry invariant violations are fatal.

use thiserror::Error;

use crate::entities::{TripId, TripPhase, VehicleId, VehiclePhase};

/// Invalid or out-of-range configuration, reported at construction, reset or parameter update.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("city size must be positive")]
    ZeroCitySize,

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    NotAProbability { name: &'static str, value: f64 },

    #[error("minimum trip distance {min} exceeds maximum trip distance {max}")]
    TripDistanceBounds { min: u32, max: u32 },

    #[error("minimum trip distance {min} is unreachable in a city of size {city_size}")]
    UnreachableTripDistance { min: u32, city_size: u32 },

    #[error("{what} capacity must be non-zero")]
    ZeroCapacity { what: &'static str },

    #[error("{what} of {value} exceeds the limit of {max}")]
    TooLarge {
        what: &'static str,
        value: usize,
        max: usize,
    },

    #[error("{what} interval must be non-zero")]
    ZeroInterval { what: &'static str },

    #[error("damping factor must be positive and finite, got {0}")]
    InvalidDamping(f64),

    #[error("cancellation window [{min}, {max}] is empty")]
    CancellationWindow { min: u32, max: u32 },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Registry corruption. Never recoverable: the engine logs and aborts the step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("vehicle {vehicle} references missing trip {trip}")]
    DanglingTrip { vehicle: VehicleId, trip: TripId },

    #[error("trip {trip} references missing vehicle {vehicle}")]
    DanglingVehicle { trip: TripId, vehicle: VehicleId },

    #[error("vehicle {vehicle} and trip {trip} disagree about their link")]
    AsymmetricLink { vehicle: VehicleId, trip: TripId },

    #[error("vehicle {vehicle} is {vehicle_phase:?} but trip {trip} is {trip_phase:?}")]
    PhaseMismatch {
        vehicle: VehicleId,
        vehicle_phase: VehiclePhase,
        trip: TripId,
        trip_phase: TripPhase,
    },

    #[error("vehicle {vehicle} is {phase:?} with an inconsistent trip link")]
    VehicleLink { vehicle: VehicleId, phase: VehiclePhase },

    #[error("trip {trip} is {phase:?} with an inconsistent vehicle link")]
    TripLink { trip: TripId, phase: TripPhase },

    #[error("trip {trip} cannot move from {from:?} to {to:?}")]
    IllegalTripTransition {
        trip: TripId,
        from: TripPhase,
        to: TripPhase,
    },

    #[error("vehicle {vehicle} cannot move from {from:?} to {to:?}")]
    IllegalVehicleTransition {
        vehicle: VehicleId,
        from: VehiclePhase,
        to: VehiclePhase,
    },

    #[error("vehicle {0} was matched twice in one dispatch cycle")]
    VehicleMatchedTwice(VehicleId),

    #[error("trip {0} was matched twice in one dispatch cycle")]
    TripMatchedTwice(TripId),

    #[error("no vehicle with id {0}")]
    UnknownVehicle(VehicleId),

    #[error("no trip with id {0}")]
    UnknownTrip(TripId),
}

/// Logs the violation and aborts. Registry corruption must never be stepped past.
#[track_caller]
pub fn fatal(violation: InvariantViolation) -> ! {
    tracing::error!(%violation, "registry invariant violated");
    panic!("registry invariant violated: {violation}");
}
