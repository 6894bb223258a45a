//! Vehicle and trip registries plus the paired transitions that keep their
//! cross references consistent.
//!
//! Every transition that touches both a vehicle and a trip lives here and is
//! applied as a unit: all preconditions are checked before either side is
//! mutated, so a failed transition leaves both registries untouched.

mod trips;
mod vehicles;

pub use trips::{TripDraft, TripRegistry};
pub use vehicles::VehicleRegistry;

use crate::entities::{TripId, TripPhase, VehicleId, VehiclePhase};
use crate::error::InvariantViolation;

fn expect_trip_phase(
    trips: &TripRegistry,
    id: TripId,
    phase: TripPhase,
) -> Result<(), InvariantViolation> {
    let trip = trips.get(id).ok_or(InvariantViolation::UnknownTrip(id))?;
    if trip.phase != phase {
        return Err(InvariantViolation::TripLink {
            trip: id,
            phase: trip.phase,
        });
    }
    Ok(())
}

/// IDLE vehicle takes an UNASSIGNED trip: vehicle DISPATCHED, trip WAITING.
pub fn dispatch(
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    vehicle_id: VehicleId,
    trip_id: TripId,
    now: u64,
) -> Result<(), InvariantViolation> {
    let vehicle = vehicles
        .get(vehicle_id)
        .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
    if vehicle.phase != VehiclePhase::Idle || vehicle.trip.is_some() {
        return Err(InvariantViolation::IllegalVehicleTransition {
            vehicle: vehicle_id,
            from: vehicle.phase,
            to: VehiclePhase::Dispatched,
        });
    }
    expect_trip_phase(trips, trip_id, TripPhase::Unassigned)?;

    let vehicle = vehicles
        .get_mut(vehicle_id)
        .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
    vehicle.advance(VehiclePhase::Dispatched)?;
    vehicle.trip = Some(trip_id);

    let trip = trips
        .get_mut(trip_id)
        .ok_or(InvariantViolation::UnknownTrip(trip_id))?;
    trip.advance(TripPhase::Waiting)?;
    trip.vehicle = Some(vehicle_id);
    trip.matched_at = Some(now);
    Ok(())
}

/// A vehicle still carrying a rider reserves an UNASSIGNED trip to serve next.
/// The trip is WAITING on that vehicle; the vehicle stays WITH_RIDER.
pub fn forward_dispatch(
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    vehicle_id: VehicleId,
    trip_id: TripId,
    now: u64,
) -> Result<(), InvariantViolation> {
    let vehicle = vehicles
        .get(vehicle_id)
        .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
    if vehicle.phase != VehiclePhase::WithRider || vehicle.next_trip.is_some() {
        return Err(InvariantViolation::VehicleLink {
            vehicle: vehicle_id,
            phase: vehicle.phase,
        });
    }
    expect_trip_phase(trips, trip_id, TripPhase::Unassigned)?;

    let trip = trips
        .get_mut(trip_id)
        .ok_or(InvariantViolation::UnknownTrip(trip_id))?;
    trip.advance(TripPhase::Waiting)?;
    trip.vehicle = Some(vehicle_id);
    trip.matched_at = Some(now);

    if let Some(vehicle) = vehicles.get_mut(vehicle_id) {
        vehicle.next_trip = Some(trip_id);
    }
    Ok(())
}

/// DISPATCHED vehicle reaches the origin: vehicle WITH_RIDER, trip RIDING.
pub fn pick_up(
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    vehicle_id: VehicleId,
    now: u64,
) -> Result<TripId, InvariantViolation> {
    let vehicle = vehicles
        .get(vehicle_id)
        .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
    let trip_id = match (vehicle.phase, vehicle.trip) {
        (VehiclePhase::Dispatched, Some(trip_id)) => trip_id,
        (phase, _) => {
            return Err(InvariantViolation::VehicleLink {
                vehicle: vehicle_id,
                phase,
            })
        }
    };
    let trip = trips.get(trip_id).ok_or(InvariantViolation::DanglingTrip {
        vehicle: vehicle_id,
        trip: trip_id,
    })?;
    if trip.vehicle != Some(vehicle_id) {
        return Err(InvariantViolation::AsymmetricLink {
            vehicle: vehicle_id,
            trip: trip_id,
        });
    }
    expect_trip_phase(trips, trip_id, TripPhase::Waiting)?;

    if let Some(vehicle) = vehicles.get_mut(vehicle_id) {
        vehicle.advance(VehiclePhase::WithRider)?;
    }
    if let Some(trip) = trips.get_mut(trip_id) {
        trip.advance(TripPhase::Riding)?;
        trip.pickup_at = Some(now);
    }
    Ok(trip_id)
}

/// What a completed ride handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dropoff {
    pub completed: TripId,
    /// Forward-dispatched trip the vehicle is now heading to, if any.
    pub next: Option<TripId>,
}

/// WITH_RIDER vehicle reaches the destination. The trip becomes COMPLETED, the
/// vehicle IDLE and both links are cleared together. A trip queued by forward
/// dispatch is then taken up immediately, leaving the vehicle DISPATCHED.
pub fn drop_off(
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    vehicle_id: VehicleId,
    now: u64,
) -> Result<Dropoff, InvariantViolation> {
    let vehicle = vehicles
        .get(vehicle_id)
        .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
    let (trip_id, next) = match (vehicle.phase, vehicle.trip) {
        (VehiclePhase::WithRider, Some(trip_id)) => (trip_id, vehicle.next_trip),
        (phase, _) => {
            return Err(InvariantViolation::VehicleLink {
                vehicle: vehicle_id,
                phase,
            })
        }
    };
    let trip = trips.get(trip_id).ok_or(InvariantViolation::DanglingTrip {
        vehicle: vehicle_id,
        trip: trip_id,
    })?;
    if trip.vehicle != Some(vehicle_id) {
        return Err(InvariantViolation::AsymmetricLink {
            vehicle: vehicle_id,
            trip: trip_id,
        });
    }
    expect_trip_phase(trips, trip_id, TripPhase::Riding)?;
    if let Some(next_id) = next {
        let queued = trips.get(next_id).ok_or(InvariantViolation::DanglingTrip {
            vehicle: vehicle_id,
            trip: next_id,
        })?;
        if queued.phase != TripPhase::Waiting || queued.vehicle != Some(vehicle_id) {
            return Err(InvariantViolation::AsymmetricLink {
                vehicle: vehicle_id,
                trip: next_id,
            });
        }
    }

    if let Some(trip) = trips.get_mut(trip_id) {
        trip.advance(TripPhase::Completed)?;
        trip.vehicle = None;
        trip.dropoff_at = Some(now);
    }
    trips.note_finished(trip_id);

    if let Some(vehicle) = vehicles.get_mut(vehicle_id) {
        vehicle.advance(VehiclePhase::Idle)?;
        vehicle.trip = None;
        vehicle.next_trip = None;
        if let Some(next_id) = next {
            vehicle.advance(VehiclePhase::Dispatched)?;
            vehicle.trip = Some(next_id);
        }
    }

    Ok(Dropoff {
        completed: trip_id,
        next,
    })
}

/// UNASSIGNED trip gives up waiting.
pub fn cancel(trips: &mut TripRegistry, trip_id: TripId, now: u64) -> Result<(), InvariantViolation> {
    let trip = trips
        .get_mut(trip_id)
        .ok_or(InvariantViolation::UnknownTrip(trip_id))?;
    if trip.phase != TripPhase::Unassigned || trip.vehicle.is_some() {
        return Err(InvariantViolation::TripLink {
            trip: trip_id,
            phase: trip.phase,
        });
    }
    trip.advance(TripPhase::Cancelled)?;
    trip.cancelled_at = Some(now);
    trips.note_finished(trip_id);
    Ok(())
}

/// Checks every vehicle and every live trip for dangling or one-sided links
/// and for phase pairs that the state machines cannot produce.
pub fn validate(vehicles: &VehicleRegistry, trips: &TripRegistry) -> Result<(), InvariantViolation> {
    for vehicle in vehicles.iter() {
        match (vehicle.phase, vehicle.trip) {
            (VehiclePhase::Idle, None) if vehicle.next_trip.is_none() => {}
            (VehiclePhase::Dispatched, Some(trip_id)) if vehicle.next_trip.is_none() => {
                check_pair(vehicles, trips, vehicle.id, trip_id, TripPhase::Waiting)?;
            }
            (VehiclePhase::WithRider, Some(trip_id)) => {
                check_pair(vehicles, trips, vehicle.id, trip_id, TripPhase::Riding)?;
                if let Some(next_id) = vehicle.next_trip {
                    check_pair(vehicles, trips, vehicle.id, next_id, TripPhase::Waiting)?;
                }
            }
            (phase, _) => {
                return Err(InvariantViolation::VehicleLink {
                    vehicle: vehicle.id,
                    phase,
                })
            }
        }
    }

    for trip in trips.iter_live() {
        match (trip.phase, trip.vehicle) {
            (TripPhase::Unassigned, None) => {}
            (TripPhase::Waiting, Some(vehicle_id)) => {
                let vehicle = vehicles.get(vehicle_id).ok_or(InvariantViolation::DanglingVehicle {
                    trip: trip.id,
                    vehicle: vehicle_id,
                })?;
                let serving = vehicle.phase == VehiclePhase::Dispatched && vehicle.trip == Some(trip.id);
                let queued = vehicle.phase == VehiclePhase::WithRider && vehicle.next_trip == Some(trip.id);
                if !serving && !queued {
                    return Err(InvariantViolation::AsymmetricLink {
                        vehicle: vehicle_id,
                        trip: trip.id,
                    });
                }
            }
            (TripPhase::Riding, Some(vehicle_id)) => {
                let vehicle = vehicles.get(vehicle_id).ok_or(InvariantViolation::DanglingVehicle {
                    trip: trip.id,
                    vehicle: vehicle_id,
                })?;
                if vehicle.trip != Some(trip.id) {
                    return Err(InvariantViolation::AsymmetricLink {
                        vehicle: vehicle_id,
                        trip: trip.id,
                    });
                }
            }
            (phase, _) => return Err(InvariantViolation::TripLink { trip: trip.id, phase }),
        }
    }
    Ok(())
}

fn check_pair(
    vehicles: &VehicleRegistry,
    trips: &TripRegistry,
    vehicle_id: VehicleId,
    trip_id: TripId,
    expected: TripPhase,
) -> Result<(), InvariantViolation> {
    let trip = trips.get(trip_id).ok_or(InvariantViolation::DanglingTrip {
        vehicle: vehicle_id,
        trip: trip_id,
    })?;
    if trip.vehicle != Some(vehicle_id) {
        return Err(InvariantViolation::AsymmetricLink {
            vehicle: vehicle_id,
            trip: trip_id,
        });
    }
    if trip.phase != expected {
        let vehicle_phase = vehicles
            .get(vehicle_id)
            .map(|v| v.phase)
            .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
        return Err(InvariantViolation::PhaseMismatch {
            vehicle: vehicle_id,
            vehicle_phase,
            trip: trip_id,
            trip_phase: trip.phase,
        });
    }
    Ok(())
}
