use bevy_ecs::prelude::Resource;

use crate::city::Location;
use crate::entities::{Trip, TripId, TripPhase};
use crate::error::InvariantViolation;

/// Origin, destination and patience of a trip about to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripDraft {
    pub origin: Location,
    pub destination: Location,
    pub distance: u32,
    pub cancel_after: Option<u32>,
}

/// Dense arena of trips ordered by id.
///
/// Terminal trips stay in place until the next garbage collection, so every
/// scan goes through [`TripRegistry::iter_live`] or the id lists it produces.
/// Completed and cancelled trips are queued for retirement instead of being
/// searched for at the next block boundary.
#[derive(Debug, Default, Clone, Resource)]
pub struct TripRegistry {
    trips: Vec<Trip>,
    next_id: u64,
    live: usize,
    retiring: Vec<TripId>,
}

impl TripRegistry {
    /// All trips held, dead or alive.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Completed, cancelled and inactive trips awaiting collection.
    pub fn dead_count(&self) -> usize {
        self.trips.len() - self.live
    }

    fn index_of(&self, id: TripId) -> Option<usize> {
        self.trips.binary_search_by_key(&id, |t| t.id).ok()
    }

    pub fn get(&self, id: TripId) -> Option<&Trip> {
        self.index_of(id).map(|idx| &self.trips[idx])
    }

    pub fn get_mut(&mut self, id: TripId) -> Option<&mut Trip> {
        self.index_of(id).map(move |idx| &mut self.trips[idx])
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &Trip> {
        self.trips.iter().filter(|t| t.phase.is_live())
    }

    /// Every trip including dead ones. Only for inspection; engine stages use
    /// [`TripRegistry::iter_live`].
    pub fn iter_all(&self) -> impl Iterator<Item = &Trip> {
        self.trips.iter()
    }

    pub fn ids_in(&self, phase: TripPhase) -> Vec<TripId> {
        debug_assert!(phase.is_live(), "scans must skip terminal trips");
        self.iter_live()
            .filter(|t| t.phase == phase)
            .map(|t| t.id)
            .collect()
    }

    /// Registers a new request in the UNASSIGNED phase.
    pub fn create(&mut self, requested_at: u64, draft: TripDraft) -> TripId {
        let id = TripId(self.next_id);
        self.next_id += 1;
        self.trips.push(Trip {
            id,
            phase: TripPhase::Unassigned,
            origin: draft.origin,
            destination: draft.destination,
            distance: draft.distance,
            vehicle: None,
            requested_at,
            cancel_after: draft.cancel_after,
            matched_at: None,
            pickup_at: None,
            dropoff_at: None,
            cancelled_at: None,
        });
        self.live += 1;
        id
    }

    /// Records that a trip just reached COMPLETED or CANCELLED.
    pub(crate) fn note_finished(&mut self, id: TripId) {
        self.live -= 1;
        self.retiring.push(id);
    }

    /// Moves trips finished during the previous block to INACTIVE.
    pub fn retire_finished(&mut self) -> Result<usize, InvariantViolation> {
        let retiring = std::mem::take(&mut self.retiring);
        for id in &retiring {
            let trip = self
                .get_mut(*id)
                .ok_or(InvariantViolation::UnknownTrip(*id))?;
            trip.advance(TripPhase::Inactive)?;
        }
        Ok(retiring.len())
    }

    /// Purges every terminal trip: completed, cancelled and inactive alike.
    /// Returns how many were removed.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.trips.len();
        self.trips.retain(|t| t.phase.is_live());
        // Anything still queued for retirement is gone with the rest.
        self.retiring.clear();
        before - self.trips.len()
    }

    pub fn clear(&mut self) {
        self.trips.clear();
        self.retiring.clear();
        self.next_id = 0;
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TripDraft {
        TripDraft {
            origin: Location::new(0, 0),
            destination: Location::new(1, 2),
            distance: 3,
            cancel_after: None,
        }
    }

    fn finish(registry: &mut TripRegistry, id: TripId, phase: TripPhase) {
        registry.get_mut(id).expect("trip").phase = phase;
        registry.note_finished(id);
    }

    #[test]
    fn collection_purges_inactive_as_well_as_finished() {
        let mut registry = TripRegistry::default();
        let ids: Vec<_> = (0..5).map(|b| registry.create(b, draft())).collect();

        finish(&mut registry, ids[0], TripPhase::Completed);
        finish(&mut registry, ids[1], TripPhase::Cancelled);
        assert_eq!(registry.retire_finished(), Ok(2));
        finish(&mut registry, ids[2], TripPhase::Completed);
        registry.get_mut(ids[3]).expect("trip").phase = TripPhase::Riding;

        assert_eq!(registry.dead_count(), 3);
        assert_eq!(registry.collect_garbage(), 3);
        assert_eq!(registry.dead_count(), 0);
        assert!(registry.iter_all().all(|t| t.phase.is_live()));
        assert_eq!(registry.get(ids[3]).map(|t| t.phase), Some(TripPhase::Riding));
        assert_eq!(registry.get(ids[4]).map(|t| t.phase), Some(TripPhase::Unassigned));
    }

    #[test]
    fn retire_moves_finished_trips_to_inactive_once() {
        let mut registry = TripRegistry::default();
        let id = registry.create(0, draft());
        registry.get_mut(id).expect("trip").phase = TripPhase::Riding;
        finish(&mut registry, id, TripPhase::Completed);

        assert_eq!(registry.retire_finished(), Ok(1));
        assert_eq!(registry.get(id).map(|t| t.phase), Some(TripPhase::Inactive));
        assert_eq!(registry.retire_finished(), Ok(0));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn ids_keep_increasing_after_collection() {
        let mut registry = TripRegistry::default();
        let first = registry.create(0, draft());
        finish(&mut registry, first, TripPhase::Cancelled);
        registry.collect_garbage();
        let second = registry.create(1, draft());
        assert!(second > first);
        assert!(registry.get(first).is_none());
    }
}
