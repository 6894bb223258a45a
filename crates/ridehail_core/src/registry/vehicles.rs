use bevy_ecs::prelude::Resource;

use crate::city::{Direction, Location};
use crate::entities::{Vehicle, VehicleId, VehiclePhase};

/// Dense arena of vehicles ordered by id. Ids are never reused until reset.
#[derive(Debug, Default, Clone, Resource)]
pub struct VehicleRegistry {
    vehicles: Vec<Vehicle>,
    next_id: u32,
}

impl VehicleRegistry {
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    fn index_of(&self, id: VehicleId) -> Option<usize> {
        self.vehicles.binary_search_by_key(&id, |v| v.id).ok()
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.index_of(id).map(|idx| &self.vehicles[idx])
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.index_of(id).map(move |idx| &mut self.vehicles[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vehicle> {
        self.vehicles.iter_mut()
    }

    pub fn ids(&self) -> Vec<VehicleId> {
        self.vehicles.iter().map(|v| v.id).collect()
    }

    pub fn spawn(&mut self, location: Location, direction: Direction) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        self.vehicles.push(Vehicle::new(id, location, direction));
        id
    }

    pub fn count_in(&self, phase: VehiclePhase) -> usize {
        self.vehicles.iter().filter(|v| v.phase == phase).count()
    }

    /// Removes up to `count` idle vehicles, newest first. Busy vehicles are never
    /// removed, so no trip is left pointing at a missing vehicle.
    pub fn remove_idle(&mut self, count: usize) -> usize {
        let mut doomed: Vec<VehicleId> = self
            .vehicles
            .iter()
            .rev()
            .filter(|v| v.is_idle() && v.trip.is_none() && v.next_trip.is_none())
            .map(|v| v.id)
            .take(count)
            .collect();
        doomed.sort_unstable();
        let removed = doomed.len();
        if removed > 0 {
            self.vehicles
                .retain(|v| doomed.binary_search(&v.id).is_err());
        }
        removed
    }

    pub fn clear(&mut self) {
        self.vehicles.clear();
        self.next_id = 0;
    }
}
