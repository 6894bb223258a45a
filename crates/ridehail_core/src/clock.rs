use bevy_ecs::prelude::Resource;

/// Index of the block being simulated. Advanced by the runner after the block's
/// schedule has run, never by a system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource)]
pub struct BlockClock {
    block: u64,
}

impl BlockClock {
    pub fn now(&self) -> u64 {
        self.block
    }

    pub fn advance(&mut self) {
        self.block += 1;
    }

    /// True on the blocks where a task with period `interval` runs. Block 0 never qualifies.
    pub fn is_multiple_of(&self, interval: u64) -> bool {
        interval > 0 && self.block > 0 && self.block % interval == 0
    }
}
