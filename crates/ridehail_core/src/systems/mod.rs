pub mod demand;
pub mod dispatch;
pub mod equilibration;
pub mod fleet;
pub mod garbage_collection;
pub mod history;
pub mod lifecycle;
pub mod movement;
pub mod summary;
pub mod trip_progress;
pub mod validation;
