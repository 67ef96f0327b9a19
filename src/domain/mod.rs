//! Pure decision logic for the ordering platform

pub mod delivery;
pub mod events;
pub mod messaging;
pub mod tracking;
pub mod value_objects;
