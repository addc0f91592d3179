pub mod booking;
pub mod lifecycle;
pub mod locks;
pub mod side_effects;
