pub mod geo;
pub mod qualification;
pub mod ranking;
