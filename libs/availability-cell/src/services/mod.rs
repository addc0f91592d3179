pub mod blocks;
pub mod rules;
pub mod slot_engine;

pub use blocks::BlockService;
pub use rules::RuleService;
pub use slot_engine::{DayRequest, DaySchedule, SlotEngine};
