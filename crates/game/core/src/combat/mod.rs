//! Battle math and equipment rewards.
//!
//! Everything here is side-effect free: the forecast is a pure function of
//! the two stat blocks and the equipment roll takes its RNG as a parameter.

pub mod equipment;
pub mod formula;

pub use equipment::{
    ALL_EQUIPMENT, EquipmentBonus, EquipmentDefinition, equipment_bonus, equipment_definition,
    pick_equipment_reward,
};
pub use formula::{BattleForecast, HpLoss, forecast, forecast_for};
