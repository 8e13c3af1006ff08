//! Battle delegation: context and result contract, mini-game registry and
//! the channel-backed provider used by interactive hosts.

mod channel;
mod error;
mod minigame;
mod types;

pub use channel::{BattleCanceller, BattleRequest, ChannelBattleProvider, DEFAULT_BATTLE_TIMEOUT};
pub use error::BattleError;
pub use minigame::{MiniGameDescriptor, MiniGameRegistry};
pub use types::{
    AttributeChanges, BattleContext, BattleEnvironment, BattleMonster, BattleOutcome,
    BattlePlayer, BattleResult, BattleRewards, CombatStats, DEFAULT_MINI_GAME_ID,
    InventoryReward, MonsterChanges,
};
