//! Battle context handed to a provider and the result it answers with.
//!
//! Both sides are serde types using camelCase field names so a host can
//! forward them over any transport as JSON.

use serde::{Deserialize, Serialize};

use tower_core::{Inventory, MonsterStats, Position, TileKey};

pub const DEFAULT_MINI_GAME_ID: &str = "quiz";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlePlayer {
    pub name: String,
    pub stats: CombatStats,
    pub inventory: Inventory,
    pub keys: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleMonster {
    /// Tile key of the monster's cell.
    pub id: TileKey,
    pub name: String,
    pub stats: CombatStats,
    pub mini_game_id: String,
}

impl BattleMonster {
    pub fn as_monster_stats(&self) -> MonsterStats {
        MonsterStats::new(
            self.name.clone(),
            self.stats.hp,
            self.stats.atk,
            self.stats.def,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleEnvironment {
    pub position: Position,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleContext {
    /// Unique per battle session.
    pub id: String,
    pub level_name: String,
    pub player: BattlePlayer,
    pub monster: BattleMonster,
    pub environment: BattleEnvironment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Abort,
}

/// Absolute overrides are applied before deltas; every result is clamped at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atk: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_atk: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_def: Option<i32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defeated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_hp: Option<i32>,
}

impl MonsterChanges {
    pub fn touches_hp(&self) -> bool {
        self.hp.is_some() || self.delta_hp.is_some()
    }

    /// Stored hp after applying the override and then the delta.
    pub fn apply_hp(&self, stored: i32) -> i32 {
        let base = self.hp.unwrap_or(stored);
        base.saturating_add(self.delta_hp.unwrap_or(0))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryReward {
    pub gid: String,
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleRewards {
    /// Floored before use; negative values take keys away.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<f64>,
    #[serde(default)]
    pub inventory: Vec<InventoryReward>,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub outcome: BattleOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<AttributeChanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monster: Option<MonsterChanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<BattleRewards>,
}

impl BattleResult {
    pub fn new(outcome: BattleOutcome) -> Self {
        Self {
            outcome,
            message: None,
            player: None,
            monster: None,
            rewards: None,
        }
    }

    pub fn victory() -> Self {
        Self::new(BattleOutcome::Victory)
    }

    pub fn defeat() -> Self {
        Self::new(BattleOutcome::Defeat)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_player(mut self, changes: AttributeChanges) -> Self {
        self.player = Some(changes);
        self
    }

    pub fn with_monster(mut self, changes: MonsterChanges) -> Self {
        self.monster = Some(changes);
        self
    }

    pub fn with_rewards(mut self, rewards: BattleRewards) -> Self {
        self.rewards = Some(rewards);
        self
    }

    /// Explicit `defeated` flag first, then the outcome tag.
    pub fn declares_defeat(&self) -> bool {
        self.monster
            .and_then(|m| m.defeated)
            .unwrap_or(self.outcome == BattleOutcome::Victory)
    }

    /// Trimmed message, if it has any content.
    pub fn trimmed_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_parses_host_json() {
        let raw = r#"{
            "outcome": "defeat",
            "player": { "deltaHp": -12 },
            "monster": { "defeated": false, "deltaHp": -5 },
            "rewards": { "keys": 1.7, "inventory": [{ "gid": "badge", "count": 1 }] }
        }"#;
        let result: BattleResult = serde_json::from_str(raw).unwrap();

        assert_eq!(result.outcome, BattleOutcome::Defeat);
        assert_eq!(result.player.unwrap().delta_hp, Some(-12));
        assert!(!result.declares_defeat());
        let rewards = result.rewards.unwrap();
        assert_eq!(rewards.keys, Some(1.7));
        assert_eq!(rewards.inventory[0].gid, "badge");
        assert!(rewards.messages.is_empty());
    }

    #[test]
    fn defeat_flag_overrides_outcome() {
        let result = BattleResult::victory().with_monster(MonsterChanges {
            defeated: Some(false),
            ..MonsterChanges::default()
        });
        assert!(!result.declares_defeat());
        assert!(BattleResult::victory().declares_defeat());
        assert!(!BattleResult::defeat().declares_defeat());
    }

    #[test]
    fn monster_hp_override_then_delta() {
        let changes = MonsterChanges {
            hp: Some(8),
            delta_hp: Some(-3),
            defeated: None,
        };
        assert_eq!(changes.apply_hp(20), 5);
        assert!(!MonsterChanges::default().touches_hp());
    }

    #[test]
    fn monster_hp_delta_saturates() {
        let healed = MonsterChanges {
            delta_hp: Some(5),
            ..MonsterChanges::default()
        };
        assert_eq!(healed.apply_hp(i32::MAX), i32::MAX);

        let crushed = MonsterChanges {
            hp: Some(i32::MIN),
            delta_hp: Some(-1_000_000),
            defeated: None,
        };
        assert_eq!(crushed.apply_hp(1_000_000), i32::MIN);
    }

    #[test]
    fn blank_messages_are_ignored() {
        assert_eq!(BattleResult::victory().with_message("  ").trimmed_message(), None);
        assert_eq!(
            BattleResult::victory().with_message(" Well fought. ").trimmed_message(),
            Some("Well fought.")
        );
    }
}
