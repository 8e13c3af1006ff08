//! Deterministic battle forecast used when no interactive battle is wired in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{MonsterStats, PlayerState};

/// HP the player is expected to lose over a full fight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HpLoss {
    Finite(i32),
    /// The player cannot damage the monster, so the fight never ends.
    Unbounded,
}

impl HpLoss {
    pub fn is_finite(self) -> bool {
        matches!(self, HpLoss::Finite(_))
    }

    /// Whether `hp` strictly exceeds this loss.
    pub fn survivable_with(self, hp: i32) -> bool {
        match self {
            HpLoss::Finite(loss) => hp > loss,
            HpLoss::Unbounded => false,
        }
    }
}

impl fmt::Display for HpLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HpLoss::Finite(loss) => write!(f, "{loss}"),
            HpLoss::Unbounded => f.write_str("inf"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleForecast {
    pub can_win: bool,
    pub hp_loss: HpLoss,
    /// Player attacks needed to bring the monster to zero; 0 when unwinnable.
    pub rounds: i32,
    pub player_damage: i32,
    pub monster_damage: i32,
}

/// Forecasts a fight between the player's stats and `monster`.
///
/// # Formula
///
/// ```text
/// player_damage  = max(0, atk - monster.def)
/// monster_damage = max(0, monster.atk - def)
/// rounds         = ceil(monster.hp / player_damage)
/// hp_loss        = max(0, (rounds - 1) * monster_damage)
/// can_win        = hp > hp_loss
/// ```
///
/// The monster strikes back once per round except the last, and surviving
/// requires strictly more HP than the loss.
pub fn forecast(hp: i32, atk: i32, def: i32, monster: &MonsterStats) -> BattleForecast {
    // Widened so boss-sized stats cannot overflow.
    let player_damage = (i64::from(atk) - i64::from(monster.def)).max(0);
    let monster_damage = (i64::from(monster.atk) - i64::from(def)).max(0);

    if player_damage == 0 {
        return BattleForecast {
            can_win: false,
            hp_loss: HpLoss::Unbounded,
            rounds: 0,
            player_damage: 0,
            monster_damage: saturate(monster_damage),
        };
    }

    let rounds = ceil_div(i64::from(monster.hp).max(0), player_damage);
    let hp_loss = saturate((rounds - 1).saturating_mul(monster_damage).max(0));

    BattleForecast {
        can_win: hp > hp_loss,
        hp_loss: HpLoss::Finite(hp_loss),
        rounds: saturate(rounds),
        player_damage: saturate(player_damage),
        monster_damage: saturate(monster_damage),
    }
}

/// [`forecast`] for the live player state.
pub fn forecast_for(player: &PlayerState, monster: &MonsterStats) -> BattleForecast {
    forecast(player.hp, player.atk, player.def, monster)
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winnable_fight_without_retaliation() {
        let monster = MonsterStats::new("Slime", 20, 5, 0);
        let result = forecast(100, 10, 5, &monster);
        assert_eq!(result.player_damage, 10);
        assert_eq!(result.monster_damage, 0);
        assert_eq!(result.rounds, 2);
        assert_eq!(result.hp_loss, HpLoss::Finite(0));
        assert!(result.can_win);
    }

    #[test]
    fn armour_the_player_cannot_pierce_is_unwinnable() {
        let monster = MonsterStats::new("Golem", 20, 5, 10);
        let result = forecast(100, 10, 5, &monster);
        assert_eq!(result.player_damage, 0);
        assert_eq!(result.hp_loss, HpLoss::Unbounded);
        assert!(!result.can_win);
    }

    #[test]
    fn last_round_is_free_and_survival_is_strict() {
        // 3 rounds, monster hits twice for 4.
        let monster = MonsterStats::new("Bat", 25, 6, 0);
        let result = forecast(8, 10, 2, &monster);
        assert_eq!(result.rounds, 3);
        assert_eq!(result.hp_loss, HpLoss::Finite(8));
        assert!(!result.can_win);

        assert!(forecast(9, 10, 2, &monster).can_win);
    }

    #[test]
    fn boss_sized_stats_saturate_instead_of_overflowing() {
        let boss = MonsterStats::new("Boss", 1_000_000, 5_000, 0);
        let result = forecast(100, 1, 0, &boss);
        assert_eq!(result.rounds, 1_000_000);
        assert_eq!(result.hp_loss, HpLoss::Finite(i32::MAX));
        assert!(!result.can_win);

        let titan = MonsterStats::new("Titan", i32::MAX, 5, 0);
        let result = forecast(100, 1, 0, &titan);
        assert_eq!(result.rounds, i32::MAX);
        assert!(!result.can_win);

        let result = forecast(i32::MAX, i32::MAX, 0, &MonsterStats::new("Imp", 1, 1, i32::MIN));
        assert_eq!(result.player_damage, i32::MAX);
        assert_eq!(result.rounds, 1);
        assert_eq!(result.hp_loss, HpLoss::Finite(0));
    }

    #[test]
    fn unbounded_loss_is_never_survivable() {
        assert!(!HpLoss::Unbounded.survivable_with(i32::MAX));
        assert!(HpLoss::Finite(3).survivable_with(4));
        assert!(!HpLoss::Finite(3).survivable_with(3));
    }
}
