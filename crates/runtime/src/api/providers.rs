//! Asynchronous abstraction for adjudicating monster battles.
//!
//! Runtime users plug in [`BattleProvider`] implementations so a monster
//! encounter can be decided by an interactive mini-game, a scripted fixture,
//! or the deterministic formula.
use async_trait::async_trait;
use tower_core::{HpLoss, equipment_bonus, forecast};

use crate::battle::{
    AttributeChanges, BattleContext, BattleError, BattleResult, MonsterChanges,
};

/// Trait for deciding the outcome of a monster encounter.
///
/// The world is not touched while a battle is pending; whatever the provider
/// returns is applied afterwards in one step.
#[async_trait]
pub trait BattleProvider: Send + Sync {
    /// Runs one battle.
    ///
    /// # Returns
    /// `Ok(Some(result))` when the battle finished, `Ok(None)` when the
    /// player cancelled, or an error when it could not run at all.
    async fn run_battle(&self, context: BattleContext)
    -> Result<Option<BattleResult>, BattleError>;
}

/// Decides battles with the deterministic forecast, including equipment bonuses.
///
/// A winnable fight costs the forecast HP loss and defeats the monster; an
/// unwinnable one is reported as a defeat with no changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormulaBattleProvider;

#[async_trait]
impl BattleProvider for FormulaBattleProvider {
    async fn run_battle(
        &self,
        context: BattleContext,
    ) -> Result<Option<BattleResult>, BattleError> {
        let player = &context.player;
        let bonus = equipment_bonus(&player.inventory);
        let monster = context.monster.as_monster_stats();
        let outcome = forecast(
            player.stats.hp,
            player.stats.atk.saturating_add(bonus.atk),
            player.stats.def.saturating_add(bonus.def),
            &monster,
        );

        if !outcome.can_win {
            return Ok(Some(BattleResult::defeat()));
        }

        let hp_loss = match outcome.hp_loss {
            HpLoss::Finite(loss) => loss,
            HpLoss::Unbounded => player.stats.hp,
        };
        Ok(Some(
            BattleResult::victory()
                .with_player(AttributeChanges {
                    hp: Some(player.stats.hp.saturating_sub(hp_loss)),
                    ..AttributeChanges::default()
                })
                .with_monster(MonsterChanges {
                    defeated: Some(true),
                    ..MonsterChanges::default()
                }),
        ))
    }
}
