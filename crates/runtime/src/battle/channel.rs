//! Battle provider that hands each battle to the host over a channel.
//!
//! The host receives a [`BattleRequest`], runs whatever interactive
//! mini-game it likes and answers through [`BattleRequest::respond`]. The
//! provider owns the session lifecycle: at most one battle is in flight, a
//! session ends exactly once (answer, timeout or cancellation) and nothing
//! outlives it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::BattleError;
use super::minigame::{MiniGameDescriptor, MiniGameRegistry};
use super::types::{BattleContext, BattleResult};
use crate::api::BattleProvider;

/// Default time a host gets to answer a battle.
pub const DEFAULT_BATTLE_TIMEOUT: Duration = Duration::from_millis(60_000);

/// One battle awaiting an answer from the host.
#[derive(Debug)]
pub struct BattleRequest {
    pub context: BattleContext,
    pub descriptor: Option<MiniGameDescriptor>,
    responder: oneshot::Sender<Option<BattleResult>>,
}

impl BattleRequest {
    /// Answers the battle; `None` means the player backed out.
    ///
    /// Returns `false` when the session already ended (timeout or cancel).
    pub fn respond(self, result: Option<BattleResult>) -> bool {
        self.responder.send(result).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.responder.is_closed()
    }
}

type ActiveSlot = Arc<Mutex<Option<CancellationToken>>>;

fn lock(slot: &ActiveSlot) -> MutexGuard<'_, Option<CancellationToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Host-side handle that aborts the battle currently in flight.
#[derive(Clone, Debug)]
pub struct BattleCanceller {
    active: ActiveSlot,
}

impl BattleCanceller {
    /// Returns `true` when a battle was running.
    pub fn cancel(&self) -> bool {
        match lock(&self.active).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }
}

/// Clears the active slot when the session future completes or is dropped.
struct SessionGuard {
    active: ActiveSlot,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock(&self.active).take();
    }
}

pub struct ChannelBattleProvider {
    requests: mpsc::Sender<BattleRequest>,
    default_timeout: Option<Duration>,
    descriptors: HashMap<String, MiniGameDescriptor>,
    shutdown: CancellationToken,
    active: ActiveSlot,
}

impl ChannelBattleProvider {
    /// Creates the provider and the receiver the host reads requests from.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<BattleRequest>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let provider = Self {
            requests: tx,
            default_timeout: Some(DEFAULT_BATTLE_TIMEOUT),
            descriptors: HashMap::new(),
            shutdown: CancellationToken::new(),
            active: Arc::new(Mutex::new(None)),
        };
        (provider, rx)
    }

    /// `None` or a zero duration disables the timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout.filter(|d| !d.is_zero());
        self
    }

    /// Sessions are children of `token`; cancelling it aborts any battle.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Copies descriptors so per-game timeouts apply and requests carry them.
    pub fn with_mini_games(mut self, registry: &MiniGameRegistry) -> Self {
        self.descriptors = registry
            .descriptors()
            .iter()
            .map(|d| (d.id.clone(), d.clone()))
            .collect();
        self
    }

    pub fn canceller(&self) -> BattleCanceller {
        BattleCanceller {
            active: Arc::clone(&self.active),
        }
    }

    fn timeout_for(&self, descriptor: Option<&MiniGameDescriptor>) -> Option<Duration> {
        match descriptor.and_then(MiniGameDescriptor::timeout) {
            Some(timeout) if timeout.is_zero() => None,
            Some(timeout) => Some(timeout),
            None => self.default_timeout,
        }
    }

    fn begin_session(&self) -> Result<(CancellationToken, SessionGuard), BattleError> {
        let mut slot = lock(&self.active);
        if slot.is_some() {
            return Err(BattleError::LaunchFailed(
                "another battle is currently running".into(),
            ));
        }
        let token = self.shutdown.child_token();
        *slot = Some(token.clone());
        Ok((
            token,
            SessionGuard {
                active: Arc::clone(&self.active),
            },
        ))
    }
}

#[async_trait]
impl BattleProvider for ChannelBattleProvider {
    async fn run_battle(
        &self,
        context: BattleContext,
    ) -> Result<Option<BattleResult>, BattleError> {
        if self.shutdown.is_cancelled() {
            return Err(BattleError::Cancelled);
        }

        let (token, _guard) = self.begin_session()?;
        let descriptor = self
            .descriptors
            .get(&context.monster.mini_game_id)
            .cloned();
        let timeout = self.timeout_for(descriptor.as_ref());
        let battle_id = context.id.clone();

        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(BattleRequest {
                context,
                descriptor,
                responder: reply_tx,
            })
            .await
            .map_err(|_| BattleError::ChannelClosed)?;

        debug!(battle = %battle_id, ?timeout, "battle request delivered");

        let expiry = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            reply = reply_rx => reply.map_err(|_| BattleError::ChannelClosed),
            _ = token.cancelled() => {
                debug!(battle = %battle_id, "battle cancelled");
                Err(BattleError::Cancelled)
            }
            _ = expiry => {
                let after_ms = timeout.map_or(0, |d| d.as_millis() as u64);
                warn!(battle = %battle_id, after_ms, "battle timed out");
                Err(BattleError::TimedOut { after_ms })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::types::{
        BattleEnvironment, BattleMonster, BattlePlayer, CombatStats, DEFAULT_MINI_GAME_ID,
    };
    use tower_core::{Inventory, Position, TileKey};

    fn context() -> BattleContext {
        BattleContext {
            id: "battle-1".into(),
            level_name: "Lobby".into(),
            player: BattlePlayer {
                name: "Traveler".into(),
                stats: CombatStats {
                    hp: 100,
                    atk: 10,
                    def: 5,
                },
                inventory: Inventory::new(),
                keys: 0,
            },
            monster: BattleMonster {
                id: TileKey::new(2, 1),
                name: "Slime".into(),
                stats: CombatStats {
                    hp: 20,
                    atk: 5,
                    def: 0,
                },
                mini_game_id: DEFAULT_MINI_GAME_ID.into(),
            },
            environment: BattleEnvironment {
                position: Position::new(2, 1),
                seed: 7,
                extra: None,
            },
        }
    }

    #[tokio::test]
    async fn host_answer_is_returned() {
        let (provider, mut rx) = ChannelBattleProvider::new(1);
        let host = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.context.monster.name, "Slime");
            request.respond(Some(BattleResult::victory()));
        });

        let result = provider.run_battle(context()).await.unwrap();
        host.await.unwrap();
        assert_eq!(result, Some(BattleResult::victory()));
        assert!(!provider.canceller().is_active());
    }

    #[tokio::test]
    async fn host_may_decline() {
        let (provider, mut rx) = ChannelBattleProvider::new(1);
        tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            request.respond(None);
        });

        assert_eq!(provider.run_battle(context()).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_battle_times_out() {
        let (provider, mut rx) = ChannelBattleProvider::new(1);
        let provider = provider.with_timeout(Some(Duration::from_millis(50)));
        let keep = tokio::spawn(async move { rx.recv().await });

        let err = provider.run_battle(context()).await.unwrap_err();
        assert!(matches!(err, BattleError::TimedOut { after_ms: 50 }));

        // The host's late answer is rejected.
        let request = keep.await.unwrap().unwrap();
        assert!(!request.respond(Some(BattleResult::victory())));
    }

    #[tokio::test]
    async fn canceller_aborts_in_flight_battle() {
        let (provider, mut rx) = ChannelBattleProvider::new(1);
        let canceller = provider.canceller();
        tokio::spawn(async move {
            let _request = rx.recv().await.unwrap();
            assert!(canceller.cancel());
            // Hold the request so the responder stays open.
            tokio::time::sleep(Duration::from_millis(50)).await;
        });

        let err = provider.run_battle(context()).await.unwrap_err();
        assert!(matches!(err, BattleError::Cancelled));
        assert!(!provider.canceller().cancel());
    }

    #[tokio::test]
    async fn dropped_request_reports_closed_channel() {
        let (provider, mut rx) = ChannelBattleProvider::new(1);
        tokio::spawn(async move {
            drop(rx.recv().await);
        });

        let err = provider.run_battle(context()).await.unwrap_err();
        assert!(matches!(err, BattleError::ChannelClosed));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_battles() {
        let shutdown = CancellationToken::new();
        let (provider, _rx) = ChannelBattleProvider::new(1);
        let provider = provider.with_shutdown(shutdown.clone());
        shutdown.cancel();

        let err = provider.run_battle(context()).await.unwrap_err();
        assert!(matches!(err, BattleError::Cancelled));
    }

    #[tokio::test]
    async fn descriptor_travels_with_request() {
        let mut registry = MiniGameRegistry::new();
        registry.register([MiniGameDescriptor::new(DEFAULT_MINI_GAME_ID, "Quiz", "/quiz/")]);
        let (provider, mut rx) = ChannelBattleProvider::new(1);
        let provider = provider.with_mini_games(&registry);
        tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            let name = request.descriptor.as_ref().map(|d| d.name.clone());
            assert_eq!(name.as_deref(), Some("Quiz"));
            request.respond(None);
        });

        provider.run_battle(context()).await.unwrap();
    }
}
