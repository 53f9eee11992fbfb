use async_trait::async_trait;

use crate::{
    args::Lang,
    error::Error,
    models::{ClaimedReward, Diary, GameAccount, RewardInfo, UserStatsSnapshot},
};

/// Operations on a game account that the run needs.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Resolves the account to work with, the first bound one when `uid` is `None`.
    async fn game_account(&self, uid: Option<u64>) -> Result<GameAccount, Error>;

    async fn user_stats(&self, account: &GameAccount, lang: Lang)
        -> Result<UserStatsSnapshot, Error>;

    async fn diary(&self, account: &GameAccount, lang: Lang) -> Result<Diary, Error>;

    /// Claims today's check-in reward. Fails with `Error::AlreadyClaimed` if it was
    /// collected earlier today.
    async fn claim_daily_reward(&self, lang: Lang) -> Result<(), Error>;

    /// Claimed rewards, most recent first.
    async fn claimed_rewards(&self, lang: Lang) -> Result<Vec<ClaimedReward>, Error>;

    async fn reward_info(&self, lang: Lang) -> Result<RewardInfo, Error>;

    async fn redeem_code(&self, account: &GameAccount, code: &str) -> Result<(), Error>;
}
