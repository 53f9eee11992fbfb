use log::{info, warn};

use crate::{
    args::Lang,
    error::Error,
    models::{ClaimedReward, RewardInfo},
    service::AccountService,
};

/// How the daily check-in attempt resolved.
#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyClaimed,
    Failed(Error),
}

impl From<Result<(), Error>> for ClaimOutcome {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => ClaimOutcome::Claimed,
            Err(Error::AlreadyClaimed) => ClaimOutcome::AlreadyClaimed,
            Err(e) => ClaimOutcome::Failed(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewardState {
    pub already_claimed: bool,
    /// Most recently claimed reward, absent if nothing was ever claimed.
    pub latest: Option<ClaimedReward>,
    pub info: RewardInfo,
}

/// Claims today's reward, then reads the reward history and program info whatever the
/// claim outcome was. A failed claim is reported only after both reads are done.
pub async fn claim_and_collect<S: AccountService + ?Sized>(
    service: &S,
    lang: Lang,
) -> Result<RewardState, Error> {
    let outcome = ClaimOutcome::from(service.claim_daily_reward(lang).await);
    match &outcome {
        ClaimOutcome::Claimed => info!("Claimed today's check-in reward"),
        ClaimOutcome::AlreadyClaimed => info!("Today's check-in reward was already claimed"),
        ClaimOutcome::Failed(e) => warn!("Failed to claim today's check-in reward: {e}"),
    }

    let latest = service.claimed_rewards(lang).await?.into_iter().next();
    let info = service.reward_info(lang).await?;

    match outcome {
        ClaimOutcome::Failed(e) => Err(e),
        outcome => Ok(RewardState {
            already_claimed: matches!(outcome, ClaimOutcome::AlreadyClaimed),
            latest,
            info,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::{Claim, FakeService};

    const FOLLOW_UP: [&str; 3] = ["claim_daily_reward", "claimed_rewards", "reward_info"];

    #[tokio::test]
    async fn fresh_claim_collects_history() {
        let service = FakeService::default();
        let state = claim_and_collect(&service, Lang::EnUs).await.unwrap();
        assert!(!state.already_claimed);
        assert_eq!(state.latest.unwrap().id, 7);
        assert_eq!(state.info.total_sign_day, 5);
        assert_eq!(service.calls(), FOLLOW_UP);
    }

    #[tokio::test]
    async fn already_claimed_never_aborts() {
        let service = FakeService {
            claim: Claim::AlreadyClaimed,
            ..Default::default()
        };
        let state = claim_and_collect(&service, Lang::EnUs).await.unwrap();
        assert!(state.already_claimed);
        assert!(state.latest.is_some());
        assert_eq!(service.calls(), FOLLOW_UP);
    }

    #[tokio::test]
    async fn failed_claim_still_fetches_history_then_fails() {
        let service = FakeService {
            claim: Claim::Fail,
            ..Default::default()
        };
        let err = claim_and_collect(&service, Lang::EnUs).await.unwrap_err();
        assert!(matches!(err, Error::Service { retcode: -10002, .. }));
        assert_eq!(service.calls(), FOLLOW_UP);
    }

    #[tokio::test]
    async fn history_failure_propagates() {
        let service = FakeService {
            claim: Claim::AlreadyClaimed,
            history_fails: true,
            ..Default::default()
        };
        let err = claim_and_collect(&service, Lang::EnUs).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn outcome_classifies_results() {
        assert!(matches!(ClaimOutcome::from(Ok(())), ClaimOutcome::Claimed));
        assert!(matches!(
            ClaimOutcome::from(Err(Error::AlreadyClaimed)),
            ClaimOutcome::AlreadyClaimed
        ));
        assert!(matches!(
            ClaimOutcome::from(Err(Error::NoAccount)),
            ClaimOutcome::Failed(Error::NoAccount)
        ));
    }
}
