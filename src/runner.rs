use log::info;

use crate::{
    codes::{self, Redemption},
    config::Config,
    error::Error,
    gate::RateGate,
    models::select_abyss,
    render::{self, Bindings},
    rewards,
    service::AccountService,
    webpage::CodeSource,
};

pub struct Runner<S, C> {
    config: Config,
    service: S,
    source: C,
}

impl<S: AccountService, C: CodeSource> Runner<S, C> {
    pub fn new(config: Config, service: S, source: C) -> Self {
        Runner {
            config,
            service,
            source,
        }
    }

    /// Renders the stats page, then redeems any codes not seen before.
    pub async fn run(self) -> Result<Redemption, Error> {
        let Runner {
            config,
            service,
            source,
        } = self;
        let lang = config.lang;

        let account = service.game_account(config.uid).await?;
        info!("Using account {} on {}", account.uid, account.region);

        let user = service.user_stats(&account, lang).await?;
        let diary = service.diary(&account, lang).await?;
        let reward = rewards::claim_and_collect(&service, lang).await?;
        info!(
            "Checked in {} days this month{}",
            reward.info.total_sign_day,
            if reward.already_claimed { ", today's reward was already claimed" } else { "" }
        );

        let bindings = Bindings {
            user: &user,
            lang,
            abyss: select_abyss(&user),
            reward: reward.latest.as_ref(),
            diary: &diary,
            reward_info: &reward.info,
            updated_at: render::updated_at(reward.latest.as_ref()),
        };
        render::render_file(&config.template, &config.output, &bindings).await?;
        info!("Wrote {}", config.output.display());

        let scraped = source.fetch_codes().await?;
        let mut gate = RateGate::new(config.redeem_delay);
        let redemption = codes::track(
            &service,
            &account,
            &config.codes_file,
            &scraped,
            &mut gate,
        )
        .await?;
        println!("{}", redemption.summary());
        Ok(redemption)
    }
}
