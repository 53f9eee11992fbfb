use async_trait::async_trait;
use chrono::{Datelike, Utc};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
    args::Lang,
    config::Cookies,
    ds,
    error::Error,
    models::{
        AbyssCycles, CharacterList, ClaimedReward, ClaimedRewardPage, Diary, GameAccount,
        GameAccountList, GameRecord, RewardInfo, SpiralAbyss, UserStatsSnapshot,
    },
    response::{self, Envelope},
    service::AccountService,
};

const GAME_BIZ: &str = "hk4e_global";
const REWARD_ACT_ID: &str = "e202102251931481";
const APP_VERSION: &str = "1.5.0";
const CLIENT_TYPE: &str = "5";
const BROWSER: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Base URLs of the HoYoLAB endpoints, overridable for tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub record: String,
    pub binding: String,
    pub reward: String,
    pub diary: String,
    pub redeem: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            record: "https://bbs-api-os.hoyolab.com/game_record/genshin/api".into(),
            binding: "https://api-os-takumi.hoyoverse.com/binding/api".into(),
            reward: "https://sg-hk4e-api.hoyolab.com/event/sol".into(),
            diary: "https://sg-hk4e-api.hoyolab.com/event/ysledgeros".into(),
            redeem: "https://sg-hk4e-api.hoyoverse.com/common/apicdkey/api".into(),
        }
    }
}

/// Abyss schedule types understood by the record endpoint.
#[derive(Debug, Clone, Copy)]
enum Schedule {
    Current = 1,
    Previous = 2,
}

/// HoYoLAB client authenticated with session cookies.
pub struct HoyolabClient {
    client: Client,
    endpoints: Endpoints,
}

impl HoyolabClient {
    pub fn new(cookies: &Cookies, endpoints: Endpoints) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookies.header())
                .map_err(|e| Error::Configuration(format!("cookies are not a valid header: {e}")))?,
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER));
        headers.insert(REFERER, HeaderValue::from_static("https://act.hoyolab.com/"));
        Ok(HoyolabClient {
            client: Client::builder().default_headers(headers).build()?,
            endpoints,
        })
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, Error> {
        let res = request.send().await?;
        debug!("{} responded with {}", res.url(), res.status());
        response::envelope(res).await
    }

    /// Sends a request whose payload may be absent.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, Error> {
        self.exchange(request).await?.check()
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        self.exchange(request).await?.into_data()
    }

    /// Adds the headers every game record request must carry.
    fn signed(&self, request: RequestBuilder, lang: Lang) -> RequestBuilder {
        request
            .header("ds", ds::generate())
            .header("x-rpc-app_version", APP_VERSION)
            .header("x-rpc-client_type", CLIENT_TYPE)
            .header("x-rpc-language", lang.code())
    }

    /// A signed game record query for `account`.
    fn record(&self, endpoint: &str, account: &GameAccount, lang: Lang) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}/{endpoint}", self.endpoints.record))
            .query(&[
                ("server", account.region.clone()),
                ("role_id", account.uid.to_string()),
            ]);
        self.signed(request, lang)
    }

    /// Detailed builds of the characters listed on the record card.
    async fn characters(
        &self,
        account: &GameAccount,
        lang: Lang,
        record: &GameRecord,
    ) -> Result<Vec<Value>, Error> {
        let ids: Vec<u64> = record
            .avatars
            .iter()
            .filter_map(|avatar| avatar.get("id").and_then(Value::as_u64))
            .collect();
        let request = self
            .client
            .post(format!("{}/character", self.endpoints.record))
            .json(&json!({
                "character_ids": ids,
                "role_id": account.uid.to_string(),
                "server": account.region,
            }));
        let list: CharacterList = self.fetch(self.signed(request, lang)).await?;
        Ok(list.avatars)
    }

    async fn spiral_abyss(
        &self,
        account: &GameAccount,
        lang: Lang,
        schedule: Schedule,
    ) -> Result<SpiralAbyss, Error> {
        let schedule_type = (schedule as u8).to_string();
        self.fetch(
            self.record("spiralAbyss", account, lang)
                .query(&[("schedule_type", schedule_type)]),
        )
        .await
    }

    fn reward(&self, endpoint: &str, lang: Lang) -> RequestBuilder {
        self.client
            .get(format!("{}/{endpoint}", self.endpoints.reward))
            .query(&[("act_id", REWARD_ACT_ID), ("lang", lang.code())])
    }
}

#[async_trait]
impl AccountService for HoyolabClient {
    async fn game_account(&self, uid: Option<u64>) -> Result<GameAccount, Error> {
        if let Some(uid) = uid {
            return GameAccount::from_uid(uid);
        }
        let accounts: GameAccountList = self
            .fetch(
                self.client
                    .get(format!("{}/getUserGameRolesByCookie", self.endpoints.binding))
                    .query(&[("game_biz", GAME_BIZ)]),
            )
            .await?;
        accounts
            .list
            .into_iter()
            .find(|role| role.game_biz == GAME_BIZ)
            .map(|role| role.account)
            .ok_or(Error::NoAccount)
    }

    async fn user_stats(
        &self,
        account: &GameAccount,
        lang: Lang,
    ) -> Result<UserStatsSnapshot, Error> {
        let info: GameRecord = self.fetch(self.record("index", account, lang)).await?;
        let characters = self.characters(account, lang, &info).await?;
        let current = self.spiral_abyss(account, lang, Schedule::Current).await?;
        let previous = self.spiral_abyss(account, lang, Schedule::Previous).await?;
        let activities = self.fetch(self.record("activities", account, lang)).await?;
        Ok(UserStatsSnapshot {
            account: account.clone(),
            info,
            characters,
            abyss: AbyssCycles { current, previous },
            activities,
        })
    }

    async fn diary(&self, account: &GameAccount, lang: Lang) -> Result<Diary, Error> {
        let month = Utc::now().month().to_string();
        self.fetch(
            self.client
                .get(format!("{}/month_info", self.endpoints.diary))
                .query(&[
                    ("month", month),
                    ("region", account.region.clone()),
                    ("uid", account.uid.to_string()),
                    ("lang", lang.code().to_string()),
                ]),
        )
        .await
    }

    async fn claim_daily_reward(&self, lang: Lang) -> Result<(), Error> {
        let request = self
            .client
            .post(format!("{}/sign", self.endpoints.reward))
            .query(&[("lang", lang.code())])
            .json(&json!({ "act_id": REWARD_ACT_ID }));
        self.send::<Value>(request).await?;
        Ok(())
    }

    async fn claimed_rewards(&self, lang: Lang) -> Result<Vec<ClaimedReward>, Error> {
        let page: ClaimedRewardPage = self
            .fetch(
                self.reward("award", lang)
                    .query(&[("current_page", "1"), ("page_size", "10")]),
            )
            .await?;
        Ok(page.list)
    }

    async fn reward_info(&self, lang: Lang) -> Result<RewardInfo, Error> {
        self.fetch(self.reward("info", lang)).await
    }

    async fn redeem_code(&self, account: &GameAccount, code: &str) -> Result<(), Error> {
        let request = self
            .client
            .get(format!("{}/webExchangeCdkey", self.endpoints.redeem))
            .query(&[
                ("uid", account.uid.to_string().as_str()),
                ("region", account.region.as_str()),
                ("cdkey", code),
                ("game_biz", GAME_BIZ),
                ("lang", "en"),
            ]);
        self.send::<Value>(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::HeaderMap,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    type Params = Query<HashMap<String, String>>;

    fn ok(data: Value) -> Json<Value> {
        Json(json!({"retcode": 0, "message": "OK", "data": data}))
    }

    fn fail(retcode: i64, message: &str) -> Json<Value> {
        Json(json!({"retcode": retcode, "message": message, "data": null}))
    }

    fn signed_in(headers: &HeaderMap) -> bool {
        headers
            .get("cookie")
            .and_then(|c| c.to_str().ok())
            .map(|c| c.contains("ltuid=1"))
            .unwrap_or(false)
    }

    async fn roles(headers: HeaderMap) -> Json<Value> {
        if !signed_in(&headers) {
            return fail(-100, "Please login");
        }
        ok(json!({"list": [
            {"game_biz": "hkrpg_global", "region": "prod_official_eur", "game_uid": "800000001", "nickname": "Other", "level": 70},
            {"game_biz": "hk4e_global", "region": "os_euro", "game_uid": "700000001", "nickname": "Lumine", "level": 60}
        ]}))
    }

    async fn index(headers: HeaderMap, Query(params): Params) -> Json<Value> {
        if !signed_in(&headers) || headers.get("ds").is_none() {
            return fail(-100, "Please login");
        }
        assert_eq!(params["server"], "os_euro");
        assert_eq!(params["role_id"], "700000001");
        ok(json!({
            "role": {"nickname": "Lumine", "level": 60, "region": "os_euro"},
            "stats": {"active_day_number": 900},
            "avatars": [{"id": 10000007}],
            "world_explorations": []
        }))
    }

    async fn character(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        if headers.get("ds").is_none() {
            return fail(-100, "Please login");
        }
        assert_eq!(body["server"], "os_euro");
        assert_eq!(body["role_id"], "700000001");
        assert_eq!(body["character_ids"], json!([10000007]));
        ok(json!({"avatars": [
            {"id": 10000007, "name": "Traveler", "constellation": 6, "weapon": {"name": "Mistsplitter"}}
        ]}))
    }

    async fn activities(headers: HeaderMap) -> Json<Value> {
        if headers.get("ds").is_none() {
            return fail(-100, "Please login");
        }
        ok(json!({"activities": [{"hyakunin": {"exists_data": false}}]}))
    }

    async fn empty() -> Json<Value> {
        ok(Value::Null)
    }

    async fn abyss(Query(params): Params) -> Json<Value> {
        match params["schedule_type"].as_str() {
            "1" => ok(json!({"schedule_id": 2, "max_floor": "0-0", "floors": []})),
            _ => ok(json!({"schedule_id": 1, "max_floor": "12-3", "total_star": 36,
                "floors": [{"index": 12, "star": 9, "max_star": 9, "levels": []}]})),
        }
    }

    async fn diary(Query(params): Params) -> Json<Value> {
        assert_eq!(params["region"], "os_euro");
        ok(json!({"nickname": "Lumine", "month": 1,
            "month_data": {"current_primogems": 1600, "current_mora": 100000}}))
    }

    async fn sign(headers: HeaderMap) -> Json<Value> {
        assert!(signed_in(&headers));
        fail(-5003, "Traveler, you've already checked in today~")
    }

    async fn award() -> Json<Value> {
        ok(json!({"list": [
            {"id": 2, "name": "Mora", "cnt": 5000, "icon": "", "created_at": "2023-01-02 00:00:05"},
            {"id": 1, "name": "Primogem", "cnt": 20, "icon": "", "created_at": "2023-01-01 00:00:05"}
        ], "total": 2}))
    }

    async fn info() -> Json<Value> {
        ok(json!({"total_sign_day": 2, "today": "2023-01-02", "is_sign": true}))
    }

    async fn redeem(Query(params): Params) -> Json<Value> {
        match params["cdkey"].as_str() {
            "FAIL01" => fail(-2017, "Redemption code has been used"),
            _ => ok(json!({"msg": "Redeemed successfully"})),
        }
    }

    async fn mock_client(cookies: &str) -> HoyolabClient {
        let app = Router::new()
            .route("/binding/getUserGameRolesByCookie", get(roles))
            .route("/record/index", get(index))
            .route("/record/character", post(character))
            .route("/record/spiralAbyss", get(abyss))
            .route("/record/activities", get(activities))
            .route("/record/empty", get(empty))
            .route("/diary/month_info", get(diary))
            .route("/reward/sign", post(sign))
            .route("/reward/award", get(award))
            .route("/reward/info", get(info))
            .route("/redeem/webExchangeCdkey", get(redeem));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let base = format!("http://{addr}");
        let endpoints = Endpoints {
            record: format!("{base}/record"),
            binding: format!("{base}/binding"),
            reward: format!("{base}/reward"),
            diary: format!("{base}/diary"),
            redeem: format!("{base}/redeem"),
        };
        let cookies = Cookies::parse(cookies).unwrap();
        HoyolabClient::new(&cookies, endpoints).unwrap()
    }

    #[tokio::test]
    async fn resolves_the_bound_genshin_account() {
        let client = mock_client(r#"{"ltuid": "1", "ltoken": "t"}"#).await;
        let account = client.game_account(None).await.unwrap();
        assert_eq!(account.uid, 700000001);
        assert_eq!(account.region, "os_euro");
        assert_eq!(account.nickname, "Lumine");

        let explicit = client.game_account(Some(600000002)).await.unwrap();
        assert_eq!(explicit.region, "os_usa");
    }

    #[tokio::test]
    async fn invalid_cookies_are_reported() {
        let client = mock_client(r#"{"ltuid": "2"}"#).await;
        let err = client.game_account(None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCookies(_)));
    }

    #[tokio::test]
    async fn user_stats_fall_back_to_previous_abyss() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let account = client.game_account(None).await.unwrap();
        let user = client.user_stats(&account, Lang::EnUs).await.unwrap();
        assert_eq!(user.info.role.nickname, "Lumine");
        assert_eq!(user.info.stats["active_day_number"], 900);
        assert!(user.info.extra.contains_key("world_explorations"));
        assert!(user.abyss.current.floors.is_empty());
        assert_eq!(crate::models::select_abyss(&user).max_floor, "12-3");
    }

    #[tokio::test]
    async fn user_stats_include_characters_and_activities() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let account = client.game_account(None).await.unwrap();
        let user = client.user_stats(&account, Lang::EnUs).await.unwrap();
        assert_eq!(user.characters.len(), 1);
        assert_eq!(user.characters[0]["weapon"]["name"], "Mistsplitter");
        assert_eq!(
            user.activities["activities"][0]["hyakunin"]["exists_data"],
            false
        );
    }

    #[tokio::test]
    async fn diary_is_fetched_for_the_account() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let account = client.game_account(None).await.unwrap();
        let diary = client.diary(&account, Lang::RuRu).await.unwrap();
        assert_eq!(diary.month_data.current_primogems, 1600);
    }

    #[tokio::test]
    async fn daily_reward_flow() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let err = client.claim_daily_reward(Lang::RuRu).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyClaimed));

        let rewards = client.claimed_rewards(Lang::RuRu).await.unwrap();
        assert_eq!(rewards[0].name, "Mora");
        assert_eq!(rewards[0].amount, 5000);

        let info = client.reward_info(Lang::RuRu).await.unwrap();
        assert_eq!(info.total_sign_day, 2);
        assert!(info.is_sign);
    }

    #[tokio::test]
    async fn redemption_errors_are_surfaced() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let account = client.game_account(None).await.unwrap();
        client.redeem_code(&account, "GENSHINGIFT").await.unwrap();
        let err = client.redeem_code(&account, "FAIL01").await.unwrap_err();
        assert!(matches!(err, Error::Service { retcode: -2017, .. }));
    }

    #[tokio::test]
    async fn http_errors_are_reported() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let err = client
            .fetch::<Value>(client.client.get(format!("{}/missing", client.endpoints.record)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(status) if status.as_u16() == 404));
    }

    #[tokio::test]
    async fn missing_payload_is_a_decode_error() {
        let client = mock_client(r#"{"ltuid": "1"}"#).await;
        let endpoint = format!("{}/empty", client.endpoints.record);
        let err = client
            .fetch::<Value>(client.client.get(&endpoint))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        let payload = client
            .send::<Value>(client.client.get(&endpoint))
            .await
            .unwrap();
        assert!(payload.is_none());
    }
}
