use color_eyre::{
    eyre::{Result, WrapErr},
    Section,
};
use log::debug;

mod args;
mod client;
mod codes;
mod config;
mod ds;
mod error;
mod gate;
mod logging;
mod models;
mod render;
mod response;
mod rewards;
mod runner;
mod service;
mod webpage;

use client::{Endpoints, HoyolabClient};
use config::{Config, COOKIES_VAR};
use error::Error;
use runner::Runner;
use webpage::CodePage;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let args = args::parse();
    logging::init(args.verbose)?;

    let config = Config::load(args, std::env::var(COOKIES_VAR).ok())
        .suggestion("Set COOKIES to a JSON object such as {\"ltuid_v2\": \"...\", \"ltoken_v2\": \"...\"}")?;
    if let Some(ltuid) = config.cookies.get("ltuid_v2").or(config.cookies.get("ltuid")) {
        debug!("Signing in as HoYoLAB user {ltuid}");
    }

    let service = HoyolabClient::new(&config.cookies, Endpoints::default())?;
    let page = CodePage::new(reqwest::Client::new(), config.codes_url.clone());

    match Runner::new(config, service, page).run().await {
        Err(e @ Error::InvalidCookies(_)) => {
            Err(e).suggestion("Log in to HoYoLAB again and refresh COOKIES")
        }
        Err(e @ Error::DataNotPublic(_)) => {
            Err(e).suggestion("Make the battle chronicle public in the HoYoLAB settings")
        }
        result => result.map(|_| ()).wrap_err("Run did not complete"),
    }
}
