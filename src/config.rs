use std::{collections::BTreeMap, path::PathBuf};

use tokio::time::Duration;
use url::Url;

use crate::{
    args::{Args, Lang},
    error::Error,
};

pub const COOKIES_VAR: &str = "COOKIES";
const CODES_FILE: &str = "codes.txt";

/// Session cookies of a HoYoLAB account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookies(BTreeMap<String, String>);

impl Cookies {
    /// Parses a JSON object mapping cookie names to values.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let map: BTreeMap<String, String> = serde_json::from_str(text).map_err(|e| {
            Error::Configuration(format!("cookies must be a JSON object of strings: {e}"))
        })?;
        if map.is_empty() {
            return Err(Error::Configuration("no cookies were supplied".into()));
        }
        Ok(Cookies(map))
    }

    /// Value of the `Cookie` request header.
    pub fn header(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Everything a single run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub template: PathBuf,
    pub output: PathBuf,
    pub lang: Lang,
    pub cookies: Cookies,
    pub uid: Option<u64>,
    pub codes_file: PathBuf,
    pub codes_url: Url,
    pub redeem_delay: Duration,
}

impl Config {
    /// Builds the configuration from parsed flags and the value of `COOKIES`.
    /// The `--cookies` flag takes precedence over the environment.
    pub fn load(args: Args, env_cookies: Option<String>) -> Result<Self, Error> {
        let raw = args.cookies.or(env_cookies).ok_or_else(|| {
            Error::Configuration(format!("the {COOKIES_VAR} environment variable is not set"))
        })?;
        let cookies = Cookies::parse(&raw)?;
        let codes_file = match args.codes_file {
            Some(path) => path,
            None => default_codes_file()?,
        };

        Ok(Config {
            template: args.template,
            output: args.output,
            lang: args.lang,
            cookies,
            uid: args.uid,
            codes_file,
            codes_url: args.codes_url,
            redeem_delay: args.redeem_delay,
        })
    }
}

fn default_codes_file() -> Result<PathBuf, Error> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| Error::Configuration("executable has no parent directory".into()))?;
    Ok(dir.join(CODES_FILE))
}
