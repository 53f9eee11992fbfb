use std::{fmt, path::PathBuf};

use clap::{ArgAction::Count, Parser, ValueEnum};
use serde::{Serialize, Serializer};
use tokio::time::Duration;
use url::Url;

pub const CODES_URL: &str = "https://scoofszlo.github.io/genshinimpact_codetracker/";

/// Longest accepted pause between redemptions.
const MAX_REDEEM_DELAY: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Template used to render the stats page
    #[arg(short, long, default_value = "template.html")]
    pub template: PathBuf,

    /// File the rendered page is written to
    #[arg(short, long, default_value = "stats.html")]
    pub output: PathBuf,

    /// Session cookies as a JSON object, overrides the COOKIES variable
    #[arg(short, long, value_name = "JSON")]
    pub cookies: Option<String>,

    /// Language of the fetched data
    #[arg(short, long, visible_alias = "language", value_enum, default_value_t = Lang::RuRu)]
    pub lang: Lang,

    /// Game uid, defaults to the first account bound to the cookies
    #[arg(short, long)]
    pub uid: Option<u64>,

    /// List of codes that were already redeemed, defaults to codes.txt beside the executable
    #[arg(long, value_name = "PATH")]
    pub codes_file: Option<PathBuf>,

    /// Page scraped for active redemption codes
    #[arg(long, default_value = CODES_URL, value_name = "URL")]
    pub codes_url: Url,

    /// Minimum pause between two code redemptions
    #[arg(long, default_value = "5.2", value_parser = parse_seconds, value_name = "SECONDS")]
    pub redeem_delay: Duration,

    /// Turn debugging information on
    #[arg(short, long, action = Count)]
    pub verbose: u8,
}

pub fn parse() -> Args {
    Args::parse()
}

fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let seconds: f64 = arg.parse().map_err(|e| format!("{e}"))?;
    let delay = Duration::try_from_secs_f64(seconds).map_err(|e| e.to_string())?;
    if delay > MAX_REDEEM_DELAY {
        return Err(format!(
            "must be at most {} seconds",
            MAX_REDEEM_DELAY.as_secs()
        ));
    }
    Ok(delay)
}

/// Languages supported by the HoYoLAB API.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lang {
    #[value(name = "zh-cn")]
    ZhCn,
    #[value(name = "zh-tw")]
    ZhTw,
    #[value(name = "de-de")]
    DeDe,
    #[value(name = "en-us")]
    EnUs,
    #[value(name = "es-es")]
    EsEs,
    #[value(name = "fr-fr")]
    FrFr,
    #[value(name = "id-id")]
    IdId,
    #[value(name = "it-it")]
    ItIt,
    #[value(name = "ja-jp")]
    JaJp,
    #[value(name = "ko-kr")]
    KoKr,
    #[value(name = "pt-pt")]
    PtPt,
    #[value(name = "ru-ru")]
    RuRu,
    #[value(name = "th-th")]
    ThTh,
    #[value(name = "vi-vn")]
    ViVn,
    #[value(name = "tr-tr")]
    TrTr,
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::ZhCn => "zh-cn",
            Lang::ZhTw => "zh-tw",
            Lang::DeDe => "de-de",
            Lang::EnUs => "en-us",
            Lang::EsEs => "es-es",
            Lang::FrFr => "fr-fr",
            Lang::IdId => "id-id",
            Lang::ItIt => "it-it",
            Lang::JaJp => "ja-jp",
            Lang::KoKr => "ko-kr",
            Lang::PtPt => "pt-pt",
            Lang::RuRu => "ru-ru",
            Lang::ThTh => "th-th",
            Lang::ViVn => "vi-vn",
            Lang::TrTr => "tr-tr",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Lang {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
