use std::{collections::HashMap, path::Path};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};
use tokio::fs;

use crate::{
    args::Lang,
    error::Error,
    models::{ClaimedReward, Diary, RewardInfo, SpiralAbyss, UserStatsSnapshot},
};

const TEMPLATE_NAME: &str = "stats";

/// Europe/Moscow has stayed on UTC+3 all year round since 2014.
const MOSCOW_OFFSET_SECS: i32 = 3 * 3600;

/// Values exposed to the template.
#[derive(Debug, Serialize)]
pub struct Bindings<'a> {
    pub user: &'a UserStatsSnapshot,
    pub lang: Lang,
    pub abyss: &'a SpiralAbyss,
    pub reward: Option<&'a ClaimedReward>,
    pub diary: &'a Diary,
    pub reward_info: &'a RewardInfo,
    pub updated_at: String,
}

/// Formats a timestamp in Moscow time, e.g. `Dec 31, 2022 19:00 +0300`.
pub fn format_updated_at(time: DateTime<FixedOffset>) -> String {
    let moscow = FixedOffset::east_opt(MOSCOW_OFFSET_SECS).unwrap_or_else(|| *time.offset());
    time.with_timezone(&moscow)
        .format("%b %d, %Y %H:%M %z")
        .to_string()
}

/// Time of the latest claimed reward, or now if there is none.
pub fn updated_at(reward: Option<&ClaimedReward>) -> String {
    format_updated_at(reward.map(|r| r.time).unwrap_or_else(|| Utc::now().fixed_offset()))
}

/// Coerces numbers, numeric strings and booleans to an integer, truncating fractions.
fn to_int(value: &Value) -> tera::Result<Value> {
    let int = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    int.map(Value::from)
        .ok_or_else(|| tera::Error::msg(format!("cannot convert {value} to an integer")))
}

fn int_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    match args.get("value") {
        Some(value) => to_int(value),
        None => Err(tera::Error::msg("_int expects a `value` argument")),
    }
}

fn int_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    to_int(value)
}

/// Renders `source` with the given bindings.
pub fn render(source: &str, bindings: &Bindings) -> Result<String, Error> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_function("_int", int_function);
    tera.register_filter("_int", int_filter);
    tera.add_raw_template(TEMPLATE_NAME, source)?;
    let context = Context::from_serialize(bindings)?;
    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// Renders the template at `template` into `output`, replacing whatever was there.
pub async fn render_file(template: &Path, output: &Path, bindings: &Bindings<'_>) -> Result<(), Error> {
    let source = fs::read_to_string(template).await?;
    let rendered = render(&source, bindings)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(output, rendered).await?;
    Ok(())
}
