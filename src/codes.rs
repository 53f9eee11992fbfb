use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tokio::fs;

use crate::{gate::RateGate, models::GameAccount, service::AccountService};

/// Codes that were already tried, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeList {
    path: PathBuf,
    codes: Vec<String>,
}

impl CodeList {
    /// Reads the list, treating a missing file as an empty list.
    pub async fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} does not exist, assuming no codes were used", path.display());
                String::new()
            }
            Err(e) => return Err(e),
        };
        Ok(CodeList {
            codes: parse(&text),
            path,
        })
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    /// Scraped codes that are not empty and not in the list, in scrape order.
    pub fn new_codes(&self, scraped: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        scraped
            .iter()
            .filter(|code| !code.is_empty() && !self.contains(code))
            .filter(|code| seen.insert(code.as_str()))
            .cloned()
            .collect()
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, codes: I) {
        self.codes.extend(codes);
    }

    /// Rewrites the file with every code on its own line.
    pub async fn save(&self) -> std::io::Result<()> {
        fs::write(&self.path, self.codes.join("\n")).await
    }
}

/// Splits the file into lines, dropping only the blank ones at the end.
fn parse(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Outcome of one redemption pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redemption {
    pub new_codes: Vec<String>,
    pub failed: Vec<String>,
}

impl Redemption {
    pub fn redeemed(&self) -> Vec<&str> {
        self.new_codes
            .iter()
            .filter(|code| !self.failed.contains(code))
            .map(String::as_str)
            .collect()
    }

    /// The line printed at the end of a run.
    pub fn summary(&self) -> String {
        let redeemed = self.redeemed();
        if redeemed.is_empty() {
            String::from("No new codes found")
        } else {
            format!(
                "Redeemed {} new codes: {}",
                redeemed.len(),
                redeemed.join(", ")
            )
        }
    }
}

/// Tries every code once, keeping attempts apart with `gate`. Failures are collected
/// rather than retried.
pub async fn redeem_all<S: AccountService + ?Sized>(
    service: &S,
    account: &GameAccount,
    new_codes: Vec<String>,
    gate: &mut RateGate,
) -> Redemption {
    let mut failed = vec![];
    for code in &new_codes {
        gate.ready().await;
        debug!("Redeeming {code}");
        if let Err(e) = service.redeem_code(account, code).await {
            warn!("Failed to redeem {code}: {e}");
            failed.push(code.clone());
        }
        gate.record();
    }
    Redemption { new_codes, failed }
}

/// Redeems the scraped codes missing from the list at `path` and appends them to it,
/// failed ones included.
pub async fn track<S: AccountService + ?Sized>(
    service: &S,
    account: &GameAccount,
    path: &Path,
    scraped: &[String],
    gate: &mut RateGate,
) -> std::io::Result<Redemption> {
    let mut used = CodeList::load(path).await?;
    let new_codes = used.new_codes(scraped);
    debug!(
        "{} of {} scraped codes are new, {} used before",
        new_codes.len(),
        scraped.len(),
        used.codes().len()
    );

    let redemption = redeem_all(service, account, new_codes, gate).await;
    if !redemption.new_codes.is_empty() {
        used.extend(redemption.new_codes.iter().cloned());
        used.save().await?;
    }
    Ok(redemption)
}
