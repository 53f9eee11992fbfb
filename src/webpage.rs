use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use soup::prelude::*;
use url::Url;

use crate::{error::Error, response::ResponseExt};

/// Class of the elements holding redemption codes.
const CODE_CLASS: &str = "reward_code";

/// Somewhere active redemption codes can be read from.
#[async_trait]
pub trait CodeSource: Send + Sync {
    async fn fetch_codes(&self) -> Result<Vec<String>, Error>;
}

/// A public webpage listing active codes.
pub struct CodePage {
    client: Client,
    url: Url,
}

impl CodePage {
    pub fn new(client: Client, url: Url) -> Self {
        CodePage { client, url }
    }
}

#[async_trait]
impl CodeSource for CodePage {
    async fn fetch_codes(&self) -> Result<Vec<String>, Error> {
        debug!("Fetching codes from {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;
        response.verify()?;
        Ok(codes(&response.text().await?))
    }
}

/// Returns the text of every code element in document order.
pub fn codes(text: &str) -> Vec<String> {
    Soup::new(text)
        .tag("p")
        .class(CODE_CLASS)
        .find_all()
        .map(|p| p.text().trim().to_string())
        .collect()
}
