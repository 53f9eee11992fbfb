use reqwest::{header::CONTENT_TYPE, Response};
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::Error;

/// Adds extra functionality to `reqwest::Response`.
pub trait ResponseExt {
    /// Returns true if the response has a `Content-Type` header indicating it is HTML.
    fn is_html(&self) -> bool;

    /// Fails unless the response has a success status code.
    fn verify(&self) -> Result<(), Error>;
}

impl ResponseExt for Response {
    fn is_html(&self) -> bool {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
            .map(|t| t.starts_with("text/html"))
            .unwrap_or(false)
    }

    fn verify(&self) -> Result<(), Error> {
        let status = self.status();
        if !status.is_success() {
            return Err(Error::Http(status));
        }
        Ok(())
    }
}

/// The `{retcode, message, data}` wrapper around every API payload.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub retcode: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns the payload, or the error the retcode stands for.
    pub fn into_data(self) -> Result<T, Error> {
        self.check()?
            .ok_or_else(|| Error::Decode("response carried no data".into()))
    }

    /// Checks the retcode and returns the payload, which may be absent.
    pub fn check(self) -> Result<Option<T>, Error> {
        match self.retcode {
            0 => Ok(self.data),
            retcode => Err(Error::from_retcode(retcode, self.message)),
        }
    }
}

/// Verifies the response and decodes its envelope.
pub async fn envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, Error> {
    response.verify()?;
    if response.is_html() {
        return Err(Error::Decode("responded with HTML".into()));
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))
}
