use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The daily reward has already been claimed today.
    #[error("daily reward already claimed")]
    AlreadyClaimed,

    #[error("cookies are invalid or expired: {0}")]
    InvalidCookies(String),

    #[error("account data is not public: {0}")]
    DataNotPublic(String),

    #[error("no Genshin Impact account is bound to these cookies")]
    NoAccount,

    #[error("cannot determine the server of uid {0}")]
    UnknownRegion(u64),

    #[error("service responded with retcode {retcode}: {message}")]
    Service { retcode: i64, message: String },

    #[error("responded with status code {0}")]
    Http(StatusCode),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps a HoYoLAB retcode to the matching error.
    pub fn from_retcode(retcode: i64, message: String) -> Self {
        match retcode {
            -5003 => Error::AlreadyClaimed,
            -100 | 10001 | 10103 | -1071 => Error::InvalidCookies(message),
            10102 => Error::DataNotPublic(message),
            _ => Error::Service { retcode, message },
        }
    }
}
