use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::navigate::Step;

#[derive(Debug)]
pub enum Error {
    /// The intercepted body is not JSON or lacks the `Menu` envelope.
    MalformedPayload(serde_json::Error),
    /// A required element was missing when the sequencer reached `step`.
    NavigationFailed {
        step: Step,
        selector: &'static str,
    },
    DeliveryFailed(String),
    Browser(String),
    Request(reqwest::Error),
    CaptureTimedOut(Duration),
    /// The hook ended, or the response body couldn't be read, before any
    /// menu arrived.
    CaptureMissed,
    Config(String),
    Io(std::io::Error),
}

impl Error {
    pub fn browser(msg: impl Display) -> Self {
        Self::Browser(msg.to_string())
    }

    pub fn config(msg: &str) -> Self {
        Self::Config(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPayload(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(e.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload(e) => write!(f, "Malformed menu payload: {e}"),
            Self::NavigationFailed { step, selector } => {
                write!(f, "Navigation failed at {step}: `{selector}` not found")
            }
            Self::DeliveryFailed(msg) => write!(f, "Delivery failed: {msg}"),
            Self::Browser(msg) => write!(f, "Browser error: {msg}"),
            Self::Request(e) => write!(f, "Request error: {e}"),
            Self::CaptureTimedOut(after) => {
                write!(f, "Menu request was not captured within {after:?}")
            }
            Self::CaptureMissed => write!(f, "Menu request was hooked but never captured"),
            Self::Config(msg) => write!(f, "Config error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
