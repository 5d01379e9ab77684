//! Browser capability used by a run.
//!
//! A `Launcher` produces one `Session` per run, a session opens a `Page`, and
//! the page exposes just enough of the automation surface to drive the menu
//! UI and capture the internal menu response.

pub mod chromium;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Response body captured before the page consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub url: String,
    pub body: String,
}

/// Responses matching a hooked url pattern, in the order the page requested them.
pub type ResponseStream = BoxStream<'static, Result<CapturedResponse>>;

#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    type Session: Session;

    async fn launch(&self) -> Result<Self::Session>;
}

#[async_trait]
pub trait Session: Send + Sync {
    type Page: Page;

    /// Opens a tab and waits for the first load of `url`.
    async fn open(&self, url: &str) -> Result<Self::Page>;
    /// Tears the session down. Called once, whether the run succeeded or not.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Page: Send + Sync {
    /// Waits for `selector` to appear. `Ok(false)` if it never does.
    async fn find(&self, selector: &str) -> Result<bool>;
    /// Text of the first match, without waiting. `None` if nothing matches.
    async fn text(&self, selector: &str) -> Result<Option<String>>;
    async fn click(&self, selector: &str) -> Result<()>;
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;
    async fn press_enter(&self, selector: &str) -> Result<()>;
    /// Returns once layout and network activity have gone quiet.
    async fn wait_stable(&self) -> Result<()>;
    /// Starts intercepting responses whose url matches `url_pattern` (`*` wildcards).
    async fn hook_responses(&self, url_pattern: &str) -> Result<ResponseStream>;
    async fn unhook(&self) -> Result<()>;
}
