//! Chromium over the DevTools protocol, via chromiumoxide.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    cdp::browser_protocol::fetch::{
        ContinueRequestParams, DisableParams, EnableParams, EventRequestPaused,
        GetResponseBodyParams, RequestPattern, RequestStage,
    },
    element::Element,
    error::CdpError,
};
use futures::StreamExt;
use tokio::{task::JoinHandle, time::sleep};

use super::{CapturedResponse, Launcher, Page, ResponseStream, Session};
use crate::{
    config::{BrowserOptions, BrowserTarget},
    error::{Error, Result},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STABLE_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Consecutive identical samples before the page counts as stable.
const STABLE_SAMPLES: u32 = 4;

const CLEAR_VALUE: &str = "function() { this.value = ''; }";

const ACTIVITY_PROBE: &str =
    "[document.readyState, performance.getEntriesByType('resource').length, document.getElementsByTagName('*').length]";

#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    pub const fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self) -> Result<ChromiumSession> {
        let (browser, mut handler, owned) = match &self.options.target {
            BrowserTarget::Launch {
                chrome_bin,
                sandbox,
            } => {
                let mut builder = BrowserConfig::builder()
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage")
                    .arg("--disable-extensions");
                if let Some(bin) = chrome_bin {
                    builder = builder.chrome_executable(bin);
                }
                if !sandbox {
                    builder = builder.no_sandbox();
                }
                let config = builder.build().map_err(Error::browser)?;
                let (browser, handler) = Browser::launch(config).await?;
                (browser, handler, true)
            }
            BrowserTarget::Connect { url } => {
                let (browser, handler) = Browser::connect(url.as_str()).await?;
                (browser, handler, false)
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::trace!("Browser handler error: {e}");
                }
            }
        });

        Ok(ChromiumSession {
            browser,
            handler,
            owned,
            pages: Mutex::new(Vec::new()),
            options: self.options.clone(),
        })
    }
}

pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Whether this process launched the browser and must shut it down.
    owned: bool,
    pages: Mutex<Vec<chromiumoxide::Page>>,
    options: BrowserOptions,
}

#[async_trait]
impl Session for ChromiumSession {
    type Page = ChromiumPage;

    async fn open(&self, url: &str) -> Result<ChromiumPage> {
        let page = self.browser.new_page(url).await?;
        if let Ok(mut pages) = self.pages.lock() {
            pages.push(page.clone());
        }
        Ok(ChromiumPage {
            page,
            element_timeout: self.options.element_timeout,
            stable_timeout: self.options.stable_timeout,
        })
    }

    async fn close(&mut self) -> Result<()> {
        let pages = self
            .pages
            .lock()
            .map(|mut pages| std::mem::take(&mut *pages))
            .unwrap_or_default();
        let result = if self.owned {
            self.browser.close().await.map(drop).map_err(Error::from)
        } else {
            // a shared browser stays up, only our tabs go away
            let mut result = Ok(());
            for page in pages {
                if let Err(e) = page.close().await {
                    result = Err(e.into());
                }
            }
            result
        };
        if self.owned {
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        result
    }
}

pub struct ChromiumPage {
    page: chromiumoxide::Page,
    element_timeout: Duration,
    stable_timeout: Duration,
}

/// Errors `find_element` gives for a selector that matches nothing yet.
/// Anything else means the browser itself is in trouble.
const fn is_missing(e: &CdpError) -> bool {
    matches!(e, CdpError::NotFound | CdpError::Chrome(_))
}

impl ChromiumPage {
    async fn lookup(&self, selector: &str) -> Result<Option<Element>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn wait_for(&self, selector: &str) -> Result<Option<Element>> {
        let poll = async {
            loop {
                if let Some(element) = self.lookup(selector).await? {
                    return Ok::<_, Error>(element);
                }
                sleep(POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(self.element_timeout, poll).await {
            Ok(res) => res.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn element(&self, selector: &str) -> Result<Element> {
        self.wait_for(selector)
            .await?
            .ok_or_else(|| Error::Browser(format!("element `{selector}` not found")))
    }

    async fn activity(&self) -> Result<(String, u64, u64)> {
        self.page
            .evaluate(ACTIVITY_PROBE)
            .await?
            .into_value()
            .map_err(|e| Error::browser(format!("unexpected activity probe result: {e:?}")))
    }
}

#[async_trait]
impl Page for ChromiumPage {
    async fn find(&self, selector: &str) -> Result<bool> {
        Ok(self.wait_for(selector).await?.is_some())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        match self.lookup(selector).await? {
            Some(element) => Ok(element.inner_text().await?),
            None => Ok(None),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.element(selector).await?.click().await?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.element(selector).await?;
        element.click().await?;
        // typing appends, so drop whatever the input already holds
        element.call_js_fn(CLEAR_VALUE, false).await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_enter(&self, selector: &str) -> Result<()> {
        self.element(selector).await?.press_key("Enter").await?;
        Ok(())
    }

    async fn wait_stable(&self) -> Result<()> {
        let settle = async {
            let mut last = self.activity().await?;
            let mut unchanged = 0;
            while unchanged < STABLE_SAMPLES {
                sleep(STABLE_POLL_INTERVAL).await;
                let now = self.activity().await?;
                if now == last && now.0 == "complete" {
                    unchanged += 1;
                } else {
                    unchanged = 0;
                }
                last = now;
            }
            Ok::<_, Error>(())
        };
        match tokio::time::timeout(self.stable_timeout, settle).await {
            Ok(res) => res,
            Err(_) => {
                log::warn!(
                    "Page did not settle within {:?}, continuing",
                    self.stable_timeout
                );
                Ok(())
            }
        }
    }

    async fn hook_responses(&self, url_pattern: &str) -> Result<ResponseStream> {
        // subscribe before enabling so no paused request is missed
        let paused = self.page.event_listener::<EventRequestPaused>().await?;
        let pattern = RequestPattern::builder()
            .url_pattern(url_pattern)
            .request_stage(RequestStage::Response)
            .build();
        self.page
            .execute(EnableParams::builder().pattern(pattern).build())
            .await?;

        let page = self.page.clone();
        let responses = paused.then(move |event| {
            let page = page.clone();
            async move { capture(&page, &event).await }
        });
        Ok(responses.boxed())
    }

    async fn unhook(&self) -> Result<()> {
        self.page.execute(DisableParams::default()).await?;
        Ok(())
    }
}

/// Reads the paused response's body, then lets the page have it.
async fn capture(
    page: &chromiumoxide::Page,
    event: &EventRequestPaused,
) -> Result<CapturedResponse> {
    let url = event.request.url.clone();
    log::debug!("Paused response from {url}");
    let body = page
        .execute(GetResponseBodyParams::new(event.request_id.clone()))
        .await;
    page.execute(ContinueRequestParams::new(event.request_id.clone()))
        .await?;

    let body = body?.result;
    let body = if body.base64_encoded {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body.body.as_bytes())
            .map_err(Error::browser)?;
        String::from_utf8(bytes).map_err(Error::browser)?
    } else {
        body.body
    };
    Ok(CapturedResponse { url, body })
}
