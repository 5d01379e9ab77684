use std::sync::Arc;

use tracing::instrument;

use crate::{
    browser::{Launcher, Page, Session},
    config::RunConfig,
    error::Result,
    intercept::{Capture, Completion, InterceptionCoordinator},
    menu::NO_MEALS_NOTICE,
    navigate::{navigate, Outcome},
    telegram::Deliver,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The site had nothing published; the fixed notice was sent instead.
    NoMenu,
    Captured(Capture),
}

/// One run: own a browser session, arm the menu hook, drive the UI, and
/// wait for the hook to finish with the response it provoked.
pub struct Orchestrator<L> {
    launcher: L,
    deliverer: Arc<dyn Deliver>,
    recipient: i64,
    coordinator: InterceptionCoordinator,
    config: RunConfig,
}

impl<L: Launcher> Orchestrator<L> {
    pub fn new(launcher: L, deliverer: Arc<dyn Deliver>, recipient: i64, config: RunConfig) -> Self {
        let coordinator = InterceptionCoordinator::new(
            Arc::clone(&deliverer),
            recipient,
            config.period.clone(),
            config.stations.clone(),
        );
        Self {
            launcher,
            deliverer,
            recipient,
            coordinator,
            config,
        }
    }

    #[instrument(skip(self), fields(period = %self.config.period))]
    pub async fn run(&self) -> Result<RunOutcome> {
        log::info!("Running handler");
        let mut session = self.launcher.launch().await?;
        let outcome = self.run_in(&session).await;
        if let Err(e) = session.close().await {
            log::warn!("Failed to tear down browser session: {e}");
        }
        log::info!("Finished running handler");
        outcome
    }

    /// Runs until one attempt succeeds, at most `attempts` times, back to back.
    pub async fn run_with_retries(&self) -> Result<RunOutcome> {
        let mut attempt = 1;
        loop {
            match self.run().await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt >= self.config.attempts => {
                    log::error!("Failed to get the menu, attempt {attempt}: {e}");
                    log::error!("Gave up trying to get the menu after {attempt} attempts");
                    return Err(e);
                }
                Err(e) => log::error!("Failed to get the menu, attempt {attempt}: {e}"),
            }
            attempt += 1;
        }
    }

    async fn run_in(&self, session: &L::Session) -> Result<RunOutcome> {
        let page = session.open(self.config.site_url.as_str()).await?;
        log::info!("Connected to page {}", self.config.site_url);

        // armed before any step that can fire the menu request
        let responses = page.hook_responses(&self.config.menu_api_pattern).await?;
        let completion = self.coordinator.arm(responses);

        let outcome = self.drive(&page, completion).await;
        if let Err(e) = page.unhook().await {
            log::warn!("Failed to stop intercepting requests: {e}");
        }
        outcome
    }

    async fn drive<P: Page>(&self, page: &P, completion: Completion) -> Result<RunOutcome> {
        match navigate(page, &self.config.period).await? {
            Outcome::NoMenu => {
                drop(completion);
                log::info!("No meals available");
                if let Err(e) = self.deliverer.send(self.recipient, NO_MEALS_NOTICE).await {
                    log::error!("Failed to send message: {e}");
                }
                Ok(RunOutcome::NoMenu)
            }
            Outcome::Settled => completion
                .wait(self.config.capture_timeout)
                .await
                .map(RunOutcome::Captured),
        }
    }
}
