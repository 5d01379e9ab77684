use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::{
    error::{Error, Result},
    menu::StationSpec,
};

pub const DEFAULT_SITE_URL: &str =
    "https://asu.campusdish.com/DiningVenues/Tempe-Campus/Barrett-Dining-Center";
pub const DEFAULT_MENU_API_PATTERN: &str = "https://asu.campusdish.com/api/menu/GetMenus*";
const DOCKER_CHROME_BIN: &str = "/usr/bin/chromium-browser";

#[derive(Debug, Parser)]
#[command(
    name = "asu-dining-bot",
    version,
    about = "Gets today's Barrett dinner menu from the ASU dining website and sends it to you via Telegram"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bot
    Run(RunArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BrowserMode {
    /// Launch the Chromium found on this machine
    Host,
    /// Launch the container's Chromium without a sandbox
    Docker,
    /// Connect to an already running browser
    Remote,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Telegram bot token
    #[arg(short, long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: String,
    /// Telegram chat id the menu is sent to
    #[arg(long, env = "TELEGRAM_PERSONAL_ID")]
    personal_id: i64,
    #[arg(long, env = "BROWSER_MODE", value_enum, default_value_t = BrowserMode::Host)]
    browser_mode: BrowserMode,
    /// DevTools endpoint for `--browser-mode remote`
    #[arg(long, env = "BROWSER_URL")]
    browser_url: Option<String>,
    #[arg(long, env = "CHROME_BIN")]
    chrome_bin: Option<PathBuf>,
    /// Run as a server that fetches the menu on every request
    #[arg(long, env = "AS_SERVER")]
    server: bool,
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Meal period to report
    #[arg(long, env = "MEAL_PERIOD", default_value = "Dinner")]
    period: String,
    #[arg(long, env = "SITE_URL", default_value = DEFAULT_SITE_URL)]
    site_url: Url,
    #[arg(long, env = "MENU_API_PATTERN", default_value = DEFAULT_MENU_API_PATTERN)]
    menu_api_pattern: String,
    /// Runs attempted per server request before giving up
    #[arg(long, env = "RUN_ATTEMPTS", default_value_t = 5)]
    attempts: usize,
    /// Seconds to wait for the menu request after navigation settles
    #[arg(long, env = "CAPTURE_TIMEOUT", default_value_t = 60)]
    capture_timeout: u64,
    /// Seconds to wait for each element the navigation needs
    #[arg(long, env = "ELEMENT_TIMEOUT", default_value_t = 10)]
    element_timeout: u64,
    /// Seconds to wait for the page to go quiet
    #[arg(long, env = "STABLE_TIMEOUT", default_value_t = 30)]
    stable_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub browser: BrowserOptions,
    pub run: RunConfig,
    pub server: Option<ServerConfig>,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub personal_id: i64,
}

// keep the token out of logs
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("personal_id", &self.personal_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserTarget {
    Launch {
        chrome_bin: Option<PathBuf>,
        sandbox: bool,
    },
    Connect {
        url: String,
    },
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub target: BrowserTarget,
    pub element_timeout: Duration,
    pub stable_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub site_url: Url,
    pub menu_api_pattern: String,
    pub period: String,
    pub stations: Vec<StationSpec>,
    pub attempts: usize,
    pub capture_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl RunArgs {
    pub fn into_config(self) -> Result<Config> {
        if self.token.trim().is_empty() {
            return Err(Error::config("Telegram bot token is required"));
        }
        if self.attempts == 0 {
            return Err(Error::config("attempts must be at least 1"));
        }
        if self.period.trim().is_empty() {
            return Err(Error::config("meal period must not be empty"));
        }

        let target = match self.browser_mode {
            BrowserMode::Host => BrowserTarget::Launch {
                chrome_bin: self.chrome_bin,
                sandbox: true,
            },
            BrowserMode::Docker => BrowserTarget::Launch {
                chrome_bin: Some(
                    self.chrome_bin
                        .unwrap_or_else(|| PathBuf::from(DOCKER_CHROME_BIN)),
                ),
                sandbox: false,
            },
            BrowserMode::Remote => BrowserTarget::Connect {
                url: self.browser_url.ok_or_else(|| {
                    Error::config("--browser-url is required in remote browser mode")
                })?,
            },
        };

        Ok(Config {
            telegram: TelegramConfig {
                token: self.token,
                personal_id: self.personal_id,
            },
            browser: BrowserOptions {
                target,
                element_timeout: Duration::from_secs(self.element_timeout),
                stable_timeout: Duration::from_secs(self.stable_timeout),
            },
            run: RunConfig {
                site_url: self.site_url,
                menu_api_pattern: self.menu_api_pattern,
                period: self.period,
                stations: StationSpec::defaults(),
                attempts: self.attempts,
                capture_timeout: Duration::from_secs(self.capture_timeout),
            },
            server: self.server.then_some(ServerConfig { port: self.port }),
        })
    }
}
