//! Scripted browser and recording deliverer for tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use futures::{channel::mpsc, StreamExt};

use crate::{
    browser::{CapturedResponse, Launcher, Page, ResponseStream, Session},
    error::{Error, Result},
    navigate::{DONE_BUTTON, MEAL_INPUT, MEAL_SELECTION_BUTTON, MENU_WRAPPER, MENU_WRAPPER_NOTE, NO_MENU_TEXT},
    telegram::Deliver,
};

type Actions = Arc<Mutex<Vec<String>>>;

fn record(actions: &Actions, action: String) {
    actions.lock().expect("actions lock").push(action);
}

/// A page whose elements are a fixed selector -> text table. Clicking
/// `.Done` while hooked emits `payload` as the intercepted response, or
/// `capture_error` if the body can't be read.
#[derive(Clone, Debug, Default)]
pub struct FakePage {
    elements: HashMap<String, String>,
    payload: Option<String>,
    capture_error: Option<String>,
    failing_hook: bool,
    actions: Actions,
    hook: Arc<Mutex<Option<mpsc::UnboundedSender<Result<CapturedResponse>>>>>,
}

impl FakePage {
    pub fn menu_site() -> Self {
        let mut page = Self::default();
        for selector in [MENU_WRAPPER, MEAL_SELECTION_BUTTON, MEAL_INPUT, DONE_BUTTON] {
            page.elements.insert(selector.to_owned(), String::new());
        }
        page
    }

    pub fn no_menu_site() -> Self {
        Self::menu_site().with_text(MENU_WRAPPER_NOTE, NO_MENU_TEXT)
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.elements.insert(selector.to_owned(), text.to_owned());
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_capture_error(mut self, msg: &str) -> Self {
        self.capture_error = Some(msg.to_owned());
        self
    }

    pub fn with_failing_hook(mut self) -> Self {
        self.failing_hook = true;
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().expect("actions lock").clone()
    }

    fn share_actions(mut self, actions: &Actions) -> Self {
        self.actions = Arc::clone(actions);
        self
    }

    fn present(&self, selector: &str) -> Result<()> {
        if self.elements.contains_key(selector) {
            Ok(())
        } else {
            Err(Error::Browser(format!("element `{selector}` not found")))
        }
    }
}

#[async_trait]
impl Page for FakePage {
    async fn find(&self, selector: &str) -> Result<bool> {
        Ok(self.elements.contains_key(selector))
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.elements.get(selector).cloned())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.present(selector)?;
        record(&self.actions, format!("click {selector}"));
        if selector == DONE_BUTTON {
            let hook = self.hook.lock().expect("hook lock");
            let response = match (&self.capture_error, &self.payload) {
                (Some(msg), _) => Some(Err(Error::browser(msg))),
                (None, Some(body)) => Some(Ok(CapturedResponse {
                    url: "https://asu.campusdish.com/api/menu/GetMenus?mode=Daily".into(),
                    body: body.clone(),
                })),
                (None, None) => None,
            };
            if let (Some(hook), Some(response)) = (hook.as_ref(), response) {
                let _ = hook.unbounded_send(response);
            }
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.present(selector)?;
        record(&self.actions, format!("type {selector} {text}"));
        Ok(())
    }

    async fn press_enter(&self, selector: &str) -> Result<()> {
        self.present(selector)?;
        record(&self.actions, format!("enter {selector}"));
        Ok(())
    }

    async fn wait_stable(&self) -> Result<()> {
        record(&self.actions, "wait stable".to_owned());
        Ok(())
    }

    async fn hook_responses(&self, url_pattern: &str) -> Result<ResponseStream> {
        record(&self.actions, format!("hook {url_pattern}"));
        if self.failing_hook {
            return Err(Error::browser("Fetch.enable failed"));
        }
        let (tx, rx) = mpsc::unbounded();
        *self.hook.lock().expect("hook lock") = Some(tx);
        Ok(rx.boxed())
    }

    async fn unhook(&self) -> Result<()> {
        record(&self.actions, "unhook".to_owned());
        self.hook.lock().expect("hook lock").take();
        Ok(())
    }
}

pub struct FakeSession {
    page: FakePage,
    actions: Actions,
}

#[async_trait]
impl Session for FakeSession {
    type Page = FakePage;

    async fn open(&self, url: &str) -> Result<FakePage> {
        record(&self.actions, format!("open {url}"));
        Ok(self.page.clone())
    }

    async fn close(&mut self) -> Result<()> {
        record(&self.actions, "close".to_owned());
        Ok(())
    }
}

/// Hands out sessions over a copy of `page`, failing the first
/// `failing_launches` launches. All sessions share one action log.
#[derive(Debug, Default)]
pub struct FakeLauncher {
    page: FakePage,
    actions: Actions,
    failing_launches: AtomicUsize,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        let actions = Actions::default();
        Self {
            page: page.share_actions(&actions),
            actions,
            ..Self::default()
        }
    }

    pub fn failing_first(self, launches: usize) -> Self {
        self.failing_launches.store(launches, Ordering::SeqCst);
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().expect("actions lock").clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession> {
        let attempt = self.launches.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failing_launches.load(Ordering::SeqCst) {
            return Err(Error::browser("browser failed to start"));
        }
        record(&self.actions, "launch".to_owned());
        Ok(FakeSession {
            page: self.page.clone(),
            actions: Arc::clone(&self.actions),
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingDeliverer {
    sent: Mutex<Vec<(i64, String)>>,
    fail: bool,
}

impl RecordingDeliverer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl Deliver for RecordingDeliverer {
    async fn send(&self, recipient: i64, text: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((recipient, text.to_owned()));
        if self.fail {
            Err(Error::DeliveryFailed("chat not found".into()))
        } else {
            Ok(())
        }
    }
}
