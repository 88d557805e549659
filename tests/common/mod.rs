//! Recording stand-in for the OS notification center

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use native_notify::{
    AuthorizationState, CallbackRegistry, ClickCallback, Completion, NotificationCenter, NotificationContent,
    NotificationEvent, NotificationRequest,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Per-title answer to `add_request`, overriding the center-wide behavior.
enum Scripted {
    Reject { message: String, after: Duration },
    Hold,
}

struct FakeState {
    authorization: AuthorizationState,
    grant: bool,
    reject_with: Option<String>,
    hold: bool,
    scripted: HashMap<String, Scripted>,
    held: Vec<Completion<Result<(), String>>>,
    submitted: Vec<NotificationContent>,
    removed: Vec<String>,
    removed_all: usize,
}

/// Answers completions from a separate thread, like Apple's queues do.
pub struct FakeCenter {
    state: Mutex<FakeState>,
    registry: Mutex<Option<Arc<CallbackRegistry>>>,
}

impl FakeCenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                authorization: AuthorizationState::NotDetermined,
                grant: true,
                reject_with: None,
                hold: false,
                scripted: HashMap::new(),
                held: Vec::new(),
                submitted: Vec::new(),
                removed: Vec::new(),
                removed_all: 0,
            }),
            registry: Mutex::new(None),
        })
    }

    pub fn set_authorization(&self, state: AuthorizationState) {
        self.state.lock().authorization = state;
    }

    pub fn set_grant(&self, grant: bool) {
        self.state.lock().grant = grant;
    }

    pub fn reject_with(&self, message: &str) {
        self.state.lock().reject_with = Some(message.to_string());
    }

    /// Never answer `add_request` completions.
    pub fn hold_completions(&self) {
        self.state.lock().hold = true;
    }

    /// Rejects requests titled `title` with `message`, answering after `after`.
    pub fn reject_title_after(&self, title: &str, message: &str, after: Duration) {
        self.state.lock().scripted.insert(
            title.to_string(),
            Scripted::Reject {
                message: message.to_string(),
                after,
            },
        );
    }

    /// Never answers requests titled `title`.
    pub fn hold_title(&self, title: &str) {
        self.state.lock().scripted.insert(title.to_string(), Scripted::Hold);
    }

    /// Simulates the user clicking the notification with `identifier`. The
    /// `userInfo` comes from the content last submitted under that
    /// identifier, as the OS would hand it back.
    pub fn click(&self, identifier: &str) -> bool {
        let user_info = self
            .state
            .lock()
            .submitted
            .iter()
            .rev()
            .find(|content| content.identifier == identifier)
            .and_then(|content| content.user_info.clone());
        let registry = self.registry.lock().clone();
        registry
            .map(|registry| {
                registry.dispatch_with_user_info(identifier, NotificationEvent::Click, user_info)
            })
            .unwrap_or(false)
    }

    pub fn submitted(&self) -> Vec<NotificationContent> {
        self.state.lock().submitted.clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.state.lock().removed.clone()
    }

    pub fn removed_all(&self) -> usize {
        self.state.lock().removed_all
    }
}

fn answer_later<T: Send + 'static>(completion: Completion<T>, value: T) {
    answer_after(completion, value, Duration::from_millis(5));
}

fn answer_after<T: Send + 'static>(completion: Completion<T>, value: T, delay: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        completion.fulfill(value);
    });
}

impl NotificationCenter for FakeCenter {
    fn request_authorization(&self, completion: Completion<bool>) {
        let grant = self.state.lock().grant;
        answer_later(completion, grant);
    }

    fn authorization_state(&self, completion: Completion<AuthorizationState>) {
        let state = self.state.lock().authorization;
        answer_later(completion, state);
    }

    fn add_request(&self, content: NotificationContent, completion: Completion<Result<(), String>>) {
        let mut state = self.state.lock();
        let scripted = state.scripted.get(&content.title).map(|scripted| match scripted {
            Scripted::Reject { message, after } => Some((message.clone(), *after)),
            Scripted::Hold => None,
        });
        state.submitted.push(content);
        match scripted {
            Some(Some((message, after))) => {
                answer_after(completion, Err(message), after);
                return;
            },
            Some(None) => {
                state.held.push(completion);
                return;
            },
            None => {},
        }
        if state.hold {
            state.held.push(completion);
            return;
        }
        let outcome = match &state.reject_with {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        };
        answer_later(completion, outcome);
    }

    fn remove(&self, identifier: &str) {
        self.state.lock().removed.push(identifier.to_string());
    }

    fn remove_all(&self) {
        self.state.lock().removed_all += 1;
    }

    fn attach_registry(&self, registry: Arc<CallbackRegistry>) {
        *self.registry.lock() = Some(registry);
    }
}

pub type Event = (NotificationEvent, Option<String>);

/// Callback that forwards its invocation into a channel. The receiver sees
/// `None` once the callback is dropped without being called.
pub fn recording_callback() -> (ClickCallback, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ClickCallback = Box::new(move |event, user_info| {
        let _ = tx.send((event, user_info));
    });
    (callback, rx)
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Option<Event> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Routes library logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn request(title: &str) -> NotificationRequest {
    NotificationRequest::new(title)
}
