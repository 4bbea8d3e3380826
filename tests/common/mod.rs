//! Shared fakes for integration tests
//!
//! `MockTransport` replays scripted responses and counts requests;
//! `MockLogin` counts login attempts with a configurable delay and outcome.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use ig_fetcher::app::{
    CacheConfig, CacheLayers, FetchGateway, LoginProtocol, ReportOrchestrator, ReportRequest,
    SessionConfig, SessionCoordinator, Transport, TransportResponse,
};
use ig_fetcher::errors::{AuthError, AuthResult, FetchError, FetchResult};

pub const BASE_URL: &str = "https://club.example.org";
pub const LOGIN_MARKER: &str = "Login Required";

/// Page served when the session has expired
pub fn login_page() -> String {
    "<html><head><title>Login Required</title></head><body><form></form></body></html>"
        .to_string()
}

/// Leaderboard page with the given (position, name, gross) rows
pub fn leaderboard_page(rows: &[(&str, &str, i32)]) -> String {
    let mut markup = String::from(
        "<html><head><title>Monthly Medal</title></head><body><table>\
         <tr><th>Pos</th><th>Name</th><th>Gross</th></tr>",
    );
    for (position, name, gross) in rows {
        markup.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            position, name, gross
        ));
    }
    markup.push_str("</table></body></html>");
    markup
}

/// One scripted transport reply
#[derive(Debug, Clone)]
pub enum Reply {
    Page(String),
    Status(u16),
    TransportError,
}

/// Transport that replays scripted replies, repeating the last one
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<ReportRequest>>,
}

impl MockTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Self::with_delay(replies, Duration::ZERO)
    }

    pub fn with_delay(replies: Vec<Reply>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            delay,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn pages(pages: &[String]) -> Arc<Self> {
        Self::new(pages.iter().cloned().map(Reply::Page).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = replies.pop_front() {
            *last = Some(reply);
        }
        last.clone().unwrap_or(Reply::Status(404))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ReportRequest) -> FetchResult<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.next_reply() {
            Reply::Page(body) => Ok(TransportResponse::ok(body)),
            Reply::Status(status) => Ok(TransportResponse {
                status: StatusCode::from_u16(status).unwrap(),
                body: String::new(),
            }),
            Reply::TransportError => Err(FetchError::Timeout { seconds: 30 }),
        }
    }
}

/// Login protocol that counts attempts
pub struct MockLogin {
    calls: AtomicUsize,
    succeed: AtomicBool,
    delay: Duration,
}

impl MockLogin {
    pub fn succeeding() -> Arc<Self> {
        Self::new(true, Duration::ZERO)
    }

    pub fn failing() -> Arc<Self> {
        Self::new(false, Duration::ZERO)
    }

    pub fn new(succeed: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            succeed: AtomicBool::new(succeed),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_succeed(&self, succeed: bool) {
        self.succeed.store(succeed, Ordering::SeqCst);
    }
}

#[async_trait]
impl LoginProtocol for MockLogin {
    async fn login(&self) -> AuthResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.succeed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::StepUpFailed { status: 403 })
        }
    }
}

/// Orchestrator wired to the fakes
pub fn orchestrator(
    transport: Arc<MockTransport>,
    login: Arc<MockLogin>,
    cache_config: CacheConfig,
) -> ReportOrchestrator {
    let session = SessionCoordinator::new(login, SessionConfig::default());
    let gateway = FetchGateway::new(transport, session.clone(), LOGIN_MARKER);
    let cache = Arc::new(CacheLayers::in_memory(cache_config));
    ReportOrchestrator::new(session, gateway, cache, Url::parse(BASE_URL).unwrap())
}
