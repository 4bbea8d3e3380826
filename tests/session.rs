//! Integration tests for the shared login session
//!
//! These tests drive the session coordinator and the fetch gateway through
//! in-process fakes to check single-flight login and the single retry after
//! session expiry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::broadcast;

use ig_fetcher::app::{
    FetchGateway, ReportRequest, SessionConfig, SessionCoordinator, SessionPhase,
};

use common::{leaderboard_page, login_page, MockLogin, MockTransport, Reply, LOGIN_MARKER};

fn coordinator(login: &Arc<MockLogin>) -> SessionCoordinator {
    SessionCoordinator::new(Arc::clone(login) as _, SessionConfig::default())
}

#[tokio::test]
async fn test_concurrent_callers_share_one_login() {
    let login = MockLogin::new(true, Duration::from_millis(50));
    let session = coordinator(&login);

    let results = join_all((0..20).map(|_| {
        let session = session.clone();
        async move { session.wait_until_authenticated().await }
    }))
    .await;

    assert!(results.iter().all(|ok| *ok));
    assert_eq!(login.calls(), 1);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Authenticated);
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.login_attempts, 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_failure() {
    let login = MockLogin::new(false, Duration::from_millis(30));
    let session = coordinator(&login);

    let results = join_all((0..10).map(|_| {
        let session = session.clone();
        async move { session.wait_until_authenticated().await }
    }))
    .await;

    assert!(results.iter().all(|ok| !*ok));
    assert_eq!(login.calls(), 1);
    assert_eq!(session.snapshot().await.login_failures, 1);

    // The next caller starts a fresh attempt
    login.set_succeed(true);
    assert!(session.wait_until_authenticated().await);
    assert_eq!(login.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_expiry_detections_coalesce() {
    let login = MockLogin::new(true, Duration::from_millis(30));
    let session = coordinator(&login);
    assert!(session.wait_until_authenticated().await);
    let observed = session.generation().await;

    let results = join_all((0..8).map(|_| {
        let session = session.clone();
        async move { session.reauthenticate(observed).await }
    }))
    .await;

    assert!(results.iter().all(|ok| *ok));
    assert_eq!(login.calls(), 2);
    assert_eq!(session.generation().await, observed + 1);
}

#[tokio::test]
async fn test_expired_session_is_retried_once() {
    let login = MockLogin::succeeding();
    let session = coordinator(&login);
    let transport = MockTransport::new(vec![
        Reply::Page(login_page()),
        Reply::Page(leaderboard_page(&[("1", "A Player", 70)])),
    ]);
    let gateway = FetchGateway::new(Arc::clone(&transport) as _, session.clone(), LOGIN_MARKER);

    assert!(session.wait_until_authenticated().await);
    let request = ReportRequest::get("/competition.php?compid=9");
    let document = gateway.fetch(&request).await.unwrap();

    assert_eq!(document.title(), Some("Monthly Medal"));
    assert_eq!(transport.calls(), 2);
    assert_eq!(login.calls(), 2);

    // The retry replays the identical request
    let requests = transport.requests();
    assert_eq!(requests[0], request);
    assert_eq!(requests[1], request);
}

#[tokio::test]
async fn test_persistent_expiry_gives_up_after_one_retry() {
    let login = MockLogin::succeeding();
    let session = coordinator(&login);
    let transport = MockTransport::new(vec![Reply::Page(login_page())]);
    let gateway = FetchGateway::new(Arc::clone(&transport) as _, session.clone(), LOGIN_MARKER);

    assert!(session.wait_until_authenticated().await);
    let document = gateway.fetch(&ReportRequest::get("/competition.php")).await;

    assert!(document.is_none());
    assert_eq!(transport.calls(), 2);
    assert_eq!(login.calls(), 2);
}

#[tokio::test]
async fn test_failed_relogin_stops_without_retry() {
    let login = MockLogin::succeeding();
    let session = coordinator(&login);
    let transport = MockTransport::new(vec![Reply::Page(login_page())]);
    let gateway = FetchGateway::new(Arc::clone(&transport) as _, session.clone(), LOGIN_MARKER);

    assert!(session.wait_until_authenticated().await);
    login.set_succeed(false);

    assert!(gateway.fetch(&ReportRequest::get("/competition.php")).await.is_none());
    assert_eq!(transport.calls(), 1);
    assert_eq!(session.snapshot().await.phase, SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn test_http_failures_are_not_retried() {
    let login = MockLogin::succeeding();
    let session = coordinator(&login);

    for reply in [Reply::Status(500), Reply::TransportError] {
        let transport = MockTransport::new(vec![reply]);
        let gateway =
            FetchGateway::new(Arc::clone(&transport) as _, session.clone(), LOGIN_MARKER);
        assert!(gateway.fetch(&ReportRequest::get("/report.php")).await.is_none());
        assert_eq!(transport.calls(), 1);
    }
    assert_eq!(login.calls(), 0);
}

#[tokio::test]
async fn test_refresh_loop_logs_in_without_callers_and_stops_on_shutdown() {
    let login = MockLogin::succeeding();
    let session = SessionCoordinator::new(
        Arc::clone(&login) as _,
        SessionConfig::default()
            .with_check_interval(Duration::from_millis(10))
            .with_refresh_interval(Duration::from_millis(20)),
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = session.spawn_refresh_loop(shutdown_rx);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // First tick logs in, later ticks refresh once the interval has elapsed
    let logins = login.calls();
    assert!(logins >= 2, "expected repeated logins, got {}", logins);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Authenticated);
    assert!(snapshot.generation >= 2);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("refresh loop did not stop")
        .unwrap();

    let after_shutdown = login.calls();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(login.calls(), after_shutdown);
}
