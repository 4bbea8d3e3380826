//! Integration tests for the two-step login against a local HTTP stub
//!
//! The stub records every request it receives and answers from a fixed route
//! table, so the tests can check what the login posts, where it stops on
//! failure and which cookies later requests carry.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ig_fetcher::app::{
    ClientConfig, HttpHandler, LoginProtocol, ReportRequest, SessionContext, SiteConfig,
    StepUpLogin, Transport,
};
use ig_fetcher::auth::Credentials;
use ig_fetcher::errors::AuthError;

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    set_cookie: Option<&'static str>,
    body: &'static str,
    delay: Duration,
}

impl Route {
    fn status(status: u16) -> Self {
        Self {
            status,
            set_cookie: None,
            body: "",
            delay: Duration::ZERO,
        }
    }

    fn with_cookie(mut self, cookie: &'static str) -> Self {
        self.set_cookie = Some(cookie);
        self
    }

    fn with_body(mut self, body: &'static str) -> Self {
        self.body = body;
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn form_has(&self, field: &str, value: &str) -> bool {
        self.body
            .split('&')
            .any(|pair| pair == format!("{}={}", field, value))
    }
}

struct StubSite {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubSite {
    async fn start(routes: Vec<(&'static str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let routes: Arc<HashMap<&'static str, Route>> = Arc::new(routes.into_iter().collect());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &recorded).await;
                });
            }
        });

        Self { addr, requests }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn context(&self, client: &ClientConfig) -> Arc<SessionContext> {
        Arc::new(SessionContext::new(client, SiteConfig::with_base_url(self.base_url())).unwrap())
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &HashMap<&'static str, Route>,
    recorded: &Mutex<Vec<Recorded>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default().to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_string()))
        .collect();

    let length = headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    recorded.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        headers,
        body,
    });

    let route = routes
        .get(path.as_str())
        .cloned()
        .unwrap_or_else(|| Route::status(404));
    if !route.delay.is_zero() {
        tokio::time::sleep(route.delay).await;
    }

    let reason = StatusCode::from_u16(route.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown");
    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n",
        route.status,
        reason,
        route.body.len()
    );
    if let Some(cookie) = route.set_cookie {
        response.push_str(&format!("Set-Cookie: {}\r\n", cookie));
    }
    response.push_str("\r\n");
    response.push_str(route.body);

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn credentials() -> Credentials {
    Credentials::new("1234", "9876", "admin-secret")
}

#[tokio::test]
async fn test_login_posts_both_steps_and_cookies_reach_reports() {
    let site = StubSite::start(vec![
        ("/login.php", Route::status(200).with_cookie("sid=abc123; Path=/")),
        ("/admin/login.php", Route::status(200).with_cookie("elevated=1; Path=/")),
        (
            "/reports/members.php",
            Route::status(200).with_body("<html><body><table></table></body></html>"),
        ),
    ])
    .await;
    let context = site.context(&ClientConfig::default());

    let login = StepUpLogin::new(Arc::clone(&context), credentials());
    login.login().await.unwrap();

    let requests = site.requests();
    assert_eq!(requests.len(), 2);

    let primary = &requests[0];
    assert_eq!(primary.method, "POST");
    assert_eq!(primary.path, "/login.php");
    assert_eq!(
        primary.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert!(primary.form_has("task", "login"));
    assert!(primary.form_has("memberid", "1234"));
    assert!(primary.form_has("pin", "9876"));
    assert!(!primary.body.contains("admin-secret"));

    let step_up = &requests[1];
    assert_eq!(step_up.method, "POST");
    assert_eq!(step_up.path, "/admin/login.php");
    assert!(step_up.form_has("password", "admin-secret"));
    assert!(step_up.header("cookie").unwrap_or_default().contains("sid=abc123"));

    let transport = HttpHandler::new(Arc::clone(&context), 10).unwrap();
    let response = transport
        .send(&ReportRequest::get("/reports/members.php"))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let report = &site.requests()[2];
    assert_eq!(report.method, "GET");
    let cookies = report.header("cookie").unwrap_or_default();
    assert!(cookies.contains("sid=abc123"));
    assert!(cookies.contains("elevated=1"));
}

#[tokio::test]
async fn test_rejected_primary_login_skips_step_up() {
    let site = StubSite::start(vec![
        ("/login.php", Route::status(401)),
        ("/admin/login.php", Route::status(200)),
    ])
    .await;

    let login = StepUpLogin::new(site.context(&ClientConfig::default()), credentials());
    let result = login.login().await;

    assert!(matches!(
        result,
        Err(AuthError::PrimaryLoginFailed { status: 401 })
    ));
    let requests = site.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/login.php");
}

#[tokio::test]
async fn test_rejected_step_up_fails_the_attempt() {
    let site = StubSite::start(vec![
        ("/login.php", Route::status(200).with_cookie("sid=abc123; Path=/")),
        ("/admin/login.php", Route::status(403)),
    ])
    .await;

    let login = StepUpLogin::new(site.context(&ClientConfig::default()), credentials());
    let result = login.login().await;

    assert!(matches!(result, Err(AuthError::StepUpFailed { status: 403 })));
    let paths: Vec<String> = site.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/login.php", "/admin/login.php"]);
}

#[tokio::test]
async fn test_login_timeout_reports_configured_value() {
    let site = StubSite::start(vec![(
        "/login.php",
        Route::status(200).with_delay(Duration::from_secs(3)),
    )])
    .await;
    let client = ClientConfig {
        request_timeout: Duration::from_secs(1),
        ..Default::default()
    };

    let login = StepUpLogin::new(site.context(&client), credentials());
    let result = login.login().await;

    assert!(matches!(result, Err(AuthError::Timeout { seconds: 1 })));
}
