//! Headless Chromium fallback.
//!
//! Loads the public results page and captures the `LatestResult` response the
//! page requests by itself. Every request to a host outside the allow-list is
//! failed through CDP `Fetch` interception before it leaves the browser.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch;
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

use crate::adapters::http::USER_AGENT;
use crate::config::FetchConfig;
use crate::core::{ApiEnvelope, DrawResult, DrawSource};
use crate::utils::error::{LottoError, Result};

/// 台灣彩券自己的網域
pub const ALLOWED_HOSTS: [&str; 3] = [
    "www.taiwanlottery.com",
    "taiwanlottery.com",
    "api.taiwanlottery.com",
];

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptDecision {
    Continue,
    Abort { host: String },
}

/// 瀏覽器備援允許連線的主機
#[derive(Debug, Clone)]
pub struct HostAllowList {
    hosts: HashSet<String>,
}

impl HostAllowList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|host| host.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// 預設網域再加上設定中 API 與頁面網址的主機
    pub fn for_config(config: &FetchConfig) -> Self {
        let mut allow_list = Self::new(ALLOWED_HOSTS);
        for url in [&config.api_endpoint, &config.page_url] {
            if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
                allow_list.hosts.insert(host.to_ascii_lowercase());
            }
        }
        allow_list
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    /// 沒有主機的網址 (about:blank、data:) 放行，無法解析的網址一律擋掉
    pub fn decide(&self, url: &str) -> InterceptDecision {
        match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                None => InterceptDecision::Continue,
                Some(host) if self.is_allowed(host) => InterceptDecision::Continue,
                Some(host) => InterceptDecision::Abort {
                    host: host.to_string(),
                },
            },
            Err(_) => InterceptDecision::Abort {
                host: url.to_string(),
            },
        }
    }
}

pub fn is_api_request(url: &str, method: &str, api_endpoint: &str) -> bool {
    url.starts_with(api_endpoint) && method.eq_ignore_ascii_case("GET")
}

fn decode_body(body: &str, base64_encoded: bool) -> Result<serde_json::Value> {
    if base64_encoded {
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| LottoError::BrowserSessionError {
                message: format!("response body is not valid base64: {}", e),
            })?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    Ok(serde_json::from_str(body)?)
}

/// 建立只跑這一次備援用的 current-thread runtime
///
/// 呼叫端所在的執行緒若已經有 runtime 在跑，就不能再 `block_on`。
pub fn single_shot_runtime() -> Result<tokio::runtime::Runtime> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(LottoError::RuntimeError {
            message: "an async runtime is already running on this thread".to_string(),
        });
    }

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LottoError::RuntimeError {
            message: e.to_string(),
        })
}

/// 以無頭瀏覽器取得開獎結果
pub struct BrowserFetcher {
    config: FetchConfig,
}

impl BrowserFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

impl DrawSource for BrowserFetcher {
    fn name(&self) -> &str {
        "Browser fallback"
    }

    fn fetch_latest(&self) -> Result<Option<DrawResult>> {
        let runtime = single_shot_runtime()?;
        runtime.block_on(fetch_with_browser(&self.config))
    }
}

pub async fn fetch_with_browser(config: &FetchConfig) -> Result<Option<DrawResult>> {
    tracing::info!("🌐 正在抓取最新開獎結果 (瀏覽器備援)...");
    let allow_list = HostAllowList::for_config(config);

    let mut session = BrowserSession::launch(config).await?;
    let captured = session.capture_api_payload(config, allow_list).await;
    // 不論成功與否都先關閉瀏覽器
    session.close().await;

    ApiEnvelope::from_value(captured?)?.into_draw_result()
}

struct BrowserSession {
    browser: Browser,
    tasks: Vec<JoinHandle<()>>,
    // 最後才刪除暫存的使用者資料夾
    _profile: TempDir,
}

impl BrowserSession {
    async fn launch(config: &FetchConfig) -> Result<Self> {
        let profile = tempfile::Builder::new()
            .prefix("taiwan-lotto-chromium-")
            .tempdir()?;

        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .user_data_dir(profile.path())
            .request_timeout(config.navigation_timeout)
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={}", USER_AGENT));
        if let Some(path) = &config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder
            .build()
            .map_err(|message| LottoError::BrowserSessionError { message })?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        tracing::debug!("Chromium launched with profile {}", profile.path().display());

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            tasks: vec![handler_task],
            _profile: profile,
        })
    }

    async fn capture_api_payload(
        &mut self,
        config: &FetchConfig,
        allow_list: HostAllowList,
    ) -> Result<serde_json::Value> {
        let page = self.browser.new_page("about:blank").await?;

        page.execute(network::EnableParams::default()).await?;
        page.execute(fetch::EnableParams {
            patterns: Some(vec![fetch::RequestPattern {
                url_pattern: Some("*".to_string()),
                resource_type: None,
                request_stage: Some(fetch::RequestStage::Request),
            }]),
            handle_auth_requests: Some(false),
        })
        .await?;
        self.tasks.push(spawn_request_guard(&page, allow_list).await?);

        // 導覽前先訂閱，才不會漏掉頁面發出的 API 請求
        let sent = page
            .event_listener::<network::EventRequestWillBeSent>()
            .await?;
        let finished = page
            .event_listener::<network::EventLoadingFinished>()
            .await?;

        let navigation = async {
            match timeout(config.navigation_timeout, page.goto(config.page_url.as_str())).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(LottoError::from(e)),
                Err(_) => Err(LottoError::TimeoutError {
                    phase: "page navigation",
                    seconds: config.navigation_timeout.as_secs(),
                }),
            }
        };
        let response = async {
            let waiter = wait_for_api_body(&page, sent, finished, &config.api_endpoint);
            match timeout(config.timeout, waiter).await {
                Ok(result) => result,
                Err(_) => Err(LottoError::TimeoutError {
                    phase: "API response",
                    seconds: config.timeout.as_secs(),
                }),
            }
        };

        let ((), payload) = tokio::try_join!(navigation, response)?;
        Ok(payload)
    }

    async fn close(mut self) {
        shutdown(&mut self.browser, CLOSE_TIMEOUT).await;
        for task in &self.tasks {
            task.abort();
        }
        tracing::debug!("Browser session closed");
    }
}

/// 可以關閉、等待結束、強制終止的瀏覽器行程
trait ManagedBrowser {
    fn close_gracefully(&mut self) -> impl Future<Output = Result<()>>;
    fn wait_for_exit(&mut self) -> impl Future<Output = std::io::Result<()>>;
    fn force_kill(&mut self) -> impl Future<Output = ()>;
}

impl ManagedBrowser for Browser {
    async fn close_gracefully(&mut self) -> Result<()> {
        self.close().await?;
        Ok(())
    }

    async fn wait_for_exit(&mut self) -> std::io::Result<()> {
        self.wait().await.map(|_| ())
    }

    async fn force_kill(&mut self) {
        if let Some(Err(e)) = self.kill().await {
            tracing::debug!("Failed to kill browser process: {}", e);
        }
    }
}

/// 每一步都有逾時；正常關閉失敗或行程沒有結束就強制終止
async fn shutdown<B: ManagedBrowser>(browser: &mut B, grace: Duration) {
    let closed = match timeout(grace, browser.close_gracefully()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!("Failed to close browser cleanly: {}", e);
            false
        }
        Err(_) => {
            tracing::warn!("Timed out closing browser");
            false
        }
    };

    if closed {
        match timeout(grace, browser.wait_for_exit()).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => tracing::debug!("Failed to reap browser process: {}", e),
            Err(_) => tracing::warn!("Browser process did not exit in time"),
        }
    }

    browser.force_kill().await;
}

async fn spawn_request_guard(page: &Page, allow_list: HostAllowList) -> Result<JoinHandle<()>> {
    let mut paused = page.event_listener::<fetch::EventRequestPaused>().await?;
    let page = page.clone();

    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let outcome = match allow_list.decide(&event.request.url) {
                InterceptDecision::Continue => page
                    .execute(fetch::ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ()),
                InterceptDecision::Abort { host } => {
                    tracing::debug!("Blocked request to third-party host {}", host);
                    page.execute(fetch::FailRequestParams {
                        request_id: event.request_id.clone(),
                        error_reason: network::ErrorReason::BlockedByClient,
                    })
                    .await
                    .map(|_| ())
                }
            };
            if let Err(e) = outcome {
                tracing::debug!("Failed to resolve paused request {}: {}", event.request.url, e);
            }
        }
    }))
}

/// 配對頁面發出的 API 請求與它的 loadingFinished，兩種事件先到哪個都可以
#[derive(Debug)]
struct ApiResponseTracker {
    api_endpoint: String,
    pending: HashSet<String>,
    finished: HashSet<String>,
}

impl ApiResponseTracker {
    fn new(api_endpoint: &str) -> Self {
        Self {
            api_endpoint: api_endpoint.to_string(),
            pending: HashSet::new(),
            finished: HashSet::new(),
        }
    }

    /// 回傳 true 表示這個請求的回應已經可以讀取
    fn on_request_sent(&mut self, request_id: &str, url: &str, method: &str) -> bool {
        if !is_api_request(url, method, &self.api_endpoint) {
            return false;
        }
        tracing::debug!("Page requested {}", url);
        if self.finished.contains(request_id) {
            return true;
        }
        self.pending.insert(request_id.to_string());
        false
    }

    fn on_loading_finished(&mut self, request_id: &str) -> bool {
        if self.pending.contains(request_id) {
            return true;
        }
        self.finished.insert(request_id.to_string());
        false
    }
}

async fn wait_for_api_body<S, F>(
    page: &Page,
    mut sent: S,
    mut finished: F,
    api_endpoint: &str,
) -> Result<serde_json::Value>
where
    S: Stream<Item = Arc<network::EventRequestWillBeSent>> + Unpin,
    F: Stream<Item = Arc<network::EventLoadingFinished>> + Unpin,
{
    let mut tracker = ApiResponseTracker::new(api_endpoint);

    loop {
        let ready = tokio::select! {
            biased;
            Some(event) = sent.next() => tracker
                .on_request_sent(event.request_id.inner(), &event.request.url, &event.request.method)
                .then(|| event.request_id.clone()),
            Some(event) = finished.next() => tracker
                .on_loading_finished(event.request_id.inner())
                .then(|| event.request_id.clone()),
            else => {
                return Err(LottoError::BrowserSessionError {
                    message: "page event streams ended before the API response".to_string(),
                });
            }
        };

        if let Some(request_id) = ready {
            let body = page
                .execute(network::GetResponseBodyParams::new(request_id))
                .await?;
            return decode_body(&body.result.body, body.result.base64_encoded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_aborts_third_party_hosts() {
        let allow_list = HostAllowList::new(ALLOWED_HOSTS);

        assert_eq!(
            allow_list.decide("https://www.google-analytics.com/g/collect?v=2"),
            InterceptDecision::Abort {
                host: "www.google-analytics.com".to_string()
            }
        );
        assert_eq!(
            allow_list.decide("https://evil.taiwanlottery.com.example.net/x.js"),
            InterceptDecision::Abort {
                host: "evil.taiwanlottery.com.example.net".to_string()
            }
        );
    }

    #[test]
    fn test_allow_list_continues_lottery_hosts() {
        let allow_list = HostAllowList::new(ALLOWED_HOSTS);

        assert_eq!(
            allow_list.decide("https://www.taiwanlottery.com/lotto/lotto_lastest_result"),
            InterceptDecision::Continue
        );
        assert_eq!(
            allow_list.decide("https://API.TaiwanLottery.com/TLCAPIWeB/Lottery/LatestResult"),
            InterceptDecision::Continue
        );
        assert_eq!(allow_list.decide("about:blank"), InterceptDecision::Continue);
        assert_eq!(
            allow_list.decide("data:image/png;base64,AAAA"),
            InterceptDecision::Continue
        );
    }

    #[test]
    fn test_allow_list_aborts_unparseable_url() {
        let allow_list = HostAllowList::new(ALLOWED_HOSTS);
        assert!(matches!(
            allow_list.decide("not a url"),
            InterceptDecision::Abort { .. }
        ));
    }

    #[test]
    fn test_allow_list_includes_configured_hosts() {
        let config = FetchConfig::default().with_api_endpoint("http://127.0.0.1:8080/LatestResult");
        let allow_list = HostAllowList::for_config(&config);

        assert!(allow_list.is_allowed("127.0.0.1"));
        assert!(allow_list.is_allowed("www.taiwanlottery.com"));
        assert!(!allow_list.is_allowed("cdn.jsdelivr.net"));
    }

    #[test]
    fn test_is_api_request_matches_get_only() {
        let api = "https://api.taiwanlottery.com/TLCAPIWeB/Lottery/LatestResult";
        assert!(is_api_request(&format!("{}?_=1700000000", api), "GET", api));
        assert!(!is_api_request(api, "OPTIONS", api));
        assert!(!is_api_request(
            "https://api.taiwanlottery.com/TLCAPIWeB/Lottery/Lotto649Result",
            "GET",
            api
        ));
    }

    #[test]
    fn test_decode_body_plain_and_base64() {
        let plain = decode_body(r#"{"rtCode":0}"#, false).unwrap();
        assert_eq!(plain["rtCode"], 0);

        let encoded = STANDARD.encode(r#"{"rtCode":0,"rtMsg":"成功"}"#);
        let decoded = decode_body(&encoded, true).unwrap();
        assert_eq!(decoded["rtMsg"], "成功");

        assert!(matches!(
            decode_body("<html></html>", false),
            Err(LottoError::SerializationError(_))
        ));
    }

    #[test]
    fn test_single_shot_runtime_outside_async_context() {
        let runtime = single_shot_runtime().unwrap();
        assert_eq!(runtime.block_on(async { 1 + 1 }), 2);
    }

    #[tokio::test]
    async fn test_single_shot_runtime_refuses_nested_runtime() {
        assert!(matches!(
            single_shot_runtime(),
            Err(LottoError::RuntimeError { .. })
        ));
    }

    #[tokio::test]
    async fn test_browser_fetcher_inside_runtime_fails_without_launching() {
        let fetcher = BrowserFetcher::new(FetchConfig::default());
        assert!(matches!(
            fetcher.fetch_latest(),
            Err(LottoError::RuntimeError { .. })
        ));
    }

    #[test]
    fn test_tracker_matches_request_then_finish() {
        let api = "https://api.taiwanlottery.com/TLCAPIWeB/Lottery/LatestResult";
        let mut tracker = ApiResponseTracker::new(api);

        assert!(!tracker.on_request_sent("7.1", "https://www.taiwanlottery.com/app.js", "GET"));
        assert!(!tracker.on_request_sent("7.2", api, "GET"));
        assert!(!tracker.on_loading_finished("7.1"));
        assert!(tracker.on_loading_finished("7.2"));
    }

    #[test]
    fn test_tracker_matches_finish_seen_before_request() {
        let api = "https://api.taiwanlottery.com/TLCAPIWeB/Lottery/LatestResult";
        let mut tracker = ApiResponseTracker::new(api);

        assert!(!tracker.on_loading_finished("9.4"));
        assert!(tracker.on_request_sent("9.4", api, "GET"));
    }

    #[test]
    fn test_tracker_ignores_preflight() {
        let api = "https://api.taiwanlottery.com/TLCAPIWeB/Lottery/LatestResult";
        let mut tracker = ApiResponseTracker::new(api);

        assert!(!tracker.on_loading_finished("3.3"));
        assert!(!tracker.on_request_sent("3.3", api, "OPTIONS"));
    }

    #[derive(Default)]
    struct FakeBrowser {
        close_fails: bool,
        close_hangs: bool,
        never_exits: bool,
        killed: bool,
    }

    impl ManagedBrowser for FakeBrowser {
        async fn close_gracefully(&mut self) -> Result<()> {
            if self.close_hangs {
                std::future::pending::<()>().await;
            }
            if self.close_fails {
                return Err(LottoError::BrowserSessionError {
                    message: "handler gone".to_string(),
                });
            }
            Ok(())
        }

        async fn wait_for_exit(&mut self) -> std::io::Result<()> {
            if self.never_exits {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn force_kill(&mut self) {
            self.killed = true;
        }
    }

    const GRACE: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_shutdown_clean_exit_does_not_kill() {
        let mut browser = FakeBrowser::default();
        shutdown(&mut browser, GRACE).await;
        assert!(!browser.killed);
    }

    #[tokio::test]
    async fn test_shutdown_kills_when_close_fails_and_process_hangs() {
        let mut browser = FakeBrowser {
            close_fails: true,
            never_exits: true,
            ..FakeBrowser::default()
        };
        timeout(Duration::from_secs(2), shutdown(&mut browser, GRACE))
            .await
            .expect("shutdown must not hang");
        assert!(browser.killed);
    }

    #[tokio::test]
    async fn test_shutdown_kills_when_close_times_out() {
        let mut browser = FakeBrowser {
            close_hangs: true,
            never_exits: true,
            ..FakeBrowser::default()
        };
        timeout(Duration::from_secs(2), shutdown(&mut browser, GRACE))
            .await
            .expect("shutdown must not hang");
        assert!(browser.killed);
    }

    #[tokio::test]
    async fn test_shutdown_kills_when_process_outlives_close() {
        let mut browser = FakeBrowser {
            never_exits: true,
            ..FakeBrowser::default()
        };
        timeout(Duration::from_secs(2), shutdown(&mut browser, GRACE))
            .await
            .expect("shutdown must not hang");
        assert!(browser.killed);
    }
}
