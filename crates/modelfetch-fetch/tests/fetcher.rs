//! End-to-end behaviour of the fetch loop against a scripted transport.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use modelfetch_catalog::{Catalog, FileSpec, Source};
use modelfetch_fetch::{BoxStream, CancelFlag, FetchError, FetchOptions, FetchPhase, Fetcher, HttpClient, NoDetector, Progress};
use modelfetch_verify::{Checksum, Md5Hasher};
use tempfile::tempdir;

const PRIMARY: &str = "https://drive.example.com/uc?id=model";
const ALTERNATE: &str = "https://mirror.example.com/model.bin";

#[derive(Debug, Clone)]
enum Reply {
    /// Whole body, delivered in 300-byte pieces.
    Body(Vec<u8>),
    /// Request fails before any body byte.
    Refused,
    /// Some body bytes, then the connection drops.
    Truncated(Vec<u8>),
    /// Some body bytes, then silence forever.
    Stall(Vec<u8>),
}

#[derive(Default)]
struct Route {
    script:  VecDeque<Reply>,
    default: Option<Reply>,
}

/// Scripted transport: per-URL queue of replies, then a default reply.
#[derive(Default)]
struct MockClient {
    routes: Mutex<HashMap<String, Route>>,
    calls:  Mutex<Vec<String>>,
}

impl MockClient {
    fn new() -> Self { Self::default() }

    fn always(self, url: &str, reply: Reply) -> Self {
        self.routes.lock().unwrap().entry(url.to_string()).or_default().default = Some(reply);
        self
    }

    fn then(self, url: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .script
            .push_back(reply);
        self
    }

    fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }

    fn next_reply(&self, url: &str) -> Reply {
        self.calls.lock().unwrap().push(url.to_string());
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(route) => route
                .script
                .pop_front()
                .or_else(|| route.default.clone())
                .unwrap_or(Reply::Refused),
            None => Reply::Refused,
        }
    }
}

fn pieces(data: &[u8]) -> Vec<Result<Bytes, io::Error>> {
    data.chunks(300).map(|c| Ok(Bytes::copy_from_slice(c))).collect()
}

impl HttpClient for MockClient {
    type Error = io::Error;

    async fn stream(&self, url: &str) -> Result<BoxStream<'static, Result<Bytes, io::Error>>, io::Error> {
        match self.next_reply(url) {
            Reply::Refused => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "HTTP 503 Service Unavailable")),
            Reply::Body(data) => Ok(Box::pin(futures_util::stream::iter(pieces(&data)))),
            Reply::Truncated(data) => {
                let mut items = pieces(&data);
                items.push(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")));
                Ok(Box::pin(futures_util::stream::iter(items)))
            }
            Reply::Stall(data) => {
                let silence = futures_util::stream::pending::<Result<Bytes, io::Error>>();
                Ok(Box::pin(futures_util::stream::iter(pieces(&data)).chain(silence)))
            }
        }
    }
}

fn payload(len: usize) -> Vec<u8> { (0..len).map(|i| (i * 31 % 251) as u8).collect() }

fn spec_for(data: &[u8], destination: &Path) -> FileSpec {
    let digest = hex::encode(Md5Hasher::digest(data));
    FileSpec::new(PRIMARY, destination)
        .alternate_url(ALTERNATE)
        .expected_size(data.len() as u64)
        .expected_checksum(Checksum::md5(&digest).unwrap())
}

fn options(max_attempts: u32) -> FetchOptions {
    FetchOptions::default()
        .max_attempts(max_attempts)
        .retry_backoff(Duration::ZERO)
        .chunk_size(256)
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn warning_page(links: &[&str]) -> Vec<u8> {
    let mut html = String::from("<html><head><title>Virus scan warning</title></head><body><form>");
    for link in links {
        html.push_str(&format!("<a href=\"{link}\">Download anyway</a>"));
    }
    html.push_str("</form></body></html>");
    let mut body = html.into_bytes();
    body.resize(500, b' ');
    body
}

#[tokio::test]
async fn test_fetch_places_exact_bytes_and_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let destination = out.join("model.bin");
    let data = payload(1024);
    let spec = spec_for(&data, &destination);

    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(data.clone())));
    let placed = fetcher.fetch(&spec, Source::Primary, &options(3)).await.unwrap();

    assert_eq!(placed, destination);
    assert_eq!(std::fs::read(&destination).unwrap(), data);
    assert_eq!(dir_names(&out), ["model.bin"]);
    assert_eq!(fetcher.client().calls().len(), 1);
}

#[tokio::test]
async fn test_checksum_mismatch_never_touches_destination() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(1024);
    let spec = spec_for(&data, &destination);

    let mut corrupt = data.clone();
    corrupt[512] ^= 0xff;
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(corrupt)));

    let err = fetcher.fetch(&spec, Source::Primary, &options(3)).await.unwrap_err();
    assert!(matches!(err, FetchError::AttemptsExhausted { attempts: 3, .. }));
    assert!(matches!(err.last_cause(), FetchError::ChecksumMismatch { .. }));
    assert!(!destination.exists());
    assert!(dir_names(dir.path()).is_empty());
}

#[tokio::test]
async fn test_size_mismatch_reported() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(10_000);
    let spec = spec_for(&data, &destination);

    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(data[..9_000].to_vec())));
    let err = fetcher.fetch(&spec, Source::Primary, &options(2)).await.unwrap_err();
    assert!(matches!(
        err.last_cause(),
        FetchError::SizeMismatch {
            expected: 10_000,
            actual:   9_000
        }
    ));
}

#[tokio::test]
async fn test_failing_transport_uses_exactly_max_attempts() {
    let dir = tempdir().unwrap();
    let spec = spec_for(&payload(64), &dir.path().join("model.bin"));
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Refused));

    let err = fetcher.fetch(&spec, Source::Primary, &options(4)).await.unwrap_err();
    assert!(matches!(err, FetchError::AttemptsExhausted { attempts: 4, .. }));
    assert!(matches!(err.last_cause(), FetchError::Transport(_)));
    assert_eq!(fetcher.client().calls().len(), 4);
}

#[tokio::test]
async fn test_interstitial_link_is_followed_within_budget() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(20_000);
    let spec = spec_for(&data, &destination);
    let confirmed = "https://drive.example.com/uc?export=download&confirm=t&id=model";

    let client = MockClient::new()
        .always(PRIMARY, Reply::Body(warning_page(&["/uc?export=download&amp;confirm=t&amp;id=model"])))
        .always(confirmed, Reply::Body(data.clone()));
    let fetcher = Fetcher::new(client);

    fetcher.fetch(&spec, Source::Primary, &options(2)).await.unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), data);
    assert_eq!(fetcher.client().calls(), [PRIMARY, confirmed]);
}

#[tokio::test]
async fn test_ambiguous_interstitial_retries_same_url() {
    let dir = tempdir().unwrap();
    let spec = spec_for(&payload(20_000), &dir.path().join("model.bin"));
    let page = warning_page(&["/uc?confirm=t&amp;id=a", "/uc?confirm=t&amp;id=b"]);
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(page)));

    fetcher.fetch(&spec, Source::Primary, &options(3)).await.unwrap_err();
    assert_eq!(fetcher.client().calls(), [PRIMARY, PRIMARY, PRIMARY]);
}

#[tokio::test]
async fn test_detector_can_be_disabled() {
    let dir = tempdir().unwrap();
    let spec = spec_for(&payload(20_000), &dir.path().join("model.bin"));
    let page = warning_page(&["/uc?export=download&amp;confirm=t&amp;id=model"]);
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(page))).with_detector(NoDetector);

    fetcher.fetch(&spec, Source::Primary, &options(2)).await.unwrap_err();
    assert_eq!(fetcher.client().calls(), [PRIMARY, PRIMARY]);
}

#[tokio::test]
async fn test_truncated_body_then_success() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(30_000);
    let spec = spec_for(&data, &destination);

    let client = MockClient::new()
        .then(PRIMARY, Reply::Truncated(data[..12_000].to_vec()))
        .then(PRIMARY, Reply::Refused)
        .always(PRIMARY, Reply::Body(data.clone()));
    let fetcher = Fetcher::new(client);

    fetcher.fetch(&spec, Source::Primary, &options(3)).await.unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), data);
    assert_eq!(dir_names(dir.path()), ["model.bin"]);
}

#[tokio::test]
async fn test_failed_refetch_keeps_previous_valid_file() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(2048);
    let spec = spec_for(&data, &destination);
    std::fs::write(&destination, &data).unwrap();

    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Truncated(data[..100].to_vec())));
    let forced = options(2).skip_verified(false);
    fetcher.fetch(&spec, Source::Primary, &forced).await.unwrap_err();

    assert_eq!(std::fs::read(&destination).unwrap(), data);
    assert_eq!(dir_names(dir.path()), ["model.bin"]);
}

#[tokio::test]
async fn test_second_fetch_is_idempotent() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(4096);
    let spec = spec_for(&data, &destination);
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(data.clone())));

    fetcher.fetch(&spec, Source::Primary, &options(2)).await.unwrap();
    fetcher.fetch(&spec, Source::Primary, &options(2)).await.unwrap();
    assert_eq!(fetcher.client().calls().len(), 1);
    assert_eq!(std::fs::read(&destination).unwrap(), data);

    fetcher
        .fetch(&spec, Source::Primary, &options(2).skip_verified(false))
        .await
        .unwrap();
    assert_eq!(fetcher.client().calls().len(), 2);
    assert_eq!(std::fs::read(&destination).unwrap(), data);
}

#[tokio::test]
async fn test_corrupt_existing_file_is_replaced() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(4096);
    let spec = spec_for(&data, &destination);
    std::fs::write(&destination, vec![0u8; 4096]).unwrap();

    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(data.clone())));
    fetcher.fetch(&spec, Source::Primary, &options(1)).await.unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), data);
}

#[tokio::test]
async fn test_alternate_used_after_primary_exhausted() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(1500);
    let spec = spec_for(&data, &destination);

    let client = MockClient::new()
        .always(PRIMARY, Reply::Refused)
        .always(ALTERNATE, Reply::Body(data.clone()));
    let fetcher = Fetcher::new(client);

    fetcher.fetch_with_fallback(&spec, &options(3)).await.unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), data);
    assert_eq!(fetcher.client().calls(), [PRIMARY, PRIMARY, PRIMARY, ALTERNATE]);
}

#[tokio::test]
async fn test_no_alternate_propagates_primary_error() {
    let dir = tempdir().unwrap();
    let data = payload(100);
    let mut spec = spec_for(&data, &dir.path().join("model.bin"));
    spec.alternate_url = None;

    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Refused));
    let err = fetcher.fetch_with_fallback(&spec, &options(2)).await.unwrap_err();
    assert!(matches!(err, FetchError::AttemptsExhausted { attempts: 2, .. }));
    assert_eq!(fetcher.client().calls(), [PRIMARY, PRIMARY]);
}

#[tokio::test]
async fn test_missing_alternate_locator() {
    let dir = tempdir().unwrap();
    let spec = FileSpec::new(PRIMARY, dir.path().join("model.bin"));
    let fetcher = Fetcher::new(MockClient::new());
    let err = fetcher.fetch(&spec, Source::Alternate, &options(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::MissingSource(Source::Alternate)));
    assert!(fetcher.client().calls().is_empty());
}

#[tokio::test]
async fn test_invalid_options_rejected_before_any_request() {
    let dir = tempdir().unwrap();
    let spec = spec_for(&payload(10), &dir.path().join("model.bin"));
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(payload(10))));

    let err = fetcher.fetch(&spec, Source::Primary, &options(0)).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidOptions(_)));
    assert!(fetcher.client().calls().is_empty());
}

#[tokio::test]
async fn test_cancel_stops_without_fallback() {
    let dir = tempdir().unwrap();
    let data = payload(5000);
    let spec = spec_for(&data, &dir.path().join("model.bin"));
    let cancel = CancelFlag::new();

    let client = MockClient::new()
        .always(PRIMARY, Reply::Body(data.clone()))
        .always(ALTERNATE, Reply::Body(data));
    let fetcher = Fetcher::new(client);

    let flag = cancel.clone();
    let opts = options(5).cancel(cancel).on_progress(Arc::new(move |p: &Progress| {
        if p.phase == FetchPhase::Downloading && p.bytes_downloaded >= 1024 {
            flag.cancel();
        }
    }));

    let err = fetcher.fetch_with_fallback(&spec, &opts).await.unwrap_err();
    assert!(matches!(err, FetchError::Cancelled));
    assert_eq!(fetcher.client().calls(), [PRIMARY]);
    assert!(dir_names(dir.path()).is_empty());
}

fn cancel_after(flag: &CancelFlag, delay: Duration) {
    let flag = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        flag.cancel();
    });
}

#[tokio::test]
async fn test_cancel_interrupts_stalled_body() {
    let dir = tempdir().unwrap();
    let data = payload(5000);
    let spec = spec_for(&data, &dir.path().join("model.bin"));
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Stall(data[..3].to_vec())));

    let cancel = CancelFlag::new();
    cancel_after(&cancel, Duration::from_millis(100));
    let opts = options(3).cancel(cancel);

    let result = tokio::time::timeout(Duration::from_secs(3), fetcher.fetch_with_fallback(&spec, &opts))
        .await
        .expect("stalled fetch did not observe cancellation");
    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert_eq!(fetcher.client().calls(), [PRIMARY]);
    assert!(dir_names(dir.path()).is_empty());
}

#[tokio::test]
async fn test_cancel_interrupts_backoff() {
    let dir = tempdir().unwrap();
    let spec = spec_for(&payload(64), &dir.path().join("model.bin"));
    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Refused));

    let cancel = CancelFlag::new();
    cancel_after(&cancel, Duration::from_millis(100));
    let opts = options(3).retry_backoff(Duration::from_secs(10)).cancel(cancel);

    let result = tokio::time::timeout(Duration::from_secs(3), fetcher.fetch(&spec, Source::Primary, &opts))
        .await
        .expect("backoff sleep did not observe cancellation");
    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert_eq!(fetcher.client().calls(), [PRIMARY]);
}

#[tokio::test]
async fn test_successful_fetch_sweeps_stale_staging_files() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.bin");
    let data = payload(1024);
    let spec = spec_for(&data, &destination);
    std::fs::write(dir.path().join("model.bin.tmp.deadbeef"), b"left by a crash").unwrap();
    std::fs::write(dir.path().join("model.bin.tmp.0123abcd"), b"").unwrap();

    let fetcher = Fetcher::new(MockClient::new().always(PRIMARY, Reply::Body(data.clone())));
    fetcher.fetch(&spec, Source::Primary, &options(1)).await.unwrap();

    assert_eq!(dir_names(dir.path()), ["model.bin"]);
    assert_eq!(std::fs::read(&destination).unwrap(), data);
}

#[tokio::test]
async fn test_progress_resets_on_each_attempt() {
    let dir = tempdir().unwrap();
    let data = payload(1024);
    let spec = spec_for(&data, &dir.path().join("model.bin"));

    let client = MockClient::new()
        .then(PRIMARY, Reply::Truncated(data[..600].to_vec()))
        .always(PRIMARY, Reply::Body(data));
    let fetcher = Fetcher::new(client).with_detector(NoDetector);

    let seen = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = seen.clone();
    let opts = options(2).on_progress(Arc::new(move |p: &Progress| sink.lock().unwrap().push(p.clone())));
    fetcher.fetch(&spec, Source::Primary, &opts).await.unwrap();

    let seen = seen.lock().unwrap();
    let connects: Vec<_> = seen
        .iter()
        .filter(|p| p.phase == FetchPhase::Connecting)
        .map(|p| (p.attempt, p.bytes_downloaded))
        .collect();
    assert_eq!(connects, [(1, 0), (2, 0)]);

    let downloading: Vec<_> = seen
        .iter()
        .filter(|p| p.phase == FetchPhase::Downloading && p.attempt == 2)
        .map(|p| p.bytes_downloaded)
        .collect();
    assert!(downloading.windows(2).all(|w| w[0] < w[1]));
    assert!(downloading.windows(2).all(|w| w[1] - w[0] <= 256));
    assert_eq!(downloading.last(), Some(&1024));

    let last = seen.last().unwrap();
    assert!(last.is_completed());
    assert_eq!(last.percentage(), Some(100.0));
}

#[tokio::test]
async fn test_catalog_run_reports_each_entry() {
    let dir = tempdir().unwrap();
    let good = payload(700);
    let good_spec = FileSpec::new("https://host/good", dir.path().join("good.bin"))
        .expected_size(good.len() as u64);
    let bad_spec = FileSpec::new("https://host/bad", dir.path().join("bad.bin"))
        .alternate_url("https://mirror/bad")
        .expected_size(1);
    let catalog = Catalog::new([("bad", bad_spec), ("good", good_spec)]).unwrap();

    let client = MockClient::new()
        .always("https://host/good", Reply::Body(good.clone()))
        .always("https://host/bad", Reply::Refused)
        .always("https://mirror/bad", Reply::Refused);
    let fetcher = Fetcher::new(client);

    let report = fetcher.fetch_catalog(&catalog, |_| options(1)).await;
    assert!(!report.is_success());
    assert!(!report.aborted);
    assert_eq!(report.fetched.len(), 1);
    assert_eq!(report.fetched[0].0, "good");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad");
    assert_eq!(
        fetcher.client().calls(),
        ["https://host/bad", "https://mirror/bad", "https://host/good"]
    );
}
