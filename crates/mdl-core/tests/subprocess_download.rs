//! End-to-end attempts against fake downloader scripts.
#![cfg(unix)]

mod common;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use common::fake_downloader::{quick_options, runtime_for, write_script};
use common::{drain, kinds};
use mdl_core::model::{JobId, Provider};
use mdl_core::strategy::{execute, PreparedInvocation, ProgressSink, SinkError};
use mdl_core::{EventBus, JobEvent, LogStream, MdlError, ProgressSnapshot, Request};

fn request(url: &str, dir: &std::path::Path, retries: u32) -> Request {
    let mut req = Request::new(url, dir);
    req.retries = retries;
    req
}

#[tokio::test]
async fn progress_and_output_path_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clip.mp4");
    let script = write_script(
        dir.path(),
        "yt-dlp",
        &format!(
            r#"echo "[generic] clip: Downloading webpage"
echo "[download] Destination: {out}"
echo "[mdl-progress]downloading|512|1024|NA|2048.0|1|  50.0%"
echo "[download]  75.0% of ~  1.00KiB at  1.00KiB/s ETA 00:01"
echo "[mdl-progress]finished|1024|1024|NA|NA|NA|100.0%""#,
            out = out.display()
        ),
    );
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let runtime = runtime_for(script, quick_options(1), bus);
    let summary = runtime
        .start(vec![request("https://example.org/clip", dir.path(), 0)])
        .await
        .unwrap();

    let r = &summary.results[0];
    assert!(r.success, "{r:?}");
    assert_eq!(r.file_path.as_ref(), Some(&out));
    assert_eq!(r.provider, Provider::Generic);

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), ["started:1", "completed"]);
    let percents: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { snapshot, .. } => snapshot.percent,
            _ => None,
        })
        .collect();
    assert_eq!(percents, [50.0, 75.0, 100.0]);
    assert!(!events.iter().any(|e| matches!(e, JobEvent::Log { .. })));
}

#[tokio::test]
async fn invocation_is_passed_as_argv() {
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let script = write_script(
        dir.path(),
        "yt-dlp",
        &format!(r#"printf '%s\n' "$@" > "{}""#, args_file.display()),
    );
    let runtime = runtime_for(script, quick_options(1), EventBus::new());
    let mut req = request("https://example.org/a b?x=1;rm -rf /", dir.path(), 0);
    req.quality = "480p".into();
    let summary = runtime.start(vec![req]).await.unwrap();
    assert!(summary.all_succeeded());

    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    let n = args.len();
    assert_eq!(args[n - 2], "--");
    assert_eq!(args[n - 1], "https://example.org/a%20b?x=1;rm%20-rf%20/");
    let f = args.iter().position(|a| *a == "-f").unwrap();
    assert_eq!(args[f + 1], "best[height<=480]/best");
    assert!(args.contains(&"--newline"));
}

#[tokio::test]
async fn transient_exit_is_retried_until_success() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("count");
    let script = write_script(
        dir.path(),
        "yt-dlp",
        &format!(
            r#"n=$(cat "{c}" 2>/dev/null || echo 0)
n=$((n + 1))
echo "$n" > "{c}"
if [ "$n" -lt 3 ]; then
  echo "ERROR: Unable to download webpage: Connection reset by peer" >&2
  exit 1
fi
echo "[download] Destination: {d}/ok.mp4""#,
            c = counter.display(),
            d = dir.path().display()
        ),
    );
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let runtime = runtime_for(script, quick_options(1), bus);
    let summary = runtime
        .start(vec![request("https://example.org/v", dir.path(), 3)])
        .await
        .unwrap();

    let r = &summary.results[0];
    assert!(r.success);
    assert_eq!(r.attempts, 3);
    assert_eq!(r.file_path, Some(dir.path().join("ok.mp4")));
    assert_eq!(
        kinds(&drain(&mut rx)),
        ["started:1", "retry:1", "started:2", "retry:2", "started:3", "completed"]
    );
}

#[tokio::test]
async fn permanent_failure_carries_stderr_tail() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "yt-dlp",
        r#"for i in 1 2 3 4 5 6 7; do echo "ERROR: line $i" >&2; echo "" >&2; done
exit 2"#,
    );
    let runtime = runtime_for(script, quick_options(1), EventBus::new());
    let summary = runtime
        .start(vec![request("https://example.org/v", dir.path(), 3)])
        .await
        .unwrap();

    let r = &summary.results[0];
    assert!(!r.success);
    assert_eq!(r.attempts, 1);
    let err = r.error.as_deref().unwrap();
    assert!(err.contains("exited with code 2"), "{err}");
    assert!(err.contains("ERROR: line 3") && err.contains("ERROR: line 7"), "{err}");
    assert!(!err.contains("line 2"), "{err}");
}

#[tokio::test]
async fn attempt_timeout_kills_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "yt-dlp", "echo started\nexec sleep 30");
    let runtime = runtime_for(script, quick_options(1), EventBus::new());
    let mut req = request("https://example.org/slow", dir.path(), 1);
    req.timeout = Some(Duration::from_millis(300));

    let began = Instant::now();
    let summary = runtime.start(vec![req]).await.unwrap();
    assert!(began.elapsed() < Duration::from_secs(15));

    let r = &summary.results[0];
    assert!(!r.success);
    assert_eq!(r.attempts, 2);
    assert!(r.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn missing_program_is_a_retryable_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = runtime_for(dir.path().join("does-not-exist"), quick_options(1), EventBus::new());
    let summary = runtime
        .start(vec![request("https://example.org/v", dir.path(), 1)])
        .await
        .unwrap();
    let r = &summary.results[0];
    assert!(!r.success);
    assert_eq!(r.attempts, 2);
    assert!(r.error.as_deref().unwrap().contains("failed to spawn"));
}

#[tokio::test]
async fn raw_log_forwards_both_streams() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "yt-dlp", "echo out-line\necho err-line >&2");
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let mut options = quick_options(1);
    options.raw_log = true;
    let runtime = runtime_for(script, options, bus);
    runtime
        .start(vec![request("https://example.org/v", dir.path(), 0)])
        .await
        .unwrap();

    let mut logs: Vec<(LogStream, String)> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            JobEvent::Log { stream, message, .. } => Some((stream, message)),
            _ => None,
        })
        .collect();
    logs.sort_by_key(|(_, m)| m.clone());
    assert_eq!(
        logs,
        [
            (LogStream::Stderr, "err-line".to_string()),
            (LogStream::Stdout, "out-line".to_string()),
        ]
    );
}

#[tokio::test]
async fn invalid_request_aborts_before_any_event() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let script = write_script(dir.path(), "yt-dlp", &format!("touch \"{}\"", marker.display()));
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let runtime = runtime_for(script, quick_options(2), bus);

    let err = runtime
        .start(vec![
            request("https://example.org/ok", dir.path(), 0),
            request("ftp://example.org/nope", dir.path(), 0),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, MdlError::InvalidInput(_)));
    assert_eq!(err.exit_code(), 2);
    assert!(drain(&mut rx).is_empty());
    assert!(!marker.exists());

    // Ids are only consumed by accepted batches.
    let summary = runtime
        .start(vec![request("https://example.org/ok", dir.path(), 0)])
        .await
        .unwrap();
    assert_eq!(summary.results[0].job_id, JobId(1));
    let summary = runtime
        .start(vec![request("https://example.org/ok", dir.path(), 0)])
        .await
        .unwrap();
    assert_eq!(summary.results[0].job_id, JobId(2));
}

struct RejectingSink;

impl ProgressSink for RejectingSink {
    fn progress(&self, _snapshot: ProgressSnapshot) -> Result<(), SinkError> {
        Err(SinkError("consumer gone".into()))
    }
}

#[tokio::test]
async fn sink_failure_terminates_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "yt-dlp",
        "echo '[mdl-progress]downloading|1|10|NA|NA|NA|10.0%'\nexec sleep 30",
    );
    let prepared = PreparedInvocation {
        job_id: JobId(1),
        provider: Provider::Generic,
        program: PathBuf::from(script),
        args: Vec::new(),
        timeout: None,
    };
    let began = Instant::now();
    let err = execute(&prepared, &RejectingSink, None).await.unwrap_err();
    assert!(began.elapsed() < Duration::from_secs(15));
    assert!(err.to_string().contains("progress sink"), "{err}");
    assert!(!err.is_retryable());
}
