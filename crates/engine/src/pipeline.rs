//! Conversion jobs: an authorized conversion runs as a spawned tokio
//! task that reports monotonic progress over a channel and can be
//! cancelled at any point.
//!
//! The actual byte transformation sits behind the [`Transcoder`] trait.
//! The only implementation shipped here is [`PassthroughTranscoder`],
//! which rewraps the source bytes under the target name and MIME type
//! without re-encoding anything; real codecs plug in through
//! [`crate::Engine::with_transcoder`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{info, warn};

use crate::classify::extension_of;
use crate::error::EngineError;
use crate::registry::TypeRegistry;

/// Interval between simulated progress ticks.
const PROGRESS_TICK: Duration = Duration::from_millis(20);
/// Progress increment per tick.
const PROGRESS_STEP: u8 = 10;
/// Hard bound on the transcode step. A transcoder that exceeds it fails
/// the job instead of hanging it.
const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Performs the byte-level transformation for one conversion.
///
/// Implementations must be pure with respect to the job: no partial
/// output on error, no retained state between calls.
pub trait Transcoder: Send + Sync {
    fn transcode(
        &self,
        bytes: &[u8],
        source_extension: &str,
        target_extension: &str,
    ) -> anyhow::Result<Vec<u8>>;

    /// Short label for logs and reports, e.g. `"passthrough"`.
    fn name(&self) -> &'static str;
}

/// Copies the source bytes verbatim. No decoding or encoding happens;
/// only the artifact's name and MIME type change.
pub struct PassthroughTranscoder;

impl Transcoder for PassthroughTranscoder {
    fn transcode(&self, bytes: &[u8], _source: &str, _target: &str) -> anyhow::Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Job lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// The file a job consumes. The job owns its buffer exclusively until
/// it resolves.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub declared_mime: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful conversion.
#[derive(Clone, Debug)]
pub struct Artifact {
    /// Source filename with its trailing `.<ext>` replaced by the
    /// target extension.
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub original_size: u64,
    pub converted_size: u64,
}

impl Artifact {
    /// Size change as a percentage of the original (positive when the
    /// artifact shrank), matching the ratio shown to users.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.original_size as f64 - self.converted_size as f64) / self.original_size as f64
            * 100.0
    }
}

type StateHandle = Arc<Mutex<JobState>>;

/// Handle to a running conversion job.
///
/// Dropping the handle detaches the job; call [`JobHandle::cancel`] to
/// stop it. After `cancel`, no further progress values and no result
/// are delivered, even if the task had already finished.
#[derive(Debug)]
pub struct JobHandle {
    cancelled: Arc<AtomicBool>,
    state: StateHandle,
    progress: mpsc::Receiver<u8>,
    task: JoinHandle<Result<Artifact, EngineError>>,
}

impl JobHandle {
    /// Next progress value, or `None` once the job has resolved.
    /// Values are non-decreasing in `[0, 100]`.
    pub async fn recv_progress(&mut self) -> Option<u8> {
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        self.progress.recv().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        *self.state.lock().expect("job state lock poisoned")
    }

    /// Cancel the job. Idempotent. In-flight timers and sends are
    /// invalidated: nothing observable escapes the job afterwards.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        *self.state.lock().expect("job state lock poisoned") = JobState::Cancelled;
        self.task.abort();
    }

    /// Wait for the job to resolve.
    pub async fn wait(mut self) -> Result<Artifact, EngineError> {
        let result = match (&mut self.task).await {
            Ok(result) => result,
            Err(join_err) if join_err.is_cancelled() => Err(EngineError::Cancelled),
            Err(join_err) => {
                Err(EngineError::PipelineFailure(anyhow!("conversion task panicked: {join_err}")))
            }
        };
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        result
    }
}

/// Spawn a conversion job. The caller (the engine facade) has already
/// authorized the pair.
pub(crate) fn spawn(
    registry: Arc<TypeRegistry>,
    transcoder: Arc<dyn Transcoder>,
    source: SourceFile,
    target_extension: String,
) -> JobHandle {
    let (tx, rx) = mpsc::channel(16);
    let cancelled = Arc::new(AtomicBool::new(false));
    let state: StateHandle = Arc::new(Mutex::new(JobState::Pending));

    let task = tokio::spawn(run_job(
        registry,
        transcoder,
        source,
        target_extension,
        ProgressGate { tx, cancelled: cancelled.clone(), last: 0 },
        state.clone(),
    ));

    JobHandle { cancelled, state, progress: rx, task }
}

async fn run_job(
    registry: Arc<TypeRegistry>,
    transcoder: Arc<dyn Transcoder>,
    source: SourceFile,
    target_extension: String,
    mut gate: ProgressGate,
    state: StateHandle,
) -> Result<Artifact, EngineError> {
    set_state(&state, JobState::Running);
    info!(file = %source.name, target = %target_extension, transcoder = transcoder.name(), "conversion job running");

    let result = run_steps(&registry, &transcoder, source, &target_extension, &mut gate).await;

    let final_state = match &result {
        Ok(_) => JobState::Succeeded,
        Err(EngineError::Cancelled) => JobState::Cancelled,
        Err(err) => {
            warn!(target = %target_extension, error = %err, "conversion job failed");
            JobState::Failed
        }
    };
    // State must be written before the gate (and its sender) drops, so
    // a receiver that observes the closed channel also sees the final
    // state.
    set_state(&state, final_state);
    drop(gate);
    result
}

async fn run_steps(
    registry: &TypeRegistry,
    transcoder: &Arc<dyn Transcoder>,
    source: SourceFile,
    target_extension: &str,
    gate: &mut ProgressGate,
) -> Result<Artifact, EngineError> {
    gate.send(0).await?;
    let mut pct = PROGRESS_STEP;
    while pct < 100 {
        time::sleep(PROGRESS_TICK).await;
        gate.send(pct).await?;
        pct = pct.saturating_add(PROGRESS_STEP);
    }

    let source_extension = extension_of(&source.name);
    let original_size = source.bytes.len() as u64;
    let file_name = rename_with_target(&source.name, &source_extension, target_extension);
    let mime_type = registry.mime_for(target_extension).to_string();

    let converted = {
        let transcoder = transcoder.clone();
        let target = target_extension.to_string();
        let bytes = source.bytes;
        let work =
            tokio::task::spawn_blocking(move || transcoder.transcode(&bytes, &source_extension, &target));
        time::timeout(TRANSCODE_TIMEOUT, work)
            .await
            .map_err(|_| {
                EngineError::PipelineFailure(anyhow!(
                    "transcode exceeded {}s",
                    TRANSCODE_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| EngineError::PipelineFailure(anyhow!("transcode task failed: {e}")))?
            .map_err(EngineError::PipelineFailure)?
    };

    let artifact = Artifact {
        file_name,
        mime_type,
        original_size,
        converted_size: converted.len() as u64,
        bytes: converted,
    };
    gate.send(100).await?;
    info!(file = %artifact.file_name, size = artifact.converted_size, "conversion job succeeded");
    Ok(artifact)
}

/// Progress sender that enforces the contract: monotonically
/// non-decreasing values, and nothing at all after cancellation.
struct ProgressGate {
    tx: mpsc::Sender<u8>,
    cancelled: Arc<AtomicBool>,
    last: u8,
}

impl ProgressGate {
    async fn send(&mut self, pct: u8) -> Result<(), EngineError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        let pct = pct.min(100).max(self.last);
        self.last = pct;
        // A caller that stopped listening is not an error; the job
        // carries on and only the notification is dropped.
        let _ = self.tx.send(pct).await;
        Ok(())
    }
}

fn set_state(state: &StateHandle, value: JobState) {
    *state.lock().expect("job state lock poisoned") = value;
}

/// Replace the trailing `.<source_ext>` of `name` with
/// `.<target_ext>`, case-insensitively. Only the trailing suffix is
/// touched; a name that does not end with the source extension is
/// returned unchanged.
fn rename_with_target(name: &str, source_ext: &str, target_ext: &str) -> String {
    let suffix = format!(".{source_ext}");
    if name.len() >= suffix.len() {
        let split = name.len() - suffix.len();
        let (_, tail) = name.as_bytes().split_at(split);
        // A tail that matched the ASCII suffix is itself ASCII, so
        // `split` is a valid char boundary.
        if tail.eq_ignore_ascii_case(suffix.as_bytes()) {
            return format!("{}.{}", &name[..split], target_ext);
        }
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTranscoder;

    impl Transcoder for FailingTranscoder {
        fn transcode(&self, _: &[u8], _: &str, _: &str) -> anyhow::Result<Vec<u8>> {
            Err(anyhow!("corrupt input"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn spawn_passthrough(name: &str, bytes: &[u8], target: &str) -> JobHandle {
        spawn(
            Arc::new(TypeRegistry::builtin()),
            Arc::new(PassthroughTranscoder),
            SourceFile {
                name: name.to_string(),
                declared_mime: String::new(),
                bytes: bytes.to_vec(),
            },
            target.to_string(),
        )
    }

    // ── Renaming ───────────────────────────────────────────────────────────

    #[test]
    fn rename_replaces_trailing_extension_case_insensitively() {
        assert_eq!(rename_with_target("report.DOCX", "docx", "pdf"), "report.pdf");
        assert_eq!(rename_with_target("song.mp3", "mp3", "wav"), "song.wav");
        // Only the trailing occurrence is replaced.
        assert_eq!(rename_with_target("a.png.png", "png", "jpg"), "a.png.jpg");
    }

    #[test]
    fn rename_leaves_nonmatching_names_alone() {
        // A dotless name never carries the `.<ext>` suffix.
        assert_eq!(rename_with_target("zip", "zip", "tar"), "zip");
    }

    // ── Job behaviour ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_100() {
        let mut handle = spawn_passthrough("photo.png", &[1, 2, 3], "jpg");
        let mut seen = Vec::new();
        while let Some(pct) = handle.recv_progress().await {
            seen.push(pct);
        }
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress regressed: {seen:?}");
        assert!(seen.iter().all(|p| *p <= 100));

        let artifact = handle.wait().await.unwrap();
        assert_eq!(artifact.file_name, "photo.jpg");
    }

    #[tokio::test]
    async fn artifact_carries_rename_mime_and_sizes() {
        let payload = b"not really a docx".to_vec();
        let handle = spawn_passthrough("report.DOCX", &payload, "pdf");
        let artifact = handle.wait().await.unwrap();

        assert_eq!(artifact.file_name, "report.pdf");
        assert_eq!(artifact.mime_type, "application/pdf");
        assert_eq!(artifact.original_size, payload.len() as u64);
        assert_eq!(artifact.converted_size, payload.len() as u64);
        assert_eq!(artifact.bytes, payload);
        assert_eq!(artifact.compression_ratio(), 0.0);
    }

    #[tokio::test]
    async fn job_reaches_running_then_succeeded() {
        let mut handle = spawn_passthrough("clip.mp4", &[0u8; 64], "webm");
        // First progress value means the task is past Pending.
        let first = handle.recv_progress().await;
        assert_eq!(first, Some(0));
        assert_eq!(handle.state(), JobState::Running);

        while handle.recv_progress().await.is_some() {}
        assert_eq!(handle.state(), JobState::Succeeded);
    }

    #[tokio::test]
    async fn cancel_suppresses_progress_and_result() {
        let mut handle = spawn_passthrough("clip.mp4", &[0u8; 64], "webm");
        assert_eq!(handle.recv_progress().await, Some(0));

        handle.cancel();
        assert_eq!(handle.state(), JobState::Cancelled);
        assert_eq!(handle.recv_progress().await, None);

        match handle.wait().await {
            Err(EngineError::Cancelled) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_after_completion_still_withholds_result() {
        let handle = spawn_passthrough("photo.png", &[1], "jpg");
        // Let the job finish on its own.
        time::sleep(PROGRESS_TICK * 30).await;
        handle.cancel();
        assert!(matches!(handle.wait().await, Err(EngineError::Cancelled)));
    }

    #[tokio::test]
    async fn failing_transcoder_fails_the_job() {
        let handle = spawn(
            Arc::new(TypeRegistry::builtin()),
            Arc::new(FailingTranscoder),
            SourceFile { name: "a.png".into(), declared_mime: String::new(), bytes: vec![1] },
            "jpg".to_string(),
        );
        match handle.wait().await {
            Err(EngineError::PipelineFailure(err)) => {
                assert!(err.to_string().contains("corrupt input"));
            }
            other => panic!("expected PipelineFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn compression_ratio_handles_empty_input() {
        let handle = spawn_passthrough("empty.txt", &[], "pdf");
        let artifact = handle.wait().await.unwrap();
        assert_eq!(artifact.original_size, 0);
        assert_eq!(artifact.compression_ratio(), 0.0);
    }
}
