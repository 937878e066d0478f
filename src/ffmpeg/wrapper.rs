use super::backend::FfmpegBackend;
use super::commands::{build_trim_args, TrimMode};
use super::progress::{parse_progress_event, progress_fraction, TaskProgress};
use crate::timeline::TimeRange;
use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Cuts trim ranges out of media files with the ffmpeg CLI
#[derive(Clone)]
pub struct Transcoder {
    backend: Arc<FfmpegBackend>,
}

impl Transcoder {
    pub fn new(backend: Arc<FfmpegBackend>) -> Self {
        Self { backend }
    }

    /// Write `range` of `input` to `output`, reporting into `progress`.
    pub async fn trim(
        &self,
        input: &Path,
        output: &Path,
        range: TimeRange,
        mode: TrimMode,
        progress: Arc<Mutex<TaskProgress>>,
    ) -> Result<()> {
        if range.span() <= 0.0 {
            bail!("empty trim range");
        }
        let args = build_trim_args(input, output, range, mode);
        log::info!(
            "export {} [{:.3}-{:.3}] {:?} -> {}",
            input.display(),
            range.start,
            range.end,
            mode,
            output.display()
        );
        self.execute_ffmpeg(&args, range.span(), progress).await
    }

    /// Run ffmpeg, following `-progress pipe:1` output on stdout
    async fn execute_ffmpeg(
        &self,
        args: &[String],
        expected_duration: f64,
        progress: Arc<Mutex<TaskProgress>>,
    ) -> Result<()> {
        let mut child = Command::new(self.backend.ffmpeg())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| anyhow!("Failed to capture stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| anyhow!("Failed to capture stderr"))?;

        // Drain stderr alongside stdout so neither pipe fills up
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: Vec<String> = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    log::warn!("ffmpeg: {}", line);
                }
                tail.push(line);
                if tail.len() > 20 {
                    tail.remove(0);
                }
            }
            tail
        });

        let mut reader = BufReader::new(stdout).lines();
        while let Some(line) = reader.next_line().await? {
            let Some(event) = parse_progress_event(&line) else {
                continue;
            };
            if let Some(fraction) = progress_fraction(event, expected_duration) {
                let mut progress = progress.lock();
                progress.advance(fraction);
                log::trace!("{}", progress.status_text());
            }
        }

        let status = child.wait().await?;
        let tail = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            let reason = tail.last().cloned().unwrap_or_else(|| status.to_string());
            Err(anyhow!("FFmpeg failed: {}", reason))
        }
    }
}
