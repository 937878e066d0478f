use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Lazily created, process-wide handle.
///
/// The first successful `get_or_try_init` is memoized and shared; a failed
/// initialization leaves the slot empty so the next caller tries again.
pub struct SharedHandle<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> SharedHandle<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut slot = self.slot.lock();
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }
        let handle = Arc::new(init()?);
        *slot = Some(handle.clone());
        Ok(handle)
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Drop the memoized handle; the next caller re-initializes
    pub fn invalidate(&self) {
        self.slot.lock().take();
    }
}

impl<T> Default for SharedHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where to find the FFmpeg binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for FfmpegPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Verified FFmpeg installation shared by the probe, sampler, player and
/// transcoder.
#[derive(Debug)]
pub struct FfmpegBackend {
    paths: FfmpegPaths,
    version: String,
}

impl FfmpegBackend {
    fn initialize(paths: &FfmpegPaths) -> Result<Self> {
        let version = binary_version(&paths.ffmpeg)
            .with_context(|| format!("ffmpeg not usable at {}", paths.ffmpeg.display()))?;
        binary_version(&paths.ffprobe)
            .with_context(|| format!("ffprobe not usable at {}", paths.ffprobe.display()))?;
        log::info!("Using {}", version);
        Ok(Self {
            paths: paths.clone(),
            version,
        })
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.paths.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.paths.ffprobe
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

static BACKEND: SharedHandle<FfmpegBackend> = SharedHandle::new();

/// Shared backend, verifying the binaries on first use.
///
/// `paths` only matters for the call that performs the initialization.
pub fn acquire(paths: &FfmpegPaths) -> Result<Arc<FfmpegBackend>> {
    BACKEND.get_or_try_init(|| FfmpegBackend::initialize(paths))
}

/// Forget the shared backend, e.g. after the configured paths changed
pub fn release() {
    if BACKEND.is_initialized() {
        log::info!("Releasing FFmpeg backend");
    }
    BACKEND.invalidate();
}

fn binary_version(binary: &Path) -> Result<String> {
    let output = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(anyhow!("exited with status {}", output.status));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_failed_init_is_retried() {
        let handle: SharedHandle<u32> = SharedHandle::new();
        let attempts = Cell::new(0);

        let first = handle.get_or_try_init(|| {
            attempts.set(attempts.get() + 1);
            Err(anyhow!("not yet"))
        });
        assert!(first.is_err());
        assert!(!handle.is_initialized());

        let second = handle
            .get_or_try_init(|| {
                attempts.set(attempts.get() + 1);
                Ok(7)
            })
            .unwrap();
        assert_eq!(*second, 7);
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_success_is_memoized() {
        let handle: SharedHandle<String> = SharedHandle::new();
        let a = handle.get_or_try_init(|| Ok("first".to_string())).unwrap();
        let b = handle
            .get_or_try_init(|| panic!("must not initialize twice"))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        handle.invalidate();
        let c = handle.get_or_try_init(|| Ok("second".to_string())).unwrap();
        assert_eq!(c.as_str(), "second");
    }

    #[test]
    fn test_missing_binary_fails() {
        let paths = FfmpegPaths {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg-binary"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe-binary"),
        };
        assert!(FfmpegBackend::initialize(&paths).is_err());
    }
}
