use crate::ffmpeg::{TaskProgress, TrimMode};
use crate::timeline::TimeRange;
use crate::utils::format_time;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed(String),
}

/// One trimmed export of the current media
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub id: u32,
    pub input: PathBuf,
    pub output: PathBuf,
    pub range: TimeRange,
    pub mode: TrimMode,
    pub status: JobStatus,
    pub progress: Arc<Mutex<TaskProgress>>,
}

impl ExportJob {
    pub fn new(id: u32, input: PathBuf, output: PathBuf, range: TimeRange, mode: TrimMode) -> Self {
        Self {
            id,
            input,
            output,
            range,
            mode,
            status: JobStatus::Pending,
            progress: Arc::new(Mutex::new(TaskProgress::new("Export"))),
        }
    }

    pub fn description(&self) -> String {
        format!(
            "{} [{} - {}] -> {} ({})",
            self.input.file_name().unwrap_or_default().to_string_lossy(),
            format_time(self.range.start),
            format_time(self.range.end),
            self.output.file_name().unwrap_or_default().to_string_lossy(),
            self.mode.name()
        )
    }

    pub fn fraction(&self) -> f32 {
        match self.status {
            JobStatus::Completed => 1.0,
            JobStatus::Running => self.progress.lock().progress,
            _ => 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed(_))
    }
}

/// Exports run one at a time, in the order they were queued
#[derive(Default)]
pub struct ExportQueue {
    pub jobs: Vec<ExportJob>,
    next_id: u32,
    pub is_processing: bool,
}

impl ExportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, input: PathBuf, output: PathBuf, range: TimeRange, mode: TrimMode) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(ExportJob::new(id, input, output, range, mode));
        id
    }

    /// Mark the next pending job running and return a copy of it
    pub fn start_next(&mut self) -> Option<ExportJob> {
        if self.is_processing {
            return None;
        }
        let job = self.jobs.iter_mut().find(|j| j.status == JobStatus::Pending)?;
        job.status = JobStatus::Running;
        self.is_processing = true;
        Some(job.clone())
    }

    /// Record the outcome of the running job
    pub fn finish(&mut self, id: u32, result: Result<(), String>) {
        if let Some(job) = self.get_job_mut(id) {
            job.status = match result {
                Ok(()) => JobStatus::Completed,
                Err(e) => JobStatus::Failed(e),
            };
        }
        self.is_processing = false;
    }

    pub fn get_job(&self, id: u32) -> Option<&ExportJob> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_job_mut(&mut self, id: u32) -> Option<&mut ExportJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Pending jobs are dropped; a running export finishes on its own
    pub fn cancel_pending(&mut self) {
        for job in &mut self.jobs {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Failed("Cancelled".to_string());
            }
        }
    }

    pub fn clear_finished(&mut self) {
        self.jobs.retain(|j| !j.is_finished());
    }

    pub fn has_pending(&self) -> bool {
        self.jobs.iter().any(|j| j.status == JobStatus::Pending)
    }

    pub fn is_busy(&self) -> bool {
        self.is_processing || self.has_pending()
    }

    /// (finished, total)
    pub fn total_progress(&self) -> (usize, usize) {
        let finished = self.jobs.iter().filter(|j| j.is_finished()).count();
        (finished, self.jobs.len())
    }

    /// Status line for the queue, `None` when empty
    pub fn status_message(&self) -> Option<String> {
        let (finished, total) = self.total_progress();
        if total == 0 {
            return None;
        }
        if finished < total {
            return Some(format!("Exporting... {}/{}", finished, total));
        }
        let failed: Vec<&str> = self
            .jobs
            .iter()
            .filter_map(|j| match &j.status {
                JobStatus::Failed(e) => Some(e.as_str()),
                _ => None,
            })
            .collect();
        Some(match failed.first() {
            Some(first) => format!(
                "Export: {} OK, {} failed - {}",
                total - failed.len(),
                failed.len(),
                first
            ),
            None => format!("Export complete! ({}/{})", total, total),
        })
    }
}

pub type SharedQueue = Arc<Mutex<ExportQueue>>;

pub fn create_shared_queue() -> SharedQueue {
    Arc::new(Mutex::new(ExportQueue::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(n: usize) -> ExportQueue {
        let mut queue = ExportQueue::new();
        for i in 0..n {
            queue.add(
                PathBuf::from("in.mp4"),
                PathBuf::from(format!("out{}.mp4", i)),
                TimeRange::new(1.0, 3.0),
                TrimMode::Lossless,
            );
        }
        queue
    }

    #[test]
    fn test_jobs_run_one_at_a_time() {
        let mut queue = queue_with(2);
        let first = queue.start_next().unwrap();
        assert_eq!(first.id, 0);
        assert!(queue.start_next().is_none());

        queue.finish(first.id, Ok(()));
        let second = queue.start_next().unwrap();
        assert_eq!(second.id, 1);
        assert_eq!(queue.get_job(0).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_status_message() {
        let mut queue = queue_with(2);
        assert_eq!(queue.status_message().as_deref(), Some("Exporting... 0/2"));

        let job = queue.start_next().unwrap();
        queue.finish(job.id, Err("disk full".to_string()));
        let job = queue.start_next().unwrap();
        queue.finish(job.id, Ok(()));
        assert_eq!(
            queue.status_message().as_deref(),
            Some("Export: 1 OK, 1 failed - disk full")
        );

        queue.clear_finished();
        assert!(queue.status_message().is_none());
    }

    #[test]
    fn test_cancel_pending_keeps_running_job() {
        let mut queue = queue_with(3);
        let running = queue.start_next().unwrap();
        queue.cancel_pending();
        assert_eq!(queue.get_job(running.id).unwrap().status, JobStatus::Running);
        assert!(!queue.has_pending());
        assert!(queue.is_busy());
    }

    #[test]
    fn test_description_mentions_range() {
        let queue = queue_with(1);
        let text = queue.jobs[0].description();
        assert!(text.starts_with("in.mp4 [00:01.000 - 00:03.000]"), "{}", text);
    }
}
