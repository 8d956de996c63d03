//! Progress reporting for mesh construction.
//!
//! Building a large mesh takes several passes over the index buffer. A
//! [`Progress`] handed to [`BuildOptions`](crate::mesh::BuildOptions) is told
//! which pass is running and, inside the long passes, how far along it is.
//!
//! ```
//! use hedgemesh::mesh::BuildOptions;
//! use hedgemesh::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//! let options = BuildOptions::default().with_progress(progress);
//! # let _ = options;
//! ```

/// A progress callback that receives updates during construction.
///
/// The callback receives:
/// - `current`: Current step (0-based)
/// - `total`: Total number of steps
/// - `message`: Name of the running pass
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress inside step `range_current` of `range_total`.
    ///
    /// `sub_current / sub_total` is scaled into the slice
    /// `[range_current, range_current + 1)` with three decimal digits of
    /// precision, so the reported total is `range_total * 1000`.
    #[inline]
    pub fn report_sub(
        &self,
        sub_current: usize,
        sub_total: usize,
        range_current: usize,
        range_total: usize,
        message: &str,
    ) {
        if sub_total == 0 || range_total == 0 {
            return;
        }
        let sub_fraction = (sub_current.min(sub_total) * 1000) / sub_total;
        let effective = range_current * 1000 + sub_fraction;
        (self.callback)(effective, range_total * 1000, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
