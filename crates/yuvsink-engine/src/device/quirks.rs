use std::io;
use std::path::{Path, PathBuf};

/// Driver nodes whose descriptors survive context destruction on some
/// embedded GL stacks and accumulate across start/stop cycles.
pub const LEAKY_DEVICE_NODES: [&str; 3] = ["/dev/tegra_sema", "/dev/nvhost-gr2d", "/dev/nvhost-gr3d"];

/// Teardown step that closes descriptors left open on [`LEAKY_DEVICE_NODES`].
///
/// Lists a `/proc/<pid>/fd` style directory, keeps entries that are symbolic
/// links to one of the target nodes and closes the descriptor named by the
/// entry. Every failure is logged and skipped.
#[derive(Debug, Clone)]
pub struct LeakedFdSweep {
    fd_dir: PathBuf,
    targets: Vec<PathBuf>,
}

/// What a sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Directory entries inspected.
    pub scanned: usize,
    /// Descriptors closed successfully.
    pub closed: Vec<i32>,
    /// Entries that could not be inspected or closed.
    pub failed: usize,
}

impl LeakedFdSweep {
    /// Sweep of this process's descriptor table.
    pub fn for_current_process() -> Self {
        Self::with_fd_dir(format!("/proc/{}/fd", std::process::id()))
    }

    /// Sweep over an arbitrary descriptor directory.
    pub fn with_fd_dir(fd_dir: impl Into<PathBuf>) -> Self {
        Self {
            fd_dir: fd_dir.into(),
            targets: LEAKY_DEVICE_NODES.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replaces the set of link targets considered leaked.
    pub fn with_targets<I, P>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn fd_dir(&self) -> &Path {
        &self.fd_dir
    }

    /// Runs the sweep, closing matches with `close(2)`.
    pub fn run(&self) -> SweepReport {
        self.run_with(close_fd)
    }

    /// Runs the sweep with an injected close function.
    pub fn run_with<F>(&self, mut close: F) -> SweepReport
    where
        F: FnMut(i32) -> io::Result<()>,
    {
        let mut report = SweepReport::default();

        log::debug!("checking for leaked driver descriptors in {}", self.fd_dir.display());

        let entries = match std::fs::read_dir(&self.fd_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("could not list {}: {e}", self.fd_dir.display());
                report.failed += 1;
                return report;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::error!("could not read descriptor entry: {e}");
                    report.failed += 1;
                    continue;
                }
            };
            report.scanned += 1;

            let path = entry.path();
            let Some(fd) = self.leaked_fd(&path, &mut report) else { continue };

            log::debug!("closing leaked descriptor {fd}");
            match close(fd) {
                Ok(()) => report.closed.push(fd),
                Err(e) => {
                    log::error!("could not close descriptor {fd}: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Returns the descriptor number if `path` is a link to a target node.
    fn leaked_fd(&self, path: &Path, report: &mut SweepReport) -> Option<i32> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                log::error!("could not get file info for {}: {e}", path.display());
                report.failed += 1;
                return None;
            }
        };

        if !meta.file_type().is_symlink() {
            return None;
        }

        let target = match std::fs::read_link(path) {
            Ok(target) => target,
            Err(e) => {
                log::error!("could not resolve {}: {e}", path.display());
                report.failed += 1;
                return None;
            }
        };

        if !self.targets.iter().any(|t| *t == target) {
            return None;
        }

        let fd = path.file_name()?.to_str()?.parse::<i32>().ok()?;
        (fd > 0).then_some(fd)
    }
}

#[cfg(unix)]
fn close_fd(fd: i32) -> io::Result<()> {
    // SAFETY: `fd` names a descriptor from our own table that points at a
    // driver node nothing in this process still uses.
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn close_fd(_fd: i32) -> io::Result<()> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();

        symlink("/dev/nvhost-gr3d", p.join("7")).unwrap();
        symlink("/dev/tegra_sema", p.join("12")).unwrap();
        symlink("/dev/null", p.join("3")).unwrap();
        symlink("/dev/nvhost-gr2d", p.join("0")).unwrap();
        symlink("/dev/nvhost-gr2d", p.join("gr2d")).unwrap();
        std::fs::write(p.join("9"), b"not a link").unwrap();

        dir
    }

    #[test]
    fn closes_only_links_to_driver_nodes() {
        let dir = fixture();
        let mut closed = Vec::new();

        let report = LeakedFdSweep::with_fd_dir(dir.path()).run_with(|fd| {
            closed.push(fd);
            Ok(())
        });

        closed.sort_unstable();
        assert_eq!(closed, vec![7, 12]);
        assert_eq!(report.scanned, 6);
        assert_eq!(report.failed, 0);

        let mut reported = report.closed.clone();
        reported.sort_unstable();
        assert_eq!(reported, vec![7, 12]);
    }

    #[test]
    fn close_failures_are_counted_not_fatal() {
        let dir = fixture();

        let report = LeakedFdSweep::with_fd_dir(dir.path())
            .run_with(|fd| if fd == 7 { Err(io::Error::from_raw_os_error(libc::EBADF)) } else { Ok(()) });

        assert_eq!(report.closed, vec![12]);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn missing_directory_is_logged_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let report = LeakedFdSweep::with_fd_dir(dir.path().join("absent")).run_with(|_| {
            panic!("nothing should be closed");
        });

        assert_eq!(report.scanned, 0);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn custom_targets_replace_defaults() {
        let dir = fixture();
        let mut closed = Vec::new();

        LeakedFdSweep::with_fd_dir(dir.path())
            .with_targets(["/dev/null"])
            .run_with(|fd| {
                closed.push(fd);
                Ok(())
            });

        assert_eq!(closed, vec![3]);
    }

    #[test]
    fn current_process_points_at_proc() {
        let sweep = LeakedFdSweep::for_current_process();
        assert_eq!(sweep.fd_dir(), Path::new(&format!("/proc/{}/fd", std::process::id())));
    }
}
