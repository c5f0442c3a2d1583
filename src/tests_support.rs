//! Helpers shared by unit tests.

use std::{
    fs,
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicUsize, Ordering},
};

/// A fresh directory under the system temp dir, removed on drop.
pub(crate) struct Scratch {
    path: PathBuf,
}

impl Scratch {
    pub(crate) fn new() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "sesamo-{}-{}",
            process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&path).unwrap();
        Scratch { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty file called `name` in the directory.
    pub(crate) fn touch(&self, name: &str) -> PathBuf {
        let file = self.path.join(name);
        fs::File::create(&file).unwrap();
        file
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// The device path of a pseudo-terminal end, as seen through `/proc`.
#[cfg(target_os = "linux")]
pub(crate) fn pty_path(fd: &std::os::unix::io::OwnedFd) -> String {
    use std::os::unix::io::AsRawFd;

    fs::read_link(format!("/proc/self/fd/{}", fd.as_raw_fd()))
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

/// How many descriptors of this process currently point at `target`.
#[cfg(target_os = "linux")]
pub(crate) fn open_handles<P: AsRef<Path>>(target: P) -> usize {
    fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|fd| fs::read_link(fd.ok()?.path()).ok())
        .filter(|link| link == target.as_ref())
        .count()
}
