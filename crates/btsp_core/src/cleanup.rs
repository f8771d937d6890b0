//! LKH work directories, removed after the run and on Ctrl-C.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use crate::Result;

static PENDING_WORK_DIRS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
static INTERRUPT_HOOK: OnceLock<()> = OnceLock::new();

fn pending() -> &'static Mutex<HashSet<PathBuf>> {
    PENDING_WORK_DIRS.get_or_init(|| Mutex::new(HashSet::new()))
}

fn install_interrupt_hook() {
    INTERRUPT_HOOK.get_or_init(|| {
        let installed = ctrlc::set_handler(|| {
            let dirs: Vec<PathBuf> = match pending().lock() {
                Ok(guard) => guard.iter().cloned().collect(),
                Err(_) => Vec::new(),
            };
            for dir in dirs {
                remove_work_dir(&dir);
            }
            std::process::exit(130);
        });
        if let Err(err) = installed {
            log::warn!("cleanup: failed to install interrupt hook err={err}");
        }
    });
}

/// Work directory that exists for the lifetime of the guard.
///
/// With `remove_on_drop` the directory goes away when the guard is dropped;
/// it is removed on Ctrl-C either way.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    remove_on_drop: bool,
}

impl WorkDir {
    pub fn create(path: &Path, remove_on_drop: bool) -> Result<Self> {
        fs::create_dir_all(path)?;
        install_interrupt_hook();
        if let Ok(mut guard) = pending().lock() {
            guard.insert(path.to_path_buf());
        }
        log::debug!("cleanup: created workdir={}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            remove_on_drop,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.remove_on_drop {
            remove_work_dir(&self.path);
        } else {
            forget(&self.path);
        }
    }
}

fn forget(path: &Path) {
    if let Some(set) = PENDING_WORK_DIRS.get()
        && let Ok(mut guard) = set.lock()
    {
        guard.remove(path);
    }
}

pub fn remove_work_dir(path: &Path) {
    if !path.exists() {
        forget(path);
        return;
    }

    match fs::remove_dir_all(path) {
        Ok(()) => {
            forget(path);
            log::debug!("cleanup: removed workdir={}", path.display());
        }
        Err(err) => log::warn!(
            "cleanup: failed to remove workdir={} err={err}",
            path.display()
        ),
    }
}
