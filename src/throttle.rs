// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client-side throttle with durable state.
//!
//! Used when no server-side limiter sits in front of the caller. Windows are
//! kept in a JSON file so counts survive restarts. Storage problems never
//! reach the caller: unreadable or malformed records count as "no prior
//! record", and a throttle without storage allows everything.
//!
//! Several processes may share one state file. Each read-modify-write holds
//! an exclusive advisory lock on a sibling `.lock` file, and the state file
//! is replaced by rename so readers never see a partial write.

use crate::config::ThrottleConfig;
use crate::limiter::{FixedWindowLimiter, RateLimitResult, WindowState, WindowStore};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "rate_limit_";

/// Window state persisted as one JSON object, one record per key.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock: Mutex<()>,
}

/// Held for the duration of one read-modify-write. Closing the lock file
/// releases the advisory lock.
struct StateLock<'a> {
    _local: MutexGuard<'a, ()>,
    _file: Option<File>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_path),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record for `key`, if it is present and well formed.
    pub fn load(&self, key: &str) -> Option<WindowState> {
        let _lock = self.exclusive();
        read_record(&self.read_all(), key)
    }

    /// Lock out other threads, then other processes. If the lock file cannot
    /// be opened the update proceeds under the in-process lock alone.
    fn exclusive(&self) -> StateLock<'_> {
        let local = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .and_then(|file| file.lock_exclusive().map(|()| file));
        let file = match file {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(path = %self.lock_path.display(), error = %err, "Throttle lock unavailable");
                None
            }
        };
        StateLock {
            _local: local,
            _file: file,
        }
    }

    fn read_all(&self) -> Map<String, Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %err, "Throttle state unreadable");
                }
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "Throttle state malformed, starting fresh");
                Map::new()
            }
        }
    }

    fn store_all(&self, records: &Map<String, Value>) {
        if let Err(err) = self.replace_file(records) {
            warn!(path = %self.path.display(), error = %err, "Failed to persist throttle state");
        }
    }

    /// Write to a temporary sibling, then rename it over the state file.
    fn replace_file(&self, records: &Map<String, Value>) -> io::Result<()> {
        let bytes = serde_json::to_vec(records)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path)?;
        Ok(())
    }
}

fn storage_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

fn read_record(records: &Map<String, Value>, key: &str) -> Option<WindowState> {
    let value = records.get(&storage_key(key))?;
    match serde_json::from_value::<WindowState>(value.clone()) {
        Ok(state) => Some(state),
        Err(err) => {
            debug!(key, error = %err, "Ignoring malformed throttle record");
            None
        }
    }
}

impl WindowStore for FileStore {
    fn update<R, F>(&self, key: &str, f: F) -> R
    where
        F: FnOnce(Option<WindowState>) -> (Option<WindowState>, R),
    {
        let _lock = self.exclusive();
        let mut records = self.read_all();
        let (next, out) = f(read_record(&records, key));
        if let Some(state) = next {
            match serde_json::to_value(state) {
                Ok(value) => {
                    records.insert(storage_key(key), value);
                    self.store_all(&records);
                }
                Err(err) => warn!(key, error = %err, "Failed to encode throttle record"),
            }
        }
        out
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let _lock = self.exclusive();
        let mut records = self.read_all();
        let before = records.len();
        records.retain(|name, value| {
            !name.starts_with(KEY_PREFIX)
                || serde_json::from_value::<WindowState>(value.clone())
                    .map(|state| !state.is_expired(now))
                    .unwrap_or(false)
        });
        let purged = before - records.len();
        if purged > 0 {
            self.store_all(&records);
        }
        purged
    }
}

/// Fixed-window throttle for callers without a server-side limiter.
pub struct ClientThrottle {
    limiter: Option<FixedWindowLimiter<FileStore>>,
    max_requests: u32,
    window: Duration,
}

impl ClientThrottle {
    /// Build from configuration. Without a usable state path the throttle
    /// fails open.
    pub fn new(config: &ThrottleConfig) -> Self {
        let store = config.state_path.as_ref().and_then(|path| {
            let parent_ok = path
                .parent()
                .map(|dir| dir.as_os_str().is_empty() || dir.is_dir())
                .unwrap_or(true);
            if parent_ok {
                Some(FileStore::new(path.clone()))
            } else {
                warn!(path = %path.display(), "Throttle state directory missing, throttle disabled");
                None
            }
        });
        Self {
            limiter: store.map(FixedWindowLimiter::new),
            max_requests: config.max_requests,
            window: config.window_duration(),
        }
    }

    /// A throttle with no durable storage: every call is allowed.
    pub fn unavailable(config: &ThrottleConfig) -> Self {
        Self {
            limiter: None,
            max_requests: config.max_requests,
            window: config.window_duration(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.limiter.is_some()
    }

    /// Check the configured limit for `key`.
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Utc::now())
    }

    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        match &self.limiter {
            Some(limiter) => limiter.check_at(key, self.max_requests, self.window, now),
            None => RateLimitResult::Allowed {
                remaining: self.max_requests,
                reset_in: Duration::ZERO,
            },
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.check(key).is_allowed()
    }

    pub fn allow_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.check_at(key, now).is_allowed()
    }

    /// Drop closed windows from durable state. Returns the number dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let purged = self
            .limiter
            .as_ref()
            .map_or(0, |limiter| limiter.store().purge_expired(now));
        if purged > 0 {
            debug!(purged, "Purged closed throttle windows");
        }
        purged
    }
}
