// SPDX-License-Identifier: Apache-2.0

//! Audit Recorder
//!
//! Records the outcome of every request without ever blocking it. Each entry
//! is traced, kept in a bounded in-memory ring, and handed to a background
//! writer that appends it to a rotating JSON lines file.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{AuditConfig, AuditEvent, AuditLogEntry};

/// Maximum entries to keep in memory for fast access
const MEMORY_CACHE_SIZE: usize = 1000;

const AUDIT_FILE_NAME: &str = "audit.jsonl";

/// Append-only JSON lines file with size-bounded rotation
pub struct JsonlAuditSink {
    log_path: PathBuf,
    max_entries: usize,
    line_count: usize,
}

impl JsonlAuditSink {
    pub fn open(data_dir: &Path, max_entries: usize) -> std::io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let log_path = data_dir.join(AUDIT_FILE_NAME);

        let line_count = match File::open(&log_path) {
            Ok(file) => BufReader::new(file).lines().count(),
            Err(_) => 0,
        };

        debug!("Opened audit log {:?} with {} entries", log_path, line_count);

        Ok(Self {
            log_path,
            max_entries: max_entries.max(1),
            line_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Append entry to log file, rotating if it grew past `max_entries`
    pub fn append(&mut self, entry: &AuditLogEntry) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entry)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        self.line_count += 1;

        if self.line_count > self.max_entries {
            // Keep only the newest three quarters
            let keep = (self.max_entries * 3 / 4).max(1);
            let removed = self.rotate_file(keep)?;
            info!("Rotated audit log, removed {} old entries", removed);
        }

        Ok(())
    }

    /// Rotate the log file, keeping only the last N entries
    fn rotate_file(&mut self, keep_count: usize) -> std::io::Result<usize> {
        let file = File::open(&self.log_path)?;
        let reader = BufReader::new(file);
        let lines: Vec<String> = reader.lines().filter_map(|l| l.ok()).collect();

        let total = lines.len();
        if total <= keep_count {
            self.line_count = total;
            return Ok(0);
        }

        let skip = total - keep_count;

        // Write to temp file then rename
        let temp_path = self.log_path.with_extension("jsonl.tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            for line in lines.iter().skip(skip) {
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.log_path)?;
        self.line_count = keep_count;

        Ok(skip)
    }
}

/// Non-blocking audit recorder shared by all requests
pub struct AuditRecorder {
    /// In-memory cache of recent entries
    recent: RwLock<VecDeque<AuditLogEntry>>,
    /// Channel to the background file writer, if any
    sender: Mutex<Option<mpsc::UnboundedSender<AuditLogEntry>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl AuditRecorder {
    /// Recorder that only traces and keeps recent entries in memory.
    pub fn in_memory() -> Self {
        Self {
            recent: RwLock::new(VecDeque::with_capacity(MEMORY_CACHE_SIZE)),
            sender: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    /// Recorder with a background writer appending to `sink`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_sink(sink: JsonlAuditSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::task::spawn_blocking(move || write_loop(sink, rx));

        Self {
            recent: RwLock::new(VecDeque::with_capacity(MEMORY_CACHE_SIZE)),
            sender: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(handle)),
        }
    }

    /// Builds the recorder described by `config`.
    pub fn from_config(config: &AuditConfig) -> std::io::Result<Self> {
        match (&config.directory, config.enabled) {
            (Some(dir), true) => {
                let sink = JsonlAuditSink::open(dir, config.max_entries)?;
                info!("Audit log at {:?}", sink.path());
                Ok(Self::with_sink(sink))
            }
            _ => Ok(Self::in_memory()),
        }
    }

    /// Records an entry. Never blocks on I/O.
    pub fn record(&self, entry: AuditLogEntry) {
        trace_entry(&entry);

        {
            let mut recent = self.recent.write();
            if recent.len() >= MEMORY_CACHE_SIZE {
                recent.pop_front();
            }
            recent.push_back(entry.clone());
        }

        if let Some(sender) = self.sender.lock().as_ref() {
            if sender.send(entry).is_err() {
                warn!("Audit writer has stopped; entry kept in memory only");
            }
        }
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditLogEntry> {
        self.recent.read().iter().rev().take(limit).cloned().collect()
    }

    /// Stops accepting file writes and waits for queued entries to be flushed.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let handle = self.writer.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Audit writer terminated abnormally: {}", e);
            }
        }
    }
}

fn write_loop(mut sink: JsonlAuditSink, mut rx: mpsc::UnboundedReceiver<AuditLogEntry>) {
    while let Some(entry) = rx.blocking_recv() {
        if let Err(e) = sink.append(&entry) {
            error!("Failed to write audit log entry: {}", e);
        }
    }
    debug!("Audit writer drained");
}

fn trace_entry(entry: &AuditLogEntry) {
    let label = entry.label.as_deref().unwrap_or("-");
    match &entry.event {
        AuditEvent::RequestSucceeded {
            table,
            field,
            operator,
            matched,
            row_count,
            elapsed_ms,
            suspicious,
        } => info!(
            target: "audit",
            request_id = %entry.request_id,
            address = %entry.address,
            label,
            table = %table,
            field = %field,
            operator = %operator,
            matched,
            row_count,
            elapsed_ms,
            suspicious = ?suspicious,
            "assumption evaluated"
        ),
        AuditEvent::AuthenticationFailed { reason, credential } => warn!(
            target: "audit",
            request_id = %entry.request_id,
            address = %entry.address,
            reason = reason.as_str(),
            credential = %credential,
            "authentication failed"
        ),
        AuditEvent::ValidationFailed {
            message,
            suspicious,
        } => warn!(
            target: "audit",
            request_id = %entry.request_id,
            address = %entry.address,
            label,
            message = %message,
            suspicious = ?suspicious,
            "validation failed"
        ),
        AuditEvent::InternalError {
            table,
            field,
            detail,
        } => error!(
            target: "audit",
            request_id = %entry.request_id,
            address = %entry.address,
            label,
            table = ?table,
            field = ?field,
            detail = %detail,
            "internal error"
        ),
    }
}
