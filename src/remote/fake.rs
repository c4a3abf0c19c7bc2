//! Scripted in-memory device service for tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, ReadBuf};

use super::{Primitive, RemoteError, RemoteService, RemoteStream};
use crate::cancel::StopToken;

/// Yields its bytes, then fails every further read.
struct BreakingReader {
    data: Vec<u8>,
    pos: usize,
}

impl AsyncRead for BreakingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pos >= self.data.len() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "stream reset",
            )));
        }
        let n = buf.remaining().min(self.data.len() - self.pos);
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { data: Vec<u8>, mtime: i64 },
}

/// In-memory tree with per-primitive failure injection.
///
/// Entries keep insertion order so listings are deterministic.
pub struct FakeService {
    nodes: Vec<(String, Node)>,
    advertised: Vec<Primitive>,
    failing: HashSet<(Primitive, String)>,
    broken_paths: HashSet<String>,
    stat_failures: HashSet<String>,
    exists_failures: HashSet<String>,
    breaking_streams: HashMap<String, usize>,
    stop_during_copy: Option<StopToken>,
    calls: Mutex<HashMap<&'static str, usize>>,
    reads: AtomicUsize,
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

impl FakeService {
    /// Empty tree advertising every primitive.
    pub fn new() -> Self {
        Self {
            nodes: vec![("/".to_string(), Node::Dir)],
            advertised: Primitive::ALL.to_vec(),
            failing: HashSet::new(),
            broken_paths: HashSet::new(),
            stat_failures: HashSet::new(),
            exists_failures: HashSet::new(),
            breaking_streams: HashMap::new(),
            stop_during_copy: None,
            calls: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Restricts the advertised primitives.
    pub fn advertising(mut self, primitives: &[Primitive]) -> Self {
        self.advertised = primitives.to_vec();
        self
    }

    fn has(&self, path: &str) -> bool {
        self.nodes.iter().any(|(p, _)| p == path)
    }

    fn ensure_dir(&mut self, path: &str) {
        if path.is_empty() || self.has(path) {
            return;
        }
        self.ensure_dir(&parent_of(path).to_string());
        self.nodes.push((path.to_string(), Node::Dir));
    }

    /// Adds a directory and any missing parents.
    pub fn dir(mut self, path: &str) -> Self {
        self.ensure_dir(path);
        self
    }

    /// Adds a file and any missing parents.
    pub fn file(self, path: &str, data: &[u8]) -> Self {
        self.file_with_mtime(path, data, 1_700_000_000)
    }

    /// Adds a file with an explicit modification time (epoch seconds).
    pub fn file_with_mtime(mut self, path: &str, data: &[u8], mtime: i64) -> Self {
        self.ensure_dir(&parent_of(path).to_string());
        self.nodes.push((
            path.to_string(),
            Node::File {
                data: data.to_vec(),
                mtime,
            },
        ));
        self
    }

    /// Makes one primitive fail for one path.
    pub fn failing(mut self, primitive: Primitive, path: &str) -> Self {
        self.failing.insert((primitive, path.to_string()));
        self
    }

    /// Makes every read primitive fail for a path.
    pub fn unreadable(mut self, path: &str) -> Self {
        self.broken_paths.insert(path.to_string());
        self
    }

    /// Makes `stat` fail for a path.
    pub fn stat_fails(mut self, path: &str) -> Self {
        self.stat_failures.insert(path.to_string());
        self
    }

    /// Makes `exists` fail for a path.
    pub fn exists_fails(mut self, path: &str) -> Self {
        self.exists_failures.insert(path.to_string());
        self
    }

    /// Makes opened streams of a path fail after `after` bytes.
    pub fn breaking_stream(mut self, path: &str, after: usize) -> Self {
        self.breaking_streams.insert(path.to_string(), after);
        self
    }

    /// Signals `stop` while a copy-out is in progress.
    pub fn stopping_during_copy(mut self, stop: StopToken) -> Self {
        self.stop_during_copy = Some(stop);
        self
    }

    /// Number of calls made to a trait method.
    pub fn calls(&self, method: &'static str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Total number of read-family calls (open, bulk read, copy-out).
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
    }

    fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|(p, _)| p == path).map(|(_, n)| n)
    }

    fn check(&self, primitive: Primitive, path: &str) -> Result<(), RemoteError> {
        if !self.advertised.contains(&primitive) {
            return Err(RemoteError::Unsupported(primitive));
        }
        if self.failing.contains(&(primitive, path.to_string())) {
            return Err(RemoteError::Protocol(format!("{primitive} failed on {path}")));
        }
        Ok(())
    }

    fn file_data(&self, primitive: Primitive, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.check(primitive, path)?;
        if self.broken_paths.contains(path) {
            return Err(RemoteError::Protocol(format!("read error on {path}")));
        }
        match self.node(path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Dir) => Err(RemoteError::Protocol(format!("{path} is a directory"))),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }

    fn children(&self, path: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(p, _)| p != "/" && parent_of(p) == path)
            .map(|(p, _)| super::remote_basename(p).to_string())
            .collect()
    }
}

#[async_trait]
impl RemoteService for FakeService {
    fn advertised(&self) -> Vec<Primitive> {
        self.advertised.clone()
    }

    async fn exists(&self, path: &str) -> Result<bool, RemoteError> {
        self.record("exists");
        if self.exists_failures.contains(path) {
            return Err(RemoteError::Protocol(format!("exists failed on {path}")));
        }
        Ok(self.has(path))
    }

    async fn is_dir(&self, path: &str) -> Result<bool, RemoteError> {
        self.record("is_dir");
        if self.broken_paths.contains(path) {
            return Err(RemoteError::PermissionDenied(path.to_string()));
        }
        Ok(matches!(self.node(path), Some(Node::Dir)))
    }

    async fn stat(&self, path: &str) -> Result<Value, RemoteError> {
        self.record("stat");
        if self.stat_failures.contains(path) {
            return Err(RemoteError::PermissionDenied(path.to_string()));
        }
        match self.node(path) {
            Some(Node::File { data, mtime }) => Ok(json!({
                "st_size": data.len(),
                "st_mtime": mtime,
                "st_birthtime": mtime,
            })),
            Some(Node::Dir) => Ok(json!({ "st_size": 0 })),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }

    async fn enumerate(&self, primitive: Primitive, path: &str) -> Result<Option<Value>, RemoteError> {
        self.record("enumerate");
        self.check(primitive, path)?;
        let names = self.children(path);
        Ok(Some(match primitive {
            // each primitive answers in a different shape
            Primitive::Ls => json!({
                "entries": names.iter().map(|n| json!({ "name": n })).collect::<Vec<_>>()
            }),
            Primitive::ListDirectory => {
                Value::from(names.iter().map(|n| json!({ "filename": n })).collect::<Vec<_>>())
            }
            _ => {
                let mut raw = vec![json!("."), json!("..")];
                raw.extend(names.into_iter().map(Value::from));
                Value::from(raw)
            }
        }))
    }

    async fn open(&self, primitive: Primitive, path: &str) -> Result<RemoteStream, RemoteError> {
        self.record("open");
        let data = self.file_data(primitive, path)?;
        if let Some(&after) = self.breaking_streams.get(path) {
            let data = data[..after.min(data.len())].to_vec();
            return Ok(Box::new(BreakingReader { data, pos: 0 }));
        }
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn read_all(&self, primitive: Primitive, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.record("read_all");
        self.file_data(primitive, path)
    }

    async fn copy_out(
        &self,
        primitive: Primitive,
        path: &str,
        local: &Path,
    ) -> Result<(), RemoteError> {
        self.record("copy_out");
        let data = self.file_data(primitive, path)?;
        tokio::fs::write(local, data).await?;
        if let Some(stop) = &self.stop_during_copy {
            stop.signal_stop();
        }
        Ok(())
    }
}
