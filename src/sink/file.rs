//! Rotating record file sink.
//!
//! Decoding must never wait on storage, so file output is implemented as:
//! - a bounded queue (non-blocking `try_send`, newest event dropped when full)
//! - a dedicated thread with buffered writes, periodic flush, and rotation

use super::record::RecordFormat;
use super::EventSink;
use crate::codec::Event;
use crate::error::{BridgeError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::error;

#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    pub path: PathBuf,
    pub format: RecordFormat,
    pub max_bytes: u64,
    pub max_files: usize,
    pub flush_interval: Duration,
    pub channel_capacity: usize,
}

enum Message {
    Record(Event),
    Flush,
}

/// Record file sink backed by a writer thread
pub struct FileSink {
    tx: Option<SyncSender<Message>>,
    handle: Option<JoinHandle<()>>,
    dropped: u64,
}

impl FileSink {
    /// Open (append) the record file and start the writer thread
    pub fn spawn(cfg: FileSinkConfig) -> Result<Self> {
        let open_err = |e: io::Error| BridgeError::SinkOpen {
            path: cfg.path.clone(),
            source: e,
        };

        if let Some(parent) = cfg.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(open_err)?;
            }
        }

        let (file, size) = open_append(&cfg.path).map_err(open_err)?;
        let (tx, rx) = sync_channel::<Message>(cfg.channel_capacity.max(1));

        let handle = thread::Builder::new()
            .name("mw-bridge-record-writer".to_string())
            .spawn(move || run_writer(rx, cfg, file, size))
            .map_err(|e| BridgeError::SinkOpen {
                path: PathBuf::from("writer thread"),
                source: e,
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            dropped: 0,
        })
    }

    fn sender(&self) -> Result<&SyncSender<Message>> {
        self.tx.as_ref().ok_or(BridgeError::SinkClosed)
    }
}

impl EventSink for FileSink {
    fn send(&mut self, event: &Event) -> Result<()> {
        match self.sender()?.try_send(Message::Record(event.clone())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(BridgeError::SinkClosed),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.sender()?.try_send(Message::Flush) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(BridgeError::SinkClosed),
        }
    }

    /// Drains the queue and waits for the writer thread to finish
    fn close(&mut self) -> Result<()> {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn run_writer(rx: Receiver<Message>, cfg: FileSinkConfig, file: File, start_size: u64) {
    let max_bytes = cfg.max_bytes.max(1024);
    let max_files = cfg.max_files.max(1);
    let flush_interval = if cfg.flush_interval.is_zero() {
        Duration::from_millis(250)
    } else {
        cfg.flush_interval
    };

    let mut writer = BufWriter::new(file);
    let mut size = start_size;
    let mut dirty = false;
    let mut last_flush = Instant::now();

    if size == 0 {
        if let Some(header) = cfg.format.header() {
            if write_line(&mut writer, header).is_ok() {
                size = header.len() as u64 + 1;
                dirty = true;
            }
        }
    }

    loop {
        match rx.recv_timeout(flush_interval) {
            Ok(Message::Record(event)) => {
                let line = cfg.format.format(&event);
                if let Err(e) = write_line(&mut writer, &line) {
                    error!("Record write to {} failed: {}", cfg.path.display(), e);
                    break;
                }
                size = size.saturating_add(line.len() as u64 + 1);
                dirty = true;

                if size >= max_bytes {
                    let _ = writer.flush();
                    drop(writer);
                    let _ = rotate_files(&cfg.path, max_files);
                    match open_truncate(&cfg.path) {
                        Ok(f) => {
                            writer = BufWriter::new(f);
                            size = 0;
                            if let Some(header) = cfg.format.header() {
                                if write_line(&mut writer, header).is_ok() {
                                    size = header.len() as u64 + 1;
                                }
                            }
                            last_flush = Instant::now();
                        }
                        Err(e) => {
                            error!("Cannot reopen {}: {}", cfg.path.display(), e);
                            break;
                        }
                    }
                }
            }
            Ok(Message::Flush) => {
                let _ = writer.flush();
                dirty = false;
                last_flush = Instant::now();
            }
            Err(RecvTimeoutError::Timeout) => {
                if dirty && last_flush.elapsed() >= flush_interval {
                    let _ = writer.flush();
                    dirty = false;
                    last_flush = Instant::now();
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = writer.flush();
                break;
            }
        }
    }
}

fn write_line(writer: &mut BufWriter<File>, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

fn open_truncate(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

fn rotate_files(path: &Path, max_files: usize) -> io::Result<()> {
    if max_files == 0 {
        return Ok(());
    }

    let stem = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "mindwave.csv".to_string());
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    // Remove the oldest.
    let oldest = dir.join(format!("{}.{}", stem, max_files));
    let _ = fs::remove_file(&oldest);

    // Shift: N-1 -> N, ... 1 -> 2.
    for i in (1..max_files).rev() {
        let src = dir.join(format!("{}.{}", stem, i));
        let dst = dir.join(format!("{}.{}", stem, i + 1));
        if src.exists() {
            let _ = fs::rename(&src, &dst);
        }
    }

    // Active -> .1
    let first = dir.join(format!("{}.1", stem));
    if path.exists() {
        let _ = fs::rename(path, first);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Code, DataRow, Value};
    use crate::sink::record::CSV_HEADER;
    use chrono::Local;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let base = std::env::temp_dir();
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        base.join(format!("mw-bridge-records-{}-{}-{}", tag, pid, ts))
    }

    fn config(path: PathBuf, format: RecordFormat) -> FileSinkConfig {
        FileSinkConfig {
            path,
            format,
            max_bytes: 1024 * 1024,
            max_files: 2,
            flush_interval: Duration::from_millis(10),
            channel_capacity: 64,
        }
    }

    fn attention(value: u8) -> Event {
        DataRow {
            code: Code::Attention.into(),
            value: Value::Byte(value),
        }
        .at(Local::now())
    }

    #[test]
    fn test_rotate_files_keeps_max_files() {
        let dir = unique_temp_dir("rotate");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mindwave.csv");

        fs::write(&path, "active").unwrap();
        fs::write(dir.join("mindwave.csv.1"), "one").unwrap();
        fs::write(dir.join("mindwave.csv.2"), "two").unwrap();

        rotate_files(&path, 2).unwrap();

        assert!(!path.exists());
        assert_eq!(fs::read_to_string(dir.join("mindwave.csv.1")).unwrap(), "active");
        assert_eq!(fs::read_to_string(dir.join("mindwave.csv.2")).unwrap(), "one");
        assert!(!dir.join("mindwave.csv.3").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_csv_records_written_in_order() {
        let dir = unique_temp_dir("csv");
        let path = dir.join("session.csv");

        let mut sink = FileSink::spawn(config(path.clone(), RecordFormat::Csv)).unwrap();
        for v in [10, 20, 30] {
            sink.send(&attention(v)).unwrap();
        }
        sink.close().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,code,name,value");
        assert!(lines[1].ends_with(",0x04,ATTENTION,10"));
        assert!(lines[3].ends_with(",0x04,ATTENTION,30"));
        assert_eq!(sink.dropped(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_jsonl_has_no_header() {
        let dir = unique_temp_dir("jsonl");
        let path = dir.join("session.jsonl");

        let mut sink = FileSink::spawn(config(path.clone(), RecordFormat::Jsonl)).unwrap();
        sink.send(&attention(42)).unwrap();
        sink.close().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["value"], 42);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_send_after_close_reports_closed() {
        let dir = unique_temp_dir("closed");
        let mut sink = FileSink::spawn(config(dir.join("a.csv"), RecordFormat::Csv)).unwrap();
        sink.close().unwrap();
        assert!(matches!(
            sink.send(&attention(1)),
            Err(BridgeError::SinkClosed)
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let dir = unique_temp_dir("full");
        let path = dir.join("session.csv");
        let mut cfg = config(path.clone(), RecordFormat::Csv);
        cfg.channel_capacity = 1;

        let mut sink = FileSink::spawn(cfg).unwrap();
        for i in 0..5000u32 {
            sink.send(&attention((i % 100) as u8)).unwrap();
        }
        sink.close().unwrap();

        let dropped = sink.dropped();
        assert!(dropped > 0);
        let text = fs::read_to_string(&path).unwrap();
        // Every event was either written or counted as dropped
        assert_eq!(text.lines().count() as u64 - 1 + dropped, 5000);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_size_limit_rotates_with_fresh_header() {
        let dir = unique_temp_dir("size");
        let path = dir.join("a.csv");
        let mut cfg = config(path.clone(), RecordFormat::Csv);
        cfg.max_bytes = 1024;
        cfg.channel_capacity = 1024;

        let mut sink = FileSink::spawn(cfg).unwrap();
        for i in 0..100u8 {
            sink.send(&attention(i)).unwrap();
        }
        sink.close().unwrap();
        assert_eq!(sink.dropped(), 0);

        for name in ["a.csv", "a.csv.1", "a.csv.2"] {
            let text = fs::read_to_string(dir.join(name)).unwrap();
            assert_eq!(text.lines().next(), Some(CSV_HEADER), "{}", name);
            assert!(text.len() <= 1024 + 64, "{} is {} B", name, text.len());
        }
        assert!(!dir.join("a.csv.3").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_appending_to_existing_file_skips_header() {
        let dir = unique_temp_dir("append");
        let path = dir.join("session.csv");

        let mut sink = FileSink::spawn(config(path.clone(), RecordFormat::Csv)).unwrap();
        sink.send(&attention(1)).unwrap();
        sink.close().unwrap();

        let mut sink = FileSink::spawn(config(path.clone(), RecordFormat::Csv)).unwrap();
        sink.send(&attention(2)).unwrap();
        sink.close().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("timestamp")).count(), 1);
        assert_eq!(text.lines().count(), 3);

        let _ = fs::remove_dir_all(&dir);
    }
}
