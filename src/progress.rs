//! Progress reporting for date resolution

use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    terminal::{self, Clear, ClearType},
};
use std::io::{self, StderrLock, Write, stderr};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::fmt::MakeWriter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Set while a progress line sits on stderr without a newline
static LINE_ON_SCREEN: AtomicBool = AtomicBool::new(false);

/// Receives one call per completed date resolution
///
/// Calls may come from several worker threads and in any order; `completed`
/// is the value of the shared counter right after this file was counted.
pub trait ProgressSink: Sync {
    fn on_resolved(&self, completed: usize, total: usize, path: &Path);

    /// Called once all resolutions of a folder are done
    fn finish(&self) {}
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_resolved(&self, _completed: usize, _total: usize, _path: &Path) {}
}

/// Rewrites a single status line on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn width() -> usize {
        let columns = terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
        // Writing into the last column wraps on some terminals
        columns.saturating_sub(1).max(1)
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_resolved(&self, completed: usize, total: usize, path: &Path) {
        let line = format!("[{}/{}] Processing \"{}\"", completed, total, path.display());
        let keep_tail = path
            .file_name()
            .map(|n| n.to_string_lossy().width() + 1)
            .unwrap_or(0);

        let mut err = stderr().lock();
        let _ = write!(err, "{}\r", fit_one_line(&line, Self::width(), keep_tail));
        let _ = err.flush();
        LINE_ON_SCREEN.store(true, Ordering::Release);
    }

    fn finish(&self) {
        let mut err = stderr().lock();
        if LINE_ON_SCREEN.swap(false, Ordering::AcqRel) {
            let _ = clear_line(&mut err);
            let _ = err.flush();
        }
    }
}

fn clear_line<W: Write>(out: &mut W) -> io::Result<()> {
    out.queue(Clear(ClearType::CurrentLine))?;
    out.queue(MoveToColumn(0))?;
    Ok(())
}

/// stderr writer for log events that shares the progress line
///
/// Each event holds the stderr lock while it is written, and wipes the
/// progress line first when one is showing. The next progress update
/// redraws it below the event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = ClearLineFirst<'static, StderrLock<'static>>;

    fn make_writer(&'a self) -> Self::Writer {
        ClearLineFirst::new(stderr().lock(), &LINE_ON_SCREEN)
    }
}

/// Clears the current terminal line before the first write
pub struct ClearLineFirst<'f, W: Write> {
    inner: W,
    line_on_screen: &'f AtomicBool,
}

impl<'f, W: Write> ClearLineFirst<'f, W> {
    fn new(inner: W, line_on_screen: &'f AtomicBool) -> Self {
        Self {
            inner,
            line_on_screen,
        }
    }
}

impl<W: Write> Write for ClearLineFirst<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.line_on_screen.swap(false, Ordering::AcqRel) {
            clear_line(&mut self.inner)?;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

const ELLIPSIS: &str = "...";

/// Fit `line` into exactly `width` display columns
///
/// Short lines are padded with spaces so they overwrite what was there.
/// Long lines lose their middle; the last `keep_tail` columns survive when
/// there is room for them.
pub fn fit_one_line(line: &str, width: usize, keep_tail: usize) -> String {
    let line_width = line.width();
    if line_width <= width {
        return format!("{}{}", line, " ".repeat(width - line_width));
    }

    let dots = ELLIPSIS.len();
    if width <= dots {
        return take_width(line, width);
    }
    if width <= keep_tail + dots {
        let mut out = take_width(line, width - dots);
        out.push_str(ELLIPSIS);
        return pad(out, width);
    }

    let head = width - keep_tail - dots;
    let mut out = pad(take_width(line, head), head);
    out.push_str(ELLIPSIS);
    out.push_str(&take_tail_width(line, keep_tail));
    pad(out, width)
}

/// Longest prefix of `s` no wider than `max`
fn take_width(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

/// Longest suffix of `s` no wider than `max`
fn take_tail_width(s: &str, max: usize) -> String {
    let mut tail = Vec::new();
    let mut used = 0;
    for ch in s.chars().rev() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > max {
            break;
        }
        tail.push(ch);
        used += w;
    }
    tail.into_iter().rev().collect()
}

/// Wide characters can leave a prefix one column short
fn pad(mut s: String, width: usize) -> String {
    let w = s.width();
    if w < width {
        s.push_str(&" ".repeat(width - w));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_line_is_padded() {
        let out = fit_one_line("abc", 6, 0);
        assert_eq!(out, "abc   ");
    }

    #[test]
    fn test_long_line_keeps_tail() {
        let out = fit_one_line("[1/9] Processing \"/very/long/dir/photo.jpg\"", 24, 11);
        assert_eq!(out.width(), 24);
        assert!(out.ends_with("photo.jpg\""));
        assert!(out.contains("..."));
        assert!(out.starts_with("[1/9] Pro"));
    }

    #[test]
    fn test_tail_too_wide_for_terminal() {
        let out = fit_one_line("abcdefghij", 6, 8);
        assert_eq!(out, "abc...");
    }

    #[test]
    fn test_tiny_width() {
        assert_eq!(fit_one_line("abcdefghij", 2, 0), "ab");
    }

    #[test]
    fn test_log_event_clears_progress_line() {
        let on_screen = AtomicBool::new(true);
        let mut out = ClearLineFirst::new(Vec::new(), &on_screen);
        out.write_all(b"INFO resolved\n").unwrap();
        out.write_all(b"INFO again\n").unwrap();

        let mut expected = Vec::new();
        clear_line(&mut expected).unwrap();
        expected.extend_from_slice(b"INFO resolved\nINFO again\n");
        assert_eq!(out.inner, expected);
        assert!(!on_screen.load(Ordering::Acquire));
    }

    #[test]
    fn test_log_event_without_progress_line() {
        let on_screen = AtomicBool::new(false);
        let mut out = ClearLineFirst::new(Vec::new(), &on_screen);
        out.write_all(b"WARN skipped\n").unwrap();
        assert_eq!(out.inner, b"WARN skipped\n");
    }

    #[test]
    fn test_wide_characters() {
        let out = fit_one_line("照片照片照片照片.jpg", 10, 4);
        assert_eq!(out.width(), 10);
        assert!(out.ends_with(".jpg"));
    }
}
