// src/system/progress.rs

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter handed to a tool's `execute()` body.
///
/// Implementations must tolerate concurrent calls from worker threads.
pub trait IteratorListener: Send + Sync {
    /// Advances progress by `delta` iterations.
    fn inc(&self, delta: u64);

    /// Replaces the label shown next to the progress.
    fn set_message(&self, message: &str);

    /// Marks the iteration as done.
    fn finish(&self);
}

/// Terminal progress bar.
#[derive(Debug)]
pub struct ProgressBarListener {
    bar: ProgressBar,
}

impl ProgressBarListener {
    /// A bar of `total` steps labelled with `message`.
    pub fn new(total: u64, message: &str) -> Self {
        let style = ProgressStyle::with_template(
            "{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed_precise})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        let bar = ProgressBar::new(total);
        bar.set_style(style);
        bar.set_message(message.to_string());
        Self { bar }
    }
}

impl IteratorListener for ProgressBarListener {
    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Listener used when progress display is disabled.
#[derive(Debug, Default)]
pub struct SilentListener;

impl IteratorListener for SilentListener {
    fn inc(&self, _delta: u64) {}

    fn set_message(&self, _message: &str) {}

    fn finish(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_listeners_accept_concurrent_updates() {
        let listeners: Vec<Arc<dyn IteratorListener>> = vec![
            Arc::new(SilentListener),
            Arc::new(ProgressBarListener::new(1000, "counting")),
        ];
        for listener in listeners {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let listener = Arc::clone(&listener);
                    thread::spawn(move || {
                        for _ in 0..250 {
                            listener.inc(1);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            listener.finish();
        }
    }

    #[test]
    fn test_progress_bar_listener_tracks_position() {
        let listener = ProgressBarListener::new(10, "reading");
        listener.inc(4);
        listener.set_message("still reading");
        assert_eq!(listener.bar.position(), 4);
        listener.finish();
    }
}
