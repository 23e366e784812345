//! Notification sink capability.
//!
//! The attendance session announces events through this trait; the
//! concrete binding (speech synthesis, console, a test double) is supplied
//! by the caller, never hard-wired.

/// Fire-and-forget audible announcement.
pub trait Notifier {
    fn speak(&mut self, text: &str);
}

/// Default binding: announcements go to the console and the trace stream.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn speak(&mut self, text: &str) {
        tracing::info!(text = %text, "announcement");
        println!("[voice] {text}");
    }
}

/// Records every announcement, for assertions.
#[cfg(test)]
pub struct RecordingNotifier {
    pub spoken: Vec<String>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self { spoken: Vec::new() }
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn speak(&mut self, text: &str) {
        self.spoken.push(text.to_string());
    }
}
