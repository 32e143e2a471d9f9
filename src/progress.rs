// src/progress.rs
/// Lightweight progress reporting used by the pipeline commands.
/// Frontends implement this to surface status to the operator.
pub trait Progress {
    /// Called at the start with the total number of items (if known).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One logical unit completed (a snapshot, a batch file) with `count` rows/records.
    fn item_done(&mut self, _label: &str, _count: usize) {}

    /// One logical unit failed and was skipped.
    fn item_failed(&mut self, _label: &str, _err: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Prints to stdout, one line per event.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
    failed: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.failed = 0;
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn item_done(&mut self, label: &str, count: usize) {
        self.done += 1;
        if self.total > 0 {
            println!("  [{}/{}] {label}: {count}", self.done + self.failed, self.total);
        } else {
            println!("  {label}: {count}");
        }
    }

    fn item_failed(&mut self, label: &str, err: &str) {
        self.failed += 1;
        println!("  {label}: Error: {err}");
    }

    fn finish(&mut self) {
        if self.failed > 0 {
            println!("  {} done, {} failed", self.done, self.failed);
        }
    }
}
