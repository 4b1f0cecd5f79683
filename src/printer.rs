//! User-facing output capability.

/// Writes user-facing messages, e.g. the authorization URL the user has to
/// open by hand. Verbose diagnostics go through `tracing` instead.
pub trait Printer: Send + Sync {
    fn print(&self, message: &str);
}

/// Production printer writing one line per message to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrPrinter;

impl Printer for StderrPrinter {
    fn print(&self, message: &str) {
        eprintln!("{message}");
    }
}
