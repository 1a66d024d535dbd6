use anyhow::Result;

use super::{CenterEntry, EmailRequest, Toast};

/// Fire-and-forget popup channel.
pub(crate) trait ToastNotifier {
    fn toast(&self, toast: &Toast);
}

/// Persistent list of notifications the user can review later.
pub(crate) trait NotificationCenter {
    fn append(&self, entry: &CenterEntry) -> Result<()>;
}

/// Outbound email. `Ok(true)` means the message was accepted for delivery.
pub(crate) trait EmailTransport {
    fn send(&self, request: &EmailRequest) -> Result<bool>;
}

/// The three delivery channels a refresh writes to.
pub(crate) struct Sinks<'a> {
    pub toasts: &'a dyn ToastNotifier,
    pub center: &'a dyn NotificationCenter,
    pub email: &'a dyn EmailTransport,
}

/// Prints toasts to stderr so they do not mix with command output.
pub(crate) struct ConsoleNotifier;

impl ToastNotifier for ConsoleNotifier {
    fn toast(&self, toast: &Toast) {
        eprintln!(
            "[{}] {}: {}",
            toast.severity.as_str().to_uppercase(),
            toast.title,
            toast.message
        );
    }
}
