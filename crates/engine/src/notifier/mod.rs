pub mod channel;
pub mod log;
pub mod retry;
pub mod webhook;

pub use channel::{Notifier, NotifyError, StatusUpdate};
pub use log::LogNotifier;
pub use retry::RetryNotifier;
pub use webhook::WebhookNotifier;
