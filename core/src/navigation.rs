//! Client-side navigation triggered by the client itself.
//!
//! The only navigation the client ever performs is the jump to the login
//! route after a 401, so the capability is a single `redirect`.

use tokio::sync::mpsc;

/// Route the user is sent to when the backend rejects the credential.
pub const LOGIN_ROUTE: &str = "/login";

pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Navigator for headless use: records the redirect in the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, path: &str) {
        tracing::info!(path, "redirect requested");
    }
}

/// Forwards redirects to whoever owns the receiving end, typically the
/// application's UI loop.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, path: &str) {
        if self.tx.send(path.to_string()).is_err() {
            tracing::warn!(path, "redirect dropped: navigation receiver is gone");
        }
    }
}
