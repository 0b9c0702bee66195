use tokio::sync::broadcast;

pub trait Shutdown {
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// Process wide shutdown notification, fired once on Ctrl+C.
#[derive(Clone)]
pub struct ShutdownChannel {
    sender: broadcast::Sender<()>,
}

impl ShutdownChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    pub fn trigger(&self) {
        if self.sender.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no running listeners");
        }
    }
}

impl Default for ShutdownChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown for ShutdownChannel {
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}
