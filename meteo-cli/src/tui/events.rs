use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Terminal input forwarded to the UI loop.
#[derive(Debug)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize,
}

/// Global key listener, attached for as long as this value lives.
///
/// A reader thread polls the terminal and forwards events over a channel;
/// dropping the subscription stops and joins it.
pub struct KeySubscription {
    rx: mpsc::UnboundedReceiver<TermEvent>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl KeySubscription {
    pub fn acquire() -> Result<Self> {
        Self::spawn(poll_terminal)
    }

    /// Start the reader thread over `poll`, which waits up to the given
    /// timeout and returns the next event, if any.
    fn spawn<P>(poll: P) -> Result<Self>
    where
        P: FnMut(Duration) -> io::Result<Option<Event>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let reader = thread::Builder::new()
            .name("meteo-keys".into())
            .spawn(move || forward_events(&tx, &flag, poll))
            .context("Failed to start key listener")?;

        Ok(Self {
            rx,
            stop,
            reader: Some(reader),
        })
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<TermEvent> {
        self.rx.recv().await
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        tracing::debug!("key listener detached");
    }
}

fn poll_terminal(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

fn forward_events<P>(tx: &mpsc::UnboundedSender<TermEvent>, stop: &AtomicBool, mut poll: P)
where
    P: FnMut(Duration) -> io::Result<Option<Event>>,
{
    while !stop.load(Ordering::Relaxed) {
        let event = match poll(POLL_INTERVAL) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "terminal input failed");
                return;
            }
        };

        let forwarded = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => TermEvent::Key(key),
            Event::Resize(..) => TermEvent::Resize,
            _ => continue,
        };

        if tx.send(forwarded).is_err() {
            return;
        }
    }
}
