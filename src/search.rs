//! Debounced tag autocomplete for the dashboard search box.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, Either};
use futures_util::pin_mut;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::config::Config;

/// Runs only the last of a burst of calls, once `delay` has passed without another call.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `task`, replacing whatever was scheduled before.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn call<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Drops the scheduled task, if it has not started running yet.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The search box: its input and the suggestions for it.
///
/// `fetch` is called with the input once typing pauses; its result is picked
/// up by [`next_suggestions`](Self::next_suggestions).
pub struct TagSearch<F> {
    input: String,
    generation: u64,
    suggestions: Vec<String>,
    fetch: Arc<F>,
    debouncer: Debouncer,
    tx: mpsc::UnboundedSender<(u64, Vec<String>)>,
    rx: mpsc::UnboundedReceiver<(u64, Vec<String>)>,
}

impl<F, Fut> TagSearch<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<String>> + Send + 'static,
{
    pub fn new(config: &Config, fetch: F) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        TagSearch {
            input: String::new(),
            generation: 0,
            suggestions: Vec::new(),
            fetch: Arc::new(fetch),
            debouncer: Debouncer::new(config.get_suggestion_debounce()),
            tx,
            rx,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Replaces the input and reschedules the lookup.
    ///
    /// An empty input clears the suggestions at once and sends nothing.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.generation += 1;

        if self.input.is_empty() {
            self.debouncer.cancel();
            self.suggestions.clear();
            return;
        }

        let generation = self.generation;
        let input = self.input.clone();
        let fetch = self.fetch.clone();
        let tx = self.tx.clone();
        self.debouncer.call(async move {
            let tags = fetch(input).await;
            let _ = tx.send((generation, tags));
        });
    }

    /// Picks a suggestion: it becomes the input.
    pub fn pick(&mut self, tag: &str) {
        self.set_input(tag);
    }

    /// Waits for the lookup of the current input and stores its result.
    ///
    /// Results for earlier inputs are skipped. Returns `None` if nothing is
    /// scheduled, or if the lookup ended without a result.
    pub async fn next_suggestions(&mut self) -> Option<&[String]> {
        loop {
            let (generation, tags) = match self.rx.try_recv() {
                Ok(received) => received,
                Err(_) => {
                    let pending = self.debouncer.pending.as_mut()?;
                    let first = {
                        let recv = self.rx.recv();
                        pin_mut!(recv);
                        let selected = future::select(recv, pending).await;
                        match selected {
                            Either::Left((received, _)) => Ok(received),
                            Either::Right((joined, _)) => Err(joined),
                        }
                    };
                    match first {
                        Ok(received) => received?,
                        Err(joined) => {
                            self.debouncer.pending = None;
                            if let Err(e) = joined {
                                if e.is_panic() {
                                    warn!("tag lookup failed: {}", e);
                                }
                            }
                            // the task may have sent right before it finished
                            self.rx.try_recv().ok()?
                        }
                    }
                }
            };
            if generation == self.generation {
                self.suggestions = tags;
                return Some(&self.suggestions);
            }
            trace!(generation, "skipping suggestions for an old input");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording() -> (
        Arc<Mutex<Vec<String>>>,
        impl Fn(String) -> futures::future::Ready<Vec<String>> + Send + Sync + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let fetch = move |prefix: String| {
            log.lock().unwrap().push(prefix.clone());
            futures::future::ready(vec![format!("{}-1", prefix), format!("{}-2", prefix)])
        };
        (seen, fetch)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_sends_one_request() {
        let (seen, fetch) = recording();
        let mut search = TagSearch::new(&Config::default(), fetch);

        search.set_input("카");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.set_input("카페");
        tokio::time::sleep(Duration::from_millis(299)).await;

        let tags = search.next_suggestions().await.unwrap().to_vec();
        assert_eq!(tags, ["카페-1", "카페-2"]);
        assert_eq!(search.suggestions(), ["카페-1", "카페-2"]);
        assert_eq!(search.input(), "카페");
        assert_eq!(*seen.lock().unwrap(), ["카페"]);
        assert!(search.next_suggestions().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_before_the_delay() {
        let (seen, fetch) = recording();
        let mut search = TagSearch::new(&Config::default(), fetch);

        search.set_input("a");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(search.debouncer.is_pending());
        assert!(seen.lock().unwrap().is_empty());
        assert!(search.suggestions().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(search.next_suggestions().await.unwrap(), ["a-1", "a-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_clears() {
        let (_, fetch) = recording();
        let mut search = TagSearch::new(&Config::default(), fetch);

        search.set_input("a");
        search.next_suggestions().await;
        assert_eq!(search.suggestions().len(), 2);

        search.set_input("");
        assert!(search.suggestions().is_empty());
        assert!(search.next_suggestions().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_gives_no_suggestions() {
        let mut search = TagSearch::new(&Config::default(), |prefix: String| async move {
            if prefix == "boom" {
                panic!("lookup failed");
            }
            vec![prefix]
        });

        search.set_input("boom");
        assert!(search.next_suggestions().await.is_none());
        assert!(search.suggestions().is_empty());
        assert!(!search.debouncer.is_pending());

        search.set_input("ok");
        assert_eq!(search.next_suggestions().await.unwrap(), ["ok"]);
        assert!(search.next_suggestions().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn debouncer_runs_last_call_only() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for i in 0..5 {
            let hits = hits.clone();
            debouncer.call(async move { hits.lock().unwrap().push(i) });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*hits.lock().unwrap(), [4]);
        assert!(!debouncer.is_pending());
    }
}
