//! Token Bridge Implementation
//!
//! A callback-driven producer pushes tokens into an unbounded FIFO; a consumer
//! pulls them back out one at a time until the run's termination marker or a
//! cancellation is observed.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

// ============================================================================
// Configuration
// ============================================================================

/// What a pull does when a single attempt runs out of time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Keep waiting: a timed-out attempt is retried (default)
    #[default]
    Retry,
    /// Report the timeout as the end of the stream
    EndOfStream,
}

/// Configuration for a [`TokenBridge`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Upper bound on a single pull attempt (`None` waits indefinitely)
    pub timeout: Option<Duration>,
    /// Whether a pull attempt waits for an item or only peeks
    pub block: bool,
    /// Backoff slice between checks of the stop flag while waiting
    pub poll_interval: Duration,
    /// How a timed-out attempt is reported
    pub timeout_policy: TimeoutPolicy,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            block: true,
            poll_interval: Duration::from_millis(10),
            timeout_policy: TimeoutPolicy::Retry,
        }
    }
}

impl BridgeOptions {
    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set blocking mode
    #[must_use]
    pub fn with_block(mut self, block: bool) -> Self {
        self.block = block;
        self
    }

    /// Set the wait slice; zero is raised to one millisecond
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    /// Set the timeout policy
    #[must_use]
    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }
}

// ============================================================================
// Queue Items and Pull Results
// ============================================================================

/// Why a token stream ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// The producer called `finish`
    Finished,
    /// The producer called `fail`; carries the error's display text
    Failed(String),
    /// The consumer called `cancel`
    Cancelled,
    /// A pull attempt timed out under [`TimeoutPolicy::EndOfStream`]
    TimedOut,
}

impl StreamEnd {
    /// Whether the run ended without a producer failure
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::Failed(error) => write!(f, "failed: {error}"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of one consumer pull
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pulled {
    /// The next token of the current run
    Token(String),
    /// The stream is over
    End(StreamEnd),
}

/// Queue entry, stamped with the run that produced it
#[derive(Debug)]
enum BridgeItem {
    Token { run: u64, text: String },
    End { run: u64, reason: StreamEnd },
}

impl BridgeItem {
    fn run(&self) -> u64 {
        match self {
            Self::Token { run, .. } | Self::End { run, .. } => *run,
        }
    }
}

/// Outcome of one dequeue attempt
enum Attempt {
    Item(BridgeItem),
    TimedOut,
    Cancelled,
}

// ============================================================================
// Statistics
// ============================================================================

/// Snapshot of bridge counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Number of `start` calls
    pub runs_started: u64,
    /// Tokens accepted by `push`
    pub tokens_pushed: u64,
    /// Tokens handed to the consumer
    pub tokens_delivered: u64,
    /// Items discarded because they belonged to an earlier run
    pub stale_discarded: u64,
    /// `finish`/`fail` calls ignored because the run was already terminated
    pub duplicate_terminations: u64,
}

#[derive(Default)]
struct Counters {
    runs_started: AtomicU64,
    tokens_pushed: AtomicU64,
    tokens_delivered: AtomicU64,
    stale_discarded: AtomicU64,
    duplicate_terminations: AtomicU64,
}

/// End of the most recent run as seen by the consumer
#[derive(Default)]
struct ConsumerState {
    ended: Option<(u64, StreamEnd)>,
}

// ============================================================================
// Token Bridge
// ============================================================================

/// Adapter between a callback-driven token producer and a pull-based consumer
///
/// Producer side: [`start`](Self::start), [`push`](Self::push),
/// [`finish`](Self::finish), [`fail`](Self::fail). None of them block.
///
/// Consumer side: [`pull`](Self::pull), [`next_token`](Self::next_token),
/// [`tokens`](Self::tokens), [`stream`](Self::stream) and
/// [`cancel`](Self::cancel).
///
/// Share it between the two sides as `Arc<TokenBridge>`.
pub struct TokenBridge {
    tx: flume::Sender<BridgeItem>,
    rx: flume::Receiver<BridgeItem>,
    stop: AtomicBool,
    run: AtomicU64,
    /// `run + 1` of the last terminated run, 0 when none
    terminated: AtomicU64,
    consumer: Mutex<ConsumerState>,
    counters: Counters,
    options: BridgeOptions,
}

impl Default for TokenBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBridge")
            .field("run", &self.current_run())
            .field("pending", &self.pending())
            .field("cancelled", &self.is_cancelled())
            .field("options", &self.options)
            .finish()
    }
}

impl TokenBridge {
    /// Create a bridge that blocks indefinitely on each pull
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BridgeOptions::default())
    }

    /// Create a bridge with custom options
    #[must_use]
    pub fn with_options(options: BridgeOptions) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            stop: AtomicBool::new(false),
            run: AtomicU64::new(0),
            terminated: AtomicU64::new(0),
            consumer: Mutex::new(ConsumerState::default()),
            counters: Counters::default(),
            options,
        }
    }

    /// Get the bridge options
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Number of the run currently being produced
    #[must_use]
    pub fn current_run(&self) -> u64 {
        self.run.load(Ordering::Acquire)
    }

    /// Number of items waiting in the queue
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Whether the consumer has cancelled the stream
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Snapshot of the bridge counters
    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            runs_started: self.counters.runs_started.load(Ordering::Relaxed),
            tokens_pushed: self.counters.tokens_pushed.load(Ordering::Relaxed),
            tokens_delivered: self.counters.tokens_delivered.load(Ordering::Relaxed),
            stale_discarded: self.counters.stale_discarded.load(Ordering::Relaxed),
            duplicate_terminations: self.counters.duplicate_terminations.load(Ordering::Relaxed),
        }
    }

    // ------------------------------------------------------------------------
    // Producer side
    // ------------------------------------------------------------------------

    /// Begin a new generation run, discarding anything left from earlier runs
    ///
    /// The drain is best effort and never waits. Items from an older run that
    /// land after it are dropped by the consumer using their run stamp.
    pub fn start(&self) {
        let run = self.run.fetch_add(1, Ordering::AcqRel) + 1;
        let drained = self.rx.drain().count();
        self.counters.runs_started.fetch_add(1, Ordering::Relaxed);
        if drained > 0 {
            self.counters
                .stale_discarded
                .fetch_add(drained as u64, Ordering::Relaxed);
        }
        tracing::debug!(run, drained, "generation run started");
    }

    /// Enqueue a token for the current run
    pub fn push(&self, token: impl Into<String>) {
        let run = self.current_run();
        self.enqueue(BridgeItem::Token {
            run,
            text: token.into(),
        });
        self.counters.tokens_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the current run as complete
    pub fn finish(&self) {
        self.terminate(StreamEnd::Finished);
    }

    /// Mark the current run as failed
    ///
    /// The consumer's token sequence ends exactly as with [`finish`](Self::finish);
    /// the error text is kept in [`StreamEnd::Failed`].
    pub fn fail(&self, error: impl fmt::Display) {
        self.terminate(StreamEnd::Failed(error.to_string()));
    }

    fn terminate(&self, reason: StreamEnd) {
        let run = self.current_run();
        if self.terminated.swap(run + 1, Ordering::AcqRel) == run + 1 {
            self.counters
                .duplicate_terminations
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!(run, %reason, "run already terminated, ignoring");
            return;
        }
        tracing::debug!(run, %reason, "generation run terminated");
        self.enqueue(BridgeItem::End { run, reason });
    }

    fn enqueue(&self, item: BridgeItem) {
        // The bridge holds the receiver for its whole lifetime.
        if self.tx.send(item).is_err() {
            tracing::error!("token queue disconnected");
        }
    }

    // ------------------------------------------------------------------------
    // Consumer side
    // ------------------------------------------------------------------------

    /// Stop yielding tokens; idempotent
    ///
    /// Takes effect on the next pull step, or within one poll interval for a
    /// pull that is already waiting. The producer is not interrupted.
    pub fn cancel(&self) {
        if !self.stop.swap(true, Ordering::AcqRel) {
            tracing::info!(run = self.current_run(), "token stream cancelled");
        }
    }

    /// Pull the next token, or the end of the stream
    ///
    /// May block according to [`BridgeOptions::block`] and
    /// [`BridgeOptions::timeout`].
    pub fn pull(&self) -> Pulled {
        let pull_run = self.current_run();
        loop {
            if let Some(end) = self.check_ended() {
                return Pulled::End(end);
            }
            let attempt = self.attempt_blocking();
            if let Some(pulled) = self.settle(attempt, pull_run) {
                return pulled;
            }
        }
    }

    /// Pull the next token; `None` means end of stream
    pub fn next_token(&self) -> Option<String> {
        match self.pull() {
            Pulled::Token(token) => Some(token),
            Pulled::End(_) => None,
        }
    }

    /// Lazy, non-restartable iterator over the current run's tokens
    #[must_use]
    pub fn tokens(&self) -> Tokens<'_> {
        Tokens {
            bridge: self,
            end: None,
        }
    }

    /// Async version of [`pull`](Self::pull)
    ///
    /// Waits on the queue without blocking the executor thread. Requires a
    /// Tokio runtime with the time driver enabled.
    pub async fn pull_async(&self) -> Pulled {
        let pull_run = self.current_run();
        loop {
            if let Some(end) = self.check_ended() {
                return Pulled::End(end);
            }
            let attempt = self.attempt_async().await;
            if let Some(pulled) = self.settle(attempt, pull_run) {
                return pulled;
            }
        }
    }

    /// Async token stream for the current run
    pub fn stream(self: Arc<Self>) -> BoxStream<'static, String> {
        stream::unfold(self, |bridge| async move {
            match bridge.pull_async().await {
                Pulled::Token(token) => Some((token, bridge)),
                Pulled::End(_) => None,
            }
        })
        .boxed()
    }

    /// Cancellation, or a run the consumer has already seen end
    fn check_ended(&self) -> Option<StreamEnd> {
        if self.is_cancelled() {
            return Some(StreamEnd::Cancelled);
        }
        let run = self.current_run();
        let state = self.consumer.lock();
        match &state.ended {
            Some((ended_run, end)) if *ended_run == run => Some(end.clone()),
            _ => None,
        }
    }

    /// Turn one attempt into a result; `None` means try again
    ///
    /// `pull_run` is the run that was current when the pull began. Its end
    /// marker still ends the pull even if a new run started meanwhile.
    fn settle(&self, attempt: Attempt, pull_run: u64) -> Option<Pulled> {
        match attempt {
            Attempt::Cancelled => Some(Pulled::End(StreamEnd::Cancelled)),
            Attempt::TimedOut => match self.options.timeout_policy {
                TimeoutPolicy::Retry => None,
                TimeoutPolicy::EndOfStream => Some(Pulled::End(StreamEnd::TimedOut)),
            },
            Attempt::Item(item) => {
                let current = self.current_run();
                let own_end = matches!(&item, BridgeItem::End { run, .. } if *run == pull_run);
                if item.run() < current && !own_end {
                    self.counters.stale_discarded.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(item_run = item.run(), current, "discarding stale item");
                    return None;
                }
                match item {
                    BridgeItem::Token { text, .. } => {
                        self.counters.tokens_delivered.fetch_add(1, Ordering::Relaxed);
                        Some(Pulled::Token(text))
                    }
                    BridgeItem::End { run, reason } => {
                        self.consumer.lock().ended = Some((run, reason.clone()));
                        Some(Pulled::End(reason))
                    }
                }
            }
        }
    }

    /// Dequeue one item on the calling thread
    fn attempt_blocking(&self) -> Attempt {
        if !self.options.block {
            return match self.rx.try_recv() {
                Ok(item) => Attempt::Item(item),
                Err(flume::TryRecvError::Empty) => match self.options.timeout_policy {
                    // Back off for one slice instead of spinning on the peek.
                    TimeoutPolicy::Retry => match self.rx.recv_timeout(self.options.poll_interval) {
                        Ok(item) => Attempt::Item(item),
                        Err(flume::RecvTimeoutError::Timeout) => Attempt::TimedOut,
                        Err(flume::RecvTimeoutError::Disconnected) => disconnected(),
                    },
                    TimeoutPolicy::EndOfStream => Attempt::TimedOut,
                },
                Err(flume::TryRecvError::Disconnected) => disconnected(),
            };
        }

        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        loop {
            if self.is_cancelled() {
                return Attempt::Cancelled;
            }
            let Some(slice) = self.next_slice(deadline) else {
                return Attempt::TimedOut;
            };
            match self.rx.recv_timeout(slice) {
                Ok(item) => return Attempt::Item(item),
                Err(flume::RecvTimeoutError::Timeout) => {}
                Err(flume::RecvTimeoutError::Disconnected) => disconnected(),
            }
        }
    }

    /// Dequeue one item without blocking the executor
    async fn attempt_async(&self) -> Attempt {
        if !self.options.block {
            return match self.rx.try_recv() {
                Ok(item) => Attempt::Item(item),
                Err(flume::TryRecvError::Empty) => match self.options.timeout_policy {
                    TimeoutPolicy::Retry => {
                        match tokio::time::timeout(self.options.poll_interval, self.rx.recv_async())
                            .await
                        {
                            Ok(Ok(item)) => Attempt::Item(item),
                            Ok(Err(_)) => disconnected(),
                            Err(_) => Attempt::TimedOut,
                        }
                    }
                    TimeoutPolicy::EndOfStream => Attempt::TimedOut,
                },
                Err(flume::TryRecvError::Disconnected) => disconnected(),
            };
        }

        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        loop {
            if self.is_cancelled() {
                return Attempt::Cancelled;
            }
            let Some(slice) = self.next_slice(deadline) else {
                return Attempt::TimedOut;
            };
            match tokio::time::timeout(slice, self.rx.recv_async()).await {
                Ok(Ok(item)) => return Attempt::Item(item),
                Ok(Err(_)) => disconnected(),
                Err(_) => {}
            }
        }
    }

    /// Length of the next wait slice, `None` once the deadline has passed
    fn next_slice(&self, deadline: Option<Instant>) -> Option<Duration> {
        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    None
                } else {
                    Some(remaining.min(self.options.poll_interval))
                }
            }
            None => Some(self.options.poll_interval),
        }
    }
}

/// The bridge owns both ends of its queue, so a disconnect is a broken invariant.
fn disconnected() -> ! {
    unreachable!("token queue disconnected while the bridge holds both ends")
}

// ============================================================================
// Iterator
// ============================================================================

/// Blocking iterator over one run's tokens, returned by [`TokenBridge::tokens`]
///
/// Once it has returned `None` it stays exhausted.
pub struct Tokens<'a> {
    bridge: &'a TokenBridge,
    end: Option<StreamEnd>,
}

impl Tokens<'_> {
    /// Why the iteration stopped, once it has
    #[must_use]
    pub fn end_reason(&self) -> Option<&StreamEnd> {
        self.end.as_ref()
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.end.is_some() {
            return None;
        }
        match self.bridge.pull() {
            Pulled::Token(token) => Some(token),
            Pulled::End(end) => {
                self.end = Some(end);
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quick_options() -> BridgeOptions {
        BridgeOptions::default().with_poll_interval(Duration::from_millis(2))
    }

    #[test]
    fn test_options_default() {
        let options = BridgeOptions::default();
        assert_eq!(options.timeout, None);
        assert!(options.block);
        assert_eq!(options.poll_interval, Duration::from_millis(10));
        assert_eq!(options.timeout_policy, TimeoutPolicy::Retry);
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        let options = BridgeOptions::default().with_poll_interval(Duration::ZERO);
        assert_eq!(options.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_tokens_then_end() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("a");
        bridge.push("b");
        bridge.finish();

        assert_eq!(bridge.pull(), Pulled::Token("a".to_string()));
        assert_eq!(bridge.pull(), Pulled::Token("b".to_string()));
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Finished));
    }

    #[test]
    fn test_end_is_sticky_until_next_start() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.finish();
        // Pushed after the run ended; must never surface for this run.
        bridge.push("late");

        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Finished));
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Finished));

        bridge.start();
        bridge.push("fresh");
        bridge.finish();
        assert_eq!(bridge.next_token(), Some("fresh".to_string()));
        assert_eq!(bridge.next_token(), None);
    }

    #[test]
    fn test_fail_carries_message() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("x");
        bridge.fail("connection reset");

        assert_eq!(bridge.pull(), Pulled::Token("x".to_string()));
        let end = bridge.pull();
        assert_eq!(
            end,
            Pulled::End(StreamEnd::Failed("connection reset".to_string()))
        );
    }

    #[test]
    fn test_duplicate_termination_ignored() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.fail("boom");
        bridge.finish();

        assert_eq!(bridge.pending(), 1);
        assert_eq!(bridge.stats().duplicate_terminations, 1);
        assert_eq!(
            bridge.pull(),
            Pulled::End(StreamEnd::Failed("boom".to_string()))
        );
    }

    #[test]
    fn test_each_run_may_terminate_once() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.finish();
        bridge.start();
        bridge.finish();

        assert_eq!(bridge.stats().duplicate_terminations, 0);
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Finished));
    }

    #[test]
    fn test_start_drains_queue() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("1");
        bridge.push("2");
        assert_eq!(bridge.pending(), 2);

        bridge.start();
        assert_eq!(bridge.pending(), 0);
        assert_eq!(bridge.stats().stale_discarded, 2);
        assert_eq!(bridge.current_run(), 2);
    }

    #[test]
    fn test_end_dequeued_across_start_still_ends_pull() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        let pull_run = bridge.current_run();

        // The marker left the queue, then the next run began before it settled.
        let end = BridgeItem::End {
            run: pull_run,
            reason: StreamEnd::Finished,
        };
        bridge.start();

        assert_eq!(
            bridge.settle(Attempt::Item(end), pull_run),
            Some(Pulled::End(StreamEnd::Finished))
        );
        assert_eq!(bridge.stats().stale_discarded, 0);

        // The new run reads normally afterwards.
        bridge.push("next");
        bridge.finish();
        assert_eq!(bridge.pull(), Pulled::Token("next".to_string()));
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Finished));
    }

    #[test]
    fn test_older_end_is_still_stale() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.start();
        let pull_run = bridge.current_run();

        let old_end = BridgeItem::End {
            run: pull_run - 1,
            reason: StreamEnd::Finished,
        };
        assert_eq!(bridge.settle(Attempt::Item(old_end), pull_run), None);
        assert_eq!(bridge.stats().stale_discarded, 1);

        let old_token = BridgeItem::Token {
            run: pull_run - 1,
            text: "old".to_string(),
        };
        assert_eq!(bridge.settle(Attempt::Item(old_token), pull_run), None);
        assert_eq!(bridge.stats().stale_discarded, 2);
    }

    #[test]
    fn test_push_without_start_is_accepted() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.push("early");
        bridge.finish();

        let tokens: Vec<String> = bridge.tokens().collect();
        assert_eq!(tokens, vec!["early".to_string()]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("x");
        bridge.cancel();
        bridge.cancel();

        assert!(bridge.is_cancelled());
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Cancelled));
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::Cancelled));
        // The unread token is still queued; cancellation does not consume it.
        assert_eq!(bridge.pending(), 1);
    }

    #[test]
    fn test_timeout_end_of_stream_policy() {
        let bridge = TokenBridge::with_options(
            quick_options()
                .with_timeout(Duration::from_millis(20))
                .with_timeout_policy(TimeoutPolicy::EndOfStream),
        );
        bridge.start();

        let started = Instant::now();
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_non_blocking_peek_end_of_stream_policy() {
        let bridge = TokenBridge::with_options(
            quick_options()
                .with_block(false)
                .with_timeout_policy(TimeoutPolicy::EndOfStream),
        );
        bridge.start();
        assert_eq!(bridge.pull(), Pulled::End(StreamEnd::TimedOut));

        bridge.push("ready");
        assert_eq!(bridge.pull(), Pulled::Token("ready".to_string()));
    }

    #[test]
    fn test_iterator_records_end_reason() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("only");
        bridge.fail("oops");

        let mut tokens = bridge.tokens();
        assert_eq!(tokens.next(), Some("only".to_string()));
        assert_eq!(tokens.next(), None);
        assert_eq!(tokens.next(), None);
        assert_eq!(
            tokens.end_reason(),
            Some(&StreamEnd::Failed("oops".to_string()))
        );
    }

    #[test]
    fn test_stats_counts_tokens() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("a");
        bridge.push("b");
        bridge.finish();
        let _: Vec<String> = bridge.tokens().collect();

        let stats = bridge.stats();
        assert_eq!(stats.runs_started, 1);
        assert_eq!(stats.tokens_pushed, 2);
        assert_eq!(stats.tokens_delivered, 2);
    }

    #[test]
    fn test_stream_end_display() {
        assert_eq!(StreamEnd::Finished.to_string(), "finished");
        assert_eq!(
            StreamEnd::Failed("bad".to_string()).to_string(),
            "failed: bad"
        );
        assert!(StreamEnd::Cancelled.is_clean());
        assert!(!StreamEnd::Failed(String::new()).is_clean());
    }

    #[tokio::test]
    async fn test_pull_async() {
        let bridge = TokenBridge::with_options(quick_options());
        bridge.start();
        bridge.push("async");
        bridge.finish();

        assert_eq!(bridge.pull_async().await, Pulled::Token("async".to_string()));
        assert_eq!(bridge.pull_async().await, Pulled::End(StreamEnd::Finished));
    }

    #[tokio::test]
    async fn test_stream_collects_run() {
        let bridge = Arc::new(TokenBridge::with_options(quick_options()));
        let producer = Arc::clone(&bridge);

        tokio::spawn(async move {
            producer.start();
            for token in ["Hello", ", ", "world"] {
                producer.push(token);
                tokio::task::yield_now().await;
            }
            producer.finish();
        });

        let tokens: Vec<String> = bridge.stream().collect().await;
        assert_eq!(tokens.concat(), "Hello, world");
    }
}
