//! Interactive handshake between the scheduler and the input boundary
//!
//! The scheduler thread owns the game. An interactive player is a [`Seat`]
//! on the scheduler side and an [`InputHandle`] on the boundary side. The
//! scheduler publishes a [`Prompt`] and blocks until the boundary answers
//! with a [`Reply`]; the boundary never touches game state. Every blocking
//! wait can be broken by a [`CancelToken`].
//!
//! Every prompt carries a sequence number and replies echo it. When a
//! prompt times out it is withdrawn: the boundary never sees it again and a
//! late answer to it is dropped instead of landing on the next prompt.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hexfront_core::{Hex, Order, PlayerId, UnitId};
use tracing::{debug, warn};

/// What the scheduler is waiting for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// `unit` is ready; answer with an order (or end the turn)
    Unit {
        player: PlayerId,
        unit: UnitId,
        hex: Hex,
    },
    /// Every unit has been handled; confirm the end of the turn
    EndTurn { player: PlayerId },
}

/// The boundary's answer to a prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Order for the prompted unit; sending it completes the unit's action
    Order(Order),
    /// Finish the turn now
    EndTurn,
}

/// Messages arriving on a seat
#[derive(Debug)]
enum Signal {
    Reply { seq: u64, reply: Reply },
    Wake,
    Closed,
}

/// Why a blocked wait gave up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    Disconnected,
}

struct CancelInner {
    cancelled: AtomicBool,
    wakers: Mutex<Vec<Sender<Signal>>>,
}

/// Shared cancellation flag that also wakes every blocked seat
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                wakers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Set the flag and wake every waiter. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let wakers = self.inner.wakers.lock().unwrap_or_else(|e| e.into_inner());
        for waker in wakers.iter() {
            // A seat that is already gone needs no waking
            let _ = waker.send(Signal::Wake);
        }
    }

    fn register(&self, waker: Sender<Signal>) {
        self.inner
            .wakers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(waker);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Sequence number of the prompt still awaiting an answer, 0 for none
type OpenPrompt = Arc<AtomicU64>;

/// Scheduler side of an interactive player
pub struct Seat {
    prompts: Sender<(u64, Prompt)>,
    signals: Receiver<Signal>,
    cancel: CancelToken,
    open: OpenPrompt,
    last_seq: Cell<u64>,
}

/// Boundary side of an interactive player
pub struct InputHandle {
    prompts: Receiver<(u64, Prompt)>,
    replies: Sender<Signal>,
    open: OpenPrompt,
    /// Sequence of the prompt this side is answering
    answering: Cell<u64>,
}

/// Create a connected seat and input handle. Cancelling `cancel` wakes the seat.
pub fn seat(cancel: &CancelToken) -> (Seat, InputHandle) {
    let (prompt_tx, prompt_rx) = mpsc::channel();
    let (signal_tx, signal_rx) = mpsc::channel();
    cancel.register(signal_tx.clone());
    let open = OpenPrompt::default();
    (
        Seat {
            prompts: prompt_tx,
            signals: signal_rx,
            cancel: cancel.clone(),
            open: Arc::clone(&open),
            last_seq: Cell::new(0),
        },
        InputHandle {
            prompts: prompt_rx,
            replies: signal_tx,
            open,
            answering: Cell::new(0),
        },
    )
}

impl Seat {
    /// Publish a prompt to the boundary. It stays open until answered or
    /// withdrawn by a timeout.
    pub fn publish(&self, prompt: Prompt) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        let seq = self.last_seq.get() + 1;
        self.last_seq.set(seq);
        self.open.store(seq, Ordering::SeqCst);
        self.prompts.send((seq, prompt)).map_err(|_| {
            warn!("input boundary is gone, prompt {:?} dropped", prompt);
            Interrupted::Disconnected
        })
    }

    /// Block for the answer to the open prompt. `Ok(None)` means the
    /// timeout expired and the prompt was withdrawn. Answers to earlier
    /// prompts are discarded.
    pub fn wait_reply(&self, timeout: Option<Duration>) -> Result<Option<Reply>, Interrupted> {
        let expected = self.last_seq.get();
        let deadline = timeout.map(|limit| Instant::now() + limit);
        loop {
            let signal = match deadline {
                None => self.signals.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(at) => self.signals.recv_timeout(at.saturating_duration_since(Instant::now())),
            };
            if self.cancel.is_cancelled() {
                return Err(Interrupted::Cancelled);
            }
            match signal {
                Ok(Signal::Reply { seq, reply }) if seq == expected => {
                    self.open.store(0, Ordering::SeqCst);
                    return Ok(Some(reply));
                }
                Ok(Signal::Reply { seq, reply }) => {
                    debug!("dropping late {:?} to withdrawn prompt #{}", reply, seq);
                }
                Ok(Signal::Wake) => return Err(Interrupted::Cancelled),
                Err(RecvTimeoutError::Timeout) => {
                    debug!("prompt #{} timed out", expected);
                    self.open.store(0, Ordering::SeqCst);
                    return Ok(None);
                }
                Ok(Signal::Closed) | Err(RecvTimeoutError::Disconnected) => {
                    warn!("input boundary disconnected");
                    return Err(Interrupted::Disconnected);
                }
            }
        }
    }

    /// Publish a prompt and wait for its answer
    pub fn ask(&self, prompt: Prompt, timeout: Option<Duration>) -> Result<Option<Reply>, Interrupted> {
        self.publish(prompt)?;
        self.wait_reply(timeout)
    }
}

impl InputHandle {
    /// Block until the scheduler asks for something. Withdrawn prompts are
    /// skipped. `None` once the scheduler side is gone.
    pub fn next_prompt(&self) -> Option<Prompt> {
        loop {
            let (seq, prompt) = self.prompts.recv().ok()?;
            if let Some(prompt) = self.accept(seq, prompt) {
                return Some(prompt);
            }
        }
    }

    /// Like [`next_prompt`](Self::next_prompt) with a deadline
    pub fn next_prompt_timeout(&self, timeout: Duration) -> Option<Prompt> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let (seq, prompt) = self.prompts.recv_timeout(left).ok()?;
            if let Some(prompt) = self.accept(seq, prompt) {
                return Some(prompt);
            }
        }
    }

    fn accept(&self, seq: u64, prompt: Prompt) -> Option<Prompt> {
        if seq != self.open.load(Ordering::SeqCst) {
            debug!("skipping withdrawn prompt #{} {:?}", seq, prompt);
            return None;
        }
        self.answering.set(seq);
        Some(prompt)
    }

    /// Answer the last prompt received. Returns false if the scheduler is
    /// gone. An answer that arrives after the prompt was withdrawn is
    /// ignored by the scheduler.
    pub fn reply(&self, reply: Reply) -> bool {
        let seq = self.answering.get();
        self.replies.send(Signal::Reply { seq, reply }).is_ok()
    }

    pub fn order(&self, order: Order) -> bool {
        self.reply(Reply::Order(order))
    }

    pub fn end_turn(&self) -> bool {
        self.reply(Reply::EndTurn)
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        // The cancel token keeps the channel open, so say goodbye explicitly
        let _ = self.replies.send(Signal::Closed);
    }
}
