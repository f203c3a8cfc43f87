//! Interrupt queue shared between the CPU and its devices.
//!
//! The DCPU-16 does not have a level-sensitive IRQ line. Instead every
//! interrupt is a *message*: a single word queued for delivery. Devices (and
//! the `INT` instruction) enqueue messages; the CPU dequeues at most one per
//! instruction boundary.
//!
//! # Threading Model
//!
//! The queue is the single synchronization point between the CPU thread and
//! independently running device loops (a clock's ticker thread, a host thread
//! feeding keystrokes). It is a bounded FIFO behind one `Mutex`. Producers hold
//! an [`InterruptLine`], a cheap cloneable handle that can only enqueue.
//!
//! # Overflow Policy
//!
//! The queue holds at most `capacity` messages (256 by default). Raising into a
//! full queue drops the *new* message and returns
//! [`InterruptError::QueueFull`]; messages already queued are never displaced,
//! so delivery order always equals arrival order.
//!
//! # Example
//!
//! ```rust
//! use libdcpu16::InterruptController;
//!
//! let controller = InterruptController::new(2);
//! let line = controller.line_for_device(0);
//!
//! line.raise(0x0010).unwrap();
//! line.raise(0x0011).unwrap();
//! assert!(line.raise(0x0012).is_err()); // full, newest dropped
//!
//! assert_eq!(controller.poll().map(|i| i.message), Some(0x0010));
//! assert_eq!(controller.poll().map(|i| i.message), Some(0x0011));
//! assert_eq!(controller.poll(), None);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Default interrupt queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Where a queued interrupt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSource {
    /// Raised by the `INT` instruction.
    Software,
    /// Raised by the device at this bus index.
    Device(u16),
    /// Raised by the embedding host.
    Host,
}

/// A queued interrupt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupt {
    /// Payload placed in register A on delivery
    pub message: u16,
    /// Sender of the message
    pub source: InterruptSource,
}

/// Errors raised when enqueueing an interrupt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterruptError {
    /// The queue already holds `capacity` messages; `message` was dropped.
    #[error("interrupt queue full ({capacity} pending), dropped message 0x{message:04X}")]
    QueueFull {
        /// The dropped message
        message: u16,
        /// Queue capacity
        capacity: usize,
    },
}

struct Queue {
    pending: Mutex<VecDeque<Interrupt>>,
    capacity: usize,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Interrupt>> {
        // A producer that panicked mid-push cannot leave the deque torn.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, interrupt: Interrupt) -> Result<(), InterruptError> {
        let mut pending = self.lock();
        if pending.len() >= self.capacity {
            return Err(InterruptError::QueueFull {
                message: interrupt.message,
                capacity: self.capacity,
            });
        }
        pending.push_back(interrupt);
        Ok(())
    }
}

/// Bounded FIFO of pending interrupt messages, owned by the CPU.
pub struct InterruptController {
    queue: Arc<Queue>,
}

impl InterruptController {
    /// Creates an empty controller holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(Queue {
                pending: Mutex::new(VecDeque::with_capacity(
                    capacity.min(DEFAULT_QUEUE_CAPACITY),
                )),
                capacity,
            }),
        }
    }

    /// Enqueues a message.
    pub fn raise(&self, message: u16, source: InterruptSource) -> Result<(), InterruptError> {
        self.queue.push(Interrupt { message, source })
    }

    /// Dequeues the oldest pending message, if any.
    pub fn poll(&self) -> Option<Interrupt> {
        self.queue.lock().pop_front()
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true if no messages are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Maximum number of pending messages.
    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }

    /// Discards every pending message.
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Returns a producer handle that tags messages with a device index.
    pub fn line_for_device(&self, index: u16) -> InterruptLine {
        InterruptLine {
            queue: Arc::clone(&self.queue),
            source: InterruptSource::Device(index),
        }
    }

    /// Returns a producer handle for the embedding host.
    pub fn host_line(&self) -> InterruptLine {
        InterruptLine {
            queue: Arc::clone(&self.queue),
            source: InterruptSource::Host,
        }
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl std::fmt::Debug for InterruptController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptController")
            .field("pending", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Cloneable, thread-safe handle that can only enqueue interrupts.
///
/// Devices receive one at attach time through
/// [`Device::connect`](crate::Device::connect); it is the only standing
/// reference a device may hold into the CPU.
#[derive(Clone)]
pub struct InterruptLine {
    queue: Arc<Queue>,
    source: InterruptSource,
}

impl InterruptLine {
    /// Enqueues `message`, tagged with this line's source.
    pub fn raise(&self, message: u16) -> Result<(), InterruptError> {
        self.queue.push(Interrupt {
            message,
            source: self.source,
        })
    }

    /// Source tag applied to messages raised on this line.
    pub fn source(&self) -> InterruptSource {
        self.source
    }
}

impl std::fmt::Debug for InterruptLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptLine")
            .field("source", &self.source)
            .finish()
    }
}
