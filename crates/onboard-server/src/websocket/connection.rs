//! One live client session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use onboard_auth::Identity;
use onboard_core::ClientId;
use onboard_employees::Employee;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A registered websocket client.
///
/// The session owns the sending half of its outbound queue; the socket
/// writer task owns the receiving half. Writing to one session never
/// touches another session's queue.
pub struct Session {
    id: ClientId,
    identity: Identity,
    tx: mpsc::Sender<Arc<String>>,
    connected_at: Instant,
    is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    dropped_messages: AtomicU64,
    employee: Mutex<Option<Employee>>,
}

impl Session {
    /// Create a session writing into `tx`.
    pub fn new(id: ClientId, identity: Identity, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            identity,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
            employee: Mutex::new(None),
        }
    }

    /// Client-chosen ID.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Who opened the session.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Enqueue a serialized frame.
    ///
    /// Returns `false` when the queue is full or the writer is gone, and
    /// counts the drop.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Frames dropped so far.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Employee found by the last successful lookup on this session.
    pub fn employee(&self) -> Option<Employee> {
        self.employee.lock().clone()
    }

    /// Remember (or forget, with `None`) the employee being onboarded.
    pub fn set_employee(&self, employee: Option<Employee>) {
        *self.employee.lock() = employee;
    }

    /// Record inbound activity.
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Check and reset the alive flag.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Time since the last pong or other activity.
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Session age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("username", &self.identity.username)
            .field("dropped_messages", &self.drop_count())
            .finish_non_exhaustive()
    }
}
