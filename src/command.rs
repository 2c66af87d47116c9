//! Producer-side command channel
//!
//! Key handlers, layer hooks and shutdown paths run outside the rendering
//! tick (possibly in interrupt context), so they post commands through a
//! bounded channel built on `critical-section` and `heapless::Deque`. The
//! engine drains pending commands at the start of each frame.
//!
//! A failed send is a dropped visual effect, never an error path worth
//! propagating.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::anim::Animation;
use crate::engine::StartupConfig;

/// A request for the animation engine, posted from outside the render tick.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Queue an animation behind everything currently playing
    Add(Animation),
    /// Drop all animations and clear both color buffers
    Reset,
    /// Play the staggered boot sequence
    Startup(StartupConfig),
}

/// Error returned when trying to send to a full channel.
#[derive(Debug, Clone, Copy)]
pub struct TrySendError(pub Command);

/// Error returned when trying to receive from an empty channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReceiveError;

/// Bounded, interrupt-safe command channel.
///
/// Synchronization is a critical section, so senders may live in interrupt
/// handlers. Intended use is one static channel per engine.
pub struct CommandChannel<const SIZE: usize> {
    inner: Mutex<RefCell<Deque<Command, SIZE>>>,
}

impl<const SIZE: usize> CommandChannel<SIZE> {
    /// Create a new empty channel.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Get a sender handle for this channel.
    ///
    /// Multiple senders can coexist; they share access to the same queue.
    pub const fn sender(&self) -> CommandSender<'_, SIZE> {
        CommandSender { channel: self }
    }

    /// Get the receiver handle for this channel.
    pub const fn receiver(&self) -> CommandReceiver<'_, SIZE> {
        CommandReceiver { channel: self }
    }

    fn try_send(&self, command: Command) -> Result<(), TrySendError> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.push_back(command).map_err(TrySendError)
        })
    }

    fn try_receive(&self) -> Result<Command, TryReceiveError> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.pop_front().ok_or(TryReceiveError)
        })
    }
}

impl<const SIZE: usize> Default for CommandChannel<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// A sender handle for a [`CommandChannel`].
#[derive(Clone, Copy)]
pub struct CommandSender<'a, const SIZE: usize> {
    channel: &'a CommandChannel<SIZE>,
}

impl<const SIZE: usize> CommandSender<'_, SIZE> {
    /// Try to post a command.
    ///
    /// Returns `Err(TrySendError(command))` if the channel is full.
    pub fn try_send(&self, command: Command) -> Result<(), TrySendError> {
        self.channel.try_send(command)
    }
}

/// The receiver handle for a [`CommandChannel`], held by the engine.
#[derive(Clone, Copy)]
pub struct CommandReceiver<'a, const SIZE: usize> {
    channel: &'a CommandChannel<SIZE>,
}

impl<const SIZE: usize> CommandReceiver<'_, SIZE> {
    /// Try to take the next pending command.
    pub fn try_receive(&self) -> Result<Command, TryReceiveError> {
        self.channel.try_receive()
    }
}
