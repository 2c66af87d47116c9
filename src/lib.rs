#![no_std]

pub mod anim;
pub mod color;
pub mod command;
pub mod engine;
pub mod layout;
pub mod math8;
pub mod noise;
pub mod queue;

pub use anim::{Animation, AnimationKind, ColorSource, SourceSlot};
pub use color::{Color, Rgb};
pub use command::{Command, CommandChannel, CommandReceiver, CommandSender};
pub use engine::{AnimationEngine, FrameParams, QUEUE_DEPTH, StartupConfig};
pub use layout::{KeyMask, KeyPoint, LayoutProvider, Point};
pub use queue::AnimQueue;

pub use embassy_time::{Duration, Instant};

/// Abstract LED matrix driver trait
///
/// Implement this trait to bridge the engine to the keyboard's LED
/// hardware and its persisted settings. The engine is a pure consumer:
/// it reads the global settings and writes one color per LED per frame,
/// already scaled by the global brightness.
pub trait MatrixDriver {
    /// Write one LED's color for this frame.
    fn set_color(&mut self, led: u8, color: Color);

    /// The matrix's configured ambient color.
    fn default_color(&self) -> Color;

    /// Global brightness setting (0-255).
    fn brightness(&self) -> u8;

    /// Global animation speed setting (0-255).
    fn speed(&self) -> u8;

    /// Whether the LED subsystem is enabled at all.
    fn is_enabled(&self) -> bool;

    /// Tell the host how far rendering got; returns whether the full
    /// visible range has been serviced this frame.
    fn check_finished_range(&mut self, last_led: u8) -> bool;
}
