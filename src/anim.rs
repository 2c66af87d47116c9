//! Animation descriptors
//!
//! An [`Animation`] is one queued effect's complete parameter set: what
//! kind of effect it is, where it starts, when it becomes active, and up
//! to four color sources (base/result, inside/outside the key mask). It is
//! a plain `Copy` value; all evaluation state lives in the engine.

use embassy_time::{Duration, Instant};

use crate::color::Color;
use crate::layout::KeyMask;

/// General behavior of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    /// Set one key to a solid color
    SolidKey,
    /// Set all keys to a solid color
    SolidAll,
    /// Continuously shifting color noise; never finishes on its own
    Shimmer,
    /// Ring expanding outward from an origin LED, changing colors as it
    /// passes
    Wave,
}

/// Where an animation gets a color from when it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// A fixed color
    Fixed(Color),
    /// The matrix's configured ambient color
    MatrixDefault,
    /// Whatever is already composed at this LED this frame
    Transparent,
    /// A random color, stable once committed to the base state
    Random,
    /// A static noise pattern frozen at the animation's start tick
    Noise,
    /// Time-varying shimmer noise
    Shimmer,
}

/// The four color slots of a descriptor.
///
/// `Base` paints while the animation runs, `Result` is what a wave leaves
/// behind. The `*Unmasked` pair applies to keys outside the key mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSlot {
    Base,
    Result,
    BaseUnmasked,
    ResultUnmasked,
}

impl SourceSlot {
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Result => 1,
            Self::BaseUnmasked => 2,
            Self::ResultUnmasked => 3,
        }
    }

    /// Slot to use instead when the LED is outside the key mask.
    pub(crate) const fn unmasked(self) -> Self {
        match self {
            Self::Base => Self::BaseUnmasked,
            Self::Result => Self::ResultUnmasked,
            // Already on the unmasked pair; fall back to the base color
            _ => Self::Base,
        }
    }
}

/// One queued animation's complete parameter set.
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub kind: AnimationKind,
    /// LED a wave expands from; also the target of single-key fills
    pub origin_led: u8,
    /// Set once a one-shot animation has reached its terminal frame
    pub done: bool,
    /// Tick at which the animation becomes active
    pub start_time: Instant,
    /// Keys the animation moves over; `None` means all of them
    pub mask: Option<KeyMask>,
    sources: [ColorSource; 4],
}

impl Animation {
    const fn with_kind(kind: AnimationKind, origin_led: u8, now: Instant) -> Self {
        Self {
            kind,
            origin_led,
            done: false,
            start_time: now,
            mask: None,
            sources: [
                ColorSource::Transparent,
                ColorSource::Transparent,
                ColorSource::Transparent,
                ColorSource::Transparent,
            ],
        }
    }

    /// Clear the whole matrix to off.
    pub const fn clear(now: Instant) -> Self {
        Self::solid(Color::OFF, now)
    }

    /// Clear a single key to off.
    pub const fn clear_key(led: u8, now: Instant) -> Self {
        Self::solid_key(led, Color::OFF, now)
    }

    /// Fill the whole matrix with one color.
    pub const fn solid(color: Color, now: Instant) -> Self {
        let mut anim = Self::with_kind(AnimationKind::SolidAll, 0, now);
        anim.sources[0] = ColorSource::Fixed(color);
        anim
    }

    /// Fill a single key with one color.
    pub const fn solid_key(led: u8, color: Color, now: Instant) -> Self {
        let mut anim = Self::with_kind(AnimationKind::SolidKey, led, now);
        anim.sources[0] = ColorSource::Fixed(color);
        anim
    }

    /// A wave that passes over the matrix and restores what was there.
    pub const fn wave(origin_led: u8, wave_color: ColorSource, now: Instant) -> Self {
        let mut anim = Self::with_kind(AnimationKind::Wave, origin_led, now);
        anim.sources[0] = wave_color;
        anim
    }

    /// A wave that leaves its own color behind.
    pub const fn wave_solid(origin_led: u8, wave_color: ColorSource, now: Instant) -> Self {
        let mut anim = Self::with_kind(AnimationKind::Wave, origin_led, now);
        anim.sources[0] = wave_color;
        anim.sources[1] = wave_color;
        anim
    }

    /// A wave of one color that turns everything it passes into another.
    pub const fn wave_to(
        origin_led: u8,
        wave_color: ColorSource,
        result_color: ColorSource,
        now: Instant,
    ) -> Self {
        let mut anim = Self::with_kind(AnimationKind::Wave, origin_led, now);
        anim.sources[0] = wave_color;
        anim.sources[1] = result_color;
        anim
    }

    /// Shimmering color noise over the whole matrix.
    pub const fn shimmer(now: Instant) -> Self {
        let mut anim = Self::with_kind(AnimationKind::Shimmer, 0, now);
        anim.sources[0] = ColorSource::Shimmer;
        anim
    }

    /// Restrict the animation to the keys of `mask`.
    #[must_use]
    pub const fn with_mask(mut self, mask: KeyMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Colors for keys outside the mask while the animation runs and after
    /// it finishes.
    #[must_use]
    pub const fn with_unmasked(mut self, base: ColorSource, result: ColorSource) -> Self {
        self.sources[2] = base;
        self.sources[3] = result;
        self
    }

    /// Delay the start by `delay` past the descriptor's current start time.
    #[must_use]
    pub fn delayed_by(mut self, delay: Duration) -> Self {
        self.start_time += delay;
        self
    }

    pub const fn source(&self, slot: SourceSlot) -> ColorSource {
        self.sources[slot.index()]
    }

    pub const fn set_source(&mut self, slot: SourceSlot, source: ColorSource) {
        self.sources[slot.index()] = source;
    }

    /// Whether the animation paints every LED with something opaque.
    ///
    /// Animations with a `Transparent` hole can show the entries queued
    /// before them, so they must not become the new base state.
    pub(crate) const fn is_opaque(&self) -> bool {
        let masked = self.mask.is_some();
        let base_opaque = !matches!(self.sources[0], ColorSource::Transparent)
            && (!masked || !matches!(self.sources[2], ColorSource::Transparent));

        match self.kind {
            AnimationKind::Wave => {
                base_opaque
                    && !matches!(self.sources[1], ColorSource::Transparent)
                    && (!masked || !matches!(self.sources[3], ColorSource::Transparent))
            }
            _ => base_opaque,
        }
    }

    /// Color held by keys outside the mask while a shimmer runs.
    ///
    /// This is the stored unmasked-base payload, not a resolved source;
    /// special sources placed there act as "off".
    pub(crate) const fn unmasked_hold_color(&self) -> Color {
        match self.sources[2] {
            ColorSource::Fixed(color) => color,
            _ => Color::OFF,
        }
    }

    /// Turn a finished wave into a standalone shimmer in place: the result
    /// colors become the running colors, and the new result is off.
    pub(crate) const fn into_shimmer(mut self) -> Self {
        self.kind = AnimationKind::Shimmer;
        self.done = false;
        self.sources[0] = self.sources[1];
        self.sources[2] = self.sources[3];
        self.sources[1] = ColorSource::Fixed(Color::OFF);
        self.sources[3] = ColorSource::Fixed(Color::OFF);
        self
    }
}
