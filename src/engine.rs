//! Frame compositor
//!
//! The engine owns a fixed-depth queue of animation descriptors and
//! resolves it into per-LED colors once per rendering tick. The queue is
//! ordered oldest-first: the front entry paints first, later entries paint
//! on top. Two parallel buffers track the result: `base_state` is the
//! agreed resting color of every LED, `calc_state` is the working buffer
//! rebuilt from it each frame and handed to the driver.
//!
//! Everything is single-owner and runs on the firmware's rendering tick;
//! no allocation happens after construction.

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::MatrixDriver;
use crate::anim::{Animation, AnimationKind, ColorSource, SourceSlot};
use crate::color::{Color, channel_color};
use crate::command::{Command, CommandReceiver};
use crate::layout::{KeyMask, KeyPoint, LayoutProvider, Point};
use crate::math8::{ease_in_out_quad, map8, qmul8, scale8, scale16by8, sqrt16};
use crate::noise::drifting_noise;
use crate::queue::AnimQueue;

/// Depth of the animation queue.
pub const QUEUE_DEPTH: usize = 16;

/// Band thickness of a wave in layout units; keys are ~10 units apart.
const WAVE_THICKNESS: u8 = 23;
const WAVE_THICKNESS_FACTOR: u8 = 255 / WAVE_THICKNESS + 1;

/// A wave travels for at most 400 ms (after speed scaling), in q16.
const WAVE_TRAVEL_Q16: u32 = 400 << 16;

/// 255 / 400 in q16: converts the capped travel time into a layout-unit
/// radius. The product with `WAVE_TRAVEL_Q16` stays below 2^40, so the
/// 64-bit intermediate cannot overflow.
const WAVE_RADIUS_SCALE_Q16: u32 = 0xA333;

/// What the compositor must do with a queue entry after evaluating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Leave the entry in place
    Keep,
    /// Remove the entry if it is the front one
    EvictIfFirst,
    /// The entry became the new base: drop it and everything before it
    CommitNewBase,
    /// Drop everything before the entry but keep the entry itself
    PromoteToFront,
    /// Replace the entry (and everything before it) with a standalone
    /// shimmer at the front
    BecomeShimmer,
}

/// Batch window for one `update` call.
///
/// Hosts with large matrices render in slices; `led_min..led_max` is the
/// slice serviced this call.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub led_min: u8,
    pub led_max: u8,
}

/// Origins and masks of the staggered boot sequence.
#[derive(Debug, Clone, Copy)]
pub struct StartupConfig {
    /// Origin of the opening wave (runs over `border_mask` keys)
    pub first_origin: u8,
    /// Origin of the second wave (runs over `field_mask` keys)
    pub second_origin: u8,
    /// Origin of the three closing waves
    pub cleanup_origin: u8,
    pub border_mask: Option<KeyMask>,
    pub field_mask: Option<KeyMask>,
}

/// Tiny 16-bit LCG feeding the random color source.
#[derive(Debug, Clone)]
struct Rand8 {
    seed: u16,
}

impl Rand8 {
    const fn new() -> Self {
        Self { seed: 1337 }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> u8 {
        self.seed = self.seed.wrapping_mul(2053).wrapping_add(13849);
        (self.seed ^ (self.seed >> 8)) as u8
    }
}

/// The animation engine: queue, color buffers and layout tables.
///
/// `LED_COUNT` is the number of LEDs on the board (at most 255);
/// `COMMAND_CHANNEL_SIZE` the depth of the producer command channel.
pub struct AnimationEngine<'a, D, const LED_COUNT: usize, const COMMAND_CHANNEL_SIZE: usize> {
    driver: D,
    commands: CommandReceiver<'a, COMMAND_CHANNEL_SIZE>,

    queue: AnimQueue<Animation, QUEUE_DEPTH>,
    base_state: [Color; LED_COUNT],
    calc_state: [Color; LED_COUNT],

    // Layout tables, built once at construction
    points: [Point; LED_COUNT],
    reverse_map: [KeyPoint; LED_COUNT],

    rand: Rand8,
}

impl<'a, D: MatrixDriver, const LED_COUNT: usize, const COMMAND_CHANNEL_SIZE: usize>
    AnimationEngine<'a, D, LED_COUNT, COMMAND_CHANNEL_SIZE>
{
    /// Create a new engine.
    ///
    /// Consumes the layout once: per-LED positions and the reverse
    /// LED-to-key map are precomputed here and never change afterwards.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        driver: D,
        commands: CommandReceiver<'a, COMMAND_CHANNEL_SIZE>,
        layout: &impl LayoutProvider,
    ) -> Self {
        let mut points = [Point::default(); LED_COUNT];
        for (led, point) in points.iter_mut().enumerate() {
            *point = layout.position(led as u8);
        }

        let mut reverse_map = [KeyPoint::default(); LED_COUNT];
        for row in 0..layout.rows() {
            for col in 0..layout.cols() {
                if let Some(led) = layout.led_at(row, col) {
                    if let Some(entry) = reverse_map.get_mut(usize::from(led)) {
                        *entry = KeyPoint { row, col };
                    }
                }
            }
        }

        Self {
            driver,
            commands,
            queue: AnimQueue::new(),
            base_state: [Color::OFF; LED_COUNT],
            calc_state: [Color::OFF; LED_COUNT],
            points,
            reverse_map,
            rand: Rand8::new(),
        }
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Number of animations currently queued.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Reset state and play the boot sequence.
    pub fn init(&mut self, config: StartupConfig, now: Instant) {
        self.reset();
        self.add_startup_animation(config, now);
    }

    /// Drop all animations without finalizing them and clear both color
    /// buffers.
    pub fn reset(&mut self) {
        while self.queue.pop_front().is_some() {}
        self.base_state = [Color::OFF; LED_COUNT];
        self.calc_state = [Color::OFF; LED_COUNT];
    }

    /// Queue an animation behind everything currently playing.
    ///
    /// When the queue is full the oldest entry is evaluated one last time
    /// with its finish forced, so its result color settles instead of the
    /// effect vanishing mid-flight.
    pub fn add_animation(&mut self, animation: Animation, now: Instant) {
        if self.queue.is_full() {
            #[cfg(feature = "esp32-log")]
            println!("[AnimationEngine.add_animation] queue full, finalizing oldest");
            if let Some(mut oldest) = self.queue.pop_front() {
                let _ = self.apply_animation(&mut oldest, true, true, now);
            }
        }
        self.queue.push_back(animation);
    }

    /// Queue the five waves of the boot sequence.
    pub fn add_startup_animation(&mut self, config: StartupConfig, now: Instant) {
        let mut first = Animation::wave_solid(config.first_origin, ColorSource::Shimmer, now);
        if let Some(mask) = config.border_mask {
            first = first.with_mask(mask);
        }
        self.add_animation(first, now);

        let mut second = Animation::wave_solid(config.second_origin, ColorSource::Shimmer, now)
            .with_unmasked(
                ColorSource::Fixed(Color::OFF),
                ColorSource::Fixed(Color::OFF),
            )
            .delayed_by(Duration::from_millis(800));
        if let Some(mask) = config.field_mask {
            second = second.with_mask(mask);
        }
        self.add_animation(second, now);

        let cleanup = Animation::wave_solid(
            config.cleanup_origin,
            ColorSource::Fixed(Color::OFF),
            now,
        )
        .delayed_by(Duration::from_millis(1600));
        self.add_animation(cleanup, now);

        let sparkle = Animation::wave_solid(config.cleanup_origin, ColorSource::Shimmer, now)
            .delayed_by(Duration::from_millis(1800));
        self.add_animation(sparkle, now);

        let blackout = Animation::wave_solid(
            config.cleanup_origin,
            ColorSource::Fixed(Color::OFF),
            now,
        )
        .delayed_by(Duration::from_millis(2000));
        self.add_animation(blackout, now);
    }

    /// Run one frame.
    ///
    /// Drains pending commands, composes the queue into `calc_state` and
    /// writes the slice given by `params` to the driver, value-scaled by
    /// the global brightness. Returns whether the full visible range has
    /// been serviced. When the matrix is disabled the pass is skipped and
    /// only the range signal is reported.
    pub fn update(&mut self, params: FrameParams, now: Instant) -> bool {
        self.drain_commands(now);

        if !self.driver.is_enabled() {
            return self.driver.check_finished_range(params.led_max);
        }

        self.calc_state = self.base_state;
        self.walk_queue(now);
        self.write_frame(params)
    }

    fn drain_commands(&mut self, now: Instant) {
        while let Ok(command) = self.commands.try_receive() {
            match command {
                Command::Add(animation) => self.add_animation(animation, now),
                Command::Reset => self.reset(),
                Command::Startup(config) => self.add_startup_animation(config, now),
            }
        }
    }

    /// Walk the queue front to back, applying each entry's outcome.
    ///
    /// `index` and `remaining` are recomputed together in every arm, so no
    /// intermediate value can go out of range when entries are removed
    /// mid-walk.
    fn walk_queue(&mut self, now: Instant) {
        let mut index = 0usize;
        let mut remaining = self.queue.len();

        while index < remaining {
            let Some(&entry) = self.queue.at(index) else {
                index += 1;
                continue;
            };
            let mut anim = entry;
            let outcome = self.apply_animation(&mut anim, index == 0, false, now);

            match outcome {
                Outcome::Keep => {
                    self.write_back(index, anim);
                    index += 1;
                }
                Outcome::EvictIfFirst => {
                    if index == 0 {
                        let _ = self.queue.pop_front();
                        remaining -= 1;
                    } else {
                        self.write_back(index, anim);
                        index += 1;
                    }
                }
                Outcome::CommitNewBase => {
                    for _ in 0..=index {
                        let _ = self.queue.pop_front();
                    }
                    remaining -= index + 1;
                    index = 0;
                }
                Outcome::PromoteToFront => {
                    for _ in 0..index {
                        let _ = self.queue.pop_front();
                    }
                    remaining -= index;
                    self.write_back(0, anim);
                    index = 1;
                }
                Outcome::BecomeShimmer => {
                    for _ in 0..=index {
                        let _ = self.queue.pop_front();
                    }
                    // One entry is re-inserted, so only `index` net removals
                    remaining -= index;
                    self.queue.push_front(anim.into_shimmer());
                    index = 1;
                }
            }
        }
    }

    /// Store the (possibly mutated) descriptor back into its slot.
    fn write_back(&mut self, index: usize, anim: Animation) {
        if let Some(slot) = self.queue.at_mut(index) {
            *slot = anim;
        }
    }

    /// Evaluate one animation for this frame.
    ///
    /// `first` marks the front of the queue; `finish` forces the animation
    /// to its terminal frame (used when evicting on overflow).
    fn apply_animation(
        &mut self,
        anim: &mut Animation,
        first: bool,
        finish: bool,
        now: Instant,
    ) -> Outcome {
        // Not active yet
        if now < anim.start_time {
            return Outcome::Keep;
        }

        let finish = finish || anim.done;

        // Whether this entry may replace the base state: either nothing
        // paints below it, or it has no transparent holes to show them
        // through.
        let new_base = first || anim.is_opaque();

        match anim.kind {
            AnimationKind::SolidKey => {
                let led = usize::from(anim.origin_led);
                if led < LED_COUNT {
                    let color = self.resolve(anim, led, SourceSlot::Base, now);
                    self.calc_state[led] = color;
                    if new_base {
                        self.base_state[led] = color;
                    }
                }
                Outcome::EvictIfFirst
            }
            AnimationKind::SolidAll => {
                for led in 0..LED_COUNT {
                    let color = self.resolve(anim, led, SourceSlot::Base, now);
                    self.calc_state[led] = color;
                    if new_base {
                        self.base_state[led] = color;
                    }
                }
                if new_base {
                    Outcome::CommitNewBase
                } else {
                    Outcome::Keep
                }
            }
            AnimationKind::Shimmer => {
                let t = self.shimmer_time(now);
                for led in 0..LED_COUNT {
                    if self.led_in_mask(anim, led) {
                        let point = self.points[led];
                        self.calc_state[led] =
                            channel_color(drifting_noise(point.x, point.y, t));
                    } else {
                        self.calc_state[led] = anim.unmasked_hold_color();
                    }
                }
                // Loops until something replaces it; at most claim the
                // front of the queue
                if new_base && !first {
                    Outcome::PromoteToFront
                } else {
                    Outcome::Keep
                }
            }
            AnimationKind::Wave => self.apply_wave(anim, new_base, finish, now),
        }
    }

    /// Evaluate one frame of an expanding wave.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    fn apply_wave(
        &mut self,
        anim: &mut Animation,
        new_base: bool,
        finish: bool,
        now: Instant,
    ) -> Outcome {
        let elapsed_ms = now.duration_since(anim.start_time).as_millis();
        let scaled = scale16by8(elapsed_ms as u16, self.driver.speed());
        let mut active_for = u32::from(scaled) << 16;

        // Guarantees safe passage + stoppage
        if active_for >= WAVE_TRAVEL_Q16 || finish {
            active_for = WAVE_TRAVEL_Q16;
        }

        // q16 travel time down to an integer layout-unit radius
        let radius =
            ((u64::from(active_for) * u64::from(WAVE_RADIUS_SCALE_Q16)) >> 32) as i32;

        let origin = self
            .points
            .get(usize::from(anim.origin_led))
            .copied()
            .unwrap_or_default();

        let mut any_left = false;

        for led in 0..LED_COUNT {
            let point = self.points[led];
            let dx = i32::from(point.x) - i32::from(origin.x);
            let dy = i32::from(point.y) - i32::from(origin.y);
            // Distance to the origin; coordinates are bounded to 224x64
            // layout units, so the squared distance fits 16 bits
            let dist = i32::from(sqrt16((dx * dx + dy * dy) as u16));
            // Distance to the wave band; shrinks, then grows again
            let band_offset = (dist - radius).unsigned_abs() as u8;

            let in_wave = band_offset < WAVE_THICKNESS;
            let inside_radius = radius > dist;

            if in_wave || !inside_radius {
                any_left = true;
            }

            // The blend level resets at the band center: outside it blends
            // from the current frame color into the wave color, inside it
            // blends from the wave color into the result color.
            let level = if in_wave {
                if inside_radius {
                    ease_in_out_quad(qmul8(band_offset, WAVE_THICKNESS_FACTOR))
                } else {
                    ease_in_out_quad(255 - qmul8(band_offset, WAVE_THICKNESS_FACTOR))
                }
            } else if inside_radius {
                255
            } else {
                0
            };

            let (mut current, mut target) = if inside_radius {
                (
                    self.resolve(anim, led, SourceSlot::Base, now),
                    self.resolve(anim, led, SourceSlot::Result, now),
                )
            } else {
                (
                    self.calc_state[led],
                    self.resolve(anim, led, SourceSlot::Base, now),
                )
            };

            // When one endpoint is off, fade through the other endpoint's
            // hue and saturation instead of through black
            if current.is_off() && !target.is_off() {
                current = Color { val: 0, ..target };
            } else if !current.is_off() && target.is_off() {
                target = Color { val: 0, ..current };
            }

            let mut blended = Color::new(
                map8(level, current.hue, target.hue),
                map8(level, current.sat, target.sat),
                map8(level, current.val, target.val),
            );
            if blended.val == 0 {
                blended.hue = 0;
                blended.sat = 0;
            }
            self.calc_state[led] = blended;
        }

        if !any_left || active_for == WAVE_TRAVEL_Q16 {
            anim.done = true;

            if matches!(anim.source(SourceSlot::Result), ColorSource::Shimmer) {
                return Outcome::BecomeShimmer;
            }

            for led in 0..LED_COUNT {
                let color = self.resolve(anim, led, SourceSlot::Result, now);
                self.calc_state[led] = color;
                if new_base {
                    self.base_state[led] = color;
                }
            }
            return if new_base {
                Outcome::CommitNewBase
            } else {
                Outcome::Keep
            };
        }

        Outcome::Keep
    }

    /// Resolve one color slot of an animation for one LED.
    #[allow(clippy::cast_possible_truncation)]
    fn resolve(
        &mut self,
        anim: &Animation,
        led: usize,
        slot: SourceSlot,
        now: Instant,
    ) -> Color {
        let slot = if self.led_in_mask(anim, led) {
            slot
        } else {
            slot.unmasked()
        };

        match anim.source(slot) {
            ColorSource::Fixed(color) => color,
            ColorSource::MatrixDefault => self.driver.default_color(),
            ColorSource::Transparent => self.calc_state[led],
            ColorSource::Random => channel_color(self.rand.next()),
            ColorSource::Noise => {
                // Static pattern: time is frozen at the start tick
                let point = self.points[led];
                let t = (anim.start_time.as_millis() as u32).wrapping_shl(16);
                channel_color(drifting_noise(point.x, point.y, t))
            }
            ColorSource::Shimmer => {
                let point = self.points[led];
                channel_color(drifting_noise(point.x, point.y, self.shimmer_time(now)))
            }
        }
    }

    /// Shared shimmer time base, scaled by the global speed setting.
    #[allow(clippy::cast_possible_truncation)]
    fn shimmer_time(&self, now: Instant) -> u32 {
        let t = (now.as_millis() >> 5) as u32;
        ((u64::from(t) * (1 + u64::from(self.driver.speed()))) >> 8) as u32
    }

    fn led_in_mask(&self, anim: &Animation, led: usize) -> bool {
        match anim.mask {
            None => true,
            Some(mask) => mask.contains(self.reverse_map[led]),
        }
    }

    /// Push the composed frame slice into the driver.
    #[allow(clippy::cast_possible_truncation)]
    fn write_frame(&mut self, params: FrameParams) -> bool {
        let brightness = self.driver.brightness();
        let first = usize::from(params.led_min);
        let last = usize::from(params.led_max).min(LED_COUNT);

        for led in first..last {
            let mut color = self.calc_state[led];
            color.val = scale8(color.val, brightness);
            self.driver.set_color(led as u8, color);
        }

        self.driver.check_finished_range(params.led_max)
    }
}
