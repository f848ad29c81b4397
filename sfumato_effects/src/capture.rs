// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen-capture blur planning.
//!
//! A frosted-glass background needs GPU work no mesh pass can express:
//! copy the screen, shrink it, run the effect shader over it a few
//! times, and hand the result to the element as a texture. This module
//! plans that work without touching a GPU. [`CaptureBlur::plan`]
//! produces a [`CapturePlan`], an ordered list of acquire/blit/release
//! steps over named temporary targets, and the host's render backend
//! replays it against its own texture pool.
//!
//! Working buffers are sized by [`DesamplingRate`]: the screen size is
//! divided down and snapped per axis to the closest power of two, which
//! keeps repeated blur passes cheap and mip-friendly.

use alloc::vec::Vec;

use crate::filter::{BlurMode, ColorMode, ToneMode};
use crate::vertex::Rgba;

/// Downsampling factor for capture buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DesamplingRate {
    /// Keep the raw screen size.
    None,
    /// Snap to powers of two without dividing.
    #[default]
    X1,
    /// Half size.
    X2,
    /// Quarter size.
    X4,
    /// Eighth size.
    X8,
}

impl DesamplingRate {
    const fn divisor(self) -> Option<u32> {
        match self {
            Self::None => None,
            Self::X1 => Some(1),
            Self::X2 => Some(2),
            Self::X4 => Some(4),
            Self::X8 => Some(8),
        }
    }
}

/// Texture sampling mode for capture targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Bilinear sampling.
    #[default]
    Bilinear,
}

/// Power of two closest to `value`, ties rounding up.
fn closest_power_of_two(value: u32) -> u32 {
    if value <= 1 {
        return 1;
    }
    let next = value.next_power_of_two();
    let prev = next >> 1;
    if value - prev < next - value { prev } else { next }
}

/// Applies `rate` to a screen size, snapping each axis to the closest
/// power of two. [`DesamplingRate::None`] keeps the raw size.
#[must_use]
pub fn desampling_size(rate: DesamplingRate, width: u32, height: u32) -> (u32, u32) {
    match rate.divisor() {
        None => (width, height),
        Some(d) => (
            closest_power_of_two(width / d),
            closest_power_of_two(height / d),
        ),
    }
}

/// Temporary render targets a plan allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TempTarget {
    /// Full-size copy of the screen.
    ScreenCopy,
    /// First working buffer at reduction size.
    Ping,
    /// Second working buffer, used when iterating.
    Pong,
}

/// Where a blit reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlitSource {
    /// The live screen contents.
    Screen,
    /// A temporary target acquired earlier in the plan.
    Temp(TempTarget),
}

/// Where a blit writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlitDest {
    /// A temporary target acquired earlier in the plan.
    Temp(TempTarget),
    /// The plan's persistent result texture.
    Result,
}

/// One step of a capture plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureOp {
    /// Allocate a temporary target.
    Acquire {
        /// The buffer to allocate.
        target: TempTarget,
        /// Texture width in pixels.
        width: u32,
        /// Texture height in pixels.
        height: u32,
    },
    /// Copy `src` into `dst`, through the effect shader when `effect`
    /// is set.
    Blit {
        /// Read side.
        src: BlitSource,
        /// Write side.
        dst: BlitDest,
        /// Run the effect shader rather than a plain copy.
        effect: bool,
    },
    /// Free a temporary target.
    Release {
        /// The buffer to free.
        target: TempTarget,
    },
}

/// Size and sampling of the plan's result texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// Sampling mode.
    pub filter: FilterMode,
}

/// Uniforms the effect shader samples during effect blits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureUniforms {
    /// Tone strength in `0.0..=1.0`.
    pub tone_level: f32,
    /// Blur spread in `0.0..=4.0`, shared across iterations.
    pub blur: f32,
    /// Color for the color-blend modes.
    pub color: Rgba,
}

/// An ordered capture recipe for the render backend.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturePlan {
    /// The persistent texture the plan fills.
    pub result: TargetDesc,
    /// Shader uniforms for the effect blits.
    pub uniforms: CaptureUniforms,
    /// Steps in execution order.
    pub ops: Vec<CaptureOp>,
}

/// Screen-capture effect settings and planner.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureBlur {
    /// Tone strength in `0.0..=1.0`.
    pub tone_level: f32,
    /// Blur spread in `0.0..=4.0`.
    pub blur: f32,
    /// Tone treatment for the effect blits.
    pub tone_mode: ToneMode,
    /// Color blend for the effect blits.
    pub color_mode: ColorMode,
    /// Blur kernel for the effect blits.
    pub blur_mode: BlurMode,
    /// Color for the color-blend modes.
    pub effect_color: Rgba,
    /// Sizing of the result texture.
    pub desampling_rate: DesamplingRate,
    /// Sizing of the working buffers.
    pub reduction_rate: DesamplingRate,
    /// Sampling mode for all capture targets.
    pub filter_mode: FilterMode,
    /// Effect blit count, clamped to `1..=8` when planning.
    pub iterations: u32,
    /// Host hint: present the result at canvas size rather than the
    /// result texture's own size.
    pub keep_canvas_size: bool,
}

impl Default for CaptureBlur {
    fn default() -> Self {
        Self {
            tone_level: 1.0,
            blur: 1.0,
            tone_mode: ToneMode::None,
            color_mode: ColorMode::None,
            blur_mode: BlurMode::None,
            effect_color: Rgba::WHITE,
            desampling_rate: DesamplingRate::X1,
            reduction_rate: DesamplingRate::X1,
            filter_mode: FilterMode::Bilinear,
            iterations: 3,
            keep_canvas_size: true,
        }
    }
}

impl CaptureBlur {
    /// Returns `true` if any of the three modes does work.
    #[must_use]
    pub fn has_active_mode(&self) -> bool {
        self.tone_mode != ToneMode::None
            || self.color_mode != ColorMode::None
            || self.blur_mode != BlurMode::None
    }

    /// Builds the capture recipe for a screen of the given size.
    ///
    /// The screen is copied first so every later read samples a stable
    /// texture. With an active mode the copy is effect-blitted into a
    /// reduction-sized working buffer, then ping-ponged for the
    /// remaining iterations; otherwise the copy lands in the result
    /// unchanged.
    #[must_use]
    pub fn plan(&self, screen_width: u32, screen_height: u32) -> CapturePlan {
        let iterations = self.iterations.clamp(1, 8);
        let (result_w, result_h) =
            desampling_size(self.desampling_rate, screen_width, screen_height);
        let (work_w, work_h) = desampling_size(self.reduction_rate, screen_width, screen_height);

        let mut ops = Vec::new();
        ops.push(CaptureOp::Acquire {
            target: TempTarget::ScreenCopy,
            width: screen_width,
            height: screen_height,
        });
        ops.push(CaptureOp::Blit {
            src: BlitSource::Screen,
            dst: BlitDest::Temp(TempTarget::ScreenCopy),
            effect: false,
        });

        if self.has_active_mode() {
            ops.push(CaptureOp::Acquire {
                target: TempTarget::Ping,
                width: work_w,
                height: work_h,
            });
            ops.push(CaptureOp::Blit {
                src: BlitSource::Temp(TempTarget::ScreenCopy),
                dst: BlitDest::Temp(TempTarget::Ping),
                effect: true,
            });
            ops.push(CaptureOp::Release {
                target: TempTarget::ScreenCopy,
            });

            if iterations > 1 {
                ops.push(CaptureOp::Acquire {
                    target: TempTarget::Pong,
                    width: work_w,
                    height: work_h,
                });
                for i in 1..iterations {
                    let (src, dst) = if i % 2 == 1 {
                        (TempTarget::Ping, TempTarget::Pong)
                    } else {
                        (TempTarget::Pong, TempTarget::Ping)
                    };
                    ops.push(CaptureOp::Blit {
                        src: BlitSource::Temp(src),
                        dst: BlitDest::Temp(dst),
                        effect: true,
                    });
                }
            }

            let last = if iterations % 2 == 0 {
                TempTarget::Pong
            } else {
                TempTarget::Ping
            };
            ops.push(CaptureOp::Blit {
                src: BlitSource::Temp(last),
                dst: BlitDest::Result,
                effect: false,
            });
            ops.push(CaptureOp::Release {
                target: TempTarget::Ping,
            });
            if iterations > 1 {
                ops.push(CaptureOp::Release {
                    target: TempTarget::Pong,
                });
            }
        } else {
            ops.push(CaptureOp::Blit {
                src: BlitSource::Temp(TempTarget::ScreenCopy),
                dst: BlitDest::Result,
                effect: false,
            });
            ops.push(CaptureOp::Release {
                target: TempTarget::ScreenCopy,
            });
        }

        CapturePlan {
            result: TargetDesc {
                width: result_w,
                height: result_h,
                filter: self.filter_mode,
            },
            uniforms: CaptureUniforms {
                tone_level: self.tone_level.clamp(0.0, 1.0),
                blur: self.blur.clamp(0.0, 4.0),
                color: self.effect_color,
            },
            ops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn effect_blits(plan: &CapturePlan) -> usize {
        plan.ops
            .iter()
            .filter(|op| matches!(op, CaptureOp::Blit { effect: true, .. }))
            .count()
    }

    #[test]
    fn sizes_snap_to_the_closest_power_of_two() {
        assert_eq!(desampling_size(DesamplingRate::None, 1280, 720), (1280, 720));
        assert_eq!(desampling_size(DesamplingRate::X1, 1280, 720), (1024, 512));
        assert_eq!(desampling_size(DesamplingRate::X2, 1280, 720), (512, 256));
        assert_eq!(desampling_size(DesamplingRate::X8, 1280, 720), (128, 64));
        // 12 / 2 = 6 sits exactly between 4 and 8; ties round up.
        assert_eq!(desampling_size(DesamplingRate::X2, 12, 12), (8, 8));
        assert_eq!(desampling_size(DesamplingRate::X8, 4, 4), (1, 1));
    }

    #[test]
    fn no_active_mode_plans_a_plain_copy() {
        let plan = CaptureBlur::default().plan(800, 600);

        assert_eq!(effect_blits(&plan), 0);
        assert_eq!(
            plan.ops,
            vec![
                CaptureOp::Acquire {
                    target: TempTarget::ScreenCopy,
                    width: 800,
                    height: 600,
                },
                CaptureOp::Blit {
                    src: BlitSource::Screen,
                    dst: BlitDest::Temp(TempTarget::ScreenCopy),
                    effect: false,
                },
                CaptureOp::Blit {
                    src: BlitSource::Temp(TempTarget::ScreenCopy),
                    dst: BlitDest::Result,
                    effect: false,
                },
                CaptureOp::Release {
                    target: TempTarget::ScreenCopy,
                },
            ]
        );
    }

    #[test]
    fn single_iteration_skips_the_second_buffer() {
        let capture = CaptureBlur {
            blur_mode: BlurMode::Fast,
            iterations: 1,
            ..CaptureBlur::default()
        };
        let plan = capture.plan(800, 600);

        assert_eq!(effect_blits(&plan), 1);
        assert!(
            !plan.ops.iter().any(|op| matches!(
                op,
                CaptureOp::Acquire {
                    target: TempTarget::Pong,
                    ..
                }
            )),
            "one iteration never allocates the pong buffer"
        );
        assert!(plan.ops.contains(&CaptureOp::Blit {
            src: BlitSource::Temp(TempTarget::Ping),
            dst: BlitDest::Result,
            effect: false,
        }));
    }

    #[test]
    fn ping_pong_ends_on_the_buffer_written_last() {
        let capture = CaptureBlur {
            blur_mode: BlurMode::Medium,
            iterations: 4,
            ..CaptureBlur::default()
        };
        let plan = capture.plan(800, 600);

        assert_eq!(effect_blits(&plan), 4);
        // Even iteration counts finish in the pong buffer.
        assert!(plan.ops.contains(&CaptureOp::Blit {
            src: BlitSource::Temp(TempTarget::Pong),
            dst: BlitDest::Result,
            effect: false,
        }));
    }

    #[test]
    fn every_acquire_is_released_once() {
        let capture = CaptureBlur {
            tone_mode: ToneMode::Sepia,
            iterations: 5,
            ..CaptureBlur::default()
        };
        let plan = capture.plan(1280, 720);

        for target in [TempTarget::ScreenCopy, TempTarget::Ping, TempTarget::Pong] {
            let acquired = plan
                .ops
                .iter()
                .filter(|op| matches!(op, CaptureOp::Acquire { target: t, .. } if *t == target))
                .count();
            let released = plan
                .ops
                .iter()
                .filter(|op| matches!(op, CaptureOp::Release { target: t } if *t == target))
                .count();
            assert_eq!(acquired, released, "{target:?} must balance");
            assert!(acquired <= 1, "{target:?} acquired at most once");
        }
    }

    #[test]
    fn iterations_clamp_when_planning() {
        let over = CaptureBlur {
            blur_mode: BlurMode::Detail,
            iterations: 99,
            ..CaptureBlur::default()
        };
        assert_eq!(effect_blits(&over.plan(800, 600)), 8);

        let under = CaptureBlur {
            blur_mode: BlurMode::Detail,
            iterations: 0,
            ..CaptureBlur::default()
        };
        assert_eq!(effect_blits(&under.plan(800, 600)), 1);
    }

    #[test]
    fn uniforms_clamp_their_ranges() {
        let capture = CaptureBlur {
            tone_level: -0.5,
            blur: 9.0,
            ..CaptureBlur::default()
        };
        let plan = capture.plan(800, 600);

        assert_eq!(plan.uniforms.tone_level, 0.0);
        assert_eq!(plan.uniforms.blur, 4.0);
    }

    #[test]
    fn working_buffers_use_the_reduction_rate() {
        let capture = CaptureBlur {
            blur_mode: BlurMode::Fast,
            desampling_rate: DesamplingRate::None,
            reduction_rate: DesamplingRate::X4,
            ..CaptureBlur::default()
        };
        let plan = capture.plan(1280, 720);

        assert_eq!((plan.result.width, plan.result.height), (1280, 720));
        assert!(plan.ops.contains(&CaptureOp::Acquire {
            target: TempTarget::Ping,
            width: 256,
            height: 128,
        }));
    }
}
