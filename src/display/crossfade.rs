use std::time::Duration;

use crate::display::frame::DisplayFrame;
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::mix_channel;

/// Discrete opacity ramp for one crossfade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrossfadePlan {
    frames: u32,
}

impl CrossfadePlan {
    /// `floor(duration * fps)` steps, at least one, giving `steps + 1` ticks.
    pub fn new(duration: Duration, fps: f64) -> Self {
        let frames = (duration.as_secs_f64() * fps).floor();
        let frames = if frames.is_finite() && frames >= 1.0 {
            frames.min(f64::from(u32::MAX)) as u32
        } else {
            1
        };
        Self { frames }
    }

    /// Number of interpolation steps; the plan presents `steps() + 1` ticks.
    pub fn steps(&self) -> u32 {
        self.frames
    }

    pub fn ticks(&self) -> u32 {
        self.frames + 1
    }

    /// `(outgoing, incoming)` opacity at tick `i`, 255 = opaque.
    pub fn opacity_at(&self, i: u32) -> (u8, u8) {
        let t = f64::from(i.min(self.frames)) / f64::from(self.frames);
        let old = (255.0 * (1.0 - t)) as u8;
        let new = (255.0 * t) as u8;
        (old, new)
    }

    pub fn opacities(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        (0..=self.frames).map(|i| self.opacity_at(i))
    }
}

/// Write `outgoing * a_old + incoming * a_new` into `dst`.
pub fn blend_into(
    dst: &mut DisplayFrame,
    outgoing: &DisplayFrame,
    incoming: &DisplayFrame,
    a_old: u8,
    a_new: u8,
) -> PosterResult<()> {
    let dims = (dst.width(), dst.height());
    if dims != (outgoing.width(), outgoing.height())
        || dims != (incoming.width(), incoming.height())
    {
        return Err(PosterError::display(
            "crossfade expects equal-sized frames",
        ));
    }
    for ((d, a), b) in dst
        .pixels_mut()
        .pixels_mut()
        .zip(outgoing.pixels().pixels())
        .zip(incoming.pixels().pixels())
    {
        for c in 0..3 {
            d.0[c] = mix_channel(a.0[c], a_old, b.0[c], a_new);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn plan_uses_floor_of_duration_times_fps() {
        assert_eq!(CrossfadePlan::new(Duration::from_secs(1), 30.0).steps(), 30);
        assert_eq!(CrossfadePlan::new(Duration::from_millis(1050), 10.0).steps(), 10);
        assert_eq!(CrossfadePlan::new(Duration::ZERO, 30.0).steps(), 1);
    }

    #[test]
    fn opacities_are_monotonic_with_fixed_endpoints() {
        for (secs, fps) in [(1.0, 30.0), (0.5, 24.0), (2.0, 7.0), (0.0, 60.0)] {
            let plan = CrossfadePlan::new(Duration::from_secs_f64(secs), fps);
            let ramp: Vec<(u8, u8)> = plan.opacities().collect();
            assert_eq!(ramp.len() as u32, plan.ticks());
            assert_eq!(ramp.first(), Some(&(255, 0)));
            assert_eq!(ramp.last(), Some(&(0, 255)));
            for pair in ramp.windows(2) {
                assert!(pair[1].0 <= pair[0].0);
                assert!(pair[1].1 >= pair[0].1);
            }
        }
    }

    #[test]
    fn blend_endpoints_select_each_frame() {
        let a = DisplayFrame::from_rgb(RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 10])));
        let b = DisplayFrame::from_rgb(RgbImage::from_pixel(2, 2, image::Rgb([0, 255, 20])));
        let mut dst = DisplayFrame::from_rgb(RgbImage::new(2, 2));

        blend_into(&mut dst, &a, &b, 255, 0).unwrap();
        assert_eq!(dst, a);
        blend_into(&mut dst, &a, &b, 0, 255).unwrap();
        assert_eq!(dst, b);
        blend_into(&mut dst, &a, &b, 127, 127).unwrap();
        assert_eq!(dst.pixels().get_pixel(0, 0).0, [127, 127, 15]);
    }

    #[test]
    fn blend_rejects_mismatched_sizes() {
        let a = DisplayFrame::from_rgb(RgbImage::new(2, 2));
        let b = DisplayFrame::from_rgb(RgbImage::new(3, 2));
        let mut dst = DisplayFrame::from_rgb(RgbImage::new(2, 2));
        assert!(blend_into(&mut dst, &a, &b, 128, 127).is_err());
    }
}
