use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Subpixel jitter offset for progressive sample `index`, in [-0.5, 0.5] per
/// axis. Sample 0 is the pixel center so a single-sample preview stays sharp;
/// later samples are drawn from a seeded generator so the sequence is
/// reproducible across frames and hosts.
pub fn sample_offset(index: u32) -> Vec2 {
    if index == 0 {
        return Vec2::ZERO;
    }
    let mut rng = SmallRng::seed_from_u64(index as u64);
    Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_centered() {
        assert_eq!(sample_offset(0), Vec2::ZERO);
    }

    #[test]
    fn offsets_stay_within_half_a_pixel() {
        for index in 0..64 {
            let offset = sample_offset(index);
            assert!(offset.x >= -0.5 && offset.x < 0.5, "x = {}", offset.x);
            assert!(offset.y >= -0.5 && offset.y < 0.5, "y = {}", offset.y);
        }
    }

    #[test]
    fn offsets_are_deterministic() {
        for index in 0..16 {
            assert_eq!(sample_offset(index), sample_offset(index));
        }
    }
}
