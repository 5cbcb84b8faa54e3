//! Color allocation for new access groups.

use std::collections::HashSet;

use gs_platform::Group;
use rand::Rng;

/// Used when every other color is taken.
pub const FALLBACK_COLOR: u32 = 0x5865F2;

const MAX_COLOR: u32 = 0xFF_FFFF;
const RANDOM_ATTEMPTS: usize = 64;

/// Non-default colors currently carried by groups.
pub fn used_colors(groups: &[Group]) -> HashSet<u32> {
    groups
        .iter()
        .map(|g| g.color)
        .filter(|&c| c != 0)
        .collect()
}

/// Pick a random color not present in `used`.
///
/// Zero means "no color" on the platform and is never returned.
pub fn allocate_color<R: Rng + ?Sized>(used: &HashSet<u32>, rng: &mut R) -> u32 {
    allocate_within(used, rng, MAX_COLOR)
}

fn allocate_within<R: Rng + ?Sized>(used: &HashSet<u32>, rng: &mut R, max: u32) -> u32 {
    for _ in 0..RANDOM_ATTEMPTS {
        let color = rng.random_range(1..=max);
        if !used.contains(&color) {
            return color;
        }
    }

    (1..=max)
        .find(|c| !used.contains(c))
        .unwrap_or(FALLBACK_COLOR)
}
