// SPDX-License-Identifier: GPL-3.0-only
//! Brightness level presets

use super::CapabilityInfo;
use crate::error::LevelsError;

/// Fixed presets offered by [`default_levels`]
pub const PRESET_LEVELS: [i32; 5] = [0, 10, 30, 60, 100];

/// Number of levels generated when the caller does not choose
pub const DEFAULT_LEVEL_COUNT: usize = 6;

/// The presets that fall inside `[minimum, maximum]`, ascending
pub fn default_levels(capabilities: &CapabilityInfo) -> Vec<i32> {
    PRESET_LEVELS
        .iter()
        .copied()
        .filter(|level| (capabilities.minimum..=capabilities.maximum).contains(level))
        .collect()
}

/// `count` evenly spaced levels starting at `minimum`
///
/// The step is truncated, so the last level can fall short of `maximum`
/// (four levels over 0-100 end at 99).
pub fn generated_levels(capabilities: &CapabilityInfo, count: usize) -> Result<Vec<i32>, LevelsError> {
    let steps = i32::try_from(count)
        .map_err(|_| LevelsError::TooManyLevels { count })?
        - 1;
    if steps < 1 {
        return Err(LevelsError::TooFewLevels { count });
    }

    let step = (capabilities.maximum - capabilities.minimum) / steps;
    Ok((0..=steps)
        .map(|i| capabilities.minimum + i * step)
        .collect())
}
