//! Reactive wall-following control.
//!
//! A fixed decision table maps the front and left range readings to a
//! steering command. The output is in degrees; the simulation session
//! converts to radians before feeding the motion model.

/// Steering command in degrees for one control tick.
///
/// The table, evaluated top to bottom, first match wins:
///
/// | condition            | steer | meaning                      |
/// |----------------------|-------|------------------------------|
/// | `0 < front < 3`      | -10   | obstacle ahead, bear right   |
/// | `1 <= left <= 2`     |   0   | wall at tracking distance    |
/// | `0 < left < 1`       | -10   | too close, peel away         |
/// | `left > 2`           |  10   | too far, close in            |
/// | otherwise            |   0   | no wall seen, hold course    |
///
/// The `0 <` guards are load-bearing: a miss is a negative sentinel, and
/// without them a missing reading would read as "obstacle at distance -1".
///
/// The right reading is part of the contract for symmetry with the sensor
/// array but the table never consults it.
pub fn follow_wall(front: f32, left: f32, _right: f32) -> f32 {
    if 0.0 < front && front < 3.0 {
        -10.0
    } else if (1.0..=2.0).contains(&left) {
        0.0
    } else if 0.0 < left && left < 1.0 {
        -10.0
    } else if left > 2.0 {
        10.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::NO_DETECTION;

    #[test]
    fn test_obstacle_ahead_bears_right() {
        assert_eq!(follow_wall(2.0, 1.5, NO_DETECTION), -10.0);
        assert_eq!(follow_wall(0.5, 5.0, NO_DETECTION), -10.0);
    }

    #[test]
    fn test_front_rule_wins_over_left_rules() {
        // Wall at tracking distance, but the front reading dominates
        assert_eq!(follow_wall(1.0, 1.5, NO_DETECTION), -10.0);
        assert_eq!(follow_wall(2.9, 3.0, NO_DETECTION), -10.0);
    }

    #[test]
    fn test_wall_in_band_holds_course() {
        assert_eq!(follow_wall(10.0, 1.0, NO_DETECTION), 0.0);
        assert_eq!(follow_wall(10.0, 1.5, NO_DETECTION), 0.0);
        assert_eq!(follow_wall(10.0, 2.0, NO_DETECTION), 0.0);
    }

    #[test]
    fn test_too_close_peels_away() {
        assert_eq!(follow_wall(10.0, 0.5, NO_DETECTION), -10.0);
        assert_eq!(follow_wall(10.0, 0.99, NO_DETECTION), -10.0);
    }

    #[test]
    fn test_too_far_closes_in() {
        assert_eq!(follow_wall(10.0, 2.5, NO_DETECTION), 10.0);
        assert_eq!(follow_wall(NO_DETECTION, 30.0, NO_DETECTION), 10.0);
    }

    #[test]
    fn test_no_detection_is_not_an_obstacle() {
        // Sentinel front reading must not trigger the obstacle rule
        assert_eq!(follow_wall(NO_DETECTION, 1.5, NO_DETECTION), 0.0);
        // Sentinel on both: hold course
        assert_eq!(follow_wall(NO_DETECTION, NO_DETECTION, NO_DETECTION), 0.0);
    }

    #[test]
    fn test_zero_distances_excluded_by_strict_guards() {
        assert_eq!(follow_wall(0.0, 1.5, NO_DETECTION), 0.0);
        assert_eq!(follow_wall(10.0, 0.0, NO_DETECTION), 0.0);
    }
}
