/// Circle sample classification helpers for the FAST segment test

/// Pack a 16-sample circle into a bitmask (bit i = sample i)
pub fn circle_mask(pixels: &[bool; 16]) -> u16 {
    pixels
        .iter()
        .enumerate()
        .fold(0u16, |mask, (i, &set)| mask | ((set as u16) << i))
}

/// At least `min_count` consecutive set bits in the circular 16-bit mask
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // A run of n survives n-1 rotate-and-AND steps
    let mut test_mask = mask;
    for i in 1..min_count as u32 {
        test_mask &= mask.rotate_left(i);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

/// Reference run-length scan, kept to cross-check the bitmask test
#[cfg(test)]
fn has_consecutive_pixels_scan(pixels: &[bool; 16], min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    let mut current = 0;
    for i in 0..32 {
        if pixels[i % 16] {
            current += 1;
            if current >= min_count {
                return true;
            }
        } else {
            current = 0;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_consecutive_simple() {
        let mut pixels = [false; 16];
        for p in pixels.iter_mut().take(9) {
            *p = true;
        }
        let mask = circle_mask(&pixels);
        assert!(has_consecutive_bits(mask, 9));
        assert!(!has_consecutive_bits(mask, 10));
    }

    #[test]
    fn test_consecutive_wrap_around() {
        let mut pixels = [false; 16];
        for i in (12..16).chain(0..5) {
            pixels[i] = true;
        }
        assert!(has_consecutive_bits(circle_mask(&pixels), 9));
    }

    #[test]
    fn test_alternating_pixels() {
        let mut pixels = [false; 16];
        for i in (0..16).step_by(2) {
            pixels[i] = true;
        }
        assert!(!has_consecutive_bits(circle_mask(&pixels), 2));
        assert!(has_consecutive_bits(circle_mask(&pixels), 1));
    }

    #[test]
    fn test_full_and_empty_circle() {
        assert!(has_consecutive_bits(u16::MAX, 16));
        assert!(!has_consecutive_bits(0, 1));
        assert!(!has_consecutive_bits(u16::MAX, 17));
    }

    proptest! {
        #[test]
        fn bitmask_agrees_with_scan(bits in any::<u16>(), min_count in 1usize..=16) {
            let mut pixels = [false; 16];
            for (i, p) in pixels.iter_mut().enumerate() {
                *p = bits & (1 << i) != 0;
            }
            prop_assert_eq!(
                has_consecutive_bits(circle_mask(&pixels), min_count),
                has_consecutive_pixels_scan(&pixels, min_count)
            );
        }
    }
}
