mod tests {
    use keylight_animator::noise::{drifting_noise, perlin2d};

    #[test]
    fn test_perlin2d_deterministic() {
        for (x, y) in [(0, 0), (10, 20), (255, 255), (-5, 300)] {
            assert_eq!(perlin2d(x, y, 0x666), perlin2d(x, y, 0x666));
        }
    }

    #[cfg(not(feature = "mono"))]
    #[test]
    fn test_perlin2d_known_values() {
        assert_eq!(perlin2d(0, 0, 0x666), 42);
        assert_eq!(perlin2d(10, 20, 0x666), 132);
        assert_eq!(perlin2d(255, 255, 0x666), 88);
    }

    #[test]
    fn test_perlin2d_varies_over_space() {
        let mut seen = [false; 256];
        for x in (0..=224).step_by(7) {
            for y in (0..=64).step_by(4) {
                seen[usize::from(perlin2d(x, y, 0x666))] = true;
            }
        }
        let distinct = seen.iter().filter(|hit| **hit).count();
        assert!(distinct > 16, "noise field is too flat: {distinct} values");
    }

    #[test]
    fn test_drifting_noise_deterministic() {
        assert_eq!(drifting_noise(112, 32, 12345), drifting_noise(112, 32, 12345));
    }

    #[cfg(not(feature = "mono"))]
    #[test]
    fn test_drifting_noise_known_values() {
        assert_eq!(drifting_noise(0, 0, 0), 84);
        assert_eq!(drifting_noise(112, 32, 12345), 75);
        assert_eq!(drifting_noise(224, 64, 99_999), 58);
    }

    #[test]
    fn test_drifting_noise_moves_over_time() {
        let samples = [
            drifting_noise(100, 30, 0),
            drifting_noise(100, 30, 5_000),
            drifting_noise(100, 30, 10_000),
            drifting_noise(100, 30, 15_000),
        ];
        assert!(
            samples.windows(2).any(|pair| pair[0] != pair[1]),
            "shimmer never changed: {samples:?}"
        );
    }
}
