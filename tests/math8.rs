mod tests {
    use keylight_animator::math8::{
        ease_in_out_quad, lerp8, map8, qmul8, scale8, scale16by8, sqrt16,
    };

    #[test]
    fn test_scale8() {
        assert_eq!(scale8(255, 128), 128);
        assert_eq!(scale8(0, 128), 0);
        assert_eq!(scale8(128, 128), 64);
        assert_eq!(scale8(128, 255), 128);
        assert_eq!(scale8(128, 0), 0);
    }

    #[test]
    fn test_scale16by8() {
        assert_eq!(scale16by8(1000, 255), 1000);
        assert_eq!(scale16by8(1000, 127), 500);
        assert_eq!(scale16by8(0, 200), 0);
        assert_eq!(scale16by8(400, 255), 400);
    }

    #[test]
    fn test_qmul8() {
        assert_eq!(qmul8(20, 12), 240);
        assert_eq!(qmul8(30, 12), 255);
        assert_eq!(qmul8(0, 12), 0);
        assert_eq!(qmul8(255, 255), 255);
    }

    #[test]
    fn test_lerp8() {
        assert_eq!(lerp8(0, 255, 0), 0);
        assert_eq!(lerp8(0, 255, 255), 255);
        assert_eq!(lerp8(0, 255, 128), 128);
        assert_eq!(lerp8(255, 0, 128), 127);
        assert_eq!(lerp8(10, 10, 77), 10);
    }

    #[test]
    fn test_map8_endpoints() {
        assert_eq!(map8(0, 10, 20), 10);
        assert_eq!(map8(255, 10, 20), 20);
        // Reversed range traverses backwards but keeps the endpoints
        assert_eq!(map8(0, 20, 10), 20);
        assert_eq!(map8(255, 20, 10), 10);
        assert_eq!(map8(77, 5, 5), 5);
        assert_eq!(map8(128, 0, 255), 128);
    }

    #[test]
    fn test_sqrt16() {
        assert_eq!(sqrt16(0), 0);
        assert_eq!(sqrt16(1), 1);
        assert_eq!(sqrt16(4), 2);
        assert_eq!(sqrt16(10), 3);
        assert_eq!(sqrt16(144), 12);
        assert_eq!(sqrt16(50308), 224);
        assert_eq!(sqrt16(65025), 255);
        assert_eq!(sqrt16(65535), 255);
    }

    #[test]
    fn test_ease_in_out_quad() {
        assert_eq!(ease_in_out_quad(0), 0);
        assert_eq!(ease_in_out_quad(255), 255);
        assert_eq!(ease_in_out_quad(64), 32);
        assert_eq!(ease_in_out_quad(128), 129);
        // Monotonic over the full range
        let mut previous = 0;
        for i in 0..=255u8 {
            let eased = ease_in_out_quad(i);
            assert!(eased >= previous, "dip at {i}: {eased} < {previous}");
            previous = eased;
        }
    }
}
