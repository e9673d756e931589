/// Cheap periodic noise used to roughen coastlines, clamped to `[-1, 1]`.
pub fn coastline_noise(x: f64, y: f64) -> f64 {
    let raw = 0.5
        * ((x * 0.01).sin()
            + (y * 0.01).sin()
            + (x * 0.02 + y * 0.01).sin()
            + (y * 0.03 + x * 0.01).sin());
    raw.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_stays_in_unit_range() {
        for step in 0..400 {
            let x = step as f64 * 13.7;
            let y = step as f64 * 7.3;
            let value = coastline_noise(x, y);
            assert!((-1.0..=1.0).contains(&value));
        }
        assert_eq!(coastline_noise(0.0, 0.0), 0.0);
    }

    #[test]
    fn noise_is_deterministic() {
        assert_eq!(coastline_noise(120.0, 450.0), coastline_noise(120.0, 450.0));
    }
}
