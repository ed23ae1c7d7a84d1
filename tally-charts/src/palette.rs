//! Color ramps and qualitative palettes used by the charts

use plotters::style::RGBColor;

pub const VIRIDIS: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

pub const COOLWARM: [RGBColor; 3] = [
    RGBColor(59, 76, 192),
    RGBColor(221, 221, 221),
    RGBColor(180, 4, 38),
];

pub const YLGNBU: [RGBColor; 5] = [
    RGBColor(255, 255, 217),
    RGBColor(199, 233, 180),
    RGBColor(65, 182, 196),
    RGBColor(34, 94, 168),
    RGBColor(8, 29, 88),
];

pub const PASTEL: [RGBColor; 10] = [
    RGBColor(161, 201, 244),
    RGBColor(255, 180, 130),
    RGBColor(141, 229, 161),
    RGBColor(255, 159, 155),
    RGBColor(208, 187, 255),
    RGBColor(222, 187, 155),
    RGBColor(250, 176, 228),
    RGBColor(207, 207, 207),
    RGBColor(255, 254, 163),
    RGBColor(185, 242, 240),
];

pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Linear interpolation along `stops`; `t` is clamped to 0..=1.
pub fn ramp(stops: &[RGBColor], t: f64) -> RGBColor {
    match stops {
        [] => RGBColor(0, 0, 0),
        [only] => *only,
        _ => {
            let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
            let scaled = t * (stops.len() - 1) as f64;
            let i = (scaled.floor() as usize).min(stops.len() - 2);
            let frac = scaled - i as f64;
            let (a, b) = (stops[i], stops[i + 1]);
            let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
            RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
        }
    }
}

/// `n` colors spread evenly across a ramp
pub fn sample(stops: &[RGBColor], n: usize) -> Vec<RGBColor> {
    match n {
        0 => Vec::new(),
        1 => vec![ramp(stops, 0.5)],
        _ => (0..n)
            .map(|i| ramp(stops, i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// `n` colors taken round-robin from a qualitative palette
pub fn cycle(colors: &[RGBColor], n: usize) -> Vec<RGBColor> {
    if colors.is_empty() {
        return vec![RGBColor(0, 0, 0); n];
    }
    (0..n).map(|i| colors[i % colors.len()]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp(&VIRIDIS, 0.0), VIRIDIS[0]);
        assert_eq!(ramp(&VIRIDIS, 1.0), VIRIDIS[4]);
        assert_eq!(ramp(&VIRIDIS, 7.0), VIRIDIS[4]);
        assert_eq!(ramp(&VIRIDIS, f64::NAN), VIRIDIS[0]);
    }

    #[test]
    fn test_ramp_midpoint() {
        let stops = [RGBColor(0, 0, 0), RGBColor(200, 100, 50)];
        assert_eq!(ramp(&stops, 0.5), RGBColor(100, 50, 25));
    }

    #[test]
    fn test_sample_and_cycle() {
        assert!(sample(&YLGNBU, 0).is_empty());
        assert_eq!(sample(&YLGNBU, 5), YLGNBU.to_vec());
        let colors = cycle(&PASTEL, 12);
        assert_eq!(colors.len(), 12);
        assert_eq!(colors[10], PASTEL[0]);
    }
}
