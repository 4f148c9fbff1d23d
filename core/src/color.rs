/// What a node represents for coloring purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Config,
    Binary,
    /// A pid-less trace, drawn on the meta row
    Meta,
    Lane(usize),
    Failure,
}

/// Hue/saturation/value triple, hue in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

// Golden angle keeps neighbouring lanes far apart on the wheel.
const GOLDEN_ANGLE: f64 = 137.507_764_050_037_85;
const LANE_HUE_OFFSET: f64 = 45.0;

impl Hsv {
    pub fn new(hue: f64, saturation: f64, value: f64) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 1.0),
            value: value.clamp(0.0, 1.0),
        }
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let c = self.value * self.saturation;
        let h = self.hue / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = self.value - c;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

/// Deterministic category to color mapping
pub fn color_for(category: Category) -> Hsv {
    match category {
        Category::Config => Hsv::new(210.0, 0.35, 0.85),
        Category::Binary => Hsv::new(120.0, 0.35, 0.85),
        Category::Meta => Hsv::new(0.0, 0.0, 0.75),
        Category::Lane(lane) => Hsv::new(
            LANE_HUE_OFFSET + GOLDEN_ANGLE * lane as f64,
            0.55,
            0.95,
        ),
        Category::Failure => Hsv::new(0.0, 0.85, 0.95),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_colors_are_deterministic_and_distinct() {
        assert_eq!(color_for(Category::Lane(3)), color_for(Category::Lane(3)));
        let hues: Vec<f64> = (0..8).map(|l| color_for(Category::Lane(l)).hue).collect();
        for (i, a) in hues.iter().enumerate() {
            for b in &hues[i + 1..] {
                assert!((a - b).abs() > 1.0);
            }
        }
    }

    #[test]
    fn hsv_to_rgb() {
        assert_eq!(Hsv::new(0.0, 1.0, 1.0).to_rgb(), (255, 0, 0));
        assert_eq!(Hsv::new(120.0, 1.0, 1.0).to_rgb(), (0, 255, 0));
        assert_eq!(Hsv::new(240.0, 1.0, 1.0).to_rgb(), (0, 0, 255));
        assert_eq!(Hsv::new(0.0, 0.0, 1.0).to_rgb(), (255, 255, 255));
    }

    #[test]
    fn hue_wraps() {
        assert_eq!(Hsv::new(370.0, 0.5, 0.5).hue, 10.0);
    }
}
