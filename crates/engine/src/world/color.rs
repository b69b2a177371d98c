use rand::Rng;
use serde::{Deserialize, Serialize};

const COLOR_TABLE: &[(&str, [u8; 3])] = &[
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("purple", [128, 0, 128]),
    ("orange", [255, 165, 0]),
    ("pink", [255, 192, 203]),
    ("brown", [165, 42, 42]),
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("gray", [128, 128, 128]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("lime", [0, 255, 0]),
    ("indigo", [75, 0, 130]),
    ("violet", [238, 130, 238]),
    ("turquoise", [64, 224, 208]),
    ("beige", [245, 245, 220]),
    ("lavender", [230, 230, 250]),
    ("coral", [255, 127, 80]),
    ("gold", [255, 215, 0]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("olive", [128, 128, 0]),
    ("salmon", [250, 128, 114]),
    ("plum", [221, 160, 221]),
    ("chocolate", [210, 105, 30]),
    ("tan", [210, 180, 140]),
    ("peach", [255, 229, 180]),
    ("crimson", [220, 20, 60]),
    ("aqua", [0, 255, 255]),
    ("ivory", [255, 255, 240]),
    ("orchid", [218, 112, 214]),
    ("khaki", [240, 230, 140]),
    ("mint", [189, 252, 201]),
    ("amber", [255, 191, 0]),
    ("ruby", [224, 17, 95]),
    ("emerald", [80, 200, 120]),
    ("jade", [0, 168, 107]),
    ("bronze", [205, 127, 50]),
    ("sapphire", [15, 82, 186]),
    ("periwinkle", [204, 204, 255]),
    ("slate", [112, 128, 144]),
    ("amethyst", [153, 102, 204]),
    ("fuchsia", [255, 0, 255]),
    ("azure", [240, 255, 255]),
    ("charcoal", [54, 69, 79]),
    ("rose", [255, 0, 127]),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            r: f32::from(bytes[0]) / 255.0,
            g: f32::from(bytes[1]) / 255.0,
            b: f32::from(bytes[2]) / 255.0,
        }
    }

    pub fn channels(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Sum of channels; lower is darker.
    pub fn lightness(self) -> f32 {
        self.r + self.g + self.b
    }
}

pub fn color_by_name(name: &str) -> Option<Rgb> {
    COLOR_TABLE
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, bytes)| Rgb::from_bytes(*bytes))
}

pub fn is_color_name(word: &str) -> bool {
    COLOR_TABLE.iter().any(|(entry, _)| *entry == word)
}

pub fn color_names() -> impl Iterator<Item = &'static str> {
    COLOR_TABLE.iter().map(|(name, _)| *name)
}

pub(crate) fn sample_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    let index = rng.gen_range(0..COLOR_TABLE.len());
    Rgb::from_bytes(COLOR_TABLE[index].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_normalizes_channels() {
        let red = color_by_name("red").expect("red");
        assert_eq!(red, Rgb { r: 1.0, g: 0.0, b: 0.0 });
        assert!(color_by_name("ultraviolet").is_none());
    }

    #[test]
    fn names_are_unique() {
        let mut names = color_names().collect::<Vec<_>>();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(is_color_name("teal"));
    }
}
