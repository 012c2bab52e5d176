//! Stable per-identifier colors for users and namespaces

const PALETTE_SIZE: usize = 12;

const TEXT_PALETTE: [&str; PALETTE_SIZE] = [
    "red-text text-lighten-1",
    "teal-text text-lighten-1",
    "blue-text text-lighten-1",
    "blue-grey-text text-lighten-1",
    "indigo-text text-lighten-2",
    "green-text text-lighten-1",
    "deep-orange-text text-lighten-1",
    "yellow-text text-lighten-2",
    "purple-text text-lighten-2",
    "indigo-text text-lighten-2",
    "brown-text text-lighten-1",
    "grey-text text-lighten-1",
];

const BACKGROUND_PALETTE: [&str; PALETTE_SIZE] = [
    "red lighten-1",
    "teal lighten-1",
    "blue lighten-1",
    "blue-grey lighten-1",
    "indigo lighten-2",
    "green lighten-1",
    "deep-orange lighten-1",
    "yellow lighten-2",
    "purple lighten-2",
    "indigo lighten-2",
    "brown lighten-1",
    "grey lighten-1",
];

/// Which palette a color is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteKind {
    Text,
    Background,
}

impl PaletteKind {
    /// "text" selects the text palette; anything else falls back to background.
    pub fn from_item_type(s: &str) -> Self {
        if s.eq_ignore_ascii_case("text") {
            PaletteKind::Text
        } else {
            PaletteKind::Background
        }
    }

    fn palette(self) -> &'static [&'static str; PALETTE_SIZE] {
        match self {
            PaletteKind::Text => &TEXT_PALETTE,
            PaletteKind::Background => &BACKGROUND_PALETTE,
        }
    }
}

/// Color class for an identifier, cycling through the palette every 12 ids
pub fn palette_color(id: u64, kind: PaletteKind) -> &'static str {
    kind.palette()[(id % PALETTE_SIZE as u64) as usize]
}
