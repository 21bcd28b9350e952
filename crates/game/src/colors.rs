//! Team color palette.
//!
//! Position in the registry is identity: entry 0 colors unclaimed cells,
//! entry `n` colors team `n`. The first eight entries are fixed presets,
//! anything after that is a custom color appended as teams join.

use protocol::{Color, TeamId};
use rand::Rng;
use std::ops::Range;

/// Number of built-in entries, including the unclaimed grey.
pub const PRESET_COUNT: usize = 8;

/// Built-in colors, named after the terminal palette entry they map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Grey,
    Blue,
    Red,
    Green,
    Yellow,
    Magenta,
    Cyan,
    DarkGreen,
}

impl Preset {
    /// Registry order of the presets.
    pub const ALL: [Preset; PRESET_COUNT] = [
        Preset::Grey,
        Preset::Blue,
        Preset::Red,
        Preset::Green,
        Preset::Yellow,
        Preset::Magenta,
        Preset::Cyan,
        Preset::DarkGreen,
    ];

    /// Index into the 256-color terminal palette.
    pub fn ansi_index(self) -> u8 {
        match self {
            Preset::Grey => 8,
            Preset::Red => 9,
            Preset::Green => 10,
            Preset::Yellow => 11,
            Preset::Blue => 12,
            Preset::Magenta => 13,
            Preset::Cyan => 14,
            Preset::DarkGreen => 2,
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteColor {
    Preset(Preset),
    Custom(Color),
}

/// Append-only, ordered list of team colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRegistry {
    entries: Vec<PaletteColor>,
}

impl Default for ColorRegistry {
    fn default() -> Self {
        Self::initial_defaults()
    }
}

impl ColorRegistry {
    /// The eight presets: grey for unclaimed, then teams 1 to 7.
    pub fn initial_defaults() -> Self {
        Self {
            entries: Preset::ALL.iter().copied().map(PaletteColor::Preset).collect(),
        }
    }

    /// Add a color at the end and return its index.
    pub fn append(&mut self, color: Color) -> usize {
        self.entries.push(PaletteColor::Custom(color));
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<PaletteColor> {
        self.entries.get(index).copied()
    }

    /// Color for a team's cells, grey if the team has none yet.
    pub fn for_team(&self, team: TeamId) -> PaletteColor {
        self.get(team as usize)
            .unwrap_or(PaletteColor::Preset(Preset::Grey))
    }

    /// True when team `team` already has an entry.
    pub fn covers(&self, team: TeamId) -> bool {
        (team as usize) < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries past the presets, in insertion order.
    pub fn custom(&self) -> Vec<Color> {
        self.entries
            .iter()
            .skip(PRESET_COUNT)
            .filter_map(|entry| match entry {
                PaletteColor::Custom(color) => Some(*color),
                PaletteColor::Preset(_) => None,
            })
            .collect()
    }
}

/// Draw each channel uniformly from `range`.
pub fn random_color<R: Rng>(rng: &mut R, range: Range<u8>) -> Color {
    Color::new(
        rng.random_range(range.clone()),
        rng.random_range(range.clone()),
        rng.random_range(range),
    )
}
