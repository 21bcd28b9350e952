//! ANSI rendering of the board.

use game::{Board, ColorRegistry, Move, PaletteColor, Preset};

const RESET: &str = "\x1b[0m";

/// Foreground escape for a palette entry.
pub fn paint(color: PaletteColor) -> String {
    match color {
        PaletteColor::Preset(preset) => format!("\x1b[38;5;{}m", preset.ansi_index()),
        PaletteColor::Custom(c) => format!("\x1b[38;2;{};{};{}m", c.r, c.g, c.b),
    }
}

/// `team N has made the move: x, y` with the team number in its color.
pub fn move_line(mv: Move, colors: &ColorRegistry) -> String {
    format!(
        "team {}{}{} has made the move: {}, {}",
        paint(colors.for_team(mv.team)),
        mv.team,
        RESET,
        mv.position.x,
        mv.position.y
    )
}

/// One line per row, each cell's count in its owner's color.
pub fn board(board: &Board, colors: &ColorRegistry) -> String {
    let mut out = String::new();
    for row in board.rows() {
        for cell in row {
            let color = colors.get(cell.color_index).unwrap_or(PaletteColor::Preset(Preset::Grey));
            out.push_str(&format!("{}{} ", paint(color), cell.count));
        }
        out.push('\n');
    }
    out.push_str(RESET);
    out
}
