use nous_srs::scheduler::Grade;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
}

/// Wrap text in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Button color for an answer, as review UIs show them
pub fn grade_color(grade: Grade) -> &'static str {
    match grade {
        Grade::Again => Color::RED,
        Grade::Hard => Color::YELLOW,
        Grade::Good => Color::GREEN,
        Grade::Easy => Color::BLUE,
    }
}

/// Horizontal rule under a table header
pub fn rule(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "\u{2500}".repeat(*w))
        .collect::<Vec<_>>()
        .join(" ")
}
