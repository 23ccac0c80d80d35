use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

/// Cells in a gauge bar, excluding the brackets.
pub const GAUGE_WIDTH: usize = 20;

const GAUGE_FILLED: &str = "█";
const GAUGE_EMPTY: &str = "░";

pub const WARNING_THRESHOLD: f64 = 70.0;
pub const CRITICAL_THRESHOLD: f64 = 90.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleHint {
    Plain,
    Info,
    Success,
    Warning,
    Danger,
}

/// Load level of a percentage reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    /// Readings below 70 are normal, below 90 warning, anything else critical.
    pub fn of_percent(value: f64) -> Self {
        if value < WARNING_THRESHOLD {
            Severity::Normal
        } else if value < CRITICAL_THRESHOLD {
            Severity::Warning
        } else {
            Severity::Critical
        }
    }

    pub fn hint(self) -> StyleHint {
        match self {
            Severity::Normal => StyleHint::Success,
            Severity::Warning => StyleHint::Warning,
            Severity::Critical => StyleHint::Danger,
        }
    }
}

/// Styles for each hint. Built fresh whenever the dashboard takes the terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub plain: Style,
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub danger: Style,
}

impl Palette {
    pub fn standard() -> Self {
        let base = Style::default().bg(Color::Black);
        Self {
            plain: base.fg(Color::White),
            info: base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
            success: base.fg(Color::Green),
            warning: base.fg(Color::Yellow),
            danger: base.fg(Color::Red),
        }
    }

    pub fn style(&self, hint: StyleHint) -> Style {
        match hint {
            StyleHint::Plain => self.plain,
            StyleHint::Info => self.info,
            StyleHint::Success => self.success,
            StyleHint::Warning => self.warning,
            StyleHint::Danger => self.danger,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

/// Number of filled gauge cells for `value` out of `max`.
///
/// `value` is clamped to `[0, max]`; a non-positive `max` or NaN reading
/// yields an empty bar.
pub fn gauge_fill(value: f64, max: f64) -> usize {
    if !(max > 0.0) || value.is_nan() {
        return 0;
    }
    let ratio = value.clamp(0.0, max) / max;
    ((ratio * GAUGE_WIDTH as f64).floor() as usize).min(GAUGE_WIDTH)
}

pub fn gauge_text(value: f64, max: f64) -> String {
    let filled = gauge_fill(value, max);
    format!(
        "[{}{}]",
        GAUGE_FILLED.repeat(filled),
        GAUGE_EMPTY.repeat(GAUGE_WIDTH - filled)
    )
}

/// Fixed-size character grid the dashboard draws on.
///
/// Writes that fall outside the grid are clipped; a row past the bottom or a
/// column past the right edge is skipped.
#[derive(Clone, Debug)]
pub struct Canvas {
    buffer: Buffer,
    palette: Palette,
}

impl Canvas {
    pub fn new(area: Rect, palette: Palette) -> Self {
        Self {
            buffer: Buffer::empty(Rect::new(0, 0, area.width, area.height)),
            palette,
        }
    }

    pub fn width(&self) -> u16 {
        self.buffer.area.width
    }

    pub fn height(&self) -> u16 {
        self.buffer.area.height
    }

    #[cfg(test)]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.reset();
    }

    pub fn write_text(&mut self, row: u16, col: u16, text: &str, hint: StyleHint) {
        if row >= self.height() || col >= self.width() {
            return;
        }
        let room = usize::from(self.width() - col);
        let style = self.palette.style(hint);
        self.buffer.set_stringn(col, row, text, room, style);
    }

    pub fn draw_gauge(&mut self, row: u16, col: u16, value: f64, max: f64) {
        self.write_text(row, col, &gauge_text(value, max), StyleHint::Plain);
    }

    /// Text of one row, one symbol per cell.
    #[cfg(test)]
    pub fn row_text(&self, row: u16) -> String {
        if row >= self.height() {
            return String::new();
        }
        (0..self.width())
            .map(|x| self.buffer.get(x, row).symbol())
            .collect()
    }
}

impl Widget for &Canvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(self.buffer.area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                *buf.get_mut(x, y) = self.buffer.get(x, y).clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn canvas(width: u16, height: u16) -> Canvas {
        Canvas::new(Rect::new(0, 0, width, height), Palette::standard())
    }

    #[test]
    fn severity_boundaries() {
        assert_eq!(Severity::of_percent(0.0), Severity::Normal);
        assert_eq!(Severity::of_percent(69.9), Severity::Normal);
        assert_eq!(Severity::of_percent(70.0), Severity::Warning);
        assert_eq!(Severity::of_percent(89.9), Severity::Warning);
        assert_eq!(Severity::of_percent(90.0), Severity::Critical);
        assert_eq!(Severity::of_percent(150.0), Severity::Critical);
    }

    #[test]
    fn severity_sweep_is_consistent() {
        for tenths in 0..=1200 {
            let v = f64::from(tenths) / 10.0;
            let expected = if v < 70.0 {
                Severity::Normal
            } else if v < 90.0 {
                Severity::Warning
            } else {
                Severity::Critical
            };
            assert_eq!(Severity::of_percent(v), expected, "value {v}");
        }
    }

    #[test]
    fn gauge_fill_floors_proportion() {
        assert_eq!(gauge_fill(45.0, 100.0), 9);
        assert_eq!(gauge_fill(0.0, 100.0), 0);
        assert_eq!(gauge_fill(4.9, 100.0), 0);
        assert_eq!(gauge_fill(5.0, 100.0), 1);
        assert_eq!(gauge_fill(100.0, 100.0), 20);
    }

    #[test]
    fn gauge_fill_clamps_out_of_range() {
        assert_eq!(gauge_fill(150.0, 100.0), 20);
        assert_eq!(gauge_fill(-10.0, 100.0), 0);
        assert_eq!(gauge_fill(f64::NAN, 100.0), 0);
        assert_eq!(gauge_fill(50.0, 0.0), 0);
    }

    #[test]
    fn gauge_is_always_twenty_cells_wide() {
        for v in [-5.0, 0.0, 33.3, 99.9, 100.0, 250.0] {
            let text = gauge_text(v, 100.0);
            assert_eq!(text.chars().count(), GAUGE_WIDTH + 2, "value {v}");
        }
    }

    #[test]
    fn draw_gauge_fills_expected_cells() {
        let mut c = canvas(60, 3);
        c.draw_gauge(1, 24, 45.0, 100.0);
        let row = c.row_text(1);
        assert_eq!(row.matches(GAUGE_FILLED).count(), 9);
        assert_eq!(row.matches(GAUGE_EMPTY).count(), 11);
        assert_eq!(c.buffer().get(24, 1).symbol(), "[");
    }

    #[test]
    fn writes_past_edges_are_clipped() {
        let mut c = canvas(10, 2);
        c.write_text(0, 6, "abcdefgh", StyleHint::Info);
        c.write_text(5, 0, "off the bottom", StyleHint::Info);
        c.write_text(1, 40, "off the side", StyleHint::Info);
        assert_eq!(c.row_text(0), "      abcd");
        assert_eq!(c.row_text(1).trim(), "");
    }

    #[test]
    fn hint_selects_palette_style() {
        let mut c = canvas(10, 1);
        c.write_text(0, 0, "x", StyleHint::Danger);
        assert_eq!(c.buffer().get(0, 0).fg, Color::Red);
    }

    #[test]
    fn palette_hints_are_distinct() {
        let p = Palette::standard();
        let styles = [p.info, p.success, p.warning, p.danger];
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn clear_blanks_every_cell() {
        let mut c = canvas(8, 2);
        c.write_text(0, 0, "busy", StyleHint::Warning);
        c.clear();
        assert_eq!(c.row_text(0), " ".repeat(8));
    }

    #[test]
    fn canvas_presents_through_terminal() {
        let mut c = canvas(20, 2);
        c.write_text(1, 2, "hello", StyleHint::Success);

        let mut terminal = Terminal::new(TestBackend::new(20, 2)).unwrap();
        terminal.draw(|f| f.render_widget(&c, f.size())).unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer.get(2, 1).symbol(), "h");
        assert_eq!(buffer.get(2, 1).fg, Color::Green);
    }
}
