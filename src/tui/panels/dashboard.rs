use crate::metrics::MetricsSnapshot;
use crate::tui::canvas::{Canvas, Severity, StyleHint};

pub const TITLE: &str = "OOPUO ENTERPRISE v1.0";
pub const FOOTER: &str = "[ OOPUO Enterprise | Privacy-First AI Infrastructure ]";

const HEADER_COL: u16 = 2;
const HEADER_INNER: usize = 39;

const METRICS_COL: u16 = 4;
const GAUGE_COL: u16 = 24;
const TIME_ROW: u16 = 4;
const CPU_ROW: u16 = 6;
const MEM_ROW: u16 = 7;
const ORCHESTRATOR_ROW: u16 = 9;
const JOBS_ROW: u16 = 10;
const DETAIL_ROW: u16 = 12;

const MENU_COL: u16 = 4;
const MENU_INNER: usize = 23;
/// Distance of the menu's top border from the bottom edge.
pub const MENU_OFFSET: u16 = 8;
const MENU_ITEMS: [&str; 4] = [
    "[N] Nomad UI",
    "[J] List Jobs",
    "[L] View Logs",
    "[Q] Quit",
];

/// Draw one full dashboard frame for `snapshot`. Anything that does not fit
/// the canvas is clipped or left out.
pub fn render_dashboard_panel(canvas: &mut Canvas, snapshot: &MetricsSnapshot) {
    let menu_row = menu_anchor(canvas.height());

    render_header(canvas);
    render_metrics(canvas, snapshot, menu_row);
    if let Some(row) = menu_row {
        render_menu(canvas, row);
    }
    render_footer(canvas);
}

/// Top row of the navigation menu, or `None` when the surface is too short
/// for it to sit below the metrics.
pub fn menu_anchor(height: u16) -> Option<u16> {
    height
        .checked_sub(MENU_OFFSET)
        .filter(|&row| row > JOBS_ROW)
}

fn render_header(canvas: &mut Canvas) {
    let rule = "═".repeat(HEADER_INNER);
    canvas.write_text(0, HEADER_COL, &format!("╔{rule}╗"), StyleHint::Info);
    canvas.write_text(
        1,
        HEADER_COL,
        &format!("║{TITLE:^width$}║", width = HEADER_INNER),
        StyleHint::Info,
    );
    canvas.write_text(2, HEADER_COL, &format!("╚{rule}╝"), StyleHint::Info);
}

fn render_metrics(canvas: &mut Canvas, snapshot: &MetricsSnapshot, menu_row: Option<u16>) {
    canvas.write_text(
        TIME_ROW,
        METRICS_COL,
        &format!("⏰ Time: {}", snapshot.timestamp),
        StyleHint::Success,
    );

    let cpu = snapshot.cpu_percent;
    canvas.write_text(
        CPU_ROW,
        METRICS_COL,
        &format!("🔥 CPU:  {cpu:5.1}%"),
        Severity::of_percent(cpu).hint(),
    );
    canvas.draw_gauge(CPU_ROW, GAUGE_COL, cpu, 100.0);

    let mem = snapshot.mem_percent;
    canvas.write_text(
        MEM_ROW,
        METRICS_COL,
        &format!("💾 MEM:  {mem:5.1}%"),
        Severity::of_percent(mem).hint(),
    );
    canvas.draw_gauge(MEM_ROW, GAUGE_COL, mem, 100.0);

    let active = snapshot.orchestrator.is_active();
    let (icon, hint) = if active {
        ("●", StyleHint::Success)
    } else {
        ("○", StyleHint::Danger)
    };
    canvas.write_text(
        ORCHESTRATOR_ROW,
        METRICS_COL,
        &format!("🚀 Nomad: {icon} {}", snapshot.orchestrator),
        hint,
    );

    canvas.write_text(
        JOBS_ROW,
        METRICS_COL,
        &format!("📦 Jobs:  {} running", snapshot.running_jobs),
        StyleHint::Success,
    );

    if let Some(detail) = &snapshot.error_detail {
        if menu_row.is_none_or(|row| DETAIL_ROW < row) {
            canvas.write_text(
                DETAIL_ROW,
                METRICS_COL,
                &format!("⚠ {detail}"),
                StyleHint::Danger,
            );
        }
    }
}

fn render_menu(canvas: &mut Canvas, top: u16) {
    let rule = "═".repeat(MENU_INNER);
    let mut row = top;

    canvas.write_text(row, MENU_COL, &format!("╔{rule}╗"), StyleHint::Info);
    row += 1;
    canvas.write_text(
        row,
        MENU_COL,
        &format!("║{:<width$}║", "    NAVIGATION", width = MENU_INNER),
        StyleHint::Info,
    );
    row += 1;
    for item in MENU_ITEMS {
        canvas.write_text(
            row,
            MENU_COL,
            &format!("║  {item:<width$}║", width = MENU_INNER - 2),
            StyleHint::Plain,
        );
        row += 1;
    }
    canvas.write_text(row, MENU_COL, &format!("╚{rule}╝"), StyleHint::Info);
}

fn render_footer(canvas: &mut Canvas) {
    if let Some(row) = canvas.height().checked_sub(1) {
        canvas.write_text(row, HEADER_COL, FOOTER, StyleHint::Info);
    }
}

/// Centered transient message over the current frame.
pub fn render_notice(canvas: &mut Canvas, message: &str) {
    let width = message.chars().count();
    let col = usize::from(canvas.width()).saturating_sub(width) / 2;
    let col = u16::try_from(col).unwrap_or(0);
    canvas.write_text(canvas.height() / 2, col, message, StyleHint::Warning);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::OrchestratorStatus;
    use crate::tui::canvas::Palette;
    use ratatui::layout::Rect;
    use ratatui::style::Color;

    fn canvas(width: u16, height: u16) -> Canvas {
        Canvas::new(Rect::new(0, 0, width, height), Palette::standard())
    }

    fn snapshot(
        cpu: f64,
        mem: f64,
        orchestrator: OrchestratorStatus,
        jobs: u32,
    ) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu_percent: cpu,
            mem_percent: mem,
            orchestrator,
            running_jobs: jobs,
            timestamp: "2024-05-01 12:00:00".to_string(),
            error_detail: None,
        }
    }

    /// Foreground of the first cell on `row` holding `symbol`.
    fn fg_at(canvas: &Canvas, row: u16, symbol: &str) -> Color {
        let x = (0..canvas.width())
            .find(|&x| canvas.buffer().get(x, row).symbol() == symbol)
            .unwrap_or_else(|| panic!("{symbol} not on row {row}: {}", canvas.row_text(row)));
        canvas.buffer().get(x, row).fg
    }

    #[test]
    fn hot_cpu_renders_critical_with_full_gauge() {
        let mut c = canvas(80, 24);
        render_dashboard_panel(&mut c, &snapshot(95.0, 50.0, OrchestratorStatus::Active, 3));
        assert!(c.row_text(CPU_ROW).contains("CPU:   95.0%"));
        assert_eq!(fg_at(&c, CPU_ROW, "C"), Color::Red);
        assert_eq!(c.row_text(CPU_ROW).matches('█').count(), 19);

        assert!(c.row_text(MEM_ROW).contains("MEM:   50.0%"));
        assert_eq!(fg_at(&c, MEM_ROW, "M"), Color::Green);
        assert_eq!(c.row_text(MEM_ROW).matches('█').count(), 10);
    }

    #[test]
    fn warning_band_uses_warning_style() {
        let mut c = canvas(80, 24);
        render_dashboard_panel(&mut c, &snapshot(70.0, 89.9, OrchestratorStatus::Active, 0));
        assert_eq!(fg_at(&c, CPU_ROW, "C"), Color::Yellow);
        assert_eq!(fg_at(&c, MEM_ROW, "M"), Color::Yellow);
    }

    #[test]
    fn orchestrator_line_reflects_health() {
        let mut c = canvas(80, 24);
        render_dashboard_panel(&mut c, &snapshot(1.0, 1.0, OrchestratorStatus::Active, 2));
        let row = c.row_text(ORCHESTRATOR_ROW);
        assert!(row.contains("● active"), "{row}");
        assert_eq!(fg_at(&c, ORCHESTRATOR_ROW, "N"), Color::Green);
        assert!(c.row_text(JOBS_ROW).contains("2 running"));

        let mut c = canvas(80, 24);
        render_dashboard_panel(&mut c, &snapshot(1.0, 1.0, OrchestratorStatus::Inactive, 0));
        assert!(c.row_text(ORCHESTRATOR_ROW).contains("○ inactive"));
        assert_eq!(fg_at(&c, ORCHESTRATOR_ROW, "N"), Color::Red);
    }

    #[test]
    fn header_title_and_footer_positions() {
        let mut c = canvas(80, 24);
        render_dashboard_panel(&mut c, &snapshot(0.0, 0.0, OrchestratorStatus::Active, 0));

        assert!(c.row_text(0).starts_with("  ╔═"));
        assert!(c.row_text(1).contains(TITLE));
        assert_eq!(fg_at(&c, 1, "O"), Color::Cyan);
        assert!(c.row_text(23).contains("OOPUO Enterprise"));
        assert!(c.row_text(4).contains("2024-05-01 12:00:00"));
    }

    #[test]
    fn menu_is_anchored_to_bottom() {
        let mut c = canvas(80, 30);
        render_dashboard_panel(&mut c, &snapshot(0.0, 0.0, OrchestratorStatus::Active, 0));

        assert!(c.row_text(22).contains("╔"));
        assert!(c.row_text(23).contains("NAVIGATION"));
        assert!(c.row_text(24).contains("[N] Nomad UI"));
        assert!(c.row_text(27).contains("[Q] Quit"));
        assert!(c.row_text(28).contains("╚"));
        assert!(c.row_text(29).contains("Privacy-First"));
    }

    #[test]
    fn tiny_surfaces_do_not_panic() {
        let s = MetricsSnapshot::degraded("boom", "2024-05-01 12:00:00".into());
        for (w, h) in [(0, 0), (1, 1), (10, 3), (30, 8), (80, 12), (5, 40)] {
            let mut c = canvas(w, h);
            render_dashboard_panel(&mut c, &s);
            render_notice(&mut c, "Nomad UI: http://localhost:4646");
        }
    }

    #[test]
    fn short_surface_skips_menu() {
        assert_eq!(menu_anchor(7), None);
        assert_eq!(menu_anchor(18), None);
        assert_eq!(menu_anchor(19), Some(11));

        let mut c = canvas(80, 16);
        render_dashboard_panel(&mut c, &snapshot(0.0, 0.0, OrchestratorStatus::Active, 0));
        assert!((0..16).all(|r| !c.row_text(r).contains("NAVIGATION")));
        assert!(c.row_text(15).contains("Privacy-First"));
    }

    #[test]
    fn degraded_snapshot_shows_detail() {
        let mut c = canvas(80, 24);
        let s = MetricsSnapshot::degraded("`top` did not finish", "2024-05-01 12:00:00".into());
        render_dashboard_panel(&mut c, &s);

        assert!(c.row_text(ORCHESTRATOR_ROW).contains("○ error"));
        assert!(c.row_text(DETAIL_ROW).contains("did not finish"));
        assert_eq!(fg_at(&c, DETAIL_ROW, "d"), Color::Red);
    }

    #[test]
    fn notice_is_centered() {
        let mut c = canvas(40, 10);
        render_notice(&mut c, "0123456789");
        assert_eq!(c.buffer().get(15, 5).symbol(), "0");
        assert_eq!(c.buffer().get(15, 5).fg, Color::Yellow);
    }
}
