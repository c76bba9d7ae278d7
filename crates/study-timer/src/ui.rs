//! UI rendering

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, Paragraph, Tabs},
    Frame,
};
use study_core::format;
use study_timer::{Alarm, Clock, Phase};

use crate::app::{App, Tab};

/// Smallest bar height (percent of the chart) so empty days stay visible
const MIN_BAR_PERCENT: u64 = 2;

/// Main draw function
pub fn draw<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>) {
    // Create main layout: header, content, footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match app.tab {
        Tab::Timer => draw_timer(f, app, chunks[1]),
        Tab::Analytics => draw_analytics(f, app, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
    if app.confirm_clear {
        draw_confirm_overlay(f);
    }
}

fn draw_header<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let tabs = Tabs::new(vec![" 1 Timer ", " 2 Analytics "])
        .select(app.tab.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).bold())
        .block(
            Block::default()
                .title(" Study Timer ")
                .title_style(Style::default().fg(Color::Cyan).bold())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    f.render_widget(tabs, area);
}

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Idle => Color::Blue,
        Phase::Running => Color::Green,
        Phase::Paused => Color::Yellow,
    }
}

fn draw_timer<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let view = app.timer.view();
    let color = phase_color(view.phase);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Spacer
            Constraint::Length(1), // Clock
            Constraint::Length(1), // Phase
            Constraint::Length(1),
            Constraint::Length(3), // Progress
            Constraint::Length(1), // Session time
            Constraint::Length(1), // Status
            Constraint::Length(1),
            Constraint::Length(1), // Duration
            Constraint::Length(1), // Buttons
            Constraint::Min(0),    // Spacer
        ])
        .split(inner);

    let clock = Paragraph::new(format::clock(view.remaining_seconds))
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(clock, sections[1]);

    let phase = Paragraph::new(view.phase.as_str().to_uppercase())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(phase, sections[2]);

    let gauge_area = centered_width(sections[4], 60);
    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(view.progress.clamp(0.0, 1.0))
        .label(format!("{:.0}%", view.progress * 100.0));
    f.render_widget(progress, gauge_area);

    let session_time = if view.active {
        format!("Session time: {}", format::elapsed(view.elapsed_millis))
    } else {
        String::new()
    };
    f.render_widget(
        Paragraph::new(session_time)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        sections[5],
    );

    f.render_widget(
        Paragraph::new(app.status_line())
            .style(Style::default().fg(Color::White).bold())
            .alignment(Alignment::Center),
        sections[6],
    );

    let settings = app.timer.settings();
    let controls = app.timer.controls();
    let duration_style = enabled_style(controls.duration_inputs);
    let duration = Line::from(vec![
        Span::raw("Duration: "),
        Span::styled(format!("{}h {}m", settings.hours, settings.minutes), duration_style),
        Span::styled("  (h/H m/M)", Style::default().fg(Color::DarkGray)),
    ])
    .centered();
    f.render_widget(Paragraph::new(duration), sections[8]);

    let buttons = Line::from(vec![
        button("s", "Start", controls.start),
        Span::raw("   "),
        button("p", "Pause", controls.pause),
        Span::raw("   "),
        button("x", "Stop", controls.stop),
    ])
    .centered();
    f.render_widget(Paragraph::new(buttons), sections[9]);
}

fn enabled_style(enabled: bool) -> Style {
    if enabled {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn button(key: &str, label: &str, enabled: bool) -> Span<'static> {
    Span::styled(format!("[{}] {}", key, label), enabled_style(enabled))
}

fn centered_width(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    let x = area.x + (area.width - width) / 2;
    Rect::new(x, area.y, width, area.height)
}

fn draw_analytics<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),      // Stat cards
            Constraint::Percentage(50), // Chart
            Constraint::Min(0),         // Recent sessions
        ])
        .split(area);

    draw_stat_cards(f, app, rows[0]);
    draw_chart(f, app, rows[1]);
    draw_recent(f, app, rows[2]);
}

fn draw_stat_cards<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let stats = &app.analytics;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let cards = [
        ("Today", format::total(stats.today_total), Color::Green),
        ("This Week", format::total(stats.week_total), Color::Blue),
        ("Completed", stats.total_sessions_count.to_string(), Color::Magenta),
        ("Avg. Session", format::duration(stats.average_duration), Color::Yellow),
    ];

    for ((title, value, color), col) in cards.into_iter().zip(cols.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).bold(),
        )))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .title_style(Style::default().fg(color))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(card, *col);
    }
}

fn draw_chart<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let series = &app.analytics.daily_series;
    let bars: Vec<Bar> = series
        .days
        .iter()
        .zip(series.fractions())
        .map(|(day, fraction)| {
            let percent = ((fraction * 100.0).round() as u64).max(MIN_BAR_PERCENT);
            Bar::default()
                .value(percent)
                .text_value(format::duration(day.seconds as f64))
                .label(Line::from(day.label.clone()))
        })
        .collect();

    // Fit seven bars into the panel
    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / 7).saturating_sub(1).clamp(3, 12);

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Last 7 Days ")
                .title_style(Style::default().fg(Color::Cyan).bold())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(100)
        .bar_style(Style::default().fg(Color::Green))
        .value_style(Style::default().fg(Color::Black).bg(Color::Green));

    f.render_widget(chart, area);
}

fn draw_recent<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let sessions = &app.analytics.recent_sessions;

    let items: Vec<Line> = if sessions.is_empty() {
        vec![Line::from(Span::styled(
            " No study sessions yet. Start your first timer!",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        sessions
            .iter()
            .take(area.height.saturating_sub(2) as usize)
            .map(|s| {
                let (marker, color) = if s.completed {
                    ("\u{2713}", Color::Green)
                } else {
                    ("\u{25cb}", Color::Yellow)
                };
                Line::from(vec![
                    Span::styled(format!(" {} ", marker), Style::default().fg(color)),
                    Span::styled(
                        format!("{} ", s.timestamp.with_timezone(&Local).format("%a %b %d %H:%M")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(format::duration(s.duration_seconds as f64)),
                    Span::styled(
                        if s.completed { "" } else { "  partial" },
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .title(" Recent Sessions ")
        .title_style(Style::default().fg(Color::Magenta).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    f.render_widget(Paragraph::new(items).block(block), area);
}

fn draw_footer<C: Clock, A: Alarm>(f: &mut Frame, app: &App<C, A>, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan).bold());

    let mut spans = vec![key(" q"), Span::raw(" quit  ")];
    match app.tab {
        Tab::Timer => spans.extend([
            key("s"),
            Span::raw(" start  "),
            key("p"),
            Span::raw(" pause  "),
            key("x"),
            Span::raw(" stop  "),
        ]),
        Tab::Analytics => spans.extend([
            key("e"),
            Span::raw(" export  "),
            key("c"),
            Span::raw(" clear  "),
        ]),
    }
    spans.extend([key("Tab"), Span::raw(" switch  "), key("?"), Span::raw(" help")]);

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}

fn popup(f: &Frame, width: u16, height: u16) -> Rect {
    let area = f.area();
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn draw_help_overlay(f: &mut Frame) {
    let popup_area = popup(f, 50, 16);

    // Clear the area behind the popup
    f.render_widget(Clear, popup_area);

    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(""),
        entry("  s / Space  ", "Start or resume"),
        entry("  p          ", "Pause"),
        entry("  x          ", "Stop (30s+ runs are saved)"),
        entry("  h / H      ", "Hours +1 / -1"),
        entry("  m / M      ", "Minutes +1 / -1"),
        entry("  Tab 1 2    ", "Switch timer / analytics"),
        entry("  e          ", "Export to current directory"),
        entry("  c          ", "Clear all data"),
        entry("  q / Esc    ", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Duration can only change while idle",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    ];

    let help_popup = Paragraph::new(help_text).block(
        Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(Style::default().fg(Color::Yellow).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(help_popup, popup_area);
}

fn draw_confirm_overlay(f: &mut Frame) {
    let popup_area = popup(f, 54, 7);
    f.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(""),
        Line::from("Clear all study data? This cannot be undone.").centered(),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Red).bold()),
            Span::raw(" clear   "),
            Span::styled("any other key", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" cancel"),
        ])
        .centered(),
    ];

    let confirm = Paragraph::new(text).block(
        Block::default()
            .title(" Clear Data ")
            .title_style(Style::default().fg(Color::Red).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );

    f.render_widget(confirm, popup_area);
}
