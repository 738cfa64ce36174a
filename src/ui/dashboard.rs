//! Dashboard screen rendering
//!
//! Lays out one region per enabled feature: the alert banner across the top
//! (only while an alert is active), clock and weather beneath it, then news
//! beside network info and the speed test, and a key hint footer.

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::feature::FeatureKind;
use crate::view::{
    AlertBanner, ClockView, NetworkView, NewsView, Panel, SpeedView, WeatherView,
};

const LOADING: &str = "Loading\u{2026}";

/// Renders the dashboard for the current app state
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let banner_height = if app.alert_active { 3 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height),
            Constraint::Length(9),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    if app.alert_active {
        if let Some(Panel::Alert(banner)) = app.panel(FeatureKind::Alerts) {
            render_alert_banner(frame, banner, rows[0]);
        }
    }

    render_row(frame, app, &[FeatureKind::Clock, FeatureKind::Weather], rows[1]);
    render_lower_row(frame, app, rows[2]);
    render_footer(frame, app, rows[3]);
}

/// Splits `area` evenly between the enabled features in `kinds`
fn render_row(frame: &mut Frame, app: &App, kinds: &[FeatureKind], area: Rect) {
    let enabled: Vec<FeatureKind> = kinds.iter().copied().filter(|k| app.has_region(*k)).collect();
    if enabled.is_empty() {
        return;
    }

    let constraints = vec![Constraint::Ratio(1, enabled.len() as u32); enabled.len()];
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (kind, column) in enabled.iter().zip(columns.iter()) {
        render_region(frame, app, *kind, *column);
    }
}

/// News on the left, network info stacked over the speed test on the right
fn render_lower_row(frame: &mut Frame, app: &App, area: Rect) {
    let has_news = app.has_region(FeatureKind::News);
    let side: Vec<FeatureKind> = [FeatureKind::Network, FeatureKind::SpeedTest]
        .into_iter()
        .filter(|k| app.has_region(*k))
        .collect();

    let side_area = match (has_news, side.is_empty()) {
        (false, true) => return,
        (true, true) => {
            render_region(frame, app, FeatureKind::News, area);
            return;
        }
        (false, false) => area,
        (true, false) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area);
            render_region(frame, app, FeatureKind::News, columns[0]);
            columns[1]
        }
    };

    let constraints = vec![Constraint::Ratio(1, side.len() as u32); side.len()];
    let stacked = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(side_area);
    for (kind, cell) in side.iter().zip(stacked.iter()) {
        render_region(frame, app, *kind, *cell);
    }
}

fn region_block(app: &App, kind: FeatureKind) -> Block<'static> {
    let border = if app.alert_active { Color::Red } else { Color::Cyan };
    Block::default()
        .title(format!(" {} ", kind.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn render_region(frame: &mut Frame, app: &App, kind: FeatureKind, area: Rect) {
    let lines = match app.panel(kind) {
        None => vec![Line::from(Span::styled(
            LOADING,
            Style::default().fg(Color::DarkGray),
        ))],
        Some(Panel::Clock(view)) => clock_lines(view),
        Some(Panel::Weather(view)) => weather_lines(view),
        Some(Panel::News(view)) => news_lines(view),
        Some(Panel::Network(view)) => network_lines(view),
        Some(Panel::Speed(view)) => speed_lines(view),
        Some(Panel::Unavailable { message, .. }) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::DarkGray),
        ))],
        // The banner has its own row
        Some(Panel::Alert(_)) => return,
    };

    let alignment = if kind == FeatureKind::Clock {
        Alignment::Center
    } else {
        Alignment::Left
    };

    let paragraph = Paragraph::new(lines)
        .block(region_block(app, kind))
        .alignment(alignment)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_alert_banner(frame: &mut Frame, banner: &AlertBanner, area: Rect) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        banner.text.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .style(Style::default().bg(Color::Red))
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn clock_lines(view: &ClockView) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            view.time.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(view.date.clone()),
    ]
}

fn weather_lines(view: &WeatherView) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            view.location.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(view.summary.clone()),
        Line::from(""),
    ];

    let mut labels = Vec::new();
    let mut temps = Vec::new();
    for cell in &view.forecast {
        labels.push(Span::styled(
            format!("{:<9}", cell.label),
            Style::default().fg(Color::Cyan),
        ));
        temps.push(Span::raw(format!("{} {:<6}", cell.glyph, cell.temperature)));
    }
    if !labels.is_empty() {
        lines.push(Line::from(labels));
        lines.push(Line::from(temps));
    }

    lines
}

fn news_lines(view: &NewsView) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        view.source.clone(),
        Style::default().fg(Color::DarkGray),
    ))];
    lines.extend(
        view.headlines
            .iter()
            .map(|headline| Line::from(format!("\u{2022} {}", headline))),
    );
    lines
}

fn network_lines(view: &NetworkView) -> Vec<Line<'static>> {
    view.rows
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{:<10}", label), Style::default().fg(Color::Yellow)),
                Span::raw(value.clone()),
            ])
        })
        .collect()
}

fn speed_lines(view: &SpeedView) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            view.headline.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            view.detail.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh  "),
    ];
    if app.has_region(FeatureKind::SpeedTest) {
        spans.push(Span::styled("s", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(" speed test  "));
    }
    spans.push(Span::styled("?", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" help"));

    if let Some(updated) = app.last_data_update() {
        spans.push(Span::styled(
            format!("   Updated {}", updated.with_timezone(&Local).format("%-I:%M:%S %p")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
