//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph};

use super::runtime::App;
use super::style;
use crate::map::Position;
use crate::sim::types::SimState;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // header
            Constraint::Min(12),    // map + side panel
            Constraint::Length(8),  // notification feed
            Constraint::Length(1),  // footer
        ])
        .split(frame.area());

    let map_height = app.engine.map().height() as u16 + 2;
    let map_width = app.engine.map().width() as u16 + 2;
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(map_width), Constraint::Min(30)])
        .split(chunks[1]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // happiness gauge
            Constraint::Length(5), // status
            Constraint::Min(6),    // chart
        ])
        .split(middle[1]);

    render_header(frame, app, chunks[0]);
    render_map(frame, app, Rect { height: middle[0].height.min(map_height), ..middle[0] });
    render_happiness(frame, app, side[0]);
    render_status(frame, app, side[1]);
    render_chart(frame, app, side[2]);
    render_feed(frame, app, chunks[2]);
    render_footer(frame, chunks[3]);
}

/// Header bar: preset, date, money, happiness, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let engine = &app.engine;
    let state_icon = match engine.state() {
        SimState::GameOver => "■",
        SimState::Paused => "‖",
        _ => "▶",
    };

    let header = Line::from(vec![
        Span::styled(
            " ENERGY TYCOON ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(&app.preset_name, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ {} │ ${} │ ",
            engine.clock(),
            engine.player().money(),
        )),
        Span::styled(
            format!("☺ {}", engine.happiness()),
            Style::default().fg(style::happiness_color(engine.happiness())),
        ),
        Span::raw(format!(
            " │ x{} │ {} {} ",
            engine.speed(),
            state_icon,
            engine.state(),
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// The city grid, one colored glyph per cell.
fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let map = app.engine.map();
    let lines: Vec<Line> = (0..map.height() as i32)
        .map(|y| {
            let spans: Vec<Span> = (0..map.width() as i32)
                .filter_map(|x| map.cell(Position::new(x, y)))
                .map(|cell| {
                    Span::styled(
                        cell.glyph().to_string(),
                        Style::default().fg(style::cell_color(cell)),
                    )
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let block = Block::default().title(" City ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_happiness(frame: &mut Frame, app: &App, area: Rect) {
    let happiness = app.engine.happiness();
    let gauge = Gauge::default()
        .block(Block::default().title(" Happiness ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::happiness_color(happiness)))
        .ratio((f64::from(happiness) / 100.0).clamp(0.0, 1.0))
        .label(format!("{happiness}%"));
    frame.render_widget(gauge, area);
}

/// Latest tick figures and city totals.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = status_text(app).into_iter().map(Line::from).collect();
    let block = Block::default().title(" Status ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Status panel text, one entry per line.
fn status_text(app: &App) -> Vec<String> {
    let engine = &app.engine;
    let Some(r) = app.last_report() else {
        return vec!["  Waiting for first tick...".to_string()];
    };
    let satisfaction = engine
        .average_satisfaction()
        .map_or_else(|| "-".to_string(), |avg| format!("{avg:.1}"));
    let mood = engine.mood();
    vec![
        format!(
            "  prod={:>5}  demand={:>5}  price={:.3}",
            r.production, r.demand, r.price,
        ),
        format!(
            "  supplied={}/{}  revenue={}  taxes={}  maint={}",
            r.supplied_dwellings, r.total_dwellings, r.revenue, r.taxes, r.maintenance,
        ),
        format!(
            "  pop={}  satisfaction={}  happy={}  unhappy={}  plants={}  events={}",
            engine.population(),
            satisfaction,
            mood.happy,
            mood.very_unhappy,
            engine.map().grid().plant_count(),
            r.active_events,
        ),
    ]
}

/// Production vs demand over the recent history.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let production: Vec<(f64, f64)> = app
        .history
        .iter()
        .map(|r| (r.tick as f64, f64::from(r.production)))
        .collect();
    let demand: Vec<(f64, f64)> = app
        .history
        .iter()
        .map(|r| (r.tick as f64, f64::from(r.demand)))
        .collect();

    let y_bounds = style::auto_bounds_y(&production, &demand);
    let x_lo = production.first().map_or(0.0, |p| p.0);
    let x_hi = production.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let datasets = vec![
        Dataset::default()
            .name("Production")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::PRODUCTION_COLOR))
            .data(&production),
        Dataset::default()
            .name("Demand")
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(style::DEMAND_COLOR))
            .data(&demand),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Production vs Demand ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("tick")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{}", x_lo as u64), format!("{}", x_hi as u64)]),
        )
        .y_axis(
            Axis::default()
                .title("units")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.0}", y_bounds[0]),
                    format!("{:.0}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Most recent notifications, newest on top.
fn render_feed(frame: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = app
        .feed
        .iter()
        .take(visible)
        .map(|n| Line::from(format!("  {n}")))
        .collect();
    if let Some(cause) = app.engine.game_over_cause() {
        lines.insert(
            0,
            Line::from(Span::styled(
                format!("  GAME OVER: {cause}"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        );
        lines.truncate(visible);
    }

    let block = Block::default().title(" Notifications ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Speed  1/2/3:Easy/Normal/Hard  r:Restart",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
