use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gapminder::chart::{self, ChartLayout, PLOT_SPAN, SIZE_LABEL, X_LABEL, Y_LABEL};
use gapminder::{
    current_selection, filter_bubbles, Bubble, CountryPicker, MergedTable, YearSlider,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Circle, Line as CanvasLine},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, ListState, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PALETTE: [Color; chart::PALETTE_LEN] = [
    Color::Blue,
    Color::Red,
    Color::Green,
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
    Color::LightRed,
    Color::LightBlue,
    Color::LightGreen,
    Color::LightMagenta,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Chart,
    Data,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Chart => Page::Data,
            Page::Data => Page::Chart,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Chart => "Bubble Chart",
            Page::Data => "Data",
        }
    }
}

pub struct App {
    pub table: Arc<MergedTable>,
    pub slider: YearSlider,
    pub picker: CountryPicker,
    pub current_page: Page,
    pub list_state: ListState,
    pub defaults: Vec<String>,
    pub size_max: f64,
}

impl App {
    pub fn new(table: Arc<MergedTable>, defaults: Vec<String>, size_max: f64) -> Self {
        let (min, max) = table.year_range().unwrap_or((0, 0));
        let slider = YearSlider::new(min, max);
        let picker = CountryPicker::new(table.countries(), &defaults);

        let mut list_state = ListState::default();
        if !picker.options().is_empty() {
            list_state.select(Some(picker.cursor()));
        }

        Self {
            table,
            slider,
            picker,
            current_page: Page::Chart,
            list_state,
            defaults,
            size_max,
        }
    }

    /// Rows for the current year and countries, coerced
    pub fn bubbles(&self) -> Vec<Bubble> {
        filter_bubbles(&self.table, &current_selection(&self.slider, &self.picker))
    }

    pub fn chart(&self) -> ChartLayout {
        chart::layout(
            &self.bubbles(),
            self.slider.value(),
            self.picker.selected(),
            self.size_max,
        )
    }

    pub fn next_country(&mut self) {
        self.picker.next();
        self.sync_cursor();
    }

    pub fn previous_country(&mut self) {
        self.picker.previous();
        self.sync_cursor();
    }

    pub fn jump_to(&mut self, prefix: &str) {
        self.picker.jump_to(prefix);
        self.sync_cursor();
    }

    pub fn reset_countries(&mut self) {
        self.picker = CountryPicker::new(self.table.countries(), &self.defaults);
        self.sync_cursor();
    }

    fn sync_cursor(&mut self) {
        if !self.picker.options().is_empty() {
            self.list_state.select(Some(self.picker.cursor()));
        }
    }

    /// Apply a key press. Returns false when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::Left | KeyCode::Char('h') => self.slider.step_back(1),
            KeyCode::Right | KeyCode::Char('l') => self.slider.step_forward(1),
            KeyCode::PageDown => self.slider.step_back(10),
            KeyCode::PageUp => self.slider.step_forward(10),
            KeyCode::Home => self.slider.set(self.slider.bounds().0),
            KeyCode::End => self.slider.set(self.slider.bounds().1),
            KeyCode::Char('p') => self.slider.toggle_play(),
            KeyCode::Down | KeyCode::Char('j') => self.next_country(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_country(),
            KeyCode::Enter | KeyCode::Char(' ') => self.picker.toggle_current(),
            KeyCode::Char('c') => self.picker.clear(),
            KeyCode::Char('d') => self.reset_countries(),
            KeyCode::Char(ch) if ch.is_ascii_uppercase() => self.jump_to(&ch.to_string()),
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App, tick_rate: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key.code, key.modifiers) {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.slider.tick();
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Year slider
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_slider(f, chunks[1], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(75), // Chart or data
            Constraint::Percentage(25), // Country multiselect
        ])
        .split(chunks[2]);

    let chart = app.chart();
    match app.current_page {
        Page::Chart => render_chart(f, content_chunks[0], &chart),
        Page::Data => render_data(f, content_chunks[0], app),
    }
    render_countries(f, content_chunks[1], app, &chart);

    render_status_bar(f, chunks[3], app, &chart);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![Span::styled(
        "Gapminder",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    tab_spans.push(Span::raw("  |  "));

    for (i, page) in [Page::Chart, Page::Data].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rows: {}", app.table.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Countries: {}", app.picker.options().len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_slider(f: &mut Frame, area: Rect, app: &App) {
    let (min, max) = app.slider.bounds();
    let state = if app.slider.playing { "▶" } else { "⏸" };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Select year ({} - {}) ", min, max)),
        )
        .gauge_style(Style::default().fg(Color::Yellow).bg(Color::DarkGray))
        .ratio(app.slider.ratio())
        .label(format!("{} {}", state, app.slider.value()));

    f.render_widget(gauge, area);
}

fn render_chart(f: &mut Frame, area: Rect, chart: &ChartLayout) {
    let x_ticks = chart.x_ticks(5);
    let y_ticks = chart.y_ticks(5);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", chart.title)),
        )
        .marker(Marker::Braille)
        .x_bounds([-14.0, PLOT_SPAN + 4.0])
        .y_bounds([-10.0, PLOT_SPAN + 4.0])
        .paint(move |ctx| {
            // Axes
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2: PLOT_SPAN,
                y2: 0.0,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2: 0.0,
                y2: PLOT_SPAN,
                color: Color::DarkGray,
            });

            for (pos, label) in &x_ticks {
                ctx.print(*pos, -4.0, label.clone());
            }
            for (pos, label) in &y_ticks {
                ctx.print(-13.0, *pos, label.clone());
            }
            ctx.print(PLOT_SPAN / 2.0 - 8.0, -9.0, X_LABEL);
            ctx.print(1.0, PLOT_SPAN + 2.0, Y_LABEL);

            ctx.layer();

            for bubble in &chart.bubbles {
                ctx.draw(&Circle {
                    x: bubble.x,
                    y: bubble.y,
                    radius: bubble.radius.max(0.5),
                    color: PALETTE[bubble.color],
                });
            }
        });

    f.render_widget(canvas, area);
}

fn render_data(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["Country", X_LABEL, Y_LABEL, SIZE_LABEL]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.bubbles().into_iter().map(|bubble| {
        let color = if bubble.is_plottable() {
            Color::White
        } else {
            Color::DarkGray
        };

        let cells = vec![
            Cell::from(bubble.country.clone()),
            Cell::from(format_value(bubble.gni_per_capita, 0)),
            Cell::from(format_value(bubble.lex, 1)),
            Cell::from(format_value(bubble.population, 0)),
        ];

        Row::new(cells).style(Style::default().fg(color)).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Year {} ", app.slider.value())),
    );

    f.render_widget(table, area);
}

fn render_countries(f: &mut Frame, area: Rect, app: &mut App, chart: &ChartLayout) {
    let items: Vec<ListItem> = app
        .picker
        .options()
        .iter()
        .map(|country| {
            let color = chart
                .bubbles
                .iter()
                .find(|b| &b.country == country)
                .map(|b| PALETTE[b.color]);

            let marker = match (app.picker.is_selected(country), color) {
                (true, Some(c)) => Span::styled("● ", Style::default().fg(c)),
                (true, None) => Span::styled("○ ", Style::default().fg(Color::DarkGray)),
                (false, _) => Span::raw("  "),
            };

            ListItem::new(Line::from(vec![marker, Span::raw(country.clone())]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Countries ({}) ", app.picker.selected().len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, chart: &ChartLayout) {
    let mut status_spans = vec![Span::styled(
        format!(" Bubbles: {} ", chart.bubbles.len()),
        Style::default().fg(Color::Cyan),
    )];

    if !chart.omitted.is_empty() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("No data: {}", truncate(&chart.omitted.join(", "), 30)),
            Style::default().fg(Color::Red),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Year | "));
    status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(if app.slider.playing { " Pause | " } else { " Play | " }));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("Space", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Select | "));
    status_spans.push(Span::styled("c/d", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Clear/Defaults | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gapminder::{CellValue, MergedRecord};

    fn record(country: &str, year: i32, lex: f64, gni: &str, pop: &str) -> MergedRecord {
        MergedRecord {
            country: country.to_string(),
            year,
            lex: Some(CellValue::Number(lex)),
            gni_per_capita: Some(CellValue::from(gni)),
            population: Some(CellValue::from(pop)),
        }
    }

    fn app() -> App {
        let table = MergedTable {
            records: vec![
                record("Germany", 2000, 78.0, "30k", "82M"),
                record("Germany", 2001, 78.5, "31k", "82M"),
                record("USA", 2000, 77.0, "45k", "282M"),
                record("USA", 2001, 77.2, "46k", "285M"),
                record("Vietnam", 2000, 70.0, "2k", "79M"),
                record("Vietnam", 2001, 70.5, "2.1k", "80M"),
            ],
        };
        let defaults = vec!["Germany".to_string(), "USA".to_string(), "Vietnam".to_string()];
        App::new(Arc::new(table), defaults, 60.0)
    }

    #[test]
    fn test_app_starts_at_min_year_with_defaults() {
        let app = app();

        assert_eq!(app.slider.value(), 2000);
        assert_eq!(app.picker.selected().len(), 3);
        assert_eq!(app.bubbles().len(), 3);
        assert_eq!(app.chart().title, "Year 2000");
    }

    #[test]
    fn test_year_keys() {
        let mut app = app();

        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.slider.value(), 2001);
        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.slider.value(), 2001);
        app.handle_key(KeyCode::Home, KeyModifiers::NONE);
        assert_eq!(app.slider.value(), 2000);
    }

    #[test]
    fn test_selection_keys() {
        let mut app = app();

        app.handle_key(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(app.bubbles().is_empty());

        app.handle_key(KeyCode::Char('U'), KeyModifiers::SHIFT);
        app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE);
        let bubbles = app.bubbles();
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].country, "USA");

        app.handle_key(KeyCode::Char('d'), KeyModifiers::NONE);
        assert_eq!(app.bubbles().len(), 3);
    }

    #[test]
    fn test_quit_and_page_keys() {
        let mut app = app();

        assert!(app.handle_key(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(app.current_page, Page::Data);
        assert!(!app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE));
    }

    #[test]
    fn test_truncate_and_format() {
        assert_eq!(truncate("Germany", 10), "Germany");
        assert_eq!(truncate("Germany, Vietnam", 10), "Germany...");
        assert_eq!(format_value(Some(77.26), 1), "77.3");
        assert_eq!(format_value(None, 0), "-");
    }
}
