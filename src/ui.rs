use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use resale_valuation::{value, ValuationRecord};
use std::collections::HashMap;
use std::io;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Valuations,
    BrandTiers,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Valuations => Page::BrandTiers,
            Page::BrandTiers => Page::Valuations,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Valuations => "Valuations",
            Page::BrandTiers => "Brand Tiers",
        }
    }
}

/// One row of the tier summary page
#[derive(Debug, Clone, PartialEq)]
pub struct TierSummary {
    pub tier: String,
    pub count: usize,
    pub total_initial: f64,
    pub total_current: f64,
}

pub struct App {
    pub records: Vec<ValuationRecord>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
}

impl App {
    pub fn new(records: Vec<ValuationRecord>) -> Self {
        let mut state = TableState::default();
        if !records.is_empty() {
            state.select(Some(0));
        }

        Self {
            records,
            state,
            current_page: Page::Valuations,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn selected_record(&self) -> Option<&ValuationRecord> {
        self.state.selected().and_then(|i| self.records.get(i))
    }

    /// Totals per brand tier, largest first. Unmatched brands group as "Unmatched".
    pub fn tier_summary(&self) -> Vec<TierSummary> {
        let mut summary: HashMap<String, (usize, f64, f64)> = HashMap::new();

        for record in &self.records {
            let tier = resale_valuation::brand_tier(&record.item.brand)
                .map(|t| t.as_str())
                .unwrap_or("Unmatched");
            let entry = summary.entry(tier.to_string()).or_insert((0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += record.item.initial_price;
            entry.2 += record.current_price;
        }

        let mut result: Vec<_> = summary
            .into_iter()
            .map(|(tier, (count, total_initial, total_current))| TierSummary {
                tier,
                count,
                total_initial,
                total_current,
            })
            .collect();

        result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tier.cmp(&b.tier)));
        result
    }

    pub fn next(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_STEP).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(PAGE_STEP)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn first(&mut self) {
        if !self.records.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        if !self.records.is_empty() {
            self.state.select(Some(self.records.len() - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "UI loop failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab | KeyCode::BackTab => app.next_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Valuations {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Valuations => render_table(f, chunks[1], app),
            Page::BrandTiers => render_tier_summary(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Valuations, Page::BrandTiers].iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let appreciating = app.records.iter().filter(|r| r.compound_rate > 1.0).count();

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", app.records.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("↑ {}", appreciating),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("↓ {}", app.records.len() - appreciating),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Brand", "Category", "Condition", "Age", "Initial", "Current", "Kept"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.records.iter().map(|record| {
        let color = if record.compound_rate > 1.0 {
            Color::Green
        } else if record.compound_rate < 1.0 {
            Color::Red
        } else {
            Color::White
        };

        let cells = vec![
            Cell::from(truncate(&record.item.brand, 22)),
            Cell::from(truncate(&record.item.category, 14)),
            Cell::from(record.item.condition.as_str()),
            Cell::from(format!("{}m", record.item.age_in_months)),
            Cell::from(format!("{:.2}", record.item.initial_price)),
            Cell::from(format!("{:.2}", record.current_price)).style(Style::default().fg(color)),
            Cell::from(format!("{:.0}%", record.retention() * 100.0))
                .style(Style::default().fg(color)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(16),
            Constraint::Length(11),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Valuations "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_tier_summary(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["Brand Tier", "Items", "Initial Total", "Current Total", "Kept"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.tier_summary().into_iter().map(|summary| {
        let kept = if summary.total_initial > 0.0 {
            summary.total_current / summary.total_initial * 100.0
        } else {
            0.0
        };

        Row::new(vec![
            Cell::from(summary.tier),
            Cell::from(summary.count.to_string()),
            Cell::from(format!("{:.2}", summary.total_initial)),
            Cell::from(format!("{:.2}", summary.total_current)),
            Cell::from(format!("{:.0}%", kept)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Brand Tiers "),
    );

    f.render_widget(table, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(record) = app.selected_record() else {
        let empty = Paragraph::new("No valuation selected")
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        f.render_widget(empty, area);
        return;
    };

    // Recompute the breakdown; the engine is pure so it matches the stored price
    let valuation = value(&record.item);
    let label = Style::default().fg(Color::Cyan);
    let tier = |name: Option<&'static str>| name.unwrap_or("unmatched").to_string();

    let lines = vec![
        Line::from(vec![
            Span::styled("Brand:     ", label),
            Span::raw(format!(
                "{} ×{:.2} ({})",
                record.item.brand,
                valuation.factors.brand,
                tier(valuation.brand_tier.map(|t| t.as_str()))
            )),
        ]),
        Line::from(vec![
            Span::styled("Category:  ", label),
            Span::raw(format!(
                "{} ×{:.2} ({})",
                record.item.category,
                valuation.factors.category,
                tier(valuation.category_tier.map(|t| t.as_str()))
            )),
        ]),
        Line::from(vec![
            Span::styled("Condition: ", label),
            Span::raw(format!("{} ×{:.2}", record.item.condition, valuation.factors.condition)),
        ]),
        Line::from(vec![
            Span::styled("Material:  ", label),
            Span::raw(format!(
                "{} ×{:.2} ({})",
                record.item.material,
                valuation.factors.material,
                tier(valuation.material_tier.map(|t| t.as_str()))
            )),
        ]),
        Line::from(vec![
            Span::styled("Rarity:    ", label),
            Span::raw(format!("{} ×{:.2}", record.item.rarity, valuation.factors.rarity)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Rate:      ", label),
            Span::raw(format!("{:.6} / year", valuation.compound_rate)),
        ]),
        Line::from(vec![
            Span::styled("Age:       ", label),
            Span::raw(format!("{:.2} years", valuation.years)),
        ]),
        Line::from(vec![
            Span::styled("Price:     ", label),
            Span::raw(format!(
                "{:.2} → {:.2}",
                record.item.initial_price, record.current_price
            )),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("By:        ", label),
            Span::raw(record.submitted_by.clone()),
        ]),
        Line::from(vec![
            Span::styled("Source:    ", label),
            Span::raw(format!("{} #{}", record.source, record.line_number)),
        ]),
        Line::from(vec![
            Span::styled("Created:   ", label),
            Span::raw(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]),
        Line::from(""),
        Line::from(Span::raw(record.commentary.clone())),
    ];

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Details "),
        );

    f.render_widget(detail, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.records.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
