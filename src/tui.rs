use std::io;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::{Diagnostic, IntoDiagnostic};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::app::{App, ProgressEvent, ProgressSink, TableReport};
use crate::domain::{AnnotationColumn, table_headers};
use crate::error::AnnotatorError;
use crate::tabulate::AnnotationTable;
use crate::uniprot::RecordClient;

const PROGRESS_MAX: usize = 6;
const SPINNER: &[&str] = &["|", "/", "-", "\\"];
const EXAMPLES: &[(&str, &str)] = &[
    ("P06280", "Alpha-galactosidase A"),
    ("P07550", "Beta-2 adrenergic receptor"),
    ("P01308", "Insulin"),
    ("Q8WZ42", "Titin"),
    ("P0DTC2", "SARS-CoV-2 Spike protein"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableNav {
    selected: usize,
    offset: usize,
    len: usize,
}

impl TableNav {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn position(&self) -> usize {
        self.selected + 1
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.len == 0 {
            return;
        }
        let last = self.len as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    pub fn home(&mut self) {
        self.selected = 0;
    }

    pub fn end(&mut self) {
        self.selected = self.len.saturating_sub(1);
    }

    pub fn jump_to_position(&mut self, position: usize) -> bool {
        if position == 0 || position > self.len {
            return false;
        }
        self.selected = position - 1;
        true
    }

    pub fn next_annotated(&mut self, table: &AnnotationTable) -> bool {
        if self.len == 0 {
            return false;
        }
        let found = (1..=self.len)
            .map(|step| (self.selected + step) % self.len)
            .find(|idx| table.rows.get(*idx).is_some_and(|row| row.is_annotated()));
        match found {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    pub fn scroll_into_view(&mut self, height: usize) {
        let height = height.max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
        let max_offset = self.len.saturating_sub(height);
        self.offset = self.offset.min(max_offset);
    }
}

enum Screen {
    Prompt,
    Loading { accession: String, started: Instant },
    Table,
    Error { message: String, help: Option<String> },
}

struct TuiProgress {
    log: Arc<Mutex<Vec<String>>>,
}

impl ProgressSink for TuiProgress {
    fn event(&self, event: ProgressEvent) {
        if let Ok(mut log) = self.log.lock() {
            let message = match event.elapsed {
                Some(elapsed) => format!("{} ({} ms)", event.message, elapsed.as_millis()),
                None => event.message,
            };
            log.push(message);
            if log.len() > PROGRESS_MAX {
                log.remove(0);
            }
        }
    }
}

type Pending = Receiver<Result<TableReport, AnnotatorError>>;

pub struct Viewer<C: RecordClient + Clone + 'static> {
    app: App<C>,
    screen: Screen,
    input: String,
    example_index: usize,
    jump: Option<String>,
    report: Option<TableReport>,
    nav: TableNav,
    page_height: usize,
    progress: Arc<Mutex<Vec<String>>>,
    pending: Option<Pending>,
    notice: Option<String>,
}

impl<C: RecordClient + Clone + 'static> Viewer<C> {
    pub fn new(app: App<C>) -> Self {
        Self {
            app,
            screen: Screen::Prompt,
            input: String::new(),
            example_index: 0,
            jump: None,
            report: None,
            nav: TableNav::default(),
            page_height: 20,
            progress: Arc::new(Mutex::new(Vec::new())),
            pending: None,
            notice: None,
        }
    }

    pub fn run(mut self, accession: Option<String>) -> miette::Result<()> {
        if let Some(accession) = accession {
            self.start_loading(accession);
        }

        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        let mut tick = 0usize;
        loop {
            self.poll_pending();
            terminal
                .draw(|frame| self.draw(frame, tick))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
            tick = tick.wrapping_add(1);
        }
    }

    fn start_loading(&mut self, accession: String) {
        if let Ok(mut log) = self.progress.lock() {
            log.clear();
        }
        let app = self.app.clone();
        let sink = TuiProgress {
            log: Arc::clone(&self.progress),
        };
        let (tx, rx) = mpsc::channel();
        let requested = accession.clone();
        thread::spawn(move || {
            let _ = tx.send(app.build_annotation_table_with_progress(&requested, &sink));
        });
        self.pending = Some(rx);
        self.screen = Screen::Loading {
            accession,
            started: Instant::now(),
        };
    }

    fn poll_pending(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(report)) => {
                self.nav = TableNav::new(report.table.len());
                self.report = Some(report);
                self.screen = Screen::Table;
                self.notice = None;
                self.pending = None;
            }
            Ok(Err(err)) => {
                self.screen = Screen::Error {
                    message: err.to_string(),
                    help: err.help().map(|help| help.to_string()),
                };
                self.pending = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.screen = Screen::Error {
                    message: "table builder stopped unexpectedly".to_string(),
                    help: None,
                };
                self.pending = None;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        match self.screen {
            Screen::Prompt => self.handle_prompt_key(key),
            Screen::Loading { .. } => matches!(key.code, KeyCode::Esc),
            Screen::Table => self.handle_table_key(key),
            Screen::Error { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => true,
                _ => {
                    self.screen = Screen::Prompt;
                    false
                }
            },
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                if self.report.is_none() {
                    return true;
                }
                self.screen = Screen::Table;
            }
            KeyCode::Enter => {
                let accession = self.input.trim().to_string();
                if !accession.is_empty() {
                    self.input.clear();
                    self.start_loading(accession);
                }
            }
            KeyCode::Tab => {
                let (accession, _) = EXAMPLES[self.example_index % EXAMPLES.len()];
                self.input = accession.to_string();
                self.example_index = self.example_index.wrapping_add(1);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => {}
        }
        false
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> bool {
        if let Some(jump) = self.jump.as_mut() {
            match key.code {
                KeyCode::Char(ch) if ch.is_ascii_digit() => jump.push(ch),
                KeyCode::Backspace => {
                    jump.pop();
                }
                KeyCode::Enter => {
                    let target = jump.parse::<usize>().ok();
                    self.jump = None;
                    self.notice = match target {
                        Some(position) if self.nav.jump_to_position(position) => None,
                        _ => Some("position outside the sequence".to_string()),
                    };
                }
                KeyCode::Esc => self.jump = None,
                _ => {}
            }
            return false;
        }

        let page = self.page_height.max(1) as isize;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.nav.move_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.nav.move_by(-1),
            KeyCode::PageDown => self.nav.move_by(page),
            KeyCode::PageUp => self.nav.move_by(-page),
            KeyCode::Home | KeyCode::Char('g') => self.nav.home(),
            KeyCode::End | KeyCode::Char('G') => self.nav.end(),
            KeyCode::Char('a') => {
                if let Some(report) = &self.report {
                    self.notice = (!self.nav.next_annotated(&report.table))
                        .then(|| "no annotated positions".to_string());
                }
            }
            KeyCode::Char(':') => {
                self.jump = Some(String::new());
                self.notice = None;
            }
            KeyCode::Char('n') => {
                self.input.clear();
                self.screen = Screen::Prompt;
            }
            _ => {}
        }
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame, tick: usize) {
        if matches!(self.screen, Screen::Table) {
            self.draw_table(frame);
            return;
        }
        match &self.screen {
            Screen::Prompt => self.draw_prompt(frame),
            Screen::Loading { accession, started } => {
                self.draw_loading(frame, accession, started.elapsed(), tick)
            }
            Screen::Table => {}
            Screen::Error { message, help } => draw_error(frame, message, help.as_deref()),
        }
    }

    fn draw_prompt(&self, frame: &mut ratatui::Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
            ])
            .split(frame.area());

        frame.render_widget(title_bar("Enter a UniProt accession"), chunks[0]);

        let input = Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(self.input.clone()),
            Span::styled("_", Style::default().fg(Color::Gray)),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Accession"));
        frame.render_widget(input, chunks[1]);

        let mut lines = vec![Line::from(Span::styled(
            "Examples (TAB to cycle):",
            Style::default().fg(Color::Gray),
        ))];
        for (accession, name) in EXAMPLES {
            lines.push(Line::from(vec![
                Span::styled(format!("  {accession:<8}"), Style::default().fg(Color::Cyan)),
                Span::raw(*name),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter fetch   Esc quit",
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[2]);
    }

    fn draw_loading(
        &self,
        frame: &mut ratatui::Frame,
        accession: &str,
        elapsed: Duration,
        tick: usize,
    ) {
        let spinner = SPINNER[tick % SPINNER.len()];
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{spinner} "), Style::default().fg(Color::Cyan)),
            Span::raw(format!("Fetching {accession} from UniProtKB")),
            Span::styled(
                format!("  {:.1}s", elapsed.as_secs_f64()),
                Style::default().fg(Color::Gray),
            ),
        ])];
        if let Ok(log) = self.progress.lock() {
            for message in log.iter() {
                lines.push(Line::from(format!("- {message}")));
            }
        }
        lines.push(Line::from(Span::styled(
            "Esc quit",
            Style::default().fg(Color::Gray),
        )));
        let view = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Loading"))
            .wrap(Wrap { trim: true });
        frame.render_widget(view, frame.area());
    }

    fn draw_table(&mut self, frame: &mut ratatui::Frame) {
        let Some(report) = &self.report else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(frame.area());

        frame.render_widget(entry_header(report, &self.nav), chunks[0]);

        // borders and header row
        self.page_height = chunks[1].height.saturating_sub(3) as usize;
        self.nav.scroll_into_view(self.page_height);

        let start = self.nav.offset();
        let end = (start + self.page_height).min(report.table.len());
        let rows = report.table.rows[start..end].iter().map(|row| {
            let mut cells = vec![
                Cell::from(row.position.to_string()),
                Cell::from(row.residue.to_string())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            ];
            for column in AnnotationColumn::ALL {
                let text = row.cell(column);
                let style = if text.is_empty() {
                    Style::default()
                } else {
                    Style::default().fg(Color::Yellow)
                };
                cells.push(Cell::from(text.to_string()).style(style));
            }
            Row::new(cells)
        });

        let header = Row::new(table_headers().into_iter().map(Cell::from)).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let mut widths = vec![Constraint::Length(6), Constraint::Length(3)];
        widths.extend(AnnotationColumn::ALL.iter().map(|_| Constraint::Fill(1)));

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL))
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">");
        let mut state = TableState::default().with_selected(Some(self.nav.selected() - start));
        frame.render_stateful_widget(table, chunks[1], &mut state);

        let footer = match (&self.jump, &self.notice) {
            (Some(jump), _) => Line::from(vec![
                Span::styled("Jump to position: ", Style::default().fg(Color::Cyan)),
                Span::raw(jump.clone()),
                Span::styled("_", Style::default().fg(Color::Gray)),
            ]),
            (None, Some(notice)) => {
                Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Yellow)))
            }
            (None, None) => Line::from(Span::styled(
                "j/k move  PgUp/PgDn page  g/G ends  a next annotated  : jump  n new  q quit",
                Style::default().fg(Color::Gray),
            )),
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }
}

fn title_bar(subtitle: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled(
            "RESIDUE-ANNOTATOR",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw(format!("   {subtitle}")),
    ]))
    .block(Block::default().borders(Borders::BOTTOM))
}

fn entry_header(report: &TableReport, nav: &TableNav) -> Paragraph<'static> {
    let entry = &report.table.entry;
    let name = entry
        .entry_name
        .clone()
        .unwrap_or_else(|| report.accession.clone());
    let protein = entry.protein_name.clone().unwrap_or_else(|| "n/a".to_string());
    let organism = entry.organism.clone().unwrap_or_else(|| "n/a".to_string());
    let first = Line::from(vec![
        Span::styled(
            report.accession.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ({name})  {protein}  ")),
        Span::styled(organism, Style::default().fg(Color::Gray)),
    ]);
    let second = Line::from(Span::styled(
        format!(
            "{} residues · position {} · {} features skipped · retrieved {}",
            report.table.len(),
            nav.position(),
            report.table.skipped_features,
            report.retrieved_at.format("%Y-%m-%d %H:%M UTC")
        ),
        Style::default().fg(Color::Gray),
    ));
    Paragraph::new(vec![first, second])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_error(frame: &mut ratatui::Frame, message: &str, help: Option<&str>) {
    let mut lines = vec![Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))];
    if let Some(help) = help {
        lines.push(Line::from(Span::styled(
            help.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "any key: new accession   q quit",
        Style::default().fg(Color::Gray),
    )));
    let view = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .wrap(Wrap { trim: true });
    frame.render_widget(view, frame.area());
}
