use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

use crate::models::PostDocument;
use crate::render::{format_publication_date, render_post};

/// Runs the terminal reader for one post until the user quits
pub fn run_viewer(post: &PostDocument, reading_minutes: u32) -> Result<()> {
    let mut app = ViewerApp::new(post, reading_minutes);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

struct ViewerApp {
    title: String,
    byline: String,
    banner: Option<String>,
    scroll: u16,
    content_lines: Vec<String>,
}

impl ViewerApp {
    fn new(post: &PostDocument, reading_minutes: u32) -> Self {
        let mut content = String::new();
        if !post.subtitle.is_empty() {
            content.push_str(&post.subtitle);
            content.push_str("\n\n");
        }
        content.push_str(&render_post(post).to_plain_text(80));

        Self {
            title: post.title.clone(),
            byline: byline(post, reading_minutes),
            banner: banner_line(post),
            scroll: 0,
            content_lines: content.lines().map(String::from).collect(),
        }
    }

    fn max_scroll(&self, viewport_height: u16) -> u16 {
        u16::try_from(self.content_lines.len())
            .unwrap_or(u16::MAX)
            .saturating_sub(viewport_height)
    }

    fn header_height(&self) -> u16 {
        // Title and byline, plus the banner when there is one, inside borders
        if self.banner.is_some() {
            5
        } else {
            4
        }
    }
}

/// `Banner: <url>` for posts that have a banner image
pub fn banner_line(post: &PostDocument) -> Option<String> {
    post.banner_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| format!("Banner: {}", url))
}

/// `15 mar 2021 · Joseph Oliveira · 4 min`; drafts have no date
pub fn byline(post: &PostDocument, reading_minutes: u32) -> String {
    let mut parts = Vec::new();
    if let Some(date) = post.first_publication_date {
        parts.push(format_publication_date(date));
    }
    if !post.author.is_empty() {
        parts.push(post.author.clone());
    }
    parts.push(format!("{} min", reading_minutes));
    parts.join(" · ")
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut ViewerApp) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Account for header/footer
            let chrome = app.header_height() + 3;
            let viewport_height = terminal.size()?.height.saturating_sub(chrome);
            let max_scroll = app.max_scroll(viewport_height);

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('j') | KeyCode::Down => {
                    if app.scroll < max_scroll {
                        app.scroll = app.scroll.saturating_add(1);
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    app.scroll = app.scroll.saturating_sub(1);
                }
                KeyCode::PageDown | KeyCode::Char(' ') => {
                    app.scroll = app.scroll.saturating_add(viewport_height).min(max_scroll);
                }
                KeyCode::PageUp => {
                    app.scroll = app.scroll.saturating_sub(viewport_height);
                }
                KeyCode::Char('g') | KeyCode::Home => app.scroll = 0,
                KeyCode::Char('G') | KeyCode::End => app.scroll = max_scroll,
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &ViewerApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(app.header_height()),  // Header
            Constraint::Min(10),    // Content
            Constraint::Length(3),  // Footer
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_content(f, chunks[1], app);
    render_footer(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, app: &ViewerApp) {
    let mut header_text = vec![
        Line::from(vec![Span::styled(
            app.title.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![Span::styled(
            app.byline.clone(),
            Style::default().fg(Color::Yellow),
        )]),
    ];
    if let Some(banner) = &app.banner {
        header_text.push(Line::from(vec![Span::styled(
            banner.clone(),
            Style::default().fg(Color::Gray),
        )]));
    }

    let header = Paragraph::new(header_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" spacetraveling ")
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn render_content(f: &mut Frame, area: Rect, app: &ViewerApp) {
    let viewport_height = area.height as usize;
    let start = app.scroll as usize;
    let end = (start + viewport_height).min(app.content_lines.len());

    let content = if start < app.content_lines.len() {
        app.content_lines[start..end].join("\n")
    } else {
        String::new()
    };

    let scroll_indicator = if app.content_lines.len() > viewport_height {
        format!(" [{}/{}] ", start + 1, app.content_lines.len())
    } else {
        String::new()
    };

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
                .border_style(Style::default().fg(Color::Gray))
                .title(scroll_indicator)
                .title_alignment(Alignment::Right),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let footer_text = Line::from(vec![
        Span::styled(" q ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" Quit  "),
        Span::styled(" j/k ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" Scroll  "),
        Span::styled(" g/G ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" Top/Bottom  "),
    ]);

    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Center);

    f.render_widget(footer, area);
}
