//! Rendering. Pure view code: reads the [`App`] state, draws widgets, never
//! mutates anything.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use kingshelf_model::BookRecord;

use crate::app::{App, DetailView, GRID_COLUMNS, LoginFocus, LoginForm, Screen};
use crate::catalog::LoadPhase;
use crate::source::CatalogSource;

const CARD_HEIGHT: u16 = 6;

pub fn render<S: CatalogSource>(f: &mut Frame, app: &App<S>) {
    match &app.screen {
        Screen::Login(form) => render_login(f, form),
        Screen::Catalog => render_catalog(f, app),
        Screen::Detail(view) => render_detail(f, view),
    }
}

/// Centered sub-rectangle, sized in percentages of the enclosing area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1]);
    horizontal[1]
}

fn render_login(f: &mut Frame, form: &LoginForm) {
    let area = centered_rect(60, 50, f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(2), // title
                Constraint::Length(3), // username
                Constraint::Length(3), // password
                Constraint::Length(2), // help
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new("LOGIN")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let field_block = |label: &'static str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(label)
    };

    let username = Paragraph::new(form.username.as_str()).block(field_block(
        "Username",
        form.focus == LoginFocus::Username,
    ));
    f.render_widget(username, chunks[1]);

    let masked = "*".repeat(form.password.chars().count());
    let password = Paragraph::new(masked).block(field_block(
        "Password",
        form.focus == LoginFocus::Password,
    ));
    f.render_widget(password, chunks[2]);

    let help = if form.submitting {
        Line::from(Span::styled(
            "Signing in…",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "Tab switches field · Enter signs in · Esc quits",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(
        Paragraph::new(help).alignment(Alignment::Center),
        chunks[3],
    );

    if let Some(message) = &form.modal {
        render_modal(f, message);
    }
}

fn render_modal(f: &mut Frame, message: &str) {
    let area = centered_rect(50, 25, f.size());
    f.render_widget(Clear, area);
    let dialog = Paragraph::new(vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Login failed"));
    f.render_widget(dialog, area);
}

fn render_catalog<S: CatalogSource>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1), // header
                Constraint::Length(3), // search bar
                Constraint::Min(CARD_HEIGHT), // grid
                Constraint::Length(1), // status
            ]
            .as_ref(),
        )
        .split(f.size());

    let header = Paragraph::new(Span::styled(
        "KINGSHELF · Stephen King Collection",
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let search_title = format!("Search by {}", app.controller.field());
    let search = Paragraph::new(app.controller.query())
        .block(Block::default().borders(Borders::ALL).title(search_title));
    f.render_widget(search, chunks[1]);

    let visible = app.controller.visible();
    if visible.is_empty() {
        render_grid_placeholder(f, app, chunks[2]);
    } else {
        render_grid(f, &visible, app.selected, chunks[2]);
    }

    f.render_widget(status_line(app, visible.len()), chunks[3]);
}

fn render_grid_placeholder<S: CatalogSource>(
    f: &mut Frame,
    app: &App<S>,
    area: Rect,
) {
    // An empty grid means different things depending on how it got empty;
    // a failed fetch must never masquerade as "no results".
    let (text, color) = match app.controller.phase() {
        LoadPhase::Failed(_) => {
            ("Could not load the catalog · Ctrl+R retries", Color::Red)
        }
        LoadPhase::Loading | LoadPhase::Idle => ("Loading…", Color::Yellow),
        LoadPhase::Ready => ("No books found", Color::Red),
    };
    let placeholder = Paragraph::new(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage(40),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);
    f.render_widget(placeholder, vertical[1]);
}

fn render_grid(f: &mut Frame, visible: &[&BookRecord], selected: usize, area: Rect) {
    let rows_that_fit = (area.height / CARD_HEIGHT).max(1) as usize;
    let total_rows = visible.len().div_ceil(GRID_COLUMNS);
    let selected_row = selected / GRID_COLUMNS;

    // Keep the selected row inside the window.
    let first_row = if selected_row >= rows_that_fit {
        (selected_row + 1 - rows_that_fit).min(total_rows.saturating_sub(rows_that_fit))
    } else {
        0
    };

    let mut row_constraints =
        vec![Constraint::Length(CARD_HEIGHT); rows_that_fit.min(total_rows - first_row)];
    row_constraints.push(Constraint::Min(0));
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (slot, row) in (first_row..total_rows).take(rows_that_fit).enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                [Constraint::Percentage(50), Constraint::Percentage(50)].as_ref(),
            )
            .split(row_areas[slot]);

        for column in 0..GRID_COLUMNS {
            let index = row * GRID_COLUMNS + column;
            let Some(record) = visible.get(index) else {
                continue;
            };
            render_card(f, record, index == selected, columns[column]);
        }
    }
}

fn render_card(f: &mut Frame, record: &BookRecord, selected: bool, area: Rect) {
    let border_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let lines = vec![
        Line::from(Span::styled(
            record.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Publisher: {}", record.publisher)),
        Line::from(format!("ISBN: {}", record.isbn)),
        Line::from(format!("Pages: {} · Year: {}", record.pages, record.year)),
    ];

    let card = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(card, area);
}

fn status_line<S: CatalogSource>(app: &App<S>, visible_len: usize) -> Paragraph<'static> {
    let phase = match app.controller.phase() {
        LoadPhase::Loading => Span::styled(
            "loading… ",
            Style::default().fg(Color::Yellow),
        ),
        LoadPhase::Failed(err) => Span::styled(
            format!("fetch failed: {err} "),
            Style::default().fg(Color::Red),
        ),
        LoadPhase::Ready | LoadPhase::Idle => Span::raw(""),
    };

    let user = app
        .session
        .as_ref()
        .map(|s| s.username.as_str())
        .unwrap_or("-");
    let counts = Span::raw(format!(
        "{visible_len}/{} books · {user} · ",
        app.controller.items().len()
    ));
    let help = Span::styled(
        "↑↓←→ move · Enter detail · Tab field · Ctrl+L logout · Esc quit",
        Style::default().fg(Color::DarkGray),
    );

    Paragraph::new(Line::from(vec![phase, counts, help]))
}

fn render_detail(f: &mut Frame, view: &DetailView) {
    let area = centered_rect(80, 80, f.size());

    if let Some(error) = &view.error {
        let message = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Could not load this book: {error}"),
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Esc goes back",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Detail"));
        f.render_widget(message, area);
        return;
    }

    let Some(record) = &view.record else {
        let loading = Paragraph::new(Span::styled(
            "Loading…",
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Detail"));
        f.render_widget(loading, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            record.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Year: {}", record.year)),
        Line::from(format!("Publisher: {}", record.publisher)),
        Line::from(format!("ISBN: {}", record.isbn)),
        Line::from(format!("Pages: {}", record.pages)),
    ];

    if !record.notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Notes",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )));
        for note in &record.notes {
            lines.push(Line::from(format!("· {note}")));
        }
    }

    if !record.characters.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Characters",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )));
        for character in &record.characters {
            lines.push(Line::from(format!(
                "· {} — {}",
                character.name, character.power
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc goes back",
        Style::default().fg(Color::DarkGray),
    )));

    let detail = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(record.handle.clone()),
    );
    f.render_widget(detail, area);
}
