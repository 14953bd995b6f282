use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use userdeck_core::models::{User, UserPage};

use crate::app::App;
use crate::ui::styles;

/// Render the dashboard: stats cards on top, user table and detail below.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.dashboard;

    let Some(page) = state.page.as_ref() else {
        render_placeholder(frame, app, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)])
        .split(area);

    render_stats(frame, page, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_user_table(frame, app, page, body[0]);
    render_user_detail(frame, app, body[1]);
}

/// Shown before the first page arrives, or when it failed.
fn render_placeholder(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.dashboard;
    let lines = if let Some(ref error) = state.error {
        vec![
            Line::from(Span::styled(error.clone(), styles::error_style())),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", styles::muted_style()),
                Span::styled("[r]", styles::help_key_style()),
                Span::styled(" to retry", styles::muted_style()),
            ]),
        ]
    } else {
        vec![Line::from(Span::styled(
            "Loading dashboard...",
            styles::muted_style(),
        ))]
    };

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(paragraph, area);
}

fn render_stats(frame: &mut Frame, page: &UserPage, area: Rect) {
    let cards = [
        ("Total Users", page.total),
        ("Current Page", page.page),
        ("Per Page", page.per_page),
        ("Total Pages", page.total_pages),
    ];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for ((label, value), column) in cards.iter().zip(columns.iter()) {
        let lines = vec![
            Line::from(Span::styled(value.to_string(), styles::stat_value_style())),
            Line::from(Span::styled(*label, styles::muted_style())),
        ];
        let card = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        );
        frame.render_widget(card, *column);
    }
}

fn render_user_table(frame: &mut Frame, app: &App, page: &UserPage, area: Rect) {
    let state = &app.dashboard;

    let header = Row::new(vec![Cell::from("Name"), Cell::from("Email")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = page
        .data
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == state.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(user.display_name()),
                Cell::from(user.email.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Percentage(40), Constraint::Fill(1)];

    let mut title = format!(" Users - page {} of {} ", page.page, page.total_pages);
    if state.loading {
        title.push_str("(loading...) ");
    }
    let mut block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    // A failed page change keeps the previous page on screen.
    if let Some(ref error) = state.error {
        block = block
            .title_bottom(Line::from(Span::styled(
                format!(" {} [r]etry ", error),
                styles::error_style(),
            )));
    } else {
        block = block.title_bottom(Line::from(Span::styled(
            " [p]rev [n]ext ",
            styles::muted_style(),
        )));
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut table_state = TableState::default();
    if !page.data.is_empty() {
        table_state.select(Some(state.selection));
    }

    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_user_detail(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.dashboard;

    let lines = if state.detail_loading {
        vec![Line::from(Span::styled("Loading...", styles::muted_style()))]
    } else if let Some(user) = state.detail.as_ref() {
        detail_lines(user, true)
    } else if let Some(user) = state.selected_user() {
        let mut lines = detail_lines(user, false);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter to load full record",
            styles::muted_style(),
        )));
        lines
    } else {
        vec![Line::from(Span::styled("No users", styles::muted_style()))]
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Details ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(paragraph, area);
}

fn detail_lines(user: &User, loaded: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(user.display_name(), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("ID:     ", styles::muted_style()),
            Span::raw(user.id.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Email:  ", styles::muted_style()),
            Span::raw(user.email.clone()),
        ]),
    ];
    if let Some(ref avatar) = user.avatar {
        lines.push(Line::from(vec![
            Span::styled("Avatar: ", styles::muted_style()),
            Span::raw(avatar.clone()),
        ]));
    }
    if loaded {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Record loaded", styles::success_style())));
    }
    lines
}
