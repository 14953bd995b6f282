use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use userdeck_core::auth::DEMO_EMAIL;

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;
use crate::utils::truncate_string;

/// Visible width of the email and password fields.
const FIELD_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let notice = app.login_notice();
    let height = if notice.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(50, height, area);

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("  Welcome Back", styles::title_style())),
        Line::from(Span::styled(
            "  Sign in to view the user directory",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    lines.push(field_line(
        "Email:   ",
        &app.login_email,
        app.login_focus == LoginFocus::Email,
    ));
    let masked = "*".repeat(app.login_password.chars().count());
    lines.push(field_line(
        "Password:",
        &masked,
        app.login_focus == LoginFocus::Password,
    ));

    // Sign-in button
    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = match (app.login_submitting, button_focused) {
        (true, _) => " Signing in... ",
        (false, true) => " ▶ Sign In ◀ ",
        (false, false) => "   Sign In   ",
    };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(message) = notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate_string(message, 44)),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Use ", styles::muted_style()),
        Span::styled(DEMO_EMAIL, styles::highlight_style()),
        Span::styled(" with any password", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    // Keep the tail visible while typing past the field width.
    let count = value.chars().count();
    let visible: String = value
        .chars()
        .skip(count.saturating_sub(FIELD_WIDTH - 1))
        .collect();
    let cursor = if focused { "▌" } else { "" };

    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled(" [", styles::muted_style()),
        Span::styled(
            format!("{:<width$}", format!("{}{}", visible, cursor), width = FIELD_WIDTH),
            style,
        ),
        Span::styled("]", styles::muted_style()),
    ])
}
