//! UI rendering.

use crate::app::{App, View};
use crate::log_buffer::LogLevel;
use evmstake_core::{
    ConnectionStatus, FormKind, StakingOverview, UnbondingRow, confirm_label, short_hex,
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Tabs, Wrap},
};

/// Log lines visible in the log panel.
const LOG_LINES: u16 = 8;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let log_height = if app.show_logs { LOG_LINES + 2 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(log_height),
    ])
    .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_validators(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
    if app.show_logs {
        render_logs(frame, app, chunks[3]);
    }

    if app.view == View::Staking {
        render_staking_modal(frame, app, chunks[1]);
    }
    if app.confirm.is_some() {
        render_signature_prompt(frame, app);
    }
}

/// Rect of `width` x `height` centred in `area`, clipped to it.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn connection_text(app: &App) -> (String, Style) {
    let p = &app.palette;
    match &app.connection_status {
        ConnectionStatus::Disconnected => ("Disconnected".to_string(), Style::default().fg(p.error)),
        ConnectionStatus::Connecting => (
            format!("Connecting{}", ".".repeat((app.tick_count() % 4) as usize)),
            Style::default().fg(p.warning),
        ),
        ConnectionStatus::Connected { chain_id, block } => (
            format!("Chain {} @ #{}", chain_id, block),
            Style::default().fg(p.success),
        ),
        ConnectionStatus::Error(e) => (format!("Error: {}", e), Style::default().fg(p.error)),
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let (connection, connection_style) = connection_text(app);

    let account = match app.session.address_hex() {
        Some(address) => Span::styled(short_hex(&address), Style::default().fg(p.fg)),
        None => Span::styled("No wallet", Style::default().fg(p.muted)),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("[{}] ", app.project.native_symbol),
            Style::default().fg(p.accent).bold(),
        ),
        Span::raw(app.project.name.clone()),
        Span::raw("  │  "),
        Span::styled(connection, connection_style),
        Span::raw("  │  "),
        account,
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.border))
            .title(" Validator Staking "),
    )
    .alignment(Alignment::Left);

    frame.render_widget(header, area);
}

fn render_validators(frame: &mut Frame, app: &mut App, area: Rect) {
    let p = app.palette;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title(" Validators ")
        .title_bottom(" ↑/↓:Select  Enter:Stake  r:Refresh  l:Logs  q:Quit ");

    if app.validators().is_empty() {
        let text = format!(
            "No validators configured for {}. Start with --validator <address> to add one.",
            app.project.name
        );
        let empty = Paragraph::new(text)
            .style(Style::default().fg(p.fg_dim))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = app
        .validators()
        .iter()
        .map(|v| {
            let role = if app.session.is_owner_of(v) { "owner" } else { "" };
            Row::new(vec![
                Cell::from(v.display_name().to_string()),
                Cell::from(v.address.clone()),
                Cell::from(role).style(Style::default().fg(p.accent)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Min(42),
            Constraint::Length(6),
        ],
    )
    .header(
        Row::new(vec!["Name", "Contract", ""])
            .style(Style::default().fg(p.primary).add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().fg(p.selection).add_modifier(Modifier::REVERSED))
    .block(block);

    frame.render_stateful_widget(table, area, &mut app.validators_table_state);
}

fn render_staking_modal(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let Some(validator) = app.current_validator() else {
        return;
    };

    let modal_area = centered(area, (area.width * 4 / 5).max(84), area.height);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.primary))
        .title(format!(" {} ", validator.display_name()))
        .title_bottom(
            " Tab:Switch  0-9/.:Amount  ←/→ PgUp/PgDn:Slider  m:Max  Enter:Confirm  w:Commission  Esc:Close ",
        );
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let owner_height = if app.is_owner() { 3 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Length(owner_height),
        Constraint::Min(4),
    ])
    .split(inner);

    let tab_index = match app.tab {
        FormKind::Stake => 0,
        FormKind::Undelegate => 1,
    };
    let tabs = Tabs::new(vec![Line::from(" Delegate "), Line::from(" Undelegate ")])
        .select(tab_index)
        .style(Style::default().fg(p.tab_inactive))
        .highlight_style(Style::default().fg(p.tab_active).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    render_cards(frame, app, chunks[1]);
    render_amount_input(frame, app, chunks[2]);
    render_slider(frame, app, chunks[3]);
    render_buttons(frame, app, chunks[4]);
    if app.is_owner() {
        render_owner_panel(frame, app, chunks[5]);
    }
    render_unbonding(frame, app, chunks[6]);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let overview = StakingOverview::from_snapshot(
        &app.snapshot,
        app.project.decimals,
        &app.project.native_symbol,
    );
    let cols = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let cards = [
        ("Your Delegation", overview.delegated),
        ("Available Balance", overview.available),
    ];
    for ((title, value), col) in cards.into_iter().zip(cols.iter()) {
        let text = if app.snapshot_loaded {
            value
        } else {
            "Loading...".to_string()
        };
        let card = Paragraph::new(text)
            .style(Style::default().fg(p.fg).bold())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(p.border))
                    .title(format!(" {} ", title)),
            );
        frame.render_widget(card, *col);
    }
}

fn render_amount_input(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let form = app.form();

    let (text_style, border_style) = if form.exceeds_balance() {
        (Style::default().fg(p.error), Style::default().fg(p.error))
    } else if app.in_flight() {
        (Style::default().fg(p.muted), Style::default().fg(p.border))
    } else {
        (Style::default().fg(p.fg), Style::default().fg(p.primary))
    };

    let shown = if form.amount().is_empty() {
        Span::styled("0.0", Style::default().fg(p.muted))
    } else {
        Span::styled(form.amount().to_string(), text_style)
    };
    let title = if form.exceeds_balance() {
        " Amount (exceeds balance) ".to_string()
    } else {
        format!(" Amount ({}) ", app.project.native_symbol)
    };

    let input = Paragraph::new(Line::from(shown)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    frame.render_widget(input, area);
}

fn render_slider(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let form = app.form();
    let percentage = form.percentage().clamp(0.0, 100.0);
    let colour = if form.controls_enabled(app.in_flight()) {
        p.gauge
    } else {
        p.muted
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(p.border))
                .title(" Percentage "),
        )
        .gauge_style(Style::default().fg(colour))
        .ratio(percentage / 100.0)
        .label(format!("{:.0}%", percentage));
    frame.render_widget(gauge, area);
}

fn render_buttons(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let form = app.form();
    let in_flight = app.in_flight();

    let enabled = |on: bool| {
        if on {
            Style::default().fg(p.primary).bold()
        } else {
            Style::default().fg(p.muted)
        }
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("[ Max ]", enabled(form.controls_enabled(in_flight))),
        Span::raw("  "),
        Span::styled(
            format!("[ {} ]", confirm_label(form.kind(), in_flight)),
            enabled(form.can_submit(in_flight)),
        ),
    ])];

    if form.kind() == FormKind::Undelegate {
        lines.push(Line::from(Span::styled(
            format!(
                "Withdrawal fee: {} gwei",
                app.snapshot.withdrawal_fee.gwei
            ),
            Style::default().fg(p.fg_dim),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_owner_panel(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let panel = Paragraph::new(Line::from(vec![
        Span::raw("You operate this validator.  "),
        Span::styled("w", Style::default().fg(p.accent).bold()),
        Span::raw(": Withdraw commission"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .title(" Validator Management "),
    );
    frame.render_widget(panel, area);
}

fn render_unbonding(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let tracker = &app.unbonding;

    let mut title = " Pending Unbonding ".to_string();
    if tracker.is_loading() {
        title = " Pending Unbonding (loading...) ".to_string();
    } else if tracker.last_error().is_some() {
        title = " Pending Unbonding (refresh failed) ".to_string();
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title(title);

    if tracker.entries().is_empty() {
        let text = if app.session.address.is_none() {
            "Connect a wallet to see unbonding delegations."
        } else if app.project.api_url.is_none() {
            "No indexer API configured for this project."
        } else {
            "No pending unbonding."
        };
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(p.fg_dim))
                .block(block),
            area,
        );
        return;
    }

    let rows: Vec<Row> = tracker
        .entries()
        .iter()
        .map(|entry| {
            let row = UnbondingRow::from_entry(entry, &app.project.native_symbol, app.now_unix);
            let style = if entry.is_complete(app.now_unix) {
                Style::default().fg(p.success)
            } else {
                Style::default().fg(p.fg)
            };
            Row::new(vec![
                Cell::from(row.amount),
                Cell::from(row.completes),
                Cell::from(row.completion_block.to_string()),
                Cell::from(short_hex(&row.transaction_hash)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(14),
        ],
    )
    .header(
        Row::new(vec!["Amount", "Completes", "Block", "Transaction"])
            .style(Style::default().fg(p.primary).add_modifier(Modifier::BOLD)),
    )
    .block(block);
    frame.render_widget(table, area);
}

fn render_signature_prompt(frame: &mut Frame, app: &App) {
    let p = &app.palette;
    let Some(call) = &app.confirm else {
        return;
    };

    let area = centered(frame.area(), 72, 9);
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            call.action().signature_prompt(),
            Style::default().fg(p.primary),
        )),
        Line::from(""),
        Line::from(call.describe(&app.project.native_symbol)),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(p.success).bold()),
            Span::raw(": Sign and send   "),
            Span::styled("n/Esc", Style::default().fg(p.error).bold()),
            Span::raw(": Reject"),
        ]),
    ];

    let prompt = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(p.warning))
                .title(" Signature Request "),
        );
    frame.render_widget(prompt, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let status = app.status.status();

    let mut spans = vec![Span::styled(
        status.message.clone(),
        Style::default().fg(p.status(status.kind)),
    )];
    if let Some(hash) = status.tx_hash {
        let hash = hash.to_string();
        let link = app
            .project
            .explorer_tx_url(&hash)
            .unwrap_or_else(|| short_hex(&hash));
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            link,
            Style::default().fg(p.primary).add_modifier(Modifier::UNDERLINED),
        ));
    }

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.border))
            .title(" Status "),
    );
    frame.render_widget(bar, area);
}

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;

    let lines: Vec<Line> = app
        .log_buffer
        .tail(LOG_LINES as usize)
        .into_iter()
        .map(|log| {
            let level_style = match log.level {
                LogLevel::Trace => Style::default().fg(p.muted),
                LogLevel::Debug => Style::default().fg(p.primary),
                LogLevel::Info => Style::default().fg(p.success),
                LogLevel::Warn => Style::default().fg(p.warning),
                LogLevel::Error => Style::default().fg(p.error),
            };
            Line::from(vec![
                Span::styled(format!("{} ", log.time), Style::default().fg(p.muted)),
                Span::styled(format!("{:5} ", log.level.as_str()), level_style),
                Span::styled(format!("[{}] ", log.target), Style::default().fg(p.muted)),
                Span::raw(log.message),
            ])
        })
        .collect();

    let logs = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.border))
            .title(format!(" Logs ({}) ", app.log_buffer.len())),
    );
    frame.render_widget(logs, area);
}
