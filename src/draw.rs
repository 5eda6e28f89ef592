use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

use crate::app::{App, MenuItem};
use crate::state::aggregate::AggregatedPlayerStat;
use crate::state::app_state::{ConfirmAction, Modal};
use crate::state::form::Form;
use crate::state::intake::{IntakeCall, IntakeStage};
use crate::state::league::{DASHBOARD_LADDER_ROWS, FixturesAction};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::review::{ReviewAction, ReviewQueue};
use crate::ui::format::{local_day, local_when, truncate};
use crate::ui::layout::{LayoutAreas, centered};
use courtside_api::{ExternalStats, Game, GameResult, LadderEntry, StatId, VerificationStatus};

static TABS: &[&str; 7] = &["Dashboard", "Games", "Stats", "Ladder", "Roster", "Review", "Users"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let drawn = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status_bar(f, layout.status, app);
        }

        match app.state.active_tab {
            MenuItem::Dashboard => draw_dashboard(f, layout.main, app),
            MenuItem::Games => draw_games(f, layout.main, app),
            MenuItem::Stats => draw_stats(f, layout.main, app),
            MenuItem::Ladder => draw_ladder(f, layout.main, app),
            MenuItem::Roster => draw_roster(f, layout.main, app),
            MenuItem::Review => draw_review(f, layout.main, app),
            MenuItem::Users => draw_users(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }

        if app.state.modal.is_some() {
            draw_modal(f, layout.main, app);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = drawn {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn highlight() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn marker(selected: bool) -> &'static str {
    if selected { ">" } else { " " }
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(message.to_owned(), Style::default().fg(Color::Red)))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Dashboard | MenuItem::Help => 0,
        MenuItem::Games => 1,
        MenuItem::Stats => 2,
        MenuItem::Ladder => 3,
        MenuItem::Roster => 4,
        MenuItem::Review => 5,
        MenuItem::Users => 6,
    };
    let allowed = [
        MenuItem::Dashboard,
        MenuItem::Games,
        MenuItem::Stats,
        MenuItem::Ladder,
        MenuItem::Roster,
        MenuItem::Review,
        MenuItem::Users,
    ]
    .map(|tab| app.tab_allowed(tab));

    let titles: Vec<Line> = TABS
        .iter()
        .zip(allowed)
        .map(|(t, ok)| if ok { Line::from(*t) } else { Line::styled(*t, dim()) })
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let who = match app.state.session.user() {
        Some(user) => format!("{} ({}) | ? ", user.name, user.role.label()),
        None => "L: sign in | ? ".to_owned(),
    };
    let help = Paragraph::new(who)
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(err) = app.state.last_error.as_deref() {
        error_line(err)
    } else if let Some(notice) = app.state.notice.as_deref() {
        Line::from(Span::styled(notice.to_owned(), Style::default().fg(Color::Green)))
    } else {
        Line::from(Span::styled(
            format!("{} | r refresh | \" logs | f full screen | q quit", app.settings.team_name),
            dim(),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(format!(" {} ", app.settings.team_name));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [left, right] = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(inner);
    let [summary, upcoming] = Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(left);

    let record = app.state.games.record();
    let form: Vec<Span> = app
        .state
        .games
        .recent_form(5)
        .into_iter()
        .map(|r| {
            let color = match r {
                GameResult::Win => Color::Green,
                GameResult::Loss => Color::Red,
                GameResult::Tie => Color::Gray,
            };
            Span::styled(format!("{} ", r.letter()), Style::default().fg(color).add_modifier(Modifier::BOLD))
        })
        .collect();
    let mut summary_lines = vec![
        Line::from(format!("Record  {}-{}-{}  ({} played)", record.wins, record.losses, record.ties, record.played())),
        Line::from([vec![Span::raw("Form    ")], form].concat()),
    ];
    if let Some(err) = app.state.games.last_error.as_deref() {
        summary_lines.push(error_line(err));
    }
    f.render_widget(Paragraph::new(summary_lines), summary);

    let mut lines = vec![Line::styled("Upcoming", highlight())];
    let upcoming_games = app.state.games.upcoming();
    if upcoming_games.is_empty() {
        let msg = if app.state.games.is_refreshing() { "Loading games..." } else { "No upcoming games" };
        lines.push(Line::styled(msg, dim()));
    }
    for game in upcoming_games.iter().take(5) {
        lines.push(Line::from(format!("{}  vs {}", local_when(game.scheduled_at), game.opponent_name)));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled("Recent", highlight()));
    for game in app.state.games.completed().iter().take(5) {
        let score = game.score().map(|(ours, theirs)| format!("{ours}-{theirs}")).unwrap_or_default();
        let letter = game.result().map(|r| r.letter()).unwrap_or(' ');
        lines.push(Line::from(format!("{letter} {score:<7} vs {:<20} {}", truncate(&game.opponent_name, 20), local_day(game.scheduled_at))));
    }
    f.render_widget(Paragraph::new(lines), upcoming);

    let [ladder_area, fixture_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(4)]).areas(right);
    if app.capabilities().view_ladder {
        let ladder = &app.state.ladder;
        let mut lines = vec![Line::styled("Ladder", highlight())];
        for entry in ladder.top(DASHBOARD_LADDER_ROWS) {
            lines.push(ladder_line(entry, ladder.is_own(entry, &app.settings.team_name)));
        }
        let own = ladder.own_entry(&app.settings.team_name);
        if let Some(own) = own
            && own.position as usize > DASHBOARD_LADDER_ROWS
        {
            lines.push(Line::styled("  ...", dim()));
            lines.push(ladder_line(own, true));
        }
        f.render_widget(Paragraph::new(lines), ladder_area);
    }

    let mut lines = vec![Line::styled("Next fixture", highlight())];
    match app.state.fixtures.next() {
        Some(fixture) => {
            let when = if fixture.is_today { "Today".to_owned() } else { local_day(fixture.scheduled_at) };
            lines.push(Line::from(format!("{when}  vs {}", fixture.opponent_name)));
            if let Some(venue) = fixture.venue.as_deref() {
                lines.push(Line::styled(venue.to_owned(), dim()));
            }
        }
        None => lines.push(Line::styled("No fixtures", dim())),
    }
    f.render_widget(Paragraph::new(lines), fixture_area);
}

fn ladder_line(entry: &LadderEntry, own: bool) -> Line<'static> {
    let text = format!(
        "{:>2}. {:<18} {:>2}-{:<2} {:>5.1}%",
        entry.position,
        truncate(&entry.team_name, 18),
        entry.wins,
        entry.losses,
        entry.win_percent()
    );
    if own { Line::styled(text, highlight()) } else { Line::from(text) }
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

fn game_line(game: &Game, selected: bool) -> Line<'static> {
    let result = match (game.result(), game.score()) {
        (Some(r), Some((ours, theirs))) => format!("{} {ours}-{theirs}", r.letter()),
        _ if game.scheduled_at <= chrono::Utc::now() => "no score".to_owned(),
        _ => String::new(),
    };
    let text = format!(
        "{} {:<22} vs {:<20} {}",
        marker(selected),
        local_when(game.scheduled_at),
        truncate(&game.opponent_name, 20),
        result
    );
    if selected { Line::styled(text, highlight()) } else { Line::from(text) }
}

fn draw_games(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Games ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (list_area, detail_area) = if app.state.game_detail.game_id.is_some() {
        let [list, detail] = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(inner);
        (list, Some(detail))
    } else {
        (inner, None)
    };

    let games = &app.state.games;
    let mut lines = Vec::new();
    let caps = app.capabilities();
    let mut keys = String::from("j/k move  Enter detail");
    if caps.edit_games {
        keys.push_str("  n new  e edit  d delete");
    }
    if caps.ingest_stats {
        keys.push_str("  s import stats");
    }
    if let Some(at) = games.evaluated_at() {
        keys.push_str(&format!("  (as of {})", at.with_timezone(&chrono::Local).format("%H:%M")));
    }
    lines.push(Line::styled(keys, dim()));
    if let Some(err) = games.last_error.as_deref() {
        lines.push(error_line(err));
    }
    lines.push(Line::from(""));

    let upcoming = games.upcoming().len();
    lines.push(Line::styled(format!("Upcoming ({upcoming})"), Style::default().fg(Color::Cyan)));
    for (idx, game) in games.listing().enumerate() {
        if idx == upcoming {
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("Completed ({})", games.completed().len()),
                Style::default().fg(Color::Cyan),
            ));
        }
        lines.push(game_line(game, idx == games.selected));
    }
    if games.games().is_empty() {
        let msg = if games.is_refreshing() { "Loading games..." } else { "No games" };
        lines.push(Line::styled(msg, dim()));
    }

    // Keep the selection in view.
    let visible = list_area.height as usize;
    let selected_line = games.selected + 5;
    let offset = selected_line.saturating_sub(visible.saturating_sub(1));
    f.render_widget(Paragraph::new(lines).scroll((offset as u16, 0)), list_area);

    if let Some(detail_area) = detail_area {
        draw_game_detail(f, detail_area, app);
    }
}

fn draw_game_detail(f: &mut Frame, area: Rect, app: &App) {
    let detail = &app.state.game_detail;
    let game = detail.game_id.and_then(|id| app.state.games.find(id));
    let title = game.map_or(" Game ".to_owned(), |g| format!(" vs {} ", g.opponent_name));
    let block = default_border(Color::DarkGray).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(game) = game {
        lines.push(Line::from(local_when(game.scheduled_at)));
        if let Some(venue) = game.venue.as_deref() {
            lines.push(Line::from(venue.to_owned()));
        }
        if let Some((ours, theirs)) = game.score() {
            lines.push(Line::from(format!("Final {ours}-{theirs}")));
        }
        if let Some(video) = game.video_url.as_deref() {
            lines.push(Line::styled(video.to_owned(), dim()));
        }
        lines.push(Line::from(""));
    }

    if !app.capabilities().view_stats {
        lines.push(Line::styled("Sign in to see player stats", dim()));
    } else if detail.loading {
        lines.push(Line::styled("Loading stats...", dim()));
    } else if let Some(err) = detail.last_error.as_deref() {
        lines.push(error_line(err));
    } else if detail.stats.is_empty() {
        lines.push(Line::styled("No stats recorded", dim()));
    } else {
        lines.push(Line::styled(format!("{:<4}{:<20}{:>5}{:>6}  {}", "#", "Player", "PTS", "FLS", ""), dim()));
        for stat in &detail.stats {
            let (name, jersey) = stat
                .player
                .as_ref()
                .map(|p| (p.name.clone(), p.jersey_number))
                .or_else(|| app.state.roster.find(stat.player_id).map(|p| (p.name.clone(), Some(p.jersey_number))))
                .unwrap_or_else(|| (crate::state::aggregate::UNKNOWN_PLAYER.to_owned(), None));
            let status = match stat.verification {
                VerificationStatus::Verified => "",
                other => other.label(),
            };
            lines.push(Line::from(format!(
                "{:<4}{:<20}{:>5}{:>6}  {status}",
                jersey.map(|j| j.to_string()).unwrap_or_default(),
                truncate(&name, 19),
                stat.points,
                stat.fouls
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::styled("Esc close", dim()));

    f.render_widget(Paragraph::new(lines).scroll((detail.scroll_offset, 0)), inner);
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

fn stat_row(row: &AggregatedPlayerStat, selected: bool) -> Line<'static> {
    let text = format!(
        "{} {:<4}{:<22}{:>4}{:>6}{:>6}{:>7.1}{:>7.1}",
        marker(selected),
        row.jersey_number.map(|j| j.to_string()).unwrap_or_default(),
        truncate(&row.name, 21),
        row.games_played,
        row.total_points,
        row.total_fouls,
        row.avg_points,
        row.avg_fouls
    );
    if selected { Line::styled(text, highlight()) } else { Line::from(text) }
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Season Stats ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let season = &app.state.season;
    let [board, history] = if season.history.is_some() {
        Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(inner)
    } else {
        [inner, Rect::ZERO]
    };

    let mut keys = String::from("j/k move  Enter game log  r reload");
    if !season.records().is_empty() {
        keys.push_str(&format!("  ({} stat lines)", season.records().len()));
    }
    let mut lines = vec![Line::styled(keys, dim())];
    if let Some(err) = season.last_error.as_deref() {
        lines.push(error_line(err));
    }
    if !season.failed_games().is_empty() {
        lines.push(Line::styled(
            format!("Stats unavailable for {} game(s)", season.failed_games().len()),
            Style::default().fg(Color::Red),
        ));
    }
    lines.push(Line::styled(
        format!("  {:<4}{:<22}{:>4}{:>6}{:>6}{:>7}{:>7}", "#", "Player", "GP", "PTS", "FLS", "PPG", "FPG"),
        dim(),
    ));
    if season.rows().is_empty() {
        let msg = if season.is_loading() { "Loading season stats..." } else { "No stats yet" };
        lines.push(Line::styled(msg, dim()));
    }
    for (idx, row) in season.rows().iter().enumerate() {
        lines.push(stat_row(row, idx == season.selected));
    }
    let offset = (season.selected + 4).saturating_sub((board.height as usize).saturating_sub(1));
    f.render_widget(Paragraph::new(lines).scroll((offset as u16, 0)), board);

    if let Some(hist) = season.history.as_ref() {
        let name = season
            .rows()
            .iter()
            .find(|r| r.player_id == Some(hist.player_id))
            .map_or_else(|| hist.player_id.to_string(), |r| r.name.clone());
        let block = default_border(Color::DarkGray).title(format!(" {name} "));
        let hist_inner = block.inner(history);
        f.render_widget(block, history);

        let mut lines = Vec::new();
        for stat in &hist.lines {
            let game = app.state.games.find(stat.game_id);
            let label = game.map_or_else(
                || format!("Game {}", stat.game_id),
                |g| format!("{} vs {}", local_day(g.scheduled_at), g.opponent_name),
            );
            lines.push(Line::from(format!(
                "{:<30}{:>4} pts{:>3} fls  {}",
                truncate(&label, 29),
                stat.points,
                stat.fouls,
                stat.verification.label()
            )));
        }
        if lines.is_empty() {
            lines.push(Line::styled("No games recorded", dim()));
        }
        f.render_widget(Paragraph::new(lines), hist_inner);
    }
}

// ---------------------------------------------------------------------------
// Ladder and fixtures
// ---------------------------------------------------------------------------

fn draw_ladder(f: &mut Frame, area: Rect, app: &App) {
    let [ladder_area, fixtures_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
    let caps = app.capabilities();

    let block = default_border(Color::White).title(" Ladder ");
    let inner = block.inner(ladder_area);
    f.render_widget(block, ladder_area);

    let ladder = &app.state.ladder;
    let mut lines = Vec::new();
    if !caps.view_ladder {
        lines.push(Line::styled("Sign in to see the ladder", dim()));
    } else {
        if caps.edit_games {
            let key = if ladder.is_updating() { "updating..." } else { "u update from league site" };
            lines.push(Line::styled(key, dim()));
        }
        if let Some(notice) = ladder.notice.as_deref() {
            lines.push(Line::styled(notice.to_owned(), Style::default().fg(Color::Green)));
        }
        if let Some(err) = ladder.last_error.as_deref() {
            lines.push(error_line(err));
        }
        lines.push(Line::styled(
            format!("{:>3} {:<20}{:>4}{:>4}{:>4}{:>6}{:>6}{:>8}", "Pos", "Team", "W", "D", "L", "PF", "PA", "Win%"),
            dim(),
        ));
        for entry in ladder.entries() {
            let text = format!(
                "{:>3} {:<20}{:>4}{:>4}{:>4}{:>6}{:>6}{:>7.1}%",
                entry.position,
                truncate(&entry.team_name, 19),
                entry.wins,
                entry.draws,
                entry.losses,
                entry.points_for,
                entry.points_against,
                entry.win_percent()
            );
            if ladder.is_own(entry, &app.settings.team_name) {
                lines.push(Line::styled(text, highlight()));
            } else {
                lines.push(Line::from(text));
            }
        }
        if let Some(updated) = ladder.entries().iter().filter_map(|e| e.last_updated).max() {
            lines.push(Line::from(""));
            lines.push(Line::styled(format!("Updated {}", local_when(updated)), dim()));
        }
    }
    f.render_widget(Paragraph::new(lines), inner);

    let block = default_border(Color::White).title(" Fixtures ");
    let inner = block.inner(fixtures_area);
    f.render_widget(block, fixtures_area);

    let fixtures = &app.state.fixtures;
    let mut lines = Vec::new();
    if caps.edit_games {
        let keys = match fixtures.running() {
            Some(FixturesAction::Update) => "updating fixtures...",
            Some(FixturesAction::Sync) => "syncing with games...",
            None => "F update  S sync to games",
        };
        lines.push(Line::styled(keys, dim()));
    }
    if let Some(notice) = fixtures.notice.as_deref() {
        lines.push(Line::styled(notice.to_owned(), Style::default().fg(Color::Green)));
    }
    if let Some(err) = fixtures.last_error.as_deref() {
        lines.push(error_line(err));
    }
    if fixtures.fixtures().is_empty() {
        lines.push(Line::styled("No fixtures", dim()));
    }
    for fixture in fixtures.fixtures() {
        let when = match fixture.days_until {
            _ if fixture.is_today => "Today".to_owned(),
            d if d > 0 && d <= 6 => format!("in {d}d"),
            _ => local_day(fixture.scheduled_at),
        };
        let style = if fixture.is_today { highlight() } else { Style::default() };
        lines.push(Line::styled(format!("{when:<10} vs {}", fixture.opponent_name), style));
        if let Some(venue) = fixture.venue.as_deref() {
            lines.push(Line::styled(format!("{:<10} {venue}", ""), dim()));
        }
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn draw_roster(f: &mut Frame, area: Rect, app: &App) {
    let roster = &app.state.roster;
    let title = if roster.show_inactive { " Roster (all) " } else { " Roster " };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut keys = String::from("j/k move  / search  i inactive");
    if app.capabilities().manage_players {
        keys.push_str("  n new  e edit  t (de)activate  m merge");
    }
    let mut lines = vec![Line::styled(keys, dim())];
    if !roster.query.is_empty() {
        lines.push(Line::from(format!("Search: {}", roster.query)));
    }
    if let Some(source) = roster.merge_source.and_then(|id| roster.find(id)) {
        lines.push(Line::styled(
            format!("Merging #{} {}: select the player to keep and press m (Esc cancels)", source.jersey_number, source.name),
            Style::default().fg(Color::Magenta),
        ));
    }
    if let Some(err) = roster.last_error.as_deref() {
        lines.push(error_line(err));
    }

    let visible = roster.visible();
    if visible.is_empty() {
        lines.push(Line::styled("No players", dim()));
    }
    for (idx, player) in visible.iter().enumerate() {
        let selected = idx == roster.selected;
        let status = if player.is_active { "" } else { "inactive" };
        let joined = player.joined_on.map(|d| d.format("%b %Y").to_string()).unwrap_or_default();
        let text = format!(
            "{} {:>3}  {:<24}{:<10}{}",
            marker(selected),
            player.jersey_number,
            truncate(&player.name, 23),
            joined,
            status
        );
        let style = match (selected, player.is_active) {
            (true, _) => highlight(),
            (false, false) => dim(),
            (false, true) => Style::default(),
        };
        lines.push(Line::styled(text, style));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Review and users
// ---------------------------------------------------------------------------

fn review_status(review: &ReviewQueue, id: StatId) -> &'static str {
    match review.action_for(id) {
        Some(ReviewAction::Verify) => "verifying...",
        Some(ReviewAction::Reject) => "rejecting...",
        None if review.confirming() == Some(id) => "reject? y/n",
        None => "",
    }
}

fn draw_review(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Unverified Stats ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let review = &app.state.review;
    let mut lines = vec![Line::styled("j/k move  v verify  x reject", dim())];
    if let Some(err) = review.last_error.as_deref() {
        lines.push(error_line(err));
    }
    if review.items().is_empty() {
        let msg = if review.is_loading() { "Loading..." } else { "Nothing to review" };
        lines.push(Line::styled(msg, dim()));
    }
    for (idx, stat) in review.items().iter().enumerate() {
        let selected = idx == review.selected;
        let player = stat.player.as_ref().map_or_else(|| format!("Player {}", stat.player_id), |p| p.name.clone());
        let game = app
            .state
            .games
            .find(stat.game_id)
            .map_or_else(|| format!("Game {}", stat.game_id), |g| format!("vs {}", g.opponent_name));
        let action = review_status(review, stat.id);
        let text = format!(
            "{} {:<22}{:<22}{:>4} pts{:>3} fls  {}",
            marker(selected),
            truncate(&player, 21),
            truncate(&game, 21),
            stat.points,
            stat.fouls,
            action
        );
        lines.push(if selected { Line::styled(text, highlight()) } else { Line::from(text) });
        if selected && let Some(source) = stat.source_url.as_deref() {
            lines.push(Line::styled(format!("    {}", truncate(source, inner.width.saturating_sub(5) as usize)), dim()));
        }
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_users(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Users ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let users = &app.state.users;
    let mut lines = vec![Line::styled("j/k move  n new manager  v verify  x delete", dim())];
    if let Some(err) = users.last_error.as_deref() {
        lines.push(error_line(err));
    }
    for (idx, user) in users.users().iter().enumerate() {
        let selected = idx == users.selected;
        let verified = if user.is_verified { "" } else { "unverified" };
        let text = format!(
            "{} {:<22}{:<30}{:<9}{}",
            marker(selected),
            truncate(&user.name, 21),
            truncate(&user.email, 29),
            user.role.label(),
            verified
        );
        lines.push(if selected { Line::styled(text, highlight()) } else { Line::from(text) });
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = [
        ("1-7", "switch tabs"),
        ("L", "sign in / sign out"),
        ("r", "refresh the current tab"),
        ("\"", "toggle the log pane"),
        ("f", "toggle full screen"),
        ("q / Ctrl-c", "quit"),
        ("", ""),
        ("Games", "Enter detail, n/e/d new edit delete, s import stats"),
        ("Stats", "Enter game log for the selected player, s import stats"),
        ("Ladder", "u update ladder, F update fixtures, S sync fixtures to games"),
        ("Roster", "/ search, i show inactive, n/e new edit, t toggle active, m merge"),
        ("Review", "v verify, x reject"),
        ("Users", "n new manager, v verify, x delete"),
        ("", ""),
        ("Modals", "Tab/Shift-Tab move, Enter submit, Esc cancel"),
        ("Sign in", "Ctrl-r register, Ctrl-e resend verification email"),
        ("Import", "Enter fetch then save, Ctrl-f fetch again"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(format!("{k:>12}  "), Style::default().fg(Color::Cyan)),
                Span::raw(*v),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Green))
        .output_separator(' ')
        .output_timestamp(Some("%H:%M:%S".to_owned()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logs, area);
}

// ---------------------------------------------------------------------------
// Modals
// ---------------------------------------------------------------------------

fn form_lines(form: &Form) -> Vec<Line<'static>> {
    form.fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let focused = idx == form.focused;
            let value = if field.masked {
                "•".repeat(field.value.chars().count())
            } else {
                field.value.clone()
            };
            let cursor = if focused { "_" } else { "" };
            let label_style = if focused { highlight() } else { Style::default().fg(Color::Gray) };
            Line::from(vec![
                Span::styled(format!("{:>14}: ", field.label), label_style),
                Span::raw(format!("{value}{cursor}")),
            ])
        })
        .collect()
}

fn stats_preview(stats: &ExternalStats, max_lines: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !stats.message.is_empty() {
        lines.push(Line::from(stats.message.clone()));
    }
    if stats.lines.is_empty() {
        lines.push(Line::styled("No player lines found", dim()));
    }
    let dash = |v: Option<u32>| v.map_or_else(|| "-".to_owned(), |n| n.to_string());
    for line in stats.lines.iter().take(max_lines) {
        lines.push(Line::from(format!(
            "  {:<24}{:>4} pts{:>4} fls",
            truncate(&line.player_name, 23),
            dash(line.points),
            dash(line.fouls)
        )));
    }
    if stats.lines.len() > max_lines {
        lines.push(Line::styled(format!("  ... {} more", stats.lines.len() - max_lines), dim()));
    }
    lines
}

fn draw_modal(f: &mut Frame, area: Rect, app: &App) {
    let Some(modal) = app.state.modal.as_ref() else {
        return;
    };
    let caps = app.capabilities();

    let (title, mut lines, hint): (String, Vec<Line>, &str) = match modal {
        Modal::Login(form) => {
            let hint = if app.state.session.is_signing_in() {
                "Signing in..."
            } else {
                "Enter sign in  Ctrl-r register  Ctrl-e resend verification  Esc cancel"
            };
            (" Sign in ".into(), form_lines(form), hint)
        }
        Modal::Register(form) => (" Register ".into(), form_lines(form), "Enter register  Esc cancel"),
        Modal::ManagerEditor(form) => (" New manager ".into(), form_lines(form), "Enter create  Esc cancel"),
        Modal::GameEditor { id, form } => {
            let title = if id.is_some() { " Edit game " } else { " New game " };
            (title.into(), form_lines(form), "Enter save  Esc cancel  (local time)")
        }
        Modal::PlayerEditor { id, form } => {
            let title = if id.is_some() { " Edit player " } else { " New player " };
            (title.into(), form_lines(form), "Enter save  Esc cancel")
        }
        Modal::Search(form) => (" Search roster ".into(), form_lines(form), "Enter apply  Esc cancel"),
        Modal::Intake => {
            let intake = &app.state.intake;
            let target = intake
                .target_game()
                .and_then(|id| app.state.games.find(id))
                .map_or_else(|| "preview only, no game selected".to_owned(), |g| format!("for vs {}", g.opponent_name));
            let mut lines = vec![Line::styled(target, dim())];
            lines.extend(form_lines(&intake.form));
            lines.push(Line::from(""));
            let hint = match (intake.pending(), intake.stage()) {
                (Some(IntakeCall::Fetch), _) => "Fetching...",
                (Some(IntakeCall::Commit), _) => "Saving...",
                (None, IntakeStage::Idle) => "Enter fetch  Esc cancel",
                (None, IntakeStage::Fetched(_)) if intake.can_commit() => "Enter save  Ctrl-f fetch again  Esc cancel",
                (None, IntakeStage::Fetched(_)) => "Ctrl-f fetch again  Esc close",
                (None, IntakeStage::Committed(_)) => "Saved",
            };
            match intake.stage() {
                IntakeStage::Idle => {}
                IntakeStage::Fetched(stats) => {
                    if let Some(url) = intake.fetched_from() {
                        lines.push(Line::styled(format!("from {}", truncate(url, 60)), dim()));
                    }
                    lines.extend(stats_preview(stats, 12));
                }
                IntakeStage::Committed(stats) => {
                    lines.push(Line::styled("Saved", Style::default().fg(Color::Green)));
                    lines.extend(stats_preview(stats, 12));
                }
            }
            if let Some(err) = intake.error() {
                lines.push(error_line(err));
            }
            (" Import stats ".into(), lines, hint)
        }
        Modal::Confirm(action) => {
            let question = match action {
                ConfirmAction::RejectStat(id) => format!("Reject and delete stat {id}?"),
                ConfirmAction::DeleteGame(id) => {
                    let name = app.state.games.find(*id).map_or_else(|| id.to_string(), |g| g.opponent_name.clone());
                    format!("Delete the game vs {name}?")
                }
                ConfirmAction::DeleteUser(id) => {
                    let email = app
                        .state
                        .users
                        .users()
                        .iter()
                        .find(|u| u.id == *id)
                        .map_or_else(|| id.to_string(), |u| u.email.clone());
                    format!("Delete user {email}?")
                }
                ConfirmAction::MergePlayers { source, target } => {
                    let name = |id| app.state.roster.find(id).map_or_else(|| id.to_string(), |p| p.name.clone());
                    format!("Merge {} into {}? Stats move to the kept player.", name(*source), name(*target))
                }
            };
            (" Confirm ".into(), vec![Line::from(question)], "y yes  n no")
        }
    };

    if let Some(err) = app.state.modal_error.as_deref() {
        lines.push(error_line(err));
    }
    if app.state.submitting {
        lines.push(Line::styled("Saving...", dim()));
    }
    if matches!(modal, Modal::Intake) && !caps.ingest_stats {
        lines.push(error_line("Only managers can import stats"));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(hint.to_owned(), dim()));

    let width = area.width.saturating_sub(4).min(76);
    let rect = centered(area, width, lines.len() as u16 + 2);
    f.render_widget(Clear, rect);
    let block = default_border(Color::Yellow).title(title);
    let inner = block.inner(rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(3), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn ladder_line_renders_the_win_fraction_as_a_percentage() {
        let entry = LadderEntry {
            position: 1,
            team_name: "Skywalkers".into(),
            wins: 6,
            draws: 0,
            losses: 1,
            points_for: 412,
            points_against: 350,
            win_percentage: 0.857,
            games_played: 7,
            season: None,
            division: None,
            last_updated: None,
        };
        let rendered = text(&ladder_line(&entry, false));
        assert!(rendered.starts_with(" 1. Skywalkers"), "{rendered}");
        assert!(rendered.ends_with(" 85.7%"), "{rendered}");
    }

    #[test]
    fn review_row_shows_a_pending_rejection_until_answered() {
        let stat = courtside_api::PlayerGameStat {
            id: StatId(5),
            game_id: courtside_api::GameId(1),
            player_id: courtside_api::PlayerId(2),
            player: None,
            points: 3,
            fouls: 0,
            verification: VerificationStatus::Unverified,
            source_url: None,
            scraped: true,
        };
        let mut review = ReviewQueue::default();
        review.load();
        review.loaded(Ok(vec![stat]));
        assert_eq!(review_status(&review, StatId(5)), "");

        assert!(review.request_reject(StatId(5)));
        assert_eq!(review_status(&review, StatId(5)), "reject? y/n");

        review.cancel_reject();
        assert_eq!(review_status(&review, StatId(5)), "");
    }
}
