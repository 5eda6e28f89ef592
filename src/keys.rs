use crate::app::{App, MenuItem};
use crate::state::app_state::Modal;
use crate::state::league::FixturesAction;
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    if key_event.kind == KeyEventKind::Release {
        return;
    }

    let mut guard = app.lock().await;
    let requests = if guard.state.modal.is_some() {
        modal_keys(&mut guard, key_event)
    } else {
        tab_keys(&mut guard, key_event)
    };
    drop(guard);

    for request in requests {
        let _ = network_requests.send(request).await;
    }
}

/// While a modal is open every printable key is text input.
fn modal_keys(app: &mut App, key_event: KeyEvent) -> Vec<NetworkRequest> {
    if matches!(app.state.modal, Some(Modal::Confirm(_))) {
        return match key_event.code {
            Char('y') | Char('Y') | KeyCode::Enter => app.submit_modal(),
            Char('n') | Char('N') | KeyCode::Esc => {
                app.close_modal();
                Vec::new()
            }
            _ => Vec::new(),
        };
    }

    match (key_event.code, key_event.modifiers) {
        (Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }
        (KeyCode::Esc, _) => app.close_modal(),
        (KeyCode::Enter, _) => return app.submit_modal(),
        (Char('f'), KeyModifiers::CONTROL) => return app.intake_refetch(),
        (Char('r'), KeyModifiers::CONTROL) => app.open_registration(),
        (Char('e'), KeyModifiers::CONTROL) => return app.resend_verification(),
        (KeyCode::Tab | KeyCode::Down, _) => {
            if let Some(form) = app.modal_form_mut() {
                form.focus_next();
            }
        }
        (KeyCode::BackTab | KeyCode::Up, _) => {
            if let Some(form) = app.modal_form_mut() {
                form.focus_prev();
            }
        }
        (KeyCode::Backspace, _) => {
            if let Some(form) = app.modal_form_mut() {
                form.backspace();
            }
        }
        (Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            if let Some(form) = app.modal_form_mut() {
                form.input(c);
            }
        }
        _ => {}
    }
    Vec::new()
}

fn tab_keys(app: &mut App, key_event: KeyEvent) -> Vec<NetworkRequest> {
    let detail_open = app.state.game_detail.game_id.is_some();

    match (app.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => return app.update_tab(MenuItem::Dashboard),
        (_, Char('2'), _) => return app.update_tab(MenuItem::Games),
        (_, Char('3'), _) => return app.update_tab(MenuItem::Stats),
        (_, Char('4'), _) => return app.update_tab(MenuItem::Ladder),
        (_, Char('5'), _) => return app.update_tab(MenuItem::Roster),
        (_, Char('6'), _) => return app.update_tab(MenuItem::Review),
        (_, Char('7'), _) => return app.update_tab(MenuItem::Users),
        (_, Char('?'), _) => return app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => app.exit_help(),

        // Games
        (MenuItem::Games, Char('j') | KeyCode::Down, _) if detail_open => {
            let detail = &mut app.state.game_detail;
            detail.scroll_offset = detail.scroll_offset.saturating_add(1);
        }
        (MenuItem::Games, Char('k') | KeyCode::Up, _) if detail_open => {
            let detail = &mut app.state.game_detail;
            detail.scroll_offset = detail.scroll_offset.saturating_sub(1);
        }
        (MenuItem::Games, KeyCode::Esc, _) => app.state.game_detail.close(),
        (MenuItem::Games, Char('j') | KeyCode::Down, _) => app.state.games.select_next(),
        (MenuItem::Games, Char('k') | KeyCode::Up, _) => app.state.games.select_prev(),
        (MenuItem::Games, KeyCode::Enter, _) => return app.open_game_detail(),
        (MenuItem::Games, Char('n'), _) => app.new_game(),
        (MenuItem::Games, Char('e'), _) => app.edit_selected_game(),
        (MenuItem::Games, Char('d'), _) => app.delete_selected_game(),
        (MenuItem::Games | MenuItem::Stats, Char('s'), _) => app.intake_for_selected_game(),

        // Stats
        (MenuItem::Stats, Char('j') | KeyCode::Down, _) => app.state.season.select_next(),
        (MenuItem::Stats, Char('k') | KeyCode::Up, _) => app.state.season.select_prev(),
        (MenuItem::Stats, KeyCode::Enter, _) => return app.open_player_history(),

        // Ladder and fixtures
        (MenuItem::Ladder, Char('u'), _) => return app.update_ladder(),
        (MenuItem::Ladder, Char('F'), _) => return app.run_fixtures(FixturesAction::Update),
        (MenuItem::Ladder, Char('S'), _) => return app.run_fixtures(FixturesAction::Sync),

        // Roster
        (MenuItem::Roster, Char('j') | KeyCode::Down, _) => app.state.roster.select_next(),
        (MenuItem::Roster, Char('k') | KeyCode::Up, _) => app.state.roster.select_prev(),
        (MenuItem::Roster, Char('/'), _) => app.open_search(),
        (MenuItem::Roster, Char('i'), _) => app.state.roster.toggle_inactive(),
        (MenuItem::Roster, Char('n'), _) => app.new_player(),
        (MenuItem::Roster, Char('e'), _) => app.edit_selected_player(),
        (MenuItem::Roster, Char('t'), _) => return app.toggle_selected_player_active(),
        (MenuItem::Roster, Char('m'), _) => app.merge_step(),
        (MenuItem::Roster, KeyCode::Esc, _) => app.state.roster.merge_source = None,

        // Review
        (MenuItem::Review, Char('j') | KeyCode::Down, _) => app.state.review.select_next(),
        (MenuItem::Review, Char('k') | KeyCode::Up, _) => app.state.review.select_prev(),
        (MenuItem::Review, Char('v'), _) => return app.verify_selected_stat(),
        (MenuItem::Review, Char('x'), _) => app.reject_selected_stat(),

        // Users
        (MenuItem::Users, Char('j') | KeyCode::Down, _) => app.state.users.select_next(),
        (MenuItem::Users, Char('k') | KeyCode::Up, _) => app.state.users.select_prev(),
        (MenuItem::Users, Char('v'), _) => return app.verify_selected_user(),
        (MenuItem::Users, Char('x'), _) => app.delete_selected_user(),
        (MenuItem::Users, Char('n'), _) => app.new_manager(),

        // Global
        (_, Char('L'), _) => return app.toggle_login(),
        (_, Char('r'), _) => return app.refresh_active_tab(),
        (_, Char('f'), _) => app.toggle_full_screen(),
        (_, Char('"'), _) => app.toggle_show_logs(),
        (_, KeyCode::Esc, _) => app.dismiss_notice(),

        _ => {}
    }
    Vec::new()
}
