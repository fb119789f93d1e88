use docmerger::cli::{AppConfig, Args};
use docmerger::config::UserConfig;
use docmerger::domain::format::OutputFormat;
use docmerger::domain::SUPPORTED_EXTENSIONS;
use docmerger::session::{Session, StatusReport};
use docmerger::tui::{
    apply_mouse_action, handle_confirm_input, handle_key_event, handle_mouse_event,
    handle_text_input, render, render_confirm_overwrite_overlay, render_help_overlay,
    render_merging_overlay, render_name_editor, render_welcome_overlay, KeyAction, TextInput,
    UiState, ViewState,
};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::{io, time::Duration};
use tracing::{debug, info, warn};
use tracing_subscriber::{
    fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter, Registry,
};

const DEFAULT_LOG_FILTER: &str = "docmerger=info";

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Convert to config
    let config: AppConfig = args.into();

    init_logging(&config)?;

    if config.is_headless() {
        run_headless(&config)
    } else {
        run_app_with_config(&config)
    }
}

/// Headless runs log to stderr. The TUI owns the terminal, so it logs to a
/// file instead: `--log-file`, or `debug.log` in the user cache directory.
fn init_logging(config: &AppConfig) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if config.is_headless() {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr).with_target(false))
            .init();
        return Ok(());
    }

    let Some(log_path) = config.log_file.clone().or_else(default_log_path) else {
        return Ok(());
    };
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .init();
    Ok(())
}

fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("docmerger").join("debug.log"))
}

/// Merges the `--files` list once, prints the outcome and exits.
fn run_headless(config: &AppConfig) -> io::Result<()> {
    let mut session = Session::new(SUPPORTED_EXTENSIONS.iter().copied());
    session.open_directory(config.directory.clone());

    if let Err(e) = session.apply_selection(config.files.as_slice()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if let Some(format) = config.format {
        if let Err(e) = session.set_format(format) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
    session.set_output_name(config.output_name.clone().unwrap_or_default());

    let result = session.merge_selected(|path| {
        if !config.assume_yes {
            eprintln!(
                "{} already exists; pass --yes to overwrite it",
                path.display()
            );
        }
        config.assume_yes
    });

    match session.status() {
        Some(status @ StatusReport::Success(_)) => println!("{}", status),
        Some(status) => eprintln!("{}", status),
        None => {}
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

/// Runs the TUI application with configuration
pub fn run_app_with_config(config: &AppConfig) -> io::Result<()> {
    // Load user configuration
    let mut user_config = UserConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load user config");
        UserConfig::default()
    });

    let filters = config
        .extension_filters
        .clone()
        .unwrap_or_else(|| user_config.default_filters.clone());
    let mut session = Session::new(filters);
    session.open_directory(config.directory.clone());
    if let Some(name) = &config.output_name {
        session.set_output_name(name.clone());
    }
    info!(
        directory = %config.directory.display(),
        entries = session.registry().len(),
        "session started"
    );

    // Show welcome on first launch or if --welcome flag is set
    let should_show_welcome = config.show_welcome || !user_config.welcome_shown;
    let mut ui = UiState::new(if should_show_welcome {
        ViewState::Welcome
    } else {
        ViewState::Browsing
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_loop(
        &mut terminal,
        &mut session,
        &mut ui,
        &mut user_config,
        config.format,
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Remember the filters for next time
    user_config.default_filters = session.filters().iter().cloned().collect();
    if let Err(e) = user_config.save() {
        warn!(error = %e, "failed to save user config");
    }

    if let Some(status) = session.status() {
        println!("{}", status);
    }

    result
}

/// Main application loop
fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
    ui: &mut UiState,
    user_config: &mut UserConfig,
    mut preferred_format: Option<OutputFormat>,
) -> io::Result<()> {
    loop {
        // Render the list, then the overlay for the current view
        terminal.draw(|frame| {
            render(frame, session, ui);

            match ui.view {
                ViewState::Help => render_help_overlay(frame),
                ViewState::Welcome => render_welcome_overlay(frame),
                ViewState::ConfirmOverwrite => {
                    if let Some(plan) = &ui.pending_plan {
                        render_confirm_overwrite_overlay(frame, &plan.output);
                    }
                }
                ViewState::EditingName => {
                    render_name_editor(frame, &ui.name_buffer, session.format().extension())
                }
                ViewState::Merging => {
                    if let Some(plan) = &ui.pending_plan {
                        render_merging_overlay(frame, plan);
                    }
                }
                ViewState::Browsing => {}
            }
        })?;

        // The merging overlay is on screen; run the merge now
        if ui.view == ViewState::Merging {
            if let Some(plan) = ui.pending_plan.take() {
                if let Err(e) = session.run_merge(&plan) {
                    debug!(error = %e, "merge did not complete");
                }
            }
            ui.view = ViewState::Browsing;
            continue;
        }

        // Handle input
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key(key, session, ui, user_config) {
                    break;
                }
            }
            Event::Mouse(mouse) if ui.view == ViewState::Browsing => {
                let action = handle_mouse_event(
                    mouse,
                    &ui.viewport,
                    session.registry().len(),
                    session.reorder().is_dragging(),
                );
                apply_mouse_action(session, ui, action);
            }
            _ => {}
        }

        // A --format given on the command line applies once the selection allows it
        if let Some(format) = preferred_format {
            if session.set_format(format).is_ok() {
                preferred_format = None;
            }
        }
    }

    Ok(())
}

/// Handles one key press. Returns `true` when the app should quit.
fn handle_key(
    key: KeyEvent,
    session: &mut Session,
    ui: &mut UiState,
    user_config: &mut UserConfig,
) -> bool {
    // Handle overlay-specific input
    match ui.view {
        ViewState::Help => {
            // Any key closes help (or toggle with ?)
            let action = handle_key_event(key);
            if matches!(action, KeyAction::Help | KeyAction::Quit | KeyAction::None) {
                ui.view = ViewState::Browsing;
            }
            return false;
        }
        ViewState::Welcome => {
            // Any key dismisses welcome and starts browsing
            ui.view = ViewState::Browsing;

            // Mark welcome as shown and persist
            user_config.welcome_shown = true;
            if let Err(e) = user_config.save() {
                warn!(error = %e, "failed to save user config");
            }
            return false;
        }
        ViewState::ConfirmOverwrite => {
            match handle_confirm_input(key) {
                KeyAction::ConfirmOverwrite => ui.view = ViewState::Merging,
                KeyAction::CancelOverwrite => {
                    if let Some(plan) = ui.pending_plan.take() {
                        session.decline(&plan);
                    }
                    ui.view = ViewState::Browsing;
                }
                _ => {}
            }
            return false;
        }
        ViewState::EditingName => {
            match handle_text_input(key) {
                TextInput::Insert(c) => ui.name_buffer.push(c),
                TextInput::Backspace => {
                    ui.name_buffer.pop();
                }
                TextInput::Submit => {
                    session.set_output_name(ui.name_buffer.trim());
                    ui.view = ViewState::Browsing;
                }
                TextInput::Cancel => ui.view = ViewState::Browsing,
                TextInput::None => {}
            }
            return false;
        }
        ViewState::Merging => return false,
        ViewState::Browsing => {}
    }

    let len = session.registry().len();
    match handle_key_event(key) {
        KeyAction::Quit => return true,
        KeyAction::CursorUp => ui.cursor_up(),
        KeyAction::CursorDown => ui.cursor_down(len),
        KeyAction::MoveUp => {
            if let (Some(name), Some(to)) = (ui.current_name(session), ui.cursor.checked_sub(1)) {
                if let Ok(Some(index)) = session.move_entry(&name, to) {
                    ui.cursor = index;
                }
            }
        }
        KeyAction::MoveDown => {
            if let Some(name) = ui.current_name(session) {
                if let Ok(Some(index)) = session.move_entry(&name, ui.cursor + 1) {
                    ui.cursor = index;
                }
            }
        }
        KeyAction::ToggleSelect => {
            if let Some(name) = ui.current_name(session) {
                if let Err(e) = session.toggle(&name) {
                    debug!(error = %e, "toggle failed");
                }
            }
        }
        KeyAction::SelectAll => session.select_all(),
        KeyAction::SelectNone => session.select_none(),
        KeyAction::ToggleFilter(index) => {
            if let Some(extension) = SUPPORTED_EXTENSIONS.get(index) {
                session.toggle_filter(extension);
                ui.clamp_cursor(session.registry().len());
            }
        }
        KeyAction::CycleFormat => {
            session.cycle_format();
        }
        KeyAction::EditName => {
            ui.name_buffer = session.output_name().to_string();
            ui.view = ViewState::EditingName;
        }
        KeyAction::Merge => match session.prepare_merge() {
            Ok(plan) => {
                ui.view = if plan.requires_confirmation {
                    ViewState::ConfirmOverwrite
                } else {
                    ViewState::Merging
                };
                ui.pending_plan = Some(plan);
            }
            Err(e) => session.set_status(StatusReport::Failure(e.to_string())),
        },
        KeyAction::OpenResult => {
            if let Err(e) = session.open_result_directory() {
                debug!(error = %e, "result directory not opened");
            }
        }
        KeyAction::Refresh => {
            session.refresh();
            ui.clamp_cursor(session.registry().len());
        }
        KeyAction::Help => ui.view = ViewState::Help,
        KeyAction::ConfirmOverwrite | KeyAction::CancelOverwrite => {
            // These actions are only handled in ConfirmOverwrite state
        }
        KeyAction::None => {}
    }
    false
}
