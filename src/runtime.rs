use std::io::{self, Stdout};
use std::ops::{Deref, DerefMut};
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde_json::{Map, Value};

use crate::{
    config::CompanyConfig,
    form::FormEvent,
    session::CompanySession,
    ui::{self, PopupRender, UiContext},
};

const HELP_TEXT: &str =
    "Tab/Shift+Tab fields • Ctrl+O companies • Enter choose option • Ctrl+S submit • Ctrl+Q quit";
const READY_STATUS: &str = "Ready. Press Ctrl+O to choose a company.";
const COMPANY_POPUP_TITLE: &str = "Select a Company";

#[derive(Debug, Clone)]
pub struct UiOptions {
    pub tick_rate: Duration,
    pub auto_validate: bool,
    pub confirm_exit: bool,
    pub show_help: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            auto_validate: false,
            confirm_exit: true,
            show_help: true,
        }
    }
}

impl UiOptions {
    pub fn with_auto_validate(mut self, enabled: bool) -> Self {
        self.auto_validate = enabled;
        self
    }

    pub fn with_confirm_exit(mut self, confirm: bool) -> Self {
        self.confirm_exit = confirm;
        self
    }

    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }
}

/// A validated record handed off at submit time.
#[derive(Debug, Clone)]
pub struct Submission {
    pub company: String,
    pub record: Map<String, Value>,
}

/// Interactive entry point: renders the per-company forms described by a
/// validated configuration and returns the last submitted record, if any.
#[derive(Debug)]
pub struct DynFormUI {
    config: CompanyConfig,
    title: Option<String>,
    company: Option<String>,
    options: UiOptions,
}

impl DynFormUI {
    pub fn new(config: CompanyConfig) -> Self {
        Self {
            config,
            title: None,
            company: None,
            options: UiOptions::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Preselect a company instead of starting unselected.
    pub fn with_company(mut self, key: impl Into<String>) -> Self {
        self.company = Some(key.into());
        self
    }

    pub fn with_options(mut self, options: UiOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(self) -> Result<Option<Submission>> {
        let DynFormUI {
            config,
            title,
            company,
            options,
        } = self;

        let mut app = App::new(config, title, options);
        if let Some(key) = company {
            app.select_company(&key);
        }
        app.run()
    }
}

enum AppPopup {
    CompanySelector { keys: Vec<String>, selected: usize },
    FieldOptions {
        field: String,
        label: String,
        options: Vec<String>,
        selected: usize,
    },
}

struct App {
    session: CompanySession,
    options: UiOptions,
    title: Option<String>,
    status_message: String,
    error_count: usize,
    focus: usize,
    popup: Option<AppPopup>,
    exit_armed: bool,
    should_quit: bool,
    result: Option<Submission>,
}

impl App {
    fn new(config: CompanyConfig, title: Option<String>, options: UiOptions) -> Self {
        Self {
            session: CompanySession::new(config),
            options,
            title,
            status_message: READY_STATUS.to_string(),
            error_count: 0,
            focus: 0,
            popup: None,
            exit_armed: false,
            should_quit: false,
            result: None,
        }
    }

    fn run(&mut self) -> Result<Option<Submission>> {
        let mut terminal = TerminalGuard::new()?;
        while !self.should_quit {
            self.drain_form_events();
            terminal.draw(|frame| self.draw(frame))?;
            if !event::poll(self.options.tick_rate)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(_, _) => {}
                Event::Mouse(_) => {}
                Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            }
        }
        Ok(self.result.take())
    }

    /// Consume the controller's pending notifications; the error counter in
    /// the footer follows the errors-changed events rather than re-reading
    /// the whole form every frame.
    fn drain_form_events(&mut self) {
        let Some(form) = self.session.controller_mut() else {
            return;
        };
        let events = form.take_events();
        let count = form.error_count();
        if events
            .iter()
            .any(|event| matches!(event, FormEvent::ErrorsChanged | FormEvent::Submitted))
        {
            self.error_count = count;
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let fields = self
            .session
            .controller()
            .map(|form| form.field_views().collect())
            .unwrap_or_default();
        let popup = self.popup.as_ref().map(|popup| match popup {
            AppPopup::CompanySelector { keys, selected } => PopupRender {
                title: COMPANY_POPUP_TITLE,
                items: keys,
                selected: *selected,
            },
            AppPopup::FieldOptions {
                label,
                options,
                selected,
                ..
            } => PopupRender {
                title: label,
                items: options,
                selected: *selected,
            },
        });

        ui::draw(
            frame,
            UiContext {
                title: self.title.as_deref(),
                company: self.session.selected_company(),
                fields,
                focus: self.focus,
                status_message: &self.status_message,
                dirty: self
                    .session
                    .controller()
                    .is_some_and(|form| form.is_dirty()),
                error_count: self.error_count,
                help: self.options.show_help.then_some(HELP_TEXT),
                popup,
            },
        );
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_popup_key(&key) {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    self.exit_armed = false;
                    self.on_submit();
                }
                KeyCode::Char('o') | KeyCode::Char('O') => {
                    self.exit_armed = false;
                    self.open_company_selector();
                }
                KeyCode::Char('q')
                | KeyCode::Char('Q')
                | KeyCode::Char('c')
                | KeyCode::Char('C') => self.on_exit(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus_next(1);
                self.exit_armed = false;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_next(-1);
                self.exit_armed = false;
            }
            KeyCode::Enter => {
                self.exit_armed = false;
                self.open_options_popup();
            }
            KeyCode::Esc => {
                self.exit_armed = false;
                self.status_message = READY_STATUS.to_string();
            }
            _ => self.handle_field_input(&key),
        }
    }

    fn handle_popup_key(&mut self, key: &KeyEvent) -> bool {
        let Some(popup) = &mut self.popup else {
            return false;
        };
        let len = match popup {
            AppPopup::CompanySelector { keys, .. } => keys.len(),
            AppPopup::FieldOptions { options, .. } => options.len(),
        };
        let selected = match popup {
            AppPopup::CompanySelector { selected, .. } => selected,
            AppPopup::FieldOptions { selected, .. } => selected,
        };
        match key.code {
            KeyCode::Up => {
                *selected = selected.checked_sub(1).unwrap_or(len.saturating_sub(1));
            }
            KeyCode::Down => {
                *selected = if *selected + 1 >= len { 0 } else { *selected + 1 };
            }
            KeyCode::Esc => {
                self.popup = None;
                self.status_message = READY_STATUS.to_string();
            }
            KeyCode::Enter => {
                let popup = self.popup.take();
                match popup {
                    Some(AppPopup::CompanySelector { keys, selected }) => {
                        if let Some(key) = keys.get(selected) {
                            let key = key.clone();
                            self.select_company(&key);
                        }
                    }
                    Some(AppPopup::FieldOptions {
                        field,
                        options,
                        selected,
                        ..
                    }) => {
                        if let (Some(option), Some(form)) =
                            (options.get(selected), self.session.controller_mut())
                        {
                            form.set_value(&field, option.clone());
                            if self.options.auto_validate {
                                form.validate();
                            }
                            self.status_message = "Value updated".to_string();
                        }
                    }
                    None => {}
                }
            }
            _ => {}
        }
        true
    }

    fn handle_field_input(&mut self, key: &KeyEvent) {
        let Some(form) = self.session.controller_mut() else {
            return;
        };
        let Some((name, label, is_select)) = form
            .field_views()
            .nth(self.focus)
            .map(|view| (view.name.to_string(), view.label.to_string(), view.widget.is_select()))
        else {
            return;
        };

        if is_select {
            if matches!(key.code, KeyCode::Char(_)) {
                self.status_message = format!("Press Enter to choose a value for {label}");
            }
            return;
        }

        let mut value = form.value(&name).to_string();
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => value.push(c),
            KeyCode::Backspace => {
                if value.pop().is_none() {
                    return;
                }
            }
            _ => return,
        }
        form.set_value(&name, value);
        if self.options.auto_validate {
            form.validate();
        }
        self.exit_armed = false;
        self.status_message = format!("Editing {label}");
    }

    fn focus_next(&mut self, delta: i32) {
        let len = self
            .session
            .controller()
            .map(|form| form.schema().len())
            .unwrap_or(0);
        if len == 0 {
            return;
        }
        let next = self.focus as i32 + delta;
        self.focus = (((next % len as i32) + len as i32) % len as i32) as usize;
    }

    fn open_company_selector(&mut self) {
        let keys: Vec<String> = self.session.company_keys().map(str::to_string).collect();
        if keys.is_empty() {
            self.status_message = "The configuration document lists no companies".to_string();
            return;
        }
        let selected = self
            .session
            .selected_company()
            .and_then(|current| keys.iter().position(|key| key == current))
            .unwrap_or(0);
        self.status_message = "Use ↑/↓ and Enter to choose".to_string();
        self.popup = Some(AppPopup::CompanySelector { keys, selected });
    }

    fn open_options_popup(&mut self) {
        let Some(form) = self.session.controller() else {
            return;
        };
        let Some(view) = form.field_views().nth(self.focus) else {
            return;
        };
        if !view.widget.is_select() || view.options.is_empty() {
            return;
        }
        let selected = view
            .options
            .iter()
            .position(|option| option == view.value)
            .unwrap_or(0);
        self.popup = Some(AppPopup::FieldOptions {
            field: view.name.to_string(),
            label: view.label.to_string(),
            options: view.options.to_vec(),
            selected,
        });
        self.status_message = "Use ↑/↓ and Enter to choose".to_string();
    }

    fn select_company(&mut self, key: &str) {
        match self.session.select(key) {
            Ok(true) => {
                self.focus = 0;
                self.error_count = 0;
                self.status_message = format!("Editing form for {key}. Ctrl+S submits.");
            }
            Ok(false) => {
                self.status_message = format!("Unknown company '{key}'");
            }
            Err(err) => {
                self.status_message = format!("Cannot render form for {key}: {err}");
            }
        }
    }

    fn on_submit(&mut self) {
        let Some(company) = self.session.selected_company().map(str::to_string) else {
            self.status_message = "Select a company before submitting".to_string();
            return;
        };
        let Some(form) = self.session.controller_mut() else {
            return;
        };
        match form.submit() {
            Ok(record) => {
                self.result = Some(Submission { company, record });
                self.status_message = "Submitted. Press Ctrl+Q to exit.".to_string();
            }
            Err(errors) => {
                self.status_message = format!("{} issue(s) remaining", errors.len());
            }
        }
    }

    fn on_exit(&mut self) {
        let dirty = self
            .session
            .controller()
            .is_some_and(|form| form.is_dirty());
        if self.options.confirm_exit && dirty && !self.exit_armed {
            self.exit_armed = true;
            self.status_message =
                "Unsubmitted entries. Press Ctrl+Q again to quit anyway.".to_string();
            return;
        }
        self.should_quit = true;
    }
}

static PANIC_HOOK: Once = Once::new();

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        install_panic_hook();
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        restore_terminal();
    }
}

impl Deref for TerminalGuard {
    type Target = Terminal<CrosstermBackend<Stdout>>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for TerminalGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            restore_terminal();
            previous(panic_info);
        }));
    });
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen, Show);
}
