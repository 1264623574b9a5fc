use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use duotui_core::{
    listing::RefreshEvent,
    models::{AdDraft, GameSummary, RefreshState, WeekDay},
    AppConfig,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_FIELD_LEN: usize = 64;
const CARD_WIDTH: u16 = 24;
const CARD_HEIGHT: u16 = 5;
const LABEL_WIDTH: usize = 16;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Magenta,
            accent_alt: Color::Cyan,
            muted: Color::DarkGray,
            on_accent: Color::White,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Form fields of the ad composer, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposerField {
    Game,
    Nickname,
    YearsPlaying,
    Discord,
    WeekDays,
    HourStart,
    HourEnd,
    VoiceChat,
}

impl ComposerField {
    const ORDER: [ComposerField; 8] = [
        ComposerField::Game,
        ComposerField::Nickname,
        ComposerField::YearsPlaying,
        ComposerField::Discord,
        ComposerField::WeekDays,
        ComposerField::HourStart,
        ComposerField::HourEnd,
        ComposerField::VoiceChat,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }

    fn label(self) -> &'static str {
        match self {
            ComposerField::Game => "Which game?",
            ComposerField::Nickname => "Your nickname",
            ComposerField::YearsPlaying => "Years playing",
            ComposerField::Discord => "Discord",
            ComposerField::WeekDays => "Days you play",
            ComposerField::HourStart => "From (HH:MM)",
            ComposerField::HourEnd => "To (HH:MM)",
            ComposerField::VoiceChat => "Voice chat",
        }
    }

    // Content row inside the composer popup, below the top border.
    fn row(self) -> u16 {
        match self {
            ComposerField::Game => 0,
            ComposerField::Nickname => 1,
            ComposerField::YearsPlaying => 2,
            ComposerField::Discord => 3,
            ComposerField::WeekDays => 5,
            ComposerField::HourStart => 6,
            ComposerField::HourEnd => 7,
            ComposerField::VoiceChat => 8,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn with_value(value: String) -> Self {
        let cursor = value.len();
        Self { value, cursor }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.value.len() as isize;
        let mut next = self.cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next > len {
            next = len;
        }
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.value.len();
    }

    fn insert(&mut self, ch: char) {
        if self.value.len() >= MAX_FIELD_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.value.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.value.len() {
            self.cursor -= 1;
            self.value.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }
}

/// Open state of the compose-ad dialog. Present on the app only while
/// the dialog is open; dropping it discards the draft.
#[derive(Debug, Clone)]
struct ComposerModal {
    focus: ComposerField,
    game: TextInput,
    nickname: TextInput,
    years_playing: TextInput,
    discord: TextInput,
    hour_start: TextInput,
    hour_end: TextInput,
    days: [bool; 7],
    day_cursor: usize,
    use_voice_channel: bool,
}

impl ComposerModal {
    fn new(prefill: Option<&GameSummary>) -> Self {
        let game = prefill
            .map(|summary| TextInput::with_value(summary.title.clone()))
            .unwrap_or_default();
        Self {
            focus: ComposerField::Game,
            game,
            nickname: TextInput::default(),
            years_playing: TextInput::default(),
            discord: TextInput::default(),
            hour_start: TextInput::default(),
            hour_end: TextInput::default(),
            days: [false; 7],
            day_cursor: 0,
            use_voice_channel: false,
        }
    }

    fn focused_text(&self) -> Option<&TextInput> {
        match self.focus {
            ComposerField::Game => Some(&self.game),
            ComposerField::Nickname => Some(&self.nickname),
            ComposerField::YearsPlaying => Some(&self.years_playing),
            ComposerField::Discord => Some(&self.discord),
            ComposerField::HourStart => Some(&self.hour_start),
            ComposerField::HourEnd => Some(&self.hour_end),
            ComposerField::WeekDays | ComposerField::VoiceChat => None,
        }
    }

    fn focused_text_mut(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            ComposerField::Game => Some(&mut self.game),
            ComposerField::Nickname => Some(&mut self.nickname),
            ComposerField::YearsPlaying => Some(&mut self.years_playing),
            ComposerField::Discord => Some(&mut self.discord),
            ComposerField::HourStart => Some(&mut self.hour_start),
            ComposerField::HourEnd => Some(&mut self.hour_end),
            ComposerField::WeekDays | ComposerField::VoiceChat => None,
        }
    }

    fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    fn move_left(&mut self) {
        if self.focus == ComposerField::WeekDays {
            self.day_cursor = self.day_cursor.saturating_sub(1);
        } else if let Some(input) = self.focused_text_mut() {
            input.move_cursor(-1);
        }
    }

    fn move_right(&mut self) {
        if self.focus == ComposerField::WeekDays {
            self.day_cursor = cmp::min(self.day_cursor + 1, WeekDay::ALL.len() - 1);
        } else if let Some(input) = self.focused_text_mut() {
            input.move_cursor(1);
        }
    }

    fn move_home(&mut self) {
        if self.focus == ComposerField::WeekDays {
            self.day_cursor = 0;
        } else if let Some(input) = self.focused_text_mut() {
            input.move_home();
        }
    }

    fn move_end(&mut self) {
        if self.focus == ComposerField::WeekDays {
            self.day_cursor = WeekDay::ALL.len() - 1;
        } else if let Some(input) = self.focused_text_mut() {
            input.move_end();
        }
    }

    fn insert(&mut self, ch: char) {
        if self.focus == ComposerField::YearsPlaying && !ch.is_ascii_digit() {
            return;
        }
        if let Some(input) = self.focused_text_mut() {
            input.insert(ch);
        }
    }

    fn backspace(&mut self) {
        if let Some(input) = self.focused_text_mut() {
            input.backspace();
        }
    }

    fn delete(&mut self) {
        if let Some(input) = self.focused_text_mut() {
            input.delete();
        }
    }

    /// Flip the focused toggle. Each weekday toggles on its own; no
    /// other control is affected.
    fn toggle_focused(&mut self) {
        match self.focus {
            ComposerField::WeekDays => self.days[self.day_cursor] = !self.days[self.day_cursor],
            ComposerField::VoiceChat => self.use_voice_channel = !self.use_voice_channel,
            _ => {}
        }
    }

    fn is_toggle_focus(&self) -> bool {
        matches!(
            self.focus,
            ComposerField::WeekDays | ComposerField::VoiceChat
        )
    }

    fn draft(&self) -> AdDraft {
        AdDraft {
            game: self.game.value.trim().to_string(),
            nickname: self.nickname.value.trim().to_string(),
            years_playing: self.years_playing.value.trim().to_string(),
            discord: self.discord.value.trim().to_string(),
            week_days: self.days,
            hour_start: self.hour_start.value.trim().to_string(),
            hour_end: self.hour_end.value.trim().to_string(),
            use_voice_channel: self.use_voice_channel,
        }
    }
}

struct UiState {
    cursor: usize,
    row_offset: usize,
    grid_cols: usize,
    status: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            row_offset: 0,
            grid_cols: 1,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, status: String) {
        self.status = status;
    }

    fn clamp_cursor(&mut self, total: usize) {
        if total == 0 {
            self.cursor = 0;
            self.row_offset = 0;
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
    }

    fn move_cursor(&mut self, dx: isize, dy: isize, total: usize) {
        if total == 0 {
            return;
        }
        let cols = self.grid_cols.max(1) as isize;
        let mut idx = self.cursor as isize + dx + dy * cols;
        if idx < 0 {
            idx = 0;
        }
        let max = total as isize - 1;
        if idx > max {
            idx = max;
        }
        self.cursor = idx as usize;
    }
}

/// High-level application state for the duo listing TUI.
pub struct DuoApp {
    config: AppConfig,
    state: UiState,
    refresh: RefreshState,
    composer: Option<ComposerModal>,
    refresh_rx: Option<mpsc::Receiver<RefreshEvent>>,
    theme: Theme,
}

impl DuoApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: UiState::default(),
            refresh: RefreshState::default(),
            composer: None,
            refresh_rx: None,
            theme: Theme::default(),
        }
    }

    pub fn attach_refresh(&mut self, receiver: mpsc::Receiver<RefreshEvent>) {
        self.refresh_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state
            .set_status(format!("Fetching listings from {}", self.config.server_url));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut refresh_rx = self.refresh_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if refresh_rx.is_some() {
                let mut refresh_closed = false;
                let rx = refresh_rx.as_mut().unwrap();
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_refresh = rx.recv() => {
                        match maybe_refresh {
                            Some(event) => self.handle_refresh_event(event),
                            None => refresh_closed = true,
                        }
                    }
                }
                if refresh_closed {
                    refresh_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => self.handle_key(key),
            Some(AppEvent::Input(_)) => {}
            Some(AppEvent::Tick) => {}
            None => return false,
        }
        true
    }

    fn handle_refresh_event(&mut self, event: RefreshEvent) {
        match event {
            RefreshEvent::Loaded {
                seq,
                games,
                fetched_at,
            } => {
                let total = games.len();
                if self.refresh.apply(seq, games, fetched_at) {
                    info!(seq, total, "listing refreshed");
                    self.state.clamp_cursor(self.refresh.games().len());
                    self.state.set_status(format!("Loaded {total} games"));
                } else {
                    debug!(seq, "discarded stale listing fetch");
                }
            }
            RefreshEvent::Failed { seq, error } => {
                // Logged and absorbed: the previous listing stays on
                // screen and the refresh cadence continues unchanged.
                error!(seq, %error, "listing fetch failed");
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.composer.is_some() {
            self.handle_composer_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.should_quit = true;
            }
            KeyCode::Char('a') => self.open_composer(),
            KeyCode::Left | KeyCode::Char('h') => {
                self.state.move_cursor(-1, 0, self.refresh.games().len());
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.state.move_cursor(1, 0, self.refresh.games().len());
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.move_cursor(0, -1, self.refresh.games().len());
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.move_cursor(0, 1, self.refresh.games().len());
            }
            _ => {}
        }
    }

    fn open_composer(&mut self) {
        let prefill = self.refresh.games().get(self.state.cursor);
        self.composer = Some(ComposerModal::new(prefill));
        self.state
            .set_status("Publishing an ad: Tab moves, Enter publishes, Esc cancels".to_string());
    }

    fn handle_composer_key(&mut self, key: KeyEvent) {
        let mut cancel = false;
        let mut submit = false;
        if let Some(composer) = self.composer.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Enter => submit = true,
                KeyCode::Tab | KeyCode::Down => composer.focus_next(),
                KeyCode::BackTab | KeyCode::Up => composer.focus_prev(),
                KeyCode::Left => composer.move_left(),
                KeyCode::Right => composer.move_right(),
                KeyCode::Home => composer.move_home(),
                KeyCode::End => composer.move_end(),
                KeyCode::Backspace => composer.backspace(),
                KeyCode::Delete => composer.delete(),
                KeyCode::Char(' ') if composer.is_toggle_focus() => composer.toggle_focused(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        composer.insert(ch);
                    }
                }
                _ => {}
            }
        }

        if cancel {
            self.composer = None;
            self.state.set_status("Ad draft discarded".to_string());
            return;
        }

        if submit {
            if let Some(composer) = self.composer.take() {
                let draft = composer.draft();
                // Ad creation has no wire contract yet; the draft is
                // logged and dropped.
                debug!(
                    game = %draft.game,
                    nickname = %draft.nickname,
                    days = ?draft.selected_days(),
                    voice = draft.use_voice_channel,
                    "ad submit requested; publishing is not wired to a backend"
                );
                self.state
                    .set_status("Ad publishing is not available yet".to_string());
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(CARD_HEIGHT),
                Constraint::Length(4),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        self.render_grid(frame, chunks[1]);
        self.render_trigger_banner(frame, chunks[2]);
        self.render_status(frame, chunks[3]);

        if let Some(composer) = self.composer.as_ref() {
            self.render_composer(frame, size, composer);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let bold = Style::default()
            .fg(self.theme.primary_fg)
            .add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(vec![
            Span::styled("Your ", bold),
            Span::styled(
                "duo",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" is here.", bold),
        ])];

        if let Some(at) = self.refresh.last_updated() {
            lines.push(Line::from(Span::styled(
                format!("Last updated: {}", at.format("%Y-%m-%d %H:%M:%S")),
                Style::default().fg(self.theme.muted),
            )));
        }

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn render_grid(&mut self, frame: &mut Frame, area: Rect) {
        let games = self.refresh.games();
        let cols = cmp::max(1, ((area.width + 1) / (CARD_WIDTH + 1)) as usize);
        let rows_visible = cmp::max(1, (area.height / CARD_HEIGHT) as usize);
        self.state.grid_cols = cols;
        self.state.clamp_cursor(games.len());

        // An empty listing renders no cards and no placeholder.
        if games.is_empty() {
            return;
        }

        let cursor_row = self.state.cursor / cols;
        if cursor_row < self.state.row_offset {
            self.state.row_offset = cursor_row;
        } else if cursor_row >= self.state.row_offset + rows_visible {
            self.state.row_offset = cursor_row + 1 - rows_visible;
        }

        let mut index = self.state.row_offset * cols;
        'rows: for row in 0..rows_visible {
            let y = area.y + (row as u16) * CARD_HEIGHT;
            if y + CARD_HEIGHT > area.y + area.height {
                break;
            }
            for col in 0..cols {
                if index >= games.len() {
                    break 'rows;
                }
                let x = area.x + (col as u16) * (CARD_WIDTH + 1);
                if x + CARD_WIDTH > area.x + area.width {
                    break;
                }
                let rect = Rect::new(x, y, CARD_WIDTH, CARD_HEIGHT);
                self.render_card(frame, rect, &games[index], index == self.state.cursor);
                index += 1;
            }
        }
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, game: &GameSummary, selected: bool) {
        let border_style = if selected {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let ads = game.ads();
        let lines = vec![
            Line::from(Span::styled(
                game.title.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                game.banner_url.clone(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(Span::styled(
                format!("{ads} ad{}", if ads == 1 { "" } else { "s" }),
                Style::default().fg(self.theme.accent_alt),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_trigger_banner(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "Haven't found your duo?",
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(
                    "Publish an ad to find new players!  ",
                    Style::default().fg(self.theme.muted),
                ),
                Span::styled(
                    " a ",
                    Style::default()
                        .fg(self.theme.on_accent)
                        .bg(self.theme.accent),
                ),
                Span::styled(" Publish ad", Style::default().fg(self.theme.accent)),
            ]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.accent)),
            )
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(
                self.state.status.clone(),
                Style::default().fg(self.theme.primary_fg),
            ),
            Span::styled(
                "  •  q quit · a publish ad · arrows move",
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(paragraph, area);
    }

    fn render_composer(&self, frame: &mut Frame, area: Rect, composer: &ComposerModal) {
        let width = cmp::max(cmp::min(58, area.width.saturating_sub(4)), 30);
        let height = cmp::max(cmp::min(13, area.height.saturating_sub(2)), 9);
        let popup = centered_rect(width, height, area);

        frame.render_widget(Clear, popup);

        let lines = vec![
            self.text_field_line(ComposerField::Game, &composer.game, composer.focus),
            self.text_field_line(ComposerField::Nickname, &composer.nickname, composer.focus),
            self.text_field_line(
                ComposerField::YearsPlaying,
                &composer.years_playing,
                composer.focus,
            ),
            self.text_field_line(ComposerField::Discord, &composer.discord, composer.focus),
            Line::from(""),
            self.weekday_line(composer),
            self.text_field_line(
                ComposerField::HourStart,
                &composer.hour_start,
                composer.focus,
            ),
            self.text_field_line(ComposerField::HourEnd, &composer.hour_end, composer.focus),
            self.voice_line(composer),
            Line::from(""),
            self.composer_help_line(),
        ];

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.accent))
                .title("Publish an ad"),
        );
        frame.render_widget(paragraph, popup);

        if let Some(input) = composer.focused_text() {
            let cursor_x = (popup.x + 1 + 2 + LABEL_WIDTH as u16 + input.cursor as u16)
                .min(popup.x + popup.width.saturating_sub(2));
            let cursor_y = popup.y + 1 + composer.focus.row();
            frame.set_cursor(cursor_x, cursor_y);
        }
    }

    fn marker_span(&self, focused: bool) -> Span<'static> {
        if focused {
            Span::styled("▶ ", Style::default().fg(self.theme.accent))
        } else {
            Span::raw("  ")
        }
    }

    fn label_span(&self, field: ComposerField) -> Span<'static> {
        Span::styled(
            format!("{:<LABEL_WIDTH$}", field.label()),
            Style::default().fg(self.theme.muted),
        )
    }

    fn text_field_line(
        &self,
        field: ComposerField,
        input: &TextInput,
        focus: ComposerField,
    ) -> Line<'static> {
        Line::from(vec![
            self.marker_span(focus == field),
            self.label_span(field),
            Span::styled(
                input.value.clone(),
                Style::default().fg(self.theme.primary_fg),
            ),
        ])
    }

    fn weekday_line(&self, composer: &ComposerModal) -> Line<'static> {
        let focused = composer.focus == ComposerField::WeekDays;
        let mut spans = vec![
            self.marker_span(focused),
            self.label_span(ComposerField::WeekDays),
        ];
        for (idx, day) in WeekDay::ALL.iter().enumerate() {
            let mut style = if composer.days[idx] {
                Style::default()
                    .fg(self.theme.on_accent)
                    .bg(self.theme.accent)
            } else {
                Style::default().fg(self.theme.muted)
            };
            if focused && idx == composer.day_cursor {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            spans.push(Span::styled(format!(" {} ", day.short_label()), style));
        }
        Line::from(spans)
    }

    fn voice_line(&self, composer: &ComposerModal) -> Line<'static> {
        let focused = composer.focus == ComposerField::VoiceChat;
        let checkbox = if composer.use_voice_channel {
            "[x]"
        } else {
            "[ ]"
        };
        Line::from(vec![
            self.marker_span(focused),
            self.label_span(ComposerField::VoiceChat),
            Span::styled(
                format!("{checkbox} I usually connect to voice chat"),
                Style::default().fg(self.theme.primary_fg),
            ),
        ])
    }

    fn composer_help_line(&self) -> Line<'static> {
        let key = Style::default().add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled("Enter", key),
            Span::raw(" publish  "),
            Span::styled("Esc", key),
            Span::raw(" cancel  "),
            Span::styled("Tab", key),
            Span::raw(" next  "),
            Span::styled("Space", key),
            Span::raw(" toggle"),
        ])
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use duotui_core::models::GameCounts;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn summary(id: &str, title: &str, ads: u32) -> GameSummary {
        GameSummary {
            id: id.to_string(),
            title: title.to_string(),
            banner_url: format!("/{id}.png"),
            count: GameCounts { ads },
        }
    }

    fn app_with_games(games: Vec<GameSummary>) -> DuoApp {
        let mut app = DuoApp::new(AppConfig::default());
        app.handle_refresh_event(RefreshEvent::Loaded {
            seq: 1,
            games,
            fetched_at: Local::now(),
        });
        app
    }

    #[test]
    fn trigger_opens_composer_and_cancel_closes_it() {
        let mut app = DuoApp::new(AppConfig::default());
        assert!(app.composer.is_none());

        app.handle_key(key(KeyCode::Char('a')));
        assert!(app.composer.is_some());

        app.handle_key(key(KeyCode::Esc));
        assert!(app.composer.is_none());
    }

    #[test]
    fn submit_closes_composer_without_touching_listing() {
        let mut app = app_with_games(vec![summary("1", "League of Legends", 5)]);
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Enter));

        assert!(app.composer.is_none());
        assert_eq!(app.refresh.games().len(), 1);
        assert_eq!(app.refresh.games()[0].title, "League of Legends");
    }

    #[test]
    fn only_cancel_and_submit_close_the_composer() {
        let mut app = DuoApp::new(AppConfig::default());
        app.handle_key(key(KeyCode::Char('a')));

        for code in [
            KeyCode::Char('x'),
            KeyCode::Tab,
            KeyCode::BackTab,
            KeyCode::Char(' '),
            KeyCode::Left,
            KeyCode::Backspace,
        ] {
            app.handle_key(key(code));
            assert!(app.composer.is_some(), "{code:?} closed the composer");
        }
    }

    #[test]
    fn composer_prefills_selected_game() {
        let mut app = app_with_games(vec![
            summary("1", "League of Legends", 5),
            summary("2", "Dota 2", 2),
        ]);
        app.state.grid_cols = 2;
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Char('a')));

        let composer = app.composer.as_ref().expect("composer open");
        assert_eq!(composer.game.value, "Dota 2");
    }

    #[test]
    fn weekday_toggles_are_independent() {
        let mut modal = ComposerModal::new(None);
        modal.focus = ComposerField::WeekDays;

        modal.day_cursor = 2;
        modal.toggle_focused();
        assert_eq!(
            modal.days,
            [false, false, true, false, false, false, false]
        );

        modal.day_cursor = 5;
        modal.toggle_focused();
        assert_eq!(modal.days, [false, false, true, false, false, true, false]);

        // Toggling off leaves the other day untouched.
        modal.day_cursor = 2;
        modal.toggle_focused();
        assert_eq!(
            modal.days,
            [false, false, false, false, false, true, false]
        );
        assert!(!modal.use_voice_channel);
    }

    #[test]
    fn years_field_accepts_digits_only() {
        let mut modal = ComposerModal::new(None);
        modal.focus = ComposerField::YearsPlaying;
        for ch in ['1', 'a', '2', '-', '3'] {
            modal.insert(ch);
        }
        assert_eq!(modal.years_playing.value, "123");
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::default();
        for ch in "duo".chars() {
            input.insert(ch);
        }
        input.move_cursor(-1);
        input.insert('n');
        assert_eq!(input.value, "duno");

        input.backspace();
        assert_eq!(input.value, "duo");
        input.move_home();
        input.delete();
        assert_eq!(input.value, "uo");
    }

    #[test]
    fn focus_order_cycles_through_all_fields() {
        let mut field = ComposerField::Game;
        let mut seen = Vec::new();
        for _ in 0..ComposerField::ORDER.len() {
            seen.push(field);
            field = field.next();
        }
        assert_eq!(seen, ComposerField::ORDER);
        assert_eq!(field, ComposerField::Game);
        assert_eq!(ComposerField::Game.prev(), ComposerField::VoiceChat);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_listing() {
        let mut app = app_with_games(vec![summary("1", "League of Legends", 5)]);
        let status_before = app.state.status.clone();

        // Nothing listens on the discard port, so this yields a real
        // transport error to wrap.
        let error = reqwest::Client::new()
            .get("http://127.0.0.1:9/games")
            .send()
            .await
            .map(|_| ())
            .expect_err("connection should be refused");

        app.handle_refresh_event(RefreshEvent::Failed {
            seq: 2,
            error: duotui_core::ListingError::Http(error),
        });

        assert_eq!(app.refresh.games().len(), 1);
        assert!(app.refresh.last_updated().is_some());
        assert_eq!(app.state.status, status_before);
    }

    #[test]
    fn grid_cursor_clamps_to_listing() {
        let mut app = app_with_games(vec![
            summary("1", "League of Legends", 5),
            summary("2", "Dota 2", 2),
            summary("3", "Valorant", 0),
        ]);
        app.state.grid_cols = 2;

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.state.cursor, 2);

        // Already on the last row; moving further stays in bounds.
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.state.cursor, 2);

        app.handle_refresh_event(RefreshEvent::Loaded {
            seq: 2,
            games: vec![summary("1", "League of Legends", 6)],
            fetched_at: Local::now(),
        });
        assert_eq!(app.state.cursor, 0);
    }
}
