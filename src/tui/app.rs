//! Application state and event loop

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::Widget,
    DefaultTerminal, Frame,
};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::services::aggregator::{DashboardSummary, Granularity};
use crate::services::{AppContext, Aggregator, Insight, InsightService};
use crate::types::{DailyLog, UserSettings};

use super::theme::Theme;
use super::widgets::{
    dashboard::{DashboardData, DashboardView, InsightPanel},
    help::HelpPopup,
    reference::ReferenceView,
    spinner::{LoadingStage, Spinner},
    statistics::{StatisticsData, StatisticsView},
    tabs::Tab,
};

/// Event poll timeout; also the spinner frame interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Application state
pub enum AppState {
    Loading {
        spinner_frame: usize,
        stage: LoadingStage,
    },
    Ready { data: Box<AppData> },
    Error { message: String },
}

/// Everything the views need, derived from one log snapshot
pub struct AppData {
    pub logs: Vec<DailyLog>,
    pub summary: DashboardSummary,
    pub statistics: StatisticsData,
}

impl AppData {
    pub fn from_logs(logs: Vec<DailyLog>, today: NaiveDate) -> Self {
        let summary = Aggregator::dashboard(&logs, today);
        let statistics = StatisticsData::from_logs(&logs);
        Self {
            logs,
            summary,
            statistics,
        }
    }
}

/// Main application
pub struct App {
    state: AppState,
    should_quit: bool,
    current_tab: Tab,
    granularity: Granularity,
    scroll: usize,
    show_help: bool,
    theme: Theme,
    name: String,
    backend: String,
    warning: Option<String>,
    insight: InsightPanel,
    insight_requested: bool,
}

impl App {
    pub fn new(settings: &UserSettings, backend: String, stage: LoadingStage) -> Self {
        Self {
            state: AppState::Loading {
                spinner_frame: 0,
                stage,
            },
            should_quit: false,
            current_tab: Tab::default(),
            granularity: Granularity::default(),
            scroll: 0,
            show_help: false,
            theme: Theme::from(settings.theme),
            name: settings.name.clone(),
            backend,
            warning: None,
            insight: InsightPanel::default(),
            insight_requested: false,
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.current_tab = self.current_tab.next();
            }
            KeyCode::BackTab => {
                self.current_tab = self.current_tab.prev();
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::Char(c @ '1'..='3') => {
                if let Some(tab) = Tab::from_number(c as u8 - b'0') {
                    self.current_tab = tab;
                }
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
            }
            KeyCode::Char('i') => self.request_insight(),
            KeyCode::Char(c) if self.current_tab == Tab::Statistics => {
                let granularity = match c {
                    'd' => Granularity::Daily,
                    'w' => Granularity::Weekly,
                    'm' => Granularity::Monthly,
                    'y' => Granularity::Yearly,
                    _ => return,
                };
                if granularity != self.granularity {
                    self.granularity = granularity;
                    self.scroll = 0;
                }
            }
            _ => {}
        }
    }

    fn request_insight(&mut self) {
        if matches!(self.state, AppState::Ready { .. }) && self.insight != InsightPanel::Pending {
            self.current_tab = Tab::Dashboard;
            self.insight = InsightPanel::Pending;
            self.insight_requested = true;
        }
    }

    /// Returns true once per `i` press
    pub fn take_insight_request(&mut self) -> bool {
        std::mem::take(&mut self.insight_requested)
    }

    pub fn apply_insight(&mut self, insight: Insight) {
        self.insight = InsightPanel::Ready(insight);
    }

    /// Swap in a fresh log snapshot, keeping the scroll position in range
    pub fn apply_logs(&mut self, logs: Vec<DailyLog>, today: NaiveDate) {
        let data = AppData::from_logs(logs, today);
        self.scroll = self
            .scroll
            .min(data.statistics.max_scroll_offset(self.granularity));
        self.state = AppState::Ready {
            data: Box::new(data),
        };
    }

    pub fn apply_error(&mut self, message: String) {
        self.state = AppState::Error { message };
    }

    fn scroll_up(&mut self) {
        if self.current_tab == Tab::Statistics {
            self.scroll = self.scroll.saturating_sub(1);
        }
    }

    fn scroll_down(&mut self) {
        if self.current_tab != Tab::Statistics {
            return;
        }
        if let AppState::Ready { data } = &self.state {
            let max = data.statistics.max_scroll_offset(self.granularity);
            self.scroll = (self.scroll + 1).min(max);
        }
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading {
            spinner_frame,
            stage,
        } = &self.state
        {
            self.state = AppState::Loading {
                spinner_frame: Spinner::next_frame(*spinner_frame),
                stage: *stage,
            };
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Logs of the current snapshot, if loaded
    pub fn logs(&self) -> Option<&[DailyLog]> {
        match &self.state {
            AppState::Ready { data } => Some(&data.logs),
            _ => None,
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Loading {
                spinner_frame,
                stage,
            } => {
                Spinner::new(*spinner_frame, *stage, self.theme).render(area, buf);
            }
            AppState::Ready { data } => {
                match self.current_tab {
                    Tab::Dashboard => {
                        let view = DashboardView::new(
                            DashboardData {
                                name: &self.name,
                                backend: &self.backend,
                                summary: &data.summary,
                                insight: &self.insight,
                                warning: self.warning.as_deref(),
                            },
                            self.theme,
                        );
                        view.render(area, buf);
                    }
                    Tab::Statistics => {
                        StatisticsView::new(
                            &data.statistics,
                            self.granularity,
                            self.scroll,
                            self.theme,
                        )
                        .render(area, buf);
                    }
                    Tab::Reference => ReferenceView::new(self.theme).render(area, buf),
                }

                if self.show_help {
                    let popup_area = HelpPopup::centered_area(area);
                    HelpPopup::new(self.theme).render(popup_area, buf);
                }
            }
            AppState::Error { message } => {
                let y = area.y + area.height / 2;
                let text = format!("Error: {}", message);
                let x = area.x + (area.width.saturating_sub(text.chars().count() as u16)) / 2;
                buf.set_string(x, y, &text, Style::default().fg(self.theme.warning()));
            }
        }
    }
}

/// Run the TUI until the user quits
pub async fn run(ctx: &mut AppContext, config: &Config) -> anyhow::Result<()> {
    let stage = if ctx.store().is_cloud() {
        LoadingStage::Connecting
    } else {
        LoadingStage::Loading
    };
    let backend = match ctx.session().and_then(|s| s.email.as_deref()) {
        Some(email) => format!("{} · {}", ctx.store().label(), email),
        None => ctx.store().label().to_string(),
    };
    let mut app = App::new(ctx.settings(), backend, stage)
        .with_warning(ctx.warning().map(str::to_string));
    let insight = Arc::new(InsightService::from_config(config));

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &mut app, ctx, insight).await;
    ratatui::restore();
    result
}

/// Initial read; a denied cloud read lands as a banner over no logs
async fn load_logs(app: &mut App, ctx: &mut AppContext, today: NaiveDate) {
    match ctx.logs().await {
        Ok(logs) => app.apply_logs(logs, today),
        Err(e) => {
            tracing::warn!(error = %e, "initial log load failed");
            app.apply_error(e.to_string());
        }
    }
    if let Some(warning) = ctx.warning() {
        app.warning = Some(warning.to_string());
    }
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    ctx: &mut AppContext,
    insight: Arc<InsightService>,
) -> anyhow::Result<()> {
    // Spinner stays up for the initial read
    terminal.draw(|frame| app.draw(frame))?;
    load_logs(app, ctx, Local::now().date_naive()).await;

    let (logs_tx, mut logs_rx) = mpsc::unbounded_channel();
    ctx.subscribe_logs(move |logs| {
        let _ = logs_tx.send(logs);
    })?;
    let (insight_tx, mut insight_rx) = mpsc::unbounded_channel();

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Only the newest snapshot matters
        let mut latest = None;
        while let Ok(logs) = logs_rx.try_recv() {
            latest = Some(logs);
        }
        if let Some(logs) = latest {
            app.apply_logs(logs, Local::now().date_naive());
        }

        if let Ok(result) = insight_rx.try_recv() {
            app.apply_insight(result);
        }

        if app.take_insight_request() {
            if let Some(logs) = app.logs().map(<[DailyLog]>::to_vec) {
                let service = Arc::clone(&insight);
                let tx = insight_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(service.generate(&logs).await);
                });
            }
        }

        let ready = tokio::task::block_in_place(|| event::poll(POLL_INTERVAL))?;
        if ready {
            let ev = tokio::task::block_in_place(event::read)?;
            app.handle_event(ev);
        } else {
            app.tick();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::insight::InsightSource;
    use crate::types::{TakenMedication, ThemeName};
    use crossterm::event::{KeyEvent, KeyModifiers};
    use crate::store::{MemoryDocuments, RemoteStore, Scope, StoreBackend};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn make_logs(days: u32) -> Vec<DailyLog> {
        (1..=days)
            .map(|d| {
                let mut log = DailyLog::new(NaiveDate::from_ymd_opt(2025, 1, d).unwrap());
                log.medications = vec![TakenMedication::new("diazepam", 5.0)];
                log
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    fn make_app() -> App {
        App::new(&UserSettings::default(), "local".to_string(), LoadingStage::Loading)
    }

    fn make_ready_app() -> App {
        let mut app = make_app();
        app.apply_logs(make_logs(20), today());
        app
    }

    fn render_to_string(app: &App) -> String {
        let area = Rect::new(0, 0, 120, 40);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    // ========== state tests ==========

    #[test]
    fn test_app_initial_state() {
        let app = make_app();
        assert!(matches!(
            app.state,
            AppState::Loading {
                spinner_frame: 0,
                stage: LoadingStage::Loading
            }
        ));
        assert!(!app.should_quit());
        assert!(app.logs().is_none());
    }

    #[test]
    fn test_app_theme_from_settings() {
        let settings = UserSettings {
            theme: ThemeName::Synthwave,
            ..UserSettings::default()
        };
        let app = App::new(&settings, "cloud".to_string(), LoadingStage::Connecting);
        assert_eq!(app.theme, Theme::Synthwave);
    }

    #[test]
    fn test_app_tick_updates_spinner() {
        let mut app = make_app();
        app.tick();
        assert!(matches!(
            app.state,
            AppState::Loading {
                spinner_frame: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_apply_logs_becomes_ready() {
        let app = make_ready_app();
        assert_eq!(app.logs().map(|l| l.len()), Some(20));
        if let AppState::Ready { data } = &app.state {
            assert_eq!(data.summary.alcohol_free_streak, 20);
        } else {
            panic!("expected ready state");
        }
    }

    #[test]
    fn test_apply_error() {
        let mut app = make_app();
        app.apply_error("boom".to_string());
        assert!(render_to_string(&app).contains("Error: boom"));
    }

    #[tokio::test]
    async fn test_denied_cloud_load_shows_banner_over_empty_dashboard() {
        let docs = MemoryDocuments::new();
        docs.deny_access(true);
        let mut ctx = AppContext::with_store(
            Scope::User("u1".into()),
            StoreBackend::Memory(RemoteStore::new(docs)),
        );
        let mut app = make_app();

        load_logs(&mut app, &mut ctx, today()).await;

        assert_eq!(app.logs().map(|l| l.len()), Some(0));
        let content = render_to_string(&app);
        assert!(content.contains("Cloud access was denied"));
        assert!(!content.contains("Error:"));
    }

    // ========== handle_event tests ==========

    #[test]
    fn test_app_quit_on_q_and_esc() {
        let mut app = make_app();
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.should_quit());

        let mut app = make_app();
        app.handle_event(key(KeyCode::Esc));
        assert!(app.should_quit());
    }

    #[test]
    fn test_app_tab_navigation() {
        let mut app = make_app();
        assert_eq!(app.current_tab, Tab::Dashboard);
        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.current_tab, Tab::Statistics);
        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.current_tab, Tab::Reference);
        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.current_tab, Tab::Dashboard);

        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::BackTab,
            KeyModifiers::SHIFT,
        )));
        assert_eq!(app.current_tab, Tab::Reference);
    }

    #[test]
    fn test_app_number_key_navigation() {
        let mut app = make_app();
        app.handle_event(key(KeyCode::Char('3')));
        assert_eq!(app.current_tab, Tab::Reference);
        app.handle_event(key(KeyCode::Char('2')));
        assert_eq!(app.current_tab, Tab::Statistics);
        app.handle_event(key(KeyCode::Char('4')));
        assert_eq!(app.current_tab, Tab::Statistics);
    }

    #[test]
    fn test_app_help_toggle() {
        let mut app = make_app();
        app.handle_event(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_event(key(KeyCode::Char('?')));
        assert!(!app.show_help);
    }

    #[test]
    fn test_granularity_keys_on_statistics_tab() {
        let mut app = make_ready_app();
        app.current_tab = Tab::Statistics;
        app.handle_event(key(KeyCode::Char('w')));
        assert_eq!(app.granularity, Granularity::Weekly);
        app.handle_event(key(KeyCode::Char('y')));
        assert_eq!(app.granularity, Granularity::Yearly);
        app.handle_event(key(KeyCode::Char('d')));
        assert_eq!(app.granularity, Granularity::Daily);
    }

    #[test]
    fn test_granularity_keys_ignored_on_other_tabs() {
        let mut app = make_ready_app();
        app.handle_event(key(KeyCode::Char('m')));
        assert_eq!(app.granularity, Granularity::Daily);
    }

    #[test]
    fn test_scroll_clamped() {
        let mut app = make_ready_app();
        app.current_tab = Tab::Statistics;
        app.handle_event(key(KeyCode::Up));
        assert_eq!(app.scroll, 0);

        for _ in 0..50 {
            app.handle_event(key(KeyCode::Down));
        }
        if let AppState::Ready { data } = &app.state {
            assert_eq!(app.scroll, data.statistics.max_scroll_offset(Granularity::Daily));
        }

        // Switching granularity resets to the newest bucket
        app.handle_event(key(KeyCode::Char('m')));
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn test_scroll_ignored_on_dashboard() {
        let mut app = make_ready_app();
        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn test_apply_logs_clamps_scroll() {
        let mut app = make_ready_app();
        app.current_tab = Tab::Statistics;
        for _ in 0..50 {
            app.handle_event(key(KeyCode::Down));
        }
        assert!(app.scroll > 0);
        app.apply_logs(make_logs(3), today());
        assert_eq!(app.scroll, 0);
    }

    // ========== insight tests ==========

    #[test]
    fn test_insight_request_once() {
        let mut app = make_ready_app();
        app.current_tab = Tab::Reference;
        app.handle_event(key(KeyCode::Char('i')));
        assert_eq!(app.insight, InsightPanel::Pending);
        assert_eq!(app.current_tab, Tab::Dashboard);
        assert!(app.take_insight_request());
        assert!(!app.take_insight_request());

        // Already pending
        app.handle_event(key(KeyCode::Char('i')));
        assert!(!app.take_insight_request());
    }

    #[test]
    fn test_insight_ignored_while_loading() {
        let mut app = make_app();
        app.handle_event(key(KeyCode::Char('i')));
        assert_eq!(app.insight, InsightPanel::Idle);
        assert!(!app.take_insight_request());
    }

    #[test]
    fn test_apply_insight_renders_text() {
        let mut app = make_ready_app();
        app.apply_insight(Insight {
            text: "Steady week.".to_string(),
            source: InsightSource::Generated,
        });
        assert!(render_to_string(&app).contains("Steady week."));
    }

    // ========== render tests ==========

    #[test]
    fn test_render_each_tab() {
        let mut app = make_ready_app().with_warning(Some("offline".to_string()));
        assert!(render_to_string(&app).contains("! offline"));

        app.current_tab = Tab::Statistics;
        assert!(render_to_string(&app).contains("[Statistics]"));

        app.current_tab = Tab::Reference;
        assert!(render_to_string(&app).contains("Half-life"));

        app.show_help = true;
        assert!(render_to_string(&app).contains("Press ? to close"));
    }
}
