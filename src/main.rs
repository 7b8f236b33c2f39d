use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use cubetimer::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    input::{InputTranslator, ReleaseDetection, ReleaseMode},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner, TimerEvent},
    scramble::{Category, RandomScrambler},
    timer::Timer,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Instant,
};

/// hold-to-start speedcubing timer with scrambles and running averages
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A speedcubing timer for the terminal: hold space (or the left mouse button) to arm, release to start, press anything to stop. Shows the scramble to solve, the one just solved, and running averages for this session."
)]
pub struct Cli {
    /// scramble category to generate
    #[clap(short = 'c', long, value_enum)]
    category: Option<Category>,

    /// how releases of the hold key are detected
    #[clap(short = 'r', long, value_enum)]
    release_detection: Option<ReleaseMode>,

    /// quiet time after the last key repeat before an inferred release, in milliseconds
    #[clap(long)]
    release_gap_ms: Option<u64>,

    /// write debug records to the log file
    #[clap(short = 'v', long)]
    verbose: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags given on the command line win over stored settings
    fn apply(&self, mut config: Config) -> Config {
        if let Some(category) = self.category {
            config.category = category;
        }
        if let Some(mode) = self.release_detection {
            config.release_mode = mode;
        }
        if let Some(gap) = self.release_gap_ms {
            config.release_gap_ms = gap;
        }
        if self.verbose {
            config.verbose = true;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue { redraw: bool },
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub timer: Timer,
    pub input: InputTranslator,
}

impl App {
    pub fn new(config: &Config, detection: ReleaseDetection) -> Self {
        Self {
            timer: Timer::new(Box::new(RandomScrambler::from_entropy(config.category))),
            input: InputTranslator::new(detection),
        }
    }

    fn wants_quit(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return true;
        }
        // while running, q is just another key that stops the solve
        code == KeyCode::Char('q')
            && !self.timer.session().is_running()
            && self.timer.press().down_at.is_none()
    }

    pub fn on_event(&mut self, event: TimerEvent, now: Instant) -> Flow {
        match event {
            TimerEvent::Tick => {
                let mut redraw = false;
                if let Some((gesture, at)) = self.input.poll(now) {
                    self.timer.handle(gesture, at);
                    redraw = true;
                }
                redraw |= self.timer.on_frame(now);
                Flow::Continue { redraw }
            }
            TimerEvent::Resize => Flow::Continue { redraw: true },
            TimerEvent::Key(key) => {
                if key.kind == KeyEventKind::Press && self.wants_quit(key.code, key.modifiers) {
                    return Flow::Quit;
                }
                if let Some(gesture) = self.input.key(&key, now) {
                    self.timer.handle(gesture, now);
                }
                Flow::Continue { redraw: true }
            }
            TimerEvent::Mouse(mouse) => {
                if let Some(gesture) = self.input.mouse(&mouse) {
                    self.timer.handle(gesture, now);
                }
                Flow::Continue { redraw: true }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&path, logging::level_for(config.verbose)) {
            eprintln!("logging disabled: {}", e);
        }
    }

    if cli.save_config {
        store.save(&config)?;
        info!("saved settings to {}", store.path().display());
    }

    enable_raw_mode()?;

    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    let detection = ReleaseDetection::resolve(config.release_mode, config.release_gap(), enhanced);
    info!(
        "starting: category {}, release detection {:?} (enhancement supported: {})",
        config.category, detection, enhanced
    );
    if detection == ReleaseDetection::Native && !enhanced {
        warn!("native release detection forced on a terminal that may not report releases");
    }

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    if detection == ReleaseDetection::Native {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, detection);
    let result = start_tui(&mut terminal, &mut app);

    if detection == ReleaseDetection::Native {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting after {} solves", app.timer.history().len());
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| ui(app, f))?;

    loop {
        match app.on_event(runner.step(), Instant::now()) {
            Flow::Quit => break,
            Flow::Continue { redraw: true } => {
                terminal.draw(|f| ui(app, f))?;
            }
            Flow::Continue { redraw: false } => {}
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(&app.timer, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState, MouseButton, MouseEvent, MouseEventKind};
    use cubetimer::{session::Phase, timer::Indicator};
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> TimerEvent {
        TimerEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn space(kind: KeyEventKind) -> TimerEvent {
        key(KeyCode::Char(' '), kind)
    }

    fn click(kind: MouseEventKind) -> TimerEvent {
        TimerEvent::Mouse(MouseEvent {
            kind,
            column: 3,
            row: 3,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn native_app() -> App {
        App::new(&Config::default(), ReleaseDetection::Native)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["cubetimer"]);

        assert_eq!(cli.category, None);
        assert_eq!(cli.release_detection, None);
        assert_eq!(cli.release_gap_ms, None);
        assert!(!cli.verbose);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "cubetimer",
            "-c",
            "two-by-two",
            "--release-detection",
            "inferred",
            "--release-gap-ms",
            "450",
            "-v",
            "--save-config",
        ]);

        assert_eq!(cli.category, Some(Category::TwoByTwo));
        assert_eq!(cli.release_detection, Some(ReleaseMode::Inferred));
        assert_eq!(cli.release_gap_ms, Some(450));
        assert!(cli.verbose);
        assert!(cli.save_config);
    }

    #[test]
    fn test_cli_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["cubetimer", "-c", "megaminx"]).is_err());
    }

    #[test]
    fn test_cli_apply_overrides_only_given_flags() {
        let stored = Config {
            category: Category::ThreeByThree,
            release_mode: ReleaseMode::Native,
            release_gap_ms: 800,
            verbose: false,
        };

        let untouched = Cli::parse_from(["cubetimer"]).apply(stored.clone());
        assert_eq!(untouched, stored);

        let merged = Cli::parse_from(["cubetimer", "-c", "zbll", "--release-gap-ms", "300"])
            .apply(stored);
        assert_eq!(merged.category, Category::Zbll);
        assert_eq!(merged.release_mode, ReleaseMode::Native);
        assert_eq!(merged.release_gap_ms, 300);
    }

    #[test]
    fn test_app_starts_idle_with_scramble() {
        let app = native_app();
        assert_eq!(app.timer.phase(), Phase::Idle);
        assert!(!app.timer.scrambles().current().is_empty());
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let mut app = native_app();
        let ctrl_c = TimerEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.on_event(ctrl_c, Instant::now()), Flow::Quit);
    }

    #[test]
    fn test_q_quits_when_idle_but_stops_when_running() {
        let mut app = native_app();
        let t0 = Instant::now();

        app.on_event(space(KeyEventKind::Press), t0);
        app.on_event(space(KeyEventKind::Release), t0 + ms(400));
        assert_eq!(app.timer.phase(), Phase::Running);

        let flow = app.on_event(key(KeyCode::Char('q'), KeyEventKind::Press), t0 + ms(2400));
        assert_eq!(flow, Flow::Continue { redraw: true });
        assert_eq!(app.timer.phase(), Phase::Stopped);
        assert_eq!(app.timer.displayed(), ms(2000));

        let flow = app.on_event(key(KeyCode::Char('q'), KeyEventKind::Press), t0 + ms(3000));
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn test_space_hold_flow_native() {
        let mut app = native_app();
        let t0 = Instant::now();

        app.on_event(space(KeyEventKind::Press), t0);
        app.on_event(space(KeyEventKind::Repeat), t0 + ms(250));
        app.on_event(TimerEvent::Tick, t0 + ms(320));
        assert_eq!(app.timer.indicator(), Indicator::Ready);

        app.on_event(space(KeyEventKind::Release), t0 + ms(350));
        assert_eq!(app.timer.phase(), Phase::Running);

        let flow = app.on_event(TimerEvent::Tick, t0 + ms(450));
        assert_eq!(flow, Flow::Continue { redraw: true });
        assert_eq!(app.timer.displayed(), ms(100));

        app.on_event(space(KeyEventKind::Press), t0 + ms(1350));
        app.on_event(space(KeyEventKind::Release), t0 + ms(1500));
        assert_eq!(app.timer.phase(), Phase::Stopped);
        assert_eq!(app.timer.history().len(), 1);
    }

    #[test]
    fn test_escape_resets_after_stop() {
        let mut app = native_app();
        let t0 = Instant::now();

        app.on_event(space(KeyEventKind::Press), t0);
        app.on_event(space(KeyEventKind::Release), t0 + ms(300));
        app.on_event(key(KeyCode::Esc, KeyEventKind::Press), t0 + ms(900));
        assert_eq!(app.timer.phase(), Phase::Stopped);

        app.on_event(key(KeyCode::Esc, KeyEventKind::Release), t0 + ms(950));
        app.on_event(key(KeyCode::Esc, KeyEventKind::Press), t0 + ms(1000));
        assert_eq!(app.timer.phase(), Phase::Idle);
        assert_eq!(app.timer.displayed(), Duration::ZERO);
    }

    #[test]
    fn test_inferred_release_starts_on_tick() {
        let mut app = App::new(
            &Config::default(),
            ReleaseDetection::Inferred { gap: ms(100) },
        );
        let t0 = Instant::now();

        app.on_event(space(KeyEventKind::Press), t0);
        app.on_event(space(KeyEventKind::Press), t0 + ms(350));
        app.on_event(TimerEvent::Tick, t0 + ms(400));
        assert_eq!(app.timer.phase(), Phase::Idle);

        let flow = app.on_event(TimerEvent::Tick, t0 + ms(460));
        assert_eq!(flow, Flow::Continue { redraw: true });
        assert_eq!(app.timer.phase(), Phase::Running);
        assert_eq!(app.timer.session().started_at(), Some(t0 + ms(350)));
    }

    #[test]
    fn test_inferred_next_hold_waits_for_stopping_press_to_go_quiet() {
        let mut app = App::new(
            &Config::default(),
            ReleaseDetection::Inferred { gap: ms(100) },
        );
        let t0 = Instant::now();

        app.on_event(space(KeyEventKind::Press), t0);
        app.on_event(space(KeyEventKind::Press), t0 + ms(350));
        app.on_event(TimerEvent::Tick, t0 + ms(460));
        assert_eq!(app.timer.phase(), Phase::Running);

        app.on_event(space(KeyEventKind::Press), t0 + ms(1350));
        assert_eq!(app.timer.phase(), Phase::Stopped);
        assert_eq!(app.timer.displayed(), ms(1000));

        // inside the gap a press reads as a repeat of the stopping press
        app.on_event(space(KeyEventKind::Press), t0 + ms(1420));
        app.on_event(TimerEvent::Tick, t0 + ms(1440));
        assert_eq!(app.timer.indicator(), Indicator::Released);
        assert_eq!(app.timer.press().down_at, None);
        assert!(app.timer.press().awaiting_release);

        // after the gap the stopping press counts as released
        app.on_event(TimerEvent::Tick, t0 + ms(1530));
        assert!(!app.timer.press().awaiting_release);

        app.on_event(space(KeyEventKind::Press), t0 + ms(1600));
        assert_eq!(app.timer.indicator(), Indicator::Pressed);
        assert_eq!(app.timer.press().down_at, Some(t0 + ms(1600)));
    }

    #[test]
    fn test_mouse_press_is_a_touch_hold() {
        let mut app = native_app();
        let t0 = Instant::now();

        app.on_event(click(MouseEventKind::Down(MouseButton::Left)), t0);
        app.on_event(click(MouseEventKind::Up(MouseButton::Left)), t0 + ms(500));
        assert_eq!(app.timer.phase(), Phase::Running);

        app.on_event(click(MouseEventKind::Down(MouseButton::Left)), t0 + ms(700));
        assert_eq!(app.timer.phase(), Phase::Stopped);
    }

    #[test]
    fn test_idle_tick_does_not_redraw() {
        let mut app = native_app();
        assert_eq!(
            app.on_event(TimerEvent::Tick, Instant::now()),
            Flow::Continue { redraw: false }
        );
    }

    #[test]
    fn test_ui_function_renders_timer() {
        use ratatui::backend::TestBackend;

        let app = native_app();
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("0.00"));
        assert!(content.contains("Average NaN"));
    }
}
