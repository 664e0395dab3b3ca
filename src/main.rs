use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use lockbox::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    lock::ShortSubmitPolicy,
    logging,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, GameEvent, Runner, Ticker},
    store::{self, SqliteFlagStore},
};

const TICK_RATE_MS: u64 = 100;

#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An escape-room lock for the terminal: crack the code on the keypad, use the zoomable hint picture, and beat your previous time."
)]
pub struct Cli {
    /// code that opens the lock (digits only)
    #[clap(short = 'c', long)]
    code: Option<String>,

    /// what submitting fewer digits than the code length does
    #[clap(long, value_enum)]
    short_submit: Option<ShortSubmitPolicy>,

    /// largest zoom factor of the hint picture
    #[clap(long)]
    max_zoom: Option<f64>,

    /// endpoint that receives a JSON event when the lock opens
    #[clap(long)]
    notify_url: Option<String>,

    /// text file to show as the hint picture instead of the bundled one
    #[clap(long)]
    hint: Option<PathBuf>,

    /// config file to read instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// print the previous escape and exit
    #[clap(long)]
    status: bool,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Command-line values win over the config file.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(code) = &self.code {
            config.code = code.clone();
        }
        if let Some(policy) = self.short_submit {
            config.short_submit = policy;
        }
        if let Some(max_zoom) = self.max_zoom {
            config.max_scale = max_zoom;
        }
        if let Some(url) = &self.notify_url {
            config.notify_url = Some(url.clone());
        }
        if let Some(hint) = &self.hint {
            config.hint_path = Some(hint.clone());
        }
        config
    }

    fn resolve_config(&self) -> Config {
        self.apply(self.config_store().load())
    }
}

fn print_status() -> Result<(), Box<dyn Error>> {
    let flags = SqliteFlagStore::open_default()?;
    match store::load_completion(&flags)? {
        Some(record) => println!("{}", record),
        None => println!("no escape recorded yet"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.status {
        return print_status();
    }

    let config = cli.resolve_config();
    if let Err(err) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(err) = logging::init(&path) {
            eprintln!("lockbox: logging disabled: {}", err);
        }
    }
    tracing::info!(code_len = config.code.len(), short_submit = %config.short_submit, "starting");

    let mut app = App::from_config(config, Instant::now());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &outcome {
        tracing::error!(%err, "terminal loop failed");
    }
    tracing::info!("bye");
    outcome
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    app.set_viewport(size.width, size.height);

    let tick_rate = Duration::from_millis(TICK_RATE_MS);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        let now = Instant::now();
        let ticked = matches!(event, GameEvent::Tick);

        if app.handle_event(event, now) == Control::Quit {
            break;
        }

        // a steady stream of mouse events must not starve the animations
        if !ticked && now.duration_since(last_tick) >= tick_rate {
            app.on_tick(now);
        }
        if ticked || now.duration_since(last_tick) >= tick_rate {
            last_tick = now;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use lockbox::{notify::NullNotifier, runtime::TestEventSource, store::MemoryFlagStore};
    use ratatui::backend::TestBackend;
    use std::io::Write;
    use std::sync::mpsc;

    fn key(code: KeyCode) -> GameEvent {
        GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn headless_app() -> App {
        App::new(
            Config::default(),
            Box::new(MemoryFlagStore::default()),
            Box::new(NullNotifier),
            Instant::now(),
        )
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["lockbox"]);

        assert_eq!(cli.code, None);
        assert_eq!(cli.short_submit, None);
        assert_eq!(cli.max_zoom, None);
        assert_eq!(cli.notify_url, None);
        assert_eq!(cli.hint, None);
        assert!(!cli.status);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "lockbox",
            "--code",
            "1234",
            "--short-submit",
            "fail",
            "--max-zoom",
            "5",
            "--notify-url",
            "http://localhost:9/done",
            "--hint",
            "map.txt",
        ]);

        let config = cli.apply(Config::default());

        assert_eq!(config.code, "1234");
        assert_eq!(config.short_submit, ShortSubmitPolicy::Fail);
        assert_eq!(config.max_scale, 5.0);
        assert_eq!(config.notify_url.as_deref(), Some("http://localhost:9/done"));
        assert_eq!(config.hint_path, Some(PathBuf::from("map.txt")));
        assert_eq!(config.min_scale, Config::default().min_scale);
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["lockbox", "--short-submit", "maybe"]).is_err());
    }

    #[test]
    fn test_config_file_is_read_then_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"code": "999", "failure_modal": false}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["lockbox", "--config", &path, "--max-zoom", "4"]);
        let config = cli.resolve_config();

        assert_eq!(config.code, "999");
        assert!(!config.failure_modal);
        assert_eq!(config.max_scale, 4.0);
    }

    #[test]
    fn test_invalid_cli_values_fail_validation() {
        let cli = Cli::parse_from(["lockbox", "--code", "12a4"]);
        assert!(cli.apply(Config::default()).validate().is_err());

        let cli = Cli::parse_from(["lockbox", "--max-zoom", "0.5"]);
        assert!(cli.apply(Config::default()).validate().is_err());
    }

    #[test]
    fn test_status_flag() {
        let cli = Cli::parse_from(["lockbox", "--status"]);
        assert!(cli.status);
    }

    #[test]
    fn test_start_tui_runs_until_quit() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = headless_app();

        for c in "4152314".chars() {
            tx.send(key(KeyCode::Char(c))).unwrap();
        }
        tx.send(key(KeyCode::Enter)).unwrap();
        tx.send(key(KeyCode::Esc)).unwrap();

        start_tui(&mut terminal, &mut app, &runner).unwrap();

        assert!(app.lock.is_locked());
        assert!(app.chest_open);
        assert_eq!(app.viewport().width, 80);

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("unlocked"));
    }

    #[test]
    fn test_start_tui_ctrl_c_quits_from_hint() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = headless_app();

        tx.send(key(KeyCode::Char('h'))).unwrap();
        tx.send(GameEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )))
        .unwrap();

        start_tui(&mut terminal, &mut app, &runner).unwrap();

        assert!(app.modals.hint);
    }
}
