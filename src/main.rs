use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime},
};

use chrono::{Datelike, Local, NaiveDate};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use dailyword::{
    app::{App, Control},
    app_dirs::AppDirs,
    catalog::{embedded_asset, Catalog, DATE_FORMAT},
    checker::{AcceptAll, DictionaryChecker, WordChecker},
    config::{Config, ConfigStore, FileConfigStore},
    history::HistoryLog,
    logging,
    resolver::calendar_month,
    runtime::{event_channel, spawn_terminal_reader, ChannelEventSource, FixedTicker, Runner},
    stats::{CompletionStore, KvCompletionStore, MemoryKvStore, SqliteKvStore},
    ui::screen::current_screen,
    util::format_thousands,
};

const POLL_INTERVAL_MS: u64 = 100;

/// daily word-guessing puzzle for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guess the word of the day in a handful of tries. Points decay with time, a hint costs points, and past days can be replayed from the archive calendar."
)]
pub struct Cli {
    /// play the puzzle for this date (YYYY-MM-DD) instead of today's
    #[clap(short = 'd', long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// catalog JSON to use instead of the bundled one
    #[clap(short = 'c', long)]
    catalog: Option<PathBuf>,

    /// word list used to validate guesses, one word per line
    #[clap(long)]
    dictionary: Option<PathBuf>,

    /// accept any guess of the right length
    #[clap(long)]
    accept_any_word: bool,

    /// clock tick interval in milliseconds
    #[clap(long)]
    tick_ms: Option<u64>,

    /// print aggregate stats and exit
    #[clap(long)]
    stats: bool,

    /// print archive availability for a month (YYYY-MM, default this month) and exit
    #[clap(long, value_name = "YYYY-MM", num_args = 0..=1, default_missing_value = "current")]
    calendar: Option<String>,

    /// print the last N finished games and exit
    #[clap(long, value_name = "N")]
    history: Option<usize>,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn parse_month(s: &str, today: NaiveDate) -> Result<(i32, u32), String> {
    if s.trim().is_empty() || s.trim() == "current" {
        return Ok((today.year(), today.month()));
    }
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), DATE_FORMAT)
        .map(|d| (d.year(), d.month()))
        .map_err(|err| format!("expected YYYY-MM: {err}"))
}

impl Cli {
    /// Command-line flags layered over the stored config.
    fn effective_config(&self, stored: Config) -> Config {
        Config {
            catalog_path: self.catalog.clone().or(stored.catalog_path),
            dictionary_path: self.dictionary.clone().or(stored.dictionary_path),
            accept_any_word: self.accept_any_word || stored.accept_any_word,
            tick_ms: self.tick_ms.unwrap_or(stored.tick_ms),
        }
    }

    fn is_interactive(&self) -> bool {
        !self.stats && self.calendar.is_none() && self.history.is_none()
    }
}

fn load_catalog(config: &Config) -> Catalog {
    if let Some(path) = &config.catalog_path {
        match Catalog::load(path) {
            Ok(catalog) => return catalog,
            Err(err) => log::warn!(
                "could not load catalog {}: {err}; using the bundled one",
                path.display()
            ),
        }
    }
    Catalog::embedded().unwrap_or_else(|err| {
        log::error!("bundled catalog unusable: {err}");
        Catalog::default()
    })
}

fn build_checker(config: &Config, catalog: &Catalog) -> Arc<dyn WordChecker> {
    if config.accept_any_word {
        return Arc::new(AcceptAll);
    }

    let loaded = config.dictionary_path.as_ref().and_then(|path| {
        DictionaryChecker::from_path(path)
            .map_err(|err| log::warn!("could not read dictionary {}: {err}", path.display()))
            .ok()
    });
    let mut checker = match loaded {
        Some(checker) => checker,
        None => match embedded_asset("dictionary.txt") {
            Ok(text) => DictionaryChecker::from_text(text),
            Err(err) => {
                log::warn!("{err}; accepting any word");
                return Arc::new(AcceptAll);
            }
        },
    };
    checker.extend(catalog.words());
    log::info!("dictionary holds {} words", checker.len());
    Arc::new(checker)
}

fn open_store() -> Box<dyn CompletionStore> {
    match AppDirs::db_path().map(SqliteKvStore::open) {
        Some(Ok(kv)) => Box::new(KvCompletionStore::new(kv)),
        Some(Err(err)) => {
            log::error!("could not open store: {err}; progress will not be saved");
            Box::new(KvCompletionStore::new(MemoryKvStore::new()))
        }
        None => {
            log::warn!("no state directory; progress will not be saved");
            Box::new(KvCompletionStore::new(MemoryKvStore::new()))
        }
    }
}

fn print_stats(store: &dyn CompletionStore) {
    let stats = store.read_stats();
    println!("played   {}", stats.games_played);
    println!("won      {}", stats.games_won);
    println!("win %    {}", stats.win_percentage());
    println!("streak   {}", stats.current_streak);
    println!("points   {}", format_thousands(stats.total_points));
}

fn print_calendar(
    catalog: &Catalog,
    store: &dyn CompletionStore,
    (year, month): (i32, u32),
    today: NaiveDate,
) {
    let Some(grid) = calendar_month(year, month, catalog.earliest_date(), today, store) else {
        return;
    };
    println!("{}", grid.title());
    for day in grid.days() {
        println!("{}  {}", day.date, day.status);
    }
}

fn print_history(n: usize) -> Result<(), Box<dyn Error>> {
    let Some(path) = AppDirs::history_path() else {
        return Ok(());
    };
    for record in HistoryLog::new(path).recent(n)? {
        println!(
            "{}  {:<8} {:<4}  {} tries  {:>5}s  {:>4} pts{}{}",
            record.puzzle_date,
            record.word,
            record.outcome,
            record.attempts,
            record.elapsed_secs,
            record.score,
            if record.hint_used { "  hint" } else { "" },
            if record.archive { "  archive" } else { "" },
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let today = Local::now().date_naive();

    if cli.is_interactive() {
        if let Some(path) = AppDirs::log_path() {
            logging::init_file_logger(&path);
        }
    } else {
        logging::init_stderr_logger();
    }

    let config_store = FileConfigStore::new();
    let config = cli.effective_config(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        log::info!("saved config to {}", config_store.path().display());
    }

    let catalog = load_catalog(&config);
    let store = open_store();

    if cli.stats {
        print_stats(store.as_ref());
    }
    if let Some(month) = &cli.calendar {
        let month = match parse_month(month, today) {
            Ok(month) => month,
            Err(msg) => Cli::command().error(ErrorKind::ValueValidation, msg).exit(),
        };
        print_calendar(&catalog, store.as_ref(), month, today);
    }
    if let Some(n) = cli.history {
        print_history(n)?;
    }
    if !cli.is_interactive() {
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let checker = build_checker(&config, &catalog);
    let (tx, events) = event_channel();
    let mut app = App::new(catalog, store, checker, tx.clone(), today)
        .with_tick_interval(Duration::from_millis(config.tick_ms.max(1)));
    if let Some(path) = AppDirs::history_path() {
        app = app.with_history(HistoryLog::new(path));
    }
    // A miss leaves the app on its placeholder screen.
    let _ = app.open_date(cli.date, SystemTime::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    spawn_terminal_reader(tx);
    let runner = Runner::new(
        events,
        FixedTicker::new(Duration::from_millis(POLL_INTERVAL_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<ChannelEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| current_screen(app.state()).render(&*app, f))?;
        if app.handle_event(runner.step()) == Control::Quit {
            break;
        }
    }
    Ok(())
}
