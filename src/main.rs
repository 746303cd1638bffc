mod ui;

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
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use typewave::achievements::{self, Evaluation};
use typewave::config::{Config, ConfigStore, FileConfigStore};
use typewave::corpus::{Corpus, TextGenerator};
use typewave::history::HistoryDb;
use typewave::input::{apply_key, Key};
use typewave::runtime::{CrosstermEventSource, Runner, WaveEvent};
use typewave::session::{Phase, Session};

const TICK_RATE_MS: u64 = 100;

/// terminal typing-speed trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer with endless randomly generated prompts, live wpm and error-rate scoring, and an achievement shelf that tracks your streaks."
)]
pub struct Cli {
    /// seconds per test
    #[clap(short = 's', long)]
    seconds: Option<f64>,

    /// corpus to draw words from
    #[clap(short = 'c', long)]
    corpus: Option<String>,

    /// disable backspace during a run
    #[clap(long)]
    no_backspace: bool,

    /// print recent results and exit
    #[clap(long)]
    list_history: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut Config) {
        if let Some(seconds) = self.seconds {
            cfg.seconds = seconds;
        }
        if let Some(ref corpus) = self.corpus {
            cfg.corpus = corpus.clone();
        }
        if self.no_backspace {
            cfg.backspace = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Typing,
    Results,
}

pub struct App {
    pub session: Session,
    pub screen: Screen,
    pub evaluation: Option<Evaluation>,
    persisted: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            screen: Screen::Typing,
            evaluation: None,
            persisted: false,
        }
    }

    pub fn retry(&mut self) {
        self.session.reset();
        self.screen = Screen::Typing;
        self.evaluation = None;
        self.persisted = false;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut cfg = store.load();
    cli.apply(&mut cfg);

    if cli.list_history {
        return list_history();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let corpus = Corpus::load(&cfg.corpus)?;
    let generator = TextGenerator::new(corpus);
    let mut session = Session::new(generator, cfg.seconds, cfg.initial_words)?;
    session.allow_backspace = cfg.backspace;
    let _ = store.save(&cfg);

    let history = HistoryDb::new()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(session), &history);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    history: &HistoryDb,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| f.render_widget(&app, f.area()))?;

        match runner.step(&mut app.session) {
            WaveEvent::Tick | WaveEvent::Resize => {}
            WaveEvent::Cancel => break,
            WaveEvent::Press(press) => match app.screen {
                Screen::Results => match press.key {
                    Key::Char('r') => app.retry(),
                    Key::Char('q') => break,
                    _ => {}
                },
                Screen::Typing => {
                    apply_key(&mut app.session, press);
                }
            },
        }

        if app.session.phase == Phase::Ended && !app.persisted {
            finalize(&mut app, history);
        }
    }

    Ok(())
}

/// Record the finished test, then judge the achievement catalog against the
/// refreshed lifetime stats.
fn finalize(app: &mut App, history: &HistoryDb) {
    app.persisted = true;
    app.screen = Screen::Results;

    let Some(record) = app.session.outcome().copied() else {
        return;
    };

    if let Err(e) = history.record_result(&record) {
        log::warn!("could not persist result: {e}");
    }

    match history.snapshot(&record, u64::from(app.session.bonus_uses)) {
        Ok(stats) => {
            let unlocked = history.unlocked().unwrap_or_default();
            let eval = achievements::evaluate(&stats, &unlocked);
            for def in &eval.newly_unlocked {
                if let Err(e) = history.mark_unlocked(def.id) {
                    log::warn!("could not persist achievement {}: {e}", def.id);
                }
            }
            app.evaluation = Some(eval);
        }
        Err(e) => log::warn!("achievement evaluation skipped: {e}"),
    }
}

fn list_history() -> Result<(), Box<dyn Error>> {
    let history = HistoryDb::new()?;
    let recent = history.recent(20)?;

    if recent.is_empty() {
        println!("no tests recorded yet");
        return Ok(());
    }

    println!(
        "{} tests recorded, best {:.0} wpm",
        history.total_tests()?,
        history.best_wpm()?
    );
    for (when, record) in recent {
        println!(
            "{}  {:>4.0} wpm  {:>5.1}% err  {:>3.0}s",
            when.format("%Y-%m-%d %H:%M"),
            record.wpm,
            record.error_rate,
            record.duration_secs,
        );
    }
    Ok(())
}
