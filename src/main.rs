//! pagescroll — browse a paged JSON resource in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ PageRequest ┌──────────┐  draw()  ┌──────────┐
//! │ fetch.rs │ ◄────────── │  app.rs  │ ───────► │  ui.rs   │
//! │ (thread) │ ──────────► │ (state)  │ ◄─────── │ (render) │
//! └──────────┘  FetchMsg   └──────────┘ viewport └──────────┘
//!                              ▲
//!                              │ handle_key_event()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`source/`** — the `PageSource` trait and the HTTP implementation.
//! * **`link_header`** — `Link` header parsing (pagination cursor).
//! * **`loader`** — the pagination state machine; owns the item list.
//! * **`sentinel`** — turns "last item is on screen" into one fetch.
//! * **`fetch`** — background worker that runs page requests.
//! * **`app`** — application state (loader, scroll position, status).
//! * **`ui`** — rendering; reports the viewport back to `app`.
//! * **`input`** — maps key events to `App` mutations.
//! * **`config`** — command-line / environment options.
//! * **`main`** — wires everything together.

mod app;
mod config;
mod fetch;
mod input;
mod link_header;
mod loader;
mod sentinel;
mod source;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use config::Config;
use fetch::FetchMsg;
use loader::FeedLoader;
use source::{HttpPageSource, PageSource};

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
///
/// Only a panic on the UI thread ends the session.  A panicking fetch is
/// reported back as a failed request by the worker, so the terminal is left
/// alone for those.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if on_ui_thread() {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
        original_hook(info);
    }));
}

/// The UI runs on the process's main thread; workers are named `fetch-*`.
fn on_ui_thread() -> bool {
    std::thread::current().name() == Some("main")
}

fn init_tracing(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Config::parse();
    let base = config.validate()?;
    init_tracing(&config)?;
    install_panic_hook();

    // -- configure the source ------------------------------------------------
    let source = HttpPageSource::new(base.clone(), config.display_label(&base))
        .with_timeout(config.timeout())
        .with_delay(config.delay())
        .with_strictness(config.strictness());
    let loader = FeedLoader::new(source.first_page_url(config.limit), config.limit);
    let mut app = App::new(loader, source.name());

    // -- start the fetch worker ----------------------------------------------
    let fetcher = fetch::spawn(Box::new(source)).context("starting fetch worker")?;
    tracing::info!(url = %base, page_size = config.limit, "session started");

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    app.start();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply finished fetches.
    //   2. Render (which also checks the sentinel).
    //   3. Send any requests queued by 1-2.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Some(FetchMsg::Completed { id, result }) = fetcher.try_recv() {
            app.on_fetched(id, result);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;
        app.dispatch(&fetcher);

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
                app.dispatch(&fetcher);
            }
        }

        if app.quit {
            break;
        }
    }

    tracing::info!(items = app.loader.items().len(), "session ended");
    // `guard` is dropped here, restoring the terminal.  The fetch worker
    // exits once `fetcher` is dropped.
    Ok(())
}
