// Trellis demo - drives the sample Notes application headlessly
//
// Bootstraps the demo over file-backed storage (so notes survive between
// runs), then plays a scripted navigation sequence and prints the rendered
// document after each step. A second run with the same storage directory
// shows the persisted snapshot taking precedence over the samples.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use trellis::demo::DemoApp;
use trellis::events::HostEvent;
use trellis::router::NAV_CLASS;
use trellis::storage::{open_file_storage, MemoryStorage};
use trellis::theme::ThemeChoice;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "trellis", about = "Demo single-page Notes application")]
struct Args {
    /// Storage directory (defaults to ~/.config/trellis)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Keep state in memory only, ignoring --storage
    #[arg(long)]
    ephemeral: bool,

    /// Theme override: dark, light or system
    #[arg(long)]
    theme: Option<ThemeChoice>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut app = if args.ephemeral {
        DemoApp::bootstrap(MemoryStorage::new(), "/")?
    } else {
        let storage = open_file_storage(args.storage.as_deref())
            .context("no home directory; pass --storage or --ephemeral")?;
        DemoApp::bootstrap(storage, "/")?
    };

    if let Some(theme) = args.theme {
        app.preferences.set_theme(theme)?;
    }

    println!("-- initial mount ({})", app.router.current_path());
    println!("{}", app.render_html());

    // Activate the first in-app nav link, as a user click would
    if let Some(link) = app.document.find_by_class(NAV_CLASS) {
        let href = link.attribute("href").unwrap_or_default();
        app.handle_event(HostEvent::Activation { target: link });
        println!("-- after activating {}", href);
        println!("{}", app.render_html());
    }

    // Browser back: replay the previous history entry without pushing
    let entry = app.history.borrow_mut().back();
    app.handle_event(HostEvent::HistoryChange { entry });
    println!("-- after history back ({})", app.router.current_path());
    println!("{}", app.render_html());

    // A route that matches nothing degrades to the not-found view
    app.router.navigate("/unknown", true);
    println!("-- after navigating to /unknown");
    println!("{}", app.render_html());

    Ok(())
}
