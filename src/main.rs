use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use fcaption::app::CaptionApp;
use fcaption::captions::{CaptionSession, CaptionStore};
use fcaption::config::Args;
use fcaption::scanner::file_scanner::FileScanner;
use fcaption::scanner::order::ChronologicalOrderer;
use fcaption::CaptionError;

fn main() -> ExitCode {
    let args = Args::parse();

    let default_directive = if args.verbose {
        "fcaption=debug"
    } else {
        "fcaption=info"
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                default_directive
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
            ),
        )
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(CaptionError::EmptyInput { skipped }) = e.downcast_ref::<CaptionError>() {
                for s in skipped {
                    eprintln!("skipped {}: {}", s.path.display(), s.error);
                }
                eprintln!("no files to caption");
            } else {
                error!("{e:#}");
                eprintln!("fcaption: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();

    let candidates = FileScanner::with_config(config.scan.clone()).expand(&args.inputs());
    let ordered = ChronologicalOrderer::new().order(candidates)?;
    info!(
        "Captioning {} images ({} skipped)",
        ordered.assets.len(),
        ordered.skipped.len()
    );

    let (events_tx, events_rx) = flume::unbounded();
    let store = CaptionStore::with_extension(config.caption_extension.clone());
    let mut session = CaptionSession::new(ordered.assets, store, &config, events_tx);
    session.report_skipped(&ordered.skipped);
    session.start_prefetch(config.icon_size, config.result_capacity)?;

    let mut app = CaptionApp::new(session, events_rx);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    app.run(stdin.lock(), &mut stdout)
}
