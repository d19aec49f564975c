// cstep: step-by-step C execution visualizer

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::Stdio;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::{Result, WrapErr};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use cstep::engine::{self, EngineProcess, SnapshotFeed};
use cstep::logging;
use cstep::snapshot::SnapshotReader;
use cstep::source::SourceListing;
use cstep::trace::{StepSession, StepView, TraceResult, DEFAULT_CONTEXT_WIDTH};
use cstep::ui::App;

/// Step through a C program, showing its call stack and pointer targets
#[derive(Debug, Parser)]
#[command(name = "cstep", version)]
struct Args {
    /// C source file to trace
    program: PathBuf,

    /// Execution engine executable
    #[arg(long, default_value = "./picoc")]
    engine: PathBuf,

    /// Source lines shown above and below the current line
    #[arg(long, default_value_t = DEFAULT_CONTEXT_WIDTH, value_parser = parse_context_width)]
    context: usize,

    /// Replay a saved trace instead of running the engine
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print the whole trace as JSON and exit
    #[arg(long, conflicts_with = "plain")]
    json: bool,

    /// Print every step to stdout without pausing
    #[arg(long)]
    plain: bool,

    /// Log file (interactive mode logs to a temp file by default)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let interactive = !args.json && !args.plain;

    let log_file = match (&args.log_file, interactive) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(logging::default_log_path()),
        (None, false) => None,
    };
    logging::init_logging(log_file.as_deref())?;
    if let (true, Some(path)) = (interactive, &log_file) {
        eprintln!("cstep logs: {}", path.display());
    }

    let source = SourceListing::load(&args.program)
        .wrap_err_with(|| format!("failed to read {}", args.program.display()))?;
    info!(program = %args.program.display(), lines = source.len(), "Loaded source");

    if args.json {
        return run_json(&args, &source);
    }

    let feed = open_feed(&args)?;
    let session = StepSession::new(source, args.context);
    if args.plain {
        run_plain(session, feed)
    } else {
        let file_name = args
            .program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.program.display().to_string());
        run_tui(session, feed, file_name)
    }
}

/// Largest accepted `--context` half-width
const MAX_CONTEXT_WIDTH: usize = 500;

fn parse_context_width(arg: &str) -> Result<usize, String> {
    let width: usize = arg
        .parse()
        .map_err(|e| format!("invalid context width '{}': {}", arg, e))?;
    if width > MAX_CONTEXT_WIDTH {
        return Err(format!(
            "context width {} exceeds the maximum of {}",
            width, MAX_CONTEXT_WIDTH
        ));
    }
    Ok(width)
}

fn open_feed(args: &Args) -> Result<Box<dyn SnapshotFeed>> {
    match &args.trace {
        Some(path) => {
            let file =
                File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(SnapshotReader::new(BufReader::new(file))))
        }
        None => {
            // The TUI owns the terminal, so the program's own output is dropped
            let stdout = if args.plain {
                Stdio::inherit()
            } else {
                Stdio::null()
            };
            Ok(Box::new(EngineProcess::spawn(
                &args.engine,
                &args.program,
                stdout,
            )?))
        }
    }
}

fn run_json(args: &Args, source: &SourceListing) -> Result<()> {
    let result = match &args.trace {
        Some(path) => {
            let file =
                File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
            TraceResult::from_reader(source.text(), BufReader::new(file), args.context)
        }
        None => engine::record_trace(&args.engine, &args.program, args.context)?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, &result)?;
    writeln!(out)?;
    Ok(())
}

fn run_plain(mut session: StepSession, mut feed: Box<dyn SnapshotFeed>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    while let Some(snapshot) = feed.next_snapshot() {
        let view = session.advance(&snapshot);
        if write_step(&mut out, &view).is_err() {
            info!("Output closed, stopping");
            break;
        }
        if let Err(e) = feed.resume() {
            info!(error = %e, "Engine stopped accepting input");
            break;
        }
    }

    if let Some(error) = feed.close()? {
        writeln!(
            out,
            "error at line {}, column {}:\n{}",
            error.line, error.offset, error.exception_msg
        )?;
    }
    info!(steps = session.steps(), "Trace finished");
    Ok(())
}

fn write_step(out: &mut impl Write, view: &StepView) -> io::Result<()> {
    for line in view.lines() {
        writeln!(out, "{}", line)?;
    }
    writeln!(out)
}

fn run_tui(session: StepSession, feed: Box<dyn SnapshotFeed>, file_name: String) -> Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, feed, file_name);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    // Quitting mid-trace leaves the engine running
    if let Some(feed) = app.into_feed() {
        feed.close()?;
    }

    Ok(())
}
