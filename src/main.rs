use anyhow::Context;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::File;
use std::io::{BufWriter, Stdout, Write, stdout};
use std::time::{Duration, Instant};

use hanabi::app::App;
use hanabi::config::{self, Command, Config};
use hanabi::sound::{Silent, SoundCue, TerminalBell};

fn print_usage() {
    eprintln!("hanabi - Fireworks festival in your terminal");
    eprintln!();
    eprintln!("Usage: hanabi [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE       Load settings from a JSON file");
    eprintln!("  --mode MODE         festival (default), random or manual");
    eprintln!("  --pattern PATTERN   circle, chrysanthemum, willow, crossette, ring or random");
    eprintln!("  --color COLOR       random (default), red, blue, green or gold");
    eprintln!("  --fade AMOUNT       Afterimage veil opacity per frame, 0-1 (default 0.05)");
    eprintln!("  --world-height N    Logical sky height in pixels (default 800)");
    eprintln!("  --seed N            Seed the random generator");
    eprintln!("  --sound             Ring the terminal bell on every burst");
    eprintln!("  --bg-color RRGGBB   Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --log-file PATH     Write logs to PATH (filter with RUST_LOG)");
    eprintln!();
    eprintln!("Controls:");
    eprintln!("  space/enter  launch    click  launch at point");
    eprintln!("  1-6          pattern   c      cycle color    m  cycle mode");
    eprintln!();
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn is_exit(event: &Event) -> bool {
    let Event::Key(key_event) = event else {
        return false;
    };
    key_event.code == KeyCode::Char('q')
        || key_event.code == KeyCode::Esc
        || (key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
}

fn run_loop(app: &mut App, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()> {
    const FIXED_DT: f32 = 1.0 / 60.0;

    let start = Instant::now();
    let mut last_frame = start;
    let mut accumulator = 0.0f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            if is_exit(&event) {
                break;
            }
            if let Event::Resize(..) = event {
                execute!(stdout, Clear(ClearType::All))?;
            }
            app.handle_event(&event);
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        let mut stepped = false;
        while accumulator >= FIXED_DT {
            app.update(start.elapsed().as_millis() as u64);
            accumulator -= FIXED_DT;
            stepped = true;
        }

        // Each drawn frame lays down one fade veil, so draw only after a step
        if stepped {
            app.render(stdout)?;
        }
    }

    Ok(())
}

/// Enters the alternate screen, runs `body`, then restores the screen even
/// when entering or the body failed.
fn screen_session<W, F>(out: &mut W, body: F) -> std::io::Result<()>
where
    W: Write,
    F: FnOnce(&mut W) -> std::io::Result<()>,
{
    let entered = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture);
    let result = entered.and_then(|()| body(out));
    let left = execute!(out, Show, LeaveAlternateScreen, DisableMouseCapture);
    let restored = left.and_then(|()| out.flush());
    result.and(restored)
}

fn run(config: &Config) -> anyhow::Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode().context("failed to enable raw mode")?;

    let result = screen_session(&mut stdout, |out| {
        let (cols, rows) = terminal::size()?;
        let sound: Box<dyn SoundCue> = if config.sound {
            Box::new(TerminalBell::new(std::io::stdout()))
        } else {
            Box::new(Silent)
        };
        let mut app = App::new(cols as usize, rows as usize, config, sound);
        log::info!("starting in {} mode on a {}x{} terminal", config.mode, cols, rows);
        run_loop(&mut app, out)
    });

    terminal::disable_raw_mode()?;

    result.context("terminal display failed")
}

fn main() -> anyhow::Result<()> {
    let config = match config::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    init_logging(&config)?;
    run(&config)
}
