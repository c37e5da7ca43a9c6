mod console;
mod script;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use console::ConsoleHost;
use pl_core::ControlKey;
use pl_dataset::{DatasetError, Equipment, load_dataset};
use pl_engine::tutorial::{LAST_STEP, VALVE_STEP};
use pl_engine::{Action, EngineError, Outcome, RecordingHost, Session};
use pl_report::{ExportFormat, PdfRenderer, ReportError};
use pl_settings::{SettingsError, SettingsFile, SettingsStore, SkipReason};
use script::{Command, ScriptError, parse_script};
use tracing::{debug, info};

type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Script error at {0}")]
    Script(#[from] ScriptError),

    #[error("Invalid assignment '{0}', expected key=value")]
    Assignment(String),

    #[error("Setting '{key}' rejected: {reason:?}")]
    Setting { key: String, reason: SkipReason },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "pumplab")]
#[command(about = "PumpLab - virtual hydraulic pump bench", long_about = None)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Dataset directory
    #[arg(long, global = true, default_value = "data/system1")]
    data: PathBuf,

    /// Number of overview photographs
    #[arg(long, global = true, default_value_t = 4)]
    images: usize,

    /// Settings file (defaults to ~/pumplab.ini)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the dataset
    Validate,
    /// Apply assignments and show the state the last one resolves to
    Lookup {
        /// Assignments such as `rpm=890 (50)` or `abertura=25`
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Run a command script against a fresh session
    Replay {
        /// Path to the script
        script: PathBuf,
        /// Write the change report here when done
        #[arg(short, long)]
        export: Option<PathBuf>,
        /// Report format: csv or pdf
        #[arg(long, default_value = "csv")]
        format: String,
        /// Extra directory searched for PDF fonts
        #[arg(long)]
        font_dir: Option<PathBuf>,
        /// Print every display command
        #[arg(long)]
        echo: bool,
    },
    /// Walk the guided tour from start to finish
    Tutorial,
    /// Inspect or change the stored preferences
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// Print the theoretical pump curve
    Curve,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the settings file
    Show,
    /// Change one option, e.g. `volume 60`
    Set { key: String, value: String },
    /// Restore the defaults
    Reset,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings_path = cli.settings.clone().unwrap_or_else(SettingsFile::default_path);

    match cli.command {
        Commands::Validate => cmd_validate(&cli.data),
        Commands::Lookup { assignments } => cmd_lookup(&cli.data, cli.images, &assignments),
        Commands::Replay {
            script,
            export,
            format,
            font_dir,
            echo,
        } => cmd_replay(
            &cli.data,
            cli.images,
            &settings_path,
            &script,
            export.as_deref(),
            &format,
            font_dir,
            echo,
        ),
        Commands::Tutorial => cmd_tutorial(&cli.data, cli.images, &settings_path),
        Commands::Settings(cmd) => match cmd {
            SettingsCommands::Show => cmd_settings_show(&settings_path),
            SettingsCommands::Set { key, value } => cmd_settings_set(&settings_path, &key, &value),
            SettingsCommands::Reset => cmd_settings_reset(&settings_path),
        },
        Commands::Curve => cmd_curve(&cli.data),
    }
}

fn cmd_validate(data: &Path) -> CliResult<()> {
    println!("Validating dataset: {}", data.display());
    let dataset = load_dataset(data)?;
    println!("✓ Dataset is valid");
    println!("  Controls: {}", dataset.controls.controls.len());
    println!("  States: {}", dataset.states.len());
    println!("  Tutorial steps: {}", dataset.tutorial.len());
    println!("  Equipment images: {}", dataset.equipment.len());
    Ok(())
}

fn parse_assignment(text: &str) -> CliResult<(String, String)> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| CliError::Assignment(text.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(CliError::Assignment(text.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}

fn cmd_lookup(data: &Path, images: usize, assignments: &[String]) -> CliResult<()> {
    let parsed = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<CliResult<Vec<_>>>()?;
    let Some(((last_key, last_value), earlier)) = parsed.split_last() else {
        return Ok(());
    };

    let mut session = Session::without_tour(load_dataset(data)?, RecordingHost::new(), images)?;
    for (key, value) in earlier {
        let outcome = session.set_value(key, value)?;
        debug!(key, value, ?outcome, "assignment applied");
    }

    let resolution = session.preview(&ControlKey::from(last_key.as_str()), last_value);
    match resolution.index() {
        Some(index) => println!("Row {index}"),
        None => println!("No matching row; derived values stay unchanged"),
    }
    if resolution.hook_off {
        println!("  motor is off");
    }
    if !resolution.misses.is_empty() {
        let misses: Vec<&str> = resolution.misses.iter().map(|k| k.as_str()).collect();
        println!("  missed: {}", misses.join(", "));
    }
    if let Some(record) = resolution.record() {
        for key in record.keys() {
            println!("  {:<12} {}", key, record.display(key.as_str()).unwrap_or_default());
        }
    }
    Ok(())
}

/// Session over the settings file. With `first_run` the tour starts by
/// itself while the file does not mark it completed.
fn open_session(
    data: &Path,
    images: usize,
    settings_path: &Path,
    echo: bool,
    first_run: bool,
) -> CliResult<Session<ConsoleHost<SettingsFile>>> {
    let dataset = load_dataset(data)?;
    let store = SettingsFile::open(settings_path)?;
    let host = ConsoleHost::new(store, echo);
    let session = if first_run {
        Session::new(dataset, host, images)?
    } else {
        Session::without_tour(dataset, host, images)?
    };
    Ok(session)
}

#[allow(clippy::too_many_arguments)]
fn cmd_replay(
    data: &Path,
    images: usize,
    settings_path: &Path,
    script_path: &Path,
    export: Option<&Path>,
    format: &str,
    font_dir: Option<PathBuf>,
    echo: bool,
) -> CliResult<()> {
    let format: ExportFormat = format.parse()?;
    let lines = parse_script(&std::fs::read_to_string(script_path)?)?;
    info!(script = %script_path.display(), commands = lines.len(), "replaying");

    // scripts start the tour explicitly with `tutorial start`
    let mut session = open_session(data, images, settings_path, echo, false)?;
    for line in &lines {
        let outcome = run_command(&mut session, &line.command)?;
        println!("{:>4}: {:?} -> {:?}", line.line, line.command, outcome);
    }

    println!("Final state:");
    for (key, value) in session.snapshot().iter() {
        println!("  {key:<12} {value}");
    }
    println!("Report entries: {}", session.log().len());

    if let Some(path) = export {
        let mut pdf = PdfRenderer::default();
        if let Some(dir) = font_dir {
            pdf = pdf.with_font_dir(dir);
        }
        let written = session.save_report(path, format, &pdf)?;
        println!("✓ Report written to {}", written.display());
    }
    Ok(())
}

fn run_command<H: pl_engine::Host>(
    session: &mut Session<H>,
    command: &Command,
) -> CliResult<Outcome> {
    let outcome = match command {
        Command::Set { key, value } => session.set_value(key, value)?,
        Command::Motor(true) => session.motor_on()?,
        Command::Motor(false) => session.motor_off()?,
        Command::Panel(equipment) => session.press_panel_button(*equipment)?,
        Command::Close(key) => {
            session.close_panel(key);
            Outcome::Applied
        }
        Command::Zoom(equipment) => session.zoom(*equipment)?,
        Command::Next => session.next_image()?,
        Command::Prev => session.previous_image()?,
        Command::TutorialStart => {
            session.init_tutorial()?;
            Outcome::Applied
        }
        Command::TutorialEnd => {
            session.end_tutorial()?;
            Outcome::Applied
        }
        Command::Clear => {
            session.clear_report();
            Outcome::Applied
        }
    };
    Ok(outcome)
}

/// Pick the action that moves the tour on from its current step.
fn tour_command<H: pl_engine::Host>(session: &Session<H>) -> Option<Command> {
    let step = session.tutorial().step()?;
    let allowed = session.tutorial().policy(step).allowed;

    if step == VALVE_STEP {
        let valve = session.registry().by_equipment(Equipment::BallValve)?;
        let open = valve
            .spec()
            .allowed_values
            .iter()
            .find(|v| v.numeric().is_some_and(|n| n > 0.0))
            .map(|v| v.display())
            .unwrap_or_else(|| "100".to_string());
        return Some(Command::Set {
            key: valve.key().to_string(),
            value: open,
        });
    }
    if step == LAST_STEP || allowed.contains(&Action::NextImage) {
        return Some(Command::Next);
    }
    allowed.iter().find_map(|action| match action {
        Action::MotorOn => Some(Command::Motor(true)),
        Action::Panel(equipment) => Some(Command::Panel(*equipment)),
        Action::Zoom(equipment) => Some(Command::Zoom(*equipment)),
        _ => None,
    })
}

fn cmd_tutorial(data: &Path, images: usize, settings_path: &Path) -> CliResult<()> {
    let mut session = open_session(data, images, settings_path, false, true)?;
    if !session.tutorial().is_active() {
        session.init_tutorial()?;
    }

    while let Some(step) = session.tutorial().step() {
        let policy = session.tutorial().policy(step);
        let ids: Vec<usize> = policy.allowed.iter().map(|a| a.id()).collect();
        println!(
            "Step {:>2}: image {:?}, overlay at {:?}, allowed {:?}",
            step, policy.image, policy.coordinates, ids
        );

        let Some(command) = tour_command(&session) else {
            println!("No action moves step {step} on; ending the tour");
            session.end_tutorial()?;
            break;
        };
        let outcome = run_command(&mut session, &command)?;
        debug!(step, ?command, ?outcome, "tour action");
        if session.tutorial().step() == Some(step) {
            println!("Step {step} did not advance; ending the tour");
            session.end_tutorial()?;
            break;
        }
    }

    println!(
        "✓ Tutorial completed: {}",
        session.host().settings().tutorial_completed
    );
    Ok(())
}

fn cmd_settings_show(path: &Path) -> CliResult<()> {
    let file = SettingsFile::open(path)?;
    println!("# {}", file.path().display());
    println!("{}", file.settings().to_file_string());
    Ok(())
}

fn cmd_settings_set(path: &Path, key: &str, value: &str) -> CliResult<()> {
    let mut file = SettingsFile::open(path)?;
    file.settings_mut()
        .set(key, value)
        .map_err(|reason| CliError::Setting {
            key: key.to_string(),
            reason,
        })?;
    file.persist()?;
    println!("✓ {key} updated in {}", file.path().display());
    Ok(())
}

fn cmd_settings_reset(path: &Path) -> CliResult<()> {
    let mut file = SettingsFile::open(path)?;
    file.reset_to_defaults()?;
    println!("✓ Settings reset: {}", file.path().display());
    Ok(())
}

fn cmd_curve(data: &Path) -> CliResult<()> {
    let dataset = load_dataset(data)?;
    let curve = &dataset.pump_curve;
    println!("Pump curve at {} rpm", curve.rotation_rpm);
    println!("  {:>10}  {:>8}", "Q (m3/h)", "H (m)");
    for point in &curve.points {
        println!("  {:>10.2}  {:>8.2}", point.flow_m3_h, point.head_m);
    }
    Ok(())
}
