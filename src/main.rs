//! labelmaker command-line front end.
//!
//! Each invocation loads the session file, applies one command as session
//! events and saves the session again.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use labelmaker::config::AppConfig;
use labelmaker::files::{self, BrowseFormat, FileEntry, ImportFormat};
use labelmaker::model::{LabelId, LabelingMode};
use labelmaker::probability::ProbabilityTable;
use labelmaker::project::Project;
use labelmaker::{Event, PathNamespace, Session};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Label images into per-label folders.", long_about = None)]
struct Cli {
    /// Session file carrying labels between invocations
    #[arg(long, default_value = "labelmaker-session.json")]
    session: PathBuf,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<log::LevelFilter>,

    /// Classifier probability table (CSV) for MLCoach mode
    #[arg(long, value_name = "CSV")]
    probabilities: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List files and directories under the data root
    Browse {
        /// Directory relative to the data root
        dir: Option<String>,
        /// `dir`, `*`, or patterns like `*.png,*.tif`
        #[arg(long, default_value = "*")]
        format: String,
    },
    /// Replace the working file list with files and directories
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Extensions taken from directories: `*` or `*.jpg,*.png`
        #[arg(long, default_value = "*")]
        format: String,
        /// Drop existing labels without asking
        #[arg(long)]
        yes: bool,
    },
    /// Empty the working file list
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Show a page of thumbnails and the labeling progress
    Show {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Assign images to a label (name or position)
    Label {
        label: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove images from their labels
    Unlabel {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove every label assignment
    UnlabelAll {
        #[arg(long)]
        yes: bool,
    },
    /// Edit the label list
    Labels {
        #[command(subcommand)]
        command: LabelsCommand,
    },
    /// Switch labeling mode: manual, mlcoach, clinic
    Mode { mode: LabelingMode },
    /// Label every image scoring above a threshold (MLCoach mode)
    Auto {
        /// Label name or position
        #[arg(long)]
        label: String,
        /// Threshold in percent (defaults to the configured one)
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Change the display order
    View { mode: ViewArg },
    /// Change display settings
    Display {
        #[arg(long)]
        columns: Option<usize>,
        #[arg(long)]
        host_paths: Option<bool>,
    },
    /// Move files or directories to a directory under the data root
    Move {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Destination relative to the data root
        #[arg(long)]
        dest: Option<String>,
    },
    /// Delete files or directories
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        yes: bool,
    },
    /// Copy labeled images into one directory per label
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum LabelsCommand {
    /// List labels with their image counts
    List,
    /// Append a label
    Add { name: String },
    /// Delete a label (name or position)
    Delete { label: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ViewArg {
    /// Toggle hiding labeled images
    Hide,
    /// Group images by label
    Sort,
    /// Original order
    Reset,
}

// --- CLI Helpers ---

fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Turn command-line paths into container-namespace entries.
fn entries(paths: &[PathBuf], namespace: &PathNamespace) -> Vec<FileEntry> {
    paths
        .iter()
        .map(|p| {
            let path = namespace.to_container(p);
            if path.is_dir() {
                FileEntry::dir(path)
            } else {
                FileEntry::file(path)
            }
        })
        .collect()
}

fn resolve_label(session: &Session, label: &str) -> Result<LabelId, String> {
    session
        .labels()
        .position(label)
        .or_else(|| label.parse::<LabelId>().ok())
        .ok_or_else(|| format!("Unknown label '{}'", label))
}

/// Apply a gated event, confirming it only when `yes` is set.
fn gated(session: &mut Session, event: Event, yes: bool) -> Result<bool, Box<dyn Error>> {
    session.update(event)?;
    let Some(pending) = session.pending() else {
        return Ok(true);
    };
    if yes {
        session.update(Event::Confirm)?;
        Ok(true)
    } else {
        println!("{} Re-run with --yes to proceed.", pending.prompt());
        session.update(Event::Cancel)?;
        Ok(false)
    }
}

fn print_page(session: &Session) {
    println!(
        "Page {} of {} ({} view, {} mode)",
        session.page() + 1,
        session.page_count(),
        session.view().name(),
        session.mode()
    );
    for thumb in session.thumbnails() {
        let label = match (&thumb.label_name, thumb.color) {
            (Some(name), Some(color)) => format!("[{} {}]", name, color),
            _ => "[unlabeled]".to_string(),
        };
        let marker = if thumb.selected { "*" } else { " " };
        println!("{}{:>3} {} {}", marker, thumb.slot, thumb.path.display(), label);
        if let Some(scores) = &thumb.scores {
            for line in scores.lines() {
                println!("        {}", line);
            }
        }
    }
    print_progress(session);
}

fn print_progress(session: &Session) {
    let progress = session.progress();
    for label in &progress.labels {
        println!("{:>12}: {} ({:.1}%)", label.name, label.count, label.percent);
    }
    println!("{}", progress);
}

fn load_session(cli: &Cli, config: &AppConfig) -> Result<Session, Box<dyn Error>> {
    let prefs = &config.preferences;
    let mut session = Session::new(config.namespace(), &config.labels)
        .with_geometry(prefs.rows_per_page, prefs.thumbnail_columns);
    if let Some(path) = &cli.probabilities {
        session = session.with_probabilities(Arc::new(ProbabilityTable::load(path)?));
    }

    if cli.session.exists() {
        Project::load_from_file(&cli.session)?.apply_to(&mut session);
        log::debug!("Resumed session from {:?}", cli.session);
    } else {
        session.update(Event::SetShowHostPaths(prefs.show_host_paths))?;
    }
    Ok(session)
}

fn run(cli: Cli, config: AppConfig) -> Result<(), Box<dyn Error>> {
    let mut session = load_session(&cli, &config)?;
    let namespace = config.namespace();
    let mut changed = true;

    match cli.command {
        Command::Browse { dir, format } => {
            changed = false;
            let root = files::resolve_destination(&namespace.container_root, dir.as_deref())?;
            let format: BrowseFormat = format.parse()?;
            for entry in files::list_entries(&root, &format) {
                let kind = if entry.is_dir() { "dir " } else { "file" };
                println!("{} {}", kind, session.display_path(&entry.path).display());
            }
        }
        Command::Import { paths, format, yes } => {
            let format: ImportFormat = format.parse()?;
            let selection = entries(&paths, &namespace);
            if gated(&mut session, Event::Import { selection, format }, yes)? {
                println!("Imported {} images", session.files().len());
            }
        }
        Command::Clear { yes } => {
            gated(&mut session, Event::ClearData, yes)?;
        }
        Command::Show { page } => {
            changed = false;
            for _ in 1..page {
                session.update(Event::NextPage)?;
            }
            print_page(&session);
        }
        Command::Label { label, paths } => {
            let label = resolve_label(&session, &label)?;
            session.update(Event::SelectPaths(paths))?;
            session.update(Event::PressLabel(label))?;
            print_progress(&session);
        }
        Command::Unlabel { paths } => {
            session.update(Event::SelectPaths(paths))?;
            session.update(Event::Unlabel)?;
            print_progress(&session);
        }
        Command::UnlabelAll { yes } => {
            gated(&mut session, Event::UnlabelAll, yes)?;
        }
        Command::Labels { command } => match command {
            LabelsCommand::List => {
                changed = false;
                for (id, name) in session.labels().names().iter().enumerate() {
                    let count = session.store().indices(id, session.files()).len();
                    let color = session.labels().color(id);
                    println!("{:>3} {} ({}, {} images)", id, name, color, count);
                }
            }
            LabelsCommand::Add { name } => session.update(Event::AddLabel(name))?,
            LabelsCommand::Delete { label } => {
                let label = resolve_label(&session, &label)?;
                session.update(Event::DeleteLabel(label))?;
            }
        },
        Command::Mode { mode } => {
            if mode == LabelingMode::MlCoach && session.probabilities().is_none() {
                log::warn!("Pass --probabilities to get MLCoach labels");
            }
            session.update(Event::SwitchMode(mode))?;
        }
        Command::Auto { label, threshold } => {
            let label = resolve_label(&session, &label)?;
            let threshold = threshold.unwrap_or(config.preferences.probability_threshold);
            session.update(Event::PressLabel(label))?;
            session.update(Event::LabelWithThreshold { threshold })?;
            print_progress(&session);
        }
        Command::View { mode } => {
            let event = match mode {
                ViewArg::Hide => Event::ToggleHide,
                ViewArg::Sort => Event::Sort,
                ViewArg::Reset => Event::ResetView,
            };
            session.update(event)?;
            print_page(&session);
        }
        Command::Display {
            columns,
            host_paths,
        } => {
            if let Some(columns) = columns {
                session.update(Event::SetThumbnailColumns(columns))?;
            }
            if let Some(show) = host_paths {
                session.update(Event::SetShowHostPaths(show))?;
            }
        }
        Command::Move { paths, dest } => {
            changed = false;
            let destination =
                files::resolve_destination(&namespace.container_root, dest.as_deref())?;
            let moved = files::move_entries(&entries(&paths, &namespace), &destination)?;
            println!(
                "Moved {} entries to {}",
                moved.len(),
                session.display_path(&destination).display()
            );
        }
        Command::Delete { paths, yes } => {
            changed = false;
            if !yes {
                println!("Files cannot be recovered after deletion. Re-run with --yes to proceed.");
            } else {
                let deleted = files::delete_entries(&entries(&paths, &namespace))?;
                println!("Deleted {} entries", deleted);
            }
        }
        Command::Export { output } => {
            changed = false;
            let output = output.unwrap_or_else(|| config.output_dir());
            let report = session.export(&output)?;
            for warning in &report.warnings {
                eprintln!("warning: {}: {}", warning.path.display(), warning.message);
            }
            println!(
                "Exported {} images to {}",
                report.images_exported,
                session.display_path(&output).display()
            );
        }
    }

    if changed {
        save_session(&session, &cli.session)?;
    }
    Ok(())
}

fn save_session(session: &Session, path: &Path) -> Result<(), Box<dyn Error>> {
    Project::from_session(session).save_to_file(path)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(
        cli.log_level
            .unwrap_or_else(|| config.preferences.log_level.to_level_filter()),
    );

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
