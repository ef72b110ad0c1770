use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use svgedit::{Animation, AnimationKind, EditOptions, Editor, Paint, Repeat};

/// Edit SVG documents from the command line
///
/// Reads a document from --input (or stdin), applies one edit and writes the
/// result to stdout. Edits aimed at unknown ids print the input unchanged.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Document to edit (default: stdin)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Options file (TOML)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recolor a node and its drawable descendants
    Color {
        id: String,
        color: String,
        /// Recolor the stroke instead of the fill
        #[arg(long)]
        stroke: bool,
    },
    /// Set stroke color and/or width
    Stroke {
        id: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        width: Option<f64>,
    },
    /// Set opacity (0..1)
    Opacity { id: String, value: f64 },
    /// Translate by a delta
    #[command(visible_alias = "mv")]
    Move {
        id: String,
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Set the absolute scale
    Scale { id: String, factor: f64 },
    /// Set the absolute rotation in degrees
    Rotate {
        id: String,
        #[arg(allow_negative_numbers = true)]
        degrees: f64,
    },
    /// Remove a node
    #[command(visible_alias = "rm")]
    Remove { id: String },
    /// Duplicate a node next to itself
    Duplicate {
        id: String,
        #[arg(long)]
        new_id: Option<String>,
    },
    /// Move one step back in paint order
    Up { id: String },
    /// Move one step forward in paint order
    Down { id: String },
    /// Place a node right before a sibling
    Before { id: String, target: String },
    /// Place a node right after a sibling
    After { id: String, target: String },
    /// Add a full-canvas background
    AddBackground {
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove the background
    RemoveBackground,
    /// Copy nodes into a standalone snippet
    Extract {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Insert a snippet file on top of the document
    Inject {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        fragment: PathBuf,
        #[arg(long, allow_negative_numbers = true, requires = "y")]
        x: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "x")]
        y: Option<f64>,
    },
    /// Apply a built-in theme by id
    Theme { theme: String },
    /// Attach an animation (spin, pulse, blink, float)
    Animate {
        id: String,
        kind: AnimationKind,
        /// Seconds per cycle
        #[arg(long, default_value_t = 2.0)]
        duration: f64,
        /// "indefinite" or a count
        #[arg(long, default_value = "indefinite")]
        repeat: Repeat,
    },
    /// Remove a node's animations
    Unanimate { id: String },
    /// Print the layer tree as JSON
    Layers,
    /// Print the built-in themes as JSON
    Themes,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_options(path: Option<&PathBuf>) -> Result<EditOptions> {
    match path {
        Some(path) => EditOptions::from_path(path).context("Failed to load options"),
        None => Ok(EditOptions::default()),
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let editor = Editor::new(load_options(cli.config.as_ref())?);

    let svg = match cli.command {
        Commands::Themes => String::new(),
        _ => read_input(cli.input.as_ref())?,
    };
    if svg.trim().is_empty() && !matches!(cli.command, Commands::Themes) {
        bail!("No input provided");
    }

    let output = match cli.command {
        Commands::Color { id, color, stroke } => {
            let channel = if stroke { Paint::Stroke } else { Paint::Fill };
            editor.update_element_color(&svg, &id, &color, channel)
        }
        Commands::Stroke { id, color, width } => {
            editor.update_element_stroke(&svg, &id, color.as_deref(), width)
        }
        Commands::Opacity { id, value } => editor.update_element_opacity(&svg, &id, value),
        Commands::Move { id, dx, dy } => editor.apply_translate_delta(&svg, &id, dx, dy),
        Commands::Scale { id, factor } => editor.set_scale(&svg, &id, factor),
        Commands::Rotate { id, degrees } => editor.set_rotation(&svg, &id, degrees),
        Commands::Remove { id } => editor.remove_element(&svg, &id),
        Commands::Duplicate { id, new_id } => {
            editor.duplicate_element(&svg, &id, new_id.as_deref())
        }
        Commands::Up { id } => editor.move_up(&svg, &id),
        Commands::Down { id } => editor.move_down(&svg, &id),
        Commands::Before { id, target } => editor.move_before(&svg, &id, &target),
        Commands::After { id, target } => editor.move_after(&svg, &id, &target),
        Commands::AddBackground { color } => match color {
            Some(color) => editor.add_background_with(&svg, &color),
            None => editor.add_background(&svg),
        },
        Commands::RemoveBackground => editor.remove_background(&svg),
        Commands::Extract { ids } => {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            editor.extract_snippet(&svg, &ids)
        }
        Commands::Inject { fragment, x, y } => {
            let fragment = fs::read_to_string(&fragment)
                .with_context(|| format!("Failed to read {}", fragment.display()))?;
            let injected = editor.inject_snippet(&svg, &fragment, x, y);
            match &injected.new_id {
                Some(id) => eprintln!("{id}"),
                None => log::warn!("snippet was not injected"),
            }
            injected.svg
        }
        Commands::Theme { theme } => {
            let Some(theme) = svgedit::preset(&theme) else {
                let known: Vec<&str> = svgedit::presets().iter().map(|t| t.id.as_str()).collect();
                bail!("Unknown theme {theme:?} (known: {})", known.join(", "));
            };
            editor.apply_theme(&svg, theme)
        }
        Commands::Animate {
            id,
            kind,
            duration,
            repeat,
        } => {
            let animation = Animation {
                kind,
                duration,
                repeat,
            };
            editor.apply_animation(&svg, &id, &animation)
        }
        Commands::Unanimate { id } => editor.remove_animation(&svg, &id),
        Commands::Layers => serde_json::to_string_pretty(&editor.build_tree(&svg))? + "\n",
        Commands::Themes => serde_json::to_string_pretty(svgedit::presets())? + "\n",
    };

    if output == svg {
        log::info!("document unchanged");
    }
    print!("{output}");
    Ok(())
}
