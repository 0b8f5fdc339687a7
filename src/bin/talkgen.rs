use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "talkgen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a scene document and export it as a PNG.
    Render(RenderArgs),
    /// Insert a ruby annotation into a line of text.
    Ruby(RubyArgs),
    /// Print the text runs a scene document places, as JSON.
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RubyArgs {
    /// Text to edit.
    #[arg(long)]
    text: String,

    /// Character position to insert at (clamped to the text length).
    #[arg(long, default_value_t = 0)]
    at: usize,

    /// Base text.
    #[arg(long)]
    base: String,

    /// Reading shown above the base.
    #[arg(long)]
    ruby: String,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Ruby(args) => cmd_ruby(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

fn load_scene(in_path: &Path) -> anyhow::Result<talkgen::SceneCompositor> {
    let doc = talkgen::SceneDocument::from_path(in_path)?;
    let base_dir = in_path.parent().unwrap_or_else(|| Path::new("."));

    let mut compositor = doc.build_compositor(base_dir)?;
    for event in doc.apply_to(&mut compositor, base_dir)? {
        if let talkgen::SceneEvent::DecodeFailed { layer, message } = event {
            eprintln!("warning: {layer:?} left empty: {message}");
        }
    }
    Ok(compositor)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut compositor = load_scene(&args.in_path)?;
    let png = compositor.export()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_ruby(args: RubyArgs) -> anyhow::Result<()> {
    println!(
        "{}",
        talkgen::insert_ruby(&args.text, args.at, &args.base, &args.ruby)
    );
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let compositor = load_scene(&args.in_path)?;
    let runs = compositor.placed_text();
    println!("{}", serde_json::to_string_pretty(&runs)?);
    Ok(())
}
