use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use colorblock::{
    BackgroundResolver, BackgroundResolverOpts, Compositor, FontSet, RenderSpec, encode_png,
    export_file_name,
};

#[derive(Parser, Debug)]
#[command(name = "colorblock", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single spec JSON to a PNG.
    Render(RenderArgs),
    /// Render a JSON array of specs into a directory of PNGs.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render spec JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path. Defaults to a timestamped download name.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input JSON: an array of render specs.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory; files are named from each spec's content.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Regular font file (TTF/OTF).
    #[arg(long)]
    font: PathBuf,

    /// Bold font file for headings; falls back to the regular face.
    #[arg(long = "bold-font")]
    bold_font: Option<PathBuf>,

    /// Origin used to resolve root-relative background image URLs.
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// HTTP timeout for background image fetches, in milliseconds.
    /// Expiry falls back to the solid background color.
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn make_compositor(common: &CommonArgs) -> anyhow::Result<Compositor> {
    let opts = BackgroundResolverOpts {
        timeout: common.timeout_ms.map(Duration::from_millis),
        base_origin: common.base_url.clone(),
    };
    Ok(Compositor::new(BackgroundResolver::new(opts)?))
}

fn load_fonts(common: &CommonArgs) -> anyhow::Result<FontSet> {
    Ok(FontSet::from_paths(
        &common.font,
        common.bold_font.as_deref(),
    )?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn write_png(path: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let spec: RenderSpec = read_json(&args.in_path, "render spec")?;
    spec.validate()?;

    let compositor = make_compositor(&args.common)?;
    let frame = compositor.render_frame(&spec, load_fonts(&args.common)?)?;
    let png = encode_png(&frame)?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(colorblock::download_file_name(SystemTime::now())));
    write_png(&out, &png)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let specs: Vec<RenderSpec> = read_json(&args.in_path, "render specs")?;
    let compositor = make_compositor(&args.common)?;
    let fonts = load_fonts(&args.common)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for (idx, spec) in specs.iter().enumerate() {
        spec.validate().with_context(|| format!("spec #{idx}"))?;
        let frame = compositor.render_frame(spec, fonts.clone())?;
        let png = encode_png(&frame)?;
        let out = args.out_dir.join(export_file_name(spec));
        write_png(&out, &png)?;
        eprintln!("wrote {}", out.display());
    }

    eprintln!("rendered {} card(s)", specs.len());
    Ok(())
}
