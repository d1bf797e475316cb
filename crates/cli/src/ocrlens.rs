//! ocrlens - Project OCR boxes into a view and replay pointer input
//!
//! A command line tool that loads an OCR recognition result from JSON,
//! fits it into a view of the given size, replays zoom/pan gestures and
//! taps/drags in order, and prints the resulting highlight boxes.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use textlens_core::utils::{HasRect, Point, rect2str};
use textlens_core::{
    Color, HighlightSession, ImageSize, Pan, TextRecognition, ViewTransform, ViewerParams,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Output type for the highlight report.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq)]
enum OutputType {
    /// One line per element (default)
    #[default]
    Text,
    /// Full report as JSON
    Json,
}

/// One replayed input event.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    /// `tap:X,Y`
    Tap(Point),
    /// `drag:X,Y`
    Drag(Point),
    /// `pinch:FACTOR[,DX,DY]`, a relative gesture step
    Pinch { zoom_change: f64, dx: f64, dy: f64 },
    /// `zoom:ZOOM[,PAN_X,PAN_Y]`, absolute zoom and pan
    Zoom { zoom: f64, pan: (f64, f64) },
    /// `resize:WxH`
    Resize(f64, f64),
    /// `reset`
    Reset,
}

/// Project OCR boxes into a view and replay taps, drags and zoom steps.
#[derive(Parser, Debug)]
#[command(name = "ocrlens")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
    /// Path to an OCR recognition result in JSON
    file: PathBuf,

    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: (),

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    // === Geometry ===
    /// Source image size in pixels, as WIDTHxHEIGHT
    #[arg(short = 'I', long = "image-size", value_parser = parse_size)]
    image_size: (f64, f64),

    /// View size in view pixels, as WIDTHxHEIGHT
    #[arg(short = 'V', long = "view-size", value_parser = parse_size)]
    view_size: (f64, f64),

    /// Initial zoom factor
    #[arg(short = 'z', long, default_value = "1.0")]
    zoom: f64,

    /// Initial pan, as DX,DY
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    pan: Option<(f64, f64)>,

    // === Viewer options ===
    /// Lower bound for the accumulated zoom
    #[arg(long = "min-zoom", default_value = "0.3")]
    min_zoom: f64,

    /// Upper bound for the accumulated zoom
    #[arg(long = "max-zoom", default_value = "5.0")]
    max_zoom: f64,

    /// Input steps replayed in order: tap:X,Y drag:X,Y pinch:F[,DX,DY]
    /// zoom:Z[,DX,DY] resize:WxH reset
    #[arg(short = 's', long = "step", value_parser = parse_step, allow_hyphen_values = true)]
    steps: Vec<Step>,

    // === Output options ===
    /// Output file name ("-" for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Type of output to generate
    #[arg(short = 't', long = "output_type", value_enum, default_value = "text")]
    output_type: OutputType,
}

fn parse_numbers(s: &str, sep: char) -> std::result::Result<Vec<f64>, String> {
    s.split(sep)
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{}' in '{}'", part.trim(), s))
        })
        .collect()
}

/// Parses `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> std::result::Result<(f64, f64), String> {
    match parse_numbers(&s.to_ascii_lowercase(), 'x')?.as_slice() {
        [w, h] => Ok((*w, *h)),
        _ => Err(format!("expected WIDTHxHEIGHT, got '{}'", s)),
    }
}

/// Parses `X,Y`.
fn parse_pair(s: &str) -> std::result::Result<(f64, f64), String> {
    match parse_numbers(s, ',')?.as_slice() {
        [x, y] => Ok((*x, *y)),
        _ => Err(format!("expected X,Y, got '{}'", s)),
    }
}

fn parse_step(s: &str) -> std::result::Result<Step, String> {
    let (kind, value) = s.split_once(':').unwrap_or((s, ""));
    match kind.trim() {
        "tap" => parse_pair(value).map(Step::Tap),
        "drag" => parse_pair(value).map(Step::Drag),
        "pinch" => match parse_numbers(value, ',')?.as_slice() {
            [f] => Ok(Step::Pinch {
                zoom_change: *f,
                dx: 0.0,
                dy: 0.0,
            }),
            [f, dx, dy] => Ok(Step::Pinch {
                zoom_change: *f,
                dx: *dx,
                dy: *dy,
            }),
            _ => Err(format!("expected pinch:FACTOR[,DX,DY], got '{}'", s)),
        },
        "zoom" => match parse_numbers(value, ',')?.as_slice() {
            [z] => Ok(Step::Zoom {
                zoom: *z,
                pan: (0.0, 0.0),
            }),
            [z, dx, dy] => Ok(Step::Zoom {
                zoom: *z,
                pan: (*dx, *dy),
            }),
            _ => Err(format!("expected zoom:ZOOM[,DX,DY], got '{}'", s)),
        },
        "resize" => parse_size(value).map(|(w, h)| Step::Resize(w, h)),
        "reset" if value.is_empty() => Ok(Step::Reset),
        _ => Err(format!("unknown step '{}'", s)),
    }
}

/// Infer output type from file extension.
fn infer_output_type(filename: &str) -> Option<OutputType> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".json") {
        Some(OutputType::Json)
    } else if lower.ends_with(".txt") {
        Some(OutputType::Text)
    } else {
        None
    }
}

/// Build ViewerParams from command line arguments.
fn build_params(args: &Args) -> Result<ViewerParams> {
    let params = ViewerParams {
        min_zoom: args.min_zoom,
        max_zoom: args.max_zoom,
        ..ViewerParams::default()
    };
    params.validate().context("invalid viewer options")?;
    Ok(params)
}

fn load_recognition(path: &Path) -> Result<TextRecognition> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse OCR result in {}", path.display()))
}

/// Set up a session for the recognition result and build its tree.
fn open_session(args: &Args, recognition: TextRecognition) -> Result<HighlightSession> {
    let mut session = HighlightSession::new(build_params(args)?)?;
    let (iw, ih) = args.image_size;
    let (vw, vh) = args.view_size;
    session.load_image(Arc::new(recognition), ImageSize::new(iw, ih)?);
    session.set_view_size(vw, vh).context("invalid view size")?;

    let (dx, dy) = args.pan.unwrap_or((0.0, 0.0));
    session.set_zoom_pan(args.zoom, Pan::new(dx, dy)?)?;

    if !session.ensure_tree()? {
        bail!("view size must be positive to build highlights");
    }
    Ok(session)
}

fn replay(session: &mut HighlightSession, step: &Step) -> Result<()> {
    match *step {
        Step::Tap(point) => {
            let matched = session.tap(point)?;
            info!(x = point.0, y = point.1, matched, "tap");
        }
        Step::Drag(point) => {
            let matched = session.drag(point)?;
            info!(x = point.0, y = point.1, matched, "drag");
        }
        Step::Pinch {
            zoom_change,
            dx,
            dy,
        } => {
            let moved = session.apply_gesture(zoom_change, dx, dy)?;
            info!(zoom_change, dx, dy, moved, "pinch");
        }
        Step::Zoom { zoom, pan } => {
            session.set_zoom_pan(zoom, Pan::new(pan.0, pan.1)?)?;
            info!(zoom = session.zoom(), "zoom");
        }
        Step::Resize(w, h) => {
            session.set_view_size(w, h)?;
            info!(width = w, height = h, "resize");
        }
        Step::Reset => {
            session.reset_colors()?;
            info!("reset colors");
        }
    }
    Ok(())
}

fn render_text(session: &HighlightSession, out: &mut dyn Write) -> io::Result<()> {
    let pan = session.pan();
    write!(
        out,
        "zoom {:.3} pan {:.3},{:.3}",
        session.zoom(),
        pan.dx,
        pan.dy
    )?;
    if let Some(t) = session.transform() {
        write!(
            out,
            " scale {:.3} offset {:.3},{:.3}",
            t.scale, t.offset_x, t.offset_y
        )?;
    }
    writeln!(out)?;

    if let Some(tree) = session.tree() {
        for (path, element) in tree.elements() {
            writeln!(
                out,
                "{}.{}.{} {} #{:08X} {:?}",
                path.block,
                path.line,
                path.element,
                rect2str(element.rect()),
                element.color().to_argb(),
                element.source().text
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TransformReport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl From<ViewTransform> for TransformReport {
    fn from(t: ViewTransform) -> Self {
        Self {
            scale: t.scale,
            offset_x: t.offset_x,
            offset_y: t.offset_y,
        }
    }
}

#[derive(Serialize)]
struct ElementReport<'a> {
    path: [usize; 3],
    text: &'a str,
    rect: [f64; 4],
    color: Color,
}

#[derive(Serialize)]
struct Report<'a> {
    revision: u64,
    zoom: f64,
    pan: [f64; 2],
    transform: Option<TransformReport>,
    elements: Vec<ElementReport<'a>>,
}

fn build_report(session: &HighlightSession) -> Report<'_> {
    let elements = session
        .tree()
        .into_iter()
        .flat_map(|tree| tree.elements())
        .map(|(path, element)| {
            let (left, top, right, bottom) = element.rect();
            ElementReport {
                path: [path.block, path.line, path.element],
                text: &element.source().text,
                rect: [left, top, right, bottom],
                color: element.color(),
            }
        })
        .collect();
    let pan = session.pan();
    Report {
        revision: session.revision(),
        zoom: session.zoom(),
        pan: [pan.dx, pan.dy],
        transform: session.transform().map(TransformReport::from),
        elements,
    }
}

fn render_json(session: &HighlightSession, out: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &build_report(session))?;
    writeln!(out)?;
    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let recognition = load_recognition(&args.file)?;
    debug!(
        blocks = recognition.blocks.len(),
        elements = recognition.element_count(),
        "loaded recognition"
    );

    let mut session = open_session(args, recognition)?;
    for step in &args.steps {
        replay(&mut session, step).with_context(|| format!("step {:?} failed", step))?;
    }

    // Determine output type (may be inferred from output filename)
    let output_type = if args.output_type == OutputType::Text && args.outfile != "-" {
        infer_output_type(&args.outfile).unwrap_or(args.output_type)
    } else {
        args.output_type
    };

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    match output_type {
        OutputType::Text => render_text(&session, &mut output)?,
        OutputType::Json => render_json(&session, &mut output)?,
    }
    output.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    run(&args)
}
