// ============================================================================
// paintr CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   paintr --new 640x480 --output blank.prd
//   paintr -i photo.png -o out.prd                (format inferred from output ext)
//   paintr -i "*.png" --output-dir exported/ --format pdf
//   paintr -i drawing.prd --info
//
// All processing runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::PixelCanvas;
use crate::io::{export_image, load_canvas, SaveFormat};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// paintr headless document processor.
///
/// Convert between the native document container and standard image formats
/// without opening an editor.
#[derive(Parser, Debug)]
#[command(
    name = "paintr",
    about = "paintr headless batch document processor",
    long_about = "Convert raster files to and from the native document container,\n\
                  create blank documents, and inspect files. Supports PRD documents,\n\
                  PNG, JPEG, BMP, TIFF, GIF (static) and PDF output.\n\n\
                  Example:\n  \
                  paintr --input photo.png --output photo.prd\n  \
                  paintr -i \"*.prd\" --output-dir exported/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "docs/*.prd").
    #[arg(short, long, num_args = 1..)]
    pub input: Vec<String>,

    /// Create a blank white document of the given size (e.g. "640x480")
    /// instead of reading inputs.
    #[arg(long, value_name = "WxH", conflicts_with = "input")]
    pub new: Option<String>,

    /// Output file path. Only valid for single-file input (or --new).
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's
    /// extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: prd, png, jpeg, bmp, tiff, gif, pdf.
    /// When omitted, inferred from --output's extension, defaulting to prd.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Print file information (dimensions, byte size) instead of converting.
    #[arg(long)]
    pub info: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    if let Some(spec) = &args.new {
        return run_new(spec, args.output.as_deref());
    }

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if args.info {
        return run_info(&inputs);
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = parse_format(args.format.as_deref(), args.output.as_deref());

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, format) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  -> {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                crate::log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Operations
// ============================================================================

fn run_one(input: &Path, output: &Path, format: SaveFormat) -> Result<(), String> {
    let canvas = load_canvas(input).map_err(|e| format!("load failed: {}", e))?;
    export_image(canvas.image(), output, format).map_err(|e| format!("save failed: {}", e))
}

fn run_new(spec: &str, output: Option<&Path>) -> ExitCode {
    let Some((w, h)) = parse_size(spec) else {
        eprintln!("error: --new expects WIDTHxHEIGHT (e.g. 640x480), got '{}'.", spec);
        return ExitCode::FAILURE;
    };
    let Some(output) = output else {
        eprintln!("error: --new requires --output.");
        return ExitCode::FAILURE;
    };
    let format = SaveFormat::from_path(output).unwrap_or(SaveFormat::Document);
    let canvas = PixelCanvas::new(w, h);
    match export_image(canvas.image(), output, format) {
        Ok(()) => {
            println!("created {} ({}x{})", output.display(), canvas.width(), canvas.height());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_info(inputs: &[PathBuf]) -> ExitCode {
    let mut any_failure = false;
    for path in inputs {
        match (load_canvas(path), std::fs::metadata(path)) {
            (Ok(canvas), Ok(meta)) => {
                println!(
                    "{}: {}x{} px, {} bytes",
                    path.display(),
                    canvas.width(),
                    canvas.height(),
                    meta.len()
                );
            }
            (Err(e), _) => {
                eprintln!("{}: error: {}", path.display(), e);
                any_failure = true;
            }
            (_, Err(e)) => {
                eprintln!("{}: error: {}", path.display(), e);
                any_failure = true;
            }
        }
    }
    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to the native container.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return match f.to_lowercase().as_str() {
            "png" => SaveFormat::Png,
            "jpeg" | "jpg" => SaveFormat::Jpeg,
            "bmp" => SaveFormat::Bmp,
            "tiff" | "tif" => SaveFormat::Tiff,
            "gif" => SaveFormat::Gif,
            "pdf" => SaveFormat::Pdf,
            _ => SaveFormat::Document,
        };
    }
    output
        .and_then(SaveFormat::from_path)
        .unwrap_or(SaveFormat::Document)
}

/// Parse a "WIDTHxHEIGHT" size specification.
fn parse_size(spec: &str) -> Option<(u32, u32)> {
    let (w, h) = spec.split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to the stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
