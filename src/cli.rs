// ============================================================================
// edgefx CLI — run the edge-effects filter over an image sequence
// ============================================================================
//
// Usage examples:
//   edgefx -i frame.png -o out.png --set outline.enabled=on --set outline.color=#FF0000
//   edgefx -i "shots/*.png" --output-dir out/ --preset glow.efx --warmup 8
//   edgefx -i frame.png --set glow.outer.enabled=on --save-preset glow.efx
//   edgefx --list-settings
//
// Every input is one frame of a sequence fed through a single filter
// instance (tick → render → present), so the distance field carries over
// from frame to frame exactly as it would in a live source.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use edgefx::gpu::GpuBackend;
use edgefx::settings::{self, DESCRIPTORS, FilterSettings, SettingKind};
use edgefx::{Backend, CpuBackend, FilterError, ImageSequenceHost};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Distance-field shadows, glows and outlines for images with alpha.
#[derive(Parser, Debug)]
#[command(
    name = "edgefx",
    about = "Distance-field edge effects for alpha-masked frames",
    long_about = "Feed images through the edge-effects filter as consecutive frames of\n\
                  one source. Effects are configured with --set key=value (see\n\
                  --list-settings) or a preset file.\n\n\
                  Example:\n  \
                  edgefx -i frame.png -o out.png --set outline.enabled=on\n  \
                  edgefx -i \"shots/*.png\" --output-dir out/ --preset glow.efx"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.png").
    /// Files are processed in the order given, as consecutive frames.
    #[arg(short, long, num_args = 1.., required_unless_present = "list_settings")]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for sequences; files keep their stem and become PNG.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Preset file to start from (otherwise every effect is off).
    #[arg(long, value_name = "FILE")]
    pub preset: Option<PathBuf>,

    /// Override a setting, e.g. `--set outline.width=6`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Extra ticks rendered on the first frame so the field converges first.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub warmup: u32,

    /// Run the distance field on the GPU (falls back to CPU if unavailable).
    #[arg(long)]
    pub gpu: bool,

    /// Power preference for --gpu: "high performance" or "low power".
    #[arg(long, default_value = "high performance", value_name = "PREF")]
    pub gpu_preference: String,

    /// Write the effective settings to a preset file.
    #[arg(long, value_name = "FILE")]
    pub save_preset: Option<PathBuf>,

    /// Print every setting key with its kind, bounds and current value.
    #[arg(long)]
    pub list_settings: bool,

    /// Print debug log output and per-frame timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all frames succeeded, `1` = one or more frames failed.
pub fn run(args: CliArgs) -> ExitCode {
    let settings = match build_settings(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.save_preset {
        if let Err(e) = settings::save_preset(&settings, path) {
            eprintln!("error: could not write preset '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        log::info!("preset written to {}", path.display());
    }

    if args.list_settings {
        print_settings(&settings);
        if args.input.is_empty() {
            return ExitCode::SUCCESS;
        }
    }

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for sequences.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let backend = select_backend(&args);
    let mut filter = edgefx::create(&settings, backend.as_ref());
    let mut host = ImageSequenceHost::new();

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let frame_start = Instant::now();

        let Some(output_path) = build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref())
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        let ticks = if idx == 0 { 1 + args.warmup } else { 1 };
        match run_frame(&mut filter, &mut host, input_path, &output_path, ticks) {
            Ok(bypassed) => {
                if bypassed {
                    log::warn!("{}: filter bypassed, frame written unmodified", input_path.display());
                }
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        frame_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    edgefx::destroy(filter);

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-frame processing pipeline
// ============================================================================

/// Returns whether the filter bypassed itself on the final tick.
fn run_frame(
    filter: &mut edgefx::FilterInstance,
    host: &mut ImageSequenceHost,
    input: &Path,
    output: &Path,
    ticks: u32,
) -> Result<bool, FilterError> {
    let frame = image::open(input)?.into_rgba8();
    host.set_frame(frame);

    for _ in 0..ticks {
        filter.on_tick(&*host, 1.0 / 60.0);
        filter.on_render(host, None);
    }

    let bypassed = host.bypassed();
    let result = host
        .take_output()
        .ok_or_else(|| FilterError::Capture("filter produced no frame".to_string()))?;
    result.save(output)?;
    Ok(bypassed)
}

// ============================================================================
// Helpers
// ============================================================================

fn build_settings(args: &CliArgs) -> Result<FilterSettings, FilterError> {
    let mut settings = match &args.preset {
        Some(path) => settings::load_preset(path)?,
        None => FilterSettings::default(),
    };
    for assignment in &args.set {
        settings.apply_assignment(assignment)?;
    }
    Ok(settings)
}

fn select_backend(args: &CliArgs) -> Box<dyn Backend> {
    if args.gpu {
        match GpuBackend::new(&args.gpu_preference) {
            Some(gpu) => {
                log::info!("distance field on GPU ({})", gpu.adapter_name());
                return Box::new(gpu);
            }
            None => log::warn!("no GPU adapter available, using the CPU backend"),
        }
    }
    Box::new(CpuBackend)
}

fn print_settings(settings: &FilterSettings) {
    for d in DESCRIPTORS {
        let value = settings.get(d.key).unwrap_or_default();
        let kind = format!("{:?}", d.kind);
        match d.kind {
            SettingKind::Number => {
                println!("{:<26} {:<7} {:>12}  [{} .. {}]", d.key, kind, value, d.min, d.max)
            }
            _ => println!("{:<26} {:<7} {:>12}", d.key, kind, value),
        }
    }
}

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

/// Compute the output path for a single input frame.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (derives `<stem>.png` from the input)
/// 3. Fallback: `<stem>_fx.png` next to the input
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_fx.png", stem)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/frame_001.png");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), Some(Path::new("out"))),
            Some(PathBuf::from("x.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/frame_001.png"))
        );
        assert_eq!(
            build_output_path(input, None, None),
            Some(PathBuf::from("shots/frame_001_fx.png"))
        );
    }

    #[test]
    fn assignments_apply_over_defaults() {
        let args = CliArgs::parse_from([
            "edgefx",
            "-i",
            "frame.png",
            "--set",
            "outline.enabled=on",
            "--set",
            "outline.width=6",
        ]);
        let settings = build_settings(&args).unwrap();
        assert!(settings.outline.enabled);
        assert_eq!(settings.outline.width, 6.0);

        let bad = CliArgs::parse_from(["edgefx", "-i", "frame.png", "--set", "outline.bogus=1"]);
        assert!(build_settings(&bad).is_err());
    }
}
