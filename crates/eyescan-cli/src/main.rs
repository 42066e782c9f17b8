//! eyescan CLI — command-line interface for eye photo analysis.

use clap::{Args, Parser, Subcommand};
use eyescan::{
    estimate_diopter, AgeBucket, AnalysisConfig, Analyzer, ReferenceTable, Subject,
};
use std::path::PathBuf;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

const TERMS: &str = "\
Terms and Conditions

By using this Eye Health Analysis Tool, you agree to the following terms and conditions:

1. Accuracy of Results: The results provided by this tool are for reference purposes only.
   The calculated values may not fully reflect your actual eye health or vision status.
2. No Professional Advice: This tool does not replace professional medical advice, diagnosis,
   or treatment. Always seek the advice of a qualified health provider with any questions you
   may have regarding a medical condition.
3. Limitation of Liability: The developers of this tool are not liable for any inaccuracies
   or issues arising from the use of the provided information.
4. Data Privacy: Your input data will not be stored or shared. The tool operates in your
   local environment and does not collect any personal data.

By proceeding, you acknowledge that you have read, understood, and agree to these terms and
conditions. Pass --accept-terms to `eyescan analyze` to confirm.";

#[derive(Parser)]
#[command(name = "eyescan")]
#[command(about = "Measure the pupil in an eye photo and compare it with age/gender reference values")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an eye image and print the health report.
    Analyze(CliAnalyzeArgs),

    /// Print the terms and conditions.
    Terms,

    /// Print the reference table.
    ReferenceInfo {
        /// Only show the age group containing this age.
        #[arg(long)]
        age: Option<i64>,

        /// Dump the table as reference JSON (loadable with `analyze --reference`).
        #[arg(long)]
        json: bool,

        /// Reference JSON to show instead of the built-in table.
        #[arg(long)]
        reference: Option<PathBuf>,
    },

    /// Run the diopter estimator on explicit values.
    Diopter {
        /// Corneal curvature in mm.
        #[arg(long, default_value = "7.8")]
        corneal_curvature: f64,

        /// Pupil diameter in mm.
        #[arg(long, allow_negative_numbers = true)]
        pupil_size: f64,
    },
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Path to the input eye image (jpg, jpeg, png).
    #[arg(long)]
    image: PathBuf,

    /// Age of the person, 0-120.
    #[arg(long, default_value_t = 25, allow_negative_numbers = true)]
    age: i64,

    /// Gender of the person (male or female).
    #[arg(long, default_value = "male")]
    gender: String,

    /// Confirm agreement with the terms and conditions.
    #[arg(long)]
    accept_terms: bool,

    /// Path to write the report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Analysis config JSON (target size, threshold, tolerance).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference table JSON (eyescan.reference.v1) replacing the built-in table.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Path to save the normalized image that was analyzed.
    #[arg(long)]
    normalized_out: Option<PathBuf>,

    /// Override the normalization target size (pixels, square).
    #[arg(long)]
    target_size: Option<u32>,

    /// Override the pupil intensity threshold (0-255).
    #[arg(long)]
    dark_threshold: Option<u8>,
}

impl CliAnalyzeArgs {
    fn to_config(&self) -> CliResult<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(size) = self.target_size {
            config.target_size = [size, size];
        }
        if let Some(t) = self.dark_threshold {
            config.extract.dark_threshold = t;
        }
        Ok(config)
    }
}

fn load_table(path: Option<&std::path::Path>) -> CliResult<ReferenceTable> {
    match path {
        Some(p) => {
            tracing::info!("Loading reference table: {}", p.display());
            Ok(ReferenceTable::from_json_file(p)?)
        }
        None => Ok(ReferenceTable::builtin()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("{}", e);
        eprintln!("{}", error_line(e.as_ref()));
        std::process::exit(1);
    }
}

fn error_line(e: &dyn std::error::Error) -> String {
    format!("Error: {}", e)
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Terms => {
            println!("{}", TERMS);
            Ok(())
        }
        Commands::ReferenceInfo {
            age,
            json,
            reference,
        } => run_reference_info(age, json, reference.as_deref()),
        Commands::Diopter {
            corneal_curvature,
            pupil_size,
        } => {
            println!("Diopter: {}", estimate_diopter(corneal_curvature, pupil_size));
            Ok(())
        }
    }
}

// ── reference-info ─────────────────────────────────────────────────────

fn run_reference_info(
    age: Option<i64>,
    json: bool,
    reference: Option<&std::path::Path>,
) -> CliResult<()> {
    let table = load_table(reference)?;
    if json {
        println!("{}", table.to_json_pretty()?);
        return Ok(());
    }

    let buckets: Vec<AgeBucket> = match age {
        Some(a) => match table.lookup(a) {
            Some(b) => vec![b],
            None => {
                println!("Age {}: age group not defined", a);
                return Ok(());
            }
        },
        None => AgeBucket::ALL.to_vec(),
    };

    println!("eyescan reference table");
    for bucket in buckets {
        match table.profile(bucket) {
            Some(p) => println!(
                "  {:>5}  cornea {:.1} mm  pupil {:.1}/{:.1} mm  lens {:<6}  c/d {:.2}  retina {} um  iris {}",
                bucket.label(),
                p.corneal_curvature_mm,
                p.pupil_size_mm.bright_light,
                p.pupil_size_mm.dim_light,
                p.lens_clarity,
                p.cup_to_disc_ratio,
                p.retinal_thickness_um,
                p.iris_pattern
            ),
            None => println!("  {:>5}  (no profile, defaults apply)", bucket.label()),
        }
    }
    for gender in ["male", "female"] {
        println!(
            "  {:>6} bright-light pupil adjustment: {:+.2} mm",
            gender,
            table.adjustment(gender)
        );
    }
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    if !args.accept_terms {
        println!("{}", TERMS);
        return Err("please agree to the terms and conditions (--accept-terms) to proceed".into());
    }

    let subject = Subject::new(args.age, &args.gender)?;
    let config = args.to_config()?;
    let table = load_table(args.reference.as_deref())?;
    let analyzer = Analyzer::with_config(table, config)?;

    tracing::info!("Loading image: {}", args.image.display());
    let image = eyescan::load_image(&args.image)?;
    let (w, h) = image.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let normalized = analyzer.normalize(&image);
    if let Some(path) = &args.normalized_out {
        normalized.save(path).map_err(|e| -> CliError {
            format!("Failed to save normalized image {}: {}", path.display(), e).into()
        })?;
        tracing::info!("Normalized image written to {}", path.display());
    }

    let report = analyzer.analyze_normalized(&normalized, &subject);

    println!("Eye Health Report:");
    print!("{}", report);

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(out, &json)?;
        tracing::info!("Report written to {}", out.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> CliResult<()> {
        run(Cli::try_parse_from(args)?)
    }

    #[test]
    fn out_of_range_age_is_reported_as_message() {
        let err = run_args(&[
            "eyescan", "analyze", "--image", "eye.jpg", "--age", "130", "--accept-terms",
        ])
        .unwrap_err();
        assert_eq!(
            error_line(err.as_ref()),
            "Error: age 130 is out of range (expected 0..=120)"
        );
    }

    #[test]
    fn missing_image_names_the_path() {
        let err = run_args(&[
            "eyescan",
            "analyze",
            "--image",
            "/nonexistent/eye.jpg",
            "--accept-terms",
        ])
        .unwrap_err();
        let line = error_line(err.as_ref());
        assert!(
            line.starts_with("Error: failed to open image /nonexistent/eye.jpg: "),
            "{}",
            line
        );
    }

    #[test]
    fn unreadable_reference_is_reported_as_message() {
        let err = run_args(&[
            "eyescan",
            "reference-info",
            "--reference",
            "/nonexistent/table.json",
        ])
        .unwrap_err();
        let line = error_line(err.as_ref());
        assert!(line.starts_with("Error: i/o error: "), "{}", line);
        assert!(!line.contains("Os {"), "{}", line);
    }

    #[test]
    fn analyze_requires_terms() {
        let err = run_args(&["eyescan", "analyze", "--image", "eye.jpg"]).unwrap_err();
        assert!(error_line(err.as_ref()).contains("--accept-terms"));
    }
}
