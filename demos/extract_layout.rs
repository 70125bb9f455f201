/// Example extracting page layout and header/footer runs from a .docx file.
///
/// Prints the content tree as JSON. Set `RUST_LOG=debug` to watch stage
/// timing and state transitions.
///
/// ```text
/// cargo run --example extract_layout -- report.docx --dpi 144 --stop-on-error
/// cargo run --example extract_layout -- report.docx --options parse.yaml
/// ```
use clap::Parser;
use litchi_layout::pipeline::{EventPayload, EventType, Extractor};
use litchi_layout::ParseOptions;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "extract_layout", about = "Extract page layout from a .docx file")]
struct Args {
    /// Word document to parse
    input: PathBuf,

    /// YAML file with parse options
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Abort at the first failing stage
    #[arg(long)]
    stop_on_error: bool,

    /// Output resolution; overrides the options file
    #[arg(long)]
    dpi: Option<f64>,

    /// Directory with stage manifests; overrides the options file
    #[arg(long)]
    stages_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut options = match &args.options {
        Some(path) => ParseOptions::from_yaml_file(path)?,
        None => ParseOptions::default(),
    };
    if args.stop_on_error {
        options.stop_on_error = true;
    }
    if let Some(dpi) = args.dpi {
        options.dpi = dpi;
    }
    if let Some(dir) = args.stages_dir {
        options.stages_dir = Some(dir);
    }

    let extractor = Extractor::with_default_stages()?;
    extractor
        .bus()
        .subscribe(EventType::StageProcessError, |event| {
            if let EventPayload::ProcessError { stage, error } = &event.payload {
                eprintln!("stage {} failed: {}", stage, error);
            }
        });

    let data = std::fs::read(&args.input)?;
    let start = Instant::now();
    let content = extractor.parse(&data, &options)?;
    eprintln!("Parsed {} in {:?}", args.input.display(), start.elapsed());

    for stage in extractor.registry().list() {
        eprintln!(
            "  {:<12} priority {:>4}  {}",
            stage.name,
            stage.priority,
            if stage.enabled { "enabled" } else { "disabled" }
        );
    }

    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}
