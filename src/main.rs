use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{error, info};

use racespace::{
    AnalysisContext, Analyzer, AnomalyDetector, AppConfig, FormatDispatcher, RaceSpaceError, SourceFormat,
    SummaryAdapter, TrackMapRenderer, telemetry::IbtDecoder,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file, defaults to racespace/config.json in the user config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a telemetry recording (.ibt, .csv or .json)
    Analyze {
        input: PathBuf,

        #[arg(long)]
        track: Option<String>,

        #[arg(long)]
        car_class: Option<String>,

        #[arg(long)]
        game: Option<String>,

        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also render the track map as SVG
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Skip the AI summary
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Render only the track map of a recording as SVG
    Map {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn write_output(path: &Path, contents: &str) -> Result<(), RaceSpaceError> {
    std::fs::write(path, contents).map_err(|e| RaceSpaceError::OutputWriteError {
        path: format!("{:?}", path),
        source: e,
    })
}

fn analyze(
    config: &AppConfig,
    input: &Path,
    context: AnalysisContext,
    output: Option<&Path>,
    map: Option<&Path>,
    offline: bool,
) -> Result<(), RaceSpaceError> {
    let analyzer = if offline {
        Analyzer::new(
            FormatDispatcher::new(IbtDecoder, config.track_points),
            SummaryAdapter::offline(&config.summary),
        )
    } else {
        Analyzer::from_config(config)
    };
    let result = analyzer.analyze_file(input, &context)?;

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| RaceSpaceError::ResultSerializeError { source: e })?;
    match output {
        Some(path) => {
            write_output(path, &json)?;
            info!("Analysis written to {:?}", path);
        }
        None => println!("{}", json),
    }

    if let Some(path) = map {
        let svg = TrackMapRenderer::default().render(&result.track_points, &result.problem_areas);
        write_output(path, &svg)?;
        info!("Track map written to {:?}", path);
    }
    Ok(())
}

fn map(config: &AppConfig, input: &Path, output: &Path) -> Result<(), RaceSpaceError> {
    let format = SourceFormat::from_path(input)?;
    let bytes = std::fs::read(input).map_err(|e| RaceSpaceError::InputFileError {
        path: format!("{:?}", input),
        source: e,
    })?;
    let payload = FormatDispatcher::new(IbtDecoder, config.track_points).decode(&bytes, format)?;
    let problems = AnomalyDetector::default().detect(&payload.samples);
    let svg = TrackMapRenderer::default().render(&payload.track_points, &problems);
    write_output(output, &svg)?;
    info!("Track map written to {:?}", output);
    Ok(())
}

fn run(cli: Args) -> Result<(), RaceSpaceError> {
    let config = AppConfig::load(cli.config.as_deref())?
        .with_env_overrides(|name| std::env::var(name).ok());

    match cli.command {
        Commands::Analyze {
            input,
            track,
            car_class,
            game,
            output,
            map: map_path,
            offline,
        } => analyze(
            &config,
            &input,
            AnalysisContext {
                track,
                car_class,
                game,
            },
            output.as_deref(),
            map_path.as_deref(),
            offline,
        ),
        Commands::Map { input, output } => map(&config, &input, &output),
    }
}

fn main() {
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
