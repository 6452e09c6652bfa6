use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dike_design::{
    alignment::Alignment,
    config::DesignConfig,
    crs::Crs,
    dtm::Tin,
    geometry::{Point, Polyline},
    intersection::{intersect_polylines, Intersection},
    io::{
        geojson::{project_feature_collection, write_feature_collection},
        project::read_project_json,
        read_points3_csv, read_points_csv, write_points_csv,
    },
    offset::{OffsetParams, OffsetSide},
    profile::sample_profile,
    DesignError, DesignResult, Session,
};

/// Command line front end for the dike design engine.
#[derive(Parser)]
#[command(name = "dike_design_cli", version)]
struct Cli {
    /// JSON configuration file; defaults apply to missing keys
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a terrain profile along an alignment (x,y CSV) over terrain points (x,y,z CSV).
    Profile {
        alignment: PathBuf,
        terrain: PathBuf,
        /// Chainage step between samples
        #[arg(long)]
        step: Option<f64>,
    },
    /// Rebuild the design of a project file over terrain points and report its volume.
    Volume { project: PathBuf, terrain: PathBuf },
    /// Intersect two polylines given as x,y CSV files.
    Intersect {
        #[arg(long)]
        line: PathBuf,
        #[arg(long)]
        target: PathBuf,
    },
    /// Offset a polyline sideways.
    Offset {
        line: PathBuf,
        #[arg(long)]
        distance: f64,
        /// left or right of the direction of travel
        #[arg(long, default_value = "left")]
        side: OffsetSide,
        /// Write the offset line as CSV instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export every graphic layer of a project file as WGS84 GeoJSON.
    ExportGeojson {
        project: PathBuf,
        output: PathBuf,
        /// CRS of the project coordinates; the configured CRS when omitted
        #[arg(long)]
        crs: Option<String>,
    },
}

fn load_config(path: Option<&Path>) -> DesignResult<DesignConfig> {
    match path {
        Some(p) => DesignConfig::load(p),
        None => Ok(DesignConfig::default()),
    }
}

fn load_terrain(path: &Path) -> DesignResult<Tin> {
    let tin = Tin::from_points(read_points3_csv(path)?);
    if tin.is_empty() {
        return Err(DesignError::MissingInput(format!(
            "{} does not triangulate",
            path.display()
        )));
    }
    Ok(tin)
}

fn print_points(points: &[Point]) {
    for p in points {
        println!("{:.3},{:.3}", p.x, p.y);
    }
}

fn run(cli: Cli) -> DesignResult<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Profile {
            alignment,
            terrain,
            step,
        } => {
            let alignment = Alignment::new(read_points_csv(&alignment)?)?;
            let tin = load_terrain(&terrain)?;
            let mut sampler = config.sampler.clone();
            if let Some(step) = step {
                sampler.step = step;
            }
            let profile = sample_profile(&alignment, &tin, &sampler)?;
            println!("id,chainage,x,y,elevation");
            for p in profile.points() {
                println!(
                    "{},{:.3},{:.3},{:.3},{:.3}",
                    p.id, p.chainage, p.x, p.y, p.elevation
                );
            }
        }
        Commands::Volume { project, terrain } => {
            let project = read_project_json(&project)?;
            let tin = load_terrain(&terrain)?;
            let mut session = Session::new(config, Box::new(tin));
            session.load_project(&project)?;
            let vertices = session
                .alignment()
                .map(|a| a.vertices().to_vec())
                .unwrap_or_default();
            session.set_alignment(vertices)?;
            session.recompute()?;
            let report = session
                .volume_report()
                .copied()
                .ok_or_else(|| DesignError::MissingInput("design surface".into()))?;
            println!("Excavation: {:.3}", report.result.excavation);
            println!("Fill: {:.3}", report.result.fill);
            println!("Net: {:.3}", report.result.net_difference);
            if report.skipped_cells > 0 {
                println!(
                    "Skipped {} of {} cells without terrain",
                    report.skipped_cells,
                    report.skipped_cells + report.evaluated_cells
                );
            }
        }
        Commands::Intersect { line, target } => {
            let a = Polyline::new(read_points_csv(&line)?);
            let b = Polyline::new(read_points_csv(&target)?);
            match intersect_polylines(&a, &b) {
                Intersection::Empty => println!("No intersection"),
                hit => print_points(&hit.points()),
            }
        }
        Commands::Offset {
            line,
            distance,
            side,
            output,
        } => {
            let line = Polyline::new(read_points_csv(&line)?);
            let shifted = OffsetParams::new(distance, side).apply(&line)?;
            match output {
                Some(path) => {
                    write_points_csv(&path, &shifted.vertices)?;
                    println!("Wrote {} points to {}", shifted.vertices.len(), path.display());
                }
                None => print_points(&shifted.vertices),
            }
        }
        Commands::ExportGeojson {
            project,
            output,
            crs,
        } => {
            let project = read_project_json(&project)?;
            let crs = Crs::parse(crs.as_deref().unwrap_or(config.crs.as_str()));
            let fc = project_feature_collection(&project, &crs);
            write_feature_collection(&output, &fc)?;
            println!(
                "Exported {} features to {}",
                fc.features.len(),
                output.display()
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
