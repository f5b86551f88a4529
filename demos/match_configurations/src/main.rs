use argh::FromArgs;
use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use kornia_match::{build_lookup, match_configurations, Configuration, MatchParams};

#[derive(FromArgs)]
/// Align two configurations of labeled instances and report the correspondence
struct Args {
    /// path to the JSON file with the configuration to align
    #[argh(option)]
    config_a: PathBuf,

    /// path to the JSON file with the reference configuration
    #[argh(option)]
    config_b: PathBuf,

    /// optional path to a JSON file with the matching parameters
    #[argh(option)]
    params: Option<PathBuf>,

    /// override the matching radius
    #[argh(option)]
    radius: Option<f64>,

    /// cap the number of evaluated seed transforms
    #[argh(option)]
    max_evaluations: Option<usize>,

    /// print the alignment as JSON
    #[argh(switch)]
    json: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config_a: Configuration = read_json(&args.config_a)?;
    let config_b: Configuration = read_json(&args.config_b)?;
    log::info!(
        "config A: {} instances, config B: {} instances",
        config_a.num_instances(),
        config_b.num_instances()
    );

    let mut params = match &args.params {
        Some(path) => read_json::<MatchParams>(path)?,
        None => MatchParams::default(),
    };
    if let Some(radius) = args.radius {
        params.radius = radius;
    }
    if args.max_evaluations.is_some() {
        params.max_evaluations = args.max_evaluations;
    }

    let alignment = match_configurations(&config_a, &config_b, None, &params)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&alignment)?);
        return Ok(());
    }

    let lookup = build_lookup(&alignment.correspondence, &config_a, &config_b);
    println!(
        "Matched {} instances ({} evaluations, converged: {})",
        alignment.correspondence.len(),
        alignment.stats.evaluations,
        alignment.stats.converged
    );
    for row in alignment.transform.iter() {
        println!("  {:>10.4} {:>10.4} {:>10.4} {:>10.4}", row[0], row[1], row[2], row[3]);
    }
    for (a, b) in lookup.a_to_b.iter() {
        println!("  {a} -> {b}");
    }
    println!("Unmatched in A: {:?}", lookup.misses_a);
    println!("Unmatched in B: {:?}", lookup.misses_b);

    Ok(())
}
