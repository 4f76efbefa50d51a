//! Command-line frontend for growing and querying road networks. All the
//! interesting work happens in the `city_model` crate; this binary just
//! parses arguments, runs generation, and prints or saves results.

#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use city_model::{blocks, generate, pathfind, City, GenerationParams, SegmentID};

#[derive(StructOpt)]
#[structopt(name = "citygen", about = "Procedural road network generator")]
enum Command {
    /// Grow a road network and optionally save it as JSON
    Generate {
        /// A seed for generating random numbers. Omit for a clock-derived
        /// seed, which gets logged so the run can be reproduced.
        #[structopt(long)]
        rng_seed: Option<u64>,
        /// Stop growing after this many segments
        #[structopt(long, default_value = "1000")]
        max_segs: usize,
        /// A path to write the network as JSON
        #[structopt(long)]
        output: Option<String>,
    },
    /// Grow a road network and find a route between two segments
    Route {
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// Stop growing after this many segments
        #[structopt(long, default_value = "1000")]
        max_segs: usize,
        /// The segment to start from
        #[structopt(long)]
        start: usize,
        /// The segment to route to
        #[structopt(long)]
        end: usize,
        /// Use A* instead of Dijkstra
        #[structopt(long)]
        astar: bool,
    },
    /// Grow a road network and trace the lots its roads enclose
    Lots {
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// Stop growing after this many segments
        #[structopt(long, default_value = "1000")]
        max_segs: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Command::from_args() {
        Command::Generate {
            rng_seed,
            max_segs,
            output,
        } => {
            let city = grow(rng_seed, max_segs);
            if let Some(path) = output {
                fs_write(&path, &city)?;
                info!("Wrote {}", path);
            }
        }
        Command::Route {
            rng_seed,
            max_segs,
            start,
            end,
            astar,
        } => {
            let city = grow(Some(rng_seed), max_segs);
            if start >= city.roads.len() || end >= city.roads.len() {
                anyhow::bail!(
                    "segment ids must be less than {}, got {} and {}",
                    city.roads.len(),
                    start,
                    end
                );
            }
            let (path, total) = if astar {
                let (path, total, searched) =
                    pathfind::astar(&city, SegmentID(start), SegmentID(end));
                info!("A* expanded {} segments", searched.len());
                (path, total)
            } else {
                pathfind::dijkstra(&city, SegmentID(start), SegmentID(end))
            };
            if path.is_empty() {
                println!("No route from {} to {}", SegmentID(start), SegmentID(end));
            } else {
                println!("Route with cost {}, listed from the end backwards:", total);
                for id in path {
                    let seg = city.get_s(id);
                    println!(
                        "  {} ({}) from ({}, {}) to ({}, {})",
                        id,
                        if seg.is_highway { "highway" } else { "street" },
                        seg.start.x(),
                        seg.start.y(),
                        seg.end.x(),
                        seg.end.y()
                    );
                }
            }
        }
        Command::Lots { rng_seed, max_segs } => {
            let city = grow(Some(rng_seed), max_segs);
            let lots = blocks::find_lots(&city);
            println!("Traced {} lots", lots.len());
            for (idx, lot) in lots.iter().enumerate() {
                println!("  lot {} with {} corners", idx, lot.len());
            }
        }
    }
    Ok(())
}

fn grow(rng_seed: Option<u64>, max_segs: usize) -> City {
    let params = GenerationParams {
        max_segs,
        ..GenerationParams::default()
    };
    let city = generate(rng_seed, params);

    let highways = city.roads.iter().filter(|s| s.is_highway).count();
    info!(
        "Grew {} segments ({} highways, {} streets) across {} sectors with seed {}",
        city.roads.len(),
        highways,
        city.roads.len() - highways,
        city.sectors.len(),
        city.seed
    );
    city
}

fn fs_write(path: &str, city: &City) -> Result<()> {
    let json = serde_json::to_string(city)?;
    std::fs::write(path, json)?;
    Ok(())
}
