use gravsim::{build_scenario, MergeEvent, ScenarioConfig, Simulator};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario YAML file under scenarios/
    #[arg(short, default_value = "sol_system.yaml")]
    file_name: String,

    /// Run exactly this many ticks synchronously instead of the timed
    /// background loop
    #[arg(long)]
    ticks: Option<u64>,

    /// Wall-clock seconds to drive the background loop
    #[arg(long, default_value_t = 10)]
    run_secs: u64,
}

fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("opening scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("parsing scenario {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn subscribe_observers(sim: &Simulator) {
    let ignition_mass = sim.stellar_ignition_mass();
    sim.on_merge(move |e: &MergeEvent| {
        info!(
            "merge: {:?} + {:?} -> {:?} (mass {:.3})",
            e.a.id(),
            e.b.id(),
            e.merged.id(),
            e.merged.mass
        );
        // A body crossing the ignition threshold through this merge is a
        // newly formed star.
        if e.merged.mass > ignition_mass && e.a.mass <= ignition_mass && e.b.mass <= ignition_mass
        {
            info!("star ignited: {:?} (mass {:.3})", e.merged.id(), e.merged.mass);
        }
    });
    sim.on_fault(|e| {
        error!("simulation loop died at tick {}: {}", e.tick, e.message);
    });
}

fn print_summary(sim: &Simulator) {
    let ignition = sim.stellar_ignition_mass();
    let collapse = sim.stellar_collapse_mass();
    let bodies = sim.bodies();

    println!("after {} ticks: {} bodies", sim.tick_count(), bodies.len());
    for body in bodies.iter() {
        let class = if body.mass > collapse {
            "collapsed"
        } else if body.mass > ignition {
            "star"
        } else {
            "planet"
        };
        println!(
            "  {:?} {} mass={:.3} pos=({:.2}, {:.2}, {:.2}) |v|={:.4}{}",
            body.id(),
            class,
            body.mass,
            body.position.x,
            body.position.y,
            body.position.z,
            body.velocity.magnitude(),
            if body.fixed { " [fixed]" } else { "" },
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let sim = build_scenario(&scenario_cfg)?;
    subscribe_observers(&sim);

    match args.ticks {
        Some(n) => {
            info!("stepping {n} ticks synchronously");
            for _ in 0..n {
                sim.step();
            }
        }
        None => {
            sim.start();
            thread::sleep(Duration::from_secs(args.run_secs));
            sim.stop();
        }
    }

    print_summary(&sim);
    Ok(())
}
