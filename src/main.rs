//! Energy tycoon entry point: CLI wiring and config-driven engine runs.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use energy_tycoon::config::ScenarioConfig;
use energy_tycoon::io::export::export_csv;
use energy_tycoon::sim::engine::Engine;
use energy_tycoon::sim::kpi::KpiReport;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    ticks_override: Option<u64>,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("energy-tycoon: city energy-management simulation");
    eprintln!();
    eprintln!("Usage: energy-tycoon [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a difficulty preset (easy, normal, hard)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --ticks <n>              Override the number of ticks to run");
    eprintln!("  --telemetry-out <path>   Export tick reports to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the run");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Play interactively in the terminal");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the normal preset is used.");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to control log output.");
}

/// Reads the value following a flag, exiting with an error if absent.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("error: {flag} requires a {what} argument");
        process::exit(1);
    })
}

/// Parses a numeric flag value, exiting with an error if malformed.
fn parse_number<T: std::str::FromStr>(value: &str, flag: &str, what: &str) -> T {
    value.parse::<T>().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{value}\" is not a valid {what}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        ticks_override: None,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, "--scenario", "path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "name"));
            }
            "--seed" => {
                i += 1;
                let value = flag_value(&args, i, "--seed", "u64");
                cli.seed_override = Some(parse_number(&value, "--seed", "u64"));
            }
            "--ticks" => {
                i += 1;
                let value = flag_value(&args, i, "--ticks", "u64");
                cli.ticks_override = Some(parse_number(&value, "--ticks", "u64"));
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(flag_value(&args, i, "--telemetry-out", "path"));
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let value = flag_value(&args, i, "--port", "u16");
                cli.port = parse_number(&value, "--port", "u16");
            }
            #[cfg(feature = "tui")]
            "--tui" => {
                cli.tui = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then normal
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::normal()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(ticks) = cli.ticks_override {
        scenario.simulation.ticks = ticks;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    #[cfg(feature = "tui")]
    if cli.tui {
        let label = cli.preset.as_deref().unwrap_or(if cli.scenario_path.is_some() {
            "custom"
        } else {
            "normal"
        });
        if let Err(e) = energy_tycoon::tui::run(scenario, label) {
            eprintln!("error: city view failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    init_tracing();

    let ticks = scenario.simulation.ticks;
    let mut engine = Engine::new(scenario);
    let reports = engine.run(ticks);

    for r in &reports {
        println!("{r}");
    }

    let kpi = KpiReport::from_reports(&reports);
    println!("\n{kpi}");
    if let Some(cause) = engine.game_over_cause() {
        println!("Game over:             {cause}");
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&reports, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(energy_tycoon::api::AppState::capture(&engine, reports));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(energy_tycoon::api::serve(state, addr));
    }
}
