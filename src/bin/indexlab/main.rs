//! Command-line entry point for the composite-index latency benchmark.
#![forbid(unsafe_code)]

mod ui;

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexlab::{
    build_size_sequence,
    options::{load_options, BenchOptions},
    render_chart,
    report::{export, format_table},
    store::SchemaBacking,
    BenchmarkRunner,
};
use tracing_subscriber::EnvFilter;

use ui::Ui;

#[derive(Parser, Debug)]
#[command(
    name = "indexlab",
    version,
    about = "Measures show lookup latency with and without a (hall_id, start_time) index",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "INDEXLAB_CONFIG",
        value_name = "FILE",
        help = "TOML config file with a [bench] table"
    )]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Log more (-v info, -vv debug, -vvv trace)"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the size sweep, then print the results table and chart.
    Run(RunCmd),
    /// Print the table sizes a run would measure.
    Sizes {
        #[arg(long, help = "Largest power of ten to include")]
        max_exponent: Option<u32>,
    },
    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct RunCmd {
    #[arg(long, help = "SQLite database path or :memory:")]
    database: Option<String>,

    #[arg(long, help = "Largest power of ten to measure")]
    max_exponent: Option<u32>,

    #[arg(long, help = "Timed lookups per phase")]
    samples: Option<usize>,

    #[arg(long, help = "Shows inserted per transaction")]
    batch_size: Option<usize>,

    #[arg(long, help = "Base RNG seed")]
    seed: Option<u64>,

    #[arg(long, help = "Half width of each lookup window, in hours")]
    window_hours: Option<i64>,

    #[arg(long, help = "Lookups replayed after indexing to compare results")]
    verify_probes: Option<usize>,

    #[arg(long, value_enum, help = "Storage for per-size schemas")]
    schema_backing: Option<SchemaBackingArg>,

    #[arg(long, value_name = "DIR", help = "Write results.csv and results.json here")]
    out_dir: Option<PathBuf>,

    #[arg(long, help = "Skip the terminal chart")]
    no_chart: bool,

    #[arg(long, help = "Disable colours")]
    plain: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, Eq, PartialEq)]
#[value(rename_all = "kebab_case")]
enum SchemaBackingArg {
    Memory,
    TempFile,
}

impl From<SchemaBackingArg> for SchemaBacking {
    fn from(value: SchemaBackingArg) -> Self {
        match value {
            SchemaBackingArg::Memory => SchemaBacking::Memory,
            SchemaBackingArg::TempFile => SchemaBacking::TempFile,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = try_main(cli) {
        eprintln!("indexlab failed: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "indexlab=warn",
        1 => "indexlab=info",
        2 => "indexlab=debug",
        _ => "indexlab=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn try_main(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Run(cmd) => {
            let opts = apply_overrides(load_options(cli.config.as_deref())?, &cmd);
            run_bench(opts, &cmd)?;
        }
        Command::Sizes { max_exponent } => {
            let mut opts = load_options(cli.config.as_deref())?;
            if let Some(max_exponent) = max_exponent {
                opts.max_exponent = max_exponent;
            }
            opts.validate()?;
            let sizes = build_size_sequence(opts.max_exponent);
            let listed: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
            println!("{}", listed.join(" "));
        }
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "indexlab", &mut io::stdout());
        }
    }
    Ok(())
}

fn apply_overrides(mut opts: BenchOptions, cmd: &RunCmd) -> BenchOptions {
    if let Some(database) = &cmd.database {
        opts.database = database.clone();
    }
    if let Some(max_exponent) = cmd.max_exponent {
        opts.max_exponent = max_exponent;
    }
    if let Some(samples) = cmd.samples {
        opts.samples = samples;
    }
    if let Some(batch_size) = cmd.batch_size {
        opts.batch_size = batch_size;
    }
    if let Some(seed) = cmd.seed {
        opts.seed = seed;
    }
    if let Some(window_hours) = cmd.window_hours {
        opts.window_hours = window_hours;
    }
    if let Some(verify_probes) = cmd.verify_probes {
        opts.verify_probes = verify_probes;
    }
    if let Some(backing) = cmd.schema_backing {
        opts.schema_backing = backing.into();
    }
    opts
}

fn run_bench(opts: BenchOptions, cmd: &RunCmd) -> Result<(), Box<dyn Error>> {
    let ui = Ui::new(cmd.plain);
    let runner = BenchmarkRunner::open(opts)?;
    let opts = runner.options();
    let sizes = opts.sizes();

    ui.section(
        "indexlab",
        [
            ("database", opts.database.clone()),
            (
                "sizes",
                format!(
                    "{} .. {} ({} runs)",
                    sizes.first().copied().unwrap_or(0),
                    sizes.last().copied().unwrap_or(0),
                    sizes.len()
                ),
            ),
            ("samples", opts.samples.to_string()),
            ("batch size", opts.batch_size.to_string()),
            ("schemas", opts.schema_backing.label().to_string()),
            ("seed", opts.seed.to_string()),
        ],
    );
    ui.spacer();

    let pb = ui.progress(sizes.len());
    let results = runner.run_all(|result| {
        pb.set_message(format!("{} rows done", result.size));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let results = results?;

    print!("{}", format_table(&results));
    if !cmd.no_chart {
        ui.spacer();
        let measured: Vec<usize> = results.iter().map(|r| r.size).collect();
        let without: Vec<f64> = results.iter().map(|r| r.without_index.mean_secs).collect();
        let with: Vec<f64> = results.iter().map(|r| r.with_index.mean_secs).collect();
        print!("{}", render_chart(&measured, &without, &with, ui.paint()));
    }
    if let Some(dir) = &cmd.out_dir {
        let paths = export(dir, &results)?;
        ui.success(&format!(
            "wrote {} and {}",
            paths.csv.display(),
            paths.json.display()
        ));
    }
    Ok(())
}
