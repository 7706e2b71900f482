use std::path::Path;
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _};
use log::{info, LevelFilter};

use crate::context::Context;
use crate::error::OutbreakError;
use crate::parameters::Parameters;
use crate::plan::ExecutionPhase;
use crate::population::{Census, ContextPopulationExt};
use crate::random::ContextRandomExt;

/// Default cli arguments for the outbreak runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON parameters file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Enable logging at this level (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override the number of ticks to run
    #[arg(short, long)]
    pub ticks: Option<u64>,

    /// Override the grid width
    #[arg(long)]
    pub width: Option<usize>,

    /// Override the grid height
    #[arg(long)]
    pub height: Option<usize>,

    /// Override the initial population size
    #[arg(short, long)]
    pub entities: Option<usize>,

    /// Override the panic threshold
    #[arg(short, long)]
    pub panic_threshold: Option<u32>,
}

impl BaseArgs {
    /// Loads the config file, if any, then applies command line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file can't be read or parsed.
    pub fn parameters(&self) -> Result<Parameters, OutbreakError> {
        let mut parameters = if self.config.is_empty() {
            Parameters::default()
        } else {
            info!("loading parameters from {}", self.config);
            Parameters::from_file(Path::new(&self.config))?
        };
        if let Some(ticks) = self.ticks {
            parameters.ticks = ticks;
        }
        if let Some(width) = self.width {
            parameters.width = width;
        }
        if let Some(height) = self.height {
            parameters.height = height;
        }
        if let Some(entities) = self.entities {
            parameters.entity_count = entities;
        }
        if let Some(panic_threshold) = self.panic_threshold {
            parameters.panic_threshold = panic_threshold;
        }
        Ok(parameters)
    }
}

fn create_outbreak_cli() -> Command {
    let cli = Command::new("outbreak");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation with the process's command line arguments.
///
/// # Parameters
/// - `setup_fn`: called with the context and the final parameters after the
///   population exists and before any tick runs. Use it to schedule extra
///   plans such as population adjustments.
///
/// # Errors
/// Returns an error if argument parsing, parameter loading, or the setup
/// function fails
pub fn run_with_args<F>(setup_fn: F) -> Result<Context, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Context, &Parameters) -> Result<(), OutbreakError>,
{
    let cli = create_outbreak_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches, setup_fn)
}

/// Runs a simulation with already-parsed arguments.
///
/// # Errors
/// Returns an error if parameter loading or the setup function fails
pub fn run_with_args_internal<F>(
    args: BaseArgs,
    setup_fn: F,
) -> Result<Context, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Context, &Parameters) -> Result<(), OutbreakError>,
{
    if let Some(level) = &args.log_level {
        let level = LevelFilter::from_str(level)
            .map_err(|_| format!("unknown log level {level:?}"))?;
        crate::log::set_log_level(level);
    }

    let parameters = args.parameters()?;
    parameters.validate()?;

    let mut context = Context::new();
    context.init_random(args.random_seed);
    context.init_population(&parameters)?;

    schedule_tick(&mut context, 1, parameters.ticks);
    schedule_census(&mut context, 0, parameters.ticks, parameters.report_period);

    setup_fn(&mut context, &parameters)?;

    context.execute();
    Ok(context)
}

/// One line of the census report.
#[must_use]
pub fn census_line(tick: u64, census: &Census) -> String {
    format!(
        "tick={tick} humans={} panicked={} zombies={}",
        census.humans, census.panicked, census.zombies
    )
}

// Plans are stamped with the tick they complete, so tick `t` runs at time `t`.
#[allow(clippy::cast_precision_loss)]
fn schedule_tick(context: &mut Context, tick: u64, last_tick: u64) {
    if tick > last_tick {
        return;
    }
    context.add_plan(tick as f64, move |context| {
        let Some(population) = context.population_mut() else {
            return;
        };
        population.step();
        let census = population.census();
        if census.survivors() == 0 {
            info!("no humans left after tick {tick}");
            println!("{}", census_line(tick, &census));
            context.shutdown();
            return;
        }
        schedule_tick(context, tick + 1, last_tick);
    });
}

#[allow(clippy::cast_precision_loss)]
fn schedule_census(context: &mut Context, tick: u64, last_tick: u64, period: u64) {
    context.add_plan_with_phase(
        tick as f64,
        move |context| {
            if let Some(population) = context.population() {
                println!("{}", census_line(tick, &population.census()));
            }
            if tick < last_tick {
                let next = (tick + period).min(last_tick);
                schedule_census(context, next, last_tick, period);
            }
        },
        ExecutionPhase::Last,
    );
}
