mod models;
mod result;
mod search;

use std::io::Write;

use clap::Parser;
use fixpoint_core::convert_case::Case;
use fixpoint_core::statistics::configure_statistic_logging;
use fixpoint_core::statistics::log_statistic_postfix;
use fixpoint_core::statistics::Statistic;
use fixpoint_core::statistics::StatisticLogger;
use fixpoint_core::EngineOptions;
use fixpoint_core::PropagationEngine;
use fixpoint_core::SchedulingPolicy;
use log::error;
use log::info;
use log::warn;
use log::LevelFilter;
use models::Model;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use result::FixpointResult;
use search::DepthFirstSearch;

#[derive(Debug, Parser)]
#[command(
    help_template = "\
{before-help}{name} {version}
Authors: {author}
About: {about}

{usage-heading}\n{tab}{usage}

{all-args}{after-help}
",
    author,
    version,
    about
)]
struct Args {
    /// The model to generate.
    #[arg(long, value_enum, default_value_t)]
    model: Model,

    /// The size of the model, e.g. the number of queens.
    #[arg(long, default_value_t = 8)]
    size: u32,

    /// The order in which the engine executes propagators. Every policy reaches the same
    /// fixpoints; they differ in the number of propagator executions.
    #[arg(long, value_enum, default_value_t)]
    policy: SchedulingPolicy,

    /// Keep the insertion order of the propagators when they are executed for the first time,
    /// instead of ordering them by priority and arity.
    ///
    /// Possible values: bool
    #[arg(long = "no-sort", verbatim_doc_comment)]
    no_sort: bool,

    /// The decay factor of the activity policy.
    #[arg(long = "activity-decay", default_value_t = 0.999)]
    activity_decay: f64,

    /// The seed for the random value selection of the search.
    #[arg(long = "random-seed", default_value_t = 42)]
    random_seed: u64,

    /// Enables log message output from the engine and the search.
    ///
    /// Possible values: bool
    #[arg(short = 'v', long = "verbose", verbatim_doc_comment)]
    verbose: bool,

    /// Enables logging of statistics from the engine and the search.
    ///
    /// Possible values: bool
    #[arg(short = 's', long = "log-statistics", verbatim_doc_comment)]
    log_statistics: bool,

    /// Instructs the search to report all solutions instead of stopping at the first one.
    ///
    /// Possible values: bool
    #[arg(short = 'a', long = "all-solutions", verbatim_doc_comment)]
    all_solutions: bool,
}

fn configure_logging(verbose: bool, log_statistics: bool) {
    if log_statistics {
        configure_statistic_logging(
            "%%%fixpoint-stat:",
            Some("%%%fixpoint-stat-end"),
            Some(Case::Camel),
            None,
        );
    }
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "% ")?;

            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
    info!("Logging successfully configured");
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> FixpointResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose, args.log_statistics);

    if fixpoint_core::fixpoint_asserts::FIXPOINT_ASSERT_LEVEL_DEFINITION
        >= fixpoint_core::fixpoint_asserts::FIXPOINT_ASSERT_MODERATE
    {
        warn!(
            "Potential performance degradation: the assert level is set to {}, meaning many debug asserts are active which may result in performance degradation.",
            fixpoint_core::fixpoint_asserts::FIXPOINT_ASSERT_LEVEL_DEFINITION
        );
    }

    let mut engine = PropagationEngine::new(EngineOptions {
        scheduling_policy: args.policy,
        sort_propagators_on_initialise: !args.no_sort,
        activity_decay: args.activity_decay,
    });
    let variables = args.model.build(&mut engine, args.size)?;
    info!(
        "Built the {} model of size {} with {} propagators, using the {} policy",
        args.model,
        args.size,
        engine.num_propagators(),
        engine.scheduling_policy()
    );

    let mut search = DepthFirstSearch::new(
        variables,
        SmallRng::seed_from_u64(args.random_seed),
        args.all_solutions,
    );
    let mut output = std::io::stdout();
    // The first failed write is kept and returned once the search is done.
    let mut written = Ok(());
    match engine.run_to_fixpoint() {
        Ok(()) => search.solve(&mut engine, &mut |solution| {
            if written.is_ok() {
                written = write_solution(&mut output, solution);
            }
        }),
        Err(contradiction) => {
            info!("Propagation at the root failed: {contradiction}");
            engine.flush();
        }
    }
    written?;

    if search.statistics().num_solutions == 0 {
        writeln!(output, "=====UNSATISFIABLE=====")?;
    } else if args.all_solutions {
        writeln!(output, "==========")?;
    }
    output.flush()?;

    engine.log_statistics();
    search.statistics().log(StatisticLogger::new(["search"]));
    log_statistic_postfix();

    Ok(())
}

fn write_solution(output: &mut impl Write, solution: &[i32]) -> std::io::Result<()> {
    let values = solution
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    writeln!(output, "{}", values.join(" "))?;
    writeln!(output, "----------")
}
