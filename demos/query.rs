use std::rc::Rc;

use clap::Parser;
use color_eyre::eyre::{bail, eyre};

use bdd_strategy::bdd::{Bdd, BddConfig};
use bdd_strategy::domain::{Assignment, BitOrder, Domain, Proposition, PropositionConfig, Value};
use bdd_strategy::strategy::{BddStrategy, Phase};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Strategy file (DDDMP with variable-name metadata).
    #[arg(value_name = "FILE")]
    file: String,

    /// Boolean proposition.
    #[clap(long = "bool", value_name = "NAME")]
    bools: Vec<String>,

    /// Domain, as `name=value1,value2,...`.
    #[clap(long = "domain", value_name = "NAME=VALUES")]
    domains: Vec<String>,

    /// Domain bit `_b0` is the least significant one.
    #[clap(long)]
    lsb: bool,

    /// Constraint of the state search, as `name=true|false` or `name=value`.
    #[clap(long = "where", value_name = "NAME=VALUE")]
    constraints: Vec<String>,

    /// Justice goal of the transition query.
    #[clap(long, value_name = "INT", default_value = "0")]
    jx: u64,

    /// Phase of the transition query (`Y` or `Z`).
    #[clap(long, value_name = "PHASE", default_value = "Y")]
    phase: String,

    /// Maximum number of states to print.
    #[clap(long, value_name = "INT", default_value = "10")]
    limit: usize,

    /// BDD size (in bits, so the actual size is `2^size` nodes).
    #[clap(long, value_name = "INT", default_value = "20")]
    size: usize,
}

fn parse_config(args: &Cli) -> color_eyre::Result<PropositionConfig> {
    let bit_order = if args.lsb {
        BitOrder::LsbFirst
    } else {
        BitOrder::MsbFirst
    };

    let mut propositions: Vec<Proposition> = args
        .bools
        .iter()
        .map(|s| Proposition::from(s.as_str()))
        .collect();
    for arg in &args.domains {
        let (name, values) = arg
            .split_once('=')
            .ok_or_else(|| eyre!("bad domain {:?}, expected NAME=VALUES", arg))?;
        let domain = Domain::new(name, values.split(','), bit_order)?;
        propositions.push(domain.into());
    }
    Ok(PropositionConfig::new(propositions)?)
}

fn parse_constraints(
    config: &PropositionConfig,
    constraints: &[String],
) -> color_eyre::Result<Assignment> {
    let mut assignment = Assignment::new();
    for arg in constraints {
        let (name, value) = arg
            .split_once('=')
            .ok_or_else(|| eyre!("bad constraint {:?}, expected NAME=VALUE", arg))?;
        let value = match config.get(name) {
            Some(Proposition::Bool(_)) => Value::Bool(value.parse()?),
            Some(Proposition::Domain(domain)) => match domain.index_of(value) {
                Some(index) => Value::Index(index),
                None => bail!("domain {:?} has no value {:?}", name, value),
            },
            None => bail!("unknown proposition {:?}", name),
        };
        assignment.insert(name.to_string(), value);
    }
    Ok(assignment)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let config = parse_config(&args)?;
    let partial = parse_constraints(&config, &args.constraints)?;
    let phase: Phase = args.phase.parse()?;

    let bdd = Rc::new(Bdd::new(BddConfig {
        storage_bits: args.size,
        ..BddConfig::default()
    }));
    let mut strategy = BddStrategy::new(bdd);
    strategy.configure_propositions(config);
    strategy.load_from_file(&args.file)?;
    println!("strategy = {:?}", strategy);
    println!("relation size = {}", strategy.bdd().size(strategy.relation()));
    println!("known states = {}", strategy.count_states(strategy.universe())?);

    let Some(start) = strategy.search_for_one_state(&partial)? else {
        println!("No state satisfies {:?}", partial);
        return Ok(());
    };
    println!("Start state: {}", start);

    println!("States satisfying {:?}:", partial);
    for state in strategy.search_for_states(&partial, None)?.take(args.limit) {
        println!("  {}", state?);
    }

    let transitions = strategy.transitions(&start, args.jx, phase)?;
    let all_vars: Vec<_> = strategy.variables().ordered().iter().map(|(v, _)| *v).collect();
    println!("Transitions (jx = {}, phase = {}):", args.jx, phase);
    for cube in strategy.bdd().cubes(transitions, &all_vars).take(args.limit) {
        println!("  {}", strategy.cube_to_string(cube));
    }

    println!("Successors:");
    for state in strategy.successors(&start, args.jx, phase)?.take(args.limit) {
        println!("  {}", state?);
    }

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.2} s", time_total.as_secs_f64());

    Ok(())
}
