// Command implementations for pbvictl

use std::fmt::{Debug, Display};
use std::fs::File;
use std::hash::Hash;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use pbvi_core::{
    Belief, DiscreteSpace, Environment, EnvironmentConfig, Episode, Pomdp, RandomPolicy, TabularPomdp,
    TrackedEnvironment,
};
use pbvi_env::{evaluate, BeliefTracker, Evaluation, PomdpSimulator, Tiger, TigerAction, TigerParams, TimeLimit};
use pbvi_solver::{PbviConfig, PbviSolver};

use crate::ProblemArgs;

enum Problem {
    Tiger(Tiger),
    Tabular(TabularPomdp),
}

/// Run `$body` with `$pomdp` bound to the selected problem and `$seed` to its
/// default seed action label
macro_rules! with_problem {
    ($args:expr, |$pomdp:ident, $seed:ident| $body:expr) => {
        match load_problem(&$args.problem)? {
            Problem::Tiger(tiger) => {
                let $pomdp = &tiger;
                let $seed = Some(TigerAction::Listen.label());
                $body
            }
            Problem::Tabular(tabular) => {
                let $pomdp = &tabular;
                let $seed: Option<&str> = None;
                $body
            }
        }
    };
}

/// Options for the simulate command
pub struct SimulateOptions {
    pub episodes: usize,
    pub horizon: usize,
    pub seed: Option<u64>,
    pub belief: Option<String>,
    pub baseline: bool,
    pub episode_log: Option<PathBuf>,
}

pub fn solve(args: &ProblemArgs, belief: &str, json: bool) -> Result<()> {
    let config = build_config(args)?;
    with_problem!(args, |pomdp, default_seed| {
        let initial = parse_belief(pomdp, belief, config.belief_tolerance)?;
        let solver = build_solver(pomdp, args, config, default_seed)?;
        let solution = solver.solve_detailed(&initial)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&solution)?);
        } else {
            println!("action: {}", solution.action);
            println!("value:  {:.5}", solution.value);
            println!(
                "alpha-vectors: {}, belief points: {}, rounds: {}",
                solution.value_function.len(),
                solution.beliefs.len(),
                solution.rounds.len()
            );
        }
        Ok(())
    })
}

pub fn sweep(args: &ProblemArgs, steps: usize) -> Result<()> {
    if steps == 0 {
        bail!("--steps must be at least 1");
    }
    let config = build_config(args)?;
    with_problem!(args, |pomdp, default_seed| {
        let states = pomdp.state_space().as_slice();
        let [first, second] = states else {
            bail!("sweep needs a two-state problem, got {} states", states.len());
        };
        let solver = build_solver(pomdp, args, config, default_seed)?;
        let tolerance = solver.config().belief_tolerance;

        println!(
            "{:>12} {:>12}  {:<16} {:>12}",
            first.to_string(),
            second.to_string(),
            "action",
            "value"
        );
        for n in 0..=steps {
            #[allow(clippy::cast_precision_loss)]
            let p = n as f64 / steps as f64;
            let belief = Belief::over_space(
                pomdp.state_space(),
                [(first.clone(), p), (second.clone(), 1.0 - p)],
                tolerance,
            )?;
            let solution = solver.solve_detailed(&belief)?;
            println!(
                "{:>12.4} {:>12.4}  {:<16} {:>12.5}",
                p,
                1.0 - p,
                solution.action.to_string(),
                solution.value
            );
        }
        Ok(())
    })
}

pub async fn simulate(args: &ProblemArgs, options: &SimulateOptions) -> Result<()> {
    if options.episodes == 0 || options.horizon == 0 {
        bail!("--episodes and --horizon must be at least 1");
    }
    let config = build_config(args)?;
    with_problem!(args, |pomdp, default_seed| {
        let initial = match &options.belief {
            Some(text) => parse_belief(pomdp, text, config.belief_tolerance)?,
            None => Belief::uniform(pomdp.state_space()),
        };
        let discount = config.discount;
        let solver = build_solver(pomdp, args, config, default_seed)?;
        let solution = solver.solve_detailed(&initial)?;
        info!(action = %solution.action, value = solution.value, "policy solved");

        let env_config = EnvironmentConfig {
            seed: options.seed,
            ..EnvironmentConfig::default()
        };
        let simulator = PomdpSimulator::new(pomdp, &initial, &env_config)?;
        let mut env = TrackedEnvironment::new(TimeLimit::new(simulator, options.horizon), discount);
        let mut tracker = BeliefTracker::new(pomdp, initial.clone());

        let solved = evaluate(
            &mut env,
            &mut tracker,
            &solution.value_function,
            options.episodes,
            discount,
        )
        .await?;
        report("pbvi", &solved);

        env.close().await?;
        if let Some(path) = &options.episode_log {
            write_episode_log(path, env.history())?;
            info!(path = %path.display(), episodes = env.history().len(), "episode log written");
        }

        if options.baseline {
            let random = RandomPolicy::new(pomdp.action_space().clone(), options.seed);
            let baseline = evaluate(&mut env, &mut tracker, &random, options.episodes, discount).await?;
            report("random", &baseline);
        }
        Ok(())
    })
}

fn write_episode_log(path: &Path, episodes: &[Episode]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), episodes)
        .with_context(|| format!("Failed to write episode log {}", path.display()))?;
    Ok(())
}

fn report(name: &str, evaluation: &Evaluation) {
    println!(
        "{name:<8} mean discounted return {:>10.4} ± {:.4}  (mean total reward {:.4} over {} episodes)",
        evaluation.mean_discounted_return,
        evaluation.std_error,
        evaluation.mean_total_reward,
        evaluation.episodes
    );
}

fn load_problem(name: &str) -> Result<Problem> {
    if name.eq_ignore_ascii_case("tiger") {
        return Ok(Problem::Tiger(Tiger::new(TigerParams::default())?));
    }
    let pomdp = TabularPomdp::from_json_file(name)
        .with_context(|| format!("Failed to load problem from {name}"))?;
    Ok(Problem::Tabular(pomdp))
}

fn build_config(args: &ProblemArgs) -> Result<PbviConfig> {
    let mut config = match &args.config {
        Some(path) => PbviConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => PbviConfig::default(),
    };
    if let Some(discount) = args.discount {
        config.discount = discount;
    }
    if let Some(rounds) = args.rounds {
        config.expansion_rounds = rounds;
    }
    if let Some(places) = args.places {
        config.rounding_places = places;
    }
    config.validate()?;
    Ok(config)
}

fn build_solver<P>(
    pomdp: P,
    args: &ProblemArgs,
    config: PbviConfig,
    default_seed: Option<&str>,
) -> Result<PbviSolver<P>>
where
    P: Pomdp,
    P::Action: Display,
{
    let action = match args.seed_action.as_deref().or(default_seed) {
        Some(label) => find_label(pomdp.action_space(), label)?,
        None => pomdp
            .action_space()
            .as_slice()
            .first()
            .cloned()
            .context("problem has no actions")?,
    };
    Ok(PbviSolver::with_pessimistic_seed(pomdp, config, action)?)
}

fn find_label<T>(space: &DiscreteSpace<T>, label: &str) -> Result<T>
where
    T: Clone + Debug + Eq + Hash + Display,
{
    space
        .iter()
        .find(|item| item.to_string() == label)
        .cloned()
        .with_context(|| {
            let known: Vec<String> = space.iter().map(ToString::to_string).collect();
            format!("unknown label {label:?}, expected one of: {}", known.join(", "))
        })
}

fn parse_belief<P>(pomdp: &P, text: &str, tolerance: f64) -> Result<Belief<P::State>>
where
    P: Pomdp + ?Sized,
    P::State: Display,
{
    let mut pairs = Vec::new();
    for part in text.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let (label, probability) = part
            .split_once('=')
            .with_context(|| format!("expected label=probability, got {part:?}"))?;
        let state = find_label(pomdp.state_space(), label.trim())?;
        let probability: f64 = probability
            .trim()
            .parse()
            .with_context(|| format!("invalid probability in {part:?}"))?;
        pairs.push((state, probability));
    }
    Ok(Belief::over_space(pomdp.state_space(), pairs, tolerance)?)
}
