//! Improve: Bellman backups over the belief set until a local fixed point

use tracing::debug;

use pbvi_core::{AlphaVector, BeliefSet, Pomdp, PomdpError, Result, ValueFunction};

use crate::Backup;

/// Outcome of a converged Improve call
#[derive(Debug, Clone)]
pub struct Improvement<S: std::hash::Hash + Eq, A: std::hash::Hash + Eq> {
    /// Grown value function
    pub value_function: ValueFunction<S, A>,
    /// Iterations run, including the final one that found nothing new
    pub iterations: usize,
    /// Alpha-vectors appended across all iterations
    pub added: usize,
}

/// Back up every belief against the current value function and append the
/// results that are new, until an iteration adds nothing
///
/// All backups of one iteration read the same snapshot; new vectors are only
/// merged once the whole iteration is computed. Fails with
/// [`PomdpError::NonTerminatingImprove`] when `max_iterations` iterations
/// keep producing new vectors.
pub fn improve<P>(
    backup: &Backup<'_, P>,
    value_function: &ValueFunction<P::State, P::Action>,
    beliefs: &BeliefSet<P::State>,
    max_iterations: usize,
) -> Result<Improvement<P::State, P::Action>>
where
    P: Pomdp + ?Sized,
{
    let mut current = value_function.clone();
    let mut added = 0;

    for iteration in 1..=max_iterations {
        let candidates = backup_all(backup, &current, beliefs)?;
        let candidate_count = candidates.len();
        let fresh = candidates
            .into_iter()
            .map(|alpha| current.insert(alpha))
            .filter(|added| *added)
            .count();

        debug!(
            iteration,
            candidates = candidate_count,
            fresh,
            alphas = current.len(),
            "improve iteration"
        );

        if fresh == 0 {
            return Ok(Improvement {
                value_function: current,
                iterations: iteration,
                added,
            });
        }
        added += fresh;
    }

    Err(PomdpError::NonTerminatingImprove {
        iterations: max_iterations,
    })
}

#[cfg(feature = "parallel")]
fn backup_all<P>(
    backup: &Backup<'_, P>,
    value_function: &ValueFunction<P::State, P::Action>,
    beliefs: &BeliefSet<P::State>,
) -> Result<Vec<AlphaVector<P::State, P::Action>>>
where
    P: Pomdp + ?Sized,
{
    use rayon::prelude::*;

    beliefs
        .as_slice()
        .par_iter()
        .map(|belief| backup.backup(value_function, belief))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn backup_all<P>(
    backup: &Backup<'_, P>,
    value_function: &ValueFunction<P::State, P::Action>,
    beliefs: &BeliefSet<P::State>,
) -> Result<Vec<AlphaVector<P::State, P::Action>>>
where
    P: Pomdp + ?Sized,
{
    beliefs
        .iter()
        .map(|belief| backup.backup(value_function, belief))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pbvi_core::{Belief, DiscreteSpace, ModelPomdp};

    /// One state, reward 2 per step: the fixed point at γ = 0.5 is 4
    fn treadmill() -> impl Pomdp<State = u8, Action = u8, Observation = u8> {
        ModelPomdp::new(
            DiscreteSpace::new(vec![0]).unwrap(),
            DiscreteSpace::new(vec![0]).unwrap(),
            DiscreteSpace::new(vec![0]).unwrap(),
            |_s: &u8, _a: &u8, _next: &u8| 1.0,
            |_s: &u8, _a: &u8, _next: &u8| 2.0,
            |_next: &u8, _a: &u8, _o: &u8| 1.0,
        )
    }

    fn setup(
        pomdp: &impl Pomdp<State = u8, Action = u8, Observation = u8>,
    ) -> (ValueFunction<u8, u8>, BeliefSet<u8>) {
        let seed = ValueFunction::from_vectors([AlphaVector::constant(pomdp.state_space(), 0, 0.0)], 5);
        let beliefs = BeliefSet::new(Belief::uniform(pomdp.state_space()));
        (seed, beliefs)
    }

    #[test]
    fn test_improve_reaches_fixed_point() {
        let pomdp = treadmill();
        let backup = Backup::new(&pomdp, 0.5, 5);
        let (seed, beliefs) = setup(&pomdp);

        let result = improve(&backup, &seed, &beliefs, 100).unwrap();
        assert!(result.added > 0);
        assert_eq!(result.value_function.len(), seed.len() + result.added);
        let value = result.value_function.value(&beliefs.as_slice()[0]).unwrap();
        assert_abs_diff_eq!(value, 4.0, epsilon = 1e-4);
        // the input snapshot is untouched
        assert_eq!(seed.len(), 1);
    }

    #[test]
    fn test_improve_is_idempotent_once_converged() {
        let pomdp = treadmill();
        let backup = Backup::new(&pomdp, 0.5, 5);
        let (seed, beliefs) = setup(&pomdp);

        let first = improve(&backup, &seed, &beliefs, 100).unwrap();
        let second = improve(&backup, &first.value_function, &beliefs, 100).unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.iterations, 1);
        assert_eq!(second.value_function, first.value_function);
    }

    #[test]
    fn test_improve_iteration_cap() {
        let pomdp = treadmill();
        let backup = Backup::new(&pomdp, 0.5, 5);
        let (seed, beliefs) = setup(&pomdp);

        assert!(matches!(
            improve(&backup, &seed, &beliefs, 3),
            Err(PomdpError::NonTerminatingImprove { iterations: 3 })
        ));
    }
}
