//! Farthest-point expansion of the belief set

use tracing::{debug, trace, warn};

use pbvi_core::utils::argmax_first;
use pbvi_core::{Belief, BeliefSet, Pomdp, State};

/// Grow `beliefs` by at most one successor per existing point
///
/// For every point, the feasible successors over all `(action, observation)`
/// pairs are scored by their minimum L1 distance to the input set and the
/// farthest one is appended. Points with no feasible successor contribute
/// nothing. The input points keep their order at the front of the result.
pub fn expand<P>(pomdp: &P, beliefs: &BeliefSet<P::State>) -> BeliefSet<P::State>
where
    P: Pomdp + ?Sized,
{
    let existing = beliefs.as_slice();
    let picks = pick_all(pomdp, existing);

    let mut grown = beliefs.clone();
    for pick in picks.into_iter().flatten() {
        grown.push(pick);
    }
    debug!(before = existing.len(), after = grown.len(), "expanded belief set");
    grown
}

/// Candidate with the greatest minimum L1 distance to `existing`
///
/// Ties keep the earlier candidate. Returns `None` when there are no
/// candidates.
pub fn furthest_belief<'c, S: State>(
    candidates: &'c [Belief<S>],
    existing: &[Belief<S>],
) -> Option<&'c Belief<S>> {
    argmax_first(candidates, |candidate| {
        existing
            .iter()
            .map(|point| point.l1_distance(candidate))
            .fold(f64::INFINITY, f64::min)
    })
    .map(|(_, candidate, _)| candidate)
}

fn successors<P>(pomdp: &P, belief: &Belief<P::State>) -> Vec<Belief<P::State>>
where
    P: Pomdp + ?Sized,
{
    let mut found = Vec::new();
    for action in pomdp.action_space() {
        for observation in pomdp.observation_space() {
            let next = belief.update(pomdp, action, observation);
            if next.is_empty() {
                trace!(?action, ?observation, "impossible successor skipped");
            } else {
                found.push(next);
            }
        }
    }
    found
}

fn pick_one<P>(pomdp: &P, belief: &Belief<P::State>, existing: &[Belief<P::State>]) -> Option<Belief<P::State>>
where
    P: Pomdp + ?Sized,
{
    let candidates = successors(pomdp, belief);
    if candidates.is_empty() {
        warn!(?belief, "belief has no reachable successor");
    }
    furthest_belief(&candidates, existing).cloned()
}

#[cfg(feature = "parallel")]
fn pick_all<P>(pomdp: &P, existing: &[Belief<P::State>]) -> Vec<Option<Belief<P::State>>>
where
    P: Pomdp + ?Sized,
{
    use rayon::prelude::*;

    existing
        .par_iter()
        .map(|belief| pick_one(pomdp, belief, existing))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn pick_all<P>(pomdp: &P, existing: &[Belief<P::State>]) -> Vec<Option<Belief<P::State>>>
where
    P: Pomdp + ?Sized,
{
    existing
        .iter()
        .map(|belief| pick_one(pomdp, belief, existing))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbvi_core::{DiscreteSpace, ModelPomdp};
    use proptest::prelude::*;

    fn belief(pairs: &[(u8, f64)]) -> Belief<u8> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_furthest_belief_max_min_distance() {
        let candidates = [belief(&[(1, 2.0), (3, 5.0)]), belief(&[(1, 4.0), (3, 9.0)])];
        let existing = [belief(&[(1, 1.0), (3, 7.0)]), belief(&[(1, 5.0), (3, 8.0)])];

        let picked = furthest_belief(&candidates, &existing).unwrap();
        assert_eq!(picked, &candidates[0]);
    }

    #[test]
    fn test_furthest_belief_tie_keeps_first() {
        let candidates = [belief(&[(0, 1.0), (1, 0.0)]), belief(&[(0, 0.0), (1, 1.0)])];
        let existing = [belief(&[(0, 0.5), (1, 0.5)])];

        let picked = furthest_belief(&candidates, &existing).unwrap();
        assert_eq!(picked, &candidates[0]);
        assert!(furthest_belief(&[], &existing).is_none());
    }

    /// Two states that swap on "flip"; a noisy sensor reports the state
    fn flipper() -> impl Pomdp<State = u8, Action = &'static str, Observation = u8> {
        ModelPomdp::new(
            DiscreteSpace::new(vec![0, 1]).unwrap(),
            DiscreteSpace::new(vec!["stay", "flip"]).unwrap(),
            DiscreteSpace::new(vec![0, 1]).unwrap(),
            |s: &u8, a: &&'static str, next: &u8| {
                let target = if *a == "flip" { 1 - *s } else { *s };
                if *next == target {
                    1.0
                } else {
                    0.0
                }
            },
            |_s: &u8, _a: &&'static str, _next: &u8| 0.0,
            |next: &u8, _a: &&'static str, o: &u8| if o == next { 0.75 } else { 0.25 },
        )
    }

    #[test]
    fn test_expand_keeps_prefix_and_grows() {
        let pomdp = flipper();
        let start = Belief::uniform(pomdp.state_space());
        let beliefs = BeliefSet::new(start.clone());

        let once = expand(&pomdp, &beliefs);
        assert_eq!(once.len(), 2);
        assert_eq!(once.as_slice()[0], start);

        let twice = expand(&pomdp, &once);
        assert_eq!(twice.len(), 4);
        assert_eq!(&twice.as_slice()[..2], once.as_slice());
        for point in twice.iter() {
            assert!(point.is_normalized(1e-9));
        }
    }

    #[test]
    fn test_expand_skips_points_without_successors() {
        let pomdp = ModelPomdp::new(
            DiscreteSpace::new(vec![0u8]).unwrap(),
            DiscreteSpace::new(vec![0u8]).unwrap(),
            DiscreteSpace::new(vec![0u8]).unwrap(),
            |_s: &u8, _a: &u8, _next: &u8| 1.0,
            |_s: &u8, _a: &u8, _next: &u8| 0.0,
            |_next: &u8, _a: &u8, _o: &u8| 0.0,
        );
        let beliefs = BeliefSet::new(Belief::uniform(pomdp.state_space()));
        assert_eq!(expand(&pomdp, &beliefs).len(), 1);
    }

    /// Three states on a ring; "shift" advances the state, the sensor is noisy
    fn ring() -> impl Pomdp<State = u8, Action = &'static str, Observation = u8> {
        ModelPomdp::new(
            DiscreteSpace::new(vec![0, 1, 2]).unwrap(),
            DiscreteSpace::new(vec!["stay", "shift"]).unwrap(),
            DiscreteSpace::new(vec![0, 1, 2]).unwrap(),
            |s: &u8, a: &&'static str, next: &u8| {
                let target = if *a == "shift" { (*s + 1) % 3 } else { *s };
                if *next == target {
                    1.0
                } else {
                    0.0
                }
            },
            |_s: &u8, _a: &&'static str, _next: &u8| 0.0,
            |next: &u8, _a: &&'static str, o: &u8| if o == next { 0.6 } else { 0.2 },
        )
    }

    fn normalized(weights: (f64, f64, f64)) -> Belief<u8> {
        let (a, b, c) = weights;
        let total = a + b + c;
        [(0, a / total), (1, b / total), (2, c / total)].into_iter().collect()
    }

    proptest! {
        #[test]
        fn prop_expand_keeps_prefix_and_at_most_doubles(
            weights in prop::collection::vec((0.01f64..1.0, 0.01f64..1.0, 0.0f64..1.0), 1..6),
        ) {
            let pomdp = ring();
            let beliefs: BeliefSet<u8> = weights.into_iter().map(normalized).collect();
            let grown = expand(&pomdp, &beliefs);

            prop_assert!(grown.len() >= beliefs.len());
            prop_assert!(grown.len() <= 2 * beliefs.len());
            prop_assert_eq!(&grown.as_slice()[..beliefs.len()], beliefs.as_slice());
            for point in &grown.as_slice()[beliefs.len()..] {
                prop_assert!(point.is_normalized(1e-9));
            }
        }
    }
}
