//! The JSON Tiger definition solves like the built-in one

use pbvi_core::{Belief, Pomdp, TabularPomdp};
use pbvi_solver::{PbviConfig, PbviSolver};

const TIGER_JSON: &str = include_str!("../../../problems/tiger.json");
const CONFIG_JSON: &str = include_str!("../../../problems/tiger-config.json");

fn belief(left: f64) -> Belief<String> {
    [("tiger-left".to_string(), left), ("tiger-right".to_string(), 1.0 - left)]
        .into_iter()
        .collect()
}

#[test]
fn tabular_tiger_policy() {
    let tiger = TabularPomdp::from_json_str(TIGER_JSON).unwrap();
    assert_eq!(tiger.state_space().len(), 2);
    assert_eq!(tiger.action_space().len(), 3);

    let config: PbviConfig = serde_json::from_str(CONFIG_JSON).unwrap();
    assert_eq!(config.discount, 0.5);
    assert_eq!(config.max_improve_iterations, PbviConfig::default().max_improve_iterations);

    let solver = PbviSolver::with_pessimistic_seed(&tiger, config, "listen".to_string()).unwrap();
    assert_eq!(solver.solve(&belief(0.5)).unwrap(), "listen");
    assert_eq!(solver.solve(&belief(0.95)).unwrap(), "open-right");
}
