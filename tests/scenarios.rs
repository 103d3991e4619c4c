use ddr_sim::optimal::{GoodLpSolver, SolverOptions, optimal_utilization};
use ddr_sim::routing::{Action, RoutingScheme, utilization};
use ddr_sim::{DdrEnv, DdrError, DemandMatrix, DemandModel, EnvConfig, EnvState, GeneratorSpec, Network};
use proptest::prelude::*;

fn pair() -> Network {
    let mut net = Network::new("pair", 2);
    net.add_link(0, 1, 10.0).unwrap();
    net
}

fn triangle() -> Network {
    let mut net = Network::new("triangle", 3);
    net.add_link(0, 1, 10.0).unwrap();
    net.add_link(1, 2, 10.0).unwrap();
    net.add_link(0, 2, 10.0).unwrap();
    net
}

fn mesh(n:usize) -> Network {
    let mut net = Network::new("mesh", n);
    for a in 0..n {
        for b in a+1..n {
            net.add_link(a, b, 10.0).unwrap();
        }
    }
    net
}

// every node sends straight over its edge to the destination
fn direct_splitting(net:&Network) -> Action {
    let ratios = (0..net.node_count()).map(|destination| {
        net.edges().iter()
            .map(|e| if e.target == destination {1.0} else {0.0})
            .collect()
    }).collect();
    Action::Splitting(ratios)
}

fn replay(matrices:Vec<DemandMatrix>) -> GeneratorSpec {
    let n = matrices[0].node_count();
    GeneratorSpec::new(n, DemandModel::Replay { matrices, cycle: true })
}

#[test]
fn shared_link_is_optimal() {
    let net = pair();
    let demand = DemandMatrix::from_rows(&[[0.0,5.0],[5.0,0.0]]).unwrap();
    let mut env = DdrEnv::new(net, replay(vec![demand]), 1, RoutingScheme::default()).unwrap();
    env.reset().unwrap();
    let action = direct_splitting(env.network());
    let step = env.step(&action).unwrap();
    assert!((step.info.utilization - 1.0).abs() < 1e-9);
    assert!((step.info.opt_utilization - 1.0).abs() < 1e-6);
    assert!((step.reward + 1.0).abs() < 1e-6);
}

#[test]
fn over_capacity_is_infeasible() {
    let net = pair();
    let demand = DemandMatrix::from_rows(&[[0.0,20.0],[0.0,0.0]]).unwrap();
    let err = optimal_utilization(&net, &demand, &GoodLpSolver, &SolverOptions::default()).unwrap_err();
    assert!(matches!(err,DdrError::InfeasibleDemand{..}));

    // the same failure surfaces from step, with the window left alone
    let mut env = DdrEnv::new(net, replay(vec![demand]), 2, RoutingScheme::default()).unwrap();
    env.reset().unwrap();
    let action = direct_splitting(env.network());
    assert!(matches!(env.step(&action),Err(DdrError::InfeasibleDemand{..})));
    assert_eq!(env.memory().len(),1);

    // without hard capacities the optimum is simply an overload
    let opt = optimal_utilization(env.network(), &DemandMatrix::from_rows(&[[0.0,20.0],[0.0,0.0]]).unwrap(),
        &GoodLpSolver, &SolverOptions { enforce_capacity: false }).unwrap();
    assert!((opt - 2.0).abs() < 1e-6);
}

#[test]
fn splitting_beats_single_path() {
    let net = triangle();
    let demand = DemandMatrix::from_rows(&[
        [0.0,0.0,10.0],
        [0.0,0.0,0.0],
        [0.0,0.0,0.0],
    ]).unwrap();
    let opt = optimal_utilization(&net, &demand, &GoodLpSolver, &SolverOptions::default()).unwrap();
    assert!((opt - 0.5).abs() < 1e-6);

    let mut env = DdrEnv::new(net, replay(vec![demand]), 1, RoutingScheme::default()).unwrap();
    env.reset().unwrap();
    let action = direct_splitting(env.network());
    let step = env.step(&action).unwrap();
    assert!((step.info.utilization - 1.0).abs() < 1e-9);
    assert!(-step.reward > 1.0);
    assert!((step.reward + 2.0).abs() < 1e-5);
    // hop count ECMP also takes the direct edge only
    assert!((step.info.oblivious_utilization - 1.0).abs() < 1e-9);
}

#[test]
fn memory_is_bounded_and_reset_to_one() {
    let config = EnvConfig::from_json(r#"{
        "memory_length": 3,
        "generator": {"shape": [4, 4], "kind": "uniform", "seed": 5, "low": 0.0, "high": 1.0},
        "routing": {"kind": "softmin"}
    }"#).unwrap();
    let mut env = DdrEnv::from_config(mesh(4), &config).unwrap();
    assert_eq!(env.reset().unwrap().len(),1);
    let action = Action::EdgeWeights(vec![1.0;env.network().edge_count()]);
    for i in 0..6 {
        let step = env.step(&action).unwrap();
        assert_eq!(step.observation.len(),(i + 2).min(3));
        assert!(step.reward <= -1.0 + 1e-6);
        assert_eq!(env.state(),EnvState::Stepping);
    }
    assert_eq!(env.observation().len(),3*4*4);
    assert_eq!(env.reset().unwrap().len(),1);
    assert_eq!(env.state(),EnvState::Ready);
}

#[test]
fn reset_replays_the_seeded_sequence() {
    let spec = GeneratorSpec::new(3, DemandModel::Gravity {
        seed: 42, total_demand: 12.0, masses: None, distances: None,
    });
    let mut env = DdrEnv::new(mesh(3), spec, 4, RoutingScheme::softmin()).unwrap();
    let action = Action::EdgeWeights(vec![1.0;env.network().edge_count()]);
    let run = |env:&mut DdrEnv| {
        env.reset().unwrap();
        for _ in 0..3 {
            env.step(&action).unwrap();
        }
        env.memory().snapshot()
    };
    let first = run(&mut env);
    let second = run(&mut env);
    assert_eq!(first,second);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn optimum_never_exceeds_softmin(
        weights in proptest::collection::vec(0.1f64..10.0, 12),
        gamma in 0.1f64..5.0,
        seed in any::<u64>(),
    ) {
        let net = mesh(4);
        let scheme = RoutingScheme::Softmin { gamma };
        let routing = scheme.resolve(&Action::EdgeWeights(weights), &net).unwrap();
        let mut sequence = GeneratorSpec::new(4, DemandModel::Uniform { seed, low: 0.0, high: 5.0 })
            .build()
            .unwrap();
        let demand = sequence.next().unwrap();
        let actual = utilization(&net, &demand, &routing).unwrap();
        let opt = optimal_utilization(&net, &demand, &GoodLpSolver, &SolverOptions { enforce_capacity: false }).unwrap();
        prop_assert!(opt <= actual.max + 1e-6);
    }
}
