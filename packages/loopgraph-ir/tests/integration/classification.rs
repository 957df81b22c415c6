// Classifier regressions seen through the whole pipeline: bitwise
// reductions and the control-edge policy for SCC independence

#[path = "../common/mod.rs"]
mod common;
use common::{
    quiet_config, rejection, scc_containing, single_loop, spin_loop, two_update_loop, LoopFixture,
};

use loopgraph_ir::config::ControlEdgePolicy;
use loopgraph_ir::features::scc_classifier::SccType;
use loopgraph_ir::features::technique_selection::{DisqualifyingReason, Technique};
use loopgraph_ir::shared::models::BinaryOp;
use loopgraph_ir::{analyze_function, Collaborators};
use pretty_assertions::assert_eq;

#[test]
fn test_same_bitwise_updates_have_reducible_evolution() {
    for op in [BinaryOp::And, BinaryOp::Or, BinaryOp::Xor] {
        let (f, [acc, u1, u2]) = two_update_loop("bits", op, op);
        let fixture = LoopFixture::new(f);
        let config = quiet_config();
        let content = fixture.content(&Collaborators::default(), &config);

        let id = content.sccdag.scc_of_value(acc).unwrap();
        assert_eq!(content.sccdag.scc_of_value(u1), Some(id));
        assert_eq!(content.sccdag.scc_of_value(u2), Some(id));
        assert!(content.attrs.has_reducible_evolution(id), "{:?}", op);
    }
}

#[test]
fn test_mixed_bitwise_updates_are_not_reducible() {
    let pairs = [
        (BinaryOp::And, BinaryOp::Or),
        (BinaryOp::Or, BinaryOp::And),
        (BinaryOp::Or, BinaryOp::Xor),
        (BinaryOp::Xor, BinaryOp::And),
    ];
    for (a, b) in pairs {
        let (f, [acc, ..]) = two_update_loop("bits", a, b);
        let fixture = LoopFixture::new(f);
        let config = quiet_config();
        let content = fixture.content(&Collaborators::default(), &config);

        let id = content.sccdag.scc_of_value(acc).unwrap();
        assert!(!content.attrs.has_reducible_evolution(id), "{:?}/{:?}", a, b);
        assert_eq!(content.attrs.scc_type(id), Some(SccType::Sequential));
    }
}

#[test]
fn test_bitwise_live_out_is_not_reducible_for_doall() {
    let (f, [acc, _, u2]) = two_update_loop("bits", BinaryOp::And, BinaryOp::Or);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);
    assert!(!scc_containing(lp, acc).is_reducible);
    assert_eq!(
        rejection(lp, Technique::Doall),
        DisqualifyingReason::LiveOutNotReducible { value: u2 }
    );
}

#[test]
fn test_reducible_bitwise_live_out_keeps_doall() {
    let (f, [acc, _, u2]) = two_update_loop("bits", BinaryOp::And, BinaryOp::And);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);

    let update = scc_containing(lp, acc);
    assert!(update.members.contains(&u2));
    assert_eq!(update.scc_type, SccType::Sequential);
    assert!(update.is_reducible);
    assert_eq!(lp.technique, Some(Technique::Doall));

    let (f, _) = two_update_loop("bits", BinaryOp::And, BinaryOp::Or);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    assert_ne!(single_loop(&plan).technique, Some(Technique::Doall));
}

#[test]
fn test_control_policy_decides_independence() {
    let (f, br) = spin_loop("spin");

    let ignore = quiet_config()
        .classifier(|c| c.independence_control_policy(ControlEdgePolicy::IgnoreControl));
    let plan = analyze_function(&f, &Collaborators::default(), &ignore).unwrap();
    let scc = scc_containing(single_loop(&plan), br);
    assert_eq!(scc.scc_type, SccType::Independent);

    let include = quiet_config()
        .classifier(|c| c.independence_control_policy(ControlEdgePolicy::IncludeControl));
    let plan = analyze_function(&f, &Collaborators::default(), &include).unwrap();
    let scc = scc_containing(single_loop(&plan), br);
    assert_eq!(scc.scc_type, SccType::Sequential);
    assert!(scc.is_clonable);
}

#[test]
fn test_default_policy_ignores_control() {
    assert_eq!(
        quiet_config().classifier.independence_control_policy,
        ControlEdgePolicy::IgnoreControl
    );
}
