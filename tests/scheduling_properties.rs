use sched_sim::{
    EntityId, EntityState, HistoryEntry, Policy, PolicyKind, SimConfig, Simulator, Ticks,
    TickOutcome,
};

fn simulator(policy: Policy, units: usize) -> Simulator {
    Simulator::with_policy(policy, units).expect("valid configuration")
}

fn spans(history: &[HistoryEntry]) -> Vec<(EntityId, Ticks, Ticks)> {
    history
        .iter()
        .map(|entry| (entry.entity, entry.start, entry.end.expect("exported entries are closed")))
        .collect()
}

#[test]
fn fcfs_completes_in_arrival_then_id_order() {
    let mut sim = simulator(Policy::Fcfs, 1);
    let first = sim.add_entity(0, 3, 0).unwrap();
    let second = sim.add_entity(0, 2, 0).unwrap();
    sim.run_to_completion(100);

    assert_eq!(sim.entity(first).and_then(|e| e.completion_time), Some(3));
    assert_eq!(sim.entity(second).and_then(|e| e.completion_time), Some(5));
}

#[test]
fn fcfs_ignores_insertion_order_for_arrivals() {
    let mut sim = simulator(Policy::Fcfs, 1);
    let late = sim.add_entity(1, 2, 0).unwrap();
    let early = sim.add_entity(0, 3, 0).unwrap();
    sim.run_to_completion(100);

    assert_eq!(sim.completion_order(), &[early, late]);
    assert_eq!(spans(&sim.export_history()), vec![(early, 0, 3), (late, 3, 5)]);
}

#[test]
fn round_robin_alternates_on_quantum() {
    let mut sim = simulator(Policy::RoundRobin { quantum: 2 }, 1);
    let a = sim.add_entity(0, 4, 0).unwrap();
    let b = sim.add_entity(0, 4, 0).unwrap();
    sim.run_to_completion(100);

    assert_eq!(
        spans(&sim.export_history()),
        vec![(a, 0, 2), (b, 2, 4), (a, 4, 6), (b, 6, 8)]
    );
    // a finishes when its second slice closes; only b runs to t=8
    let first = sim.entity_metrics(a).expect("present");
    assert_eq!(first.completion_time, Some(6));
    assert_eq!(first.turnaround, Some(6));
    assert_eq!(first.waiting, Some(2));

    let second = sim.entity_metrics(b).expect("present");
    assert_eq!(second.completion_time, Some(8));
    assert_eq!(second.turnaround, Some(8));
    assert_eq!(second.waiting, Some(4));
    assert_eq!(sim.completion_order(), &[a, b]);
}

#[test]
fn round_robin_lone_entity_rotates_back_onto_its_unit() {
    let mut sim = simulator(Policy::RoundRobin { quantum: 2 }, 1);
    let only = sim.add_entity(0, 3, 0).unwrap();
    sim.run_to_completion(100);

    assert_eq!(spans(&sim.export_history()), vec![(only, 0, 2), (only, 2, 3)]);
}

#[test]
fn srtf_short_arrival_preempts_long_job() {
    let mut sim = simulator(Policy::Sjf { preemptive: true }, 1);
    let a = sim.add_entity(0, 5, 0).unwrap();
    let b = sim.add_entity(2, 2, 0).unwrap();

    sim.tick();
    sim.tick();
    assert_eq!(sim.entity(a).map(|e| e.remaining_work), Some(3));

    sim.run_to_completion(100);
    assert_eq!(spans(&sim.export_history()), vec![(a, 0, 2), (b, 2, 4), (a, 4, 7)]);
    assert_eq!(sim.entity(b).and_then(|e| e.completion_time), Some(4));
    assert_eq!(sim.entity(a).and_then(|e| e.completion_time), Some(7));
    assert_eq!(sim.entity_metrics(a).and_then(|m| m.response), Some(0));
    assert_eq!(sim.entity_metrics(a).and_then(|m| m.waiting), Some(2));
}

#[test]
fn sjf_non_preemptive_lets_running_job_finish() {
    let mut sim = simulator(Policy::Sjf { preemptive: false }, 1);
    let a = sim.add_entity(0, 5, 0).unwrap();
    let b = sim.add_entity(2, 2, 0).unwrap();
    let c = sim.add_entity(1, 3, 0).unwrap();
    sim.run_to_completion(100);

    assert_eq!(sim.completion_order(), &[a, b, c]);
}

#[test]
fn reset_keeps_entities_and_clears_history() {
    let mut sim = simulator(Policy::RoundRobin { quantum: 1 }, 2);
    let ids: Vec<_> = (0..3).map(|i| sim.add_entity(i, 3, 0).unwrap()).collect();
    sim.run_to_completion(4);
    sim.reset(true);

    assert!(sim.export_history().is_empty());
    assert_eq!(sim.now(), 0);
    assert!(sim.completion_order().is_empty());
    for id in ids {
        let entity = sim.entity(id).expect("kept");
        assert_eq!(entity.state, EntityState::Waiting);
        assert_eq!(entity.remaining_work, entity.service_time);
        assert_eq!(entity.start_time, None);
        assert_eq!(entity.completion_time, None);
    }
    assert!(sim.units().iter().all(|unit| unit.current.is_none()));
}

#[test]
fn reset_without_entities_empties_the_simulation() {
    let mut sim = simulator(Policy::Fcfs, 1);
    sim.add_entity(0, 3, 0).unwrap();
    sim.tick();
    sim.reset(false);

    assert_eq!(sim.entities().count(), 0);
    assert_eq!(sim.tick(), TickOutcome::AlreadyComplete);
    assert_eq!(sim.add_entity(0, 1, 0).unwrap(), 1);
}

#[test]
fn rerun_after_reset_reproduces_history() {
    let mut sim = simulator(Policy::Priority { preemptive: true }, 2);
    for (arrival, service, priority) in [(0, 4, 3), (1, 3, 1), (2, 2, 0), (2, 5, 2)] {
        sim.add_entity(arrival, service, priority).unwrap();
    }
    sim.run_to_completion(100);
    let first = sim.export_history();

    sim.reset(true);
    sim.run_to_completion(100);
    assert_eq!(sim.export_history(), first);
}

#[test]
fn empty_simulation_does_not_advance() {
    let mut sim = simulator(Policy::Fcfs, 1);
    assert_eq!(sim.tick(), TickOutcome::AlreadyComplete);
    assert_eq!(sim.now(), 0);
}

#[test]
fn finished_simulation_is_a_no_op() {
    let mut sim = simulator(Policy::Fcfs, 1);
    sim.add_entity(0, 1, 0).unwrap();
    sim.run_to_completion(10);
    let before = sim.snapshot();

    assert!(sim.tick().is_complete());
    assert_eq!(sim.snapshot(), before);
}

#[test]
fn idle_ticks_advance_time_before_any_arrival() {
    let mut sim = simulator(Policy::Fcfs, 1);
    sim.add_entity(2, 1, 0).unwrap();

    assert!(!sim.tick().is_complete());
    assert!(!sim.tick().is_complete());
    assert_eq!(sim.now(), 2);
    assert_eq!(sim.snapshot().waiting().count(), 1);
}

#[test]
fn metrics_are_undefined_until_finished() {
    let mut sim = simulator(Policy::Fcfs, 1);
    let a = sim.add_entity(0, 2, 0).unwrap();
    let b = sim.add_entity(0, 2, 0).unwrap();
    sim.tick();
    sim.tick();

    let report = sim.metrics();
    assert_eq!(report.finished, 1);
    assert_eq!(report.total, 2);
    assert!((report.completion_ratio - 0.5).abs() < f64::EPSILON);
    assert_eq!(report.mean_turnaround, Some(2.0));
    assert_eq!(sim.entity_metrics(a).and_then(|m| m.turnaround), Some(2));
    assert_eq!(sim.entity_metrics(b).and_then(|m| m.turnaround), None);

    sim.run_to_completion(10);
    let report = sim.metrics();
    assert_eq!(report.mean_turnaround, Some(3.0));
    assert_eq!(report.mean_waiting, Some(1.0));
    assert_eq!(report.mean_response, Some(1.0));
    assert_eq!(report.utilization, vec![1.0]);
}

#[test]
fn snapshot_partitions_entities_by_state() {
    let mut sim = simulator(Policy::Fcfs, 1);
    sim.add_entity(0, 1, 0).unwrap();
    sim.add_entity(0, 3, 0).unwrap();
    sim.add_entity(0, 3, 0).unwrap();
    sim.add_entity(9, 3, 0).unwrap();
    sim.tick();

    let TickOutcome::Advanced(report) = sim.tick() else {
        panic!("entities are pending");
    };
    let snapshot = &report.snapshot;
    assert_eq!(snapshot.finished().count(), 1);
    assert_eq!(snapshot.running().count(), 1);
    assert_eq!(snapshot.ready().count(), 1);
    assert_eq!(snapshot.waiting().count(), 1);
    assert_eq!(snapshot.history.iter().filter(|e| e.is_open()).count(), 1);

    let json = snapshot.to_json().expect("serializable");
    assert!(json.contains("\"Running\""));
}

#[test]
fn configuration_from_json_drives_simulator() {
    let config = SimConfig::from_json(r#"{ "policy": "rr", "quantum": 3, "unit_count": 2 }"#)
        .expect("valid json");
    assert_eq!(config.policy, PolicyKind::RoundRobin);

    let sim = Simulator::new(&config).expect("valid configuration");
    assert_eq!(sim.policy(), Policy::RoundRobin { quantum: 3 });
    assert_eq!(sim.unit_count(), 2);
}
