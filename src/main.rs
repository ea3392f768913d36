use average::Estimate;
use sched_sim::{SchedEvent, Sim, SimConfig, TickOutcome, sim::workload::Workload};
use std::{env, error::Error, fs};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Optional JSON config path, e.g. {"policy": "sjf", "preemptive": true, "unit_count": 2}
    let config = match env::args().nth(1) {
        Some(path) => SimConfig::from_json(&fs::read_to_string(path)?)?,
        None => SimConfig::for_policy("rr")?.with_units(2),
    };
    let num_units = config.unit_count;
    let jobs = Workload::default().generate(0);
    let mut sim = Sim::new(jobs, &config)?;
    println!("policy: {}", sim.core.policy().name());

    let mut current_idle = vec![0; num_units];
    let mut max_idle = 0;

    while !sim.all_jobs_completed() {
        let TickOutcome::Advanced(report) = sim.step()? else {
            break;
        };

        let mut got_idle = vec![false; num_units];
        for event in &report.events {
            println!("t={} {:?}", report.time, event);

            if let SchedEvent::UnitIdle { unit } = event {
                got_idle[*unit] = true;
            }
        }

        for unit in 0..num_units {
            if got_idle[unit] {
                current_idle[unit] += 1;
                max_idle = max_idle.max(current_idle[unit]);
            } else {
                current_idle[unit] = 0;
            }
        }
    }

    let response_times = sim.jobs_map(|j| (j.start_time.unwrap_or(0) - j.job.arrival_time) as f64);
    let turnaround_times =
        sim.jobs_map(|j| (j.completion_time.unwrap_or(0) - j.job.arrival_time) as f64);
    let waiting_times = sim.jobs_map(|j| {
        (j.completion_time.unwrap_or(0) - j.job.arrival_time - j.job.run_time) as f64
    });

    println!("Average response time: {:.2} ticks", avg(response_times));
    println!("Average turnaround time: {:.2} ticks", avg(turnaround_times));
    println!("Average waiting time: {:.2} ticks", avg(waiting_times));
    println!("Longest idle period: {max_idle} ticks");

    let metrics = sim.core.metrics();
    for (unit, utilization) in metrics.utilization.iter().enumerate() {
        println!("Unit {unit} utilization: {:.1}%", utilization * 100.0);
    }

    Ok(())
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<average::Mean>().estimate()
}
