use crate::generator::scene::{observers_along, observers_in_field, random_targets};
use crate::generator::Simulator;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use std::path::Path;
use trackcore::analysis::{assignment_cost, sightings_to_targets, EmDriver};
use trackcore::{Sighting, Target, TargetRecord};

pub struct WorkflowResult {
    pub ground_truth: Vec<Target>,
    pub sightings: Vec<Sighting>,
    pub estimates: Vec<Target>,
    /// Number of sightings assigned to each estimate, in estimate order.
    pub assignment_counts: Vec<usize>,
    /// Sum of sighting-to-estimate distances in meters.
    pub assignment_cost: f64,
}

/// JSON summary written by offline runs.
#[derive(Debug, Serialize)]
pub struct WorkflowReport {
    pub seed: Option<u64>,
    pub sighting_count: usize,
    pub ground_truth: Vec<TargetRecord>,
    pub estimates: Vec<TargetRecord>,
    pub assignment_counts: Vec<usize>,
    pub assignment_cost: f64,
}

impl WorkflowResult {
    pub fn report(&self, seed: Option<u64>) -> WorkflowReport {
        WorkflowReport {
            seed,
            sighting_count: self.sightings.len(),
            ground_truth: self.ground_truth.iter().map(TargetRecord::from).collect(),
            estimates: self.estimates.iter().map(TargetRecord::from).collect(),
            assignment_counts: self.assignment_counts.clone(),
            assignment_cost: self.assignment_cost,
        }
    }
}

impl WorkflowReport {
    pub fn write<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing workflow report")?;
        fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Generator for this run, seeded from the config when a seed is set.
    pub fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Builds the ground-truth targets and observers and simulates sightings.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> anyhow::Result<Simulator> {
        let cfg = &self.config;
        let mut targets = cfg
            .targets
            .iter()
            .cloned()
            .map(Target::try_from)
            .collect::<Result<Vec<_>, _>>()
            .context("building configured targets")?;
        let window = targets
            .iter()
            .map(Target::duration)
            .fold(0.0, f64::max);
        targets.extend(
            random_targets(&cfg.field, cfg.random_targets, cfg.waypoints, window, rng)
                .context("generating random targets")?,
        );

        let mut observers = Vec::new();
        for target in &targets {
            observers.extend(observers_along(
                target.path(),
                cfg.observers_per_segment,
                cfg.radius,
                cfg.observer_jitter,
                rng,
            ));
        }
        observers.extend(observers_in_field(
            &cfg.field,
            cfg.field_observers,
            cfg.radius,
            rng,
        ));

        Ok(Simulator::new(
            targets,
            observers,
            cfg.field,
            cfg.bearing_noise,
            rng,
        ))
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let mut rng = self.rng();
        let simulator = self.simulate(&mut rng)?;
        let sightings = simulator.sightings().to_vec();

        let estimates = EmDriver::from_config(&self.config.analysis)
            .run(&sightings, &mut rng)
            .context("running expectation maximization")?;

        let (assignment_counts, cost) = if estimates.is_empty() {
            (Vec::new(), 0.0)
        } else {
            let mut counts = vec![0usize; estimates.len()];
            for idx in sightings_to_targets(&sightings, &estimates)? {
                counts[idx] += 1;
            }
            (counts, assignment_cost(&sightings, &estimates)?)
        };
        info!(
            "workflow fitted {} segments to {} sightings (cost {:.1} m)",
            estimates.len(),
            sightings.len(),
            cost
        );

        Ok(WorkflowResult {
            ground_truth: simulator.targets().to_vec(),
            sightings,
            estimates,
            assignment_counts,
            assignment_cost: cost,
        })
    }
}
