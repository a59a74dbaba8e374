use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use vml_models::io::read_dataset;
use vml_models::models::factory::{build_model, BuiltModel};
use vml_models::Dataset;

use super::input::TrainConfig;
use super::output::{collect_predictions, log_metrics, write_curves, write_predictions};

/// Training curve and final score of one restart.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub restart: usize,
    pub seed: u64,
    /// `(step, training score)` pairs; step 0 is the freshly initialized model.
    pub curve: Vec<(usize, f64)>,
    /// Last training score, `None` for batch models.
    pub final_score: Option<f64>,
}

pub struct TrainOutcome {
    pub best: BuiltModel,
    pub best_run: RunSummary,
    pub runs: Vec<RunSummary>,
}

/// Each restart gets its own model and an RNG seeded with `seed + restart`.
pub fn run_once(
    config: &TrainConfig,
    data: &Dataset,
    restart: usize,
) -> Result<(BuiltModel, RunSummary)> {
    let seed = config.seed.wrapping_add(restart as u64);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut built = build_model(&config.model, data, &mut rng)
        .with_context(|| format!("Failed to build {}", config.model.model_type.name()))?;

    let mut curve = Vec::new();
    match &mut built {
        BuiltModel::Iterative(model) => {
            let interval = config.log_interval.max(1);
            curve.push((0, model.training_score()?));
            for step in 1..=config.steps {
                model
                    .step(&mut rng)
                    .with_context(|| format!("Restart {} failed at step {}", restart, step))?;
                if step % interval == 0 || step == config.steps {
                    let score = model.training_score()?;
                    log::debug!("restart {} step {}: score {}", restart, step, score);
                    curve.push((step, score));
                }
            }
        }
        BuiltModel::Batch(model) => {
            model
                .fit()
                .with_context(|| format!("Restart {} failed to fit", restart))?;
        }
    }

    let final_score = match &built {
        BuiltModel::Iterative(_) => curve.last().map(|&(_, score)| score),
        BuiltModel::Batch(_) => None,
    };
    Ok((
        built,
        RunSummary {
            restart,
            seed,
            curve,
            final_score,
        },
    ))
}

/// Index of the run with the best final score. NaN scores never win.
pub fn select_best(runs: &[RunSummary], higher_is_better: bool) -> usize {
    let mut best = 0;
    for (i, run) in runs.iter().enumerate().skip(1) {
        let Some(score) = run.final_score.filter(|s| !s.is_nan()) else {
            continue;
        };
        let better = match runs[best].final_score.filter(|s| !s.is_nan()) {
            None => true,
            Some(current) if higher_is_better => score > current,
            Some(current) => score < current,
        };
        if better {
            best = i;
        }
    }
    best
}

pub fn run_training(config: &TrainConfig) -> Result<TrainOutcome> {
    if config.restarts == 0 {
        anyhow::bail!("restarts must be at least 1");
    }
    let data = read_dataset(&config.train_data)?;
    log::info!("Loaded {} from {}", data.summary(), config.train_data);

    let results: Vec<(BuiltModel, RunSummary)> = (0..config.restarts)
        .into_par_iter()
        .map(|restart| run_once(config, &data, restart))
        .collect::<Result<Vec<_>>>()?;

    let (models, runs): (Vec<BuiltModel>, Vec<RunSummary>) = results.into_iter().unzip();
    let higher_is_better = match models.first() {
        Some(BuiltModel::Iterative(model)) => model.higher_is_better(),
        _ => true,
    };
    let best_idx = select_best(&runs, higher_is_better);
    let best_run = runs
        .get(best_idx)
        .cloned()
        .context("No training run produced a summary")?;
    let best = models
        .into_iter()
        .nth(best_idx)
        .context("No training run produced a model")?;

    match best_run.final_score {
        Some(score) => log::info!(
            "Best of {} restart(s): restart {} (seed {}) with training score {}",
            runs.len(),
            best_run.restart,
            best_run.seed,
            score
        ),
        None => log::info!("Fitted {}", best.name()),
    }

    let predictions = collect_predictions(&best, &data)?;
    log_metrics(&predictions, &data)?;
    write_predictions(&config.output_file, &data, &predictions)?;
    log::info!("Predictions written to {}", config.output_file);

    if let Some(curve_file) = &config.curve_file {
        write_curves(curve_file, &runs)?;
        log::info!("Training curves written to {}", curve_file);
    }

    Ok(TrainOutcome {
        best,
        best_run,
        runs,
    })
}
