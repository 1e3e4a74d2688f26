//! Parallel per-station trigger stage.
//!
//! Every station with both a template and continuous data becomes one task
//! on a dedicated rayon pool. Tasks only read the shared inputs; each owns
//! the trace it produces. The call returns once every task has finished.

use std::time::Instant;

use anyhow::Context;
use rayon::prelude::*;
use tracing::info;

use crate::stream::{ContinuousStream, StationStream};
use crate::template::{StationTemplate, TemplateSet};

use super::mask::mask_cc;
use super::shift::station_shifted_cc;
use super::{StationTrace, TriggerConfig};

/// Combine, align and mask the correlation of every station.
///
/// Stations missing from `streams` are skipped. Results follow the order
/// of `templates`. If any station fails, the first failure in that order is
/// returned and no traces are.
pub fn calc_masked_cc(
    templates: &TemplateSet,
    streams: &ContinuousStream,
    config: &TriggerConfig,
) -> anyhow::Result<Vec<StationTrace>> {
    config.validate()?;
    let t0 = Instant::now();

    let jobs: Vec<(&StationTemplate, &StationStream)> = templates
        .iter()
        .filter_map(|t| streams.get(&t.station).map(|s| (t, s)))
        .collect();
    if jobs.is_empty() {
        info!("No station of {} templates has continuous data", templates.len());
        return Ok(Vec::new());
    }

    let num_workers = config
        .max_workers
        .map_or(jobs.len(), |cap| cap.min(jobs.len()));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build worker pool: {}", e))?;

    let results: Vec<anyhow::Result<StationTrace>> = pool.install(|| {
        jobs.par_iter()
            .map(|&(template, stream)| process_station(template, stream, config))
            .collect()
    });

    let mut traces = Vec::with_capacity(results.len());
    for result in results {
        let trace = result?;
        info!("{} {} trigs", trace.station, trace.num_triggers);
        traces.push(trace);
    }
    info!(
        "process {} stations | time {:.2}s",
        traces.len(),
        t0.elapsed().as_secs_f64()
    );
    Ok(traces)
}

/// Combiner then masker for one station.
pub fn process_station(
    template: &StationTemplate,
    stream: &StationStream,
    config: &TriggerConfig,
) -> anyhow::Result<StationTrace> {
    let shifted = station_shifted_cc(template, stream, &config.layout)
        .with_context(|| format!("correlating station {}", template.station))?;
    let masked = mask_cc(shifted, config.trig_thres, config.mask_len);
    Ok(StationTrace {
        station: template.station.clone(),
        trace: masked.trace,
        num_triggers: masked.num_peaks,
    })
}
