//! One template set against one day of network data, end to end.

use tracing::info;

use crate::amplitude::AmplitudeEstimator;
use crate::stream::ContinuousStream;
use crate::template::TemplateSet;

use super::driver::calc_masked_cc;
use super::pick::ppk_cc;
use super::stack::{detect_stack, stack_traces};
use super::{Detection, Pick, ScanConfig};

/// A network detection together with its per-station phase picks.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedEvent {
    pub detection: Detection,
    pub picks: Vec<Pick>,
}

/// Trigger, stack, detect and pick.
///
/// The day start of the stack is taken from the first template station
/// that has continuous data; all streams are expected to share it. No
/// overlapping station gives no events.
pub fn scan_template<A: AmplitudeEstimator + ?Sized>(
    templates: &TemplateSet,
    streams: &ContinuousStream,
    config: &ScanConfig,
    picker: &A,
) -> anyhow::Result<Vec<DetectedEvent>> {
    config.validate()?;

    let Some(day_start) = templates
        .iter()
        .find_map(|t| streams.get(&t.station))
        .map(|s| s.day_start)
    else {
        info!("no continuous data for any of {} template stations", templates.len());
        return Ok(Vec::new());
    };

    let traces = calc_masked_cc(templates, streams, &config.trigger)?;
    let cc_stack = stack_traces(&traces)?;
    let detections = detect_stack(
        &cc_stack,
        &config.stack,
        day_start,
        config.trigger.layout.sample_rate,
    );

    let events: Vec<DetectedEvent> = detections
        .into_iter()
        .map(|detection| DetectedEvent {
            picks: ppk_cc(detection.origin_time, templates, streams, &config.pick, picker),
            detection,
        })
        .collect();

    info!(
        "{} stations | {} detections | {} picks",
        traces.len(),
        events.len(),
        events.iter().map(|e| e.picks.len()).sum::<usize>()
    );
    Ok(events)
}
