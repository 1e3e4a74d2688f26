//! Text catalog output.
//!
//! Two streams are written per template scan:
//!
//! - the **event catalog**, one line per detection:
//!   `origin_time,latitude,longitude,depth,peak_cc`
//! - the **phase file**, the same event line followed by one line per pick:
//!   `station,p_time,s_time,s_amplitude,p_cc,s_cc`
//!
//! Times are ISO-8601 UTC with microseconds. Correlations carry three
//! decimals, amplitudes two.

use std::io::Write;

use anyhow::Context;

use crate::detector::{DetectedEvent, Detection, Pick};
use crate::template::Hypocenter;
use crate::time::format_time;

/// Shortest round-trip rendering, keeping a `.0` on integral values.
fn fmt_coord(v: f64) -> String {
    format!("{:?}", v)
}

/// Event line, newline-terminated.
pub fn catalog_line(detection: &Detection, hypocenter: &Hypocenter) -> String {
    format!(
        "{},{},{},{},{:.3}\n",
        format_time(detection.origin_time),
        fmt_coord(hypocenter.latitude),
        fmt_coord(hypocenter.longitude),
        fmt_coord(hypocenter.depth),
        detection.peak_cc
    )
}

/// Phase line of one pick, newline-terminated.
pub fn pick_line(pick: &Pick) -> String {
    format!(
        "{},{},{},{:.2},{:.3},{:.3}\n",
        pick.station,
        format_time(pick.p_time),
        format_time(pick.s_time),
        pick.s_amplitude,
        pick.p_cc,
        pick.s_cc
    )
}

/// Append one detected event to the catalog and phase outputs.
pub fn write_det_ppk<C: Write, P: Write>(
    catalog: &mut C,
    phase: &mut P,
    event: &DetectedEvent,
    hypocenter: &Hypocenter,
) -> anyhow::Result<()> {
    let event_line = catalog_line(&event.detection, hypocenter);
    catalog
        .write_all(event_line.as_bytes())
        .context("writing event catalog")?;
    phase
        .write_all(event_line.as_bytes())
        .context("writing phase file")?;
    for pick in &event.picks {
        phase
            .write_all(pick_line(pick).as_bytes())
            .context("writing phase file")?;
    }
    Ok(())
}
