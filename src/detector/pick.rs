//! P/S arrival refinement and S amplitude for one detection.
//!
//! For each station the template's travel times predict where the phases
//! of the detected event should arrive. A window around each prediction,
//! widened by the mask length to absorb the plateau uncertainty of the
//! detection, is correlated against the template: the vertical trigger
//! channel for P, the two horizontal S channels for S.

use tracing::{debug, warn};

use crate::amplitude::AmplitudeEstimator;
use crate::correlate::{argmax, calc_cc, max_value, KernelNorms};
use crate::stream::ContinuousStream;
use crate::template::TemplateSet;

use super::{Pick, PickConfig};

/// Refine phase arrivals of the event detected at `det_ot` on every station.
///
/// Stations without continuous data are skipped. The first station whose
/// P or S window does not cut exactly three channels ends picking for this
/// detection: the remaining stations are not visited.
pub fn ppk_cc<A: AmplitudeEstimator + ?Sized>(
    det_ot: f64,
    templates: &TemplateSet,
    streams: &ContinuousStream,
    config: &PickConfig,
    picker: &A,
) -> Vec<Pick> {
    let sr = config.sample_rate;
    let mask_secs = config.mask_secs();
    let p_rng = [config.win_p[0] + mask_secs, config.win_p[1] + mask_secs];
    let s_rng = [
        config.win_s[0] + 2.0 * mask_secs,
        config.win_s[1] + 2.0 * mask_secs,
    ];

    let mut picks = Vec::new();
    for template in templates {
        let Some(stream) = streams.get(&template.station) else {
            continue;
        };

        let tp0 = det_ot + template.p_delay();
        let ts0 = det_ot + template.s_delay();

        let st_p = stream.waveforms.slice(tp0 - p_rng[0], tp0 + p_rng[1]);
        let st_s = stream.waveforms.slice(ts0 - s_rng[0], ts0 + s_rng[1]);
        if st_p.len() != 3 || st_s.len() != 3 {
            warn!(
                "{}: incomplete phase window ({} P / {} S channels), stop picking",
                template.station,
                st_p.len(),
                st_s.len()
            );
            break;
        }

        let cc_p = calc_cc(
            &st_p[2].data,
            &template.trigger[2],
            &KernelNorms::with_template(template.trigger_norms[2]),
        );
        let cc_s0 = calc_cc(
            &st_s[0].data,
            &template.s_wave[0],
            &KernelNorms::with_template(template.s_norms[0]),
        );
        let cc_s1 = calc_cc(
            &st_s[1].data,
            &template.s_wave[1],
            &KernelNorms::with_template(template.s_norms[1]),
        );

        let p_time = tp0 - p_rng[0] + config.win_p[0] + argmax(&cc_p) as f64 / sr;
        let s_time = ts0 - s_rng[0]
            + config.win_s[0]
            + (argmax(&cc_s0) + argmax(&cc_s1)) as f64 / sr / 2.0;
        let p_cc = max_value(&cc_p);
        let s_cc = (max_value(&cc_s0) + max_value(&cc_s1)) / 2.0;

        let amp_x = picker.get_amp(&st_s[0].data);
        let amp_y = picker.get_amp(&st_s[1].data);
        let amp_z = picker.get_amp(&st_s[2].data);
        let s_amplitude = (amp_x * amp_x + amp_y * amp_y + amp_z * amp_z).sqrt();

        debug!(
            "{}: P {:.3} (cc {:.3}), S {:.3} (cc {:.3}), amp {:.2}",
            template.station,
            p_time - det_ot,
            p_cc,
            s_time - det_ot,
            s_cc,
            s_amplitude
        );
        picks.push(Pick {
            station: template.station.clone(),
            p_time,
            s_time,
            s_amplitude,
            p_cc,
            s_cc,
        });
    }
    picks
}
