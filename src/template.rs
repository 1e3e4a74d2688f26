//! Template library: per-station waveform templates cut around a known event.
//!
//! A [`TemplateSet`] holds one [`StationTemplate`] per station, in insertion
//! order, together with the template event's hypocenter. Sets serialize with
//! rkyv so a library built once (waveform cutting, norm computation) can be
//! reloaded instantly for each day that is scanned.

use anyhow::Context;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::correlate::template_norm;

/// Location of the template event. Only used for catalog output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct Hypocenter {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Depth in kilometers.
    pub depth: f64,
}

/// Templates of one station, cut from the template event.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StationTemplate {
    /// Station identifier, matching the continuous stream key.
    pub station: String,
    /// Trigger window (E, N, Z) used for detection; its vertical channel
    /// also refines P arrivals.
    pub trigger: [Vec<f32>; 3],
    /// S window (E, N, Z); the horizontal channels refine S arrivals.
    pub s_wave: [Vec<f32>; 3],
    /// L2 norm of each trigger channel.
    pub trigger_norms: [f64; 3],
    /// L2 norm of each S-window channel.
    pub s_norms: [f64; 3],
    /// P arrival time of the template event at this station (POSIX seconds).
    pub tp: f64,
    /// S arrival time of the template event at this station (POSIX seconds).
    pub ts: f64,
    /// Origin time of the template event (POSIX seconds).
    pub ot: f64,
    /// Seconds to add to the start time of a trigger window to reach the
    /// origin time. Negative when the window starts after the origin.
    pub origin_offset: f64,
}

impl StationTemplate {
    /// Build a station template, computing the channel norms.
    pub fn new(
        station: impl Into<String>,
        trigger: [Vec<f32>; 3],
        s_wave: [Vec<f32>; 3],
        tp: f64,
        ts: f64,
        ot: f64,
        origin_offset: f64,
    ) -> Self {
        let trigger_norms = [
            template_norm(&trigger[0]),
            template_norm(&trigger[1]),
            template_norm(&trigger[2]),
        ];
        let s_norms = [
            template_norm(&s_wave[0]),
            template_norm(&s_wave[1]),
            template_norm(&s_wave[2]),
        ];
        Self {
            station: station.into(),
            trigger,
            s_wave,
            trigger_norms,
            s_norms,
            tp,
            ts,
            ot,
            origin_offset,
        }
    }

    /// P travel time relative to the origin.
    pub fn p_delay(&self) -> f64 {
        self.tp - self.ot
    }

    /// S travel time relative to the origin.
    pub fn s_delay(&self) -> f64 {
        self.ts - self.ot
    }

    /// Length of the trigger window in samples (vertical channel).
    pub fn trigger_len(&self) -> usize {
        self.trigger[2].len()
    }
}

/// Ordered, station-keyed collection of templates for one template event.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct TemplateSet {
    /// Template event location.
    pub hypocenter: Hypocenter,
    stations: Vec<StationTemplate>,
}

impl TemplateSet {
    pub fn new(hypocenter: Hypocenter) -> Self {
        Self {
            hypocenter,
            stations: Vec::new(),
        }
    }

    /// Add a station template. A template for a station already present
    /// replaces it in place, keeping the original position.
    pub fn insert(&mut self, template: StationTemplate) {
        match self
            .stations
            .iter_mut()
            .find(|t| t.station == template.station)
        {
            Some(slot) => *slot = template,
            None => self.stations.push(template),
        }
    }

    pub fn get(&self, station: &str) -> Option<&StationTemplate> {
        self.stations.iter().find(|t| t.station == station)
    }

    /// Templates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, StationTemplate> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station identifiers in insertion order.
    pub fn station_names(&self) -> Vec<&str> {
        self.stations.iter().map(|t| t.station.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a TemplateSet {
    type Item = &'a StationTemplate;
    type IntoIter = std::slice::Iter<'a, StationTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

impl FromIterator<StationTemplate> for TemplateSet {
    fn from_iter<I: IntoIterator<Item = StationTemplate>>(iter: I) -> Self {
        let mut set = TemplateSet::default();
        for t in iter {
            set.insert(t);
        }
        set
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl TemplateSet {
    /// Serialize the template set to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Deserialize a template set from rkyv bytes.
    pub fn from_rkyv_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))
    }

    /// Save the template set to a file using rkyv.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path))?;
        info!("Saved {} station templates to {} ({} bytes)", self.len(), path, bytes.len());
        Ok(())
    }

    /// Load a template set from an rkyv file.
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
        let set = Self::from_rkyv_bytes(&bytes)?;
        info!("Loaded {} station templates from {}", set.len(), path);
        Ok(set)
    }
}
