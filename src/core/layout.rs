//! Probe layout variants.
//!
//! A layout says how many grid rows a probe group occupies and whether probes
//! come in perfect-match/mismatch pairs. Algorithms ask the layout instead of
//! branching on the concrete chip type.

use crate::core::types::{LayoutKind, ProbeId};

/// Capabilities of a probe layout
pub trait ProbeLayout: std::fmt::Debug + Send + Sync {
    fn kind(&self) -> LayoutKind;

    /// Number of grid rows occupied by one probe group
    fn rows_per_probe(&self) -> usize;

    /// Nominal probe length
    fn probe_length(&self) -> usize;

    /// Whether probes form perfect-match/mismatch pairs
    fn is_paired(&self) -> bool {
        self.rows_per_probe() > 1
    }

    /// Index of the base that differs between the two probes of a pair
    fn middle_base(&self) -> Option<usize> {
        None
    }

    /// Probe distance between a real probe group and an empty slot
    fn empty_distance(&self) -> usize {
        self.probe_length()
    }

    /// Id of the probe group leader containing `id`
    fn group_leader(&self, id: ProbeId) -> ProbeId {
        id
    }

    /// Ids stored in a group, top row first
    fn group_members(&self, leader: ProbeId) -> Vec<ProbeId> {
        vec![leader]
    }
}

/// One probe per spot
#[derive(Debug, Clone, Copy)]
pub struct SingleProbeLayout {
    probe_length: usize,
}

impl SingleProbeLayout {
    #[must_use]
    pub fn new(probe_length: usize) -> Self {
        Self { probe_length }
    }
}

impl ProbeLayout for SingleProbeLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Single
    }

    fn rows_per_probe(&self) -> usize {
        1
    }

    fn probe_length(&self) -> usize {
        self.probe_length
    }
}

/// Perfect-match probe at an even id on row `r`, its mismatch partner at
/// `id + 1` on row `r + 1`
#[derive(Debug, Clone, Copy)]
pub struct PairedProbeLayout {
    probe_length: usize,
}

impl PairedProbeLayout {
    #[must_use]
    pub fn new(probe_length: usize) -> Self {
        Self { probe_length }
    }
}

impl ProbeLayout for PairedProbeLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Paired
    }

    fn rows_per_probe(&self) -> usize {
        2
    }

    fn probe_length(&self) -> usize {
        self.probe_length
    }

    fn middle_base(&self) -> Option<usize> {
        Some(self.probe_length / 2)
    }

    fn empty_distance(&self) -> usize {
        self.probe_length + 1
    }

    fn group_leader(&self, id: ProbeId) -> ProbeId {
        id & !1
    }

    fn group_members(&self, leader: ProbeId) -> Vec<ProbeId> {
        vec![leader, leader + 1]
    }
}

/// Layout object for a layout kind
#[must_use]
pub fn layout_for(kind: LayoutKind, probe_length: usize) -> Box<dyn ProbeLayout> {
    match kind {
        LayoutKind::Single => Box::new(SingleProbeLayout::new(probe_length)),
        LayoutKind::Paired => Box::new(PairedProbeLayout::new(probe_length)),
    }
}
