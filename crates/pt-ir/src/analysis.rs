//! Song feature analysis: scans a Song to report which features it uses.

use alloc::collections::BTreeSet;
use core::fmt;

use crate::pattern::Cell;
use crate::song::Song;

/// Summary of features used in a song.
pub struct SongFeatures {
    /// Effects that change playback
    pub effects: BTreeSet<&'static str>,
    /// Effects present in patterns but ignored during playback
    pub ignored_effects: BTreeSet<&'static str>,
    /// 1-based sample numbers referenced by cells
    pub instruments_used: BTreeSet<u8>,
    /// Referenced sample numbers with no instrument slot
    pub dangling_references: BTreeSet<u8>,
    pub instruments_with_loops: usize,
    pub period_range: Option<(u16, u16)>,
    pub total_notes: usize,
}

/// Analyze a song and return a summary of which features it uses.
pub fn analyze(song: &Song) -> SongFeatures {
    let mut features = SongFeatures {
        effects: BTreeSet::new(),
        ignored_effects: BTreeSet::new(),
        instruments_used: BTreeSet::new(),
        dangling_references: BTreeSet::new(),
        instruments_with_loops: song.instruments.iter().filter(|i| i.has_loop()).count(),
        period_range: None,
        total_notes: 0,
    };

    for pattern in &song.patterns {
        for cell in pattern.cells() {
            analyze_cell(song, cell, &mut features);
        }
    }

    features
}

fn analyze_cell(song: &Song, cell: &Cell, features: &mut SongFeatures) {
    if cell.period > 0 {
        features.total_notes += 1;
        let p = cell.period;
        features.period_range = Some(match features.period_range {
            Some((lo, hi)) => (lo.min(p), hi.max(p)),
            None => (p, p),
        });
    }

    if cell.sample_number > 0 {
        features.instruments_used.insert(cell.sample_number);
        if song.instrument_id(cell.sample_number).is_none() {
            features.dangling_references.insert(cell.sample_number);
        }
    }

    let effect = cell.effect();
    if effect.is_supported() {
        features.effects.insert(effect.name());
    } else if effect != crate::Effect::None {
        features.ignored_effects.insert(effect.name());
    }
}

fn join(f: &mut fmt::Formatter<'_>, label: &str, names: &BTreeSet<&'static str>) -> fmt::Result {
    if names.is_empty() {
        return writeln!(f, "{label}(none)");
    }
    let names: alloc::vec::Vec<&str> = names.iter().copied().collect();
    writeln!(f, "{label}{}", names.join(", "))
}

impl fmt::Display for SongFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Notes:    {} total", self.total_notes)?;
        if let Some((lo, hi)) = self.period_range {
            writeln!(f, "Periods:  {} - {}", lo, hi)?;
        }
        writeln!(
            f,
            "Instruments: {} used, {} with loops",
            self.instruments_used.len(),
            self.instruments_with_loops,
        )?;
        if !self.dangling_references.is_empty() {
            writeln!(f, "Dangling: {:?}", self.dangling_references)?;
        }
        join(f, "Effects:  ", &self.effects)?;
        join(f, "Ignored:  ", &self.ignored_effects)
    }
}
