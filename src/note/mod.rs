use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A note name paired with the cents deviation of a measured frequency
/// from that note's reference frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPitch {
    pub note_name: String,
    pub cents: i32,
}

/// An equal-tempered note-frequency table injected by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteTable {
    notes: Vec<NoteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NoteEntry {
    name: String,
    frequency: f32,
}

impl NoteTable {
    /// Build a table from host-supplied `(name, frequency)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f32)>,
    {
        let notes = entries
            .into_iter()
            .map(|(name, frequency)| NoteEntry { name, frequency })
            .collect();
        Self { notes }
    }

    /// Parse a table from a JSON object mapping note names to frequencies,
    /// e.g. `{"A4": 440.0, "A#4": 466.16}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: BTreeMap<String, f32> = serde_json::from_str(json)?;
        Ok(Self::from_entries(map))
    }

    /// The standard 88-key piano table (A0 to C8) in equal temperament.
    pub fn equal_tempered(reference_a4: f32) -> Self {
        // A4 is key 49, index 48. The octave number changes at C.
        const KEY_NAMES: [&str; 12] = [
            "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
        ];
        let notes = (0..88)
            .map(|i| {
                let frequency = reference_a4 * 2.0_f32.powf((i as f32 - 48.0) / 12.0);
                let name = format!("{}{}", KEY_NAMES[i % 12], (i + 9) / 12);
                NoteEntry { name, frequency }
            })
            .collect();
        Self { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Frequency of a named entry, if present.
    pub fn frequency_of(&self, name: &str) -> Option<f32> {
        self.notes
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.frequency)
    }

    /// Entry minimizing the absolute Hz distance to `frequency`.
    fn nearest(&self, frequency: f32) -> Option<(&str, f32)> {
        self.notes
            .iter()
            .min_by(|a, b| {
                let da = (a.frequency - frequency).abs();
                let db = (b.frequency - frequency).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|n| (n.name.as_str(), n.frequency))
    }
}

/// Which of the two lookup paths to use.
///
/// The MIDI formula rounds in log-frequency space; the table path picks the
/// entry with the smallest absolute Hz distance. Near a semitone boundary
/// the two can name different notes. Both are kept as-is; callers choose
/// per use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    MidiFormula,
    NearestInTable,
}

/// Frequency to note-name and cents conversions.
#[derive(Debug, Clone)]
pub struct NoteMapper {
    reference_a4: f32,
}

impl NoteMapper {
    pub fn new(reference_a4: f32) -> Result<Self> {
        if reference_a4 <= 0.0 || !reference_a4.is_finite() {
            bail!("reference_a4 must be positive, got {}", reference_a4);
        }
        Ok(Self { reference_a4 })
    }

    /// Identify the nearest equal-tempered note via the MIDI note formula.
    pub fn identify_note(&self, frequency: f32) -> Result<NamedPitch> {
        if frequency <= 0.0 || !frequency.is_finite() {
            bail!("frequency must be positive, got {}", frequency);
        }

        // MIDI note = 69 + 12 * log2(frequency / A4)
        let midi = 12.0 * (frequency / self.reference_a4).log2() + 69.0;
        let rounded = midi.round() as i32;
        let cents = ((midi - rounded as f32) * 100.0).round() as i32;

        let name = NOTE_NAMES[rounded.rem_euclid(12) as usize];
        let octave = (rounded - 12).div_euclid(12);

        Ok(NamedPitch {
            note_name: format!("{}{}", name, octave),
            cents,
        })
    }

    /// Identify the nearest note by absolute Hz distance in a host table.
    pub fn nearest_in_table(&self, frequency: f32, table: &NoteTable) -> Result<NamedPitch> {
        if frequency <= 0.0 || !frequency.is_finite() {
            bail!("frequency must be positive, got {}", frequency);
        }
        let Some((name, table_freq)) = table.nearest(frequency) else {
            bail!("note table is empty");
        };

        Ok(NamedPitch {
            note_name: name.to_string(),
            cents: cents_between(frequency, table_freq).round() as i32,
        })
    }

    /// Unified entry point over both lookup paths.
    pub fn lookup(
        &self,
        strategy: LookupStrategy,
        frequency: f32,
        table: &NoteTable,
    ) -> Result<NamedPitch> {
        match strategy {
            LookupStrategy::MidiFormula => self.identify_note(frequency),
            LookupStrategy::NearestInTable => self.nearest_in_table(frequency, table),
        }
    }

    pub fn reference_a4(&self) -> f32 {
        self.reference_a4
    }
}

/// Deviation of `frequency` from `target_frequency` in cents.
///
/// Positive values are sharp, negative flat. 100 cents = 1 semitone.
pub fn cents_between(frequency: f32, target_frequency: f32) -> f32 {
    1200.0 * (frequency / target_frequency).log2()
}
