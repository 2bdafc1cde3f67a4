use anyhow::{bail, Result};
use log::debug;

use crate::note::NoteMapper;
use crate::types::{DetectedNote, PitchReading};

/// Debounces raw pitch readings into stable note detections.
///
/// A reading is surfaced only after its mapped note name has repeated for a
/// configured number of consecutive analysis cycles; any change of note, or
/// a cycle with no reading, resets the streak. This is display policy, not
/// pitch math, and wraps whichever detection strategy is in use.
pub struct NoteStability {
    required: usize,
    candidate: Option<String>,
    streak: usize,
}

impl NoteStability {
    pub fn new(required: usize) -> Result<Self> {
        if required == 0 {
            bail!("required cycle count must be at least 1");
        }
        Ok(Self {
            required,
            candidate: None,
            streak: 0,
        })
    }

    /// Feed one cycle's outcome; returns a note once the streak is long
    /// enough, every cycle for as long as it holds.
    pub fn observe(
        &mut self,
        reading: Option<&PitchReading>,
        mapper: &NoteMapper,
    ) -> Option<DetectedNote> {
        let Some(reading) = reading else {
            self.reset();
            return None;
        };
        let Ok(named) = mapper.identify_note(reading.frequency) else {
            self.reset();
            return None;
        };

        match &self.candidate {
            Some(current) if *current == named.note_name => self.streak += 1,
            _ => {
                debug!("note candidate changed to {}", named.note_name);
                self.candidate = Some(named.note_name.clone());
                self.streak = 1;
            }
        }

        if self.streak >= self.required {
            Some(DetectedNote {
                note_name: named.note_name,
                cents: named.cents,
                frequency: reading.frequency,
                amplitude: None,
            })
        } else {
            None
        }
    }

    /// Forget any in-progress streak, e.g. when a session restarts.
    pub fn reset(&mut self) {
        self.candidate = None;
        self.streak = 0;
    }
}
