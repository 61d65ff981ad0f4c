//! Channel mixer - per-part mute/solo/volume state machine
//!
//! Holds the user-facing mix state and computes which gain the audio
//! engine must apply to each part. The mixer never touches the engine
//! itself; every operation returns the list of `GainChange`s the
//! caller pushes onto the command queue.
//!
//! A part is audible iff it is not muted and either it is soloed or no
//! part is soloed at all. Volume set while a part is inaudible is
//! remembered and becomes live the moment the part is audible again.

use crate::types::{Part, NUM_PARTS};

/// Default volume slider position (full volume = 0 dB)
pub const DEFAULT_VOLUME_PCT: f32 = 100.0;

/// The gain the engine must apply to one part
///
/// `Silence` is a distinct value rather than a very small dB number:
/// `20*log10(0)` is not finite, and a hard zero avoids float error at
/// the bottom of the fader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainValue {
    /// Hard silence (muted, solo-excluded, or fader at zero)
    Silence,
    /// Gain in decibels relative to unity
    Db(f64),
}

impl GainValue {
    /// Convert a fader percentage (0-100) to a gain value.
    /// 100% is unity (0 dB); 0% is hard silence.
    pub fn from_volume_pct(pct: f32) -> Self {
        if pct <= 0.0 {
            GainValue::Silence
        } else {
            GainValue::Db(20.0 * (pct as f64 / 100.0).log10())
        }
    }

    /// Linear amplitude multiplier for the audio engine
    pub fn linear(&self) -> f32 {
        match self {
            GainValue::Silence => 0.0,
            GainValue::Db(db) => 10.0f64.powf(db / 20.0) as f32,
        }
    }

    /// Decibel value, if finite
    pub fn db(&self) -> Option<f64> {
        match self {
            GainValue::Silence => None,
            GainValue::Db(db) => Some(*db),
        }
    }
}

/// A gain update the engine must apply to one part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainChange {
    pub part: Part,
    pub gain: GainValue,
}

/// Mix state of a single part
#[derive(Debug, Clone, Copy)]
struct PartMix {
    /// Fader position in percent (1-100); remembered across mute
    volume_pct: f32,
    muted: bool,
    soloed: bool,
}

impl Default for PartMix {
    fn default() -> Self {
        Self {
            volume_pct: DEFAULT_VOLUME_PCT,
            muted: false,
            soloed: false,
        }
    }
}

/// Per-part mute/solo/volume state for one loaded mix
pub struct ChannelMixer {
    /// Mix state, indexed by `Part as usize`; None for absent parts
    parts: [Option<PartMix>; NUM_PARTS],
}

impl ChannelMixer {
    /// Create a mixer over the parts present in this mix
    pub fn new(present: &[Part]) -> Self {
        let mut parts = [None; NUM_PARTS];
        for &part in present {
            parts[part as usize] = Some(PartMix::default());
        }
        Self { parts }
    }

    /// Parts present in this mix, in vocabulary order
    pub fn present_parts(&self) -> impl Iterator<Item = Part> + '_ {
        Part::ALL
            .iter()
            .copied()
            .filter(|&p| self.parts[p as usize].is_some())
    }

    /// Whether no present part is soloed
    pub fn none_soloed(&self) -> bool {
        !Part::ALL
            .iter()
            .any(|&p| self.parts[p as usize].is_some_and(|m| m.soloed))
    }

    pub fn is_muted(&self, part: Part) -> bool {
        self.parts[part as usize].is_some_and(|m| m.muted)
    }

    pub fn is_soloed(&self, part: Part) -> bool {
        self.parts[part as usize].is_some_and(|m| m.soloed)
    }

    /// Fader position of a part in percent
    pub fn volume_pct(&self, part: Part) -> f32 {
        self.parts[part as usize]
            .map(|m| m.volume_pct)
            .unwrap_or(DEFAULT_VOLUME_PCT)
    }

    /// Whether a part currently sounds: not muted, and either soloed
    /// or nothing is soloed
    pub fn is_audible(&self, part: Part) -> bool {
        match self.parts[part as usize] {
            Some(mix) => !mix.muted && (mix.soloed || self.none_soloed()),
            None => false,
        }
    }

    /// The gain the engine should currently apply to a part
    pub fn effective_gain(&self, part: Part) -> GainValue {
        if self.is_audible(part) {
            GainValue::from_volume_pct(self.volume_pct(part))
        } else {
            GainValue::Silence
        }
    }

    /// Toggle mute on a part.
    ///
    /// The live gain only changes when the part is solo-relevant (no
    /// solo is active, or this part itself is soloed); otherwise the
    /// part is already silent and the flip is state-only.
    pub fn toggle_mute(&mut self, part: Part) -> Vec<GainChange> {
        let Some(mix) = &mut self.parts[part as usize] else {
            return Vec::new();
        };
        mix.muted = !mix.muted;

        let solo_relevant = self.is_soloed(part) || self.none_soloed();
        if solo_relevant {
            vec![GainChange {
                part,
                gain: self.effective_gain(part),
            }]
        } else {
            Vec::new()
        }
    }

    /// Toggle solo on a part.
    ///
    /// Turning solo ON without `additive` first clears solo on every
    /// other part (exclusive group, last unmodified solo wins); with
    /// `additive` the part joins the existing solo set. Audibility is
    /// then recomputed for every present part.
    pub fn toggle_solo(&mut self, part: Part, additive: bool) -> Vec<GainChange> {
        let Some(mix) = self.parts[part as usize] else {
            return Vec::new();
        };
        let turning_on = !mix.soloed;

        if turning_on && !additive {
            for slot in self.parts.iter_mut().flatten() {
                slot.soloed = false;
            }
        }
        if let Some(slot) = &mut self.parts[part as usize] {
            slot.soloed = !mix.soloed;
        }

        self.present_parts()
            .map(|p| GainChange {
                part: p,
                gain: self.effective_gain(p),
            })
            .collect()
    }

    /// Set the fader position of a part.
    ///
    /// The value is always stored so it is ready when the part becomes
    /// audible; it is pushed live only if the part sounds right now.
    pub fn set_volume(&mut self, part: Part, pct: f32) -> Vec<GainChange> {
        let Some(mix) = &mut self.parts[part as usize] else {
            return Vec::new();
        };
        mix.volume_pct = pct.clamp(0.0, 100.0);

        if self.is_audible(part) {
            vec![GainChange {
                part,
                gain: GainValue::from_volume_pct(self.volume_pct(part)),
            }]
        } else {
            Vec::new()
        }
    }

    /// Snapshot the effective gain of every present part (for export)
    pub fn gain_snapshot(&self) -> Vec<GainChange> {
        self.present_parts()
            .map(|p| GainChange {
                part: p,
                gain: self.effective_gain(p),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_part_mixer() -> ChannelMixer {
        ChannelMixer::new(&Part::REQUIRED)
    }

    /// audible(p) == !muted(p) && (soloed(p) || none_soloed) after any
    /// mute/solo sequence
    #[test]
    fn test_audibility_invariant() {
        let mut mixer = four_part_mixer();
        let sequence: [(&str, Part, bool); 6] = [
            ("mute", Part::Vocals, false),
            ("solo", Part::Bass, false),
            ("solo", Part::Drums, true),
            ("mute", Part::Bass, false),
            ("solo", Part::Bass, false),
            ("mute", Part::Vocals, false),
        ];

        for (op, part, additive) in sequence {
            match op {
                "mute" => {
                    mixer.toggle_mute(part);
                }
                _ => {
                    mixer.toggle_solo(part, additive);
                }
            }
            for p in Part::REQUIRED {
                let expected =
                    !mixer.is_muted(p) && (mixer.is_soloed(p) || mixer.none_soloed());
                assert_eq!(mixer.is_audible(p), expected, "part {:?} after {} {:?}", p, op, part);
            }
        }
    }

    #[test]
    fn test_exclusive_solo_last_wins() {
        let mut mixer = four_part_mixer();
        mixer.toggle_solo(Part::Vocals, false);
        mixer.toggle_solo(Part::Bass, false);

        assert!(!mixer.is_soloed(Part::Vocals));
        assert!(mixer.is_soloed(Part::Bass));
        assert!(mixer.is_audible(Part::Bass));
        assert!(!mixer.is_audible(Part::Vocals));
        assert!(!mixer.is_audible(Part::Drums));
    }

    #[test]
    fn test_additive_solo() {
        let mut mixer = four_part_mixer();
        mixer.toggle_solo(Part::Vocals, false);
        mixer.toggle_solo(Part::Bass, true);

        assert!(mixer.is_soloed(Part::Vocals));
        assert!(mixer.is_soloed(Part::Bass));
        assert!(mixer.is_audible(Part::Vocals));
        assert!(mixer.is_audible(Part::Bass));
        assert!(!mixer.is_audible(Part::Accomp));
    }

    #[test]
    fn test_solo_updates_every_part() {
        let mut mixer = four_part_mixer();
        let changes = mixer.toggle_solo(Part::Vocals, false);
        assert_eq!(changes.len(), 4);

        for change in &changes {
            if change.part == Part::Vocals {
                assert_eq!(change.gain, GainValue::Db(0.0));
            } else {
                assert_eq!(change.gain, GainValue::Silence);
            }
        }
    }

    /// Setting volume, muting, then unmuting restores the exact dB
    #[test]
    fn test_volume_round_trip_through_mute() {
        let mut mixer = four_part_mixer();
        let changes = mixer.set_volume(Part::Accomp, 50.0);
        let original_db = changes[0].gain.db().unwrap();

        let muted = mixer.toggle_mute(Part::Accomp);
        assert_eq!(muted[0].gain, GainValue::Silence);

        let unmuted = mixer.toggle_mute(Part::Accomp);
        let restored_db = unmuted[0].gain.db().unwrap();
        assert!((restored_db - original_db).abs() < 1e-9);
        assert!((restored_db - (-6.0206)).abs() < 1e-3);
    }

    /// Volume change on a muted part is stored but not pushed live
    #[test]
    fn test_volume_while_muted_is_state_only() {
        let mut mixer = four_part_mixer();
        mixer.toggle_mute(Part::Drums);

        let changes = mixer.set_volume(Part::Drums, 30.0);
        assert!(changes.is_empty());
        assert_eq!(mixer.volume_pct(Part::Drums), 30.0);

        let unmuted = mixer.toggle_mute(Part::Drums);
        let db = unmuted[0].gain.db().unwrap();
        assert!((db - 20.0 * (0.3f64).log10()).abs() < 1e-9);
    }

    /// Muting a part excluded by someone else's solo is state-only
    #[test]
    fn test_mute_under_foreign_solo_is_state_only() {
        let mut mixer = four_part_mixer();
        mixer.toggle_solo(Part::Vocals, false);

        let changes = mixer.toggle_mute(Part::Bass);
        assert!(changes.is_empty());
        assert!(mixer.is_muted(Part::Bass));
    }

    #[test]
    fn test_zero_volume_is_hard_silence() {
        assert_eq!(GainValue::from_volume_pct(0.0), GainValue::Silence);
        assert_eq!(GainValue::from_volume_pct(0.0).linear(), 0.0);
        assert_eq!(GainValue::from_volume_pct(100.0), GainValue::Db(0.0));
    }

    #[test]
    fn test_optional_parts_only_count_when_present() {
        let mut five = ChannelMixer::new(&[
            Part::Vocals,
            Part::Accomp,
            Part::Bass,
            Part::Drums,
            Part::Piano,
        ]);
        five.toggle_solo(Part::Piano, false);
        assert!(!five.none_soloed());
        assert!(!five.is_audible(Part::Vocals));

        // Guitar is absent: operations on it are no-ops
        assert!(five.toggle_mute(Part::Guitar).is_empty());
        assert!(!five.is_audible(Part::Guitar));
    }

    #[test]
    fn test_gain_snapshot_reflects_mute() {
        let mut mixer = four_part_mixer();
        mixer.set_volume(Part::Accomp, 50.0);
        mixer.toggle_mute(Part::Vocals);

        let snapshot = mixer.gain_snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[0].part, Part::Vocals);
        assert_eq!(snapshot[0].gain, GainValue::Silence);
        assert!((snapshot[1].gain.db().unwrap() + 6.0206).abs() < 1e-3);
    }
}
