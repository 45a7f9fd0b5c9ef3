//! Viseme alphabet and the static viseme-to-blend-shape mapping.
//!
//! A viseme is a visual mouth shape that corresponds to one or more audible
//! phonemes. This module maps the viseme codes carried by timeline marks
//! onto named blend-shape channels of a 3D face, and can estimate a timed
//! mark sequence from a raw phoneme string for TTS backends that return
//! audio without marks.

use crate::mark::Mark;

/// Oculus viseme IDs (standard for lip-sync).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Viseme {
    /// Silence (mouth closing)
    Sil = 0,
    /// /p/, /b/, /m/ (lips pressed together)
    PP = 1,
    /// /f/, /v/ (teeth on lip)
    FF = 2,
    /// /θ/, /ð/ (tongue between teeth)
    TH = 3,
    /// /t/, /d/, /l/ (tongue at roof)
    DD = 4,
    /// /k/, /g/, /ŋ/ (back of tongue up)
    KK = 5,
    /// /tʃ/, /dʒ/, /ʃ/, /ʒ/ (tongue curved)
    CH = 6,
    /// /s/, /z/ (teeth together, tongue forward)
    SS = 7,
    /// /n/, /nj/ (tongue at roof)
    NN = 8,
    /// /r/ (tongue curled)
    RR = 9,
    /// /a/ (mouth open wide)
    AA = 10,
    /// /e/ (mouth medium)
    E = 11,
    /// /i/ (mouth wide, teeth apart)
    I = 12,
    /// /o/ (rounded, medium)
    O = 13,
    /// /u/ (rounded, small)
    U = 14,
}

/// One blend-shape channel driven by a viseme.
///
/// `scale` is the channel's share of the computed intensity, so a single
/// phoneme can open the jaw fully while only hinting at lip rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendTarget {
    /// Channel name as it appears in the face model's dictionary.
    pub channel: &'static str,
    /// Relative weight within the viseme, in \[0, 1\].
    pub scale: f32,
}

const fn t(channel: &'static str, scale: f32) -> BlendTarget {
    BlendTarget { channel, scale }
}

impl Viseme {
    /// Parse a viseme code as it appears in a mark's `value`.
    ///
    /// Accepts both the short phoneme-class alphabet emitted by TTS viseme
    /// marks (`p, f, th, t, S, k, n, r, a, e, i, o, u, sil`) and the
    /// Oculus-style channel names (`PP`, `aa`, …). Unknown codes return
    /// `None`; the mark then carries no visual effect.
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "sil" => Self::Sil,
            "p" | "PP" => Self::PP,
            "f" | "FF" => Self::FF,
            "th" | "TH" => Self::TH,
            "t" | "DD" => Self::DD,
            "k" | "kk" | "KK" => Self::KK,
            "S" | "CH" => Self::CH,
            "s" | "SS" => Self::SS,
            "n" | "nn" | "NN" => Self::NN,
            "r" | "RR" => Self::RR,
            "a" | "aa" => Self::AA,
            "e" | "E" => Self::E,
            "i" | "I" => Self::I,
            "o" | "O" => Self::O,
            "u" | "U" => Self::U,
            _ => return None,
        })
    }

    /// Canonical code for this viseme (the Oculus-style name).
    pub fn code(self) -> &'static str {
        match self {
            Self::Sil => "sil",
            Self::PP => "PP",
            Self::FF => "FF",
            Self::TH => "TH",
            Self::DD => "DD",
            Self::KK => "kk",
            Self::CH => "CH",
            Self::SS => "SS",
            Self::NN => "nn",
            Self::RR => "RR",
            Self::AA => "aa",
            Self::E => "E",
            Self::I => "I",
            Self::O => "O",
            Self::U => "U",
        }
    }

    /// Blend-shape channels this viseme drives.
    ///
    /// Every viseme has an entry; one with no visual effect would map to an
    /// empty slice rather than a missing arm. The primary channel carries
    /// the viseme's own name (ReadyPlayerMe-style rigs expose those
    /// directly); secondary channels add jaw and lip articulation on rigs
    /// that have them. Channels absent on a given asset are skipped at
    /// apply time.
    pub fn blend_targets(self) -> &'static [BlendTarget] {
        match self {
            Self::Sil => const { &[t("mouthClose", 1.0)] },
            Self::PP => const { &[t("PP", 1.0), t("mouthClose", 0.4)] },
            Self::FF => const {
                &[
                    t("FF", 1.0),
                    t("mouthStretchLeft", 0.3),
                    t("mouthStretchRight", 0.3),
                ]
            },
            Self::TH => const { &[t("TH", 1.0), t("jawOpen", 0.2)] },
            Self::DD => const { &[t("DD", 1.0), t("jawOpen", 0.3)] },
            Self::KK => const { &[t("kk", 1.0), t("jawOpen", 0.35)] },
            Self::CH => const { &[t("CH", 1.0), t("mouthFunnel", 0.5)] },
            Self::SS => const { &[t("SS", 1.0)] },
            Self::NN => const { &[t("nn", 1.0), t("jawOpen", 0.15)] },
            Self::RR => const { &[t("RR", 1.0), t("mouthPucker", 0.3)] },
            Self::AA => const { &[t("aa", 1.0), t("jawOpen", 1.0)] },
            Self::E => const {
                &[
                    t("E", 1.0),
                    t("jawOpen", 0.5),
                    t("mouthSmileLeft", 0.25),
                    t("mouthSmileRight", 0.25),
                ]
            },
            Self::I => const {
                &[
                    t("I", 1.0),
                    t("mouthSmileLeft", 0.4),
                    t("mouthSmileRight", 0.4),
                ]
            },
            Self::O => const { &[t("O", 1.0), t("jawOpen", 0.6), t("mouthFunnel", 0.6)] },
            Self::U => const { &[t("U", 1.0), t("mouthPucker", 0.9)] },
        }
    }

    /// Per-phoneme-class attenuation applied to the random intensity draw.
    ///
    /// Open vowels are slightly reduced; plosives, fricatives and sibilants
    /// more, so consonants do not swing the jaw as hard as vowels. `sil`
    /// bypasses the band entirely and uses its fixed close intensity.
    pub fn intensity_scale(self) -> f32 {
        match self {
            Self::Sil => 1.0,
            Self::PP | Self::FF | Self::TH | Self::DD | Self::KK | Self::SS => 0.65,
            Self::CH | Self::NN | Self::RR => 0.75,
            Self::AA | Self::O => 0.9,
            Self::E | Self::I | Self::U => 0.85,
        }
    }
}

/// ARPABET phoneme to viseme mapping.
/// Based on Carnegie Mellon University Pronouncing Dictionary classes.
fn phoneme_to_viseme(phoneme: &str) -> Viseme {
    // Remove stress markers (0, 1, 2)
    let p = phoneme.trim_end_matches(['0', '1', '2']);

    match p {
        // Silence
        "" | "sil" | "sp" => Viseme::Sil,

        // Bilabial: lips together
        "B" | "P" | "M" | "EM" | "MX" => Viseme::PP,

        // Labiodental: teeth on lip
        "F" | "V" => Viseme::FF,

        // Dental: tongue between teeth
        "TH" | "DH" => Viseme::TH,

        // Alveolar: tongue at roof
        "T" | "D" | "L" | "DX" | "EL" => Viseme::DD,

        // Velar: back of tongue
        "K" | "G" | "NG" => Viseme::KK,

        // Postalveolar: curled
        "CH" | "JH" | "SH" | "ZH" => Viseme::CH,

        // Alveolar sibilants
        "S" | "Z" => Viseme::SS,

        // Nasals at the roof
        "N" | "NX" | "EN" => Viseme::NN,

        // Rhotic
        "R" | "ER" => Viseme::RR,

        // Vowels - single match each to avoid overlaps
        "AA" | "AO" | "AW" => Viseme::AA,
        "AE" | "AH" | "EH" => Viseme::E,
        "AY" | "EY" | "IH" | "IY" | "Y" => Viseme::I,
        "OW" | "OY" | "UH" => Viseme::O,
        "UW" | "W" => Viseme::U,

        // Default to slight open for unknown
        _ => Viseme::DD,
    }
}

/// Estimate a timed viseme mark sequence from a space-separated ARPABET
/// phoneme string, for TTS backends that synthesize audio but return no
/// marks.
///
/// Durations are crude per-phoneme estimates (vowels longer, stops
/// shorter), scaled by `speech_rate` (1.0 = normal). Consecutive identical
/// visemes are merged so the mouth holds the shape instead of re-attacking,
/// and a trailing `sil` mark closes the mouth at clip end.
pub fn marks_from_phonemes(phonemes: &str, speech_rate: f32) -> Vec<Mark> {
    let phones: Vec<&str> = phonemes.split_whitespace().collect();
    if phones.is_empty() {
        return Vec::new();
    }

    // Base duration per phoneme in ms (at 1.0 rate)
    let base_duration = 80.0;
    let duration = base_duration / speech_rate.max(0.5);

    let mut marks: Vec<Mark> = Vec::new();
    let mut clock = 0.0f32;
    let mut last: Option<Viseme> = None;

    for phone in phones {
        let stripped = phone.trim_end_matches(['0', '1', '2']);
        if stripped == "sil" || stripped == "sp" {
            // Inter-word silence contributes time but no mark of its own;
            // the trailing sil below handles the final close.
            clock += duration * 0.5;
            last = None;
            continue;
        }

        let viseme = phoneme_to_viseme(phone);
        let phone_duration = match stripped {
            // Longer for vowels
            "AA" | "AE" | "AH" | "AO" | "AW" | "AY" | "EH" | "EY" | "IH" | "IY" | "OW" | "OY"
            | "UH" | "UW" | "ER" => duration * 1.5,
            // Shorter for stops and fricatives
            "P" | "B" | "T" | "D" | "K" | "G" | "M" | "N" | "F" | "V" | "S" | "Z" => {
                duration * 0.8
            }
            _ => duration,
        };

        // Merge repeats: hold the shape, extend the clock
        if last != Some(viseme) {
            marks.push(Mark::viseme(clock as u32, viseme.code()));
            last = Some(viseme);
        }
        clock += phone_duration;
    }

    if !marks.is_empty() {
        marks.push(Mark::viseme(clock as u32, Viseme::Sil.code()));
    }
    marks
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::mark::MarkKind;

    const ALL: [Viseme; 15] = [
        Viseme::Sil,
        Viseme::PP,
        Viseme::FF,
        Viseme::TH,
        Viseme::DD,
        Viseme::KK,
        Viseme::CH,
        Viseme::SS,
        Viseme::NN,
        Viseme::RR,
        Viseme::AA,
        Viseme::E,
        Viseme::I,
        Viseme::O,
        Viseme::U,
    ];

    #[test]
    fn every_viseme_has_blend_targets() {
        for v in ALL {
            assert!(
                !v.blend_targets().is_empty(),
                "{:?} maps to no channels",
                v
            );
            for target in v.blend_targets() {
                assert!(target.scale > 0.0 && target.scale <= 1.0);
            }
        }
    }

    #[test]
    fn codes_round_trip() {
        for v in ALL {
            assert_eq!(Viseme::from_code(v.code()), Some(v));
        }
    }

    #[test]
    fn short_alphabet_parses() {
        for (code, expected) in [
            ("p", Viseme::PP),
            ("f", Viseme::FF),
            ("th", Viseme::TH),
            ("t", Viseme::DD),
            ("S", Viseme::CH),
            ("k", Viseme::KK),
            ("n", Viseme::NN),
            ("r", Viseme::RR),
            ("a", Viseme::AA),
            ("e", Viseme::E),
            ("i", Viseme::I),
            ("o", Viseme::O),
            ("u", Viseme::U),
            ("sil", Viseme::Sil),
        ] {
            assert_eq!(Viseme::from_code(code), Some(expected), "code {code}");
        }
    }

    #[test]
    fn unknown_codes_parse_to_none() {
        assert_eq!(Viseme::from_code("xx"), None);
        assert_eq!(Viseme::from_code(""), None);
        assert_eq!(Viseme::from_code("Sil"), None);
    }

    #[test]
    fn intensity_scales_bounded() {
        for v in ALL {
            let s = v.intensity_scale();
            assert!(s > 0.0 && s <= 1.0);
        }
    }

    #[test]
    fn silence_maps_to_mouth_close() {
        let targets = Viseme::Sil.blend_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].channel, "mouthClose");
    }

    #[test]
    fn open_vowel_drives_jaw() {
        assert!(
            Viseme::AA
                .blend_targets()
                .iter()
                .any(|t| t.channel == "jawOpen")
        );
    }

    #[test]
    fn bilabials_group_to_pp() {
        for phone in ["B", "P", "M"] {
            assert_eq!(phoneme_to_viseme(phone), Viseme::PP);
        }
    }

    #[test]
    fn stress_markers_stripped() {
        assert_eq!(phoneme_to_viseme("AA1"), Viseme::AA);
        assert_eq!(phoneme_to_viseme("IY0"), Viseme::I);
    }

    #[test]
    fn estimated_marks_sorted_and_terminated() {
        let marks = marks_from_phonemes("HH EH L OW", 1.0);
        assert!(!marks.is_empty());
        for pair in marks.windows(2) {
            assert!(pair[0].time_ms <= pair[1].time_ms);
        }
        assert_eq!(marks.last().unwrap().value, "sil");
        assert!(marks.iter().all(|m| m.kind == MarkKind::Viseme));
    }

    #[test]
    fn repeated_visemes_merge() {
        // B and P are both PP; one mark, held
        let marks = marks_from_phonemes("B P", 1.0);
        // one PP mark plus the trailing sil
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].value, "PP");
    }

    #[test]
    fn empty_phoneme_string_yields_no_marks() {
        assert!(marks_from_phonemes("", 1.0).is_empty());
        assert!(marks_from_phonemes("   ", 2.0).is_empty());
    }
}
