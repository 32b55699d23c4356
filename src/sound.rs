use serde::Serialize;

use crate::devices::Audio;

/// Scale used by pattern digits `'1'..='9'`, in Hz.
const SCALE_HZ: [u32; 9] = [262, 294, 330, 349, 392, 440, 494, 523, 587];
const REST: char = '0';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundId {
    Start,
    Point,
    Caught,
    Cleared,
}

impl SoundId {
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Start => "33336688",
            Self::Point => "8",
            Self::Caught => "65410",
            Self::Cleared => "1358058",
        }
    }
}

pub fn note_frequency(note: char) -> Option<u32> {
    let digit = note.to_digit(10)?;
    if digit == 0 {
        return None;
    }
    SCALE_HZ.get(digit as usize - 1).copied()
}

pub trait ToneOutput {
    fn set_frequency(&mut self, hz: u32);
    fn stop(&mut self);
}

/// Plays one digit pattern at a time, one note every `note_ticks` ticks.
#[derive(Clone, Debug)]
pub struct PatternPlayer {
    note_ticks: u32,
    current: Option<SoundId>,
    position: usize,
    hold: u32,
}

impl PatternPlayer {
    pub fn new(note_ticks: u32) -> Self {
        Self {
            note_ticks: note_ticks.max(1),
            current: None,
            position: 0,
            hold: 0,
        }
    }

    pub fn current(&self) -> Option<SoundId> {
        self.current
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn tick(&mut self, output: &mut dyn ToneOutput) {
        let Some(sound) = self.current else {
            return;
        };
        if self.hold > 0 {
            self.hold -= 1;
            return;
        }
        match sound.pattern().chars().nth(self.position) {
            Some(note) => {
                match note_frequency(note) {
                    Some(hz) => output.set_frequency(hz),
                    None => output.stop(),
                }
                self.position += 1;
                self.hold = self.note_ticks - 1;
            }
            None => {
                output.stop();
                self.current = None;
            }
        }
    }
}

impl Audio for PatternPlayer {
    fn play_sound(&mut self, sound: SoundId) {
        self.current = Some(sound);
        self.position = 0;
        self.hold = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Tone {
        Freq(u32),
        Stop,
    }

    #[derive(Default)]
    struct RecordingTone {
        tones: Vec<Tone>,
    }

    impl ToneOutput for RecordingTone {
        fn set_frequency(&mut self, hz: u32) {
            self.tones.push(Tone::Freq(hz));
        }

        fn stop(&mut self) {
            self.tones.push(Tone::Stop);
        }
    }

    #[test]
    fn digits_map_to_scale() {
        assert_eq!(note_frequency('1'), Some(262));
        assert_eq!(note_frequency('9'), Some(587));
        assert_eq!(note_frequency(REST), None);
        assert_eq!(note_frequency('x'), None);
    }

    #[test]
    fn pattern_plays_once_then_stops() {
        let mut player = PatternPlayer::new(1);
        let mut out = RecordingTone::default();
        player.play_sound(SoundId::Caught);
        for _ in 0..10 {
            player.tick(&mut out);
        }
        assert_eq!(
            out.tones,
            vec![
                Tone::Freq(440),
                Tone::Freq(392),
                Tone::Freq(349),
                Tone::Freq(262),
                Tone::Stop,
                Tone::Stop,
            ]
        );
        assert!(!player.is_playing());
    }

    #[test]
    fn notes_are_held_for_note_ticks() {
        let mut player = PatternPlayer::new(3);
        let mut out = RecordingTone::default();
        player.play_sound(SoundId::Point);
        for _ in 0..3 {
            player.tick(&mut out);
        }
        assert_eq!(out.tones, vec![Tone::Freq(523)]);
        assert!(player.is_playing());
        player.tick(&mut out);
        assert_eq!(out.tones.last(), Some(&Tone::Stop));
        assert!(!player.is_playing());
    }

    #[test]
    fn new_sound_replaces_current() {
        let mut player = PatternPlayer::new(1);
        let mut out = RecordingTone::default();
        player.play_sound(SoundId::Start);
        player.tick(&mut out);
        player.play_sound(SoundId::Point);
        player.tick(&mut out);
        assert_eq!(out.tones, vec![Tone::Freq(330), Tone::Freq(523)]);
        assert_eq!(player.current(), Some(SoundId::Point));
    }

    #[test]
    fn idle_player_is_silent() {
        let mut player = PatternPlayer::new(2);
        let mut out = RecordingTone::default();
        player.tick(&mut out);
        assert!(out.tones.is_empty());
    }
}
