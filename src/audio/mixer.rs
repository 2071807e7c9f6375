// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
// Channel mixing logic shared by the cpal output stream and tests.
use std::sync::Arc;

/// A sample playing on a channel. Holds only the shared data so nothing is
/// freed on the audio thread when a voice is replaced or retired.
struct Voice {
    /// Interleaved sample data, shared with the sample bank.
    data: Arc<Vec<f32>>,
    /// Number of interleaved channels in the data.
    channel_count: usize,
    /// The next frame to mix.
    frame: usize,
}

impl Voice {
    fn frames(&self) -> usize {
        self.data.len() / self.channel_count
    }

    fn is_finished(&self) -> bool {
        self.frame >= self.frames()
    }
}

/// A fixed pool of playback channels. Each channel plays at most one sample;
/// starting a new sample on a busy channel replaces the old one. Different
/// channels sound independently and are summed into the output.
pub struct ChannelMixer {
    /// One slot per playback channel.
    slots: Vec<Option<Voice>>,
    /// Number of interleaved output channels.
    output_channels: u16,
}

impl ChannelMixer {
    /// Creates a mixer with the given number of playback channels.
    pub fn new(channel_count: usize, output_channels: u16) -> Self {
        Self {
            slots: (0..channel_count).map(|_| None).collect(),
            output_channels,
        }
    }

    /// Starts the interleaved data on the given channel from its first frame.
    /// Returns false if the channel doesn't exist or the data has no channels.
    pub fn play(&mut self, channel: usize, data: Arc<Vec<f32>>, channel_count: u16) -> bool {
        if channel_count == 0 {
            return false;
        }
        match self.slots.get_mut(channel) {
            Some(slot) => {
                *slot = Some(Voice {
                    data,
                    channel_count: channel_count as usize,
                    frame: 0,
                });
                true
            }
            None => false,
        }
    }

    /// Mixes the next frames of every playing channel into the interleaved
    /// output buffer, overwriting its contents. Finished voices are retired.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        output.fill(0.0);

        let output_channels = self.output_channels as usize;
        let frames = output.len() / output_channels;

        for slot in self.slots.iter_mut() {
            let Some(voice) = slot else {
                continue;
            };

            let sample_channels = voice.channel_count;
            let available = voice.frames().saturating_sub(voice.frame);
            let to_mix = available.min(frames);

            for frame in 0..to_mix {
                let source = (voice.frame + frame) * sample_channels;
                let target = frame * output_channels;
                for channel in 0..output_channels {
                    output[target + channel] += voice.data[source + channel % sample_channels];
                }
            }
            voice.frame += to_mix;

            if voice.is_finished() {
                *slot = None;
            }
        }

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Returns the number of channels currently playing.
    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
