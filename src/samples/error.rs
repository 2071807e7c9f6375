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
use std::path::PathBuf;

/// Error types for sample loading. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Failed to open sample {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode sample {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("No audio track found in {}", .0.display())]
    NoAudioTrack(PathBuf),

    #[error("Sample {} does not specify a {what}", .path.display())]
    MissingParameter { path: PathBuf, what: &'static str },

    #[error("Sample {} contains no audio", .0.display())]
    Empty(PathBuf),
}
