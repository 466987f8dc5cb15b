use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyCandidate;
use crate::pp::ObjectCounts;

/// The parts of a `.osu` difficulty file the thumbnail needs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsuFile {
    pub format_version: Option<u32>,
    pub mode: u8,
    pub title: String,
    pub title_unicode: Option<String>,
    pub artist: String,
    pub creator: String,
    pub version: String,
    pub beatmap_id: Option<u64>,
    pub beatmapset_id: Option<u64>,
    pub circle_size: f64,
    pub approach_rate: Option<f64>,
    pub overall_difficulty: f64,
    pub hp_drain: f64,
    pub background: Option<String>,
    pub objects: ObjectCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    General,
    Metadata,
    Difficulty,
    Events,
    HitObjects,
    Other,
}

impl Section {
    fn from_header(header: &str) -> Section {
        match header {
            "General" => Section::General,
            "Metadata" => Section::Metadata,
            "Difficulty" => Section::Difficulty,
            "Events" => Section::Events,
            "HitObjects" => Section::HitObjects,
            _ => Section::Other,
        }
    }
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Background filename from an `[Events]` line such as `0,0,"bg.jpg",0,0`.
fn parse_background(line: &str) -> Option<String> {
    let mut fields = line.splitn(3, ',');

    let kind = fields.next()?.trim();
    if kind != "0" && !kind.eq_ignore_ascii_case("Background") {
        return None;
    }

    let _start_time = fields.next()?;
    let rest = fields.next()?.trim();

    let file = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next()?,
        None => rest.split(',').next()?,
    };

    let file = file.trim().replace('\\', "/");
    (!file.is_empty()).then_some(file)
}

impl OsuFile {
    /// Parses a `.osu` file leniently: unknown sections and malformed
    /// lines are skipped rather than rejected.
    pub fn parse(text: &str) -> OsuFile {
        let mut file = OsuFile::default();
        let mut section = Section::None;

        for line in text.lines() {
            let line = line.trim_start_matches('\u{feff}').trim();

            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if let Some(version) = line.strip_prefix("osu file format v") {
                file.format_version = version.trim().parse().ok();
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Section::from_header(header);
                continue;
            }

            match section {
                Section::General => {
                    if let Some(("Mode", value)) = key_value(line) {
                        file.mode = value.parse().unwrap_or(0);
                    }
                }
                Section::Metadata => {
                    let Some((key, value)) = key_value(line) else {
                        continue;
                    };

                    match key {
                        "Title" => file.title = value.to_owned(),
                        "TitleUnicode" => file.title_unicode = Some(value.to_owned()),
                        "Artist" => file.artist = value.to_owned(),
                        "Creator" => file.creator = value.to_owned(),
                        "Version" => file.version = value.to_owned(),
                        "BeatmapID" => file.beatmap_id = value.parse().ok().filter(|id| *id > 0),
                        "BeatmapSetID" => {
                            file.beatmapset_id = value.parse().ok().filter(|id| *id > 0)
                        }
                        _ => {}
                    }
                }
                Section::Difficulty => {
                    let Some((key, value)) = key_value(line) else {
                        continue;
                    };
                    let Ok(value) = value.parse::<f64>() else {
                        continue;
                    };

                    match key {
                        "CircleSize" => file.circle_size = value,
                        "ApproachRate" => file.approach_rate = Some(value),
                        "OverallDifficulty" => file.overall_difficulty = value,
                        "HPDrainRate" => file.hp_drain = value,
                        _ => {}
                    }
                }
                Section::Events => {
                    if file.background.is_none() {
                        file.background = parse_background(line);
                    }
                }
                Section::HitObjects => {
                    let Some(kind) = line.split(',').nth(3).and_then(|k| k.trim().parse::<u32>().ok())
                    else {
                        continue;
                    };

                    if kind & 1 != 0 {
                        file.objects.circles += 1;
                    } else if kind & 2 != 0 {
                        file.objects.sliders += 1;
                    } else if kind & (8 | 128) != 0 {
                        file.objects.spinners += 1;
                    }
                }
                Section::None | Section::Other => {}
            }
        }

        file
    }

    /// Old formats have no approach rate and reuse overall difficulty.
    pub fn approach_rate(&self) -> f64 {
        self.approach_rate.unwrap_or(self.overall_difficulty)
    }
}

impl DifficultyCandidate for OsuFile {
    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = "\u{feff}osu file format v14

[General]
AudioFilename: audio.mp3
Mode: 0

[Metadata]
Title:Some Song
TitleUnicode:ある歌
Artist:Someone
Creator:Mapper
Version:Extra
BeatmapID:123456
BeatmapSetID:654321

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:9
ApproachRate:9.3

[Events]
//Background and Video events
Video,0,\"video.mp4\"
0,0,\"BG Folder\\bg.jpg\",0,0
//Break Periods

[TimingPoints]
0,500,4,2,0,60,1,0

[HitObjects]
256,192,1000,1,0,0:0:0:0:
256,192,1500,2,0,B|300:200,1,100
256,192,2000,5,0,0:0:0:0:
256,192,3000,12,0,4000,0:0:0:0:
";

    #[test]
    fn parses_metadata_and_background() {
        let file = OsuFile::parse(SAMPLE);

        assert_eq!(file.format_version, Some(14));
        assert_eq!(file.mode, 0);
        assert_eq!(file.title, "Some Song");
        assert_eq!(file.title_unicode.as_deref(), Some("ある歌"));
        assert_eq!(file.version, "Extra");
        assert_eq!(file.beatmap_id, Some(123456));
        assert_eq!(file.beatmapset_id, Some(654321));
        assert_eq!(file.approach_rate(), 9.3);
        assert_eq!(file.background.as_deref(), Some("BG Folder/bg.jpg"));
        assert_eq!(
            file.objects,
            ObjectCounts {
                circles: 2,
                sliders: 1,
                spinners: 1
            }
        );
    }

    #[test]
    fn old_format_without_ar_or_ids() {
        let file = OsuFile::parse(
            "osu file format v5\n[Metadata]\nVersion:Normal\nBeatmapID:0\n[Difficulty]\nOverallDifficulty:6\n[Events]\n0,0,bg.png\n",
        );

        assert_eq!(file.beatmap_id, None);
        assert_eq!(file.approach_rate(), 6.0);
        assert_eq!(file.background.as_deref(), Some("bg.png"));
    }

    #[test]
    fn ignores_video_events() {
        assert_eq!(parse_background("Video,0,\"clip.avi\""), None);
        assert_eq!(parse_background("1,0,\"clip.avi\""), None);
        assert_eq!(
            parse_background("Background,0,\"x.jpg\",0,0").as_deref(),
            Some("x.jpg")
        );
    }
}
