use std::io::{Cursor, Write};

use image::{DynamicImage, ImageFormat, RgbImage};
use ordr_thumbnail::bin::play::{Enrichment, assemble};
use ordr_thumbnail::bin::render::Thumbnail;
use ordr_thumbnail::lib::archive::BeatmapArchive;
use ordr_thumbnail::lib::difficulty::{Resolution, resolve};
use ordr_thumbnail::lib::mods::ModsOrigin;
use ordr_thumbnail::lib::ordr::Render;
use ordr_thumbnail::lib::osu::Beatmapset;
use ordr_thumbnail::lib::rank::Grade;
use ordr_thumbnail::thumbnail::ThumbnailConf;
use ordr_thumbnail::thumbnail::backend::ThumbnailBackend;
use ordr_thumbnail::thumbnail::backend::jpeg::JpegBackend;
use ordr_thumbnail::thumbnail::font::FontConf;
use zip::write::SimpleFileOptions;

fn osu_file(version: &str, beatmap_id: u64, background: &str) -> Vec<u8> {
    format!(
        "osu file format v14

[General]
Mode: 0

[Metadata]
Title:Some Song
Artist:Someone
Creator:Mapper
Version:{version}
BeatmapID:{beatmap_id}
BeatmapSetID:654321

[Difficulty]
OverallDifficulty:8
ApproachRate:9

[Events]
0,0,\"{background}\",0,0

[HitObjects]
256,192,1000,1,0,0:0:0:0:
"
    )
    .into_bytes()
}

fn png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x as u8).wrapping_mul(seed), (y as u8).wrapping_add(seed), seed])
    });

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn osz() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let entries = [
        ("Someone - Some Song (Mapper) [Hard].osu", osu_file("Hard", 111, "hard.png")),
        ("Someone - Some Song (Mapper) [Extra].osu", osu_file("Extra", 222, "extra.png")),
        ("hard.png", png(32, 18, 3)),
        ("Extra.PNG", png(48, 27, 7)),
    ];

    for (name, bytes) in entries {
        writer.start_file(name, options).unwrap();
        writer.write_all(&bytes).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

fn render() -> Render {
    serde_json::from_value(serde_json::json!({
        "renderID": 7654321,
        "title": "player | Someone - Some Song [Extra Hard]",
        "description": "6.13* | 97.10% | +HDDT | 3 misses",
        "mapTitle": "Someone - Some Song [Extra Hard]",
        "replayDifficulty": "Extra Hard",
        "replayUsername": "player",
        "mapID": "654321",
        "replayMods": 0
    }))
    .unwrap()
}

fn beatmapset() -> Beatmapset {
    serde_json::from_value(serde_json::json!({
        "id": 654321,
        "title": "Some Song",
        "artist": "Someone",
        "creator": "Mapper",
        "covers": {},
        "beatmaps": [
            {"id": 111, "beatmapset_id": 654321, "version": "Hard", "difficulty_rating": 4.02, "mode": "osu"},
            {"id": 222, "beatmapset_id": 654321, "version": "Extra", "difficulty_rating": 6.2, "mode": "osu",
             "max_combo": 1200, "count_circles": 500, "count_sliders": 300, "count_spinners": 1}
        ]
    }))
    .unwrap()
}

#[test]
fn renamed_difficulty_falls_back_to_stars() {
    let render = render();
    let description = render.play_description();
    let set = beatmapset();

    let resolution = resolve(
        &set.beatmaps,
        Some(&render.replay_difficulty),
        description.stars,
        0.1,
    );

    let Resolution::NearestStars { candidate, delta } = resolution else {
        panic!("expected a star match, got {resolution:?}");
    };

    assert_eq!(candidate.id, 222);
    assert!((delta - 0.07).abs() < 1e-9);

    let enrichment = Enrichment {
        beatmap: Some(candidate.clone()),
        beatmapset: Some(set.clone()),
        ..Default::default()
    };

    let play = assemble(Some(&render), &description, &enrichment);

    assert_eq!(play.difficulty, "Extra");
    assert_eq!(play.beatmap_id, Some(222));
    // render reported no mods, the description fills in
    assert_eq!(play.mods.to_string(), "HDDT");
    assert_eq!(play.mods_origin, ModsOrigin::Description);
    assert_eq!(play.rank, Grade::D);
    assert_eq!(play.misses, Some(3));
    assert_eq!(play.max_combo, Some(1200));
}

#[test]
fn out_of_tolerance_is_unresolved() {
    let set = beatmapset();
    let resolution = resolve(&set.beatmaps, Some("Insane"), Some(5.0), 0.1);

    assert!(!resolution.is_resolved());
}

#[test]
fn archive_background_to_jpeg() {
    let mut archive = BeatmapArchive::from_bytes(osz()).unwrap();
    assert_eq!(archive.difficulties.len(), 2);

    let difficulty = archive.difficulty(Some(222), "Extra").cloned().unwrap();
    assert_eq!(difficulty.beatmap.version, "Extra");

    // entry lookup ignores case: "extra.png" is stored as "Extra.PNG"
    let background = archive.background(Some(&difficulty)).unwrap();
    assert_eq!((background.width(), background.height()), (48, 27));

    let render = render();
    let play = assemble(Some(&render), &render.play_description(), &Enrichment::default());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thumb.jpg");

    let renderer = Thumbnail {
        play: &play,
        background: Some(background),
        avatar: None,
        fonts: FontConf::default(),
    };

    let conf = ThumbnailConf {
        width: 384,
        height: 216,
        quality: 90,
        save_path: Some(path.clone()),
    };

    match JpegBackend.run(&conf, renderer) {
        Ok(saved) => {
            let decoded = image::open(&saved).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (384, 216));
        }
        Err(ordr_thumbnail::thumbnail::Error::FontNotFound(_)) => {
            eprintln!("no system font available, skipping render");
        }
        Err(err) => panic!("{err}"),
    }
}
