use std::path::PathBuf;

use postershow::{AppConfig, PosterStyle};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_postershow")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "postershow.exe"
            } else {
                "postershow"
            });
            p
        })
}

fn prepare(name: &str) -> (PathBuf, PathBuf) {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();

    let raw_path = dir.join("poster.png");
    image::RgbImage::from_pixel(24, 36, image::Rgb([30, 60, 90]))
        .save(&raw_path)
        .unwrap();

    let cfg = AppConfig {
        poster: PosterStyle {
            working_width: 160,
            working_height: 240,
            passe_padding: 24,
            ..PosterStyle::default()
        },
        ..AppConfig::default()
    };
    let cfg_path = dir.join("config.json");
    let f = std::fs::File::create(&cfg_path).unwrap();
    serde_json::to_writer_pretty(f, &cfg).unwrap();

    (dir, cfg_path)
}

#[test]
fn cli_compose_writes_rotated_poster() {
    let (dir, cfg_path) = prepare("compose");
    let raw_arg = dir.join("poster.png").to_string_lossy().to_string();
    let out_path = dir.join("poster_final.png");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .arg("--config")
        .arg(&cfg_path)
        .args(["compose", "--raw", raw_arg.as_str(), "--title", "Dune"])
        .args(["--year", "2021", "--url", "https://www.imdb.com/title/tt1160419/"])
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap();
    assert!(img.width() > img.height());
}

#[test]
fn cli_compose_fails_on_missing_raw() {
    let (dir, cfg_path) = prepare("missing_raw");
    let out_path = dir.join("poster_final.png");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .arg("--config")
        .arg(&cfg_path)
        .args(["compose", "--raw"])
        .arg(dir.join("nope.jpg"))
        .args(["--title", "Dune", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!out_path.exists());
}
