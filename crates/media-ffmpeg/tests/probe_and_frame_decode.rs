use std::path::PathBuf;
use std::process::Command;

use media_ffmpeg::{MediaFfmpegError, decode_video_frame_at_index, probe_frame_count, probe_media};

fn make_sample_video() -> PathBuf {
    let output = std::env::temp_dir().join(format!(
        "scenemark-probe-{}-{}.mp4",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock must be after unix epoch")
            .as_nanos()
    ));

    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=160x90:rate=30",
            "-t",
            "1.2",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&output)
        .output()
        .expect("ffmpeg must be installed to run tests");

    assert!(
        status.status.success(),
        "ffmpeg command must succeed: {}",
        String::from_utf8_lossy(&status.stderr)
    );
    output
}

#[test]
fn probe_media_reports_video_dimensions_and_rate() {
    let sample = make_sample_video();

    let info = probe_media(&sample).expect("probe should succeed");

    let video = info.first_video().expect("video stream should exist");
    assert_eq!(video.width, Some(160));
    assert_eq!(video.height, Some(90));
    let rate = video.r_frame_rate.expect("frame rate should be reported");
    assert_eq!(rate.num / rate.den, 30);
}

#[test]
fn probe_frame_count_matches_generated_clip_length() {
    let sample = make_sample_video();

    let frames = probe_frame_count(&sample).expect("frame count should be probed");

    assert_eq!(frames, 36);
}

#[test]
fn decode_frame_at_index_returns_rgba_of_stream_size() {
    let sample = make_sample_video();

    let frame = decode_video_frame_at_index(&sample, 10).expect("frame decode should succeed");

    assert_eq!(frame.index, 10);
    assert_eq!(frame.width, 160);
    assert_eq!(frame.height, 90);
    assert_eq!(frame.rgba.len(), 160 * 90 * 4);
}

#[test]
fn decode_frame_past_the_end_is_reported() {
    let sample = make_sample_video();

    let result = decode_video_frame_at_index(&sample, 500);

    // Depending on the ffmpeg build, an empty selection either exits cleanly
    // with no output or fails the command.
    assert!(matches!(
        result,
        Err(MediaFfmpegError::FrameNotDecoded { index: 500, .. })
            | Err(MediaFfmpegError::CommandFailed { .. })
    ));
}
