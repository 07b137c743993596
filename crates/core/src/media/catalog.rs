// crates/core/src/media/catalog.rs
//! Turns an extractor's raw format list into the encoding options offered to clients.

use super::types::{EncodingOption, MediaInfo, MediaMetadata, RawFormat};
use crate::format::format_duration;

/// Tier heights offered, best first.
const TIER_HEIGHTS: [u32; 5] = [1080, 720, 480, 360, 240];

/// Build the client-facing metadata for a source.
pub fn describe(info: &MediaInfo) -> MediaMetadata {
    let mut formats = tier_options(&info.formats);
    if formats.is_empty() {
        formats.extend(fallback_option(&info.formats));
    }
    sort_options(&mut formats);

    MediaMetadata {
        title: info.title_or_default().to_string(),
        duration: format_duration(info.duration.map(|d| d.max(0.0) as u64)),
        thumbnail: info.thumbnail.clone().unwrap_or_default(),
        formats,
    }
}

/// One option per available tier height, backed by the largest mp4/webm at that height.
fn tier_options(formats: &[RawFormat]) -> Vec<EncodingOption> {
    TIER_HEIGHTS
        .iter()
        .filter_map(|&height| {
            let best = formats
                .iter()
                .filter(|f| f.height == Some(height) && f.has_video() && f.is_web_container())
                .max_by_key(|f| f.filesize.unwrap_or(0))?;
            Some(EncodingOption {
                format_id: format!("best[height<={height}]"),
                ext: best.ext.clone().unwrap_or_else(|| "mp4".to_string()),
                resolution: best.resolution_label(),
                filesize: best.filesize,
                vcodec: best.vcodec.clone().unwrap_or_else(|| "unknown".to_string()),
                acodec: "bestaudio".to_string(),
            })
        })
        .collect()
}

fn fallback_option(formats: &[RawFormat]) -> Option<EncodingOption> {
    let f = formats
        .iter()
        .find(|f| f.has_video() && f.is_web_container())?;
    Some(EncodingOption {
        format_id: f.format_id.clone(),
        ext: f.ext.clone().unwrap_or_else(|| "mp4".to_string()),
        resolution: f.resolution_label(),
        filesize: f.filesize,
        vcodec: f.vcodec.clone().unwrap_or_else(|| "unknown".to_string()),
        acodec: "bestaudio".to_string(),
    })
}

/// Descending height, mp4 ahead of other containers on ties.
fn sort_options(options: &mut [EncodingOption]) {
    options.sort_by_key(|o| {
        let height = o
            .resolution
            .strip_suffix('p')
            .and_then(|h| h.parse::<u32>().ok())
            .unwrap_or(0);
        (std::cmp::Reverse(height), o.ext != "mp4")
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn video(id: &str, ext: &str, height: u32, size: Option<u64>) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: Some(ext.to_string()),
            height: Some(height),
            width: Some(height * 16 / 9),
            vcodec: Some("avc1".to_string()),
            acodec: Some("none".to_string()),
            filesize: size,
            format_note: None,
        }
    }

    #[test]
    fn test_one_option_per_available_tier() {
        let info = MediaInfo {
            title: Some("Clip".into()),
            duration: Some(125.0),
            thumbnail: Some("t.jpg".into()),
            formats: vec![
                video("a", "mp4", 360, Some(10)),
                video("b", "webm", 720, Some(50)),
                video("c", "mp4", 720, Some(40)),
                video("d", "mp4", 1080, None),
                video("e", "mp4", 1440, Some(900)),
            ],
        };

        let meta = describe(&info);
        assert_eq!(meta.title, "Clip");
        assert_eq!(meta.duration, "02:05");
        assert_eq!(meta.thumbnail, "t.jpg");

        let ids: Vec<_> = meta.formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, vec!["best[height<=1080]", "best[height<=720]", "best[height<=360]"]);

        // largest file at 720p wins even though it is webm
        assert_eq!(meta.formats[1].ext, "webm");
        assert_eq!(meta.formats[1].filesize, Some(50));
        assert!(meta.formats.iter().all(|f| f.acodec == "bestaudio"));
    }

    #[test]
    fn test_audio_only_and_other_containers_ignored() {
        let mut audio = video("140", "m4a", 0, Some(5));
        audio.height = None;
        audio.vcodec = Some("none".into());
        let info = MediaInfo {
            formats: vec![audio, video("f", "flv", 720, Some(1))],
            ..Default::default()
        };
        let meta = describe(&info);
        assert!(meta.formats.is_empty());
        assert_eq!(meta.title, "Unknown Title");
        assert_eq!(meta.duration, "Unknown");
    }

    #[test]
    fn test_fallback_when_no_tier_height_matches() {
        let info = MediaInfo {
            formats: vec![video("odd", "webm", 544, Some(7))],
            ..Default::default()
        };
        let meta = describe(&info);
        assert_eq!(meta.formats.len(), 1);
        assert_eq!(meta.formats[0].format_id, "odd");
        assert_eq!(meta.formats[0].resolution, "544p");
    }

    #[test]
    fn test_sort_prefers_mp4_on_ties() {
        let mut options = vec![
            EncodingOption {
                format_id: "w".into(),
                ext: "webm".into(),
                resolution: "720p".into(),
                filesize: None,
                vcodec: "vp9".into(),
                acodec: "bestaudio".into(),
            },
            EncodingOption {
                format_id: "m".into(),
                ext: "mp4".into(),
                resolution: "720p".into(),
                filesize: None,
                vcodec: "avc1".into(),
                acodec: "bestaudio".into(),
            },
            EncodingOption {
                format_id: "hi".into(),
                ext: "webm".into(),
                resolution: "1080p".into(),
                filesize: None,
                vcodec: "vp9".into(),
                acodec: "bestaudio".into(),
            },
        ];
        sort_options(&mut options);
        let ids: Vec<_> = options.iter().map(|o| o.format_id.as_str()).collect();
        assert_eq!(ids, vec!["hi", "m", "w"]);
    }
}
