//! SMD 101 decoder. No recorder or encoder; reports player state instead.

use crate::model::{Lexicon, MetricSpec, ModelKey, ModelSpec, TimestampFormat};

pub static SMD101: ModelSpec = ModelSpec {
    key: ModelKey::Smd101,
    identities: &["SMD 101"],
    uris: &[
        "/unit/name",
        "/unit/temp/internal",
        "/unit/cpu_usage",
        "/unit/memory_usage",
        "/unit/usage_user",
        "/xtime/date",
        "/xtime/timezone_offset",
        "/unit/location",
        "/player/1",
        "/player/1/stream_statistics",
        "/player/history/entries?count=1",
    ],
    metrics: &[
        MetricSpec::value(
            "extron_temp_internal",
            "Internal temperature in degrees Celsius",
            r#"$[?@.meta.uri=="/unit/temp/internal"].result"#,
        ),
        MetricSpec::value(
            "extron_cpu_usage",
            "CPU usage in percent",
            r#"$[?@.meta.uri=="/unit/cpu_usage"].result[0]"#,
        ),
        MetricSpec::value(
            "extron_ram_usage",
            "Memory usage in percent",
            r#"$[?@.meta.uri=="/unit/memory_usage"].result"#,
        ),
        // The decoder has no recording disk; user storage stands in for it.
        MetricSpec::value(
            "extron_internal_disk_used",
            "Used space on the internal disk",
            r#"$[?@.meta.uri=="/unit/usage_user"].result.used"#,
        ),
        MetricSpec::value(
            "extron_internal_disk_total",
            "Total space on the internal disk",
            r#"$[?@.meta.uri=="/unit/usage_user"].result.total"#,
        ),
        MetricSpec::value(
            "extron_internal_disk_free",
            "Free space on the internal disk",
            r#"$[?@.meta.uri=="/unit/usage_user"].result.available"#,
        ),
        MetricSpec::value(
            "extron_xtime_date",
            "Unit clock as Unix epoch seconds",
            r#"$[?@.meta.uri=="/xtime/date"].result"#,
        )
        .with_lexicon(Lexicon::Timestamp(TimestampFormat::HttpDate)),
        MetricSpec::value(
            "extron_play_state",
            "Player state (0 = stopped, 1 = paused, 2 = playing, -1 = unknown)",
            r#"$[?@.meta.uri=="/player/1"].result.play_state"#,
        )
        .with_lexicon(Lexicon::PlayState),
        // Reported as `00:00:35.429886000`, empty while idle.
        MetricSpec::value(
            "extron_player_time",
            "Player position as reported by the unit, digits only",
            r#"$[?@.meta.uri=="/player/1"].result.time"#,
        )
        .with_lexicon(Lexicon::ElapsedTime),
        MetricSpec::value(
            "extron_player_stream_audio_bitrate",
            "Audio bitrate of the current stream in kbit/s",
            r#"$[?@.meta.uri=="/player/1/stream_statistics"].result.audio_bitrate_kbps"#,
        ),
        MetricSpec::value(
            "extron_player_stream_video_bitrate",
            "Video bitrate of the current stream in kbit/s",
            r#"$[?@.meta.uri=="/player/1/stream_statistics"].result.video_bitrate_kbps"#,
        ),
        MetricSpec::value(
            "extron_player_history_latest_date",
            "Start of the most recent playback as Unix epoch seconds",
            r#"$[?@.meta.uri=="/player/history/entries?count=1"].result[0].date"#,
        )
        .with_lexicon(Lexicon::Timestamp(TimestampFormat::IsoLocal)),
    ],
};
