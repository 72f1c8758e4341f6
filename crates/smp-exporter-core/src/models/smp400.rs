//! SMP 401.
//!
//! Compared to the SMP 300 series: record state is numeric (paused = 3),
//! streaming is controlled per streamer slot (enabled = 2) in a different
//! slot order, and the output meters report positive levels.

use crate::model::{Correction, Lexicon, MetricSpec, ModelKey, ModelSpec, TimestampFormat};

pub static SMP400: ModelSpec = ModelSpec {
    key: ModelKey::Smp400,
    identities: &["SMP 401"],
    uris: &[
        "/unit/name",
        "/unit/temp/internal",
        "/unit/temp/board",
        "/unit/temp/cpu",
        "/unit/cpu_usage",
        "/unit/memory_usage",
        "/record/free_space",
        "/audio/dsp/oid/60002/v",
        "/audio/dsp/oid/60003/v",
        "/video/in/channel/1",
        "/video/in/channel/2",
        "/record/state",
        "/xtime/date",
        "/xtime/timezone_offset",
        "/schedule_ingest/active_service",
        "/publish/active_service",
        "/schedule/schedule?format=json&field=db_id,state",
        "/unit/location",
        "/streamer/control/1/mode",
        "/streamer/control/2/mode",
        "/streamer/control/3/mode",
        "/video/out/1/presets/layout/active",
        "/streamer/rtmp/1",
        "/streamer/rtmp/2",
        "/streamer/rtmp/3",
    ],
    metrics: &[
        MetricSpec::value(
            "extron_temp_internal",
            "Internal temperature in degrees Celsius",
            r#"$[?@.meta.uri=="/unit/temp/internal"].result"#,
        ),
        MetricSpec::value(
            "extron_temp_board1",
            "Main board temperature in degrees Celsius",
            r#"$[?@.meta.uri=="/unit/temp/board"].result"#,
        ),
        MetricSpec::value(
            "extron_temp_cpu",
            "CPU temperature in degrees Celsius",
            r#"$[?@.meta.uri=="/unit/temp/cpu"].result"#,
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
        MetricSpec::value(
            "extron_internal_disk_used",
            "Used space on the internal recording disk",
            r#"$[?@.meta.uri=="/record/free_space"].result.internal[0].used"#,
        ),
        MetricSpec::value(
            "extron_internal_disk_total",
            "Total space on the internal recording disk",
            r#"$[?@.meta.uri=="/record/free_space"].result.internal[0].total"#,
        ),
        MetricSpec::value(
            "extron_internal_disk_free",
            "Free space on the internal recording disk",
            r#"$[?@.meta.uri=="/record/free_space"].result.internal[0].free_space"#,
        ),
        MetricSpec::value(
            "extron_audio_dsp_left",
            "Left output audio meter level in dB (non-positive)",
            r#"$[?@.meta.uri=="/audio/dsp/oid/60002/v"].result"#,
        )
        .with_correction(Correction::MeterLevel),
        MetricSpec::value(
            "extron_audio_dsp_right",
            "Right output audio meter level in dB (non-positive)",
            r#"$[?@.meta.uri=="/audio/dsp/oid/60003/v"].result"#,
        )
        .with_correction(Correction::MeterLevel),
        MetricSpec::value(
            "extron_video_in_channel_a",
            "Active video input of channel A",
            r#"$[?@.meta.uri=="/video/in/channel/1"].result.active_input"#,
        ),
        MetricSpec::value(
            "extron_video_in_channel_b",
            "Active video input of channel B",
            r#"$[?@.meta.uri=="/video/in/channel/2"].result.active_input"#,
        ),
        MetricSpec::value(
            "extron_record_state",
            "Recorder state (0 = stopped, 1 = paused, 2 = recording, -1 = unknown)",
            r#"$[?@.meta.uri=="/record/state"].result.state"#,
        )
        .with_lexicon(Lexicon::RecordState)
        .with_correction(Correction::RecordState),
        MetricSpec::value(
            "extron_xtime_date",
            "Unit clock as Unix epoch seconds",
            r#"$[?@.meta.uri=="/xtime/date"].result"#,
        )
        .with_lexicon(Lexicon::Timestamp(TimestampFormat::HttpDate)),
        MetricSpec::value(
            "extron_schedule_ingest_active",
            "Whether the schedule ingest service is active",
            r#"$[?@.meta.uri=="/schedule_ingest/active_service"].result.active"#,
        ),
        MetricSpec::value(
            "extron_publish_active",
            "Whether the publish service is active",
            r#"$[?@.meta.uri=="/publish/active_service"].result.active"#,
        ),
        MetricSpec::count(
            "extron_schedule_state_upcoming",
            "Number of scheduled events in state upcoming (0)",
            r#"$[?@.meta.uri=="/schedule/schedule?format=json&field=db_id,state"].result[?@.state==0].state"#,
        ),
        MetricSpec::count(
            "extron_schedule_state_transfer_skipped",
            "Number of scheduled events in state transfer skipped (11)",
            r#"$[?@.meta.uri=="/schedule/schedule?format=json&field=db_id,state"].result[?@.state==11].state"#,
        ),
        MetricSpec::count(
            "extron_schedule_state_transfer_completed",
            "Number of scheduled events in state transfer completed (5)",
            r#"$[?@.meta.uri=="/schedule/schedule?format=json&field=db_id,state"].result[?@.state==5].state"#,
        ),
        MetricSpec::count(
            "extron_schedule_state_transfer_no_method",
            "Number of scheduled events in state no transfer method (10)",
            r#"$[?@.meta.uri=="/schedule/schedule?format=json&field=db_id,state"].result[?@.state==10].state"#,
        ),
        // Streamer control slot 1 carries what the SMP 300 reports as encoder 3.
        MetricSpec::value(
            "extron_encoder_3_stream_enabled",
            "Whether stream 3 (confidence/program) is enabled",
            r#"$[?@.meta.uri=="/streamer/control/1/mode"].result"#,
        )
        .with_correction(Correction::StreamEnabled),
        // Slot 2 is channel A (encoder 1 on the SMP 300).
        MetricSpec::value(
            "extron_encoder_1_stream_enabled",
            "Whether stream 1 (channel A) is enabled",
            r#"$[?@.meta.uri=="/streamer/control/2/mode"].result"#,
        )
        .with_correction(Correction::StreamEnabled),
        // Slot 3 is channel B (encoder 2 on the SMP 300).
        MetricSpec::value(
            "extron_encoder_2_stream_enabled",
            "Whether stream 2 (channel B) is enabled",
            r#"$[?@.meta.uri=="/streamer/control/3/mode"].result"#,
        )
        .with_correction(Correction::StreamEnabled),
        MetricSpec::value(
            "extron_video_out_1_layout",
            "Index of the active output layout preset",
            r#"$[?@.meta.uri=="/video/out/1/presets/layout/active"].result.active_index"#,
        ),
        MetricSpec::value(
            "extron_streamer_1_rtmp",
            "RTMP publish control of streamer 1",
            r#"$[?@.meta.uri=="/streamer/rtmp/1"].result.pub_control"#,
        ),
        MetricSpec::value(
            "extron_streamer_2_rtmp",
            "RTMP publish control of streamer 2",
            r#"$[?@.meta.uri=="/streamer/rtmp/2"].result.pub_control"#,
        ),
        MetricSpec::value(
            "extron_streamer_3_rtmp",
            "RTMP publish control of streamer 3",
            r#"$[?@.meta.uri=="/streamer/rtmp/3"].result.pub_control"#,
        ),
    ],
};
