//! Trim pipeline integration tests
//!
//! All tests run on a paused tokio clock, so debounce windows and transcode
//! delays are exact and the suite does not actually sleep.

mod helpers;

use helpers::{DurationByteDecoder, GatedDecoder, MockDecoder, MockTranscoder, PanickingDecoder};
use sfx_trim::audio::slicer;
use sfx_trim::config::TrimSettings;
use sfx_trim::trim::{TrimController, TrimUpdate};
use sfx_trim::{DecodeError, Error, SampleBuffer, TranscodeError, TrimEvent, TrimPipeline, TrimRegion};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

const SOURCE_SECS: f64 = 10.0;

fn region(start: f64, end: f64) -> TrimRegion {
    TrimRegion::new(start, end, SOURCE_SECS, 0.1).unwrap()
}

fn source_buffer() -> SampleBuffer {
    SampleBuffer::silence(44100, 1, (SOURCE_SECS * 44100.0) as usize).unwrap()
}

fn drain(rx: &mut broadcast::Receiver<TrimEvent>) -> Vec<TrimEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count(events: &[TrimEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_triggers_one_recompute_with_final_region() {
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(
        MockDecoder::new(source_buffer()),
        transcoder.clone(),
        TrimSettings::default(),
    );

    let source = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "Door Slam.wav")
        .await
        .unwrap();
    assert_eq!(source.generation, 1);
    assert_eq!(source.region, region(0.0, SOURCE_SECS));

    // 10 changes within 50 ms
    let burst: Vec<TrimRegion> = (0..10).map(|i| region(0.1 * i as f64, 5.0)).collect();
    for r in &burst {
        pipeline.update_region(source.generation, *r).await.unwrap();
        sleep(Duration::from_millis(5)).await;
    }
    let last = burst[9];

    let asset = pipeline.submit("Door Slam").await.unwrap();

    assert_eq!(transcoder.calls(), 1);
    assert_eq!(asset.region, Some(last));
    assert_eq!(
        transcoder.mono_frames(),
        vec![slicer::slice(&source_buffer(), last).frame_count()]
    );
    assert_eq!(asset.suggested_name, "door-slam.mp3");
    assert_eq!(asset.mime, "audio/mpeg");
}

#[tokio::test(start_paused = true)]
async fn test_debounce_window_restarts_on_each_change() {
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(
        MockDecoder::new(source_buffer()),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let source = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap();

    // Changes every 250 ms never leave a 300 ms quiet gap
    for i in 1..=4 {
        pipeline
            .update_region(source.generation, region(0.0, i as f64))
            .await
            .unwrap();
        sleep(Duration::from_millis(250)).await;
        assert_eq!(transcoder.calls(), 0);
    }

    sleep(Duration::from_millis(100)).await;
    let status = pipeline.status().await.unwrap();
    assert!(!status.recompute_pending);
    assert_eq!(transcoder.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_change_during_transcode_discards_result_and_reruns() {
    let transcoder = MockTranscoder::with_delay(Duration::from_secs(1));
    let pipeline = TrimPipeline::spawn(
        MockDecoder::new(source_buffer()),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let mut events = pipeline.subscribe();

    let source = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap();

    // Initial full-range recompute starts at 300 ms and runs for 1 s
    sleep(Duration::from_millis(400)).await;
    let status = pipeline.status().await.unwrap();
    assert!(status.recompute_in_flight);

    let latest = region(2.0, 4.0);
    pipeline.update_region(source.generation, latest).await.unwrap();

    let asset = pipeline.submit("clip").await.unwrap();
    assert_eq!(asset.region, Some(latest));
    assert_eq!(transcoder.calls(), 2);

    let events = drain(&mut events);
    assert_eq!(count(&events, "RecomputeStarted"), 2);
    assert_eq!(count(&events, "RecomputeDiscarded"), 1);
    assert_eq!(count(&events, "AssetReady"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_region_update_for_replaced_source_is_rejected() {
    let pipeline = TrimPipeline::spawn(
        std::sync::Arc::new(DurationByteDecoder),
        MockTranscoder::new(),
        TrimSettings::default(),
    );

    let first = pipeline
        .load_source(vec![10], "audio/wav", "first.wav")
        .await
        .unwrap();
    let second = pipeline
        .load_source(vec![4], "audio/wav", "second.wav")
        .await
        .unwrap();
    assert_eq!(second.generation, first.generation + 1);

    let err = pipeline
        .update_region(first.generation, region(1.0, 2.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Superseded { generation } if generation == second.generation));

    let status = pipeline.status().await.unwrap();
    assert_eq!(status.region, Some(second.region));
}

#[tokio::test(start_paused = true)]
async fn test_new_source_discards_in_flight_recompute() {
    let transcoder = MockTranscoder::with_delay(Duration::from_secs(1));
    let pipeline = TrimPipeline::spawn(
        std::sync::Arc::new(DurationByteDecoder),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let mut events = pipeline.subscribe();

    pipeline
        .load_source(vec![10], "audio/wav", "long.wav")
        .await
        .unwrap();
    sleep(Duration::from_millis(400)).await;

    let second = pipeline
        .load_source(vec![4], "audio/wav", "short.wav")
        .await
        .unwrap();
    let asset = pipeline.submit("short").await.unwrap();

    assert_eq!(asset.region, Some(second.region));
    assert_eq!(second.region.end(), 4.0);
    assert_eq!(transcoder.mono_frames(), vec![10 * 44100, 4 * 44100]);

    let events = drain(&mut events);
    assert_eq!(count(&events, "SourceLoaded"), 2);
    assert_eq!(count(&events, "RecomputeDiscarded"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_load_during_decode_supersedes_the_unfinished_source() {
    let decoder = GatedDecoder::new();
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(decoder.clone(), transcoder.clone(), TrimSettings::default());
    let mut events = pipeline.subscribe();

    // 3 s source whose decode is held open
    let slow = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.load_source(vec![3, 1], "audio/wav", "slow.wav").await })
    };
    decoder.held.notified().await;

    let fast = pipeline
        .load_source(vec![2, 0], "audio/wav", "fast.wav")
        .await
        .unwrap();
    assert_eq!(fast.generation, 2);
    assert_eq!(fast.duration_secs, 2.0);

    let err = slow.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Superseded { generation: 2 }));

    // Let the stale decode finish; its buffer must go nowhere
    decoder.open();
    decoder.released.notified().await;

    let status = pipeline.status().await.unwrap();
    assert_eq!(status.generation, 2);
    assert_eq!(status.region, Some(fast.region));

    let asset = pipeline.submit("fast").await.unwrap();
    assert_eq!(asset.region, Some(fast.region));
    assert_eq!(transcoder.mono_frames(), vec![2 * 44100]);

    let events = drain(&mut events);
    assert_eq!(count(&events, "SourceLoaded"), 1);
    assert_eq!(count(&events, "SourceFailed"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_decoder_panic_is_reported_as_unavailable_capability() {
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(
        std::sync::Arc::new(PanickingDecoder),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let mut events = pipeline.subscribe();

    let err = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::CapabilityUnavailable(_))));

    // The actor survives and keeps reporting the failure
    let status = pipeline.status().await.unwrap();
    assert!(!status.decoding);
    assert!(status.region.is_none());
    assert!(status.last_error.unwrap().contains("Decode task failed"));

    let err = pipeline.submit("x").await.unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::CapabilityUnavailable(_))));
    assert_eq!(transcoder.calls(), 0);
    assert_eq!(count(&drain(&mut events), "SourceFailed"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transcode_failure_keeps_previous_asset() {
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(
        MockDecoder::new(source_buffer()),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let mut events = pipeline.subscribe();
    let source = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap();

    let good = pipeline.submit("first").await.unwrap();
    assert_eq!(good.region, Some(source.region));

    transcoder.set_failing(true);
    pipeline
        .update_region(source.generation, region(1.0, 2.0))
        .await
        .unwrap();
    let kept = pipeline.submit("second").await.unwrap();

    assert_eq!(kept.region, Some(source.region));
    assert_eq!(kept.bytes, good.bytes);
    assert_eq!(kept.suggested_name, "second.mp3");

    let status = pipeline.status().await.unwrap();
    assert!(status.asset_ready);
    assert!(status.last_error.unwrap().contains("injected failure"));
    assert_eq!(count(&drain(&mut events), "TranscodeFailed"), 1);

    // Next successful recompute clears the error
    transcoder.set_failing(false);
    pipeline
        .update_region(source.generation, region(1.0, 3.0))
        .await
        .unwrap();
    let fresh = pipeline.submit("third").await.unwrap();
    assert_eq!(fresh.region, Some(region(1.0, 3.0)));
    assert!(pipeline.status().await.unwrap().last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_any_asset_reports_transcode_error() {
    let transcoder = MockTranscoder::new();
    transcoder.set_failing(true);
    let pipeline = TrimPipeline::spawn(
        MockDecoder::silence(2.0),
        transcoder,
        TrimSettings::default(),
    );
    pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap();

    let err = pipeline.submit("x").await.unwrap_err();
    assert!(matches!(err, Error::Transcode(TranscodeError::EncodeFailed(_))));
}

#[tokio::test(start_paused = true)]
async fn test_submit_before_load_is_nothing_to_submit() {
    let pipeline = TrimPipeline::spawn(
        MockDecoder::silence(1.0),
        MockTranscoder::new(),
        TrimSettings::default(),
    );
    let err = pipeline.submit("x").await.unwrap_err();
    assert!(matches!(err, Error::NothingToSubmit(_)));
}

#[tokio::test(start_paused = true)]
async fn test_non_audio_upload_is_refused_before_decoding() {
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(
        MockDecoder::silence(1.0),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let mut events = pipeline.subscribe();

    let err = pipeline
        .load_source(vec![0u8; 16], "text/plain", "notes.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::UnsupportedFormat(_))));

    let err = pipeline.submit("x").await.unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::UnsupportedFormat(_))));
    assert_eq!(transcoder.calls(), 0);
    assert_eq!(count(&drain(&mut events), "SourceFailed"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_region_is_rejected() {
    let pipeline = TrimPipeline::spawn(
        MockDecoder::silence(2.0),
        MockTranscoder::new(),
        TrimSettings::default(),
    );
    let source = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap();

    // Valid for a 10 s track, not for this 2 s one
    let err = pipeline
        .update_region(source.generation, region(1.0, 5.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRegion(_)));
}

#[tokio::test(start_paused = true)]
async fn test_short_region_request_is_clamped_end_to_end() {
    let transcoder = MockTranscoder::new();
    let pipeline = TrimPipeline::spawn(
        MockDecoder::new(source_buffer()),
        transcoder.clone(),
        TrimSettings::default(),
    );
    let source = pipeline
        .load_source(vec![0u8; 16], "audio/wav", "a.wav")
        .await
        .unwrap();

    let mut controller = TrimController::for_duration(source.duration_secs, 800.0);
    let clamped = match controller.set_region(2.0, 2.05) {
        TrimUpdate::Region(region) => region,
        other => panic!("expected region update, got {:?}", other),
    };
    assert_eq!(clamped.start(), 2.0);
    assert!((clamped.end() - 2.1).abs() < 1e-9);

    pipeline.update_region(source.generation, clamped).await.unwrap();
    let asset = pipeline.submit("blip").await.unwrap();

    assert_eq!(asset.region, Some(clamped));
    assert_eq!(transcoder.mono_frames(), vec![4410]);
}
