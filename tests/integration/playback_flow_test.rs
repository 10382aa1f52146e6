//! End-to-end playback flows against the simulated backend

use crate::test_utils::{Rig, NOW_PLAYING};
use hope_radio::audio::{FocusChange, TrackId};
use hope_radio::config::Settings;
use hope_radio::metadata::StreamInfo;
use hope_radio::player::{PlaybackAction, PlaybackState};
use hope_radio::service::{NotificationAction, NotificationIntent};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_play_reaches_playing_with_notification_and_metadata() {
    let mut rig = Rig::start();
    rig.wait_for_state(PlaybackState::None).await;

    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Buffering).await;
    let playing = rig.wait_for_state(PlaybackState::Playing).await;
    assert!(playing.allows(PlaybackAction::Pause));
    assert!(rig.service.is_keep_alive());
    assert!(rig.service.is_session_active());

    let expected = StreamInfo::parse(NOW_PLAYING).expect("well-formed line");
    assert_eq!(rig.service.session_metadata(), expected);

    let (notification, foreground) = rig.surface.current().expect("notification posted");
    assert!(foreground);
    assert!(notification.ongoing);
    assert!(rig.surface.first_state() != Some(PlaybackState::None));
    assert_eq!(notification.title, "Hope Choir");
    assert_eq!(notification.text, "Evening Hymn");
    assert_eq!(notification.action, NotificationAction::Pause);

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_and_stop() {
    let mut rig = Rig::start();
    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;

    rig.handle.pause().await.expect("pause accepted");
    rig.wait_for_state(PlaybackState::Paused).await;
    assert!(!rig.service.is_polling_metadata());
    let (notification, foreground) = rig.surface.current().expect("still posted while paused");
    assert!(!foreground);
    assert!(!notification.ongoing);
    assert_eq!(notification.action, NotificationAction::Play);

    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;

    rig.handle.stop().await.expect("stop accepted");
    let stopped = rig.wait_for_state(PlaybackState::Stopped).await;
    assert_eq!(stopped.error_message(), None);
    assert!(rig.surface.current().is_none());
    assert!(rig.service.is_idle_timer_armed());
    assert!(!rig.focus.is_held());

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_transient_focus_loss_resumes() {
    let mut rig = Rig::start();
    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;
    assert!(rig.focus.is_held());

    assert!(rig.focus.simulate(FocusChange::LossTransient));
    let paused = rig.wait_for_state(PlaybackState::Paused).await;
    assert!(paused.allows(PlaybackAction::Pause));
    assert!(!rig.service.is_keep_alive());

    assert!(rig.focus.simulate(FocusChange::Gain));
    rig.wait_for_state(PlaybackState::Playing).await;
    let (notification, foreground) = rig.surface.current().expect("notification posted");
    assert!(foreground);
    assert!(notification.ongoing);
    assert!(rig.service.is_keep_alive());
    assert!(rig.service.is_polling_metadata());

    assert!(rig.focus.simulate(FocusChange::Loss));
    rig.wait_for_state(PlaybackState::Paused).await;
    assert!(rig.focus.simulate(FocusChange::Gain));
    tokio::time::sleep(Duration::from_secs(1)).await;
    let snapshot = rig.handle.snapshot().await.expect("snapshot answered");
    assert_eq!(snapshot.state(), PlaybackState::Paused);

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unplugging_headphones_stops_playback() {
    let mut rig = Rig::start();
    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;
    assert!(rig.route.is_subscribed());

    assert!(rig.route.unplug());
    rig.wait_for_state(PlaybackState::Stopped).await;
    assert!(!rig.route.is_subscribed());
    assert!(!rig.route.unplug());

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_idle_service_requests_shutdown() {
    let mut rig = Rig::start();
    let mut stop = rig.service.stop_requested();
    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;
    rig.handle.stop().await.expect("stop accepted");
    rig.wait_for_state(PlaybackState::Stopped).await;

    tokio::time::timeout(Duration::from_secs(1801), stop.changed())
        .await
        .expect("idle timer fired")
        .expect("service alive");
    assert!(*stop.borrow());

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_notification_intent_pauses() {
    let mut rig = Rig::start();
    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;

    rig.service.notification_intent(NotificationIntent::Pause);
    rig.wait_for_state(PlaybackState::Paused).await;

    rig.service.notification_intent(NotificationIntent::Stop);
    rig.wait_for_state(PlaybackState::Stopped).await;

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_rendition_selection() {
    let mut rig = Rig::start();
    rig.handle.play().await.expect("play accepted");
    rig.wait_for_state(PlaybackState::Playing).await;

    let tracks = rig.handle.tracks().await.expect("tracks answered");
    assert_eq!(tracks.available_bitrates(), vec![64_000, 128_000, 256_000]);
    assert_eq!(tracks.selected(), TrackId::Adaptive);

    rig.handle.select_track(TrackId::Index(2)).await.expect("selection accepted");
    rig.handle.select_track(TrackId::Index(7)).await.expect("selection accepted");
    let tracks = rig.handle.tracks().await.expect("tracks answered");
    assert_eq!(tracks.selected(), TrackId::Index(2));

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_metadata_published_then_cleared_on_stop() {
    let settings = Settings {
        metadata_poll_secs: 30,
        ..Settings::default()
    };
    let mut rig = Rig::start_with(settings);
    rig.handle.play().await.expect("play accepted");

    let info = rig.wait_for_metadata().await;
    assert_eq!(info, StreamInfo::new("Hope Choir", "Evening Hymn"));

    rig.handle.stop().await.expect("stop accepted");
    let cleared = rig.wait_for_metadata().await;
    assert!(cleared.is_empty());
    assert!(!rig.service.is_polling_metadata());

    rig.shutdown().await;
}
