//! Presence decision scenarios over a fake calendar provider.

mod common;

use calfocus_core::presence::{check_account, decide, AccountOutcome, DeviceSignals, SkipReason};
use calfocus_core::storage::Config;

use common::*;

#[tokio::test]
async fn test_idle_device_short_circuits_without_network() {
    let provider = FakeProvider::default().with_busy("primary", vec![busy_now()]);
    let mut accounts = vec![account("a@example.com", &[("primary", true)])];
    let signals = DeviceSignals {
        active: false,
        active_tab_url: Some("https://zoom.us/j/1".into()),
    };

    let decision = decide(&provider, &mut accounts, now(), &Config::default(), &signals).await;

    assert!(!decision.in_meeting);
    assert_eq!(decision.reason, "device idle");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_call_page_wins_with_zero_accounts() {
    let provider = FakeProvider::default();
    let signals = DeviceSignals::active().with_tab("https://zoom.us/j/123");

    let decision = decide(&provider, &mut [], now(), &Config::default(), &signals).await;

    assert!(decision.in_meeting);
    assert_eq!(decision.reason, "call page: zoom.us");
}

#[tokio::test]
async fn test_call_page_ignored_when_awareness_off() {
    let provider = FakeProvider::default();
    let config = Config {
        call_page_awareness: false,
        ..Config::default()
    };
    let signals = DeviceSignals::active().with_tab("https://meet.google.com/abc");

    let decision = decide(&provider, &mut [], now(), &config, &signals).await;

    assert!(!decision.in_meeting);
    assert_eq!(decision.reason, "no meeting");
}

#[tokio::test]
async fn test_busy_without_video_link_is_not_a_meeting_by_default() {
    let provider = FakeProvider::default()
        .with_busy("primary", vec![busy_now()])
        .with_events("primary", vec![event_now("Lunch at https://example.com/menu")]);
    let mut accounts = vec![account("a@example.com", &[("primary", true)])];

    let decision = decide(
        &provider,
        &mut accounts,
        now(),
        &Config::default(),
        &DeviceSignals::active(),
    )
    .await;

    assert!(!decision.in_meeting);
    assert_eq!(decision.reason, "no meeting");
}

#[tokio::test]
async fn test_busy_counts_when_video_link_not_required() {
    let provider = FakeProvider::default().with_busy("primary", vec![busy_now()]);
    let mut accounts = vec![account("a@example.com", &[("primary", true)])];
    let config = Config {
        require_video_link: false,
        ..Config::default()
    };

    let decision = decide(&provider, &mut accounts, now(), &config, &DeviceSignals::active()).await;

    assert!(decision.in_meeting);
    assert_eq!(decision.reason, "meeting (a@example.com)");
    assert_eq!(decision.account.as_deref(), Some("a@example.com"));
    assert!(!provider.calls().iter().any(|c| c.starts_with("list_events")));
}

#[tokio::test]
async fn test_meet_link_confirms_busy_calendar() {
    let provider = FakeProvider::default()
        .with_busy("primary", vec![busy_now()])
        .with_events("primary", vec![meet_event_now()]);
    let mut accounts = vec![account("a@example.com", &[("primary", true)])];

    let decision = decide(
        &provider,
        &mut accounts,
        now(),
        &Config::default(),
        &DeviceSignals::active(),
    )
    .await;

    assert!(decision.in_meeting);
    assert_eq!(decision.reason, "meeting (a@example.com)");
}

#[tokio::test]
async fn test_refresh_failure_on_first_account_falls_through_to_second() {
    let mut provider = FakeProvider::default()
        .with_busy("b-primary", vec![busy_now()])
        .with_events("b-primary", vec![meet_event_now()]);
    provider
        .rejected_refresh
        .insert("rt-a@example.com".to_string());
    let mut accounts = vec![
        expiring_account("a@example.com", &[("a-primary", true)]),
        account("b@example.com", &[("b-primary", true)]),
    ];

    let decision = decide(
        &provider,
        &mut accounts,
        now(),
        &Config::default(),
        &DeviceSignals::active(),
    )
    .await;

    assert!(decision.in_meeting);
    assert_eq!(decision.reason, "meeting (b@example.com)");
    assert_eq!(decision.skipped.len(), 1);
    assert_eq!(decision.skipped[0].email, "a@example.com");
    assert_eq!(decision.skipped[0].reason, SkipReason::CredentialInvalid);
}

#[tokio::test]
async fn test_first_busy_account_wins_and_later_accounts_are_not_queried() {
    let provider = FakeProvider::default()
        .with_busy("a-primary", vec![busy_now()])
        .with_busy("b-primary", vec![busy_now()]);
    let mut accounts = vec![
        account("a@example.com", &[("a-primary", true)]),
        account("b@example.com", &[("b-primary", true)]),
    ];
    let config = Config {
        require_video_link: false,
        ..Config::default()
    };

    let decision = decide(&provider, &mut accounts, now(), &config, &DeviceSignals::active()).await;

    assert_eq!(decision.reason, "meeting (a@example.com)");
    assert_eq!(provider.calls(), vec!["free_busy:tok-a@example.com".to_string()]);
}

#[tokio::test]
async fn test_refresh_updates_credentials_in_place() {
    let provider = FakeProvider::default();
    let mut account = expiring_account("a@example.com", &[("primary", true)]);

    let outcome = check_account(&provider, &mut account, now(), &Config::default()).await;

    assert_eq!(outcome, AccountOutcome::Free);
    let credentials = account.credentials.unwrap();
    assert_eq!(credentials.access_token, "fresh-rt-a@example.com");
    assert_eq!(credentials.refresh_token.as_deref(), Some("rt-a@example.com"));
    assert!(credentials.expires_at > now() + chrono::Duration::minutes(59));
    assert!(provider
        .calls()
        .contains(&"free_busy:fresh-rt-a@example.com".to_string()));
}

#[tokio::test]
async fn test_expired_without_refresh_token_is_skipped() {
    let provider = FakeProvider::default();
    let mut account = expiring_account("a@example.com", &[("primary", true)]);
    if let Some(credentials) = account.credentials.as_mut() {
        credentials.refresh_token = None;
    }

    let outcome = check_account(&provider, &mut account, now(), &Config::default()).await;

    assert_eq!(outcome, AccountOutcome::Skipped(SkipReason::CredentialExpired));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_accounts_without_credentials_or_calendars_are_skipped() {
    let provider = FakeProvider::default();
    let mut signed_out = account("a@example.com", &[("primary", true)]);
    signed_out.credentials = None;
    let mut none_enabled = account("b@example.com", &[("primary", false)]);

    assert_eq!(
        check_account(&provider, &mut signed_out, now(), &Config::default()).await,
        AccountOutcome::Skipped(SkipReason::NoCredentials)
    );
    assert_eq!(
        check_account(&provider, &mut none_enabled, now(), &Config::default()).await,
        AccountOutcome::Skipped(SkipReason::NoCalendars)
    );
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_free_busy_failure_skips_account() {
    let mut provider = FakeProvider::default();
    provider
        .failing_free_busy
        .insert("tok-a@example.com".to_string());
    let mut account = account("a@example.com", &[("primary", true)]);

    let outcome = check_account(&provider, &mut account, now(), &Config::default()).await;

    assert_eq!(outcome, AccountOutcome::Skipped(SkipReason::ProviderUnavailable));
}

#[tokio::test]
async fn test_failing_calendar_is_skipped_and_next_busy_calendar_checked() {
    let mut provider = FakeProvider::default()
        .with_busy("broken", vec![busy_now()])
        .with_busy("team", vec![busy_now()])
        .with_events("team", vec![meet_event_now()]);
    provider.failing_events.insert("broken".to_string());
    let mut account = account("a@example.com", &[("broken", true), ("team", true)]);

    let outcome = check_account(&provider, &mut account, now(), &Config::default()).await;

    assert_eq!(outcome, AccountOutcome::InMeeting);
    assert_eq!(
        provider.calls(),
        vec![
            "free_busy:tok-a@example.com".to_string(),
            "list_events:broken".to_string(),
            "list_events:team".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_only_enabled_busy_calendars_are_confirmed_in_order() {
    let provider = FakeProvider::default()
        .with_busy("second", vec![busy_now()])
        .with_busy("first", vec![busy_now()])
        .with_busy("disabled", vec![busy_now()]);
    let mut account = account(
        "a@example.com",
        &[("first", true), ("disabled", false), ("second", true)],
    );

    let outcome = check_account(&provider, &mut account, now(), &Config::default()).await;

    assert_eq!(outcome, AccountOutcome::Free);
    assert_eq!(
        provider.calls(),
        vec![
            "free_busy:tok-a@example.com".to_string(),
            "list_events:first".to_string(),
            "list_events:second".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_cancelled_and_transparent_events_do_not_confirm() {
    let mut cancelled = meet_event_now();
    cancelled.status = Some("cancelled".into());
    let mut transparent = meet_event_now();
    transparent.transparency = Some("transparent".into());
    let provider = FakeProvider::default()
        .with_busy("primary", vec![busy_now()])
        .with_events("primary", vec![cancelled, transparent]);
    let mut account = account("a@example.com", &[("primary", true)]);

    let outcome = check_account(&provider, &mut account, now(), &Config::default()).await;

    assert_eq!(outcome, AccountOutcome::Free);
}

#[tokio::test]
async fn test_busy_interval_outside_padding_is_free() {
    let provider = FakeProvider::default().with_busy(
        "primary",
        vec![calfocus_core::integrations::BusyInterval {
            start: rfc(now() + chrono::Duration::seconds(61)),
            end: rfc(now() + chrono::Duration::minutes(30)),
        }],
    );
    let mut account = account("a@example.com", &[("primary", true)]);
    let config = Config {
        require_video_link: false,
        ..Config::default()
    };

    assert_eq!(
        check_account(&provider, &mut account, now(), &config).await,
        AccountOutcome::Free
    );
}

fn half_hour_busy_block() -> calfocus_core::integrations::BusyInterval {
    calfocus_core::integrations::BusyInterval {
        start: rfc(now() - chrono::Duration::seconds(30)),
        end: rfc(now() + chrono::Duration::seconds(1800)),
    }
}

#[tokio::test]
async fn test_busy_block_counts_without_video_link_requirement() {
    let provider = FakeProvider::default().with_busy("primary", vec![half_hour_busy_block()]);
    let mut account = account("a@example.com", &[("primary", true)]);
    let config = Config {
        lead_in_seconds: 60,
        lag_out_seconds: 60,
        require_video_link: false,
        ..Config::default()
    };

    let outcome = check_account(&provider, &mut account, now(), &config).await;

    assert_eq!(outcome, AccountOutcome::InMeeting);
}

#[tokio::test]
async fn test_transparent_linkless_event_does_not_confirm_busy_block() {
    let block = half_hour_busy_block();
    let event = calfocus_core::integrations::CalendarEvent {
        status: Some("confirmed".into()),
        transparency: Some("transparent".into()),
        start: Some(calfocus_core::integrations::EventTime {
            date: None,
            date_time: Some(block.start.clone()),
        }),
        end: Some(calfocus_core::integrations::EventTime {
            date: None,
            date_time: Some(block.end.clone()),
        }),
        ..Default::default()
    };
    let provider = FakeProvider::default()
        .with_busy("primary", vec![block])
        .with_events("primary", vec![event]);
    let mut account = account("a@example.com", &[("primary", true)]);
    let config = Config {
        lead_in_seconds: 60,
        lag_out_seconds: 60,
        require_video_link: true,
        ..Config::default()
    };

    let outcome = check_account(&provider, &mut account, now(), &config).await;

    assert_eq!(outcome, AccountOutcome::Free);
    assert!(provider
        .calls()
        .contains(&"list_events:primary".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_abandons_remaining_accounts() {
    let mut provider = FakeProvider::default().with_busy("b-primary", vec![busy_now()]);
    provider
        .hanging_tokens
        .insert("tok-a@example.com".to_string());
    let mut accounts = vec![
        account("a@example.com", &[("a-primary", true)]),
        account("b@example.com", &[("b-primary", true)]),
    ];
    let config = Config {
        require_video_link: false,
        ..Config::default()
    };

    let decision = decide(&provider, &mut accounts, now(), &config, &DeviceSignals::active()).await;

    assert!(!decision.in_meeting);
    assert_eq!(decision.reason, "no meeting");
    assert!(decision.timed_out);
    assert!(!provider
        .calls()
        .contains(&"free_busy:tok-b@example.com".to_string()));
}

#[tokio::test]
async fn test_enrollment_builds_account_from_grant() {
    use calfocus_core::integrations::oauth::AuthorizationCode;
    use calfocus_core::integrations::{enroll_account, CalendarListEntry};

    let mut provider = FakeProvider::default();
    provider.email = Some("new@example.com".into());
    provider.calendar_list = vec![
        CalendarListEntry {
            id: "new@example.com".into(),
            primary: true,
            ..CalendarListEntry::default()
        },
        CalendarListEntry {
            id: "team".into(),
            summary: Some("Team".into()),
            ..CalendarListEntry::default()
        },
    ];
    let code = AuthorizationCode {
        code: "c1".into(),
        redirect_uri: "http://localhost:19822/callback".into(),
    };

    let account = enroll_account(&provider, &code, now()).await.unwrap();

    assert_eq!(account.email, "new@example.com");
    assert_eq!(account.enabled_calendar_ids(), vec!["new@example.com".to_string()]);
    let credentials = account.credentials.unwrap();
    assert_eq!(credentials.access_token, "tok-c1");
    assert_eq!(credentials.expires_at, now() + chrono::Duration::hours(1));
}
