use lib_common::configs::RelayConfig;
use lib_common::core::ProcessOutcome;
use lib_common::model::SourceDialect;
use lib_common::parsers::ParseFailure;
use project_tests::*;

#[test]
fn test_chilli_hub_sample_is_relayed() {
    let pipeline = pipeline(RelayConfig::default());
    let mut listener = pipeline.dispatcher().register("listener");

    let outcome = pipeline.process(&text_message(chilli_hub_content()));
    let ProcessOutcome::Accepted(event) = outcome else {
        panic!("expected the sample to be accepted, got {:?}", outcome);
    };

    assert_eq!(event.source_dialect, SourceDialect::Emoji);
    assert_eq!(event.name.as_deref(), Some("La Karkerkar Combinasion"));
    assert_eq!(event.money_rate, Some(0.6));
    assert_eq!(event.money_raw.as_deref(), Some("$600K/s"));
    assert_eq!(event.players.as_deref(), Some("5/8"));
    assert_eq!(event.job_id.as_deref(), Some(JOB_ID));
    assert_eq!(event.join_link.as_deref(), Some("Click to Join"));
    assert!(event.script.as_deref().is_some_and(|s| s.contains("TeleportService")));
    assert!(!event.is_high_value);

    assert_eq!(pipeline.queue().len(), 1);
    let line = listener.lines.try_recv().expect("listener should get the wire line");
    assert!(line.starts_with("name=La Karkerkar Combinasion|money=0.6|players=5/8|job_id="));
    assert!(line.ends_with("|is_10m_plus=false"));

    let stats = pipeline.stats().snapshot(0);
    assert_eq!(stats.messages_processed, 1);
    assert_eq!(stats.servers_sent, 1);
}

#[test]
fn test_positional_post_gets_a_synthesized_script() {
    let pipeline = pipeline(RelayConfig::default());
    let outcome = pipeline.process(&text_message(positional_content("5", "$1.2M/s")));
    let ProcessOutcome::Accepted(event) = outcome else {
        panic!("expected acceptance, got {:?}", outcome);
    };

    let config = RelayConfig::default();
    assert_eq!(event.source_dialect, SourceDialect::Positional);
    assert_eq!(event.players.as_deref(), Some("5/18"));
    assert_eq!(event.money_rate, Some(1.2));
    assert_eq!(event.script, Some(config.positional.script_for(JOB_ID)));
}

#[test]
fn test_positional_zero_income_is_filtered() {
    let pipeline = pipeline(RelayConfig::default());
    let outcome = pipeline.process(&text_message(positional_content("5", "0/s")));
    assert_eq!(
        outcome,
        ProcessOutcome::Filtered {
            reason: "positional server has zero income (ignored)".into()
        }
    );
    assert!(pipeline.queue().is_empty());
    assert_eq!(pipeline.stats().snapshot(0).servers_filtered, 1);
}

#[test]
fn test_overfull_positional_server_is_filtered_on_players() {
    let pipeline = pipeline(RelayConfig::default());
    let outcome = pipeline.process(&text_message(positional_content("20", "$3M/s")));
    let ProcessOutcome::Filtered { reason } = outcome else {
        panic!("expected a rejection, got {:?}", outcome);
    };
    assert!(reason.contains("positional players 20 not in range"), "unexpected reason: {reason}");
    assert!(!reason.contains("income"));
}

#[test]
fn test_forwarded_embed_is_rescued() {
    let pipeline = pipeline(RelayConfig::default());
    let message = forwarded_message(structured_embed("**Foo**", "**$1.5M/s**", "3/8"));

    let ProcessOutcome::Accepted(event) = pipeline.process(&message) else {
        panic!("forwarded embed should be accepted");
    };
    assert_eq!(event.source_dialect, SourceDialect::Structured);
    assert_eq!(event.money_rate, Some(1.5));
    assert_eq!(event.job_id.as_deref(), Some(JOB_ID));
}

#[test]
fn test_high_value_embed_passes_when_bypassed() {
    let pipeline = pipeline(RelayConfig::default());
    let message = embed_message(structured_embed("Big", "$25M/s", "2/8"));
    let ProcessOutcome::Accepted(event) = pipeline.process(&message) else {
        panic!("high-value server should be accepted by default");
    };
    assert!(event.is_high_value);

    let mut config = RelayConfig::default();
    config.filters.bypass_high_value = false;
    let blocked = project_tests::pipeline(config).process(&message);
    assert!(matches!(blocked, ProcessOutcome::Filtered { .. }));
}

#[test]
fn test_unwatched_channel_and_empty_message() {
    let pipeline = pipeline(RelayConfig::default());

    let mut foreign = text_message(chilli_hub_content());
    foreign.channel_id = "42".into();
    assert_eq!(pipeline.process(&foreign), ProcessOutcome::IgnoredChannel);

    let blank = text_message("   ");
    assert_eq!(
        pipeline.process(&blank),
        ProcessOutcome::Unparsed(ParseFailure::NoDialect)
    );

    let stats = pipeline.stats().snapshot(0);
    assert_eq!(stats.messages_ignored, 1);
    assert_eq!(stats.messages_unparsed, 1);
    assert_eq!(stats.messages_processed, 0);
}
