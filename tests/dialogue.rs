//! Dialogue engine integration tests
//!
//! Exercises turn-taking capture and ordered playback end to end against
//! in-memory fakes; no audio hardware or network services required.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc;

use viva_gateway::asr::TranscriptEvent;
use viva_gateway::dialogue::{
    AnswerOutcome, OrderedPlaybackQueue, RecordingSession, SpeechTurn, SynthesisDispatcher,
    SynthesisResult, TextUnit,
};
use viva_gateway::Error;

mod common;

use common::{
    FakeCaptureSource, FakeConnector, FakeSynthesizer, RecordingSink, SynthBehavior,
    UnavailableCaptureSource, label_payload, test_capture_params, test_turn_config,
};

fn session(connector: Arc<FakeConnector>) -> RecordingSession {
    RecordingSession::new(
        Arc::new(FakeCaptureSource),
        connector,
        test_capture_params(),
        test_turn_config(),
    )
}

// ----------------------------------------------------------------- queue

#[tokio::test]
async fn playback_follows_sequence_order_not_arrival_order() {
    let sink = Arc::new(RecordingSink::new());
    let (tx, rx) = mpsc::channel::<SynthesisResult>(16);
    let driver = OrderedPlaybackQueue::spawn(sink.clone(), rx);

    // Results arrive as [2, 0, 1]
    for seq in [2u64, 0, 1] {
        tx.send(SynthesisResult {
            seq,
            payload: Ok(label_payload(&format!("u{seq}"))),
        })
        .await
        .unwrap();
    }
    drop(tx);

    let played = driver.drain().await.unwrap();
    assert_eq!(played, 3);
    assert_eq!(sink.played(), vec!["u0", "u1", "u2"]);
}

#[tokio::test]
async fn error_slot_is_skipped_without_blocking() {
    let sink = Arc::new(RecordingSink::new());
    let (tx, rx) = mpsc::channel::<SynthesisResult>(16);
    let driver = OrderedPlaybackQueue::spawn(sink.clone(), rx);

    tx.send(SynthesisResult {
        seq: 2,
        payload: Ok(label_payload("u2")),
    })
    .await
    .unwrap();
    tx.send(SynthesisResult {
        seq: 1,
        payload: Err("synthesis failed".to_string()),
    })
    .await
    .unwrap();
    tx.send(SynthesisResult {
        seq: 0,
        payload: Ok(label_payload("u0")),
    })
    .await
    .unwrap();
    drop(tx);

    let played = driver.drain().await.unwrap();
    // The failed slot still advances the cursor
    assert_eq!(played, 3);
    assert_eq!(sink.played(), vec!["u0", "u2"]);
}

#[tokio::test]
async fn duplicate_submissions_are_idempotent() {
    let sink = Arc::new(RecordingSink::new());
    let (tx, rx) = mpsc::channel::<SynthesisResult>(16);
    let driver = OrderedPlaybackQueue::spawn(sink.clone(), rx);

    for label in ["first", "second"] {
        tx.send(SynthesisResult {
            seq: 0,
            payload: Ok(label_payload(label)),
        })
        .await
        .unwrap();
    }
    drop(tx);

    driver.drain().await.unwrap();
    assert_eq!(sink.played(), vec!["first"]);
}

// ------------------------------------------------------------ dispatcher

#[tokio::test]
async fn out_of_order_synthesis_still_plays_in_text_order() {
    // The first unit is the slowest; later units finish well before it
    let synthesizer = Arc::new(FakeSynthesizer::new(vec![
        ("Part one.", SynthBehavior::Ok(Duration::from_millis(200))),
        ("Part two.", SynthBehavior::Ok(Duration::from_millis(20))),
        ("Part three", SynthBehavior::Ok(Duration::from_millis(20))),
    ]));
    let sink = Arc::new(RecordingSink::new());

    let (tx, rx) = mpsc::channel::<SynthesisResult>(16);
    let dispatcher = SynthesisDispatcher::spawn(synthesizer.clone(), 3, tx);
    let driver = OrderedPlaybackQueue::spawn(sink.clone(), rx);

    for (seq, text) in ["Part one.", "Part two.", "Part three"].iter().enumerate() {
        dispatcher
            .dispatch(TextUnit {
                seq: seq as u64,
                text: (*text).to_string(),
            })
            .await
            .unwrap();
    }
    dispatcher.finish().await;

    driver.drain().await.unwrap();
    assert_eq!(sink.played(), vec!["Part one.", "Part two.", "Part three"]);
}

#[tokio::test]
async fn undersized_payload_becomes_skipped_slot() {
    let synthesizer = Arc::new(FakeSynthesizer::new(vec![(
        "tiny",
        SynthBehavior::TooSmall(Duration::ZERO),
    )]));
    let sink = Arc::new(RecordingSink::new());

    let (tx, rx) = mpsc::channel::<SynthesisResult>(16);
    let dispatcher = SynthesisDispatcher::spawn(synthesizer.clone(), 2, tx);
    let driver = OrderedPlaybackQueue::spawn(sink.clone(), rx);

    dispatcher
        .dispatch(TextUnit {
            seq: 0,
            text: "tiny".to_string(),
        })
        .await
        .unwrap();
    dispatcher
        .dispatch(TextUnit {
            seq: 1,
            text: "normal".to_string(),
        })
        .await
        .unwrap();
    dispatcher.finish().await;

    let played = driver.drain().await.unwrap();
    assert_eq!(played, 2);
    assert_eq!(sink.played(), vec!["normal"]);
}

// --------------------------------------------------------------- session

#[tokio::test]
async fn silent_turn_yields_no_speech_detected() {
    let connector = Arc::new(FakeConnector::with_partials(&[]));
    let handle = session(Arc::clone(&connector)).start().await.unwrap();

    let outcome = handle.finish().await.unwrap();
    assert_eq!(outcome, AnswerOutcome::NoSpeechDetected);

    // Audio streamed and the end marker went out during teardown
    assert!(connector.frames_sent.load(Ordering::SeqCst) > 0);
    assert!(connector.end_marker_sent.load(Ordering::SeqCst));
}

#[tokio::test]
async fn partials_become_utterances_in_order() {
    let connector = Arc::new(FakeConnector::with_partials(&["a", "ab", "abc", "a", "ab"]));
    let handle = session(connector).start().await.unwrap();

    let outcome = handle.finish().await.unwrap();
    match outcome {
        AnswerOutcome::Speech {
            utterances,
            warning,
        } => {
            assert_eq!(utterances, vec!["abc", "ab"]);
            assert!(warning.is_none());
        }
        AnswerOutcome::NoSpeechDetected => panic!("expected speech"),
    }
}

#[tokio::test]
async fn channel_error_keeps_partial_answer_with_warning() {
    let connector = Arc::new(FakeConnector::new(vec![
        (Duration::from_millis(1), TranscriptEvent::Started),
        (
            Duration::from_millis(20),
            TranscriptEvent::Partial("hello there".to_string()),
        ),
        (
            Duration::from_millis(20),
            TranscriptEvent::Error("quota exceeded".to_string()),
        ),
    ]));
    let handle = session(connector).start().await.unwrap();

    let outcome = handle.finish().await.unwrap();
    match outcome {
        AnswerOutcome::Speech {
            utterances,
            warning,
        } => {
            assert_eq!(utterances, vec!["hello there"]);
            assert_eq!(warning.as_deref(), Some("quota exceeded"));
        }
        AnswerOutcome::NoSpeechDetected => panic!("expected partial answer"),
    }
}

#[tokio::test]
async fn explicit_stop_ends_the_turn_early() {
    let connector = Arc::new(FakeConnector::with_partials(&["early answer"]));
    let handle = session(connector).start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop();

    let outcome = handle.finish().await.unwrap();
    match outcome {
        AnswerOutcome::Speech { utterances, .. } => {
            assert_eq!(utterances, vec!["early answer"]);
        }
        AnswerOutcome::NoSpeechDetected => panic!("expected the partial collected before stop"),
    }
}

#[tokio::test]
async fn missing_device_fails_fast_without_opening_channel() {
    let connector = Arc::new(FakeConnector::with_partials(&["never"]));
    let session = RecordingSession::new(
        Arc::new(UnavailableCaptureSource),
        connector.clone(),
        test_capture_params(),
        test_turn_config(),
    );

    let err = session.start().await.err().expect("start must fail");
    assert!(matches!(err, Error::CaptureUnavailable(_)));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------- orchestrator

#[tokio::test]
async fn silent_answer_after_prompt_is_not_an_error() {
    let synthesizer = Arc::new(FakeSynthesizer::instant());
    let sink = Arc::new(RecordingSink::new());
    let connector = Arc::new(FakeConnector::with_partials(&[]));

    let orchestrator = SpeechTurn::new(
        synthesizer.clone(),
        sink.clone(),
        session(connector),
        3,
    );

    let outcome = orchestrator
        .ask_and_collect("Tell me about yourself")
        .await
        .unwrap();

    assert_eq!(outcome, AnswerOutcome::NoSpeechDetected);
    assert_eq!(sink.played(), vec!["Tell me about yourself"]);
    // Only the prompt was synthesized
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn streamed_answer_splits_and_plays_in_order_while_recording() {
    // Unit 1 completes before unit 0; playback must not reorder
    let synthesizer = Arc::new(FakeSynthesizer::new(vec![
        ("Part one.", SynthBehavior::Ok(Duration::from_millis(150))),
        ("Part two.", SynthBehavior::Ok(Duration::from_millis(10))),
    ]));
    let sink = Arc::new(RecordingSink::new());
    let connector = Arc::new(FakeConnector::with_partials(&["sounds good"]));

    let orchestrator = SpeechTurn::new(
        synthesizer.clone(),
        sink.clone(),
        session(connector),
        3,
    );

    let tokens = tokio_stream::iter(
        ["Part one. Part", " two. Part three"]
            .into_iter()
            .map(|t| Ok(t.to_string())),
    );

    let (spoken, outcome) = orchestrator.stream_and_collect(tokens).await.unwrap();

    assert_eq!(spoken, "Part one. Part two. Part three");
    assert_eq!(sink.played(), vec!["Part one.", "Part two.", "Part three"]);
    match outcome {
        AnswerOutcome::Speech { utterances, .. } => {
            assert_eq!(utterances, vec!["sounds good"]);
        }
        AnswerOutcome::NoSpeechDetected => panic!("expected the concurrent recording to collect"),
    }
}

#[tokio::test]
async fn failed_sentence_does_not_block_the_rest() {
    let synthesizer = Arc::new(FakeSynthesizer::new(vec![(
        "Second sentence.",
        SynthBehavior::Fail(Duration::from_millis(10)),
    )]));
    let sink = Arc::new(RecordingSink::new());
    let connector = Arc::new(FakeConnector::with_partials(&[]));

    let orchestrator = SpeechTurn::new(
        synthesizer.clone(),
        sink.clone(),
        session(connector),
        3,
    );

    let tokens = tokio_stream::iter(
        ["First sentence. Second sentence. Third sentence."]
            .into_iter()
            .map(|t| Ok(t.to_string())),
    );

    let (_, _) = orchestrator.stream_and_collect(tokens).await.unwrap();
    assert_eq!(sink.played(), vec!["First sentence.", "Third sentence."]);
}
