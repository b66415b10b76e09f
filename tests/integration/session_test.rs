use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::support::{MockLink, MockProvider, ReadStep};
use smartbin::core::transport::{ConnectionState, LinkEvent, TransportSession};
use smartbin::TransportError;

const WAIT: Duration = Duration::from_secs(2);

fn session() -> (TransportSession, mpsc::Receiver<LinkEvent>) {
    let (tx, rx) = mpsc::channel(1);
    (TransportSession::new(tx), rx)
}

#[tokio::test]
async fn test_send_appends_newline() {
    let link = MockLink::new();
    let provider = MockProvider::new(link.clone());
    let (mut session, _rx) = session();

    session.connect(&provider, "/dev/mock0", 115_200).unwrap();
    session.send("STATUS").unwrap();
    session.send("BUKA\n").unwrap();

    assert_eq!(link.written(), "STATUS\nBUKA\n");
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(session.port_name(), Some("/dev/mock0"));
    session.disconnect();
}

#[tokio::test]
async fn test_chunks_arrive_in_order_with_generation() {
    let link = MockLink::new();
    let provider = MockProvider::new(link.clone());
    let (mut session, mut rx) = session();

    link.push_text("SYSTEM_READY\n");
    link.push_text("DISTANCE:10\n");
    session.connect(&provider, "/dev/mock0", 115_200).unwrap();

    let mut received = String::new();
    while received != "SYSTEM_READY\nDISTANCE:10\n" {
        let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(session.is_current(&event));
        match event {
            LinkEvent::Chunk { generation, text } => {
                assert_eq!(generation, 1);
                received.push_str(&text);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    session.disconnect();
}

#[tokio::test]
async fn test_end_of_stream_reports_closed() {
    let link = MockLink::new();
    link.push(ReadStep::Eof);
    let provider = MockProvider::new(link);
    let (mut session, mut rx) = session();

    session.connect(&provider, "/dev/mock0", 115_200).unwrap();

    let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, LinkEvent::Closed { generation: 1 }));
}

#[tokio::test]
async fn test_read_error_reports_failed() {
    let link = MockLink::new();
    link.push(ReadStep::Fail(io::ErrorKind::BrokenPipe));
    let provider = MockProvider::new(link);
    let (mut session, mut rx) = session();

    session.connect(&provider, "/dev/mock0", 115_200).unwrap();

    match timeout(WAIT, rx.recv()).await.unwrap().unwrap() {
        LinkEvent::Failed { error, .. } => assert_eq!(error.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_during_idle_read_is_silent() {
    let link = MockLink::new();
    let provider = MockProvider::new(link.clone());
    let (mut session, mut rx) = session();

    session.connect(&provider, "/dev/mock0", 115_200).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(session.disconnect());
    assert!(!session.disconnect());
    assert_eq!(session.state(), ConnectionState::Disconnected);

    // Data that shows up after the cancel is never delivered
    link.push_text("DISTANCE:10\n");
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_events_of_a_replaced_session_are_stale() {
    let link = MockLink::new();
    let provider = MockProvider::new(link);
    let (mut session, _rx) = session();

    session.connect(&provider, "/dev/mock0", 115_200).unwrap();
    session.connect(&provider, "/dev/mock0", 115_200).unwrap();

    let stale = LinkEvent::Chunk {
        generation: 1,
        text: "DISTANCE:10\n".to_string(),
    };
    assert!(!session.is_current(&stale));
    session.disconnect();
}

#[tokio::test]
async fn test_connect_failure_leaves_session_disconnected() {
    let provider = MockProvider::refusing();
    let (mut session, _rx) = session();

    let err = session.connect(&provider, "/dev/mock0", 115_200).unwrap_err();

    assert!(matches!(err, TransportError::ConnectFailed { .. }));
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(matches!(
        session.send("STATUS"),
        Err(TransportError::NotConnected)
    ));
}
