mod common;

use common::*;
use counsel_gateway::client::{ ChatSession, ClientError, HttpGatewayApi, BANNER_TTL, GREETING };
use counsel_gateway::config::IdPolicy;
use std::sync::Arc;
use std::time::Duration;

async fn gateway_url(upstream_port: u16) -> String {
    let addr = spawn(gateway(upstream_port, IdPolicy::Upstream)).await;
    format!("http://{}", addr)
}

#[tokio::test]
async fn new_session_stores_upstream_id_and_greets() {
    let upstream = spawn(counsellor_upstream()).await;
    let api = HttpGatewayApi::new(&gateway_url(upstream.port()).await).unwrap();
    let view = Arc::new(RecordingView::default());
    let mut session = ChatSession::new(api, Arc::clone(&view));

    session.start_session().await.unwrap();

    assert_eq!(session.conversation_id(), Some("abc-123"));
    let transcript = view.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].author_id, "counsellor");
    assert_eq!(transcript[0].content, GREETING);
}

#[tokio::test]
async fn sent_message_is_followed_by_counsellor_reply() {
    let upstream = spawn(counsellor_upstream()).await;
    let api = HttpGatewayApi::new(&gateway_url(upstream.port()).await).unwrap();
    let view = Arc::new(RecordingView::default());
    let mut session = ChatSession::new(api, Arc::clone(&view));
    session.start_session().await.unwrap();

    assert!(session.send_message("hello").await.unwrap());

    let transcript = view.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].content, "hello");
    assert_eq!(transcript[1].author_name, "User");
    assert!(transcript[2].is_counsellor());
    assert_eq!(transcript[2].content, REPLY);
    assert!(view.banners().is_empty());
}

#[tokio::test]
async fn report_and_history_render_upstream_data() {
    let upstream = spawn(counsellor_upstream()).await;
    let api = HttpGatewayApi::new(&gateway_url(upstream.port()).await).unwrap();
    let view = Arc::new(RecordingView::default());
    let mut session = ChatSession::new(api, Arc::clone(&view));
    session.start_session().await.unwrap();

    session.generate_report().await.unwrap();
    assert_eq!(view.report().as_deref(), Some("Session summary"));

    assert_eq!(session.reload_transcript().await.unwrap(), 2);
    assert_eq!(view.transcript()[1].content, REPLY);
}

#[tokio::test]
async fn rejected_delete_surfaces_gateway_status() {
    let upstream = spawn(counsellor_upstream()).await;
    let api = HttpGatewayApi::new(&gateway_url(upstream.port()).await).unwrap();
    let view = Arc::new(RecordingView::default());
    let mut session = ChatSession::new(api, Arc::clone(&view));
    session.start_session().await.unwrap();

    match session.end_session().await {
        Err(ClientError::Rejected { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(session.conversation_id(), Some("abc-123"));
    assert!(view.banners()[0].starts_with("Failed to end session"));
}

#[tokio::test]
async fn report_failure_shows_banner_that_expires() {
    let (upstream, stop_upstream, upstream_task) = spawn_stoppable(counsellor_upstream()).await;
    let api = HttpGatewayApi::new(&gateway_url(upstream.port()).await).unwrap();
    let view = Arc::new(RecordingView::default());
    let mut session = ChatSession::new(api, Arc::clone(&view));
    session.start_session().await.unwrap();

    stop_upstream.send(()).unwrap();
    upstream_task.await.unwrap();

    assert!(session.generate_report().await.is_err());
    let banners = view.banners();
    assert_eq!(banners.len(), 1);
    assert!(banners[0].contains("Failed to generate report"));
    assert!(banners[0].contains("Failed to reach API server"));
    assert!(view.report().is_none());

    tokio::time::pause();
    tokio::time::sleep(BANNER_TTL + Duration::from_millis(10)).await;
    assert!(view.banners().is_empty());
}
