//! Session creation integration tests.
//!
//! - `POST /hl/session/create` - form body with optional `location` and
//!   `p2p.preference`; reply carries the new `session_id`

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use opentok::errors::TransportError;
use opentok::services::session_client::{P2pPreference, SessionOptions};
use opentok::token::TokenOptions;
use opentok::OpenTokError;
use opentok_test_utils::*;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_create_session_parses_xml_reply() -> Result<()> {
    init_test_tracing();
    let backend = TestBackend::start().await;
    let expected = session_id_for(ARCHIVE_API_KEY);
    backend
        .mock_create_session(200, &session_create_xml(&expected))
        .await;

    let session_id = backend
        .opentok()
        .create_session(&SessionOptions::default())
        .await?;

    assert_eq!(session_id, expected);
    Ok(())
}

#[tokio::test]
async fn test_create_session_parses_form_reply() -> Result<()> {
    let backend = TestBackend::start().await;
    backend
        .mock_create_session(200, "partner_id=APIKEY&session_id=1_abcdef&create_dt=now")
        .await;

    let session_id = backend
        .opentok()
        .create_session(&SessionOptions::default())
        .await?;

    assert_eq!(session_id, "1_abcdef");
    Ok(())
}

#[tokio::test]
async fn test_form_reply_is_percent_decoded_and_accepts_tokens() -> Result<()> {
    let backend = TestBackend::start_with_credentials("100", "secret").await;
    backend
        .mock_create_session(200, "partner_id=100&session_id=1_MX4xMDB-fn5-eH4%3D")
        .await;

    let opentok = backend.opentok();
    let session_id = opentok.create_session(&SessionOptions::default()).await?;
    assert_eq!(session_id, "1_MX4xMDB-fn5-eH4=");

    opentok
        .generate_token(&TokenOptions::new(&session_id))?
        .assert_claim("session_id", &session_id);
    Ok(())
}

#[tokio::test]
async fn test_xml_reply_entities_are_decoded() -> Result<()> {
    let backend = TestBackend::start().await;
    backend
        .mock_create_session(
            200,
            "<sessions><Session><session_id>1_a&amp;b</session_id></Session></sessions>",
        )
        .await;

    let session_id = backend
        .opentok()
        .create_session(&SessionOptions::default())
        .await?;

    assert_eq!(session_id, "1_a&b");
    Ok(())
}

#[tokio::test]
async fn test_create_session_without_options_sends_empty_form() -> Result<()> {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/hl/session/create"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_create_xml("1_x")))
        .expect(1)
        .mount(backend.server())
        .await;

    backend
        .opentok()
        .create_session(&SessionOptions::default())
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_create_session_sends_location_and_p2p() -> Result<()> {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/hl/session/create"))
        .and(header("X-TB-PARTNER-AUTH", "APIKEY:APISECRET"))
        .and(body_string_contains("location=127.0.0.1"))
        .and(body_string_contains("p2p.preference=enabled"))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_create_xml("1_x")))
        .expect(1)
        .mount(backend.server())
        .await;

    backend
        .opentok()
        .create_session(
            &SessionOptions::default()
                .with_location("127.0.0.1")
                .with_p2p(P2pPreference::Enabled),
        )
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_create_session_with_p2p_only() -> Result<()> {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/hl/session/create"))
        .and(body_string("p2p.preference=disabled"))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_create_xml("1_x")))
        .expect(1)
        .mount(backend.server())
        .await;

    backend
        .opentok()
        .create_session(&SessionOptions::default().with_p2p(P2pPreference::Disabled))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_create_session_error_status() {
    let backend = TestBackend::start().await;
    backend
        .mock_create_session(403, "<error code=\"403\"/>")
        .await;

    let err = backend
        .opentok()
        .create_session(&SessionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to create session");
    assert!(matches!(
        err,
        OpenTokError::SessionCreation {
            source: TransportError::Status(403)
        }
    ));
}

#[tokio::test]
async fn test_create_session_reply_without_id() {
    let backend = TestBackend::start().await;
    backend.mock_create_session(200, "<sessions/>").await;

    let err = backend
        .opentok()
        .create_session(&SessionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OpenTokError::SessionCreation {
            source: TransportError::Decode(_)
        }
    ));
}

#[tokio::test]
async fn test_created_session_accepts_tokens() -> Result<()> {
    let backend = TestBackend::start().await;
    let created = session_id_for(ARCHIVE_API_KEY);
    backend
        .mock_create_session(200, &session_create_xml(&created))
        .await;

    let opentok = backend.opentok();
    let session_id = opentok.create_session(&SessionOptions::default()).await?;
    let token = opentok.generate_token(&TokenOptions::new(&session_id))?;

    token
        .assert_valid_token()
        .assert_claim("session_id", &session_id)
        .assert_for_api_key(ARCHIVE_API_KEY)
        .assert_signed_by(opentok.tokens());
    Ok(())
}
