#![cfg(feature = "export")]

use anyhow::Result;
use chrono::NaiveDate;
use mbank_history::export::{
    cookie_header, DownloadRequest, ExportClient, ExportError, ExportRange, EXPORT_PATH,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn range() -> ExportRange {
    ExportRange::new(
        NaiveDate::from_ymd_opt(2020, 11, 5).unwrap(),
        NaiveDate::from_ymd_opt(2020, 11, 6).unwrap(),
    )
    .unwrap()
}

fn client(server: &MockServer) -> Result<ExportClient> {
    let cookies = cookie_header([("mBank_tabId", "tab-1"), ("mBank8", "session-token")]);
    Ok(ExportClient::new(server.uri(), cookies)?)
}

#[tokio::test]
async fn export_posts_filters_with_session_cookies() -> Result<()> {
    let server = MockServer::start().await;

    let mut body = b"mBank S.A. Bankowosc Detaliczna\r\n\r\n".to_vec();
    body.extend_from_slice(b"#Data operacji;#Opis operacji;#Kwota;#Saldo po operacji;\r\n");
    // "Płatność" in windows-1250
    body.extend_from_slice(b"2020-11-06;\"P\xb3atno\x9c\xe6\";-15,00 PLN;100,00 PLN;\r\n\r\n\r\n");

    Mock::given(method("POST"))
        .and(path(EXPORT_PATH))
        .and(header(
            "cookie",
            "mBank_tabId=tab-1; mBank8=session-token",
        ))
        .and(body_partial_json(json!({
            "saveFileType": "CSV",
            "pfmFilters": {
                "productIds": "399116",
                "dateFrom": "2020-11-05T00:00:00.000Z",
                "dateTo": "2020-11-06T00:00:00.000Z",
                "showBalance": true,
                "sortingOrder": "ByDate"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/csv"))
        .expect(1)
        .mount(&server)
        .await;

    let csv = client(&server)?
        .fetch_csv(&DownloadRequest::new("399116", range()))
        .await?;

    assert_eq!(
        csv,
        "#Data operacji;#Opis operacji;#Kwota;#Saldo po operacji;\n\
         2020-11-06;\"P\u{142}atno\u{15b}\u{107}\";-15,00 PLN;100,00 PLN;\n"
    );
    Ok(())
}

#[tokio::test]
async fn export_keeps_raw_bytes_untouched() -> Result<()> {
    let server = MockServer::start().await;
    let body = b"#Data;\r\n1;\r\n".to_vec();

    Mock::given(method("POST"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "text/csv"))
        .mount(&server)
        .await;

    let raw = client(&server)?
        .fetch_raw(&DownloadRequest::new("399116", range()))
        .await?;

    assert_eq!(raw, body);
    Ok(())
}

#[tokio::test]
async fn export_failure_status_is_reported() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)?
        .fetch_csv(&DownloadRequest::new("399116", range()))
        .await
        .expect_err("server is unavailable");

    assert!(
        matches!(err, ExportError::Status { status: 503, .. }),
        "{err}"
    );
    assert_eq!(
        err.to_string(),
        "The CSV fetch request has failed. Response status: 503 Service Unavailable"
    );
    Ok(())
}

#[tokio::test]
async fn export_without_header_line_is_rejected() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Session expired</html>"))
        .mount(&server)
        .await;

    let err = client(&server)?
        .fetch_csv(&DownloadRequest::new("399116", range()))
        .await
        .expect_err("login page instead of CSV");

    assert!(matches!(err, ExportError::MissingHeader));
    Ok(())
}
