use crate::error::RelayError;
use crate::models::webhook::{WebhookQuery, parse_webhook};
use crate::services::dingtalk::DingTalkClient;
use crate::services::report;
use crate::services::sonar::SonarClient;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;
use log::{debug, error, info, warn};

pub const DELIVERED: &str = "消息推送成功";
pub const FAILED_PREFIX: &str = "消息推送失败";

pub struct AppState {
    pub sonar_client: SonarClient,
    pub dingtalk_client: DingTalkClient,
    pub multi_branch: bool,
}

/// `POST /dingtalk?access_token=..&sonar_token=..`
///
/// Always answers 200; the body says whether the message went out.
pub async fn handle_sonar_webhook(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    info!("[{}] Received webhook, {} bytes", request_id, body.len());

    let text = match relay(&req, &body, &data, request_id).await {
        Ok(()) => DELIVERED.to_string(),
        Err(e) => format!("{}: {}", FAILED_PREFIX, e),
    };

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text))
}

async fn relay(
    req: &HttpRequest,
    body: &[u8],
    data: &AppState,
    request_id: Uuid,
) -> Result<(), RelayError> {
    let query = web::Query::<WebhookQuery>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();

    let mut ctx = parse_webhook(&query, body).map_err(|e| {
        error!("[{}] Failed to parse webhook: {}", request_id, e);
        e
    })?;
    info!(
        "[{}] Analysis of {} ({}) branch '{}'",
        request_id, ctx.project_name, ctx.project_key, ctx.branch_name
    );

    match data.sonar_client.fetch_measures(&ctx).await {
        Ok(measures) => ctx.measures = measures,
        Err(e) => warn!("[{}] Failed to fetch measures, sending without them: {}", request_id, e),
    }
    debug!(
        "[{}] Scan context: {}",
        request_id,
        serde_json::to_string(&ctx).unwrap_or_default()
    );

    let message = report::render(&ctx, data.multi_branch);

    data.dingtalk_client
        .send(&message, &ctx.access_token)
        .await
        .map_err(|e| {
            error!("[{}] Failed to push DingTalk message: {}", request_id, e);
            e
        })?;

    info!("[{}] Message delivered", request_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn state(dingtalk: &mockito::ServerGuard, multi_branch: bool) -> web::Data<AppState> {
        web::Data::new(AppState {
            sonar_client: SonarClient::new(Duration::from_secs(5)).unwrap(),
            dingtalk_client: DingTalkClient::new(
                format!("{}/robot/send", dingtalk.url()),
                Duration::from_secs(5),
            )
            .unwrap(),
            multi_branch,
        })
    }

    async fn post(
        data: web::Data<AppState>,
        uri: &str,
        body: String,
    ) -> String {
        let app = test::init_service(
            App::new()
                .app_data(data)
                .route("/dingtalk", web::post().to(handle_sonar_webhook)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(("content-type", "application/json"))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn missing_access_token_makes_no_outbound_calls() {
        let mut sonar = mockito::Server::new_async().await;
        let mut dingtalk = mockito::Server::new_async().await;
        let sonar_mock = sonar.mock("GET", Matcher::Any).expect(0).create_async().await;
        let dingtalk_mock = dingtalk.mock("POST", Matcher::Any).expect(0).create_async().await;

        let body = json!({"serverUrl": sonar.url(), "project": {"key": "demo_key"}}).to_string();
        let text = post(state(&dingtalk, false), "/dingtalk?sonar_token=abc", body).await;

        assert_eq!(text, "消息推送失败: validation: missing access token");
        sonar_mock.assert_async().await;
        dingtalk_mock.assert_async().await;
    }

    #[actix_web::test]
    async fn end_to_end_delivery() {
        let mut sonar = mockito::Server::new_async().await;
        let mut dingtalk = mockito::Server::new_async().await;

        let sonar_mock = sonar
            .mock("GET", "/api/measures/component")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("component".into(), "demo_key".into()),
                Matcher::UrlEncoded("additionalFields".into(), "metrics".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({"component": {"measures": [
                    {"metric": "alert_status", "value": "OK"},
                    {"metric": "bugs", "value": "3"}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let dingtalk_mock = dingtalk
            .mock("POST", "/robot/send")
            .match_query(Matcher::UrlEncoded("access_token".into(), "tok1".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"msgtype": "markdown"})),
                Matcher::Regex("BGMeTe\\.png".to_string()),
                Matcher::Regex("Bugs: 3 \\| 漏洞:  \\| 异味:  \\| 覆盖率: % \\| 重复率: %".to_string()),
                Matcher::Regex("dashboard\\?id=demo_key".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"errcode":0,"errmsg":"ok"}"#)
            .expect(1)
            .create_async()
            .await;

        let body = json!({
            "serverUrl": sonar.url(),
            "project": {"name": "Demo", "key": "demo_key"},
            "branch": {"name": "", "type": ""}
        })
        .to_string();
        let text = post(state(&dingtalk, false), "/dingtalk?access_token=tok1", body).await;

        assert_eq!(text, DELIVERED);
        sonar_mock.assert_async().await;
        dingtalk_mock.assert_async().await;
    }

    #[actix_web::test]
    async fn rejected_delivery_is_reported_without_retry() {
        let mut sonar = mockito::Server::new_async().await;
        let mut dingtalk = mockito::Server::new_async().await;

        sonar
            .mock("GET", "/api/measures/component")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"component":{"measures":[]}}"#)
            .create_async()
            .await;
        let dingtalk_mock = dingtalk
            .mock("POST", "/robot/send")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"errcode":1,"errmsg":"invalid token"}"#)
            .expect(1)
            .create_async()
            .await;

        let body = json!({"serverUrl": sonar.url(), "project": {"key": "demo_key"}}).to_string();
        let text = post(state(&dingtalk, false), "/dingtalk?access_token=bad", body).await;

        assert!(text.starts_with(FAILED_PREFIX));
        assert!(text.contains("invalid token"));
        dingtalk_mock.assert_async().await;
    }

    #[actix_web::test]
    async fn metrics_failure_still_sends_a_failure_report() {
        let mut sonar = mockito::Server::new_async().await;
        let mut dingtalk = mockito::Server::new_async().await;

        sonar
            .mock("GET", "/api/measures/component")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let dingtalk_mock = dingtalk
            .mock("POST", "/robot/send")
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex("BGMZwD\\.png".to_string()))
            .with_status(200)
            .with_body(r#"{"errcode":0,"errmsg":"ok"}"#)
            .expect(1)
            .create_async()
            .await;

        let body = json!({
            "serverUrl": sonar.url(),
            "project": {"name": "Demo", "key": "demo_key"},
            "branch": {"name": "main", "type": "BRANCH", "url": "https://sonar.example/b"}
        })
        .to_string();
        let text = post(state(&dingtalk, true), "/dingtalk?access_token=tok", body).await;

        assert_eq!(text, DELIVERED);
        dingtalk_mock.assert_async().await;
    }

    #[actix_web::test]
    async fn malformed_body_is_reported() {
        let mut dingtalk = mockito::Server::new_async().await;
        let dingtalk_mock = dingtalk.mock("POST", Matcher::Any).expect(0).create_async().await;

        let text = post(
            state(&dingtalk, false),
            "/dingtalk?access_token=tok",
            "{\"serverUrl\":".to_string(),
        )
        .await;

        assert!(text.starts_with("消息推送失败: decode:"));
        dingtalk_mock.assert_async().await;
    }

    #[actix_web::test]
    async fn array_body_is_rejected_without_sending() {
        let mut dingtalk = mockito::Server::new_async().await;
        let dingtalk_mock = dingtalk.mock("POST", Matcher::Any).expect(0).create_async().await;

        let text = post(state(&dingtalk, false), "/dingtalk?access_token=tok", "[]".to_string()).await;

        assert_eq!(text, "消息推送失败: decode: webhook body is not a JSON object");
        dingtalk_mock.assert_async().await;
    }
}
