use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use serial_test::serial;

use super::prepare_data;

#[tokio::test]
#[serial]
async fn create_interviewer_returns_the_record() {
    request::<App, _, _>(|request, _ctx| async move {
        let response = request
            .post("/api/interviewers")
            .json(&serde_json::json!({"name": "Jane", "email": "jane@example.com"}))
            .await;

        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "Jane");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn show_interviewer_returns_404_when_missing() {
    request::<App, _, _>(|request, _ctx| async move {
        let response = request.get(&format!("/api/interviewers/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(response.status_code(), 404);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn list_interviewers_includes_created_records() {
    request::<App, _, _>(|request, ctx| async move {
        let interviewer = prepare_data::create_interviewer(&ctx, "Listed Interviewer").await;
        let response = request.get("/api/interviewers").await;

        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        let ids: Vec<String> = body.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap().to_string()).collect();
        assert!(ids.contains(&interviewer.id.to_string()));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn delete_interviewer_without_interviews_succeeds() {
    request::<App, _, _>(|request, ctx| async move {
        let interviewer = prepare_data::create_interviewer(&ctx, "Free Agent").await;
        let response = request.delete(&format!("/api/interviewers/{}", interviewer.id)).await;
        assert_eq!(response.status_code(), 204);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn delete_interviewer_with_interviews_is_rejected() {
    use pipeline_core::models::interviews;

    request::<App, _, _>(|request, ctx| async move {
        let interviewer = prepare_data::create_interviewer(&ctx, "Booked Interviewer").await;
        let candidate = prepare_data::create_candidate(&ctx, "Scheduled Candidate").await;
        prepare_data::advance_to_screening(&ctx, candidate.id).await;
        interviews::schedule(
            &ctx.db,
            candidate.id,
            interviewer.id,
            prepare_data::tomorrow_at(10),
            None,
            "TECHNICAL",
            None,
            None,
            "HR_MANAGER",
        )
        .await
        .unwrap();

        let response = request.delete(&format!("/api/interviewers/{}", interviewer.id)).await;
        assert_eq!(response.status_code(), 422);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn list_interviews_for_interviewer_returns_scheduled_interviews() {
    use pipeline_core::models::interviews;

    request::<App, _, _>(|request, ctx| async move {
        let interviewer = prepare_data::create_interviewer(&ctx, "Listed Schedule Interviewer").await;
        let candidate = prepare_data::create_candidate(&ctx, "Listed Schedule Candidate").await;
        prepare_data::advance_to_screening(&ctx, candidate.id).await;
        let interview = interviews::schedule(
            &ctx.db,
            candidate.id,
            interviewer.id,
            prepare_data::tomorrow_at(10),
            None,
            "TECHNICAL",
            None,
            None,
            "HR_MANAGER",
        )
        .await
        .unwrap();

        let response = request.get(&format!("/api/interviewers/{}/interviews", interviewer.id)).await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        let ids: Vec<String> = body.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap().to_string()).collect();
        assert!(ids.contains(&interview.id.to_string()));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn availability_reflects_existing_bookings() {
    use pipeline_core::models::interviews;

    request::<App, _, _>(|request, ctx| async move {
        let interviewer = prepare_data::create_interviewer(&ctx, "Availability Interviewer").await;
        let start = prepare_data::tomorrow_at(9);

        let free = request
            .get(&format!(
                "/api/interviewers/{}/availability?start={}&end={}",
                interviewer.id,
                urlencoding_rfc3339(start),
                urlencoding_rfc3339(start + chrono::Duration::minutes(60)),
            ))
            .await;
        assert_eq!(free.status_code(), 200);
        let free_body: serde_json::Value = free.json();
        assert_eq!(free_body["available"], true);

        let candidate = prepare_data::create_candidate(&ctx, "Availability Candidate").await;
        prepare_data::advance_to_screening(&ctx, candidate.id).await;
        interviews::schedule(&ctx.db, candidate.id, interviewer.id, start, None, "TECHNICAL", None, None, "HR_MANAGER")
            .await
            .unwrap();

        let busy = request
            .get(&format!(
                "/api/interviewers/{}/availability?start={}&end={}",
                interviewer.id,
                urlencoding_rfc3339(start),
                urlencoding_rfc3339(start + chrono::Duration::minutes(60)),
            ))
            .await;
        let busy_body: serde_json::Value = busy.json();
        assert_eq!(busy_body["available"], false);

        let available_list = request
            .get(&format!(
                "/api/interviewers/available?start={}&end={}",
                urlencoding_rfc3339(start),
                urlencoding_rfc3339(start + chrono::Duration::minutes(60)),
            ))
            .await;
        assert_eq!(available_list.status_code(), 200);
        let available_body: serde_json::Value = available_list.json();
        let ids: Vec<String> =
            available_body.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap().to_string()).collect();
        assert!(!ids.contains(&interviewer.id.to_string()));
    })
    .await;
}

fn urlencoding_rfc3339(dt: chrono::DateTime<chrono::FixedOffset>) -> String {
    dt.to_rfc3339().replace('+', "%2B")
}
