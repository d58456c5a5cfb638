//! Integration tests for the progress HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use synheart_progress::config::Goals;
    use synheart_progress::persistence::MemoryProvider;
    use synheart_progress::records::WeightUnit;
    use synheart_progress::server::{run, ServerConfig};
    use synheart_progress::session::TrackerSession;

    async fn start(provider: Arc<MemoryProvider>) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
        let session = TrackerSession::new("patient-1", chrono_tz::UTC, provider);
        let config = ServerConfig::new(0, Goals::default(), WeightUnit::Pounds);

        let (addr, shutdown_tx) = run(config, session).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;
        (addr, shutdown_tx)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx) = start(Arc::new(MemoryProvider::new())).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["user_id"], "patient-1");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_log_then_progress() {
        let (addr, shutdown_tx) = start(Arc::new(MemoryProvider::new())).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{}/activities", addr))
            .json(&serde_json::json!({
                "steps": 4200,
                "active_minutes": 35,
                "calories_burned": 210,
                "activity_type": "walk",
                "timestamp": "2024-04-10T08:00:00Z"
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);

        let response = client
            .post(format!("http://{}/hydration", addr))
            .json(&serde_json::json!({"ounces": 16.0, "timestamp": "2024-04-10T09:00:00Z"}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);

        let snapshot: serde_json::Value = client
            .get(format!("http://{}/progress?mode=week&date=2024-04-10", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");

        assert_eq!(snapshot["range"]["start"], "2024-04-08");
        assert_eq!(snapshot["range"]["end"], "2024-04-14");
        assert_eq!(snapshot["activity"]["totals"]["active_minutes"], 35.0);
        assert_eq!(snapshot["hydration"]["totals"]["ounces"], 16.0);
        assert_eq!(snapshot["today"]["active_minutes"], 35);
        assert_eq!(snapshot["advice"]["tier"], "in_progress");
        assert_eq!(snapshot["advice"]["remaining"], 25);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let provider = Arc::new(MemoryProvider::new());
        let (addr, shutdown_tx) = start(provider.clone()).await;
        let client = reqwest::Client::new();

        // Negative quantity
        let response = client
            .post(format!("http://{}/hydration", addr))
            .json(&serde_json::json!({"ounces": -4.0}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 422);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "INVALID_INPUT");

        // Unknown record
        let response = client
            .delete(format!("http://{}/meals/{}", addr, uuid::Uuid::new_v4()))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 404);

        // Bad mode
        let response = client
            .get(format!("http://{}/progress?mode=fortnight", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 400);

        // Storage down: the record is still applied locally
        provider.fail_collection("weights").await;
        let response = client
            .post(format!("http://{}/weights", addr))
            .json(&serde_json::json!({"value": 180.0, "timestamp": "2024-04-10T07:00:00Z"}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 502);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "SYNC_FAILED");

        let snapshot: serde_json::Value = client
            .get(format!("http://{}/progress?mode=week&date=2024-04-10", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(snapshot["weight"]["entries"], 1);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_delete_record() {
        let provider = Arc::new(MemoryProvider::new());
        let (addr, shutdown_tx) = start(provider.clone()).await;
        let client = reqwest::Client::new();

        let created: serde_json::Value = client
            .post(format!("http://{}/meals", addr))
            .json(&serde_json::json!({"name": "Tofu bowl", "protein_grams": 24.0}))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        let id = created["id"].as_str().expect("id").to_string();
        assert_eq!(provider.document_count("patient-1", "meals").await, 1);

        let response = client
            .delete(format!("http://{}/meals/{}", addr, id))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        assert_eq!(provider.document_count("patient-1", "meals").await, 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_update_record() {
        let (addr, shutdown_tx) = start(Arc::new(MemoryProvider::new())).await;
        let client = reqwest::Client::new();

        let created: serde_json::Value = client
            .post(format!("http://{}/hydration", addr))
            .json(&serde_json::json!({"ounces": 8.0, "timestamp": "2024-04-10T09:00:00Z"}))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        let id = created["id"].as_str().expect("id").to_string();

        // Correct the amount
        let response = client
            .patch(format!("http://{}/hydration/{}", addr, id))
            .json(&serde_json::json!({"ounces": 20.0}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 200);

        // Negative amount is rejected and the stored value is kept
        let response = client
            .patch(format!("http://{}/hydration/{}", addr, id))
            .json(&serde_json::json!({"ounces": -3.0}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 422);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "INVALID_INPUT");

        // Identity fields cannot be patched
        let response = client
            .patch(format!("http://{}/hydration/{}", addr, id))
            .json(&serde_json::json!({"timestamp": "2024-04-01T09:00:00Z"}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 422);

        // Unknown record
        let response = client
            .patch(format!("http://{}/hydration/{}", addr, uuid::Uuid::new_v4()))
            .json(&serde_json::json!({"ounces": 12.0}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 404);

        let snapshot: serde_json::Value = client
            .get(format!("http://{}/progress?mode=today&date=2024-04-10", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(snapshot["hydration"]["totals"]["ounces"], 20.0);
        assert_eq!(snapshot["hydration"]["record_count"], 1);

        let _ = shutdown_tx.send(());
    }
}
