// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end reconciliation through the HTTP client against a mock Uptime Kuma.
//!
//! Run with: cargo test --test reconcile_integration

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::{Ingress, IngressRule, IngressSpec};
use kube::api::ObjectMeta;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uptime_kuma_controller::ingress::IngressSource;
use uptime_kuma_controller::kuma::KumaClient;
use uptime_kuma_controller::reconciler::Reconciler;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TAG: &str = "k8s-ingress";

struct StaticIngresses(Vec<Ingress>);

#[async_trait]
impl IngressSource for StaticIngresses {
    async fn list_ingresses(&self) -> anyhow::Result<Vec<Ingress>> {
        Ok(self.0.clone())
    }
}

fn ingress(name: &str, host: &str, annotations: &[(&str, &str)]) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("apps".to_string()),
            annotations: Some(
                annotations
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login/access-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "t", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tags": [{"id": 3, "name": TAG, "color": "green"}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cycle_prunes_and_creates_over_http() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "monitors": [
                {"id": 5, "name": "old.example.com", "url": "https://old.example.com",
                 "tags": [{"tag_id": 3, "name": TAG, "color": "green", "value": ""}]},
                {"id": 6, "name": "keep.example.com", "url": "http://keep.example.com",
                 "tags": [{"tag_id": 3, "name": TAG, "color": "green", "value": ""}]},
                {"id": 7, "name": "manual", "url": "https://manual.example.com", "tags": []},
                {"id": 8, "name": "ping", "url": null, "tags": null}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/monitors/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msg": "Deleted Successfully."})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/monitors"))
        .and(body_json(json!({
            "type": "http",
            "name": "new.example.com",
            "url": "http://new.example.com"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"msg": "Added Successfully.", "monitorID": 77})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/monitors/77/tag"))
        .and(body_json(json!({"tag_id": 3, "value": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msg": "Added Successfully."})))
        .expect(1)
        .mount(&server)
        .await;

    let ingresses = StaticIngresses(vec![
        ingress("keep", "keep.example.com", &[]),
        ingress(
            "new",
            "new.example.com",
            &[("uptime-kuma-controller.secure", "false")],
        ),
        ingress(
            "muted",
            "manual.example.com",
            &[("uptime-kuma-controller.ignore", "true")],
        ),
    ]);
    let kuma = KumaClient::new(&server.uri(), "admin", "secret").unwrap();
    let reconciler = Reconciler::new(Arc::new(ingresses), Arc::new(kuma), TAG);

    let report = reconciler.run_cycle().await.unwrap();

    assert_eq!(report.owned_monitors, 2);
    assert_eq!(report.hosts_discovered, 3);
    assert_eq!(report.sync.deleted, vec![5]);
    assert_eq!(report.sync.created.len(), 1);
    assert_eq!(report.sync.created[0].id, 77);
    assert_eq!(report.sync.created[0].url, "http://new.example.com");
}

#[tokio::test]
async fn test_consistent_inventory_makes_no_changes_over_http() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "monitors": [
                {"id": 1, "name": "svc.example.com", "url": "https://svc.example.com",
                 "tags": [{"tag_id": 3, "name": TAG}]}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ingresses = StaticIngresses(vec![ingress("svc", "svc.example.com", &[])]);
    let kuma = KumaClient::new(&server.uri(), "admin", "secret").unwrap();
    let reconciler = Reconciler::new(Arc::new(ingresses), Arc::new(kuma), TAG);

    let report = reconciler.run_cycle().await.unwrap();

    assert_eq!(report.owned_monitors, 1);
    assert!(report.sync.deleted.is_empty());
    assert!(report.sync.created.is_empty());
}

#[tokio::test]
async fn test_rejected_login_fails_cycle_without_changes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/access-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect username or password"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let kuma = KumaClient::new(&server.uri(), "admin", "wrong").unwrap();
    let reconciler = Reconciler::new(Arc::new(StaticIngresses(Vec::new())), Arc::new(kuma), TAG);

    let err = reconciler.run_cycle().await.unwrap_err();

    assert!(format!("{err:#}").contains("admin"));
}

#[tokio::test]
async fn test_lost_create_response_is_not_resent() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"monitors": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let ingresses = StaticIngresses(vec![ingress("svc", "svc.example.com", &[])]);
    let kuma = KumaClient::new(&server.uri(), "admin", "secret").unwrap();
    let reconciler = Reconciler::new(Arc::new(ingresses), Arc::new(kuma), TAG);

    let err = reconciler.run_cycle().await.unwrap_err();

    assert!(format!("{err:#}").contains("502"));
}
