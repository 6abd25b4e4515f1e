#![allow(clippy::unwrap_used)]
// End-to-end controller tests against a mocked entity store.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bankwatch_core::{
    AccessScope, Command, Controller, ControllerConfig, CoreError, CreateEntityRequest, EntityId,
    EntityType, Metadata,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn entity_json(id: &str, kind: &str, name: &str, parent: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "entity_type": kind,
        "entity_name": name,
        "parent_id": parent,
        "metadata": {},
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z"
    })
}

fn config_for(server: &MockServer, user_id: Option<&str>) -> ControllerConfig {
    let mut cfg = ControllerConfig::new(
        server.uri().parse().unwrap(),
        "anon-key".to_string().into(),
    );
    cfg.user_id = user_id.map(str::to_owned);
    cfg.summary_interval = Duration::ZERO;
    cfg
}

async fn mount_get(
    server: &MockServer,
    table: &str,
    params: &[(&str, &str)],
    body: serde_json::Value,
) {
    let mut mock = Mock::given(method("GET")).and(path(format!("/rest/v1/{table}")));
    for (k, v) in params {
        mock = mock.and(query_param(*k, *v));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Scoped fetch ────────────────────────────────────────────────────

#[tokio::test]
async fn test_scoped_user_fetches_level_by_level() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "profiles",
        &[("user_id", "eq.u-acme")],
        json!([{ "user_id": "u-acme", "role": "branch_manager", "customer_id": "c1" }]),
    )
    .await;
    mount_get(
        &server,
        "entities",
        &[("id", "eq.c1"), ("entity_type", "eq.customer")],
        json!([entity_json("c1", "customer", "Acme", None)]),
    )
    .await;
    mount_get(
        &server,
        "entities",
        &[("parent_id", "in.(\"c1\")")],
        json!([entity_json("z1", "zone", "North", Some("c1"))]),
    )
    .await;
    mount_get(
        &server,
        "entities",
        &[("parent_id", "in.(\"z1\")")],
        json!([entity_json("b1", "branch", "Main St", Some("z1"))]),
    )
    .await;
    mount_get(
        &server,
        "entities",
        &[("parent_id", "in.(\"b1\")")],
        json!([]),
    )
    .await;
    mount_get(
        &server,
        "hierarchy_configs",
        &[("customer_id", "in.(\"c1\")")],
        json!([]),
    )
    .await;

    let ctrl = Controller::new(config_for(&server, Some("u-acme"))).unwrap();
    ctrl.connect().await.unwrap();

    assert_eq!(ctrl.access_scope(), AccessScope::Customer(EntityId::from("c1")));
    let forest = ctrl.forest();
    assert_eq!(forest.len(), 3);
    assert_eq!(forest.level(&EntityId::from("b1")), Some(2));

    let path = ctrl.breadcrumb(&EntityId::from("b1")).await.unwrap();
    let names: Vec<_> = path.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Acme", "North", "Main St"]);

    ctrl.disconnect().await;
}

#[tokio::test]
async fn test_service_user_fetches_everything() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "entities",
        &[("select", "*")],
        json!([
            entity_json("c2", "customer", "Zenith", None),
            entity_json("c1", "customer", "Acme", None),
            entity_json("x9", "branch", "Stray", Some("missing")),
        ]),
    )
    .await;
    mount_get(
        &server,
        "hierarchy_configs",
        &[],
        json!([{ "customer_id": "c2", "hierarchy_levels": ["nbg", "ro", "branch"] }]),
    )
    .await;

    let ctrl = Controller::new(config_for(&server, None)).unwrap();
    ctrl.connect().await.unwrap();

    let forest = ctrl.forest();
    let roots: Vec<_> = forest.roots().iter().map(|n| n.name().to_owned()).collect();
    // The orphan is promoted to a root and reported.
    assert_eq!(roots, vec!["Acme", "Stray", "Zenith"]);
    assert_eq!(forest.report().orphans.len(), 1);
    assert_eq!(ctrl.child_type(&EntityId::from("c2")), Some(EntityType::Nbg));
    assert_eq!(ctrl.child_type(&EntityId::from("c1")), Some(EntityType::Zone));

    ctrl.disconnect().await;
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_key_surfaces_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/entities"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let ctrl = Controller::new(config_for(&server, None)).unwrap();
    let err = ctrl.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_constraint_violation_becomes_conflict() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "entities",
        &[("select", "*")],
        json!([
            entity_json("c1", "customer", "Acme", None),
            entity_json("z1", "zone", "North", Some("c1")),
        ]),
    )
    .await;
    mount_get(&server, "hierarchy_configs", &[], json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/entities"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let ctrl = Controller::new(config_for(&server, None)).unwrap();
    ctrl.connect().await.unwrap();

    let err = ctrl
        .execute(Command::CreateEntity(CreateEntityRequest {
            parent_id: EntityId::from("z1"),
            entity_type: EntityType::Branch,
            name: "Main St".into(),
            metadata: Metadata::empty(EntityType::Branch),
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    ctrl.disconnect().await;
}
