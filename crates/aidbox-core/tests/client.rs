//! Client facade tests against an in-memory transport that records every
//! request and replays canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aidbox_core::{
    BlockingClient, Client, Error, Method, Node, Reference, Request, Result, Transport,
};
use assert_json_diff::assert_json_eq;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Value, json};

#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    responses: Mutex<VecDeque<Result<Value>>>,
}

impl RecordingTransport {
    fn replying(responses: impl IntoIterator<Item = Result<Value>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into_iter().collect()),
        })
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn query(&self, index: usize) -> Vec<(String, String)> {
        self.requests()[index].query.clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Value> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

fn bundle(ids: &[&str], total: u64, has_next: bool) -> Value {
    let entry: Vec<Value> = ids
        .iter()
        .map(|id| json!({"resource": {"resourceType": "Patient", "id": id}}))
        .collect();
    let mut link = vec![json!({"relation": "self", "url": "/Patient"})];
    if has_next {
        link.push(json!({"relation": "next", "url": "/Patient?page=next"}));
    }
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": total,
        "link": link,
        "entry": entry,
    })
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn ids(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().filter_map(Node::id).collect()
}

#[tokio::test]
async fn test_read_returns_resource() {
    let transport = RecordingTransport::replying([Ok(json!({
        "resourceType": "Patient",
        "id": "p1",
        "managingOrganization": {"resourceType": "Organization", "id": "o1"}
    }))]);
    let client = Client::from_arc(transport.clone());

    let patient = client.read("Patient", "p1").await.unwrap();

    assert_eq!(patient.id(), Some("p1"));
    let organization = patient["managingOrganization"].as_reference().unwrap();
    assert_eq!(organization.reference().as_deref(), Some("Organization/o1"));
    assert_eq!(transport.requests(), vec![Request::get("Patient/p1")]);
}

#[tokio::test]
async fn test_fetch_sends_query_pairs() {
    let transport = RecordingTransport::replying([Ok(bundle(&["p1", "p2"], 2, false))]);
    let client = Client::from_arc(transport.clone());

    let search = client
        .resources("Patient")
        .search("name", "John")
        .search_all("identifier", ["a", "b"])
        .sort("name");
    let found = client.fetch(&search).await.unwrap();

    assert_eq!(ids(&found), vec!["p1", "p2"]);
    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, "Patient");
    assert_eq!(
        request.query,
        vec![
            pair("name", "John"),
            pair("identifier", "a"),
            pair("identifier", "b"),
            pair("_sort", "name"),
        ]
    );
}

#[tokio::test]
async fn test_fetch_all_walks_pages_in_order() {
    let transport = RecordingTransport::replying([
        Ok(bundle(&["p1", "p2"], 3, true)),
        Ok(bundle(&["p3"], 3, false)),
    ]);
    let client = Client::from_arc(transport.clone());

    let all = client
        .fetch_all(&client.resources("Patient").limit(2))
        .await
        .unwrap();

    assert_eq!(ids(&all), vec!["p1", "p2", "p3"]);
    assert_eq!(transport.query(0), vec![pair("_count", "2"), pair("page", "1")]);
    assert_eq!(transport.query(1), vec![pair("_count", "2"), pair("page", "2")]);
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let transport = RecordingTransport::replying([
        Ok(bundle(&["p1", "p2"], 4, true)),
        Ok(bundle(&["p3", "p4"], 4, false)),
    ]);
    let client = Client::from_arc(transport.clone());
    let search = client.resources("Patient");

    let mut stream = Box::pin(client.stream(&search));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.id(), Some("p1"));
    stream.next().await.unwrap().unwrap();
    assert_eq!(transport.requests().len(), 1);

    let third = stream.next().await.unwrap().unwrap();
    assert_eq!(third.id(), Some("p3"));
    assert_eq!(transport.requests().len(), 2);
    drop(stream);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_stream_stops_on_error() {
    let transport = RecordingTransport::replying([
        Ok(bundle(&["p1"], 2, true)),
        Err(Error::transport(Some(503), "unavailable")),
    ]);
    let client = Client::from_arc(transport.clone());

    let err = client
        .fetch_all(&client.resources("Patient"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport { status: Some(503), .. }));
}

#[tokio::test]
async fn test_first_limits_to_one() {
    let transport = RecordingTransport::replying([Ok(bundle(&[], 0, false))]);
    let client = Client::from_arc(transport.clone());

    let found = client.first(&client.resources("Patient")).await.unwrap();
    assert!(found.is_none());
    assert_eq!(transport.query(0), vec![pair("_count", "1")]);
}

#[tokio::test]
async fn test_get_requires_exactly_one_match() {
    let transport = RecordingTransport::replying([
        Ok(bundle(&["p1"], 1, false)),
        Ok(bundle(&[], 0, false)),
        Ok(bundle(&["p1", "p2"], 2, false)),
    ]);
    let client = Client::from_arc(transport.clone());
    let search = client.resources("Patient").search("name", "John");

    assert_eq!(client.get(&search).await.unwrap().id(), Some("p1"));
    assert!(client.get(&search).await.unwrap_err().is_not_found());
    assert!(client.get(&search).await.unwrap_err().is_multiple_results());
    assert_eq!(transport.query(0), vec![pair("name", "John"), pair("_count", "2")]);
}

#[tokio::test]
async fn test_count_reads_bundle_total() {
    let transport = RecordingTransport::replying([Ok(bundle(&[], 42, false))]);
    let client = Client::from_arc(transport.clone());

    let count = client
        .count(&client.resources("Patient").limit(10))
        .await
        .unwrap();

    assert_eq!(count, 42);
    assert_eq!(
        transport.query(0),
        vec![pair("_count", "0"), pair("_totalMethod", "count")]
    );
}

#[tokio::test]
async fn test_save_posts_new_and_puts_existing() {
    let transport = RecordingTransport::replying([
        Ok(json!({"resourceType": "Patient", "id": "p1", "active": true, "meta": {"versionId": "1"}})),
        Ok(json!({"resourceType": "Patient", "id": "p1", "active": false, "meta": {"versionId": "2"}})),
    ]);
    let client = Client::from_arc(transport.clone());

    let mut patient = client.resource("Patient").unwrap().with("active", true);
    client.save(&mut patient).await.unwrap();
    assert_eq!(patient.id(), Some("p1"));
    assert_eq!(patient["meta"]["versionId"], "1");

    patient.insert("active", false);
    client.save(&mut patient).await.unwrap();
    assert_eq!(patient["meta"]["versionId"], "2");

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path, "Patient");
    assert_json_eq!(
        requests[0].body.clone().unwrap(),
        json!({"resourceType": "Patient", "active": true})
    );
    assert_eq!(requests[1].method, Method::Put);
    assert_eq!(requests[1].path, "Patient/p1");
}

#[tokio::test]
async fn test_save_projects_nested_references() {
    let transport = RecordingTransport::replying([]);
    let client = Client::from_arc(transport.clone());

    let organization = Reference::local("Organization", "o1")
        .with_display("Clinic")
        .with_field("note", "dropped");
    let mut patient = client
        .resource("Patient")
        .unwrap()
        .with("managingOrganization", organization);
    client.save(&mut patient).await.unwrap();

    assert_json_eq!(
        transport.requests()[0].body.clone().unwrap(),
        json!({
            "resourceType": "Patient",
            "managingOrganization": {
                "resourceType": "Organization",
                "id": "o1",
                "display": "Clinic"
            }
        })
    );
}

#[tokio::test]
async fn test_save_bundle_posts_to_root() {
    let transport = RecordingTransport::replying([Ok(json!({
        "resourceType": "Bundle",
        "type": "transaction-response"
    }))]);
    let client = Client::from_arc(transport.clone());

    let mut bundle = Node::from_json(json!({
        "resourceType": "Bundle",
        "type": "transaction",
        "entry": [{
            "request": {"method": "POST", "url": "/Patient"},
            "resource": {"resourceType": "Patient", "active": true}
        }]
    }))
    .unwrap();
    let sent = bundle.to_json();
    client.save(&mut bundle).await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "");
    assert_json_eq!(request.body.clone().unwrap(), sent);
    assert_eq!(bundle["type"], "transaction-response");
}

#[tokio::test]
async fn test_delete_and_refresh() {
    let transport = RecordingTransport::replying([
        Ok(json!({"resourceType": "Patient", "id": "p1", "active": false})),
        Ok(Value::Null),
    ]);
    let client = Client::from_arc(transport.clone());

    let mut patient = Node::resource("Patient").unwrap().with("id", "p1");
    client.refresh(&mut patient).await.unwrap();
    assert_eq!(patient["active"], false);

    client.delete(&patient).await.unwrap();
    let requests = transport.requests();
    assert_eq!(requests[1], Request::delete("Patient/p1"));
}

#[tokio::test]
async fn test_is_valid_converts_validation_errors() {
    let outcome = json!({
        "resourceType": "OperationOutcome",
        "issue": [{"severity": "error", "diagnostics": "bad gender"}]
    });
    let transport = RecordingTransport::replying([
        Ok(json!({"resourceType": "OperationOutcome", "issue": []})),
        Err(Error::validation("bad gender", outcome)),
        Err(Error::transport(Some(500), "boom")),
    ]);
    let client = Client::from_arc(transport.clone());
    let patient = Node::resource("Patient").unwrap().with("gender", "x");

    assert!(client.is_valid(&patient).await.unwrap());
    assert!(!client.is_valid(&patient).await.unwrap());
    assert!(client.is_valid(&patient).await.is_err());
    assert_eq!(transport.requests()[0].path, "Patient/$validate");
}

#[tokio::test]
async fn test_execute_operation_posts_raw_json() {
    let transport = RecordingTransport::replying([Ok(json!({"result": [1, 2]}))]);
    let client = Client::from_arc(transport.clone());

    let response = client
        .execute_operation("Patient", "$everything", json!({"count": 2}))
        .await
        .unwrap();

    assert_json_eq!(response, json!({"result": [1, 2]}));
    let request = &transport.requests()[0];
    assert_eq!(request.path, "Patient/$everything");
    assert_json_eq!(request.body.clone().unwrap(), json!({"count": 2}));
}

#[tokio::test]
async fn test_to_resource_uses_cache() {
    let transport = RecordingTransport::replying([
        Ok(json!({"resourceType": "Patient", "id": "p1"})),
        Ok(json!({"resourceType": "Patient", "id": "p1", "active": true})),
    ]);
    let client = Client::from_arc(transport.clone()).with_cache();
    let reference = client.reference("Patient/p1").unwrap();

    client.to_resource(&reference).await.unwrap();
    client.to_resource(&reference).await.unwrap();
    assert_eq!(transport.requests().len(), 1);

    client.clear_resources_cache();
    let patient = client.to_resource(&reference).await.unwrap();
    assert_eq!(patient["active"], true);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_to_resource_external_makes_no_request() {
    let transport = RecordingTransport::replying([]);
    let client = Client::from_arc(transport.clone());
    let reference = client.reference("http://example.com/fhir/Patient/p1").unwrap();

    assert!(!reference.is_local());
    assert!(client.to_resource(&reference).await.unwrap_err().is_not_found());
    assert!(transport.requests().is_empty());
}

#[test]
fn test_blocking_client_iterates_lazily() {
    let transport = RecordingTransport::replying([
        Ok(bundle(&["p1"], 2, true)),
        Ok(bundle(&["p2"], 2, false)),
        Ok(json!({"resourceType": "Patient", "id": "p3"})),
    ]);
    let client = BlockingClient::from_client(Client::from_arc(transport.clone())).unwrap();
    let search = client.resources("Patient");

    let mut iter = client.iter(&search);
    assert_eq!(iter.next().unwrap().unwrap().id(), Some("p1"));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(iter.next().unwrap().unwrap().id(), Some("p2"));
    assert!(iter.next().is_none());
    drop(iter);

    let patient = client.read("Patient", "p3").unwrap();
    assert_eq!(patient.id(), Some("p3"));
    assert_eq!(transport.requests().len(), 3);
}
