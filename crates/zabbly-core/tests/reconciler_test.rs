#![allow(clippy::unwrap_used)]
// End-to-end reconciler behaviour against a scripted RPC double.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use common::{MockRpc, reconciler, reconciler_for};
use zabbly_api::models::Item;
use zabbly_api::{ApiVersion, Error};
use zabbly_core::value::BlockExt;
use zabbly_core::{
    CoreError, FieldValue, Reconciler, Registry, ResourceData, ResourceDef, StateStore,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn item_def(name: &str) -> &'static ResourceDef<Item> {
    Registry::global().item(name).unwrap()
}

fn agent_state() -> ResourceData {
    item_def("zabbix_item_agent")
        .state()
        .with("hostid", "10084")
        .unwrap()
        .with("key", "item.key")
        .unwrap()
        .with("name", "Item")
        .unwrap()
        .with("valuetype", "unsigned")
        .unwrap()
        .with(
            "preprocessor",
            FieldValue::List(vec![FieldValue::block([
                ("type", FieldValue::from("1")),
                ("params", FieldValue::strings(["55"])),
            ])]),
        )
        .unwrap()
}

/// `item.get` result for the agent item above.
fn agent_item(id: &str) -> Value {
    json!({
        "itemid": id,
        "hostid": "10084",
        "key_": "item.key",
        "name": "Item",
        "value_type": "3",
        "type": "0",
        "delay": "1m",
        "interfaceid": "0",
        "preprocessing": [
            {"type": "1", "params": "55", "error_handler": "0", "error_handler_params": ""}
        ],
        "applications": []
    })
}

fn existing_agent(id: &str) -> ResourceData {
    let mut state = agent_state();
    state.set_id(id.into());
    state
}

// ── Create / read ───────────────────────────────────────────────────

#[tokio::test]
async fn create_sends_wire_codes_and_reads_back() {
    let (reconciler, rpc) = reconciler(
        MockRpc::new()
            .ok("item.create", json!({"itemids": ["100"]}))
            .ok("item.get", json!([agent_item("100")])),
    );
    let mut state = agent_state();

    reconciler
        .create(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap();

    assert_eq!(rpc.methods(), vec!["item.create", "item.get"]);
    let payload = &rpc.params("item.create")[0];
    assert_eq!(payload["key_"], json!("item.key"));
    assert_eq!(payload["value_type"], json!("3"));
    assert_eq!(payload["type"], json!("0"));
    assert_eq!(payload["delay"], json!("1m"));
    assert_eq!(payload["preprocessing"], json!([{"type": "1", "params": "55"}]));
    assert!(payload.get("itemid").is_none());

    assert_eq!(rpc.params("item.get")["itemids"], json!(["100"]));
    assert_eq!(state.id(), "100");
    let steps = state.get_blocks("preprocessor");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].texts("params"), vec!["55"]);
    assert_eq!(steps[0].text("error_handler"), "");
    assert_eq!(state.get_str("valuetype"), "unsigned");
    assert!(!state.get_bool("active"));
}

#[tokio::test]
async fn validation_fails_before_any_call() {
    let (reconciler, rpc) = reconciler(MockRpc::new());
    let mut state = item_def("zabbix_item_agent")
        .state()
        .with("hostid", "10084")
        .unwrap()
        .with("name", "Item")
        .unwrap()
        .with("valuetype", "unsigned")
        .unwrap();

    let err = reconciler
        .create(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap_err();

    assert!(err.is_validation(), "{err}");
    assert!(rpc.calls().is_empty());
    assert_eq!(state.id(), "");
}

#[tokio::test]
async fn unknown_token_fails_before_any_call() {
    let (reconciler, rpc) = reconciler(MockRpc::new());
    let mut state = agent_state().with("valuetype", "complex").unwrap();

    let err = reconciler
        .create(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap_err();

    assert!(err.is_validation(), "{err}");
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn misspelled_nested_key_fails_before_any_call() {
    let (reconciler, rpc) = reconciler(MockRpc::new());
    let mut state = agent_state()
        .with(
            "preprocessor",
            FieldValue::List(vec![FieldValue::block([
                ("type", FieldValue::from("1")),
                ("parmas", FieldValue::strings(["55"])),
            ])]),
        )
        .unwrap();

    let err = reconciler
        .create(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap_err();

    assert!(
        matches!(&err, CoreError::UnknownField { field } if field.ends_with(".parmas")),
        "{err}"
    );
    assert!(err.is_validation());
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn create_requires_exactly_one_identifier() {
    let (reconciler, rpc) = reconciler(
        MockRpc::new().ok("item.create", json!({"itemids": ["100", "101"]})),
    );
    let mut state = agent_state();

    let err = reconciler
        .create(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Api(Error::UnexpectedResponse { .. })
    ));
    assert_eq!(rpc.methods(), vec!["item.create"]);
    assert_eq!(state.id(), "");
}

#[tokio::test]
async fn remote_errors_pass_through_unchanged() {
    let (reconciler, _rpc) = reconciler(
        MockRpc::new().err("item.create", -32602, "Invalid params."),
    );
    let mut state = agent_state();

    let err = reconciler
        .create(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap_err();

    match err {
        CoreError::Api(api) => {
            assert!(api.is_remote());
            assert_eq!(api.rpc_code(), Some(-32602));
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert_eq!(state.id(), "");
}

#[tokio::test]
async fn read_of_missing_object_clears_identity() {
    let (reconciler, rpc) = reconciler(MockRpc::new().ok("item.get", json!([])));
    let mut state = existing_agent("100");

    reconciler
        .read(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap();

    assert_eq!(rpc.methods(), vec!["item.get"]);
    assert_eq!(state.id(), "");
}

#[tokio::test]
async fn read_of_duplicate_objects_leaves_state_alone() {
    let (reconciler, _rpc) = reconciler(
        MockRpc::new().ok("item.get", json!([agent_item("100"), agent_item("100")])),
    );
    let mut state = existing_agent("100").with("name", "Local").unwrap();

    let err = reconciler
        .read(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::MultipleFound { entity: "item", ref id } if id == "100"
    ));
    assert_eq!(state.id(), "100");
    assert_eq!(state.get_str("name"), "Local");
}

#[tokio::test]
async fn read_without_identity_is_a_no_op() {
    let (reconciler, rpc) = reconciler(MockRpc::new());
    let mut state = agent_state();

    reconciler
        .read(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap();

    assert!(rpc.calls().is_empty());
}

// ── Update / delete ─────────────────────────────────────────────────

#[tokio::test]
async fn update_unlinks_removed_templates() {
    let registry = Registry::global();
    let (reconciler, rpc) = reconciler(
        MockRpc::new()
            .ok("host.update", json!({"hostids": ["10105"]}))
            .ok(
                "host.get",
                json!([{
                    "hostid": "10105",
                    "host": "web01",
                    "name": "web01",
                    "proxy_hostid": "0",
                    "status": "0",
                    "interfaces": [{
                        "interfaceid": "3",
                        "ip": "10.0.0.5",
                        "dns": "",
                        "main": "1",
                        "port": "10050",
                        "type": "1",
                        "useip": "1",
                        "details": []
                    }],
                    "groups": [{"groupid": "2"}],
                    "parentTemplates": [{"templateid": "10002"}],
                    "macros": [],
                    "tags": []
                }]),
            ),
    );
    let mut state = ResourceData::existing(
        Arc::clone(&registry.host.schema),
        "10105",
        [
            ("host", FieldValue::from("web01")),
            (
                "interface",
                FieldValue::List(vec![FieldValue::block([("ip", "10.0.0.5".into())])]),
            ),
            ("groups", FieldValue::string_set(["2"])),
            ("templates", FieldValue::string_set(["10001", "10002"])),
        ],
    );
    state
        .set("templates", FieldValue::string_set(["10002"]))
        .unwrap();

    reconciler.update(&registry.host, &mut state).await.unwrap();

    assert_eq!(rpc.methods(), vec!["host.update", "host.get"]);
    let payload = &rpc.params("host.update")[0];
    assert_eq!(payload["hostid"], json!("10105"));
    assert_eq!(payload["templates"], json!([{"templateid": "10002"}]));
    assert_eq!(payload["templates_clear"], json!([{"templateid": "10001"}]));

    assert_eq!(state.id(), "10105");
    assert_eq!(state.get_strings("templates"), vec!["10002"]);
    let interfaces = state.get_blocks("interface");
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].text("port"), "10050");
}

#[tokio::test]
async fn template_update_sends_new_links_and_clears_old_ones() {
    let registry = Registry::global();
    let (reconciler, rpc) = reconciler(
        MockRpc::new()
            .ok("template.update", json!({"templateids": ["500"]}))
            .ok(
                "template.get",
                json!([{
                    "templateid": "500",
                    "host": "Template Base",
                    "name": "Template Base",
                    "description": "",
                    "groups": [{"groupid": "1"}],
                    "parentTemplates": [{"templateid": "11"}, {"templateid": "12"}],
                    "macros": [],
                    "tags": []
                }]),
            ),
    );
    let mut state = ResourceData::existing(
        Arc::clone(&registry.template.schema),
        "500",
        [
            ("host", FieldValue::from("Template Base")),
            ("groups", FieldValue::string_set(["1"])),
            ("templates", FieldValue::string_set(["10", "11"])),
        ],
    );
    state
        .set("templates", FieldValue::string_set(["11", "12"]))
        .unwrap();

    reconciler.update(&registry.template, &mut state).await.unwrap();

    let payload = &rpc.params("template.update")[0];
    assert_eq!(payload["templateid"], json!("500"));
    assert_eq!(
        payload["templates"],
        json!([{"templateid": "11"}, {"templateid": "12"}])
    );
    assert_eq!(payload["templates_clear"], json!([{"templateid": "10"}]));
    assert!(payload.get("tags").is_none());
    assert_eq!(state.get_strings("templates"), vec!["11", "12"]);
}

#[tokio::test]
async fn delete_sends_identifier_and_clears_state() {
    let (reconciler, rpc) = reconciler(MockRpc::new().ok("item.delete", json!({"itemids": ["100"]})));
    let mut state = existing_agent("100");

    reconciler
        .delete(item_def("zabbix_item_agent"), &mut state)
        .await
        .unwrap();

    assert_eq!(rpc.params("item.delete"), json!(["100"]));
    assert_eq!(state.id(), "");
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_filters_on_configured_fields() {
    let registry = Registry::global();
    let (reconciler, rpc) = reconciler(MockRpc::new().ok(
        "application.get",
        json!([{"applicationid": "7", "name": "CPU", "hostid": "10084"}]),
    ));
    let mut state = registry
        .application_lookup
        .state()
        .with("name", "CPU")
        .unwrap()
        .with("hostid", "10084")
        .unwrap();

    reconciler
        .lookup(&registry.application_lookup, &mut state)
        .await
        .unwrap();

    assert_eq!(
        rpc.params("application.get")["filter"],
        json!({"name": "CPU", "hostid": "10084"})
    );
    assert_eq!(state.id(), "7");
    assert_eq!(state.get_str("applicationid"), "7");
}

#[tokio::test]
async fn lookup_without_filters_is_rejected_before_any_call() {
    let registry = Registry::global();
    let (reconciler, rpc) = reconciler(MockRpc::new());
    let mut state = registry.host_lookup.state();

    let err = reconciler
        .lookup(&registry.host_lookup, &mut state)
        .await
        .unwrap_err();

    assert!(err.is_validation(), "{err}");
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn lookup_reports_missing_and_ambiguous_matches() {
    let registry = Registry::global();
    let (reconciler, _rpc) = reconciler(
        MockRpc::new()
            .ok("hostgroup.get", json!([]))
            .ok(
                "hostgroup.get",
                json!([
                    {"groupid": "2", "name": "Linux servers"},
                    {"groupid": "3", "name": "Linux servers"}
                ]),
            ),
    );
    let lookup = &registry.host_group_lookup;

    let mut state = lookup.state().with("name", "Linux servers").unwrap();
    let err = reconciler.lookup(lookup, &mut state).await.unwrap_err();
    assert!(matches!(err, CoreError::NoMatch { entity: "hostgroup", .. }));

    let err = reconciler.lookup(lookup, &mut state).await.unwrap_err();
    assert!(matches!(err, CoreError::AmbiguousMatch { .. }));
    assert!(err.is_cardinality());
    assert_eq!(state.id(), "");
}

// ── Version gate ────────────────────────────────────────────────────

fn snmp_state() -> ResourceData {
    item_def("zabbix_item_snmp")
        .state()
        .with("hostid", "10084")
        .unwrap()
        .with("key", "if.in")
        .unwrap()
        .with("name", "Inbound traffic")
        .unwrap()
        .with("valuetype", "unsigned")
        .unwrap()
        .with("snmp_oid", "1.3.6.1.2.1.2.2.1.10.1")
        .unwrap()
        .with("snmp_community", "public")
        .unwrap()
}

fn snmp_item(kind: &str, community: Option<&str>) -> Value {
    let mut item = json!({
        "itemid": "200",
        "hostid": "10084",
        "key_": "if.in",
        "name": "Inbound traffic",
        "value_type": "3",
        "type": kind,
        "delay": "1m",
        "interfaceid": "0",
        "snmp_oid": "1.3.6.1.2.1.2.2.1.10.1",
        "preprocessing": []
    });
    if let Some(community) = community {
        item["snmp_community"] = json!(community);
    }
    item
}

#[tokio::test]
async fn legacy_servers_get_per_version_snmp_items() {
    let (reconciler, rpc) = reconciler_for(
        MockRpc::new()
            .ok("item.create", json!({"itemids": ["200"]}))
            .ok("item.get", json!([snmp_item("4", Some("public"))])),
        ApiVersion::new(4, 0, 0),
        false,
    );
    let mut state = snmp_state();

    reconciler
        .create(item_def("zabbix_item_snmp"), &mut state)
        .await
        .unwrap();

    let payload = &rpc.params("item.create")[0];
    assert_eq!(payload["type"], json!("4"));
    assert_eq!(payload["snmp_community"], json!("public"));
    assert_eq!(state.get_str("snmp_version"), "2");
    assert_eq!(state.get_str("snmp_community"), "public");
}

#[tokio::test]
async fn current_servers_drop_item_level_snmp_settings() {
    let (reconciler, rpc) = reconciler(
        MockRpc::new()
            .ok("item.create", json!({"itemids": ["200"]}))
            .ok("item.get", json!([snmp_item("20", None)])),
    );
    let mut state = snmp_state();

    reconciler
        .create(item_def("zabbix_item_snmp"), &mut state)
        .await
        .unwrap();

    let payload = &rpc.params("item.create")[0];
    assert_eq!(payload["type"], json!("20"));
    assert!(payload.get("snmp_community").is_none());
    assert_eq!(payload["snmp_oid"], json!("1.3.6.1.2.1.2.2.1.10.1"));
    assert_eq!(state.id(), "200");
}

#[tokio::test]
async fn negotiate_uses_the_reported_version() {
    let rpc = MockRpc::new().ok("apiinfo.version", json!("4.4.6"));
    let reconciler = Reconciler::negotiate(rpc, false).await.unwrap();
    assert_eq!(reconciler.gate().version(), ApiVersion::new(4, 4, 6));
    assert!(!reconciler.api().serializes_requests());

    let rpc = MockRpc::new().ok("apiinfo.version", json!("5.x"));
    let err = Reconciler::negotiate(rpc, false).await.err().unwrap();
    assert!(matches!(err, CoreError::Api(Error::InvalidVersion { .. })));
}

// ── Request queueing ────────────────────────────────────────────────

async fn concurrent_reads(serialize_requests: bool) -> usize {
    let (reconciler, rpc) = reconciler_for(
        MockRpc::slow(Duration::from_millis(20))
            .ok("item.get", json!([agent_item("1")]))
            .ok("item.get", json!([agent_item("2")])),
        ApiVersion::V5_0,
        serialize_requests,
    );
    let def = item_def("zabbix_item_agent");
    let other = reconciler.clone();
    let mut first = existing_agent("1");
    let mut second = existing_agent("2");

    let (a, b) = tokio::join!(
        reconciler.read(def, &mut first),
        other.read(def, &mut second)
    );
    a.unwrap();
    b.unwrap();
    rpc.max_in_flight()
}

#[tokio::test]
async fn serialized_reconcilers_issue_one_request_at_a_time() {
    assert_eq!(concurrent_reads(true).await, 1);
}

#[tokio::test]
async fn unserialized_reconcilers_overlap_requests() {
    assert_eq!(concurrent_reads(false).await, 2);
}
