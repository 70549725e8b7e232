//! Wire-level tests: a real TCP client against the full listener + gate +
//! host stack.

mod common;

use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

use common::{TestStack, WireClient};
use forge_bridge::CommandRegistry;

#[test]
fn ping_round_trips_over_tcp() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);
    assert_eq!(client.command("ping", json!({})), json!({"message": "pong"}));
}

#[test]
fn find_actors_by_name_returns_exactly_the_matches() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    for name in ["Cube_1", "Cube_2", "Sphere_1"] {
        let spawned = client.command(
            "spawn_actor",
            json!({"type": "StaticMeshActor", "name": name}),
        );
        assert_eq!(spawned["name"], *name, "spawn failed: {spawned}");
    }

    let result = client.command("find_actors_by_name", json!({"pattern": "Cube"}));
    let actors = result["actors"].as_array().expect("actors array");
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0]["name"], "Cube_1");
    assert_eq!(actors[1]["name"], "Cube_2");
    // Exactly one top-level field: the match list.
    assert_eq!(result.as_object().unwrap().len(), 1);
}

#[test]
fn duplicate_spawn_yields_exact_error_object_and_no_second_entity() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    let first = client.command("spawn_actor", json!({"type": "PointLight", "name": "L1"}));
    assert_eq!(first["class"], "PointLight");

    let second = client.command("spawn_actor", json!({"type": "PointLight", "name": "L1"}));
    assert_eq!(
        second,
        json!({"error": "Actor with name 'L1' already exists"})
    );

    let listed = client.command("get_actors_in_level", json!({}));
    assert_eq!(listed["actors"].as_array().unwrap().len(), 1);
}

#[test]
fn unknown_command_and_missing_parameter_are_per_message_errors() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    let unknown = client.command("teleport_everything", json!({}));
    assert_eq!(unknown, json!({"error": "Unknown command: teleport_everything"}));

    let missing = client.command("find_actors_by_name", json!({}));
    assert_eq!(missing, json!({"error": "Missing 'pattern' parameter"}));

    // The connection is still healthy after both errors.
    assert_eq!(client.command("ping", json!({})), json!({"message": "pong"}));
}

#[test]
fn malformed_frame_keeps_connection_open() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    client.send_line("this is not json");
    let response = client.read_response();
    assert!(
        response["error"].as_str().unwrap().starts_with("Invalid JSON"),
        "got: {response}"
    );

    // Valid JSON that is not a command object is its own per-message error.
    client.send_line("{\"params\": {}}");
    let response = client.read_response();
    assert!(
        response["error"].as_str().unwrap().starts_with("Invalid command"),
        "got: {response}"
    );

    assert_eq!(client.command("ping", json!({})), json!({"message": "pong"}));
}

#[test]
fn responses_arrive_in_request_order() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    // Burst of commands written before any response is read; the listener
    // must answer strictly FIFO with no pipelining.
    client.send_command("spawn_actor", json!({"type": "PointLight", "name": "A"}));
    client.send_command("spawn_actor", json!({"type": "SpotLight", "name": "B"}));
    client.send_command("get_actors_in_level", json!({}));

    let first = client.read_response();
    let second = client.read_response();
    let third = client.read_response();

    assert_eq!(first["name"], "A");
    assert_eq!(second["name"], "B");
    let names: Vec<&str> = third["actors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn back_to_back_mutations_are_strictly_serialized() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    client.send_command("spawn_actor", json!({"type": "CameraActor", "name": "Rig"}));
    client.send_command(
        "set_actor_transform",
        json!({"name": "Rig", "location": [10, 20, 30]}),
    );
    client.send_command("get_actor_properties", json!({"name": "Rig"}));

    let spawned = client.read_response();
    assert_eq!(spawned["name"], "Rig");
    // The transform must observe the completed spawn.
    let moved = client.read_response();
    assert_eq!(moved["location"], json!([10.0, 20.0, 30.0]));
    let fetched = client.read_response();
    assert_eq!(fetched["location"], json!([10.0, 20.0, 30.0]));
}

#[test]
fn slow_handler_times_out_and_bridge_recovers() {
    let mut registry = CommandRegistry::with_builtin_commands();
    registry.register("hang", |_ctx, _params| {
        thread::sleep(Duration::from_millis(400));
        Ok(json!({"finished": true}))
    });
    let stack = TestStack::start_with(registry, Duration::from_millis(80));
    let mut client = WireClient::connect(stack.addr);

    let response = client.command("hang", json!({}));
    let message = response["error"].as_str().expect("timeout error");
    assert!(message.contains("hang"), "got: {message}");
    assert!(message.contains("timed out"), "got: {message}");

    // Timeout is retryable: once the host finishes the abandoned command,
    // pings get through again, and the hung command's late result never
    // bleeds into them.
    let mut recovered = None;
    for _ in 0..50 {
        let response = client.command("ping", json!({}));
        if response == json!({"message": "pong"}) {
            recovered = Some(response);
            break;
        }
        assert!(response.get("error").is_some(), "got: {response}");
        thread::sleep(Duration::from_millis(50));
    }
    assert!(recovered.is_some(), "bridge never recovered after timeout");
}

#[test]
fn exec_command_round_trips_raw_output() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    let response = client.command("exec_editor_python", json!({"code": "print('not json')"}));
    assert_eq!(response["success"], true);
    assert_eq!(response["output"].as_str().unwrap().trim(), "not json");

    let missing = client.command("exec_editor_python", json!({}));
    assert_eq!(missing, json!({"error": "Missing 'code' parameter"}));
}

#[test]
fn exec_command_mutates_world_visible_to_foundation_commands() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    client.command("spawn_actor", json!({"type": "PointLight", "name": "Lamp"}));
    let response = client.command(
        "exec_editor_python",
        json!({"code": "local r = editor.set_selected_actors({'Lamp'})\nprint(json.encode({status='success', result=r}))"}),
    );
    assert_eq!(response["success"], true, "got: {response}");

    let exec = client.command(
        "exec_editor_python",
        json!({"code": "print(#editor.get_selected_actors())"}),
    );
    assert_eq!(exec["output"].as_str().unwrap().trim(), "1");
}

#[test]
fn client_can_reconnect_after_dropping() {
    let stack = TestStack::start();
    {
        let mut first = WireClient::connect(stack.addr);
        first.command("spawn_actor", json!({"type": "PointLight", "name": "Keep"}));
    }
    // The first connection is gone; a new one sees the same world.
    let mut second = WireClient::connect(stack.addr);
    let listed = second.command("get_actors_in_level", json!({}));
    assert_eq!(listed["actors"][0]["name"], "Keep");
}

#[test]
fn level_commands_persist_across_the_wire() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    client.command("spawn_actor", json!({"type": "PointLight", "name": "L1"}));
    let saved = client.command("save_current_level", json!({}));
    assert_eq!(saved["success"], true);

    let created = client.command(
        "create_level",
        json!({"level_name": "Annex", "open_after_create": true}),
    );
    assert_eq!(created["level_path"], "maps/Annex");

    let info = client.command("get_current_level_info", json!({}));
    assert_eq!(info["level_name"], "Annex");
    assert_eq!(info["actor_count"], 0);

    let reopened = client.command("open_level", json!({"level": "Default"}));
    assert_eq!(reopened["success"], true);
    let info = client.command("get_current_level_info", json!({}));
    assert_eq!(info["actor_count"], 1);

    let level_file = stack.content_dir.path().join("maps/Annex.json");
    assert!(level_file.is_file());
}

#[test]
fn results_survive_codec_round_trip_deep_equal() {
    let stack = TestStack::start();
    let mut client = WireClient::connect(stack.addr);

    // Exercise nested objects, arrays, floats, booleans and null through the
    // full encode/decode path via the property bag.
    client.command("spawn_actor", json!({"type": "PointLight", "name": "L1"}));
    let value = json!({"nested": {"list": [1, 2.5, true, null], "text": "multi\nline"}});
    let set = client.command(
        "set_actor_property",
        json!({"name": "L1", "property_name": "blob", "property_value": value}),
    );
    assert_eq!(set["success"], true);

    let fetched: Value = client.command("get_actor_properties", json!({"name": "L1"}));
    assert_eq!(fetched["properties"]["blob"], value);
}
