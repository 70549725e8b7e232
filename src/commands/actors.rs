//! Actor manipulation commands.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::dispatch::{
    opt_vec3, require_str, require_value, CommandRegistry, HostContext,
};
use crate::editor::world::{Actor, ACTOR_CLASSES};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("get_actors_in_level", get_actors_in_level);
    registry.register("find_actors_by_name", find_actors_by_name);
    registry.register("spawn_actor", spawn_actor);
    registry.register("create_actor", |ctx, params| {
        warn!(
            "[Forge bridge] 'create_actor' is deprecated and will be removed; use 'spawn_actor'"
        );
        spawn_actor(ctx, params)
    });
    registry.register("delete_actor", delete_actor);
    registry.register("set_actor_transform", set_actor_transform);
    registry.register("get_actor_properties", get_actor_properties);
    registry.register("set_actor_property", set_actor_property);
}

fn get_actors_in_level(ctx: &mut HostContext, _params: &Map<String, Value>) -> Result<Value, String> {
    let actors: Vec<Value> = ctx
        .editor
        .world
        .actors()
        .iter()
        .map(|a| a.to_json(false))
        .collect();
    Ok(json!({ "actors": actors }))
}

fn find_actors_by_name(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let pattern = require_str(params, "pattern")?;
    let actors: Vec<Value> = ctx
        .editor
        .world
        .matching(pattern)
        .map(|a| a.to_json(false))
        .collect();
    Ok(json!({ "actors": actors }))
}

fn spawn_actor(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let class = require_str(params, "type")?.to_string();
    let name = require_str(params, "name")?.to_string();
    let location = opt_vec3(params, "location")?;
    let rotation = opt_vec3(params, "rotation")?;
    let scale = opt_vec3(params, "scale")?;

    if ctx.editor.world.find(&name).is_some() {
        return Err(format!("Actor with name '{name}' already exists"));
    }
    if !ACTOR_CLASSES.contains(&class.as_str()) {
        return Err(format!("Unknown actor type: {class}"));
    }

    let mut actor = Actor::new(name, class);
    if let Some(location) = location {
        actor.location = location;
    }
    if let Some(rotation) = rotation {
        actor.rotation = rotation;
    }
    if let Some(scale) = scale {
        actor.scale = scale;
    }

    let spawned = ctx.editor.world.spawn(actor)?.to_json(true);
    ctx.editor.mark_dirty();
    Ok(spawned)
}

fn delete_actor(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let name = require_str(params, "name")?;
    let removed = ctx
        .editor
        .delete_actor(name)
        .ok_or_else(|| format!("Actor not found: {name}"))?;
    ctx.editor.mark_dirty();
    Ok(json!({ "deleted_actor": removed.to_json(false) }))
}

fn set_actor_transform(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let name = require_str(params, "name")?;
    // Validate every component before touching the actor so a bad vector
    // cannot leave the transform half-updated.
    let location = opt_vec3(params, "location")?;
    let rotation = opt_vec3(params, "rotation")?;
    let scale = opt_vec3(params, "scale")?;

    let actor = ctx
        .editor
        .world
        .find_mut(name)
        .ok_or_else(|| format!("Actor not found: {name}"))?;
    if let Some(location) = location {
        actor.location = location;
    }
    if let Some(rotation) = rotation {
        actor.rotation = rotation;
    }
    if let Some(scale) = scale {
        actor.scale = scale;
    }
    let updated = actor.to_json(true);
    ctx.editor.mark_dirty();
    Ok(updated)
}

fn get_actor_properties(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let name = require_str(params, "name")?;
    ctx.editor
        .world
        .find(name)
        .map(|a| a.to_json(true))
        .ok_or_else(|| format!("Actor not found: {name}"))
}

fn set_actor_property(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let name = require_str(params, "name")?;
    let property_name = require_str(params, "property_name")?.to_string();
    let property_value = require_value(params, "property_value")?.clone();

    // Transform components get the same validation as set_actor_transform;
    // anything else lands in the free-form property bag.
    let as_vec3 = match property_name.as_str() {
        "location" | "rotation" | "scale" => {
            let mut probe = Map::new();
            probe.insert(property_name.clone(), property_value.clone());
            Some(opt_vec3(&probe, &property_name)?.ok_or_else(|| {
                format!("Invalid '{property_name}' parameter: expected an array of 3 numbers")
            })?)
        }
        _ => None,
    };

    let actor = ctx
        .editor
        .world
        .find_mut(name)
        .ok_or_else(|| format!("Actor not found: {name}"))?;
    match (property_name.as_str(), as_vec3) {
        ("location", Some(v)) => actor.location = v,
        ("rotation", Some(v)) => actor.rotation = v,
        ("scale", Some(v)) => actor.scale = v,
        _ => {
            actor.properties.insert(property_name.clone(), property_value);
        }
    }
    let details = actor.to_json(true);
    ctx.editor.mark_dirty();
    Ok(json!({
        "actor": name,
        "property": property_name,
        "success": true,
        "actor_details": details,
    }))
}
