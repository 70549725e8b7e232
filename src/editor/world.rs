//! Actor storage for the reference editor host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Actor classes the spawn command accepts.
pub const ACTOR_CLASSES: &[&str] = &[
    "StaticMeshActor",
    "PointLight",
    "SpotLight",
    "DirectionalLight",
    "CameraActor",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub class: String,
    pub location: [f64; 3],
    /// Pitch, yaw, roll in degrees.
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    /// Free-form properties settable through `set_actor_property`.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Actor {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0, 1.0, 1.0],
            properties: Map::new(),
        }
    }

    /// Wire representation. Detailed form adds the free-form property bag.
    pub fn to_json(&self, detailed: bool) -> Value {
        let mut obj = serde_json::json!({
            "name": self.name,
            "class": self.class,
            "location": self.location,
            "rotation": self.rotation,
            "scale": self.scale,
        });
        if detailed && !self.properties.is_empty() {
            obj["properties"] = Value::Object(self.properties.clone());
        }
        obj
    }
}

/// The mutable world: an ordered actor list. Enumeration order is spawn
/// order; name lookups resolve to the first match in that order, so duplicate
/// display names are an accepted ambiguity rather than an error.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct World {
    actors: Vec<Actor>,
}

impl World {
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.name == name)
    }

    /// Substring match over actor names, in enumeration order.
    pub fn matching<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a Actor> {
        self.actors.iter().filter(move |a| a.name.contains(pattern))
    }

    /// Spawn fails without side effects when the name is taken.
    pub fn spawn(&mut self, actor: Actor) -> Result<&Actor, String> {
        if self.find(&actor.name).is_some() {
            return Err(format!("Actor with name '{}' already exists", actor.name));
        }
        self.actors.push(actor);
        Ok(self.actors.last().unwrap())
    }

    pub fn delete(&mut self, name: &str) -> Option<Actor> {
        let idx = self.actors.iter().position(|a| a.name == name)?;
        Some(self.actors.remove(idx))
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }
}
