use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_INSTRUCTIONS: &str = "Here is some default text.";
pub const DEFAULT_IMG_CLASS: &str = "img";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_newtype!(SceneId);
id_newtype!(ViewId);

/// One frame of the slideshow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub instructions: Option<String>,
    pub img_class: String,
    pub scene_number: u32,
    pub order: u64,
}

impl Scene {
    /// Attribute map handed to templates and persisted by the store.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Attributes supplied when creating a scene. Anything left unset falls back
/// to the scene defaults; `order` falls back to the collection's next order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewScene {
    instructions: Option<Option<String>>,
    img_class: Option<String>,
    scene_number: Option<u32>,
    order: Option<u64>,
}

impl NewScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` is kept as an explicit absence and does not pick up the default text.
    pub fn instructions(mut self, instructions: Option<impl Into<String>>) -> Self {
        self.instructions = Some(instructions.map(Into::into));
        self
    }

    pub fn img_class(mut self, img_class: impl Into<String>) -> Self {
        self.img_class = Some(img_class.into());
        self
    }

    pub fn scene_number(mut self, scene_number: u32) -> Self {
        self.scene_number = Some(scene_number);
        self
    }

    pub fn order(mut self, order: u64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn into_scene(self, id: SceneId, next_order: u64) -> Scene {
        Scene {
            id,
            instructions: self
                .instructions
                .unwrap_or_else(|| Some(DEFAULT_INSTRUCTIONS.to_string())),
            img_class: self
                .img_class
                .unwrap_or_else(|| DEFAULT_IMG_CLASS.to_string()),
            scene_number: self.scene_number.unwrap_or_default(),
            order: self.order.unwrap_or(next_order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_attributes_take_defaults() {
        let scene = NewScene::new().into_scene(SceneId::new(), 7);
        assert_eq!(scene.instructions.as_deref(), Some(DEFAULT_INSTRUCTIONS));
        assert_eq!(scene.img_class, "img");
        assert_eq!(scene.scene_number, 0);
        assert_eq!(scene.order, 7);
    }

    #[test]
    fn explicit_missing_instructions_stay_missing() {
        let scene = NewScene::new()
            .instructions(None::<String>)
            .scene_number(3)
            .into_scene(SceneId::new(), 1);
        assert_eq!(scene.instructions, None);
        assert_eq!(scene.scene_number, 3);
    }

    #[test]
    fn serializes_missing_instructions_as_null() {
        let scene = NewScene::new()
            .instructions(None::<String>)
            .into_scene(SceneId::new(), 1);
        let json = scene.to_json();
        assert_eq!(json.get("instructions"), Some(&serde_json::Value::Null));
        assert_eq!(json.get("order"), Some(&serde_json::json!(1)));
    }
}
