//! Stage (race course) definitions.
//!
//! A stage is immutable static geometry plus the finish line (`goal_y`) and
//! the zoom line (`zoom_y`) where the camera starts its slow-motion framing.
//! The y axis points down: marbles race towards larger y.

use serde::{Deserialize, Serialize};

use crate::theme::Color;

/// Shape of a stage entity. Box extents are half sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityShape {
    Box {
        width: f32,
        height: f32,
        #[serde(default)]
        rotation: f32,
    },
    Circle {
        radius: f32,
    },
    Polyline {
        points: Vec<[f32; 2]>,
    },
}

/// Discriminant of [`EntityShape`], used to pick theme styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Box,
    Circle,
    Polyline,
}

impl EntityShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box { .. } => ShapeKind::Box,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Polyline { .. } => ShapeKind::Polyline,
        }
    }
}

/// How the physics engine should treat an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    #[default]
    Static,
    /// Moved by its angular velocity, unaffected by collisions.
    Kinematic,
}

/// Physical properties of a stage entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityProps {
    pub density: f32,
    pub restitution: f32,
    /// Radians per second; only meaningful for kinematic entities.
    pub angular_velocity: f32,
}

impl Default for EntityProps {
    fn default() -> Self {
        Self {
            density: 1.0,
            restitution: 0.0,
            angular_velocity: 0.0,
        }
    }
}

/// A single piece of course geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntity {
    pub position: [f32; 2],
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub body: BodyKind,
    pub shape: EntityShape,
    #[serde(default)]
    pub props: EntityProps,
    /// Overrides the theme fill/outline color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Overrides the theme bloom color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_color: Option<Color>,
}

/// Renderable state of a stage entity after the latest physics step.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntityState {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub shape: EntityShape,
    pub color: Option<Color>,
    pub bloom_color: Option<Color>,
}

/// Complete stage definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub title: String,
    pub goal_y: f32,
    pub zoom_y: f32,
    pub entities: Vec<MapEntity>,
}

/// Index/title pair for populating a map picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapInfo {
    pub index: usize,
    pub title: String,
}

const BUILTIN_STAGES: [&str; 3] = [
    include_str!("../stages/plinko.json"),
    include_str!("../stages/zigzag.json"),
    include_str!("../stages/windmill.json"),
];

impl StageDef {
    /// Loads a stage from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the stage to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses the stages bundled with the crate, in picker order.
    pub fn builtin() -> Result<Vec<Self>, serde_json::Error> {
        BUILTIN_STAGES.iter().map(|json| Self::from_json(json)).collect()
    }

    /// Axis-aligned bounds `(min, max)` of all entity anchor points and polyline vertices.
    pub fn bounds(&self) -> ([f32; 2], [f32; 2]) {
        let mut min = [f32::INFINITY, f32::INFINITY];
        let mut max = [f32::NEG_INFINITY, f32::NEG_INFINITY];
        let mut include = |x: f32, y: f32| {
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        };

        for entity in &self.entities {
            let [ex, ey] = entity.position;
            match &entity.shape {
                EntityShape::Polyline { points } => {
                    for [px, py] in points {
                        include(ex + px, ey + py);
                    }
                }
                EntityShape::Box { width, height, .. } => {
                    let reach = width.hypot(*height);
                    include(ex - reach, ey - reach);
                    include(ex + reach, ey + reach);
                }
                EntityShape::Circle { radius } => {
                    include(ex - radius, ey - radius);
                    include(ex + radius, ey + radius);
                }
            }
        }

        min[0] = min[0].min(0.0);
        max[0] = max[0].max(min[0]);
        min[1] = min[1].min(self.goal_y);
        max[1] = max[1].max(self.goal_y);

        (min, max)
    }
}

/// Lists built-in stage titles with their indices.
pub fn map_infos(stages: &[StageDef]) -> Vec<MapInfo> {
    stages
        .iter()
        .enumerate()
        .map(|(index, stage)| MapInfo {
            index,
            title: stage.title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_stages_parse() {
        let stages = StageDef::builtin().expect("Failed to parse builtin stages");
        assert_eq!(stages.len(), 3);

        for stage in &stages {
            assert!(!stage.entities.is_empty(), "{} has no entities", stage.title);
            assert!(stage.zoom_y < stage.goal_y, "{} zooms after the goal", stage.title);
        }
    }

    #[test]
    fn test_map_infos() {
        let stages = StageDef::builtin().unwrap();
        let infos = map_infos(&stages);

        assert_eq!(infos[0].index, 0);
        assert_eq!(infos[1].title, stages[1].title);
    }

    #[test]
    fn test_stage_json_parsing() {
        let json = r##"{
            "title": "Test",
            "goal_y": 50,
            "zoom_y": 45,
            "entities": [
                { "position": [0, 0], "shape": { "type": "polyline", "points": [[1, 0], [1, 50]] } },
                {
                    "position": [5, 10],
                    "body": "kinematic",
                    "shape": { "type": "box", "width": 2, "height": 0.1 },
                    "props": { "angular_velocity": 1.5 },
                    "color": "#ff0000"
                },
                { "position": [5, 20], "shape": { "type": "circle", "radius": 0.5 } }
            ]
        }"##;

        let stage = StageDef::from_json(json).expect("Failed to parse stage");

        assert_eq!(stage.entities.len(), 3);
        assert_eq!(stage.entities[1].body, BodyKind::Kinematic);
        assert_eq!(stage.entities[1].props.angular_velocity, 1.5);
        assert_eq!(stage.entities[1].props.density, 1.0);
        assert_eq!(stage.entities[1].color, Some(Color::RED));
        assert_eq!(stage.entities[2].shape.kind(), ShapeKind::Circle);
    }

    #[test]
    fn test_bounds_cover_goal() {
        let stage = StageDef {
            title: "bounds".to_string(),
            goal_y: 30.0,
            zoom_y: 25.0,
            entities: vec![MapEntity {
                position: [0.0, 0.0],
                angle: 0.0,
                body: BodyKind::Static,
                shape: EntityShape::Polyline {
                    points: vec![[2.0, -1.0], [8.0, 10.0]],
                },
                props: EntityProps::default(),
                color: None,
                bloom_color: None,
            }],
        };

        let (min, max) = stage.bounds();
        assert_eq!(min, [0.0, -1.0]);
        assert_eq!(max, [8.0, 30.0]);
    }

    #[test]
    fn test_bounds_of_empty_stage_are_finite() {
        let stage = StageDef {
            title: "empty".to_string(),
            goal_y: 30.0,
            zoom_y: 25.0,
            entities: Vec::new(),
        };

        let (min, max) = stage.bounds();
        assert_eq!(min, [0.0, 30.0]);
        assert_eq!(max, [0.0, 30.0]);
    }
}
