//! The immutable static world: walls, hazards, speed zones and environment
//! modifiers derived once from level data.
//!
//! Object behaviour is selected by the closed [`ObjectKind`] enum; each
//! variant carries only the data that kind needs. The world is built once and
//! then shared by reference (typically behind an `Arc`) between the tick loop,
//! every planner node and the validator.
//!
//! Level data arrives as [`ObjectDescriptor`]s (usually JSON). Building a
//! world never fails as a whole: an invalid descriptor is logged, reported in
//! [`WorldBuild::rejected`] and left out.

use serde::{Deserialize, Serialize};

use crate::actor::Direction;
use crate::geometry::{Bounds, Point, Polygon};
use crate::grid::{SpatialGrid, DEFAULT_CELL_SIZE};
use crate::hitbox::{collides, ActorBox, Shape};
use crate::WorldError;

// ---------------------------------------------------------------------------
// Object kinds
// ---------------------------------------------------------------------------

/// What touching a hazard means to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    /// Kills the actor.
    Spike,
    /// Starts an arena encounter.
    Arena,
    /// Switches map.
    Portal,
}

/// Physics overrides active while the actor overlaps the region.
///
/// Every scalar is a multiplier on the corresponding base constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvModifier {
    /// Multiplier on [`GRAVITY`](crate::settings::GRAVITY).
    pub gravity: f64,
    /// Multiplier on [`JUMP_SPEED`](crate::settings::JUMP_SPEED).
    pub jump_speed: f64,
    /// Multiplier on [`WALK_SPEED`](crate::settings::WALK_SPEED).
    pub walk_speed: f64,
    /// Multiplier on the running speed.
    pub run_speed: f64,
    /// Allow jumping while airborne.
    pub jump_override: bool,
}

impl Default for EnvModifier {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            jump_speed: 1.0,
            walk_speed: 1.0,
            run_speed: 1.0,
            jump_override: false,
        }
    }
}

/// Closed set of static object behaviours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    /// Solid; resolved by the two-pass collision step.
    Wall,
    /// Non-solid; contact ends the tick and is recorded on the actor.
    Hazard(HazardKind),
    /// Non-solid; takes over movement and pushes the actor in `direction`.
    SpeedZone {
        /// Push direction.
        direction: Direction,
    },
    /// Non-solid; overrides physics constants while overlapped.
    EnvironmentModifier(EnvModifier),
}

/// A polygon with a behaviour. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticObject {
    polygon: Polygon,
    kind: ObjectKind,
}

impl StaticObject {
    pub fn new(polygon: Polygon, kind: ObjectKind) -> Self {
        Self { polygon, kind }
    }

    pub fn wall(polygon: Polygon) -> Self {
        Self::new(polygon, ObjectKind::Wall)
    }

    pub fn hazard(polygon: Polygon, kind: HazardKind) -> Self {
        Self::new(polygon, ObjectKind::Hazard(kind))
    }

    pub fn speed_zone(polygon: Polygon, direction: Direction) -> Self {
        Self::new(polygon, ObjectKind::SpeedZone { direction })
    }

    pub fn modifier(polygon: Polygon, modifier: EnvModifier) -> Self {
        Self::new(polygon, ObjectKind::EnvironmentModifier(modifier))
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn bounds(&self) -> Bounds {
        self.polygon.bounds()
    }
}

// ---------------------------------------------------------------------------
// Level descriptors
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle given by its bottom-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectDescriptor {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One object as it appears in level data.
///
/// `kind` is one of `wall`, `spike`, `arena`, `portal`, `speed_zone` or
/// `env_modifier` (case-insensitive). The shape is either `rect` or `outline`;
/// `rect` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub outline: Vec<[f64; 2]>,
    #[serde(default)]
    pub rect: Option<RectDescriptor>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub modifier: Option<EnvModifier>,
}

impl ObjectDescriptor {
    /// Convenience constructor for a rectangular object of `kind`.
    pub fn rect(kind: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            kind: kind.to_owned(),
            name: None,
            outline: Vec::new(),
            rect: Some(RectDescriptor {
                x,
                y,
                width,
                height,
            }),
            direction: None,
            modifier: None,
        }
    }

    fn polygon(&self) -> Result<Polygon, WorldError> {
        if let Some(r) = self.rect {
            return Polygon::rect(r.x, r.y, r.x + r.width, r.y + r.height);
        }
        if self.outline.is_empty() {
            return Err(WorldError::MissingData {
                kind: self.kind.clone(),
                field: "outline",
            });
        }
        Polygon::new(self.outline.iter().copied().map(Point::from).collect())
    }

    /// Validate and convert into a [`StaticObject`].
    pub fn to_object(&self) -> Result<StaticObject, WorldError> {
        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "wall" => ObjectKind::Wall,
            "spike" => ObjectKind::Hazard(HazardKind::Spike),
            "arena" => ObjectKind::Hazard(HazardKind::Arena),
            "portal" => ObjectKind::Hazard(HazardKind::Portal),
            "speed_zone" | "speed_tile" => ObjectKind::SpeedZone {
                direction: self.direction.ok_or_else(|| WorldError::MissingData {
                    kind: self.kind.clone(),
                    field: "direction",
                })?,
            },
            "env_modifier" | "environment" => {
                ObjectKind::EnvironmentModifier(self.modifier.ok_or_else(|| {
                    WorldError::MissingData {
                        kind: self.kind.clone(),
                        field: "modifier",
                    }
                })?)
            }
            _ => {
                return Err(WorldError::UnknownKind {
                    kind: self.kind.clone(),
                })
            }
        };
        Ok(StaticObject::new(self.polygon()?, kind))
    }
}

/// A descriptor that did not make it into the world.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedObject {
    /// Position in the descriptor list.
    pub index: usize,
    /// Descriptor name, if it had one.
    pub name: Option<String>,
    pub error: WorldError,
}

/// Result of [`StaticWorld::build`].
#[derive(Debug, Clone)]
pub struct WorldBuild {
    pub world: StaticWorld,
    pub rejected: Vec<RejectedObject>,
}

// ---------------------------------------------------------------------------
// StaticWorld
// ---------------------------------------------------------------------------

/// Read-only obstacle set partitioned by kind.
#[derive(Debug, Clone)]
pub struct StaticWorld {
    objects: Vec<StaticObject>,
    walls: Vec<usize>,
    hazards: Vec<usize>,
    speed_zones: Vec<usize>,
    modifiers: Vec<usize>,
    wall_grid: SpatialGrid,
}

impl Default for StaticWorld {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StaticWorld {
    /// Build from already-validated objects. Order is preserved and defines
    /// the resolution order of simultaneous contacts.
    pub fn new(objects: Vec<StaticObject>) -> Self {
        let mut walls = Vec::new();
        let mut hazards = Vec::new();
        let mut speed_zones = Vec::new();
        let mut modifiers = Vec::new();
        let mut wall_grid = SpatialGrid::new(DEFAULT_CELL_SIZE);

        for (i, obj) in objects.iter().enumerate() {
            match obj.kind {
                ObjectKind::Wall => {
                    wall_grid.insert(walls.len(), &obj.bounds());
                    walls.push(i);
                }
                ObjectKind::Hazard(_) => hazards.push(i),
                ObjectKind::SpeedZone { .. } => speed_zones.push(i),
                ObjectKind::EnvironmentModifier(_) => modifiers.push(i),
            }
        }

        Self {
            objects,
            walls,
            hazards,
            speed_zones,
            modifiers,
            wall_grid,
        }
    }

    /// Build from level descriptors, excluding (and logging) invalid ones.
    pub fn build<I>(descriptors: I) -> WorldBuild
    where
        I: IntoIterator<Item = ObjectDescriptor>,
    {
        let mut objects = Vec::new();
        let mut rejected = Vec::new();

        for (index, desc) in descriptors.into_iter().enumerate() {
            match desc.to_object() {
                Ok(obj) => objects.push(obj),
                Err(error) => {
                    tracing::warn!(
                        index,
                        name = desc.name.as_deref().unwrap_or(""),
                        kind = %desc.kind,
                        error = %error,
                        "excluding static object from world"
                    );
                    rejected.push(RejectedObject {
                        index,
                        name: desc.name,
                        error,
                    });
                }
            }
        }

        WorldBuild {
            world: Self::new(objects),
            rejected,
        }
    }

    /// Parse a JSON array of [`ObjectDescriptor`]s and [`build`](Self::build) it.
    ///
    /// # Errors
    ///
    /// Only malformed JSON is an error; semantically invalid objects are
    /// reported in [`WorldBuild::rejected`].
    pub fn from_json_str(json: &str) -> Result<WorldBuild, serde_json::Error> {
        let descriptors: Vec<ObjectDescriptor> = serde_json::from_str(json)?;
        Ok(Self::build(descriptors))
    }

    /// Copy of this world with every hazard polygon inflated by `margin`.
    ///
    /// Used to give the planner a safety margin around hazards; the gameplay
    /// world is left untouched.
    pub fn with_extended_hazards(&self, margin: f64) -> StaticWorld {
        if margin <= 0.0 {
            return self.clone();
        }
        let objects = self
            .objects
            .iter()
            .map(|obj| match obj.kind {
                ObjectKind::Hazard(_) => {
                    StaticObject::new(obj.polygon.inflated(margin), obj.kind)
                }
                _ => obj.clone(),
            })
            .collect();
        Self::new(objects)
    }

    pub fn objects(&self) -> &[StaticObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Walls whose bounds intersect `bounds` (inclusive), in world order.
    pub fn walls_near(&self, bounds: &Bounds) -> impl Iterator<Item = &StaticObject> + '_ {
        let candidates = self.wall_grid.query(bounds);
        let bounds = *bounds;
        candidates
            .into_iter()
            .map(move |w| &self.objects[self.walls[w]])
            .filter(move |obj| obj.bounds().intersects(&bounds))
    }

    /// All hazards, in world order.
    pub fn hazards(&self) -> impl Iterator<Item = &StaticObject> + '_ {
        self.hazards.iter().map(move |&i| &self.objects[i])
    }

    /// First hazard whose bounding box touches `hitbox`'s bounding box.
    pub fn hazard_touching(&self, hitbox: &ActorBox) -> Option<HazardKind> {
        let bounds = hitbox.bounds();
        self.hazards().find_map(|obj| match obj.kind {
            ObjectKind::Hazard(kind) if obj.bounds().intersects(&bounds) => Some(kind),
            _ => None,
        })
    }

    /// Push direction of the first speed zone overlapping `hitbox`.
    pub fn speed_zone_at(&self, hitbox: &ActorBox) -> Option<Direction> {
        self.speed_zones
            .iter()
            .map(|&i| &self.objects[i])
            .find_map(|obj| match obj.kind {
                ObjectKind::SpeedZone { direction } if collides(&obj.polygon, hitbox) => {
                    Some(direction)
                }
                _ => None,
            })
    }

    /// First environment modifier overlapping `hitbox`.
    pub fn modifier_at(&self, hitbox: &ActorBox) -> Option<&EnvModifier> {
        self.modifiers
            .iter()
            .map(|&i| &self.objects[i])
            .find_map(|obj| match &obj.kind {
                ObjectKind::EnvironmentModifier(m) if collides(&obj.polygon, hitbox) => Some(m),
                _ => None,
            })
    }

    /// Union of all object bounds, or `None` for an empty world.
    pub fn extent(&self) -> Option<Bounds> {
        let mut iter = self.objects.iter().map(StaticObject::bounds);
        let first = iter.next()?;
        Some(iter.fold(first, |acc, b| Bounds {
            left: acc.left.min(b.left),
            right: acc.right.max(b.right),
            bottom: acc.bottom.min(b.bottom),
            top: acc.top.max(b.top),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
