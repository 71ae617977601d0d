// MODEL: Game state and data
pub mod camera;
pub mod entity;
pub mod scene;

pub use camera::Camera;
pub use entity::{Behavior, Entity, EntityId, Geometry, Material, MotionProfile, RenderHandle, RotationOrder, Transform};
pub use scene::{Playground, Scene};
