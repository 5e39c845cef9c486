//! Planet rendering orchestration: floating-origin camera, rotation tracking,
//! LOD knobs, frame-budget governor, deferred rings and the per-body renderer.

mod governor;
mod origin;
mod renderer;
mod rings;
mod rotation;
mod settings;

pub use governor::{GovernorSettings, QualityGovernor};
pub use origin::{DEFAULT_REBASE_THRESHOLD, FloatingOriginCamera, OriginManager};
pub use renderer::{
    BodyDraw, BodyDrawer, BodyRenderStats, BodyUniforms, DrawError, FrameParams, FrameReport,
    PlanetRenderer, RenderError, RendererConfig,
};
pub use rings::{RingQueue, RingRenderRequest};
pub use rotation::{BASE_ROTATION_THRESHOLD, RotationTracker, rotation_threshold};
pub use settings::{LodSettings, MAX_SUPPORTED_LOD, SettingsChanges};
