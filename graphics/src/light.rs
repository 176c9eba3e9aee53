//! Light parameter blocks and the per-frame light list.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::Color;

/// Number of lights the forward shader accepts per part.
pub const MAX_FRAME_LIGHTS: usize = 4;

/// How a light casts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Parallel rays along a direction; the light's position is ignored.
    Directional {
        /// Direction the light travels, need not be normalized.
        direction: [f32; 3],
    },
    /// Omnidirectional from a point.
    Point {
        /// Falloff radius in world units.
        radius: f32,
    },
}

/// Shared light parameters, registered once and referenced by entities.
#[derive(Debug, Clone, PartialEq)]
pub struct LightBlock {
    /// Identity within the light manager.
    pub name: String,
    /// Cast shape.
    pub kind: LightKind,
    /// Light color before intensity.
    pub color: Color,
    /// Scalar multiplier applied to the color per frame.
    pub intensity: f32,
}

impl LightBlock {
    /// A directional light.
    pub fn directional(
        name: impl Into<String>,
        direction: [f32; 3],
        color: Color,
        intensity: f32,
    ) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Directional { direction },
            color,
            intensity,
        }
    }

    /// A point light.
    pub fn point(name: impl Into<String>, radius: f32, color: Color, intensity: f32) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Point { radius },
            color,
            intensity,
        }
    }

    /// Resolve into the per-frame form at a world position.
    ///
    /// Directional lights carry their direction in the position slot; the
    /// shader reads the flag to tell them apart. Intensity is folded into
    /// the color here so the shader never sees it.
    pub fn frame_light(&self, position: [f32; 3]) -> FrameLight {
        let position = match self.kind {
            LightKind::Directional { direction } => direction,
            LightKind::Point { .. } => position,
        };
        FrameLight {
            position,
            color: [
                self.color.r * self.intensity,
                self.color.g * self.intensity,
                self.color.b * self.intensity,
            ],
            directional: matches!(self.kind, LightKind::Directional { .. }),
        }
    }
}

/// One light as the renderer consumes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLight {
    /// World position, or travel direction for directional lights.
    pub position: [f32; 3],
    /// Color with intensity already folded in.
    pub color: [f32; 3],
    /// Whether `position` is a direction.
    pub directional: bool,
}

/// Deduplicates light parameter blocks by name.
///
/// Entities reference registered blocks by `Arc`, so a hundred street
/// lamps share one block and retuning it retunes them all.
pub struct LightManager {
    blocks: Mutex<HashMap<String, Arc<LightBlock>>>,
}

impl LightManager {
    pub(crate) fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a block. On a name collision the existing block wins.
    pub fn register(&self, block: LightBlock) -> Result<Arc<LightBlock>, GraphicsError> {
        if block.name.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "light registration requires a name".to_string(),
            ));
        }
        let mut blocks = self.blocks.lock();
        if let Some(existing) = blocks.get(&block.name) {
            return Ok(Arc::clone(existing));
        }
        let name = block.name.clone();
        let block = Arc::new(block);
        blocks.insert(name, Arc::clone(&block));
        Ok(block)
    }

    /// Look up a registered block by name.
    pub fn get(&self, name: &str) -> Option<Arc<LightBlock>> {
        self.blocks.lock().get(name).map(Arc::clone)
    }

    /// Number of registered blocks.
    pub fn count(&self) -> usize {
        self.blocks.lock().len()
    }
}
