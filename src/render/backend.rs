use tracing::debug;

use crate::assets::decode::unpremultiply_rgba8_in_place;
use crate::assets::fonts::FontBook;
use crate::compile::compiler::{CompileContext, compile_frame};
use crate::compile::plan::RenderPlan;
use crate::foundation::core::Canvas;
use crate::foundation::error::PosterResult;
use crate::layers::stack::LayerStack;
use crate::render::cpu::CpuBackend;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are premultiplied unless `premultiplied` says otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at (`x`, `y`), or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to straight alpha, in place.
    pub fn into_straight(mut self) -> Self {
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.data);
            self.premultiplied = false;
        }
        self
    }
}

/// Executes a [`RenderPlan`] into a frame.
pub trait RenderBackend {
    /// Rasterize `plan`. Text ops look their faces up in `fonts`.
    fn render_plan(&mut self, plan: &RenderPlan, fonts: &FontBook) -> PosterResult<FrameRGBA>;
}

/// Whether a render is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering,
}

/// One completed render.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub frame: FrameRGBA,
    /// Sources that were still loading; the caller should render again once they resolve.
    pub pending_sources: Vec<String>,
}

/// Full-surface repaint of a layer stack onto any target size.
///
/// Preview and export share this path; only the target canvas differs.
#[derive(Debug)]
pub struct Compositor<B: RenderBackend = CpuBackend> {
    backend: B,
    state: RenderState,
}

impl Default for Compositor<CpuBackend> {
    fn default() -> Self {
        Self::new(CpuBackend::default())
    }
}

impl<B: RenderBackend> Compositor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: RenderState::Idle,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Mark a render as started. Returns `false` if one is already in flight.
    pub fn begin_frame(&mut self) -> bool {
        if self.state == RenderState::Rendering {
            return false;
        }
        self.state = RenderState::Rendering;
        true
    }

    pub fn end_frame(&mut self) {
        self.state = RenderState::Idle;
    }

    /// Compile and rasterize `stack` onto a `target`-sized surface.
    ///
    /// Returns `Ok(None)` without drawing when a render is already in flight.
    #[tracing::instrument(skip_all, fields(width = target.width, height = target.height))]
    pub fn render(
        &mut self,
        stack: &LayerStack,
        target: Canvas,
        cx: &mut CompileContext<'_>,
    ) -> PosterResult<Option<RenderOutput>> {
        if !self.begin_frame() {
            debug!("render already in progress; nested request ignored");
            return Ok(None);
        }
        let plan = compile_frame(stack, target, cx);
        let result = self.backend.render_plan(&plan, cx.fonts);
        self.end_frame();
        let frame = result?;
        Ok(Some(RenderOutput {
            frame,
            pending_sources: plan.pending_sources,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
