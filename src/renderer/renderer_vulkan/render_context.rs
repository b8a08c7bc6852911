use std::sync::Arc;

use anyhow::{Context, Result};
use vulkano::{
    command_buffer::{
        AutoCommandBufferBuilder, ClearAttachment, ClearRect, PrimaryAutoCommandBuffer,
        RenderingAttachmentInfo, RenderingInfo,
    },
    format::{ClearColorValue, ClearValue},
    image::view::ImageView,
    render_pass::{AttachmentLoadOp, AttachmentStoreOp},
};

use crate::renderer::{Color, Primitive, TargetId};

pub enum OpKind {
    Clear(Color),
    Draw(Vec<Primitive>),
}

/// One recorded operation, already resolved to the image it writes to.
/// `target: None` is the window.
pub struct RecordedOp {
    pub target: Option<(TargetId, Arc<ImageView>)>,
    pub kind: OpKind,
}

impl RecordedOp {
    fn target_id(&self) -> Option<TargetId> {
        self.target.as_ref().map(|(id, _)| *id)
    }
}

/// The swapchain image this frame presents.
pub struct WindowImage {
    pub view: Arc<ImageView>,
    pub extent: [u32; 2],
}

/// Records a frame's operations as dynamic-rendering passes, one pass per
/// run of consecutive operations on the same target.
///
/// The window image is always cleared by its first pass (with
/// `window_clear` when the frame does not start with an explicit clear), so
/// a frame never presents undefined contents.
pub fn record_frame(
    builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
    ops: &[RecordedOp],
    window: &WindowImage,
    window_clear: Color,
) -> Result<()> {
    let mut window_started = false;
    let mut start = 0;

    while start < ops.len() {
        let target = ops[start].target_id();
        let end = ops[start..]
            .iter()
            .position(|op| op.target_id() != target)
            .map_or(ops.len(), |offset| start + offset);
        let group = &ops[start..end];

        let (view, extent) = match &ops[start].target {
            Some((_, view)) => {
                let [width, height, _] = view.image().extent();
                (view.clone(), [width, height])
            }
            None => (window.view.clone(), window.extent),
        };

        let (initial_clear, rest) = match &group[0].kind {
            OpKind::Clear(color) => (Some(*color), &group[1..]),
            OpKind::Draw(_) if target.is_none() && !window_started => (Some(window_clear), group),
            OpKind::Draw(_) => (None, group),
        };

        begin_pass(builder, view, extent, initial_clear)?;
        for op in rest {
            match &op.kind {
                OpKind::Clear(color) => {
                    clear_rects(builder, *color, vec![full_rect(extent)])?;
                }
                OpKind::Draw(primitives) => {
                    for primitive in primitives {
                        let Primitive::Rect {
                            position,
                            size,
                            color,
                        } = primitive;
                        if let Some(rect) = clip_rect(position.to_array(), size.to_array(), extent) {
                            clear_rects(builder, *color, vec![rect])?;
                        }
                    }
                }
            }
        }
        builder.end_rendering().with_context(|| "End rendering")?;

        window_started |= target.is_none();
        start = end;
    }

    if !window_started {
        begin_pass(builder, window.view.clone(), window.extent, Some(window_clear))?;
        builder.end_rendering().with_context(|| "End rendering")?;
    }
    Ok(())
}

fn begin_pass(
    builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
    view: Arc<ImageView>,
    extent: [u32; 2],
    clear: Option<Color>,
) -> Result<()> {
    let (load_op, clear_value) = match clear {
        Some(color) => (
            AttachmentLoadOp::Clear,
            Some(ClearValue::Float(color.to_array())),
        ),
        None => (AttachmentLoadOp::Load, None),
    };

    builder
        .begin_rendering(RenderingInfo {
            render_area_extent: extent,
            layer_count: 1,
            color_attachments: vec![Some(RenderingAttachmentInfo {
                load_op,
                store_op: AttachmentStoreOp::Store,
                clear_value,
                ..RenderingAttachmentInfo::image_view(view)
            })],
            ..Default::default()
        })
        .with_context(|| "Begin rendering")?;
    Ok(())
}

fn clear_rects(
    builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
    color: Color,
    rects: Vec<ClearRect>,
) -> Result<()> {
    builder
        .clear_attachments(
            [ClearAttachment::Color {
                color_attachment: 0,
                clear_value: ClearColorValue::Float(color.to_array()),
            }]
            .into_iter()
            .collect(),
            rects.into_iter().collect(),
        )
        .with_context(|| "Clear attachment region")?;
    Ok(())
}

fn full_rect(extent: [u32; 2]) -> ClearRect {
    ClearRect {
        offset: [0, 0],
        extent,
        array_layers: 0..1,
    }
}

/// Intersects a pixel rectangle with the render area. `None` when nothing
/// of it is left.
fn clip_rect(position: [f32; 2], size: [f32; 2], extent: [u32; 2]) -> Option<ClearRect> {
    let mut offset = [0u32; 2];
    let mut clipped = [0u32; 2];
    for axis in 0..2 {
        let limit = extent[axis] as f32;
        let start = position[axis].max(0.0).min(limit);
        let end = (position[axis] + size[axis]).max(0.0).min(limit);
        if end - start < 1.0 {
            return None;
        }
        offset[axis] = start as u32;
        clipped[axis] = (end - start) as u32;
    }
    Some(ClearRect {
        offset,
        extent: clipped,
        array_layers: 0..1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_inside_the_area_is_unchanged() {
        let rect = clip_rect([10.0, 20.0], [30.0, 40.0], [100, 100]).unwrap();
        assert_eq!(rect.offset, [10, 20]);
        assert_eq!(rect.extent, [30, 40]);
    }

    #[test]
    fn rect_is_clipped_to_the_area() {
        let rect = clip_rect([-5.0, 90.0], [20.0, 20.0], [100, 100]).unwrap();
        assert_eq!(rect.offset, [0, 90]);
        assert_eq!(rect.extent, [15, 10]);
    }

    #[test]
    fn offscreen_rect_is_dropped() {
        assert!(clip_rect([150.0, 0.0], [10.0, 10.0], [100, 100]).is_none());
        assert!(clip_rect([0.0, 0.0], [0.5, 10.0], [100, 100]).is_none());
    }
}
