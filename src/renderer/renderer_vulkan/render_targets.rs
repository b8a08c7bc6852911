use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use vulkano::{
    format::Format,
    image::{Image, ImageCreateInfo, ImageType, ImageUsage, view::ImageView},
    memory::allocator::{AllocationCreateInfo, StandardMemoryAllocator},
};

use crate::renderer::{RenderTarget, TargetId};

pub const OFFSCREEN_FORMAT: Format = Format::R8G8B8A8_UNORM;

/// Off-screen images, keyed by the handle given out for them.
pub struct RenderTargets {
    allocator: Arc<StandardMemoryAllocator>,
    views: HashMap<TargetId, Arc<ImageView>>,
    next_id: u32,
}

impl RenderTargets {
    pub fn new(allocator: Arc<StandardMemoryAllocator>) -> Self {
        Self {
            allocator,
            views: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn create(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        let image = Image::new(
            self.allocator.clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format: OFFSCREEN_FORMAT,
                extent: [width.max(1), height.max(1), 1],
                usage: ImageUsage::COLOR_ATTACHMENT
                    | ImageUsage::SAMPLED
                    | ImageUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo::default(),
        )
        .with_context(|| "Allocate off-screen image")?;
        let view = ImageView::new_default(image).with_context(|| "Create off-screen view")?;

        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.views.insert(id, view);
        Ok(RenderTarget::new(id, width, height))
    }

    /// # Panics
    ///
    /// Panics if `target` was not created here.
    pub fn view(&self, target: &RenderTarget) -> Arc<ImageView> {
        self.views
            .get(&target.id())
            .cloned()
            .unwrap_or_else(|| panic!("unknown render target {:?}", target.id()))
    }
}
