use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use vulkano::{
    Validated, VulkanError,
    device::Device,
    format::Format,
    image::{Image, ImageUsage, view::ImageView},
    swapchain::{
        ColorSpace, PresentMode, Surface, Swapchain, SwapchainAcquireFuture, SwapchainCreateInfo,
        acquire_next_image,
    },
};

pub struct VulkanSwapchain {
    pub swapchain: Arc<Swapchain>,
    pub image_views: Vec<Arc<ImageView>>,
    pub format: Format,
    pub extent: [u32; 2],
}

impl VulkanSwapchain {
    pub fn new(device: Arc<Device>, surface: Arc<Surface>, window_size: [u32; 2]) -> Result<Self> {
        // Querying the capabilities of the surface. When we create the swapchain we can only
        // pass values that are allowed by the capabilities.
        let surface_capabilities = device
            .physical_device()
            .surface_capabilities(&surface, Default::default())
            .with_context(|| "Query surface capabilities")?;

        let formats = device
            .physical_device()
            .surface_formats(&surface, Default::default())
            .with_context(|| "Query surface formats")?;
        // Prefer sRGB non-linear formats
        let (image_format, _) = formats
            .iter()
            .find(|(f, c)| *f == Format::B8G8R8A8_SRGB && *c == ColorSpace::SrgbNonLinear)
            .or_else(|| formats.first())
            .copied()
            .ok_or_else(|| anyhow!("Surface reports no formats"))?;

        let (swapchain, images) = Swapchain::new(
            device,
            surface,
            SwapchainCreateInfo {
                min_image_count: surface_capabilities.min_image_count.max(2),
                image_format,
                image_extent: window_size,
                image_usage: ImageUsage::COLOR_ATTACHMENT,
                present_mode: surface_capabilities
                    .compatible_present_modes
                    .iter()
                    .find(|m| **m == PresentMode::Mailbox)
                    .copied()
                    .unwrap_or(PresentMode::Fifo),
                composite_alpha: surface_capabilities
                    .supported_composite_alpha
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("No supported composite alpha"))?,
                ..Default::default()
            },
        )
        .with_context(|| "Create swapchain")?;

        let format = swapchain.image_format();
        let extent = swapchain.image_extent();

        Ok(VulkanSwapchain {
            swapchain,
            image_views: Self::create_views(images)?,
            format,
            extent,
        })
    }

    pub fn recreate(&mut self, window_size: [u32; 2]) -> Result<()> {
        let (new_swapchain, new_images) = self
            .swapchain
            .recreate(SwapchainCreateInfo {
                image_extent: window_size,
                ..self.swapchain.create_info()
            })
            .with_context(|| "Recreate swapchain")?;
        self.extent = new_swapchain.image_extent();
        self.swapchain = new_swapchain;
        self.image_views = Self::create_views(new_images)?;
        Ok(())
    }

    pub fn acquire_next_image(
        &self,
    ) -> std::result::Result<(u32, bool, SwapchainAcquireFuture), VulkanError> {
        acquire_next_image(self.swapchain.clone(), None).map_err(Validated::unwrap)
    }

    fn create_views(images: Vec<Arc<Image>>) -> Result<Vec<Arc<ImageView>>> {
        images
            .into_iter()
            .map(|image| ImageView::new_default(image).with_context(|| "Create swapchain image view"))
            .collect()
    }
}
