use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{Level, debug, info, span};
use vulkano::{
    Validated, Version, VulkanError, VulkanLibrary,
    command_buffer::{
        AutoCommandBufferBuilder, CommandBufferUsage,
        allocator::{StandardCommandBufferAllocator, StandardCommandBufferAllocatorCreateInfo},
    },
    device::{
        Device, DeviceCreateInfo, DeviceExtensions, DeviceFeatures, Queue, QueueCreateInfo,
        QueueFlags, physical::PhysicalDeviceType,
    },
    instance::{Instance, InstanceCreateFlags, InstanceCreateInfo},
    memory::allocator::StandardMemoryAllocator,
    swapchain::{Surface, SwapchainPresentInfo},
    sync::GpuFuture,
};
use winit::window::Window as WinitWindow;

use crate::renderer::{Color, Primitive, RenderTarget, Renderer};

mod render_context;
mod render_targets;
mod swapchain;

use render_context::{OpKind, RecordedOp, WindowImage, record_frame};
use render_targets::RenderTargets;
use swapchain::VulkanSwapchain;

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Draws into a winit window through Vulkan.
///
/// Clears and primitives are recorded as they arrive and submitted as one
/// command buffer on `present`, which waits for the frame to finish before
/// returning.
pub struct VulkanRenderer {
    winit_window: Arc<WinitWindow>,
    _instance: Arc<Instance>,
    _device: Arc<Device>,
    graphics_queue: Arc<Queue>,
    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    swapchain: VulkanSwapchain,
    targets: RenderTargets,
    ops: Vec<RecordedOp>,
    window_clear: Color,
    recreate_swapchain: bool,
}

impl VulkanRenderer {
    pub fn new(winit_window: Arc<WinitWindow>) -> Result<Self> {
        let vk_lib = VulkanLibrary::new().with_context(|| "No local Vulkan library/DLL")?;

        let enable_validation = cfg!(debug_assertions)
            && vk_lib
                .layer_properties()
                .with_context(|| "Enumerate Vulkan layers")?
                .any(|layer| layer.name() == VALIDATION_LAYER);
        let layers = if enable_validation {
            info!("Vulkan validation layers enabled");
            vec![VALIDATION_LAYER.to_owned()]
        } else {
            Vec::new()
        };

        let required_extensions = Surface::required_extensions(winit_window.as_ref())
            .with_context(|| "Query surface extensions")?;
        let instance = Instance::new(
            vk_lib,
            InstanceCreateInfo {
                enabled_layers: layers,
                flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
                enabled_extensions: required_extensions,
                ..Default::default()
            },
        )
        .with_context(|| "Create Vulkan instance")?;

        let mut device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };

        let (physical_device, queue_family_index) = instance
            .enumerate_physical_devices()
            .with_context(|| "Enumerate physical devices")?
            .filter(|p| {
                p.api_version() >= Version::V1_3 || p.supported_extensions().khr_dynamic_rendering
            })
            .filter(|p| p.supported_extensions().contains(&device_extensions))
            .filter_map(|p| {
                debug!(
                    "Found device: {} (type: {:?})",
                    p.properties().device_name,
                    p.properties().device_type
                );
                p.queue_family_properties()
                    .iter()
                    .enumerate()
                    .position(|(i, q)| {
                        q.queue_flags.intersects(QueueFlags::GRAPHICS)
                            && p.presentation_support(i as u32, winit_window.as_ref())
                                .unwrap_or(false)
                    })
                    .map(|i| (p, i as u32))
            })
            .min_by_key(|(p, _)| match p.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 0,
                PhysicalDeviceType::IntegratedGpu => 1,
                PhysicalDeviceType::VirtualGpu => 2,
                PhysicalDeviceType::Cpu => 3,
                PhysicalDeviceType::Other => 4,
                _ => 5,
            })
            .ok_or_else(|| anyhow!("No suitable physical device found"))?;

        info!(
            "Using device: {} (type: {:?})",
            physical_device.properties().device_name,
            physical_device.properties().device_type,
        );

        if physical_device.api_version() < Version::V1_3 {
            device_extensions.khr_dynamic_rendering = true;
        }

        let (device, mut queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                enabled_extensions: device_extensions,
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                enabled_features: DeviceFeatures {
                    dynamic_rendering: true,
                    ..DeviceFeatures::empty()
                },
                ..Default::default()
            },
        )
        .with_context(|| "Create logical device")?;
        let graphics_queue = queues.next().with_context(|| "No queue found")?;

        let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
            device.clone(),
            StandardCommandBufferAllocatorCreateInfo::default(),
        ));
        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));

        let surface = Surface::from_window(instance.clone(), winit_window.clone())
            .with_context(|| "Create surface from window")?;
        let window_size: [u32; 2] = winit_window.inner_size().into();
        let swapchain = VulkanSwapchain::new(
            device.clone(),
            surface,
            [window_size[0].max(1), window_size[1].max(1)],
        )?;
        info!(
            "Swapchain ready: {:?} {}x{}",
            swapchain.format, swapchain.extent[0], swapchain.extent[1]
        );

        Ok(VulkanRenderer {
            winit_window,
            _instance: instance,
            _device: device,
            graphics_queue,
            command_buffer_allocator,
            swapchain,
            targets: RenderTargets::new(memory_allocator),
            ops: Vec::new(),
            window_clear: Color::default(),
            recreate_swapchain: false,
        })
    }

    fn record(&mut self, target: Option<&RenderTarget>, kind: OpKind) {
        let target = target.map(|target| (target.id(), self.targets.view(target)));
        self.ops.push(RecordedOp { target, kind });
    }
}

impl Renderer for VulkanRenderer {
    fn create_target(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        self.targets.create(width, height)
    }

    fn clear(&mut self, target: Option<&RenderTarget>, color: Color) -> Result<()> {
        if target.is_none() {
            self.window_clear = color;
        }
        self.record(target, OpKind::Clear(color));
        Ok(())
    }

    fn submit(&mut self, target: Option<&RenderTarget>, primitives: &[Primitive]) -> Result<()> {
        self.record(target, OpKind::Draw(primitives.to_vec()));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let ops = std::mem::take(&mut self.ops);

        let is_minimized = self.winit_window.is_minimized().unwrap_or(false);
        let window_size: [u32; 2] = self.winit_window.inner_size().into();
        if is_minimized || window_size[0] == 0 || window_size[1] == 0 {
            // Nothing to present into; the swapchain is rebuilt once the window is back.
            self.recreate_swapchain = true;
            return Ok(());
        }

        let _span_present = span!(Level::DEBUG, "VulkanRenderer::present", ops = ops.len()).entered();

        if self.recreate_swapchain || window_size != self.swapchain.extent {
            info!("Recreating swapchain for new window size: {:?}", window_size);
            self.swapchain.recreate(window_size)?;
            self.recreate_swapchain = false;
        }

        let (image_index, suboptimal, acquire_future) = match self.swapchain.acquire_next_image() {
            Ok(r) => r,
            Err(VulkanError::OutOfDate) => {
                self.recreate_swapchain = true;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if suboptimal {
            self.recreate_swapchain = true;
        }

        let mut builder = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            self.graphics_queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .with_context(|| "Allocate command buffer")?;
        let window = WindowImage {
            view: self.swapchain.image_views[image_index as usize].clone(),
            extent: self.swapchain.extent,
        };
        record_frame(&mut builder, &ops, &window, self.window_clear)?;
        let command_buffer = builder.build().with_context(|| "Build command buffer")?;

        let execution = acquire_future
            .then_execute(self.graphics_queue.clone(), command_buffer)
            .with_context(|| "Execute frame")?
            .then_swapchain_present(
                self.graphics_queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(
                    self.swapchain.swapchain.clone(),
                    image_index,
                ),
            )
            .then_signal_fence_and_flush();

        match execution.map_err(Validated::unwrap) {
            Ok(fence) => fence.wait(None).with_context(|| "Wait for frame fence")?,
            Err(VulkanError::OutOfDate) => self.recreate_swapchain = true,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "vulkan"
    }
}
