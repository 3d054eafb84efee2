// ============================================================================
// GPU CONTEXT — headless device for the field producer
// ============================================================================
//
// The producer only runs one compute pass per frame over three storage
// buffers (mask, feedback field, output field), so the device needs no
// surface and no optional features.  What matters is how large a storage
// binding may be: a field at the 16384² cap does not fit on most adapters,
// and `supports_binding` lets the producer fail that frame cleanly instead.

use std::sync::Arc;

pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Largest storage buffer the producer may bind.
    pub max_storage_binding: u64,
}

impl GpuContext {
    /// `None` when neither a hardware nor a software adapter can run compute.
    pub fn new(preferred_gpu: &str) -> Option<Self> {
        if let Some(ctx) = pollster::block_on(Self::request(preferred_gpu, false)) {
            return Some(ctx);
        }
        log::warn!("[GPU] hardware adapter unavailable, trying software fallback");
        pollster::block_on(Self::request(preferred_gpu, true))
    }

    async fn request(preferred_gpu: &str, software: bool) -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power_preference = match preferred_gpu.to_lowercase().as_str() {
            "low power" | "integrated" => wgpu::PowerPreference::LowPower,
            _ => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: software,
            })
            .await?;

        let adapter_name = adapter.get_info().name.clone();
        let available = adapter.limits();

        // Downlevel defaults cap storage bindings at 128 MiB; ask for whatever
        // the adapter has so large working sizes still bind.
        let required_limits = wgpu::Limits {
            max_storage_buffer_binding_size: available.max_storage_buffer_binding_size,
            max_buffer_size: available.max_buffer_size,
            max_compute_workgroups_per_dimension: available.max_compute_workgroups_per_dimension,
            ..wgpu::Limits::downlevel_defaults()
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("edgefx field producer"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                },
                None,
            )
            .await
            .ok()?;

        log::info!(
            "[GPU] field producer on '{}'{}",
            adapter_name,
            if software { " (software)" } else { "" }
        );

        Some(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_storage_binding: available.max_storage_buffer_binding_size as u64,
        })
    }

    pub fn supports_binding(&self, bytes: u64) -> bool {
        bytes <= self.max_storage_binding
    }
}
