use std::mem;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::renderer::internal::RenderContext;
use crate::renderer::lights::{MAX_SPOT_SHADOWS, MAX_SUN_SHADOWS};
use crate::renderer::uniforms::CommonUniform;

/// Per-object record in the objects storage buffer, indexed by
/// `@builtin(instance_index)` in every pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct ObjectData {
    pub(crate) model: [[f32; 4]; 4],
    pub(crate) id: u32,
    pub(crate) _padding: [u32; 3],
}

impl ObjectData {
    pub(crate) fn new(model: Mat4, id: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            id,
            _padding: [0; 3],
        }
    }
}

/// The `COMMON_UNIFORMS` buffer plus a staging area for shadow passes.
///
/// Shadow views cannot go through `write_buffer` directly: writes all land
/// before the encoder runs, so the last one would win for every pass. Each
/// shadow view instead gets a slot in the staging buffer, and the encoder
/// copies the right slot into the uniform buffer just before its pass.
pub(crate) struct CommonBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    staging_buffer: wgpu::Buffer,
}

pub(crate) const SHADOW_VIEW_SLOTS: u64 = (MAX_SPOT_SHADOWS + MAX_SUN_SHADOWS) as u64;
/// Staging slot holding the camera view for the main pass. It is copied back
/// after the shadow passes so they can share the encoder.
pub(crate) const MAIN_VIEW_SLOT: u64 = SHADOW_VIEW_SLOTS;

impl CommonBuffer {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let uniform_size = mem::size_of::<CommonUniform>() as u64;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("CommonUniformBuffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("CommonStagingBuffer"),
            size: uniform_size * (SHADOW_VIEW_SLOTS + 1),
            usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("CommonBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(NonZeroU64::new(uniform_size).unwrap()),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CommonBindGroup"),
            layout: &bind_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_layout,
            staging_buffer,
        }
    }

    pub(crate) fn stage_slot(&self, queue: &wgpu::Queue, slot: u64, uniform: &CommonUniform) {
        debug_assert!(slot <= SHADOW_VIEW_SLOTS);
        let uniform_size = mem::size_of::<CommonUniform>() as u64;
        queue.write_buffer(
            &self.staging_buffer,
            slot * uniform_size,
            bytemuck::bytes_of(uniform),
        );
    }

    pub(crate) fn copy_slot(&self, encoder: &mut wgpu::CommandEncoder, slot: u64) {
        let uniform_size = mem::size_of::<CommonUniform>() as u64;
        encoder.copy_buffer_to_buffer(
            &self.staging_buffer,
            slot * uniform_size,
            &self.buffer,
            0,
            uniform_size,
        );
    }
}

pub(crate) struct DynamicObjectsBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) capacity: u32,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    pub(crate) scratch: Vec<ObjectData>,
}

impl DynamicObjectsBuffer {
    pub(crate) fn new(device: &wgpu::Device, capacity: u32) -> Self {
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ObjectsBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let buffer_size = (capacity as usize * mem::size_of::<ObjectData>()) as u64;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ObjectsBuffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ObjectsBindGroup"),
            layout: &bind_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            capacity,
            bind_group,
            bind_layout,
            scratch: Vec::with_capacity(capacity as usize),
        }
    }

    /// Uploads one `ObjectData` per scene object, in scene order. `id` is the
    /// 0-based scene index; passes that need other numbering derive it in the
    /// shader.
    pub(crate) fn update(&mut self, context: &RenderContext, models: &[Mat4]) {
        self.scratch.clear();
        for (index, model) in models.iter().enumerate() {
            self.scratch.push(ObjectData::new(*model, index as u32));
        }

        let required = self.scratch.len() as u32;
        if required > self.capacity {
            self.grow(context, required);
        }

        if !self.scratch.is_empty() {
            context
                .queue
                .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.scratch));
        }
    }

    fn grow(&mut self, context: &RenderContext, required: u32) {
        let new_capacity = required.max(self.capacity * 2).max(1);
        log::info!(
            "Growing objects buffer: {} -> {}",
            self.capacity,
            new_capacity
        );

        let buffer_size = (new_capacity as usize * mem::size_of::<ObjectData>()) as u64;
        self.buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ObjectsBuffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("ObjectsBindGroup"),
                layout: &self.bind_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.buffer.as_entire_binding(),
                }],
            });

        self.capacity = new_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_data_matches_the_shader_stride() {
        // mat4x4<f32> + u32 + 12 padding
        assert_eq!(mem::size_of::<ObjectData>(), 80);
    }
}
