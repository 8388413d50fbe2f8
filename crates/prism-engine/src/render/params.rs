//! Per-frame shader parameters (elapsed time, viewport resolution).
//!
//! [`UniformValues`] is the CPU-side source of truth. [`ParameterStore`] mirrors
//! it into a ring of GPU uniform buffers, one set per frame in flight, so the
//! CPU never rewrites a buffer the GPU may still be reading.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::ring::FrameRing;

/// Size of every uniform buffer; WGSL uniform blocks are 16-byte aligned.
pub const UNIFORM_SIZE: u64 = 16;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TimeUniform {
    pub time: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ResolutionUniform {
    pub resolution: [f32; 2],
    pub _pad: [f32; 2],
}

/// Proof that the time uniform was allocated.
#[derive(Debug, Copy, Clone)]
pub struct TimeHandle(());

/// Proof that the resolution uniform was allocated.
#[derive(Debug, Copy, Clone)]
pub struct ResolutionHandle(());

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct UniformValues {
    time: Option<TimeUniform>,
    resolution: Option<ResolutionUniform>,
}

/// Which uniforms differ between two snapshots.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct UniformDiff {
    pub time: bool,
    pub resolution: bool,
}

impl UniformValues {
    pub fn create_time_uniform(&mut self) -> TimeHandle {
        self.time.get_or_insert_with(TimeUniform::default);
        TimeHandle(())
    }

    pub fn create_resolution_uniform(&mut self) -> ResolutionHandle {
        self.resolution.get_or_insert_with(ResolutionUniform::default);
        ResolutionHandle(())
    }

    /// Overwrites the time value in place.
    pub fn update_time(&mut self, _: TimeHandle, elapsed_seconds: f32) {
        self.time = Some(TimeUniform {
            time: elapsed_seconds,
            _pad: [0.0; 3],
        });
    }

    /// Overwrites the resolution value in place.
    pub fn update_resolution(&mut self, _: ResolutionHandle, width: f32, height: f32) {
        self.resolution = Some(ResolutionUniform {
            resolution: [width, height],
            _pad: [0.0; 2],
        });
    }

    /// Resize handler: forwards to the resolution uniform, or does nothing if it
    /// was never allocated. Returns whether anything was written.
    pub fn on_resize(&mut self, width: f32, height: f32) -> bool {
        let Some(r) = self.resolution.as_mut() else { return false };
        r.resolution = [width, height];
        true
    }

    pub fn time(&self) -> Option<f32> {
        self.time.map(|t| t.time)
    }

    pub fn resolution(&self) -> Option<[f32; 2]> {
        self.resolution.map(|r| r.resolution)
    }

    pub fn time_bytes(&self) -> Option<&[u8]> {
        self.time.as_ref().map(bytemuck::bytes_of)
    }

    pub fn resolution_bytes(&self) -> Option<&[u8]> {
        self.resolution.as_ref().map(bytemuck::bytes_of)
    }

    /// Uniforms whose bytes differ from `written`.
    pub fn diff(&self, written: &UniformValues) -> UniformDiff {
        UniformDiff {
            time: self.time_bytes() != written.time_bytes(),
            resolution: self.resolution_bytes() != written.resolution_bytes(),
        }
    }
}

/// One frame's worth of GPU uniform buffers.
struct UniformSlot {
    time: wgpu::Buffer,
    resolution: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// What the buffers currently hold.
    written: UniformValues,
}

/// GPU-visible uniforms, bound as `@group(1)`: time at binding 0, resolution
/// at binding 1.
pub struct ParameterStore {
    values: UniformValues,
    time: TimeHandle,
    ring: FrameRing<UniformSlot>,
}

impl ParameterStore {
    /// Bind group layout shared by both pipeline variants.
    pub fn create_layout(
        device: &wgpu::Device,
        visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayout {
        let entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism params bgl"),
            entries: &[entry(0), entry(1)],
        })
    }

    /// Allocates `frames_in_flight` uniform sets once. Buffers are never
    /// reallocated afterwards.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        frames_in_flight: usize,
        width: u32,
        height: u32,
    ) -> Self {
        let mut values = UniformValues::default();
        let time = values.create_time_uniform();
        let resolution = values.create_resolution_uniform();
        values.update_resolution(resolution, width as f32, height as f32);

        let ring = FrameRing::from_fn(frames_in_flight, |i| {
            let buffer = |name: &str, contents: &[u8]| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("prism {name} ubo #{i}")),
                    contents,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
            };
            let time_buf = buffer("time", values.time_bytes().unwrap_or(&[0u8; 16]));
            let res_buf = buffer("resolution", values.resolution_bytes().unwrap_or(&[0u8; 16]));

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("prism params bind group #{i}")),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: time_buf.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: res_buf.as_entire_binding(),
                    },
                ],
            });

            UniformSlot {
                time: time_buf,
                resolution: res_buf,
                bind_group,
                written: values,
            }
        });

        log::debug!("parameter store: {} uniform set(s)", ring.len());

        Self {
            values,
            time,
            ring,
        }
    }

    pub fn values(&self) -> &UniformValues {
        &self.values
    }

    pub fn update_time(&mut self, elapsed_seconds: f32) {
        self.values.update_time(self.time, elapsed_seconds);
    }

    /// Resize handler; last write wins until the next flush.
    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.values.on_resize(width, height);
    }

    /// Claims the uniform set for the next frame, if one is free.
    pub fn begin_frame(&mut self) -> Option<usize> {
        self.ring.acquire()
    }

    /// Gives back a slot whose frame was dropped before submission.
    pub fn abandon(&mut self, slot: usize) {
        self.ring.abandon(slot);
    }

    /// Writes changed values into `slot`'s buffers. Must run before the frame's
    /// commands are submitted.
    pub fn flush(&mut self, queue: &wgpu::Queue, slot: usize) {
        let values = self.values;
        let s = self.ring.get_mut(slot);
        let diff = values.diff(&s.written);

        if diff.time {
            if let Some(bytes) = values.time_bytes() {
                queue.write_buffer(&s.time, 0, bytes);
            }
        }
        if diff.resolution {
            if let Some(bytes) = values.resolution_bytes() {
                queue.write_buffer(&s.resolution, 0, bytes);
            }
        }

        s.written = values;
    }

    pub fn bind_group(&self, slot: usize) -> &wgpu::BindGroup {
        &self.ring.get(slot).bind_group
    }

    /// Keeps `slot` in flight until the queue finishes everything submitted so far.
    pub fn retire(&self, queue: &wgpu::Queue, slot: usize) {
        let release = self.ring.release_handle(slot);
        queue.on_submitted_work_done(move || release.signal());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<TimeUniform>() as u64, UNIFORM_SIZE);
        assert_eq!(std::mem::size_of::<ResolutionUniform>() as u64, UNIFORM_SIZE);
    }

    #[test]
    fn time_uniform_starts_at_zero() {
        let mut v = UniformValues::default();
        assert_eq!(v.time(), None);
        v.create_time_uniform();
        assert_eq!(v.time(), Some(0.0));
    }

    #[test]
    fn update_time_overwrites_in_place() {
        let mut v = UniformValues::default();
        let h = v.create_time_uniform();
        v.update_time(h, 1.25);
        v.update_time(h, 2.5);
        assert_eq!(v.time(), Some(2.5));
        let expected = TimeUniform {
            time: 2.5,
            _pad: [0.0; 3],
        };
        assert_eq!(v.time_bytes().unwrap(), bytemuck::bytes_of(&expected));
    }

    #[test]
    fn resize_is_last_write_wins() {
        let mut v = UniformValues::default();
        v.create_resolution_uniform();

        assert!(v.on_resize(640.0, 480.0));
        assert!(v.on_resize(1280.0, 720.0));
        assert!(v.on_resize(1920.0, 1080.0));

        assert_eq!(v.resolution(), Some([1920.0, 1080.0]));
    }

    #[test]
    fn resize_without_resolution_uniform_is_noop() {
        let mut v = UniformValues::default();
        v.create_time_uniform();
        let before = v;

        assert!(!v.on_resize(800.0, 600.0));
        assert_eq!(v, before);
        assert_eq!(v.resolution(), None);
    }

    #[test]
    fn frames_without_resize_leave_resolution_bytes_unchanged() {
        let mut v = UniformValues::default();
        let t = v.create_time_uniform();
        let r = v.create_resolution_uniform();
        v.update_resolution(r, 800.0, 600.0);

        // Frame 1 flushes everything.
        let mut written = UniformValues::default();
        v.update_time(t, 0.016);
        assert_eq!(v.diff(&written), UniformDiff { time: true, resolution: true });
        written = v;
        let res_after_first = written.resolution_bytes().unwrap().to_vec();

        // Frame 2: time advances, no resize.
        v.update_time(t, 0.033);
        assert_eq!(v.diff(&written), UniformDiff { time: true, resolution: false });
        written = v;

        assert_eq!(written.resolution_bytes().unwrap(), res_after_first.as_slice());
    }

    #[test]
    fn resize_marks_only_resolution_dirty() {
        let mut v = UniformValues::default();
        v.create_time_uniform();
        v.create_resolution_uniform();
        let written = v;

        v.on_resize(1024.0, 768.0);
        assert_eq!(v.diff(&written), UniformDiff { time: false, resolution: true });
    }
}
