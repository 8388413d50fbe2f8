//! Compiled shader library: one WGSL module whose entry points are resolved by
//! name once, at construction.

use std::fmt;
use std::path::{Path, PathBuf};

use super::diagnostics::Diagnostics;
use super::dispatch::WorkgroupSize;
use crate::error::RendererError;

/// Where the WGSL library comes from.
#[derive(Debug, Clone)]
pub enum ShaderSource {
    Path(PathBuf),
    Wgsl { label: String, code: String },
}

impl ShaderSource {
    pub fn wgsl(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Wgsl {
            label: label.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryStage {
    Vertex,
    Fragment,
    Compute,
}

impl EntryStage {
    fn matches(self, stage: naga::ShaderStage) -> bool {
        matches!(
            (self, stage),
            (Self::Vertex, naga::ShaderStage::Vertex)
                | (Self::Fragment, naga::ShaderStage::Fragment)
                | (Self::Compute, naga::ShaderStage::Compute)
        )
    }
}

impl fmt::Display for EntryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        })
    }
}

/// A resolved entry point. Only obtainable through [`ShaderLibrary::entry`],
/// so holding one proves the name exists with the right stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    name: String,
    stage: EntryStage,
    workgroup_size: [u32; 3],
}

impl EntryPoint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> EntryStage {
        self.stage
    }

    /// Declared `@workgroup_size` (compute entry points only; `[0; 3]` otherwise).
    pub fn workgroup_size(&self) -> WorkgroupSize {
        WorkgroupSize::new(self.workgroup_size[0], self.workgroup_size[1])
    }
}

/// Parsed and validated WGSL module.
#[derive(Debug)]
pub struct ShaderLibrary {
    label: String,
    code: String,
    module: naga::Module,
}

impl ShaderLibrary {
    /// Loads a library from disk or from inline source.
    pub fn load(source: &ShaderSource) -> Result<Self, RendererError> {
        match source {
            ShaderSource::Path(path) => Self::from_path(path),
            ShaderSource::Wgsl { label, code } => Self::from_wgsl(label, code),
        }
    }

    // TODO: watch `path` and rebuild pipelines on change (shader hot-reload).
    pub fn from_path(path: &Path) -> Result<Self, RendererError> {
        let code = std::fs::read_to_string(path).map_err(|source| RendererError::ShaderSource {
            path: path.to_path_buf(),
            source,
        })?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_wgsl(&label, &code)
    }

    /// Parses and validates `code`. Front-end and validation failures become
    /// [`RendererError::PipelineCompilation`] with line-addressable diagnostics.
    pub fn from_wgsl(label: &str, code: &str) -> Result<Self, RendererError> {
        let module = naga::front::wgsl::parse_str(code).map_err(|e| {
            RendererError::PipelineCompilation(Diagnostics::from_parse_error(label, code, &e))
        })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator.validate(&module).map_err(|e| {
            RendererError::PipelineCompilation(Diagnostics::from_validation_error(label, code, &e))
        })?;

        log::debug!(
            "shader library `{label}` loaded: entry points [{}]",
            module
                .entry_points
                .iter()
                .map(|ep| ep.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            label: label.to_string(),
            code: code.to_string(),
            module,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entry_point_names(&self) -> impl Iterator<Item = &str> {
        self.module.entry_points.iter().map(|ep| ep.name.as_str())
    }

    /// Resolves `name` as an entry point of `stage`.
    pub fn entry(&self, name: &str, stage: EntryStage) -> Result<EntryPoint, RendererError> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == name && stage.matches(ep.stage))
            .map(|ep| EntryPoint {
                name: ep.name.clone(),
                stage,
                workgroup_size: ep.workgroup_size,
            })
            .ok_or_else(|| RendererError::ShaderFunctionNotFound {
                library: self.label.clone(),
                name: name.to_string(),
                stage,
            })
    }

    /// Creates the GPU-side module. Callers capture validation errors around it.
    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(self.code.as_str().into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB: &str = r#"
@group(0) @binding(1) var output: texture_storage_2d<rgba8unorm, write>;

@compute @workgroup_size(16, 16)
fn invert(@builtin(global_invocation_id) id: vec3<u32>) {
    textureStore(output, vec2<i32>(id.xy), vec4<f32>(1.0));
}

@vertex
fn vs(@location(0) p: vec4<f32>) -> @builtin(position) vec4<f32> {
    return p;
}

@fragment
fn fs() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    #[test]
    fn resolves_entry_points_by_name_and_stage() {
        let lib = ShaderLibrary::from_wgsl("lib", LIB).unwrap();

        let k = lib.entry("invert", EntryStage::Compute).unwrap();
        assert_eq!(k.name(), "invert");
        assert_eq!(k.workgroup_size(), WorkgroupSize::new(16, 16));

        assert!(lib.entry("vs", EntryStage::Vertex).is_ok());
        assert!(lib.entry("fs", EntryStage::Fragment).is_ok());
    }

    #[test]
    fn missing_name_is_shader_function_not_found() {
        let lib = ShaderLibrary::from_wgsl("lib", LIB).unwrap();
        let err = lib.entry("grayscaleKernel", EntryStage::Compute).unwrap_err();
        match err {
            RendererError::ShaderFunctionNotFound { name, stage, library } => {
                assert_eq!(name, "grayscaleKernel");
                assert_eq!(stage, EntryStage::Compute);
                assert_eq!(library, "lib");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stage_mismatch_is_not_found() {
        let lib = ShaderLibrary::from_wgsl("lib", LIB).unwrap();
        assert!(matches!(
            lib.entry("fs", EntryStage::Vertex),
            Err(RendererError::ShaderFunctionNotFound { .. })
        ));
    }

    #[test]
    fn syntax_error_is_pipeline_compilation() {
        let err = ShaderLibrary::from_wgsl("bad", "fn main( {").unwrap_err();
        let diags = err.diagnostics().expect("diagnostics");
        assert!(!diags.is_empty());
        assert_eq!(diags.items[0].source, "bad");
        assert_eq!(diags.items[0].line, Some(1));
    }

    #[test]
    fn validation_error_is_pipeline_compilation() {
        // Type mismatch: returning a scalar from a vec4 function.
        let code = "@fragment\nfn fs() -> @location(0) vec4<f32> {\n    return 1.0;\n}\n";
        let err = ShaderLibrary::from_wgsl("typed", code).unwrap_err();
        assert!(matches!(err, RendererError::PipelineCompilation(_)));
    }

    #[test]
    fn missing_file_is_shader_source_error() {
        let err = ShaderLibrary::from_path(Path::new("/nonexistent/prism/toy.wgsl")).unwrap_err();
        assert!(matches!(err, RendererError::ShaderSource { .. }));
    }
}
