//! Command-line and environment configuration for the viewer.
//!
//! ```text
//! prism-viewer compute <shader.wgsl> <kernel> <image>
//! prism-viewer toy [shader.wgsl] [vertex] [fragment] [image]
//! ```
//!
//! With no arguments the embedded toy shader runs. `PRISM_FRAMES_IN_FLIGHT`
//! and `PRISM_PRESENT_MODE` (fifo | mailbox | immediate) tune the renderer;
//! `PRISM_LOG` overrides the log filter.

use anyhow::{Result, anyhow, bail};

use prism_engine::device::GpuInit;
use prism_engine::render::{RendererConfig, ShaderSource};

pub const TOY_WGSL: &str = include_str!("../shaders/toy.wgsl");

const USAGE: &str = "usage: prism-viewer compute <shader> <kernel> <image>\n       \
                     prism-viewer toy [shader] [vertex] [fragment] [image]";

#[derive(Debug)]
pub struct ViewerConfig {
    pub renderer: RendererConfig,
    pub gpu: GpuInit,
    pub log_filter: Option<String>,
}

/// Builds the viewer configuration from positional arguments (program name
/// already stripped) and an environment lookup.
pub fn parse<I, F>(args: I, env: F) -> Result<ViewerConfig>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let mut args = args.into_iter();

    let mut renderer = match args.next().as_deref() {
        None | Some("toy") => {
            let shader = match args.next() {
                Some(path) => ShaderSource::Path(path.into()),
                None => ShaderSource::wgsl("toy.wgsl", TOY_WGSL),
            };
            let vertex = args.next().unwrap_or_else(|| "vs_main".to_string());
            let fragment = args.next().unwrap_or_else(|| "fs_main".to_string());
            let config = RendererConfig::rasterize(shader, vertex, fragment);
            match args.next() {
                Some(image) => config.with_input_image(image),
                None => config,
            }
        }
        Some("compute") => {
            let shader = args.next().ok_or_else(|| anyhow!("missing shader path\n{USAGE}"))?;
            let kernel = args.next().ok_or_else(|| anyhow!("missing kernel name\n{USAGE}"))?;
            let image = args.next().ok_or_else(|| anyhow!("missing input image\n{USAGE}"))?;
            RendererConfig::compute(ShaderSource::Path(shader.into()), kernel, image)
        }
        Some("-h" | "--help") => bail!("{USAGE}"),
        Some(other) => bail!("unknown mode `{other}`\n{USAGE}"),
    };

    if let Some(extra) = args.next() {
        bail!("unexpected argument `{extra}`\n{USAGE}");
    }

    if let Some(raw) = env("PRISM_FRAMES_IN_FLIGHT") {
        let frames = raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("PRISM_FRAMES_IN_FLIGHT must be an integer, got `{raw}`"))?;
        renderer = renderer.with_frames_in_flight(frames);
    }

    let mut gpu = renderer.mode.gpu_init();
    if let Some(raw) = env("PRISM_PRESENT_MODE") {
        gpu.present_mode = parse_present_mode(&raw)?;
    }

    Ok(ViewerConfig {
        renderer,
        gpu,
        log_filter: env("PRISM_LOG"),
    })
}

fn parse_present_mode(raw: &str) -> Result<wgpu::PresentMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "fifo" => Ok(wgpu::PresentMode::Fifo),
        "mailbox" => Ok(wgpu::PresentMode::Mailbox),
        "immediate" => Ok(wgpu::PresentMode::Immediate),
        "auto" => Ok(wgpu::PresentMode::AutoVsync),
        other => bail!("unknown present mode `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_engine::render::RenderMode;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn no_arguments_runs_embedded_toy() {
        let cfg = parse(args(&[]), no_env).unwrap();
        assert_eq!(
            cfg.renderer.mode,
            RenderMode::Rasterize {
                vertex: "vs_main".into(),
                fragment: "fs_main".into()
            }
        );
        assert!(matches!(cfg.renderer.shader, ShaderSource::Wgsl { .. }));
        assert!(cfg.renderer.input_image.is_none());
        assert_eq!(cfg.gpu.present_mode, wgpu::PresentMode::Fifo);
    }

    #[test]
    fn compute_requires_all_three_arguments() {
        assert!(parse(args(&["compute", "g.wgsl", "grayscale"]), no_env).is_err());

        let cfg = parse(args(&["compute", "g.wgsl", "grayscale", "in.png"]), no_env).unwrap();
        assert_eq!(
            cfg.renderer.mode,
            RenderMode::Compute {
                kernel: "grayscale".into()
            }
        );
        assert_eq!(cfg.renderer.input_image.as_deref(), Some(std::path::Path::new("in.png")));
        assert!(cfg.gpu.storage_output);
    }

    #[test]
    fn toy_accepts_custom_entry_points_and_image() {
        let cfg = parse(args(&["toy", "t.wgsl", "v", "f", "img.jpg"]), no_env).unwrap();
        assert_eq!(
            cfg.renderer.mode,
            RenderMode::Rasterize {
                vertex: "v".into(),
                fragment: "f".into()
            }
        );
        assert!(matches!(cfg.renderer.shader, ShaderSource::Path(_)));
        assert!(cfg.renderer.input_image.is_some());
    }

    #[test]
    fn rejects_unknown_mode_and_trailing_arguments() {
        assert!(parse(args(&["raytrace"]), no_env).is_err());
        assert!(parse(args(&["toy", "t.wgsl", "v", "f", "i.png", "extra"]), no_env).is_err());
    }

    #[test]
    fn environment_tunes_renderer() {
        let env = |key: &str| match key {
            "PRISM_FRAMES_IN_FLIGHT" => Some("3".to_string()),
            "PRISM_PRESENT_MODE" => Some("Mailbox".to_string()),
            "PRISM_LOG" => Some("debug".to_string()),
            _ => None,
        };
        let cfg = parse(args(&["toy"]), env).unwrap();
        assert_eq!(cfg.renderer.frames_in_flight, 3);
        assert_eq!(cfg.gpu.present_mode, wgpu::PresentMode::Mailbox);
        assert_eq!(cfg.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn bad_frame_count_is_an_error() {
        let env = |key: &str| (key == "PRISM_FRAMES_IN_FLIGHT").then(|| "two".to_string());
        assert!(parse(args(&["toy"]), env).is_err());
    }

    #[test]
    fn embedded_toy_shader_validates() {
        let lib = prism_engine::render::ShaderLibrary::from_wgsl("toy.wgsl", TOY_WGSL).unwrap();
        let names: Vec<_> = lib.entry_point_names().collect();
        assert!(names.contains(&"vs_main"));
        assert!(names.contains(&"fs_main"));
    }

    #[test]
    fn grayscale_kernel_declares_16x16_workgroup() {
        let code = include_str!("../shaders/grayscale.wgsl");
        let lib = prism_engine::render::ShaderLibrary::from_wgsl("grayscale.wgsl", code).unwrap();
        let kernel = lib
            .entry("grayscale", prism_engine::render::EntryStage::Compute)
            .unwrap();
        assert_eq!(kernel.workgroup_size(), prism_engine::render::WorkgroupSize::new(16, 16));
    }
}
