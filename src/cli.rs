use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::galaxy::Galaxy;
use crate::gpu::renderer::Renderer;
use crate::params::GalaxyParameters;
use crate::visualiser::VisualiserState;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive viewer (default)
    View {
        /// JSON preset with galaxy parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// Window width
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Window height
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
    /// Render frames of the rotating galaxy to disk
    Render {
        /// Output directory for frames
        #[arg(long)]
        out: PathBuf,

        /// JSON preset with galaxy parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// Number of frames to render
        #[arg(long, default_value_t = 120)]
        frames: usize,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Output width
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Output height
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Write the generated point cloud as JSON
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,

        /// JSON preset with galaxy parameters
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Write the default parameters as a JSON preset
    Preset {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

fn load_params(path: Option<&Path>) -> Result<GalaxyParameters> {
    match path {
        Some(path) => GalaxyParameters::load(path),
        None => Ok(GalaxyParameters::default()),
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => crate::app::run(GalaxyParameters::default(), 1280, 720)?,
        Some(Commands::View { params, width, height }) => {
            crate::app::run(load_params(params.as_deref())?, width, height)?;
        }
        Some(Commands::Render { out, params, frames, fps, width, height }) => {
            let params = load_params(params.as_deref())?;
            pollster::block_on(render_offline(params, out, frames, fps, width, height))?;
        }
        Some(Commands::Export { out, params }) => {
            export_point_cloud(&load_params(params.as_deref())?, &out)?;
        }
        Some(Commands::Preset { out }) => {
            GalaxyParameters::default().save(&out)?;
            println!("Wrote default preset to {:?}", out);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PointCloudExport<'a> {
    params: &'a GalaxyParameters,
    positions: &'a [[f32; 3]],
    colors: &'a [[f32; 3]],
    scales: &'a [f32],
}

pub fn export_point_cloud(params: &GalaxyParameters, out: &Path) -> Result<()> {
    let galaxy = Galaxy::new(params.clone());
    let export = PointCloudExport {
        params,
        positions: &galaxy.geometry.positions,
        colors: &galaxy.geometry.colors,
        scales: &galaxy.geometry.scales,
    };
    let file = std::fs::File::create(out).with_context(|| format!("Failed to create {:?}", out))?;
    serde_json::to_writer(std::io::BufWriter::new(file), &export)?;
    println!("Exported {} particles to {:?}", galaxy.len(), out);
    Ok(())
}

async fn render_offline(
    params: GalaxyParameters,
    out_dir: PathBuf,
    total_frames: usize,
    fps: f32,
    width: u32,
    height: u32,
) -> Result<()> {
    if fps <= 0.0 {
        return Err(anyhow!("fps must be positive, got {}", fps));
    }
    if width == 0 || height == 0 {
        return Err(anyhow!("Output size must be non-zero, got {}x{}", width, height));
    }
    let dt = 1.0 / fps;

    std::fs::create_dir_all(&out_dir)?;

    // WGPU Init
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None, // Headless
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| anyhow!("No adapter found"))?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await?;

    let texture_desc = wgpu::TextureDescriptor {
        label: Some("Target Texture"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        // Linear output, matching the viewer's non-sRGB surface
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    };

    let texture = device.create_texture(&texture_desc);
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    // Buffer for reading back data
    let u32_size = std::mem::size_of::<u32>() as u32;
    let unpadded_bytes_per_row = u32_size * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row_padding = (align - unpadded_bytes_per_row % align) % align;
    let padded_bytes_per_row = unpadded_bytes_per_row + padded_bytes_per_row_padding;

    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Output Buffer"),
        size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut renderer = Renderer::new(device, queue, texture_desc.format, width, height);
    let mut state = VisualiserState::new(params);
    state.camera.set_viewport(width, height);

    let galaxy = Galaxy::new(state.params.clone());
    renderer.set_galaxy(&galaxy.geometry);
    state.take_regenerate();
    log::info!("Generated {} particles for offline render", galaxy.len());

    println!("Rendering {} frames to {:?}...", total_frames, out_dir);

    for i in 0..total_frames {
        state.update(dt);

        renderer.render(&texture_view, &state);

        let mut encoder = renderer
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &output_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            texture_desc.size,
        );

        renderer.queue().submit(Some(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
            let _ = tx.send(v);
        });
        renderer.device().poll(wgpu::Maintain::Wait);
        rx.recv()
            .context("Readback channel closed")?
            .context("Failed to map output buffer")?;

        let data = buffer_slice.get_mapped_range();

        let mut unpadded_data = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            let end = start + unpadded_bytes_per_row as usize;
            unpadded_data.extend_from_slice(&data[start..end]);
        }

        let frame_path = out_dir.join(format!("frame_{:05}.png", i));
        image::save_buffer(&frame_path, &unpadded_data, width, height, image::ColorType::Rgba8)?;

        drop(data);
        output_buffer.unmap();

        if i % 60 == 0 {
            print!(".");
            std::io::stdout().flush()?;
        }
    }
    println!("\nDone.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from(["galaxy", "render", "--out", "frames", "--frames", "10"]).unwrap();
        match cli.command {
            Some(Commands::Render { out, frames, fps, .. }) => {
                assert_eq!(out, PathBuf::from("frames"));
                assert_eq!(frames, 10);
                assert_eq!(fps, 60.0);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_defaults_to_viewer() {
        let cli = Cli::try_parse_from(["galaxy"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_export_writes_all_particles() {
        let out = std::env::temp_dir().join(format!("galaxy_export_{}.json", std::process::id()));
        let params = GalaxyParameters {
            count: 1_000,
            seed: Some(1),
            ..Default::default()
        };
        export_point_cloud(&params, &out).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["positions"].as_array().unwrap().len(), 1_000);
        assert_eq!(json["scales"].as_array().unwrap().len(), 1_000);
        assert_eq!(json["params"]["inside_color"], "#ff6030");
        let _ = std::fs::remove_file(out);
    }
}
