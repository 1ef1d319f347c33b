//! glTF Buffer Layout CLI
//!
//! Pack JSON scene descriptions into glTF files and inspect their layout.

use clap::{Parser, Subcommand, ValueEnum};
use gltf_buffer_layout::{
    export_glb, export_gltf, layout_scene, load_scene, BufferMode, CollectionConfig,
    LayoutStructure,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gltf-buffer-layout")]
#[command(author, version, about = "Lay out typed arrays into glTF buffers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a JSON scene description into a glTF file
    Pack {
        /// Input JSON scene description
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "glb")]
        format: OutputFormat,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print the buffer layout of a JSON scene description
    Layout {
        /// Input JSON scene description
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(clap::Args)]
struct LayoutArgs {
    /// Give every vertex attribute its own buffer view
    #[arg(long)]
    no_interleave: bool,

    /// One buffer per mesh instead of a single buffer (glTF output only)
    #[arg(long)]
    per_mesh: bool,

    /// Base name of the generated buffer files
    #[arg(long)]
    base_name: Option<String>,
}

impl LayoutArgs {
    fn config(&self, default_name: &str) -> CollectionConfig {
        let mode = if self.per_mesh {
            BufferMode::PerMesh
        } else {
            BufferMode::Single
        };
        CollectionConfig::default()
            .with_interleaving(!self.no_interleave)
            .with_buffer_mode(mode)
            .with_base_name(self.base_name.as_deref().unwrap_or(default_name))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Binary glTF format
    Glb,
    /// glTF JSON with external .bin buffers
    Gltf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            input,
            output,
            format,
            layout,
        } => {
            pack(&input, &output, format, &layout)?;
        }
        Commands::Layout { input, layout } => {
            show_layout(&input, &layout)?;
        }
    }

    Ok(())
}

fn pack(
    input_path: &PathBuf,
    output_path: &PathBuf,
    format: OutputFormat,
    args: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading scene from {:?}...", input_path);
    let scene = load_scene(input_path)?;
    println!(
        "  Loaded {} arrays, {} meshes, {} nodes",
        scene.data_count(),
        scene.meshes().len(),
        scene.nodes().len()
    );

    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene")
        .to_string();
    let config = args.config(&stem);

    match format {
        OutputFormat::Glb => {
            if args.per_mesh {
                println!("  GLB holds a single buffer, ignoring --per-mesh");
            }
            let glb_path = if output_path.extension().is_some() {
                output_path.clone()
            } else {
                output_path.with_extension("glb")
            };
            let glb_data = export_glb(&scene, &config)?;
            fs::write(&glb_path, &glb_data)?;
            println!("Exported GLB ({} bytes) to {:?}", glb_data.len(), glb_path);
        }
        OutputFormat::Gltf => {
            let dir = output_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let export = export_gltf(&scene, &config)?;
            let gltf_path = export.write_to(&dir)?;
            println!("Exported glTF to {:?}", gltf_path);
            for (uri, bytes) in &export.buffers {
                println!("  Buffer: {} ({} bytes)", uri, bytes.len());
            }
        }
    }

    Ok(())
}

fn show_layout(input_path: &PathBuf, args: &LayoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading scene from {:?}...", input_path);
    let scene = load_scene(input_path)?;

    let config = args.config("scene");
    let (layout, _) = layout_scene(&scene, &config)?;

    print_layout(&layout);
    Ok(())
}

fn print_layout(layout: &LayoutStructure) {
    println!("\nLayout:");
    println!("  Accessors: {}", layout.accessors().len());
    println!("  Buffer views: {}", layout.buffer_views().len());
    println!("  Buffers: {} ({} bytes)", layout.buffers().len(), layout.total_byte_length());

    for buffer in layout.buffers() {
        println!(
            "\nBuffer {} {} ({} bytes)",
            buffer.id().index(),
            buffer.uri().unwrap_or("<embedded>"),
            buffer.byte_length()
        );
        for &view_id in buffer.buffer_views() {
            let Some(view) = layout.buffer_view(view_id) else {
                continue;
            };
            let stride = view
                .byte_stride()
                .map(|s| format!(", stride {}", s))
                .unwrap_or_default();
            println!(
                "  View {} {:?}: offset {}, length {}{}",
                view_id.index(),
                view.target(),
                view.byte_offset(),
                view.byte_length(),
                stride
            );
            for &accessor_id in view.accessors() {
                let Some(accessor) = layout.accessor(accessor_id) else {
                    continue;
                };
                println!(
                    "    Accessor {}: {:?} {:?} x {}, offset {}, stride {}",
                    accessor_id.index(),
                    accessor.component_type(),
                    accessor.shape(),
                    accessor.count(),
                    accessor.byte_offset(),
                    accessor.byte_stride()
                );
            }
        }
    }

    if layout.diagnostics().is_empty() {
        println!("\nNo alignment problems found");
    } else {
        println!("\nDiagnostics:");
        for diagnostic in layout.diagnostics() {
            println!("  - {}", diagnostic);
        }
    }
}
