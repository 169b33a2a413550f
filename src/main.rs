use clap::{Parser, Subcommand, ValueEnum};
use glyphspace::{
    read_dataset, ExtractionConfig, FontFeatureExtractor, FontSource, GlyphCache, Normalization,
    UfoFont,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glyphspace", about = "Glyph whitespace features for kerning models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract features for every glyph pair of a UFO font
    Extract {
        /// Input UFO directory
        font: PathBuf,

        /// Output dataset path
        output: PathBuf,

        /// Rays per glyph side
        #[arg(long, default_value = "32")]
        rays: usize,

        /// How ray distances are normalized
        #[arg(long, value_enum, default_value = "em")]
        normalize: NormalizeArg,

        /// Compute rows on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Print the header and leading rows of a dataset
    Inspect {
        /// Dataset path
        file: PathBuf,

        /// Rows to print
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NormalizeArg {
    /// Relative to the glyph's bounding-box width
    Width,
    /// Relative to the font's em
    Em,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            font,
            output,
            rays,
            normalize,
            sequential,
        } => {
            let config = ExtractionConfig {
                ray_count: rays,
                normalization: match normalize {
                    NormalizeArg::Width => Normalization::MaxDistance,
                    NormalizeArg::Em => Normalization::Em,
                },
                parallel: !sequential,
                ..ExtractionConfig::default()
            };

            let ufo = UfoFont::load(&font)?;
            eprintln!();
            eprintln!(
                "  glyphspace \u{00b7} {} \u{00b7} {} glyphs \u{00b7} {} upm",
                ufo.identity(),
                ufo.glyph_count(),
                ufo.units_per_em(),
            );
            eprintln!();

            let mut cache = GlyphCache::new();
            let mut extractor = FontFeatureExtractor::new(&ufo, &mut cache, config)?;
            let summary = extractor.write_dataset(&output)?;

            eprintln!(
                "  Pairs       {} \u{2192} {} rows \u{00d7} {} columns  ({}ms)",
                summary.pairs,
                summary.height,
                summary.width,
                summary.elapsed.as_millis(),
            );
            eprintln!();
            eprintln!("  \u{2713} {}", output.display());
        }

        Command::Inspect { file, limit } => {
            let dataset = read_dataset(&file, Some(limit))?;
            eprintln!();
            eprintln!(
                "  {} \u{00b7} {} rows declared \u{00b7} {} columns",
                file.display(),
                dataset.declared_height(),
                dataset.width(),
            );
            if dataset.is_truncated() {
                eprintln!("  truncated: only {} of {} requested rows present", dataset.len(), dataset.requested());
            }
            eprintln!();
            for (i, row) in dataset.rows().enumerate() {
                let Some((spacing, values)) = row.split_first() else {
                    continue;
                };
                let values: Vec<String> = values.iter().map(|v| format!("{:.3}", v)).collect();
                println!("{:>6}  {:+.4}  {}", i, spacing, values.join(" "));
            }
        }
    }

    Ok(())
}
