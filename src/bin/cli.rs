use clap::Parser;
use countrygen::{GenerationParams, generate_with};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Генератор вымышленной страны: берег, районы и регионы с равным населением
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сид генерации (перекрывает значение из конфигурации)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Желаемое количество районов
    #[arg(short, long)]
    districts: Option<usize>,

    /// Количество регионов
    #[arg(short, long)]
    regions: Option<usize>,

    /// Количество внутренних точек триангуляции
    #[arg(short, long)]
    points: Option<usize>,

    /// Путь для сохранения страны в JSON (по умолчанию: ./country.json)
    #[arg(short, long, default_value = "country.json")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации из {path:?}...");
            GenerationParams::from_toml_file(path)?
        }
        None => GenerationParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if let Some(districts) = cli.districts {
        params.district_count = districts;
    }
    if let Some(regions) = cli.regions {
        params.region_count = regions;
    }
    if let Some(points) = cli.points {
        params.internal_points = points;
    }

    println!(
        "🗺️  Генерация страны (сид {}, районов: {}, регионов: {})...",
        params.seed, params.district_count, params.region_count
    );
    let country = generate_with(&params)?;

    println!(
        "🏘️  Районов: {}, удалено осколков: {} (площадь {:.1})",
        country.districts.len(),
        country.report.merge.deleted,
        country.report.merge.deleted_area
    );
    println!(
        "👥 Население: {}, проходов выравнивания: {}",
        country.total_population(),
        country.report.equalization.passes
    );
    for region in &country.regions {
        println!(
            "   {}: {} районов, население {}",
            region.name,
            region.len(),
            region.population()
        );
    }

    println!("💾 Сохранение в {:?}", cli.output);
    let writer = BufWriter::new(File::create(&cli.output)?);
    serde_json::to_writer_pretty(writer, &country)?;

    println!("\n✅ Готово!");
    Ok(())
}
