use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ssi::sim::{generate_shock, rms};
use ssi::{
    estimate_structural_response, AnalysisConfig, ResponseMatrixEngine, SeverityDecomposition,
    StructuralResponse,
};

#[derive(Debug, Parser)]
#[command(name = "ssi_report")]
#[command(about = "Shock response spectrum and shock severity infimum of a synthetic shock")]
struct Cli {
    /// TOML analysis configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the noise seed of the configured shock
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct SsiSummary {
    order: usize,
    retained_energy: f64,
    mean_margin_db: f64,
    maximax: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct StructuralSummary {
    signed_peak: f64,
    unsigned_peak: f64,
    srs_bound: f64,
    ssi_bound: f64,
}

impl From<&StructuralResponse> for StructuralSummary {
    fn from(r: &StructuralResponse) -> Self {
        Self {
            signed_peak: r.signed_peak,
            unsigned_peak: r.unsigned_peak,
            srs_bound: r.srs_bound,
            ssi_bound: r.ssi_bound,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    samples: usize,
    sample_rate: f64,
    input_peak: f64,
    input_rms: f64,
    frequencies: Vec<f64>,
    srs: Vec<f64>,
    t_peak: Vec<f64>,
    singular_values: Vec<f64>,
    cost_fraction: f64,
    ssi: Vec<SsiSummary>,
    structure: Option<StructuralSummary>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ssi=info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.shock.seed = seed;
    }
    config.validate().context("invalid analysis configuration")?;

    let report = run(&config)?;
    if cli.json {
        let payload = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{payload}");
    } else {
        print_table(&report);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    AnalysisConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn run(config: &AnalysisConfig) -> Result<Report> {
    let signal = generate_shock(&config.shock).context("failed to generate shock")?;
    info!(samples = signal.len(), sample_rate = signal.sample_rate(), "shock generated");

    let matrix = ResponseMatrixEngine::new(config.srs_params())
        .with_backend(config.backend)
        .compute(&signal)
        .context("failed to compute shock response matrix")?;
    let decomposition =
        SeverityDecomposition::new(&matrix).context("failed to decompose response matrix")?;
    info!(
        oscillators = matrix.n_frequencies(),
        cost_fraction = decomposition.cost_fraction(),
        "response matrix decomposed"
    );

    let mut ssi = Vec::with_capacity(config.ranks.len());
    for &order in &config.ranks {
        if order > decomposition.rank() {
            bail!(
                "requested SSI order {order} exceeds the available rank {}",
                decomposition.rank()
            );
        }
        let ranks: Vec<usize> = (1..=order).collect();
        let result = decomposition.ssi(&ranks)?;
        info!(order, mean_margin_db = result.margin.mean, "SSI computed");
        ssi.push(SsiSummary {
            order,
            retained_energy: result.retained_energy,
            mean_margin_db: result.margin.mean,
            maximax: result.matrix.maximax().to_vec(),
        });
    }

    let structure = match config.modal_info()? {
        Some(modes) => {
            let response = estimate_structural_response(&matrix, &modes, config.extrapolation)
                .context("failed to estimate structural response")?;
            Some(StructuralSummary::from(&response))
        }
        None => None,
    };

    let (input_peak, _) = signal.peak();
    Ok(Report {
        samples: signal.len(),
        sample_rate: signal.sample_rate(),
        input_peak,
        input_rms: rms(signal.values()),
        frequencies: matrix.frequencies().to_vec(),
        srs: matrix.maximax().to_vec(),
        t_peak: matrix.t_peak().to_vec(),
        singular_values: decomposition.singular_values().to_vec(),
        cost_fraction: decomposition.cost_fraction(),
        ssi,
        structure,
    })
}

fn print_table(report: &Report) {
    println!("SHOCK SEVERITY REPORT");
    println!("=====================");
    println!("  Samples:      {}", report.samples);
    println!("  Sample rate:  {:.1} Hz", report.sample_rate);
    println!("  Input peak:   {:.4}", report.input_peak);
    println!("  Input RMS:    {:.4}", report.input_rms);
    println!("  Cost fraction (energy outside first mode): {:.6}", report.cost_fraction);

    print!("\n{:>12} {:>12} {:>10}", "f [Hz]", "SRS", "t_peak");
    for s in &report.ssi {
        print!(" {:>12}", format!("SSI{}", s.order));
    }
    println!();
    for (j, f) in report.frequencies.iter().enumerate() {
        print!("{:>12.3} {:>12.4} {:>10.5}", f, report.srs[j], report.t_peak[j]);
        for s in &report.ssi {
            print!(" {:>12.4}", s.maximax[j]);
        }
        println!();
    }

    println!("\nMean margin (SRS over SSI):");
    for s in &report.ssi {
        println!(
            "  order {:>3}: {:>8.3} dB  (retained energy {:.4})",
            s.order, s.mean_margin_db, s.retained_energy
        );
    }

    if let Some(st) = &report.structure {
        println!("\nStructural response estimate:");
        println!("  Signed combination peak:    {:.4}", st.signed_peak);
        println!("  Absolute combination peak:  {:.4}", st.unsigned_peak);
        println!("  SRS-based bound:            {:.4}", st.srs_bound);
        println!("  SSI rank-1 bound:           {:.4}", st.ssi_bound);
    }
}
