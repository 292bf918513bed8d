//! Half-Sine Shock Example
//!
//! Computes the SRS of an 11 ms half-sine pulse and compares it with the
//! Shock Severity Infimum of increasing order.

use ssi::sim::{generate_shock, PulseShape, ShockConfig};
use ssi::{
    estimate_structural_response, ExtrapolationPolicy, FilterBackend, ModalInfo,
    ResponseMatrixEngine, SeverityDecomposition, SrsParams,
};

fn main() -> Result<(), ssi::SsiError> {
    println!("Running half-sine SRS / SSI example...\n");

    let config = ShockConfig {
        shape: PulseShape::HalfSine,
        sample_rate: 10_000.0,
        duration: 0.5,
        delay: 0.01,
        pulse_width: 0.011,
        amplitude: 100.0,
        sigma_noise: 0.0,
        seed: 42,
    };
    let params = SrsParams::new(10.0, 10.0);

    println!("Configuration:");
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Pulse width: {} s", config.pulse_width);
    println!("  Amplitude: {}", config.amplitude);
    println!("  Q: {} (zeta = {})", params.quality_factor, params.damping_ratio());
    println!();

    let signal = generate_shock(&config)?;
    let matrix = ResponseMatrixEngine::new(params)
        .with_backend(FilterBackend::Parallel)
        .compute(&signal)?;
    let decomposition = SeverityDecomposition::new(&matrix)?;

    let (peak, f_peak, t_peak) = matrix.peak();
    println!("SRS SUMMARY");
    println!("===========");
    println!("  Oscillators:  {}", matrix.n_frequencies());
    println!("  Peak SRS:     {:.3} at {:.1} Hz (t = {:.4} s)", peak, f_peak, t_peak);
    println!("  Cost fraction: {:.6}", decomposition.cost_fraction());

    println!("\nMean margin by SSI order:");
    for (k, margin) in decomposition.margin_sweep()?.iter().enumerate().take(8) {
        println!("  order {:>2}: {:>8.3} dB", k + 1, margin);
    }

    let modes = ModalInfo::from_rows(&[[85.0, 1.3, 0.9], [240.0, 0.6, -0.5], [610.0, 0.2, 0.3]])?;
    let response = estimate_structural_response(&matrix, &modes, ExtrapolationPolicy::Reject)?;
    println!("\nStructural response (3 modes):");
    println!("  Signed peak:    {:.3}", response.signed_peak);
    println!("  Absolute peak:  {:.3}", response.unsigned_peak);
    println!("  SRS bound:      {:.3}", response.srs_bound);
    println!("  SSI bound:      {:.3}", response.ssi_bound);

    println!("\nDone!");
    Ok(())
}
