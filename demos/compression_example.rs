use imagesvd::diagnostics::storage_ratio;
use imagesvd::metrics::peak_signal_to_noise_ratio;
use imagesvd::{Decomposer, EnergyConvention, PixelImage};
use ndarray::Array3;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Rank-Truncated SVD Image Compression ===\n");

    // Synthetic 48x64 color image: smooth gradients plus a bright square
    let (height, width) = (48, 64);
    let pixels = Array3::from_shape_fn((height, width, 3), |(i, j, c)| {
        let inside = (16..32).contains(&i) && (24..40).contains(&j);
        match (c, inside) {
            (_, true) => 240,
            (0, false) => (i * 255 / height) as u8,
            (1, false) => (j * 255 / width) as u8,
            _ => ((i + j) * 255 / (height + width)) as u8,
        }
    });
    let image = PixelImage::Color(pixels.clone());

    let decomposition = Decomposer::new().decompose(&image)?;
    println!(
        "Image shape {:?}, maximum rank {}\n",
        image.shape(),
        decomposition.max_rank()
    );

    println!(
        "{:<8} {:>12} {:>14} {:>16}",
        "Rank", "PSNR (dB)", "Storage ratio", "Red energy kept"
    );
    println!("{}", "-".repeat(54));

    for rank in [0, 1, 2, 4, 8, 16, decomposition.max_rank()] {
        let compressed = match decomposition.reconstruct(rank)? {
            PixelImage::Color(approx) => approx,
            PixelImage::Grayscale(_) => unreachable!("color input reconstructs as color"),
        };

        let psnr = peak_signal_to_noise_ratio(&pixels, &compressed)?;
        let reports = decomposition.spectrum(rank, EnergyConvention::Magnitude)?;
        let red_energy = reports[0].1.captured_energy;

        println!(
            "{:<8} {:>12.2} {:>14.3} {:>15.1}%",
            rank,
            psnr,
            storage_ratio(height, width, rank),
            red_energy * 100.0
        );
    }

    println!("\n=== Singular Values (log10) ===");
    for (channel, report) in decomposition.spectrum(4, EnergyConvention::Squared)? {
        let head: Vec<String> = report
            .log_spectrum()
            .iter()
            .take(5)
            .map(|(_, value)| format!("{:.2}", value))
            .collect();
        println!("{:<6} {}", channel, head.join("  "));
    }

    Ok(())
}
