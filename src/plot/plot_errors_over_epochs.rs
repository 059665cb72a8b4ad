use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Log-scale line chart of per-epoch training error.
pub fn plot_errors_over_epochs<P: AsRef<Path>>(
    errors: &[f64],
    filename: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let filename = filename.as_ref();
    if errors.is_empty() {
        return Err("no epochs to plot".into());
    }
    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let epochs = errors.len() + 1;

    // a converged epoch can report exactly zero
    let log_errors: Vec<f64> = errors.iter().map(|&e| e.max(1e-10).log10()).collect();

    let y_min = log_errors
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min)
        .floor();
    let y_max = log_errors
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .max(y_min + 1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Training Error over Epochs (Log Scale)", ("sans-serif", 30).into_font())
        .margin(5)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0..epochs, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("Summed |error| (Log Scale)")
        .y_label_formatter(&|y| format!("1e{:.0}", y))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            log_errors.iter().enumerate().map(|(i, &log_error)| (i + 1, log_error)),
            &BLUE,
        ))?
        .label("Training Error")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    // Draw the legend
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!(path = %filename.display(), "error plot saved");

    Ok(())
}
