//! Plot out some LFO waveforms
//!
//! Look in /images/ for the resulting plot.
//!
//! Requires plotters lib: https://docs.rs/plotters/latest/plotters/. Tested on an Ubuntu machine.

use plotters::prelude::*;
use sid_engine::{
    modulation::ModSource,
    patch::{LfoPatch, LfoWaveform},
    Engine, EngineConfig, Patch, RealtimeInbox,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    let sample_rate = config.tick_rate_hz as u32;

    // plot 1 second
    let num_points = sample_rate;

    let root = BitMapBackend::new("images/lfo_example_plot_0.png", (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("LFO Waveshapes", ("sans-serif", 40))?;

    let sub_areas = root.split_evenly((2, 2));

    // the positive variants left out because they are just shifted copies of these
    let details = [
        (LfoWaveform::Sine, "Sine"),
        (LfoWaveform::Triangle, "Triangle"),
        (LfoWaveform::Saw, "Saw"),
        (LfoWaveform::Random, "Random"),
    ];

    for ((waveform, name), area) in details.into_iter().zip(sub_areas.iter()) {
        let mut engine = Engine::new(config)?;
        let inbox = RealtimeInbox::new();

        let mut patch = Patch::default();
        patch.lfos[0] = LfoPatch {
            enabled: true,
            waveform,
            rate: 0xa0,
            depth: 0xff,
            ..Default::default()
        };

        let mut chart = ChartBuilder::on(area)
            .caption(name, ("sans-serif", 15).into_font())
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d(0f32..1f32, -1.25f32..1.25f32)?;

        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Amplitude")
            .draw()?;

        // plot out the LFO output in red
        chart.draw_series(LineSeries::new(
            (1..num_points).map(|x| {
                engine.tick(&patch, &inbox, &mut ());
                let y = engine.bus().source(ModSource::Lfo(0)) as f32 / i16::MAX as f32;

                (x as f32 / num_points as f32, y)
            }),
            RED,
        ))?;
    }

    root.present()?;

    Ok(())
}
