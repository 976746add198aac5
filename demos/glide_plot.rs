//! Plot out a voice gliding between notes, once for each portamento mode
//!
//! Look in /images/ for the resulting plot.
//!
//! Requires plotters lib: https://docs.rs/plotters/latest/plotters/. Tested on an Ubuntu machine.

use plotters::prelude::*;
use sid_engine::{patch::PortaMode, Engine, EngineConfig, Patch, RealtimeInbox};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    let sample_rate = config.tick_rate_hz as usize;

    const NUM_SECS_TO_PLOT: usize = 4;
    let num_points = sample_rate * NUM_SECS_TO_PLOT;

    // the played note is stepped, the voice will glide between the steps
    let note_at = |i: usize| match i * 4 / num_points {
        0 => 48,
        1 => 60,
        2 => 55,
        _ => 72,
    };

    let root =
        BitMapBackend::new("images/glide_example_plot_0.png", (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Portamento", ("Arial", 20).into_font())
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0f32..NUM_SECS_TO_PLOT as f32, 40f32..80f32)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Note")
        .draw()?;

    // plot out the played note
    chart
        .draw_series(LineSeries::new(
            (0..num_points).map(|i| (i as f32 / sample_rate as f32, note_at(i) as f32)),
            BLUE,
        ))?
        .label("Played note")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    let modes = [
        (PortaMode::Proportional, "Proportional", RED),
        (PortaMode::ConstantTime, "Constant time", GREEN),
        (PortaMode::Glissando, "Glissando", MAGENTA),
    ];

    for (mode, name, color) in modes {
        let mut engine = Engine::new(config)?;
        let inbox = RealtimeInbox::new();

        let mut patch = Patch::default();
        patch.voices[0].portamento = 0x70;
        patch.voices[0].porta_mode = mode;

        let mut output = Vec::with_capacity(num_points);
        let mut held = None;
        for i in 0..num_points {
            let note = note_at(i);
            if held != Some(note) {
                // legato, the new key goes down before the old one is released
                engine.note_on(0, note, &patch)?;
                if let Some(old) = held {
                    engine.note_off(0, old, &patch)?;
                }
                held = Some(note);
            }

            engine.tick(&patch, &inbox, &mut ());
            let linear_frq = engine.voice(0).map_or(0, |v| v.linear_frequency());
            output.push((i as f32 / sample_rate as f32, linear_frq as f32 / 512.0));
        }

        chart
            .draw_series(LineSeries::new(output, color))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;

    Ok(())
}
