//! Plot out 1 second of envelope action
//!
//! Look in /images/ for the resulting plot.
//!
//! Requires plotters lib: https://docs.rs/plotters/latest/plotters/. Tested on an Ubuntu machine.

use plotters::prelude::*;
use sid_engine::{modulation::ModSource, Engine, EngineConfig, Patch, RealtimeInbox};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    let sample_rate = config.tick_rate_hz as u32;

    let mut engine = Engine::new(config)?;
    let inbox = RealtimeInbox::new();

    // adjust these to taste to see the result, rates are table indices where 0 is the fastest
    let mut patch = Patch::default();
    let env = &mut patch.envs[0];
    env.depth = 0xff;
    env.attack1 = 0x40;
    env.attack_level = 0xc0;
    env.attack2 = 0x58;
    env.decay1 = 0x50;
    env.decay_level = 0xa0;
    env.decay2 = 0x60;
    env.sustain = 0x60;
    env.release1 = 0x50;
    env.release_level = 0x30;
    env.release2 = 0x60;
    env.attack_curve = 0xc0;

    // plot 1 second of the envelope
    let num_points = sample_rate;
    // wait 100mSec to start the envelope, and then at time 700mSec release it
    let gate_on_sample = 100;
    let gate_off_sample = 700;

    let root =
        BitMapBackend::new("images/envelope_example_plot_0.png", (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Envelope", ("Arial", 20).into_font())
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0f32..1f32, 0f32..1f32)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Amplitude")
        .draw()?;

    // plot out the gate signal in blue
    chart
        .draw_series(LineSeries::new(
            (1..num_points).map(|x| {
                let y = (gate_on_sample <= x && x < gate_off_sample) as u32 as f32;
                (x as f32 / num_points as f32, y)
            }),
            BLUE,
        ))?
        .label("Gate input")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    // plot out the envelope output in red
    let mut output = Vec::with_capacity(num_points as usize);
    for x in 1..num_points {
        if x == gate_on_sample {
            engine.restart_envelope(0)?;
        }
        if x == gate_off_sample {
            engine.release_envelope(0)?;
        }

        engine.tick(&patch, &inbox, &mut ());
        let y = engine.bus().source(ModSource::Env(0)) as f32 / i16::MAX as f32;

        output.push((x as f32 / num_points as f32, y));
    }

    chart
        .draw_series(LineSeries::new(output, RED))?
        .label("Envelope output")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;

    Ok(())
}
