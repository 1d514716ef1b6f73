//! Orientation estimation demonstration
//!
//! Simulates a body swinging about all three axes, generates noisy gyroscope,
//! accelerometer and magnetometer samples from the known motion, and runs the
//! Madgwick and Mahony filters over them. The reference and estimated Euler
//! angles are plotted together with the angular error of each filter.
//!
//! Run with: `cargo run --example orientation`

use ahrs_wmm::{Madgwick, MadgwickSettings, Mahony, MahonySettings, QuaternionExt, estimate};
use nalgebra::{UnitQuaternion, Vector3};
use plotters::prelude::*;
use rand::prelude::*;
use rand_pcg::Pcg64;
use std::error::Error;

const SAMPLE_RATE: f64 = 100.0; // 100 Hz
const DURATION: f64 = 60.0; // seconds

/// Reference orientation at time `t`
fn reference(t: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(
        0.5 * (0.6 * t).sin(),
        0.3 * (0.4 * t + 1.0).sin(),
        0.8 * (0.2 * t).sin(),
    )
}

fn noise(rng: &mut Pcg64, scale: f64) -> Vector3<f64> {
    Vector3::new(
        rng.random_range(-scale..scale),
        rng.random_range(-scale..scale),
        rng.random_range(-scale..scale),
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Orientation Example - Madgwick and Mahony on a simulated MARG sensor");

    let dt = 1.0 / SAMPLE_RATE;
    let count = (DURATION * SAMPLE_RATE) as usize;
    let mut rng = Pcg64::seed_from_u64(2024);

    // Earth field pointing north and down, in uT
    let earth_field = Vector3::new(22.0, 0.0, -42.0);
    let gyroscope_bias = Vector3::new(0.002, -0.003, 0.001);

    let mut time = Vec::with_capacity(count);
    let mut truth = Vec::with_capacity(count);
    let mut gyroscope = Vec::with_capacity(count);
    let mut accelerometer = Vec::with_capacity(count);
    let mut magnetometer = Vec::with_capacity(count);

    for i in 0..count {
        let t = i as f64 * dt;
        let q = reference(t);
        // Body rate that carries the reference from t to t + dt
        let rate = (q.inverse() * reference(t + dt)).scaled_axis() / dt;

        time.push(t);
        truth.push(q);
        gyroscope.push(rate + gyroscope_bias + noise(&mut rng, 0.01));
        accelerometer.push(q.inverse_transform_vector(&Vector3::z()) * 9.81 + noise(&mut rng, 0.05));
        magnetometer.push(q.inverse_transform_vector(&earth_field) + noise(&mut rng, 0.5));
    }

    let mut madgwick = Madgwick::with_settings(
        MadgwickSettings {
            beta: 0.05,
            ..Default::default()
        }
        .with_frequency(SAMPLE_RATE),
    )?;
    let mut mahony = Mahony::with_settings(
        MahonySettings {
            kp: 1.0,
            ki: 0.05,
            ..Default::default()
        }
        .with_frequency(SAMPLE_RATE),
    )?;

    // Both filters start from the first reference orientation
    let initial = truth[0];
    let from_madgwick = estimate(
        &mut madgwick,
        &gyroscope,
        &accelerometer,
        Some(magnetometer.as_slice()),
        initial,
    )?;
    let from_mahony = estimate(
        &mut mahony,
        &gyroscope,
        &accelerometer,
        Some(magnetometer.as_slice()),
        initial,
    )?;

    let errors: Vec<(f64, f64)> = truth
        .iter()
        .zip(from_madgwick.iter().zip(&from_mahony))
        .map(|(t, (a, b))| (a.angle_to(t).to_degrees(), b.angle_to(t).to_degrees()))
        .collect();

    let rms = |select: fn(&(f64, f64)) -> f64| {
        (errors.iter().map(|e| select(e).powi(2)).sum::<f64>() / errors.len() as f64).sqrt()
    };
    println!("Madgwick RMS error: {:.2}°", rms(|e| e.0));
    println!("Mahony RMS error:   {:.2}°", rms(|e| e.1));
    println!(
        "Mahony gyroscope bias estimate: {:.4?} rad/s (true {:.4?})",
        -mahony.integral_error() * mahony.settings().ki,
        gyroscope_bias
    );

    create_plots(&time, &truth, &from_madgwick, &errors)?;
    println!("✓ Plots saved to orientation_plots.png");
    Ok(())
}

/// Reference against Madgwick Euler angles, followed by both filter errors
fn create_plots(
    time: &[f64],
    truth: &[UnitQuaternion<f64>],
    estimated: &[UnitQuaternion<f64>],
    errors: &[(f64, f64)],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new("orientation_plots.png", (1000, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(600);

    let time_range = time[0]..time[time.len() - 1];
    let reference: Vec<_> = truth.iter().map(|q| q.to_euler_degrees()).collect();
    let madgwick: Vec<_> = estimated.iter().map(|q| q.to_euler_degrees()).collect();

    let mut euler_chart = ChartBuilder::on(&upper)
        .caption("Euler Angles (reference in light colors)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), -60f64..60f64)?;

    euler_chart.configure_mesh().y_desc("Degrees").draw()?;

    for (axis, (label, color)) in [("Roll", RED), ("Pitch", GREEN), ("Yaw", BLUE)]
        .into_iter()
        .enumerate()
    {
        euler_chart
            .draw_series(LineSeries::new(
                time.iter().zip(&madgwick).map(|(t, e)| (*t, e[axis])),
                &color,
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));

        euler_chart.draw_series(LineSeries::new(
            time.iter().zip(&reference).map(|(t, e)| (*t, e[axis])),
            color.mix(0.3).stroke_width(3),
        ))?;
    }

    euler_chart.configure_series_labels().draw()?;

    let mut error_chart = ChartBuilder::on(&lower)
        .caption("Angular Error", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, 0f64..10f64)?;

    error_chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Degrees")
        .draw()?;

    error_chart
        .draw_series(LineSeries::new(
            time.iter().zip(errors).map(|(t, e)| (*t, e.0)),
            &RED,
        ))?
        .label("Madgwick")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED));

    error_chart
        .draw_series(LineSeries::new(
            time.iter().zip(errors).map(|(t, e)| (*t, e.1)),
            &BLUE,
        ))?
        .label("Mahony")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

    error_chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}
