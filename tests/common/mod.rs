//! Synthetic CPAP recordings shared by the e2e tests
//!
//! Recordings are built by running the Venturi relation backwards: a known
//! flow waveform is turned into raw ADC readings for the three pressure taps.

#![allow(dead_code)]

pub const HEADER: &str = "Time (s), Venturi 1 P2, Venturi 1 P1 ins, Venturi 1 P1 exp, Venturi 2 P2, Venturi 2 P1 ins, Venturi 2 P1 exp";

/// Constriction tap pressure used for every synthetic sample
pub const CONSTRICTION_CMH2O: f64 = 5.0;

pub const STEP_S: f64 = 0.01;

pub fn cmh2o_to_adc(p: f64) -> f64 {
    p / (25.4 / (14745.0 - 1638.0)) + 1638.0
}

/// Pressure drop (cmH2O) across the default tube for `|q|` liters/second
pub fn pressure_drop(q: f64) -> f64 {
    let a1 = std::f64::consts::PI * 0.0075_f64.powi(2);
    let a2 = std::f64::consts::PI * 0.006_f64.powi(2);
    let area_term = (a1 / a2).powi(2) - 1.0;
    let v = q.abs() / 1000.0 / a1;
    v * v * 1.199 * area_term / 2.0 / 98.0665
}

/// Build one recording row whose reconstructed flow is `q`
pub fn row(t: f64, q: f64) -> String {
    let upstream = CONSTRICTION_CMH2O + pressure_drop(q);
    let (ins, exp) = if q >= 0.0 { (upstream, 0.0) } else { (0.0, upstream) };
    format!(
        "{:.2},{:.9},{:.9},{:.9},1638,1638,1638",
        t,
        cmh2o_to_adc(CONSTRICTION_CMH2O),
        cmh2o_to_adc(ins),
        cmh2o_to_adc(exp)
    )
}

pub fn recording<F: Fn(f64) -> f64>(seconds: f64, flow: F) -> String {
    let n = (seconds / STEP_S).round() as usize;
    let mut text = String::from(HEADER);
    text.push('\n');
    for i in 0..n {
        let t = i as f64 * STEP_S;
        text.push_str(&row(t, flow(t)));
        text.push('\n');
    }
    text
}

/// 15 breaths per minute, 0.5 L/s peak flow
pub fn breathing(t: f64) -> f64 {
    0.5 * (std::f64::consts::FRAC_PI_2 * t).sin()
}
