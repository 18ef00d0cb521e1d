//! Validation of inbound synthesis events.
//!
//! An event looks like `{ "input": { "text": "...", ... } }`. Everything
//! except `text` is optional and falls back to the defaults below.

use serde_json::{Map, Value};

use crate::error::AppError;

pub const DEFAULT_LANGUAGE: &str = "EN-US";
pub const DEFAULT_DEVICE: &str = "auto";
pub const DEFAULT_SPEAKER_ID: i64 = 0;

/// Closed range a tuning knob must fall in, plus its default.
struct Knob {
    name: &'static str,
    default: f64,
    min: f64,
    max: f64,
}

const SPEED: Knob = Knob {
    name: "speed",
    default: 1.0,
    min: 0.1,
    max: 3.0,
};

const SDP_RATIO: Knob = Knob {
    name: "sdp_ratio",
    default: 0.2,
    min: 0.0,
    max: 1.0,
};

const NOISE_SCALE: Knob = Knob {
    name: "noise_scale",
    default: 0.6,
    min: 0.0,
    max: 2.0,
};

const NOISE_SCALE_W: Knob = Knob {
    name: "noise_scale_w",
    default: 0.8,
    min: 0.0,
    max: 2.0,
};

/// Fully validated request parameters. Nothing downstream re-checks these.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    pub text: String,
    pub speaker_id: i64,
    pub language: String,
    pub device: String,
    pub speed: f32,
    pub sdp_ratio: f32,
    pub noise_scale: f32,
    pub noise_scale_w: f32,
}

pub fn validate_input(event: &Value) -> Result<SynthesisParams, AppError> {
    let empty = Map::new();
    let input = match event.get("input") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return Err(AppError::validation("'input' must be an object")),
    };

    let text = match input.get("text") {
        Some(Value::String(text)) => text.trim(),
        _ => {
            return Err(AppError::validation(
                "'text' parameter is required and must be a string",
            ))
        }
    };
    if text.is_empty() {
        return Err(AppError::validation("'text' parameter cannot be empty"));
    }

    Ok(SynthesisParams {
        text: text.to_string(),
        speaker_id: integer_field(input, "speaker_id", DEFAULT_SPEAKER_ID)?,
        language: string_field(input, "language", DEFAULT_LANGUAGE)?,
        device: string_field(input, "device", DEFAULT_DEVICE)?,
        speed: knob(input, &SPEED)?,
        sdp_ratio: knob(input, &SDP_RATIO)?,
        noise_scale: knob(input, &NOISE_SCALE)?,
        noise_scale_w: knob(input, &NOISE_SCALE_W)?,
    })
}

fn present<'a>(input: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    input.get(name).filter(|v| !v.is_null())
}

fn string_field(input: &Map<String, Value>, name: &str, default: &str) -> Result<String, AppError> {
    match present(input, name) {
        None => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AppError::validation(format!("'{name}' must be a string"))),
    }
}

fn integer_field(input: &Map<String, Value>, name: &str, default: i64) -> Result<i64, AppError> {
    let value = match present(input, name) {
        None => return Ok(default),
        Some(value) => value,
    };

    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::validation(format!("'{name}' must be an integer")))
}

fn knob(input: &Map<String, Value>, knob: &Knob) -> Result<f32, AppError> {
    let value = match present(input, knob.name) {
        None => knob.default,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| not_a_number(knob))?,
        Some(Value::String(s)) => s.trim().parse().map_err(|_| not_a_number(knob))?,
        Some(_) => return Err(not_a_number(knob)),
    };

    // NaN fails `contains`, so it is rejected here as well.
    if !(knob.min..=knob.max).contains(&value) {
        return Err(AppError::validation(format!(
            "'{}' must be between {:.1} and {:.1}",
            knob.name, knob.min, knob.max
        )));
    }

    Ok(value as f32)
}

fn not_a_number(knob: &Knob) -> AppError {
    AppError::validation(format!("'{}' must be a number", knob.name))
}
